use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Error, REFRESH_PATH};

type HmacSha256 = Hmac<Sha256>;

/// Signs the page a user was on when their access token expired, so the
/// refresh endpoint can send them back there without trusting the query.
#[derive(Clone)]
pub struct RefererSigner {
    key: Secret<String>,
}

impl RefererSigner {
    pub fn new(key: Secret<String>) -> Result<Self, Error> {
        if key.expose_secret().is_empty() {
            return Err(Error::Internal("referer signing key is empty".into()));
        }
        Ok(Self { key })
    }

    fn mac(&self) -> Result<HmacSha256, Error> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|e| Error::Internal(format!("invalid key length: {e}")))
    }

    /// Hex HMAC-SHA256 of `target`.
    pub fn sign(&self, target: &str) -> Result<String, Error> {
        let mut mac = self.mac()?;
        mac.update(target.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn verify(&self, target: &str, signature: &str) -> bool {
        let Ok(expected) = self.sign(target) else {
            return false;
        };

        let expected_bytes = expected.as_bytes();
        let signature_bytes = signature.as_bytes();
        if expected_bytes.len() != signature_bytes.len() {
            return false;
        }
        expected_bytes.ct_eq(signature_bytes).into()
    }

    /// `/refresh_token?ref=<target>&sig=<mac>`
    pub fn refresh_location(&self, target: &str) -> Result<String, Error> {
        let sig = self.sign(target)?;
        let query = serde_urlencoded::to_string([("ref", target), ("sig", sig.as_str())])
            .map_err(|e| Error::Internal(e.to_string()))?;
        Ok(format!("{REFRESH_PATH}?{query}"))
    }

    /// Where to go after a refresh: `target` if it is signed and local, else `/`.
    pub fn redirect_target<'a>(&self, target: Option<&'a str>, signature: Option<&str>) -> &'a str {
        match (target, signature) {
            (Some(target), Some(sig)) if is_local_path(target) && self.verify(target, sig) => {
                target
            }
            _ => "/",
        }
    }
}

/// A same-origin absolute path. Rejects `//host` and `/\host` forms.
pub fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !target.contains("://")
}
