use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::Sdk;
use crate::error::{Error, ErrorKind};
use crate::models::{Cert, CertSerials};

const CERTS_ENDPOINT: &str = "certs";
const SERIALS_ENDPOINT: &str = "serials";

#[async_trait]
pub trait CertClient: Send + Sync {
    /// Issue a client certificate for `thing_id`, valid for `valid` (e.g. `"720h"`).
    async fn issue_cert(&self, thing_id: &str, valid: &str, token: &str) -> Result<Cert, Error>;

    async fn view_cert(&self, id: &str, token: &str) -> Result<Cert, Error>;

    async fn view_cert_by_thing(&self, thing_id: &str, token: &str)
        -> Result<CertSerials, Error>;

    /// Revoke every certificate of a thing; returns the revocation time.
    async fn revoke_cert(&self, thing_id: &str, token: &str) -> Result<DateTime<Utc>, Error>;
}

#[derive(Serialize)]
struct IssueCert<'a> {
    thing_id: &'a str,
    ttl: &'a str,
}

#[derive(Deserialize)]
struct Revoke {
    revocation_time: DateTime<Utc>,
}

#[async_trait]
impl CertClient for Sdk {
    async fn issue_cert(&self, thing_id: &str, valid: &str, token: &str) -> Result<Cert, Error> {
        let url = format!("{}/{CERTS_ENDPOINT}", self.certs_url);
        let body = IssueCert {
            thing_id,
            ttl: valid,
        };
        self.send_json(
            Method::POST,
            &url,
            token,
            Some(&body),
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await
    }

    async fn view_cert(&self, id: &str, token: &str) -> Result<Cert, Error> {
        let url = format!("{}/{CERTS_ENDPOINT}/{id}", self.certs_url);
        self.send_json::<(), Cert>(
            Method::GET,
            &url,
            token,
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }

    async fn view_cert_by_thing(
        &self,
        thing_id: &str,
        token: &str,
    ) -> Result<CertSerials, Error> {
        let url = format!("{}/{SERIALS_ENDPOINT}/{thing_id}", self.certs_url);
        self.send_json::<(), CertSerials>(
            Method::GET,
            &url,
            token,
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }

    async fn revoke_cert(&self, thing_id: &str, token: &str) -> Result<DateTime<Utc>, Error> {
        let url = format!("{}/{CERTS_ENDPOINT}/{thing_id}", self.certs_url);
        let revoked: Revoke = self
            .send_json::<(), Revoke>(
                Method::DELETE,
                &url,
                token,
                None,
                &[StatusCode::OK],
                ErrorKind::Removal,
            )
            .await?;
        Ok(revoked.revocation_time)
    }
}
