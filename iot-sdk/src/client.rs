// Shared HTTP machinery for every resource client.
//
// One `reqwest::Client` is built from `SdkConfig`; each operation funnels
// through `process_request`, which applies the authorization rule, checks
// the status against the operation's expected set and classifies failures.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{self, Error, ErrorKind};
use crate::page::PageMetadata;

/// Prefix added to plain user tokens.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Marker identifying an already scoped thing key.
pub const THING_PREFIX: &str = "Thing ";

pub const CT_JSON: &str = "application/json";
pub const CT_SENML_JSON: &str = "application/senml+json";
pub const CT_BINARY: &str = "application/octet-stream";

/// Endpoints and transport options for the platform services.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    pub users_url: String,
    pub things_url: String,
    pub http_adapter_url: String,
    pub reader_url: String,
    pub bootstrap_url: String,
    pub certs_url: String,
    /// Public address of this UI, sent as `Referer` on password-reset mails.
    pub host_url: String,
    pub msg_content_type: String,
    /// When `false`, server certificates are not verified.
    pub tls_verification: bool,
    pub timeout: Duration,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            users_url: "http://localhost:9002".to_string(),
            things_url: "http://localhost:9000".to_string(),
            http_adapter_url: "http://localhost:8008".to_string(),
            reader_url: "http://localhost:9011".to_string(),
            bootstrap_url: "http://localhost:9013".to_string(),
            certs_url: "http://localhost:9019".to_string(),
            host_url: "http://localhost:9090".to_string(),
            msg_content_type: CT_SENML_JSON.to_string(),
            tls_verification: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl SdkConfig {
    /// Every service behind a single base URL, as in local development setups.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            users_url: base.clone(),
            things_url: base.clone(),
            http_adapter_url: base.clone(),
            reader_url: base.clone(),
            bootstrap_url: base.clone(),
            certs_url: base.clone(),
            host_url: base,
            ..Default::default()
        }
    }

    fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("iot-sdk/", env!("CARGO_PKG_VERSION")));

        if !self.tls_verification {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(builder.build()?)
    }
}

/// Async client for the platform REST API.
///
/// Resource operations live on the capability traits (`UserClient`,
/// `ThingClient`, ...), all implemented by this type.
#[derive(Debug, Clone)]
pub struct Sdk {
    http: reqwest::Client,
    pub(crate) users_url: String,
    pub(crate) things_url: String,
    pub(crate) http_adapter_url: String,
    pub(crate) reader_url: String,
    pub(crate) bootstrap_url: String,
    pub(crate) certs_url: String,
    pub(crate) host_url: String,
    msg_content_type: String,
}

impl Sdk {
    pub fn new(config: SdkConfig) -> Result<Self, Error> {
        for raw in [
            &config.users_url,
            &config.things_url,
            &config.http_adapter_url,
            &config.reader_url,
            &config.bootstrap_url,
            &config.certs_url,
        ] {
            url::Url::parse(raw)?;
        }

        let http = config.build_client()?;
        Ok(Self {
            http,
            users_url: trim(&config.users_url),
            things_url: trim(&config.things_url),
            http_adapter_url: trim(&config.http_adapter_url),
            reader_url: trim(&config.reader_url),
            bootstrap_url: trim(&config.bootstrap_url),
            certs_url: trim(&config.certs_url),
            host_url: trim(&config.host_url),
            msg_content_type: config.msg_content_type,
        })
    }

    /// Content type used when publishing messages.
    pub fn msg_content_type(&self) -> &str {
        &self.msg_content_type
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.msg_content_type = content_type.into();
    }

    // Request plumbing

    /// Issue one request and return headers and body of an expected answer.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn process_request(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<Vec<u8>>,
        headers: &[(&str, &str)],
        expected: &[StatusCode],
        kind: ErrorKind,
    ) -> Result<(HeaderMap, Bytes), Error> {
        debug!(%method, %url, "backend request");

        let mut header_map = HeaderMap::new();
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static(CT_JSON));

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidHeader(e.to_string()))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader(e.to_string()))?;
            header_map.insert(name, value);
        }

        if let Some(value) = authorization(token) {
            let mut value = HeaderValue::from_str(&value)
                .map_err(|_| Error::InvalidHeader("token is not a valid header value".to_string()))?;
            value.set_sensitive(true);
            header_map.insert(AUTHORIZATION, value);
        }

        let mut request = self.http.request(method, url).headers(header_map);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let bytes = response.bytes().await?;

        if !expected.contains(&status) {
            debug!(%status, "unexpected backend status");
            return Err(error::from_response(kind, status, &bytes));
        }

        Ok((response_headers, bytes))
    }

    /// Send an optional JSON payload and decode a JSON answer.
    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&B>,
        expected: &[StatusCode],
        kind: ErrorKind,
    ) -> Result<T, Error>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let payload = body.map(encode).transpose()?;
        let (_, bytes) = self
            .process_request(method, url, token, payload, &[], expected, kind)
            .await?;
        decode(&bytes)
    }

    /// Send an optional JSON payload and ignore the answer body.
    pub(crate) async fn send_empty<B>(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&B>,
        expected: &[StatusCode],
        kind: ErrorKind,
    ) -> Result<(), Error>
    where
        B: Serialize + ?Sized + Sync,
    {
        let payload = body.map(encode).transpose()?;
        self.process_request(method, url, token, payload, &[], expected, kind)
            .await?;
        Ok(())
    }

    /// GET a page of results with the page metadata as query string.
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        base: &str,
        endpoint: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<T, Error> {
        let url = with_query_params(base, endpoint, pm)?;
        self.send_json::<(), T>(Method::GET, &url, token, None, &[StatusCode::OK], ErrorKind::List)
            .await
    }
}

/// Authorization header value for `token`, if any.
///
/// Thing keys already carrying the `Thing ` marker pass through untouched;
/// anything else is sent as a bearer token.
pub fn authorization(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    if token.contains(THING_PREFIX) {
        return Some(token.to_string());
    }
    Some(format!("{BEARER_PREFIX}{token}"))
}

/// Scope a raw thing key for data-plane calls.
pub fn thing_token(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    format!("{THING_PREFIX}{key}")
}

pub(crate) fn with_query_params(
    base: &str,
    endpoint: &str,
    pm: &PageMetadata,
) -> Result<String, Error> {
    let query = pm.query()?;
    if query.is_empty() {
        Ok(format!("{base}/{endpoint}"))
    } else {
        Ok(format!("{base}/{endpoint}?{query}"))
    }
}

/// Last path segment of a `Location` header, used by endpoints that answer
/// `201 Created` with the new id only in that header.
pub(crate) fn id_from_location(headers: &HeaderMap, prefix: &str) -> Result<String, Error> {
    let location = headers
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::UnexpectedResponse("missing Location header".to_string()))?;

    let id = location.strip_prefix(prefix).unwrap_or(location);
    let id = id.rsplit('/').next().unwrap_or(id);
    if id.is_empty() {
        return Err(Error::UnexpectedResponse(format!(
            "no id in Location header {location:?}"
        )));
    }
    Ok(id.to_string())
}

pub(crate) fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(body).map_err(Error::Encoding)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(bytes).map_err(|e| {
        let body = String::from_utf8_lossy(bytes).into_owned();
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

fn trim(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_sends_no_header() {
        assert_eq!(authorization(""), None);
    }

    #[test]
    fn plain_token_becomes_bearer() {
        assert_eq!(authorization("abc.def"), Some("Bearer abc.def".to_string()));
    }

    #[test]
    fn thing_key_passes_through() {
        assert_eq!(
            authorization("Thing 1234-key"),
            Some("Thing 1234-key".to_string())
        );
        assert_eq!(authorization(&thing_token("k")), Some("Thing k".to_string()));
    }

    #[test]
    fn query_suffix_only_when_needed() {
        let url = with_query_params("http://x", "users", &PageMetadata::default()).unwrap();
        assert_eq!(url, "http://x/users");

        let url = with_query_params("http://x", "users", &PageMetadata::new(0, 5)).unwrap();
        assert_eq!(url, "http://x/users?limit=5");
    }

    #[test]
    fn location_id_is_last_segment() {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::LOCATION,
            HeaderValue::from_static("/things/configs/abc-123"),
        );
        assert_eq!(
            id_from_location(&headers, "/things/configs/").unwrap(),
            "abc-123"
        );
    }

    #[test]
    fn invalid_url_is_rejected() {
        let config = SdkConfig {
            users_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(Sdk::new(config), Err(Error::InvalidUrl(_))));
    }
}
