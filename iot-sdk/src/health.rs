use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use crate::client::Sdk;
use crate::error::{Error, ErrorKind};
use crate::models::HealthInfo;

#[async_trait]
pub trait HealthClient: Send + Sync {
    /// Health of a named service: `things`, `users`, `http-adapter`,
    /// `reader`, `bootstrap` or `certs`.
    async fn health(&self, service: &str) -> Result<HealthInfo, Error>;
}

impl Sdk {
    fn service_url(&self, service: &str) -> Option<&str> {
        let url = match service {
            "things" => &self.things_url,
            "users" => &self.users_url,
            "http-adapter" => &self.http_adapter_url,
            "reader" => &self.reader_url,
            "bootstrap" => &self.bootstrap_url,
            "certs" => &self.certs_url,
            _ => return None,
        };
        Some(url)
    }
}

#[async_trait]
impl HealthClient for Sdk {
    async fn health(&self, service: &str) -> Result<HealthInfo, Error> {
        let base = self
            .service_url(service)
            .ok_or_else(|| Error::UnexpectedResponse(format!("unknown service {service:?}")))?;
        let url = format!("{base}/health");
        self.send_json::<(), HealthInfo>(
            Method::GET,
            &url,
            "",
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }
}
