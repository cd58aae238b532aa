use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::client::{self, Sdk};
use crate::error::{Error, ErrorKind};
use crate::models::BootstrapConfig;
use crate::page::{Page, PageMetadata};

const CONFIGS_ENDPOINT: &str = "things/configs";
const BOOTSTRAP_ENDPOINT: &str = "things/bootstrap";
const WHITELIST_ENDPOINT: &str = "things/state";

/// Provisioning records on the bootstrap service.
#[async_trait]
pub trait BootstrapClient: Send + Sync {
    /// Returns the id of the new config, taken from `Location`.
    async fn add_bootstrap(&self, cfg: &BootstrapConfig, token: &str) -> Result<String, Error>;

    async fn view_bootstrap(&self, id: &str, token: &str) -> Result<BootstrapConfig, Error>;

    async fn update_bootstrap(&self, cfg: &BootstrapConfig, token: &str) -> Result<(), Error>;

    async fn update_bootstrap_certs(
        &self,
        id: &str,
        client_cert: &str,
        client_key: &str,
        ca: &str,
        token: &str,
    ) -> Result<BootstrapConfig, Error>;

    async fn update_bootstrap_connection(
        &self,
        id: &str,
        channels: &[String],
        token: &str,
    ) -> Result<(), Error>;

    async fn remove_bootstrap(&self, id: &str, token: &str) -> Result<(), Error>;

    /// Fetch a config the way a device does, with its external credentials.
    async fn bootstrap(&self, external_id: &str, external_key: &str)
        -> Result<BootstrapConfig, Error>;

    async fn bootstraps(
        &self,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<BootstrapConfig>, Error>;

    async fn whitelist(&self, thing_id: &str, state: u8, token: &str) -> Result<(), Error>;
}

#[async_trait]
impl BootstrapClient for Sdk {
    async fn add_bootstrap(&self, cfg: &BootstrapConfig, token: &str) -> Result<String, Error> {
        let url = format!("{}/{CONFIGS_ENDPOINT}", self.bootstrap_url);
        let (headers, _) = self
            .process_request(
                Method::POST,
                &url,
                token,
                Some(client::encode(cfg)?),
                &[],
                &[StatusCode::CREATED],
                ErrorKind::Creation,
            )
            .await?;
        client::id_from_location(&headers, "/things/configs/")
    }

    async fn view_bootstrap(&self, id: &str, token: &str) -> Result<BootstrapConfig, Error> {
        let url = format!("{}/{CONFIGS_ENDPOINT}/{id}", self.bootstrap_url);
        self.send_json::<(), BootstrapConfig>(
            Method::GET,
            &url,
            token,
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }

    async fn update_bootstrap(&self, cfg: &BootstrapConfig, token: &str) -> Result<(), Error> {
        let url = format!("{}/{CONFIGS_ENDPOINT}/{}", self.bootstrap_url, cfg.thing_id);
        self.send_empty(
            Method::PUT,
            &url,
            token,
            Some(cfg),
            &[StatusCode::OK],
            ErrorKind::Update,
        )
        .await
    }

    async fn update_bootstrap_certs(
        &self,
        id: &str,
        client_cert: &str,
        client_key: &str,
        ca: &str,
        token: &str,
    ) -> Result<BootstrapConfig, Error> {
        let url = format!("{}/{CONFIGS_ENDPOINT}/certs/{id}", self.bootstrap_url);
        let body = json!({
            "client_cert": client_cert,
            "client_key": client_key,
            "ca_cert": ca,
        });
        self.send_json(
            Method::PATCH,
            &url,
            token,
            Some(&body),
            &[StatusCode::OK],
            ErrorKind::Update,
        )
        .await
    }

    async fn update_bootstrap_connection(
        &self,
        id: &str,
        channels: &[String],
        token: &str,
    ) -> Result<(), Error> {
        let url = format!("{}/{CONFIGS_ENDPOINT}/connections/{id}", self.bootstrap_url);
        let body = json!({ "channels": channels });
        self.send_empty(
            Method::PUT,
            &url,
            token,
            Some(&body),
            &[StatusCode::OK],
            ErrorKind::Update,
        )
        .await
    }

    async fn remove_bootstrap(&self, id: &str, token: &str) -> Result<(), Error> {
        let url = format!("{}/{CONFIGS_ENDPOINT}/{id}", self.bootstrap_url);
        self.send_empty::<()>(
            Method::DELETE,
            &url,
            token,
            None,
            &[StatusCode::NO_CONTENT],
            ErrorKind::Removal,
        )
        .await
    }

    async fn bootstrap(
        &self,
        external_id: &str,
        external_key: &str,
    ) -> Result<BootstrapConfig, Error> {
        let url = format!("{}/{BOOTSTRAP_ENDPOINT}/{external_id}", self.bootstrap_url);
        self.send_json::<(), BootstrapConfig>(
            Method::GET,
            &url,
            &client::thing_token(external_key),
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }

    async fn bootstraps(
        &self,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<BootstrapConfig>, Error> {
        self.get_page(&self.bootstrap_url, CONFIGS_ENDPOINT, pm, token)
            .await
    }

    async fn whitelist(&self, thing_id: &str, state: u8, token: &str) -> Result<(), Error> {
        let url = format!("{}/{WHITELIST_ENDPOINT}/{thing_id}", self.bootstrap_url);
        let body = json!({ "state": state });
        self.send_empty(
            Method::PUT,
            &url,
            token,
            Some(&body),
            &[StatusCode::CREATED],
            ErrorKind::Update,
        )
        .await
    }
}
