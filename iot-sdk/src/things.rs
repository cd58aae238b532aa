use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::client::{self, Sdk};
use crate::error::{Error, ErrorKind};
use crate::models::Thing;
use crate::page::{Page, PageMetadata};

const THINGS_ENDPOINT: &str = "things";
const CHANNELS_ENDPOINT: &str = "channels";
const IDENTIFY_ENDPOINT: &str = "identify";

/// Devices on the things service.
#[async_trait]
pub trait ThingClient: Send + Sync {
    async fn create_thing(&self, thing: &Thing, token: &str) -> Result<Thing, Error>;

    /// One backend call for the whole batch.
    async fn create_things(&self, things: &[Thing], token: &str) -> Result<Vec<Thing>, Error>;

    async fn things(&self, pm: &PageMetadata, token: &str) -> Result<Page<Thing>, Error>;

    /// Things connected to channel `chan_id`.
    async fn things_by_channel(
        &self,
        chan_id: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Thing>, Error>;

    async fn thing(&self, id: &str, token: &str) -> Result<Thing, Error>;

    async fn update_thing(&self, thing: &Thing, token: &str) -> Result<Thing, Error>;

    async fn update_thing_tags(&self, thing: &Thing, token: &str) -> Result<Thing, Error>;

    async fn update_thing_secret(&self, id: &str, secret: &str, token: &str)
        -> Result<Thing, Error>;

    async fn update_thing_owner(&self, thing: &Thing, token: &str) -> Result<Thing, Error>;

    async fn enable_thing(&self, id: &str, token: &str) -> Result<Thing, Error>;

    async fn disable_thing(&self, id: &str, token: &str) -> Result<Thing, Error>;

    /// Resolve a thing key to its thing id.
    async fn identify_thing(&self, key: &str) -> Result<String, Error>;
}

#[derive(Deserialize)]
struct BulkThings {
    #[serde(default)]
    things: Vec<Thing>,
}

#[derive(Deserialize)]
struct Identity {
    id: String,
}

impl Sdk {
    fn things_path(&self, path: &str) -> String {
        format!("{}/{}", self.things_url, path)
    }

    async fn change_thing_status(
        &self,
        id: &str,
        action: &str,
        kind: ErrorKind,
        token: &str,
    ) -> Result<Thing, Error> {
        let url = self.things_path(&format!("{THINGS_ENDPOINT}/{id}/{action}"));
        self.send_json::<(), Thing>(Method::POST, &url, token, None, &[StatusCode::OK], kind)
            .await
    }

    async fn patch_thing(
        &self,
        id: &str,
        suffix: &str,
        body: &serde_json::Value,
        token: &str,
    ) -> Result<Thing, Error> {
        let url = self.things_path(&format!("{THINGS_ENDPOINT}/{id}{suffix}"));
        self.send_json(
            Method::PATCH,
            &url,
            token,
            Some(body),
            &[StatusCode::OK],
            ErrorKind::Update,
        )
        .await
    }
}

#[async_trait]
impl ThingClient for Sdk {
    async fn create_thing(&self, thing: &Thing, token: &str) -> Result<Thing, Error> {
        let url = self.things_path(THINGS_ENDPOINT);
        self.send_json(
            Method::POST,
            &url,
            token,
            Some(thing),
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await
    }

    async fn create_things(&self, things: &[Thing], token: &str) -> Result<Vec<Thing>, Error> {
        let url = self.things_path(&format!("{THINGS_ENDPOINT}/bulk"));
        let created: BulkThings = self
            .send_json(
                Method::POST,
                &url,
                token,
                Some(things),
                &[StatusCode::OK],
                ErrorKind::Creation,
            )
            .await?;
        Ok(created.things)
    }

    async fn things(&self, pm: &PageMetadata, token: &str) -> Result<Page<Thing>, Error> {
        self.get_page(&self.things_url, THINGS_ENDPOINT, pm, token)
            .await
    }

    async fn things_by_channel(
        &self,
        chan_id: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Thing>, Error> {
        let endpoint = format!("{CHANNELS_ENDPOINT}/{chan_id}/{THINGS_ENDPOINT}");
        self.get_page(&self.things_url, &endpoint, pm, token).await
    }

    async fn thing(&self, id: &str, token: &str) -> Result<Thing, Error> {
        let url = self.things_path(&format!("{THINGS_ENDPOINT}/{id}"));
        self.send_json::<(), Thing>(
            Method::GET,
            &url,
            token,
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }

    async fn update_thing(&self, thing: &Thing, token: &str) -> Result<Thing, Error> {
        let body = json!({ "name": thing.name, "metadata": thing.metadata });
        self.patch_thing(&thing.id, "", &body, token).await
    }

    async fn update_thing_tags(&self, thing: &Thing, token: &str) -> Result<Thing, Error> {
        let body = json!({ "tags": thing.tags });
        self.patch_thing(&thing.id, "/tags", &body, token).await
    }

    async fn update_thing_secret(
        &self,
        id: &str,
        secret: &str,
        token: &str,
    ) -> Result<Thing, Error> {
        let body = json!({ "secret": secret });
        self.patch_thing(id, "/secret", &body, token).await
    }

    async fn update_thing_owner(&self, thing: &Thing, token: &str) -> Result<Thing, Error> {
        let body = json!({ "owner": thing.owner });
        self.patch_thing(&thing.id, "/owner", &body, token).await
    }

    async fn enable_thing(&self, id: &str, token: &str) -> Result<Thing, Error> {
        self.change_thing_status(id, "enable", ErrorKind::Enable, token)
            .await
    }

    async fn disable_thing(&self, id: &str, token: &str) -> Result<Thing, Error> {
        self.change_thing_status(id, "disable", ErrorKind::Disable, token)
            .await
    }

    async fn identify_thing(&self, key: &str) -> Result<String, Error> {
        let url = self.things_path(IDENTIFY_ENDPOINT);
        let identity: Identity = self
            .send_json::<(), Identity>(
                Method::POST,
                &url,
                &client::thing_token(key),
                None,
                &[StatusCode::OK],
                ErrorKind::Fetch,
            )
            .await?;
        Ok(identity.id)
    }
}
