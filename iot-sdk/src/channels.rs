use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::client::Sdk;
use crate::error::{Error, ErrorKind};
use crate::models::Channel;
use crate::page::{Page, PageMetadata};

const CHANNELS_ENDPOINT: &str = "channels";
const THINGS_ENDPOINT: &str = "things";

#[async_trait]
pub trait ChannelClient: Send + Sync {
    async fn create_channel(&self, channel: &Channel, token: &str) -> Result<Channel, Error>;

    async fn create_channels(
        &self,
        channels: &[Channel],
        token: &str,
    ) -> Result<Vec<Channel>, Error>;

    async fn channels(&self, pm: &PageMetadata, token: &str) -> Result<Page<Channel>, Error>;

    /// Channels thing `thing_id` is connected to.
    async fn channels_by_thing(
        &self,
        thing_id: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Channel>, Error>;

    async fn channel(&self, id: &str, token: &str) -> Result<Channel, Error>;

    async fn update_channel(&self, channel: &Channel, token: &str) -> Result<Channel, Error>;

    async fn enable_channel(&self, id: &str, token: &str) -> Result<Channel, Error>;

    async fn disable_channel(&self, id: &str, token: &str) -> Result<Channel, Error>;
}

#[derive(Deserialize)]
struct BulkChannels {
    #[serde(default)]
    channels: Vec<Channel>,
}

impl Sdk {
    async fn change_channel_status(
        &self,
        id: &str,
        action: &str,
        kind: ErrorKind,
        token: &str,
    ) -> Result<Channel, Error> {
        let url = format!("{}/{CHANNELS_ENDPOINT}/{id}/{action}", self.things_url);
        self.send_json::<(), Channel>(Method::POST, &url, token, None, &[StatusCode::OK], kind)
            .await
    }
}

#[async_trait]
impl ChannelClient for Sdk {
    async fn create_channel(&self, channel: &Channel, token: &str) -> Result<Channel, Error> {
        let url = format!("{}/{CHANNELS_ENDPOINT}", self.things_url);
        self.send_json(
            Method::POST,
            &url,
            token,
            Some(channel),
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await
    }

    async fn create_channels(
        &self,
        channels: &[Channel],
        token: &str,
    ) -> Result<Vec<Channel>, Error> {
        let url = format!("{}/{CHANNELS_ENDPOINT}/bulk", self.things_url);
        let created: BulkChannels = self
            .send_json(
                Method::POST,
                &url,
                token,
                Some(channels),
                &[StatusCode::OK],
                ErrorKind::Creation,
            )
            .await?;
        Ok(created.channels)
    }

    async fn channels(&self, pm: &PageMetadata, token: &str) -> Result<Page<Channel>, Error> {
        self.get_page(&self.things_url, CHANNELS_ENDPOINT, pm, token)
            .await
    }

    async fn channels_by_thing(
        &self,
        thing_id: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Channel>, Error> {
        let endpoint = format!("{THINGS_ENDPOINT}/{thing_id}/{CHANNELS_ENDPOINT}");
        self.get_page(&self.things_url, &endpoint, pm, token).await
    }

    async fn channel(&self, id: &str, token: &str) -> Result<Channel, Error> {
        let url = format!("{}/{CHANNELS_ENDPOINT}/{id}", self.things_url);
        self.send_json::<(), Channel>(
            Method::GET,
            &url,
            token,
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }

    async fn update_channel(&self, channel: &Channel, token: &str) -> Result<Channel, Error> {
        let url = format!("{}/{CHANNELS_ENDPOINT}/{}", self.things_url, channel.id);
        self.send_json(
            Method::PUT,
            &url,
            token,
            Some(channel),
            &[StatusCode::OK],
            ErrorKind::Update,
        )
        .await
    }

    async fn enable_channel(&self, id: &str, token: &str) -> Result<Channel, Error> {
        self.change_channel_status(id, "enable", ErrorKind::Enable, token)
            .await
    }

    async fn disable_channel(&self, id: &str, token: &str) -> Result<Channel, Error> {
        self.change_channel_status(id, "disable", ErrorKind::Disable, token)
            .await
    }
}
