//! Data-plane calls: publishing through the HTTP adapter and reading back
//! stored messages.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use crate::client::{self, Sdk};
use crate::error::{Error, ErrorKind};
use crate::models::Message;
use crate::page::{Page, PageMetadata};

#[async_trait]
pub trait MessageClient: Send + Sync {
    /// Publish `msg` on `chan_name` using thing key `key`.
    ///
    /// A channel name `chan.a.b` publishes on subtopic `a/b` of `chan`.
    async fn send_message(&self, chan_name: &str, msg: &str, key: &str) -> Result<(), Error>;

    /// Stored messages of a channel. `token` is either a user token or an
    /// already scoped `Thing <key>`.
    async fn read_messages(
        &self,
        chan_name: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Message>, Error>;
}

/// Split `chan.a.b` into (`chan`, `a/b`).
pub fn split_channel(chan_name: &str) -> (&str, String) {
    match chan_name.split_once('.') {
        Some((chan, rest)) => (chan, rest.replace('.', "/")),
        None => (chan_name, String::new()),
    }
}

#[async_trait]
impl MessageClient for Sdk {
    async fn send_message(&self, chan_name: &str, msg: &str, key: &str) -> Result<(), Error> {
        let (chan_id, subtopic) = split_channel(chan_name);
        let mut url = format!("{}/channels/{chan_id}/messages", self.http_adapter_url);
        if !subtopic.is_empty() {
            url = format!("{url}/{subtopic}");
        }

        self.process_request(
            Method::POST,
            &url,
            &client::thing_token(key),
            Some(msg.as_bytes().to_vec()),
            &[("Content-Type", self.msg_content_type())],
            &[StatusCode::ACCEPTED],
            ErrorKind::Creation,
        )
        .await?;
        Ok(())
    }

    async fn read_messages(
        &self,
        chan_name: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Message>, Error> {
        let (chan_id, subtopic) = split_channel(chan_name);
        let mut url = client::with_query_params(
            &self.reader_url,
            &format!("channels/{chan_id}/messages"),
            pm,
        )?;
        if !subtopic.is_empty() {
            let sep = if url.contains('?') { '&' } else { '?' };
            let encoded: String = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("subtopic", &subtopic)
                .finish();
            url = format!("{url}{sep}{encoded}");
        }

        let (_, bytes) = self
            .process_request(
                Method::GET,
                &url,
                token,
                None,
                &[],
                &[StatusCode::OK],
                ErrorKind::List,
            )
            .await?;
        client::decode(&bytes)
    }
}
