use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use crate::client::{self, Sdk};
use crate::error::{Error, ErrorKind};
use crate::models::Subscription;
use crate::page::{Page, PageMetadata};

const SUBSCRIPTIONS_ENDPOINT: &str = "subscriptions";

/// Notifier subscriptions on the users service.
#[async_trait]
pub trait SubscriptionClient: Send + Sync {
    /// Returns the id of the new subscription, taken from `Location`.
    async fn create_subscription(
        &self,
        topic: &str,
        contact: &str,
        token: &str,
    ) -> Result<String, Error>;

    async fn list_subscriptions(
        &self,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Subscription>, Error>;

    async fn view_subscription(&self, id: &str, token: &str) -> Result<Subscription, Error>;

    async fn delete_subscription(&self, id: &str, token: &str) -> Result<(), Error>;
}

#[async_trait]
impl SubscriptionClient for Sdk {
    async fn create_subscription(
        &self,
        topic: &str,
        contact: &str,
        token: &str,
    ) -> Result<String, Error> {
        let url = format!("{}/{SUBSCRIPTIONS_ENDPOINT}", self.users_url);
        let sub = Subscription {
            topic: topic.to_string(),
            contact: contact.to_string(),
            ..Default::default()
        };
        let (headers, _) = self
            .process_request(
                Method::POST,
                &url,
                token,
                Some(client::encode(&sub)?),
                &[],
                &[StatusCode::CREATED],
                ErrorKind::Creation,
            )
            .await?;
        client::id_from_location(&headers, "/subscriptions/")
    }

    async fn list_subscriptions(
        &self,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Subscription>, Error> {
        self.get_page(&self.users_url, SUBSCRIPTIONS_ENDPOINT, pm, token)
            .await
    }

    async fn view_subscription(&self, id: &str, token: &str) -> Result<Subscription, Error> {
        let url = format!("{}/{SUBSCRIPTIONS_ENDPOINT}/{id}", self.users_url);
        self.send_json::<(), Subscription>(
            Method::GET,
            &url,
            token,
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }

    async fn delete_subscription(&self, id: &str, token: &str) -> Result<(), Error> {
        let url = format!("{}/{SUBSCRIPTIONS_ENDPOINT}/{id}", self.users_url);
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
}
