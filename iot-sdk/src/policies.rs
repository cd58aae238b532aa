use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use crate::client::Sdk;
use crate::error::{Error, ErrorKind};
use crate::models::{Connection, Policy};
use crate::page::{Page, PageMetadata};

const POLICIES_ENDPOINT: &str = "policies";

/// Access-control relations, including thing/channel connections.
#[async_trait]
pub trait PolicyClient: Send + Sync {
    async fn create_user_policy(&self, policy: &Policy, token: &str) -> Result<(), Error>;

    async fn update_user_policy(&self, policy: &Policy, token: &str) -> Result<(), Error>;

    async fn list_user_policies(
        &self,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Policy>, Error>;

    async fn delete_user_policy(&self, policy: &Policy, token: &str) -> Result<(), Error>;

    async fn list_thing_policies(
        &self,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Policy>, Error>;

    async fn update_thing_policy(&self, policy: &Policy, token: &str) -> Result<(), Error>;

    /// Connect every listed thing to every paired channel.
    async fn connect(&self, conn: &Connection, token: &str) -> Result<(), Error>;

    async fn disconnect(&self, conn: &Connection, token: &str) -> Result<(), Error>;

    async fn connect_thing(&self, thing_id: &str, chan_id: &str, token: &str)
        -> Result<(), Error>;

    async fn disconnect_thing(
        &self,
        thing_id: &str,
        chan_id: &str,
        token: &str,
    ) -> Result<(), Error>;
}

#[async_trait]
impl PolicyClient for Sdk {
    async fn create_user_policy(&self, policy: &Policy, token: &str) -> Result<(), Error> {
        let url = format!("{}/users/{POLICIES_ENDPOINT}", self.users_url);
        self.send_empty(
            Method::POST,
            &url,
            token,
            Some(policy),
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await
    }

    async fn update_user_policy(&self, policy: &Policy, token: &str) -> Result<(), Error> {
        let url = format!("{}/users/{POLICIES_ENDPOINT}", self.users_url);
        self.send_empty(
            Method::PUT,
            &url,
            token,
            Some(policy),
            &[StatusCode::NO_CONTENT],
            ErrorKind::Update,
        )
        .await
    }

    async fn list_user_policies(
        &self,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Policy>, Error> {
        let endpoint = format!("users/{POLICIES_ENDPOINT}");
        self.get_page(&self.users_url, &endpoint, pm, token).await
    }

    async fn delete_user_policy(&self, policy: &Policy, token: &str) -> Result<(), Error> {
        let url = format!(
            "{}/users/{POLICIES_ENDPOINT}/{}/{}",
            self.users_url, policy.subject, policy.object
        );
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

    async fn list_thing_policies(
        &self,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Policy>, Error> {
        let endpoint = format!("things/{POLICIES_ENDPOINT}");
        self.get_page(&self.things_url, &endpoint, pm, token).await
    }

    async fn update_thing_policy(&self, policy: &Policy, token: &str) -> Result<(), Error> {
        let url = format!("{}/things/{POLICIES_ENDPOINT}", self.things_url);
        self.send_empty(
            Method::PUT,
            &url,
            token,
            Some(policy),
            &[StatusCode::NO_CONTENT],
            ErrorKind::Update,
        )
        .await
    }

    async fn connect(&self, conn: &Connection, token: &str) -> Result<(), Error> {
        let url = format!("{}/connect", self.things_url);
        self.send_empty(
            Method::POST,
            &url,
            token,
            Some(conn),
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await
    }

    async fn disconnect(&self, conn: &Connection, token: &str) -> Result<(), Error> {
        let url = format!("{}/disconnect", self.things_url);
        self.send_empty(
            Method::POST,
            &url,
            token,
            Some(conn),
            &[StatusCode::NO_CONTENT],
            ErrorKind::Removal,
        )
        .await
    }

    async fn connect_thing(
        &self,
        thing_id: &str,
        chan_id: &str,
        token: &str,
    ) -> Result<(), Error> {
        let url = format!("{}/channels/{chan_id}/things/{thing_id}", self.things_url);
        self.send_empty::<()>(
            Method::POST,
            &url,
            token,
            None,
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await
    }

    async fn disconnect_thing(
        &self,
        thing_id: &str,
        chan_id: &str,
        token: &str,
    ) -> Result<(), Error> {
        let url = format!("{}/channels/{chan_id}/things/{thing_id}", self.things_url);
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
