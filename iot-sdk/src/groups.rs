use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use crate::client::Sdk;
use crate::error::{Error, ErrorKind};
use crate::models::{Group, User, UsersRelationRequest};
use crate::page::{Page, PageMetadata};

const GROUPS_ENDPOINT: &str = "groups";

/// User groups on the users service.
#[async_trait]
pub trait GroupClient: Send + Sync {
    async fn create_group(&self, group: &Group, token: &str) -> Result<Group, Error>;

    async fn groups(&self, pm: &PageMetadata, token: &str) -> Result<Page<Group>, Error>;

    async fn parents(&self, id: &str, pm: &PageMetadata, token: &str)
        -> Result<Page<Group>, Error>;

    async fn children(
        &self,
        id: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Group>, Error>;

    async fn group(&self, id: &str, token: &str) -> Result<Group, Error>;

    async fn update_group(&self, group: &Group, token: &str) -> Result<Group, Error>;

    async fn enable_group(&self, id: &str, token: &str) -> Result<Group, Error>;

    async fn disable_group(&self, id: &str, token: &str) -> Result<Group, Error>;

    async fn add_users_to_group(
        &self,
        group_id: &str,
        req: &UsersRelationRequest,
        token: &str,
    ) -> Result<(), Error>;

    async fn remove_users_from_group(
        &self,
        group_id: &str,
        req: &UsersRelationRequest,
        token: &str,
    ) -> Result<(), Error>;

    async fn list_group_users(
        &self,
        group_id: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<User>, Error>;
}

impl Sdk {
    fn groups_path(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/{GROUPS_ENDPOINT}", self.users_url)
        } else {
            format!("{}/{GROUPS_ENDPOINT}/{path}", self.users_url)
        }
    }

    async fn change_group_status(
        &self,
        id: &str,
        action: &str,
        kind: ErrorKind,
        token: &str,
    ) -> Result<Group, Error> {
        let url = self.groups_path(&format!("{id}/{action}"));
        self.send_json::<(), Group>(Method::POST, &url, token, None, &[StatusCode::OK], kind)
            .await
    }
}

#[async_trait]
impl GroupClient for Sdk {
    async fn create_group(&self, group: &Group, token: &str) -> Result<Group, Error> {
        let url = self.groups_path("");
        self.send_json(
            Method::POST,
            &url,
            token,
            Some(group),
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await
    }

    async fn groups(&self, pm: &PageMetadata, token: &str) -> Result<Page<Group>, Error> {
        self.get_page(&self.users_url, GROUPS_ENDPOINT, pm, token)
            .await
    }

    async fn parents(
        &self,
        id: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Group>, Error> {
        let endpoint = format!("{GROUPS_ENDPOINT}/{id}/parents");
        self.get_page(&self.users_url, &endpoint, pm, token).await
    }

    async fn children(
        &self,
        id: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<Group>, Error> {
        let endpoint = format!("{GROUPS_ENDPOINT}/{id}/children");
        self.get_page(&self.users_url, &endpoint, pm, token).await
    }

    async fn group(&self, id: &str, token: &str) -> Result<Group, Error> {
        let url = self.groups_path(id);
        self.send_json::<(), Group>(
            Method::GET,
            &url,
            token,
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }

    async fn update_group(&self, group: &Group, token: &str) -> Result<Group, Error> {
        let url = self.groups_path(&group.id);
        self.send_json(
            Method::PUT,
            &url,
            token,
            Some(group),
            &[StatusCode::OK],
            ErrorKind::Update,
        )
        .await
    }

    async fn enable_group(&self, id: &str, token: &str) -> Result<Group, Error> {
        self.change_group_status(id, "enable", ErrorKind::Enable, token)
            .await
    }

    async fn disable_group(&self, id: &str, token: &str) -> Result<Group, Error> {
        self.change_group_status(id, "disable", ErrorKind::Disable, token)
            .await
    }

    async fn add_users_to_group(
        &self,
        group_id: &str,
        req: &UsersRelationRequest,
        token: &str,
    ) -> Result<(), Error> {
        let url = self.groups_path(&format!("{group_id}/users/assign"));
        self.send_empty(
            Method::POST,
            &url,
            token,
            Some(req),
            &[StatusCode::OK],
            ErrorKind::Creation,
        )
        .await
    }

    async fn remove_users_from_group(
        &self,
        group_id: &str,
        req: &UsersRelationRequest,
        token: &str,
    ) -> Result<(), Error> {
        let url = self.groups_path(&format!("{group_id}/users/unassign"));
        self.send_empty(
            Method::POST,
            &url,
            token,
            Some(req),
            &[StatusCode::NO_CONTENT],
            ErrorKind::Removal,
        )
        .await
    }

    async fn list_group_users(
        &self,
        group_id: &str,
        pm: &PageMetadata,
        token: &str,
    ) -> Result<Page<User>, Error> {
        let endpoint = format!("{GROUPS_ENDPOINT}/{group_id}/users");
        self.get_page(&self.users_url, &endpoint, pm, token).await
    }
}
