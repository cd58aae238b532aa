use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::json;

use crate::client::Sdk;
use crate::error::{Error, ErrorKind};
use crate::models::{Credentials, Token, User};
use crate::page::{Page, PageMetadata};

const USERS_ENDPOINT: &str = "users";
const PASSWORD_RESET_REQUEST: &str = "password/reset-request";
const PASSWORD_RESET: &str = "password/reset";

/// Account management on the users service.
#[async_trait]
pub trait UserClient: Send + Sync {
    async fn create_user(&self, user: &User, token: &str) -> Result<User, Error>;

    async fn user(&self, id: &str, token: &str) -> Result<User, Error>;

    async fn users(&self, pm: &PageMetadata, token: &str) -> Result<Page<User>, Error>;

    /// The user owning `token`.
    async fn user_profile(&self, token: &str) -> Result<User, Error>;

    /// Name and metadata.
    async fn update_user(&self, user: &User, token: &str) -> Result<User, Error>;

    async fn update_user_tags(&self, user: &User, token: &str) -> Result<User, Error>;

    async fn update_user_identity(&self, user: &User, token: &str) -> Result<User, Error>;

    async fn update_user_owner(&self, user: &User, token: &str) -> Result<User, Error>;

    async fn update_password(
        &self,
        old_secret: &str,
        new_secret: &str,
        token: &str,
    ) -> Result<User, Error>;

    /// Ask the backend to mail a password reset link.
    async fn reset_password_request(&self, email: &str) -> Result<(), Error>;

    async fn reset_password(
        &self,
        password: &str,
        confirm_password: &str,
        token: &str,
    ) -> Result<(), Error>;

    async fn enable_user(&self, id: &str, token: &str) -> Result<User, Error>;

    async fn disable_user(&self, id: &str, token: &str) -> Result<User, Error>;

    /// Exchange credentials for an access/refresh token pair.
    async fn create_token(&self, credentials: &Credentials) -> Result<Token, Error>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<Token, Error>;
}

#[derive(Serialize)]
struct UpdateSecret<'a> {
    old_secret: &'a str,
    new_secret: &'a str,
}

#[derive(Serialize)]
struct ResetPassword<'a> {
    token: &'a str,
    password: &'a str,
    confirm_password: &'a str,
}

impl Sdk {
    fn users_path(&self, path: &str) -> String {
        format!("{}/{}", self.users_url, path)
    }

    async fn change_user_status(
        &self,
        id: &str,
        action: &str,
        kind: ErrorKind,
        token: &str,
    ) -> Result<User, Error> {
        let url = self.users_path(&format!("{USERS_ENDPOINT}/{id}/{action}"));
        self.send_json::<(), User>(Method::POST, &url, token, None, &[StatusCode::OK], kind)
            .await
    }
}

#[async_trait]
impl UserClient for Sdk {
    async fn create_user(&self, user: &User, token: &str) -> Result<User, Error> {
        let url = self.users_path(USERS_ENDPOINT);
        self.send_json(
            Method::POST,
            &url,
            token,
            Some(user),
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await
    }

    async fn user(&self, id: &str, token: &str) -> Result<User, Error> {
        let url = self.users_path(&format!("{USERS_ENDPOINT}/{id}"));
        self.send_json::<(), User>(
            Method::GET,
            &url,
            token,
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }

    async fn users(&self, pm: &PageMetadata, token: &str) -> Result<Page<User>, Error> {
        self.get_page(&self.users_url, USERS_ENDPOINT, pm, token)
            .await
    }

    async fn user_profile(&self, token: &str) -> Result<User, Error> {
        let url = self.users_path(&format!("{USERS_ENDPOINT}/profile"));
        self.send_json::<(), User>(
            Method::GET,
            &url,
            token,
            None,
            &[StatusCode::OK],
            ErrorKind::Fetch,
        )
        .await
    }

    async fn update_user(&self, user: &User, token: &str) -> Result<User, Error> {
        let url = self.users_path(&format!("{USERS_ENDPOINT}/{}", user.id));
        let body = json!({ "name": user.name, "metadata": user.metadata });
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

    async fn update_user_tags(&self, user: &User, token: &str) -> Result<User, Error> {
        let url = self.users_path(&format!("{USERS_ENDPOINT}/{}/tags", user.id));
        let body = json!({ "tags": user.tags });
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

    async fn update_user_identity(&self, user: &User, token: &str) -> Result<User, Error> {
        let url = self.users_path(&format!("{USERS_ENDPOINT}/{}/identity", user.id));
        let body = json!({ "identity": user.credentials.identity });
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

    async fn update_user_owner(&self, user: &User, token: &str) -> Result<User, Error> {
        let url = self.users_path(&format!("{USERS_ENDPOINT}/{}/owner", user.id));
        let body = json!({ "owner": user.owner });
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

    async fn update_password(
        &self,
        old_secret: &str,
        new_secret: &str,
        token: &str,
    ) -> Result<User, Error> {
        let url = self.users_path(&format!("{USERS_ENDPOINT}/secret"));
        let body = UpdateSecret {
            old_secret,
            new_secret,
        };
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

    async fn reset_password_request(&self, email: &str) -> Result<(), Error> {
        let url = self.users_path(PASSWORD_RESET_REQUEST);
        let body = crate::client::encode(&json!({ "email": email }))?;
        self.process_request(
            Method::POST,
            &url,
            "",
            Some(body),
            &[("Referer", self.host_url.as_str())],
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await?;
        Ok(())
    }

    async fn reset_password(
        &self,
        password: &str,
        confirm_password: &str,
        token: &str,
    ) -> Result<(), Error> {
        let url = self.users_path(PASSWORD_RESET);
        let body = ResetPassword {
            token,
            password,
            confirm_password,
        };
        self.send_empty(
            Method::PUT,
            &url,
            "",
            Some(&body),
            &[StatusCode::CREATED],
            ErrorKind::Update,
        )
        .await
    }

    async fn enable_user(&self, id: &str, token: &str) -> Result<User, Error> {
        self.change_user_status(id, "enable", ErrorKind::Enable, token)
            .await
    }

    async fn disable_user(&self, id: &str, token: &str) -> Result<User, Error> {
        self.change_user_status(id, "disable", ErrorKind::Disable, token)
            .await
    }

    async fn create_token(&self, credentials: &Credentials) -> Result<Token, Error> {
        let url = self.users_path(&format!("{USERS_ENDPOINT}/tokens/issue"));
        self.send_json(
            Method::POST,
            &url,
            "",
            Some(credentials),
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<Token, Error> {
        let url = self.users_path(&format!("{USERS_ENDPOINT}/tokens/refresh"));
        self.send_json::<(), Token>(
            Method::POST,
            &url,
            refresh_token,
            None,
            &[StatusCode::CREATED],
            ErrorKind::Creation,
        )
        .await
    }
}
