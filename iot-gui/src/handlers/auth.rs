use askama::Template;
use axum::extract::{Query, State};
use iot_sdk::Credentials;
use serde::Deserialize;
use tracing::{info, warn};

use crate::decode::FormData;
use crate::error::{Error, LOGIN_PATH};
use crate::models::auth::{expired_cookie, session_cookie};
use crate::models::requests::{PasswordUpdateRequest, TokenRequest};
use crate::models::{AuthToken, RefreshToken, REFRESH_COOKIE, TOKEN_COOKIE};
use crate::response::UiResponse;
use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {}

#[derive(Template)]
#[template(path = "password.html")]
pub struct PasswordTemplate {}

/// Signed return target appended by the referer middleware.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    #[serde(rename = "ref")]
    pub target: Option<String>,
    pub sig: Option<String>,
}

fn with_session(response: UiResponse, state: &AppState, token: iot_sdk::Token) -> UiResponse {
    response
        .with_cookie(session_cookie(
            TOKEN_COOKIE,
            token.access_token,
            state.secure_cookies,
        ))
        .with_cookie(session_cookie(
            REFRESH_COOKIE,
            token.refresh_token,
            state.secure_cookies,
        ))
}

pub async fn login_page() -> Result<UiResponse, Error> {
    UiResponse::render(&LoginTemplate {})
}

pub async fn login(State(state): State<AppState>, form: FormData) -> Result<UiResponse, Error> {
    let req: TokenRequest = form
        .parse()
        .map_err(|e| Error::LoginFailed(e.to_string()))?;

    let credentials = Credentials {
        identity: req.username,
        secret: req.password,
    };
    let token = state
        .users
        .create_token(&credentials)
        .await
        .map_err(|e| Error::LoginFailed(e.to_string()))?;

    info!(identity = %credentials.identity, "user logged in");
    Ok(with_session(UiResponse::found("/"), &state, token))
}

/// Trade the refresh token for a new pair and go back where the user was.
///
/// A failed refresh ends the session rather than redirecting here again.
pub async fn refresh_token(
    State(state): State<AppState>,
    refresh: RefreshToken,
    Query(query): Query<RefreshQuery>,
) -> Result<UiResponse, Error> {
    let token = state
        .users
        .refresh_token(&refresh.0)
        .await
        .map_err(|e| Error::LoginFailed(e.to_string()))?;

    let target = state
        .signer
        .redirect_target(query.target.as_deref(), query.sig.as_deref());
    if target == "/" && query.target.as_deref().is_some_and(|t| t != "/") {
        warn!("refresh target rejected");
    }

    Ok(with_session(UiResponse::found(target), &state, token))
}

pub async fn logout() -> UiResponse {
    UiResponse::found(LOGIN_PATH)
        .with_cookie(expired_cookie(TOKEN_COOKIE))
        .with_cookie(expired_cookie(REFRESH_COOKIE))
}

pub async fn password_page(_token: AuthToken) -> Result<UiResponse, Error> {
    UiResponse::render(&PasswordTemplate {})
}

pub async fn update_password(
    State(state): State<AppState>,
    token: AuthToken,
    form: FormData,
) -> Result<UiResponse, Error> {
    let req: PasswordUpdateRequest = form.parse()?;
    state
        .users
        .update_password(&req.oldpass, &req.newpass, token.as_str())
        .await?;
    Ok(UiResponse::see_other("/"))
}
