use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::error::Error;

pub const TOKEN_COOKIE: &str = "token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Access token read from the `token` cookie.
///
/// A missing or empty cookie rejects the request before the body is read.
#[derive(Clone)]
pub struct AuthToken(pub String);

/// Refresh token read from the `refresh_token` cookie.
#[derive(Clone)]
pub struct RefreshToken(pub String);

fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        cookie_value(parts, TOKEN_COOKIE)
            .map(AuthToken)
            .ok_or(Error::NoCookie)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RefreshToken
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        cookie_value(parts, REFRESH_COOKIE)
            .map(RefreshToken)
            .ok_or(Error::NoCookie)
    }
}

impl AuthToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// HttpOnly session cookie valid for the whole site.
pub fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .path("/")
        .secure(secure)
        .build()
}

/// A cookie that makes the browser drop `name`.
pub fn expired_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).http_only(true).path("/").build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request};

    async fn extract(cookie: Option<&str>) -> Result<AuthToken, Error> {
        let mut builder = Request::builder().uri("/things");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthToken::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_token_cookie() {
        let token = extract(Some("lang=en; token=abc")).await.unwrap();
        assert_eq!(token.as_str(), "abc");
    }

    #[tokio::test]
    async fn missing_or_empty_cookie_is_no_cookie() {
        assert!(matches!(extract(None).await, Err(Error::NoCookie)));
        assert!(matches!(extract(Some("token=")).await, Err(Error::NoCookie)));
    }

    #[test]
    fn expired_cookie_has_zero_max_age() {
        let cookie = expired_cookie(TOKEN_COOKIE).to_string();
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
