use askama::Template;
use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Cookie;
use url::{Position, Url};

use crate::error::Error;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

/// A successful UI answer: status, extra headers, cookies to set and an
/// optional rendered HTML body.
#[derive(Debug)]
pub struct UiResponse {
    code: StatusCode,
    headers: Vec<(HeaderName, String)>,
    cookies: Vec<Cookie<'static>>,
    html: Option<String>,
}

impl UiResponse {
    pub fn new(code: StatusCode) -> Self {
        Self {
            code,
            headers: Vec::new(),
            cookies: Vec::new(),
            html: None,
        }
    }

    pub fn html(body: String) -> Self {
        Self {
            html: Some(body),
            ..Self::new(StatusCode::OK)
        }
    }

    pub fn render<T: Template>(template: &T) -> Result<Self, Error> {
        Ok(Self::html(template.render()?))
    }

    /// `303 See Other`, the answer to a form post.
    pub fn see_other(location: impl Into<String>) -> Self {
        Self::new(StatusCode::SEE_OTHER).with_header(header::LOCATION, location)
    }

    /// `302 Found`.
    pub fn found(location: impl Into<String>) -> Self {
        Self::new(StatusCode::FOUND).with_header(header::LOCATION, location)
    }

    pub fn empty() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

}

/// A same-origin location built from raw path segments and query pairs.
/// Ids taken from forms or paths may hold `/`, `?` or `&`; they are
/// percent-encoded so they stay inside their own segment or value.
pub fn local_path(segments: &[&str], query: &[(&str, &str)]) -> Result<String, Error> {
    let mut url = Url::parse("http://localhost/").map_err(|e| Error::Internal(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| Error::Internal("base url cannot hold a path".into()))?
        .clear()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url[Position::BeforePath..].to_string())
}

impl IntoResponse for UiResponse {
    fn into_response(self) -> Response {
        let mut response = match self.html {
            Some(body) => (self.code, body).into_response(),
            None => self.code.into_response(),
        };

        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(CONTENT_TYPE_HTML),
        );

        for (name, value) in self.headers {
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    headers.insert(name, value);
                }
                Err(_) => tracing::warn!(header = %name, "dropping invalid header value"),
            }
        }

        for cookie in self.cookies {
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                headers.append(header::SET_COOKIE, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_carries_location_and_cookies() {
        let response = UiResponse::found("/")
            .with_cookie(Cookie::new("token", "abc"))
            .with_cookie(Cookie::new("refresh_token", "def"))
            .into_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 2);
        assert_eq!(response.headers()[header::CONTENT_TYPE], CONTENT_TYPE_HTML);
    }

    #[test]
    fn empty_response_is_plain_ok() {
        let response = UiResponse::empty().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[test]
    fn local_path_encodes_ids() {
        assert_eq!(
            local_path(&["channels", "c1", "things"], &[]).unwrap(),
            "/channels/c1/things"
        );
        assert_eq!(
            local_path(&["channels", "a/b?c", "things"], &[]).unwrap(),
            "/channels/a%2Fb%3Fc/things"
        );
        assert_eq!(
            local_path(&["readmessages"], &[("channelID", "c&x=1")]).unwrap(),
            "/readmessages?channelID=c%26x%3D1"
        );
    }
}
