use askama::Template;
use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

/// Where an expired session is sent to get a fresh access token.
pub const REFRESH_PATH: &str = "/refresh_token";
pub const LOGIN_PATH: &str = "/login";

/// Everything a request can fail with. The `IntoResponse` impl is the single
/// place where failures become HTTP answers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing authentication cookie")]
    NoCookie,

    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("malformed request data: {0}")]
    MalformedData(String),

    #[error("malformed subtopic")]
    MalformedSubtopic,

    #[error("unsupported file type")]
    InvalidFile,

    #[error(transparent)]
    Backend(#[from] iot_sdk::Error),

    /// A row-by-row import stopped early; the first `committed` rows exist.
    #[error("import stopped after {committed} rows: {source}")]
    BulkImport {
        committed: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::MalformedData(err.to_string())
    }
}

/// Body of a bulk import that stopped part way.
#[derive(Template)]
#[template(path = "import_error.html")]
struct ImportErrorTemplate<'a> {
    committed: usize,
    cause: &'a Error,
}

/// What the encoder decided for an error, before any body is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Redirect(StatusCode, &'static str),
    Status(StatusCode),
}

impl Error {
    pub fn outcome(&self) -> Outcome {
        match self {
            Error::NoCookie | Error::LoginFailed(_) => Outcome::Redirect(StatusCode::FOUND, LOGIN_PATH),
            Error::MalformedData(_) | Error::MalformedSubtopic | Error::InvalidFile => {
                Outcome::Status(StatusCode::BAD_REQUEST)
            }
            Error::Backend(err) if err.is_invalid_token() => {
                Outcome::Redirect(StatusCode::SEE_OTHER, REFRESH_PATH)
            }
            Error::Backend(err) if err.is_forbidden() => Outcome::Status(StatusCode::FORBIDDEN),
            Error::Backend(_) => Outcome::Status(StatusCode::SERVICE_UNAVAILABLE),
            Error::BulkImport { source, .. } => source.outcome(),
            Error::Template(_) | Error::Internal(_) => {
                Outcome::Status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let outcome = self.outcome();

        match &outcome {
            Outcome::Status(code) if code.is_server_error() => error!(error = %self, "request failed"),
            _ => warn!(error = %self, "request rejected"),
        }

        match (outcome, &self) {
            (Outcome::Redirect(code, location), _) => {
                (code, [(header::LOCATION, location)]).into_response()
            }
            (Outcome::Status(code), Error::BulkImport { committed, source }) => {
                let page = ImportErrorTemplate {
                    committed: *committed,
                    cause: source,
                };
                match page.render() {
                    Ok(body) => (code, Html(body)).into_response(),
                    Err(e) => {
                        error!(error = %e, "import error page failed to render");
                        code.into_response()
                    }
                }
            }
            (Outcome::Status(code), _) => code.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(status: u16) -> Error {
        Error::Backend(iot_sdk::Error::Api {
            kind: if status == 401 {
                iot_sdk::ErrorKind::InvalidToken
            } else {
                iot_sdk::ErrorKind::Fetch
            },
            status,
            message: String::new(),
        })
    }

    #[test]
    fn auth_failures_redirect_to_login() {
        for err in [Error::NoCookie, Error::LoginFailed("bad".into())] {
            assert_eq!(
                err.outcome(),
                Outcome::Redirect(StatusCode::FOUND, LOGIN_PATH)
            );
        }
    }

    #[test]
    fn malformed_input_is_bad_request() {
        for err in [
            Error::MalformedData("x".into()),
            Error::MalformedSubtopic,
            Error::InvalidFile,
        ] {
            assert_eq!(err.outcome(), Outcome::Status(StatusCode::BAD_REQUEST));
        }
    }

    #[test]
    fn backend_statuses_follow_the_table() {
        assert_eq!(
            backend(401).outcome(),
            Outcome::Redirect(StatusCode::SEE_OTHER, REFRESH_PATH)
        );
        assert_eq!(backend(403).outcome(), Outcome::Status(StatusCode::FORBIDDEN));
        assert_eq!(
            backend(404).outcome(),
            Outcome::Status(StatusCode::SERVICE_UNAVAILABLE)
        );
        assert_eq!(
            backend(500).outcome(),
            Outcome::Status(StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[test]
    fn uncategorized_is_internal() {
        assert_eq!(
            Error::Internal("boom".into()).outcome(),
            Outcome::Status(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[test]
    fn bulk_import_uses_the_cause() {
        let err = Error::BulkImport {
            committed: 1,
            source: Box::new(Error::MalformedData("row 2".into())),
        };
        assert_eq!(err.outcome(), Outcome::Status(StatusCode::BAD_REQUEST));
        assert!(err.to_string().contains("after 1 rows"));
    }

    #[tokio::test]
    async fn import_error_page_escapes_backend_text() {
        let err = Error::BulkImport {
            committed: 0,
            source: Box::new(Error::Backend(iot_sdk::Error::Api {
                kind: iot_sdk::ErrorKind::Fetch,
                status: 409,
                message: "<script>alert(1)</script>".into(),
            })),
        };

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("0 rows created"));
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }
}
