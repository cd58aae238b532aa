use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// What the failed operation was trying to do.
///
/// Every backend call carries one of these so callers can tell a failed list
/// from a failed update without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Creation,
    List,
    Update,
    Fetch,
    Removal,
    Enable,
    Disable,
    InvalidToken,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Creation => "failed to create entity",
            Self::List => "failed to list entities",
            Self::Update => "failed to update entity",
            Self::Fetch => "failed to fetch entity",
            Self::Removal => "failed to remove entity",
            Self::Enable => "failed to enable client",
            Self::Disable => "failed to disable client",
            Self::InvalidToken => "invalid token",
        };
        f.write_str(text)
    }
}

/// Top-level error type for the `iot-sdk` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The backend answered with a status outside the operation's expected set.
    #[error("{kind} (HTTP {status}): {message}")]
    Api {
        kind: ErrorKind,
        status: u16,
        message: String,
    },

    /// Connection refused, DNS failure, timeout and friends.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request payload could not be serialized.
    #[error("Encoding error: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Response body did not match the expected shape.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Backend HTTP status, when the error came from a backend answer.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// `true` when the presented token was rejected and a refresh might help.
    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self,
            Self::Api {
                kind: ErrorKind::InvalidToken,
                ..
            }
        )
    }

    /// `true` when the backend refused the operation for the authenticated caller.
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN.as_u16())
    }

    /// `true` when the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Build the error for an unexpected backend answer.
///
/// 401 always means the token was rejected, whatever the operation.
pub(crate) fn from_response(kind: ErrorKind, status: StatusCode, body: &[u8]) -> Error {
    let kind = if status == StatusCode::UNAUTHORIZED {
        ErrorKind::InvalidToken
    } else {
        kind
    };

    Error::Api {
        kind,
        status: status.as_u16(),
        message: error_message(status, body),
    }
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error).filter(|m| !m.is_empty()) {
            return message;
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if !text.is_empty() {
        return text;
    }

    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}
