use std::sync::Arc;

use reqwest::StatusCode;

/// Boxed source for transport-level failures (no response received).
pub type TransportSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No response was received at all.
    #[error("network error: {0}")]
    Network(#[source] TransportSource),
    /// A non-401 failure response, carrying the classified user-facing message.
    #[error("http {0}: {1}")]
    Http(StatusCode, String),
    /// A 401 that will not be recovered: bootstrap path, second attempt, or refresh initiator after a
    /// failed refresh.
    #[error("401 unauthorized on {path}: {message}")]
    Auth { path: String, message: String },
    /// The shared outcome of a failed refresh, fanned out to every queued request.
    #[error("token refresh failed: {0}")]
    Refresh(Arc<Error>),
    /// The task driving a refresh was dropped before the refresh settled.
    #[error("token refresh abandoned before completion")]
    RefreshAbandoned,
    #[error("response envelope has no data")]
    MissingData,
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid request: {0}")]
    Request(String),
}

/// Coarse classification of failures as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Client,
    AuthFailure,
    Server,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) => ErrorKind::Network,
            Error::Http(status, _) if status.is_server_error() => ErrorKind::Server,
            Error::Http(status, _) if status.is_client_error() => ErrorKind::Client,
            Error::Auth { .. } | Error::Refresh(_) | Error::RefreshAbandoned => ErrorKind::AuthFailure,
            _ => ErrorKind::Other,
        }
    }

    /// HTTP status carried by the failure, if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http(status, _) => Some(*status),
            Error::Auth { .. } => Some(StatusCode::UNAUTHORIZED),
            Error::Refresh(inner) => inner.status(),
            _ => None,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        self.kind() == ErrorKind::AuthFailure
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(Box::new(err))
    }
}
