use crate::engine::error::GraphError;
use reqwest::StatusCode;
use serde::Deserialize;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced by remote calls.
///
/// Every non-2xx answer maps to exactly one variant; nothing here is retried.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("architecture not found: {0}")]
    NotFound(String),

    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("remote service failed: {0}")]
    ServerFailure(String),

    #[error("remote service rejected the request ({status}): {message}")]
    RemoteRejected { status: StatusCode, message: String },

    #[error("remote service unavailable: {0}")]
    RemoteUnavailable(#[source] BoxError),

    #[error("architecture is invalid: {0}")]
    ValidationFailure(String),

    #[error("could not decode the remote response")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl Error {
    /// Map a non-success status and its body to an error kind.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status.canonical_reason().unwrap_or("no details").to_string()
                } else {
                    trimmed.to_string()
                }
            });

        match status {
            StatusCode::NOT_FOUND => Error::NotFound(message),
            StatusCode::METHOD_NOT_ALLOWED => Error::MethodNotAllowed(message),
            StatusCode::INTERNAL_SERVER_ERROR => Error::ServerFailure(message),
            status => Error::RemoteRejected { status, message },
        }
    }

    pub fn unavailable(err: impl Into<BoxError>) -> Self {
        Error::RemoteUnavailable(err.into())
    }

    /// True for failures that came from the remote side rather than local state.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Error::Graph(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::RemoteUnavailable(Box::new(err))
    }
}
