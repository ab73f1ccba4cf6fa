use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend responded {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    #[error("No session token; sign in first")]
    Unauthenticated,

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether retrying later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http(e) => e.is_timeout() || e.is_connect(),
            ApiError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}
