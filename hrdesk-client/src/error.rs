//! Client error types

use shared::HrError;
use thiserror::Error;

/// Transport-level client error. Converted into the core taxonomy at
/// the adapter boundary.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Map into the core taxonomy. Timeouts get their own kind so the
    /// caller can render them distinctly; everything else is a remote
    /// failure.
    pub fn into_core(self, timeout_secs: u64) -> HrError {
        match self {
            Self::Http(err) if err.is_timeout() => HrError::Timeout {
                seconds: timeout_secs,
            },
            Self::Http(err) => HrError::remote(format!("transport error: {err}")),
            Self::Serialization(err) => HrError::remote(format!("malformed payload: {err}")),
            Self::InvalidResponse(message) => HrError::remote(message),
        }
    }
}

/// Result type for transport operations
pub type ClientResult<T> = Result<T, ClientError>;
