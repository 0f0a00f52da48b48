//! Connect API client errors.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a signed token.
///
/// Regenerating the token will not help when the key itself is broken, so
/// callers never retry on this error.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Failed to read signing key {path}: {source}")]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Failed to sign token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Token signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ConnectError {
    /// Whether another attempt of the same call may succeed.
    ///
    /// Only transport failures and HTTP error statuses qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectError::Transport(_) | ConnectError::Status { .. })
    }

    /// HTTP status of the failed call, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConnectError::Status { status, .. } => Some(*status),
            ConnectError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
