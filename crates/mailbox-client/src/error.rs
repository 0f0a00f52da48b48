//! Mailbox allocator errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Allocator returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Allocator response has no address")]
    MissingAddress,
}
