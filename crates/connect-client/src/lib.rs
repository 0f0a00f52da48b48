//! Connect API client with signed-token authentication.
//!
//! Provides the token minter, a bounded retry policy and the tester,
//! group and invite link operations used by the provisioning pipeline.

mod beta;
mod client;
mod error;
mod jwt;
mod retry;
mod types;

pub use client::{ConnectClient, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use error::{ConnectError, SigningError};
pub use jwt::{SignedToken, TokenMinter, DEFAULT_AUDIENCE, MAX_TOKEN_TTL};
pub use retry::RetryPolicy;
pub use types::*;

pub use reqwest::Method;
