//! Disposable mailbox allocator client.

use crate::error::AllocationError;
use crate::types::{AllocatorResponse, Identity};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default allocator endpoint.
pub const DEFAULT_ALLOCATOR_URL: &str = "https://api.tempmail.lol/v1/email";

/// Allocator timeout used when none is configured.
pub const DEFAULT_ALLOCATOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the external disposable-address allocator.
///
/// Allocation is a single attempt; a failed allocation simply aborts the
/// pipeline run that asked for it.
#[derive(Clone, Debug)]
pub struct MailboxClient {
    client: Client,
    url: String,
}

impl MailboxClient {
    /// Create a new allocator client.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AllocationError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Obtain one disposable identity.
    #[instrument(skip(self))]
    pub async fn allocate(&self) -> Result<Identity, AllocationError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Mailbox allocation failed");
            return Err(AllocationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: AllocatorResponse = serde_json::from_str(&body)?;

        let email = parsed
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or(AllocationError::MissingAddress)?;

        debug!(email = %email, "Allocated mailbox");
        Ok(Identity { email })
    }
}
