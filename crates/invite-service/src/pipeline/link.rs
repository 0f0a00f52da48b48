//! Invite link retrieval.

use super::error::LinkError;
use connect_client::ConnectClient;
use tracing::warn;

/// Fetches the generated invite link for an enrolled tester.
///
/// A missing link is common right after enrollment; the caller decides
/// what to record, nothing is retried here beyond the client's own policy.
#[derive(Clone)]
pub struct LinkRetriever {
    client: ConnectClient,
}

impl LinkRetriever {
    pub fn new(client: ConnectClient) -> Self {
        Self { client }
    }

    pub async fn fetch_link(&self, remote_id: &str) -> Result<String, LinkError> {
        match self.client.invite_url(remote_id).await? {
            Some(link) => Ok(link),
            None => {
                warn!("Could not retrieve invitation URL for tester {}", remote_id);
                Err(LinkError::NotAvailable(remote_id.to_string()))
            }
        }
    }
}
