//! Provisioning outcome types.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Reason recorded when the invite link could not be fetched.
pub const LINK_UNAVAILABLE: &str = "Could not retrieve link";

/// Terminal state of one pipeline run's link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// The access link handed out to the tester.
    Ready(String),
    /// A failure placeholder with its reason.
    Failed(String),
}

impl Serialize for LinkStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LinkStatus::Ready(link) => serializer.serialize_str(link),
            LinkStatus::Failed(reason) => serializer.serialize_str(&format!("Error: {}", reason)),
        }
    }
}

/// The record one pipeline run leaves behind. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisioningOutcome {
    pub email: String,
    pub link: LinkStatus,
    pub recorded_at: DateTime<Utc>,
}

impl ProvisioningOutcome {
    /// Outcome carrying the retrieved link.
    pub fn success(email: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            link: LinkStatus::Ready(link.into()),
            recorded_at: Utc::now(),
        }
    }

    /// Outcome for a tester whose link was not yet available.
    pub fn link_unavailable(email: impl Into<String>) -> Self {
        Self::failure(email, LINK_UNAVAILABLE)
    }

    /// Outcome carrying an arbitrary failure reason.
    pub fn failure(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            link: LinkStatus::Failed(reason.into()),
            recorded_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.link, LinkStatus::Ready(_))
    }

    /// The link, if this run produced one.
    pub fn link(&self) -> Option<&str> {
        match &self.link {
            LinkStatus::Ready(link) => Some(link),
            LinkStatus::Failed(_) => None,
        }
    }
}

/// Counts over a store snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}
