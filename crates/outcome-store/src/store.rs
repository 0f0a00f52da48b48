//! Process-wide append-only outcome store.

use crate::types::{OutcomeSummary, ProvisioningOutcome};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Append-only collection of provisioning outcomes.
///
/// Cloning yields another handle to the same sequence. Workers append
/// concurrently while the status query takes snapshots; every append is
/// kept and the order is a valid interleaving of the writers. Nothing is
/// persisted, so a restart starts empty.
#[derive(Clone, Default)]
pub struct OutcomeStore {
    outcomes: Arc<RwLock<Vec<ProvisioningOutcome>>>,
}

impl OutcomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome, returning the new number of entries.
    pub async fn append(&self, outcome: ProvisioningOutcome) -> usize {
        let mut outcomes = self.outcomes.write().await;
        outcomes.push(outcome);
        debug!("Recorded outcome (total: {})", outcomes.len());
        outcomes.len()
    }

    /// Copy of all outcomes in append order.
    pub async fn snapshot(&self) -> Vec<ProvisioningOutcome> {
        self.outcomes.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.outcomes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.outcomes.read().await.is_empty()
    }

    pub async fn summary(&self) -> OutcomeSummary {
        let outcomes = self.outcomes.read().await;
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        OutcomeSummary {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }
}
