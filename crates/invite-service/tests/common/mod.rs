//! Common test utilities for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use connect_client::{ConnectClient, RetryPolicy, TokenMinter};
use invite_service::pipeline::{Pipeline, PipelineError};
use mailbox_client::{AllocationError, MailboxClient};
use outcome_store::ProvisioningOutcome;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

pub const PRIVATE_KEY_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../connect-client/tests/fixtures/test_key.p8"
);

/// Create a Connect client configured for a mock server.
pub fn test_connect_client(mock_server: &MockServer) -> ConnectClient {
    let minter = TokenMinter::from_pem_file("issuer-1", "KEY123", PRIVATE_KEY_PATH).unwrap();
    ConnectClient::new(mock_server.uri(), minter, Duration::from_secs(5))
        .unwrap()
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(10)))
}

/// Create a mailbox client pointing at `/email` on a mock server.
pub fn test_mailbox_client(mock_server: &MockServer) -> MailboxClient {
    MailboxClient::new(format!("{}/email", mock_server.uri()), Duration::from_secs(5)).unwrap()
}

pub fn tester_json(id: &str, email: &str) -> Value {
    json!({
        "type": "betaTesters",
        "id": id,
        "attributes": { "email": email }
    })
}

/// How a [`FakePipeline`] behaves on each run.
#[derive(Clone, Copy, Debug)]
pub enum FakeBehavior {
    Succeed,
    FailAllocation,
    /// Sleep before succeeding.
    Slow(Duration),
}

/// In-process pipeline that counts its runs.
pub struct FakePipeline {
    behavior: FakeBehavior,
    started: AtomicUsize,
    completed: AtomicUsize,
}

impl FakePipeline {
    pub fn new(behavior: FakeBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pipeline for FakePipeline {
    async fn run(&self) -> Result<ProvisioningOutcome, PipelineError> {
        let n = self.started.fetch_add(1, Ordering::SeqCst);
        let result = match self.behavior {
            FakeBehavior::Succeed => Ok(ProvisioningOutcome::success(
                format!("user{}@example.com", n),
                format!("https://testflight.apple.com/join/{}", n),
            )),
            FakeBehavior::FailAllocation => Err(PipelineError::Allocation(
                AllocationError::MissingAddress,
            )),
            FakeBehavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(ProvisioningOutcome::success(
                    format!("slow{}@example.com", n),
                    "https://testflight.apple.com/join/slow",
                ))
            }
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}
