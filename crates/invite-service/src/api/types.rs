//! API request and response types.

use crate::scheduler::SchedulerState;
use outcome_store::OutcomeSummary;
use serde::{Deserialize, Serialize};

/// Form body of the start command.
///
/// Values that fail to parse as integers fall back to the configured
/// defaults.
#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    pub threads: Option<String>,
    pub interval: Option<String>,
}

impl StartRequest {
    pub fn threads(&self) -> Option<i64> {
        parse_int(self.threads.as_deref())
    }

    pub fn interval_secs(&self) -> Option<i64> {
        parse_int(self.interval.as_deref())
    }
}

fn parse_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub running: bool,
    pub state: SchedulerState,
    pub outcomes: OutcomeSummary,
}
