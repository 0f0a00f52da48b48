//! Bounded retry with exponential backoff.

use crate::error::ConnectError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const BACKOFF_FACTOR: u32 = 2;

/// Retry policy wrapped around any remote call.
///
/// Attempt `n` (1-based) that fails with a retryable error is followed by a
/// sleep of `base_delay * 2^(n-1)`, except the final attempt which returns
/// its error immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after a failed `attempt`, or `None` when it was the last one.
    pub fn backoff(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let multiplier = BACKOFF_FACTOR.saturating_pow(attempt.saturating_sub(1));
        Some(self.base_delay.saturating_mul(multiplier))
    }

    /// Total time spent sleeping when every attempt fails.
    pub fn max_total_backoff(&self) -> Duration {
        (1..self.max_attempts)
            .filter_map(|attempt| self.backoff(attempt))
            .sum()
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or
    /// the attempt bound is reached. `call` receives the 1-based attempt.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ConnectError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ConnectError>>,
    {
        let mut attempt = 1;
        loop {
            let err = match call(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_retryable() {
                error!(operation, attempt, error = %err, "Request failed with non-retryable error");
                return Err(err);
            }

            match self.backoff(attempt) {
                Some(delay) => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        status = ?err.status(),
                        ?delay,
                        "Request failed: {}",
                        err
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        status = ?err.status(),
                        "Request failed, giving up: {}",
                        err
                    );
                    return Err(err);
                }
            }
        }
    }
}
