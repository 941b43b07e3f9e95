use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::OracleError;
use crate::types::identifiers::DocumentId;

/// Bounded exponential backoff for transient oracle failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): initial, 2x, 4x, ... capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Run `op` until it succeeds, fails non-transiently, or the attempt budget is spent.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        document: &DocumentId,
        mut op: F,
    ) -> Result<T, OracleError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OracleError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(err);
            }
            if attempt >= max_attempts {
                return Err(OracleError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let mut backoff = self.backoff(attempt);
            if let OracleError::RateLimited {
                retry_after: Some(hint),
            } = &err
            {
                backoff = backoff.max(*hint).min(Duration::from_millis(self.max_backoff_ms));
            }

            warn!(
                operation,
                document = %document,
                attempt,
                max_attempts,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "Transient oracle failure, backing off"
            );
            tokio::time::sleep(backoff).await;
        }
    }
}
