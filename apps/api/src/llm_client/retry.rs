//! Bounded retry with exponential backoff around a single model call.
//!
//! The loop is a plain function over a closure so the transition from
//! "retrying" to "give up and let the caller fall back" can be tested with a
//! paused clock and no network.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::LlmError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }

    /// Delay before retry number `attempt` (1-based): 1s, 2s, 4s, ... capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// attempt ceiling is reached. `op` receives the 0-based attempt number.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, LlmError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Model call failed, retrying after backoff"
            );
            tokio::time::sleep(delay).await;
        }

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                warn!(attempt, error = %e, "Transient model failure");
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(LlmError::RetriesExhausted {
        attempts: policy.max_attempts,
        last: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}
