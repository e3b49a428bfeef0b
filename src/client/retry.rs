//! Retry executor: bounded retries with exponential backoff and jitter.

use crate::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Jitter added on top of the exponential delay, sampled uniformly per
/// retry so concurrent callers spread out instead of thundering back
/// together.
const JITTER_MAX: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first, so `max_retries + 1` total.
    pub max_retries: u32,
    /// Delay before retry `n` (1-indexed) is `base_delay * 2^(n-1)` plus
    /// jitter.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        let base = self.base_delay.saturating_mul(factor);
        let jitter = rand::thread_rng().gen_range(0..JITTER_MAX.as_millis() as u64);
        base + Duration::from_millis(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// Non-retryable errors — unauthorized/forbidden responses, quota stops —
/// are re-raised immediately and unchanged: a bad credential will not get
/// better on the next attempt, and a quota stop must reach the user as-is.
/// Every other error is treated as transient. After the final allowed
/// attempt the last error propagates wrapped in [`Error::RetriesExhausted`]
/// so callers still see the cause.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;

                if !err.is_retryable() {
                    return Err(err);
                }

                if attempt > policy.max_retries {
                    return Err(Error::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }

                let delay = policy.backoff_delay(attempt);
                let context: String = err.to_string().chars().take(100).collect();
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %context,
                    "request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
