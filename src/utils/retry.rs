//! Bounded exponential-backoff retry for fallible async operations.

use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;

/// Retry policy with an attempt budget and exponential backoff.
///
/// The delay before retry `k` (zero-based) is `min(base * 2^k, max)`. Once the
/// budget is exhausted the last error is returned unchanged, so callers can
/// still tell a missing account from a transport failure.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy running at most `max_attempts` attempts (clamped to at
    /// least one) with the given backoff bounds.
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay, max_delay }
    }

    /// Total attempts this policy will run, including the first one.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Run `action`, retrying per the policy. Succeeds as soon as one attempt
    /// succeeds; never retries after a success.
    pub async fn run<A, T, E, F>(&self, action: A) -> std::result::Result<T, E>
    where
        A: FnMut() -> F,
        F: Future<Output = std::result::Result<T, E>>,
    {
        // from_millis(2) doubles per step; the factor rescales the first
        // delay to `base_delay`.
        let base_ms = (self.base_delay.as_millis() as u64).max(2);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(base_ms / 2)
            .max_delay(self.max_delay)
            .take(self.max_attempts - 1);

        Retry::spawn(strategy, action).await
    }
}
