//! Shared RPC rate limiter built on Governor (GCRA algorithm).

use std::num::NonZeroU32;

use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};

/// Limits outbound RPC calls to a fixed budget per rolling one-second window,
/// shared by every concurrent caller.
pub struct RpcRateLimiter {
    limiter: GovernorLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,
    rate_per_second: u32,
}

impl RpcRateLimiter {
    /// Create a limiter admitting `rate_per_second` calls per second.
    /// A rate of zero is clamped to one.
    pub fn new(rate_per_second: u32) -> Self {
        let rate = rate_per_second.max(1);
        // Burst of 1 keeps admissions evenly spaced, so no rolling one-second
        // window ever sees more than `rate` completions.
        let quota = Quota::per_second(NonZeroU32::new(rate).unwrap())
            .allow_burst(NonZeroU32::new(1).unwrap());

        Self { limiter: GovernorLimiter::direct(quota), rate_per_second: rate }
    }

    /// Suspend the caller until the budget admits one more call.
    /// Only delays, never rejects.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Configured budget in calls per second.
    pub fn rate_per_second(&self) -> u32 {
        self.rate_per_second
    }
}
