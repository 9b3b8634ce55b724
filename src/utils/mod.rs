//! Utility modules shared across the monitor.

pub mod error;
pub mod logging;
pub mod rate_limiter;
pub mod retry;

pub use error::{Error, Result};
pub use logging::init_logging;
pub use rate_limiter::RpcRateLimiter;
pub use retry::RetryPolicy;
