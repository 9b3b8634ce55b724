//! Blockchain interaction module

use async_trait::async_trait;

pub mod client;
pub mod curve;

// Re-export for convenience
pub use client::CurveClient;
pub use curve::{bonding_curve_address, decode_status, TokenStatus, PUMP_FUN_PROGRAM_ID};

/// Read access to on-chain graduation state. The monitor depends on this
/// trait so poll cycles can be exercised without an RPC endpoint.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn fetch_status(&self, token: &str) -> crate::Result<TokenStatus>;
}
