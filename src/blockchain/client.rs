//! Rate-limited RPC client for curve account reads

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient as AsyncRpcClient;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
};

use crate::blockchain::curve::{self, TokenStatus};
use crate::blockchain::ChainClient;
use crate::config::SolanaConfig;
use crate::utils::error::{Error, Result};
use crate::utils::rate_limiter::RpcRateLimiter;

/// Fetches and decodes bonding-curve accounts over JSON-RPC.
pub struct CurveClient {
    client: AsyncRpcClient,
    program_id: Pubkey,
    commitment: CommitmentConfig,
    limiter: Arc<RpcRateLimiter>,
}

impl std::fmt::Debug for CurveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurveClient")
            .field("program_id", &self.program_id)
            .field("commitment", &self.commitment)
            .finish_non_exhaustive()
    }
}

impl CurveClient {
    pub fn new(config: &SolanaConfig, limiter: Arc<RpcRateLimiter>) -> Result<Self> {
        let commitment_level = CommitmentLevel::from_str(&config.commitment).map_err(|e| {
            Error::ConfigError(format!("Invalid commitment '{}': {}", config.commitment, e))
        })?;
        let commitment = CommitmentConfig { commitment: commitment_level };

        let program_id = Pubkey::from_str(&config.program_id).map_err(|e| {
            Error::ConfigError(format!("Invalid program id '{}': {}", config.program_id, e))
        })?;

        let client = AsyncRpcClient::new_with_commitment(config.rpc_url.clone(), commitment);

        Ok(Self { client, program_id, commitment, limiter })
    }
}

#[async_trait]
impl ChainClient for CurveClient {
    async fn fetch_status(&self, token: &str) -> Result<TokenStatus> {
        let mint = Pubkey::from_str(token)
            .map_err(|e| Error::InvalidFormat(format!("invalid mint address {}: {}", token, e)))?;
        let (curve_address, _) = curve::bonding_curve_address(&mint, &self.program_id);

        // Acquired here rather than around the poll cycle so retried
        // requests are throttled too.
        self.limiter.acquire().await;

        let response = self
            .client
            .get_account_with_commitment(&curve_address, self.commitment)
            .await
            .map_err(|e| Error::TransportError(format!("RPC request for {} failed: {}", token, e)))?;

        let account = response.value.ok_or_else(|| {
            Error::NotFound(format!("no bonding curve account for token {}", token))
        })?;

        curve::decode_status(token, &account.data)
    }
}
