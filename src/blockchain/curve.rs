//! Bonding-curve account layout and graduation math
//!
//! Each tracked token has a curve account at a program-derived address under
//! the pump.fun program. Two little-endian u64 fields from that account are
//! enough to compute graduation progress.

use crate::utils::error::{Error, Result};
use solana_sdk::pubkey::Pubkey;

/// pump.fun bonding-curve program id on mainnet.
pub const PUMP_FUN_PROGRAM_ID: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

/// Seed prefix for the curve account PDA.
const BONDING_CURVE_SEED: &[u8] = b"bonding-curve";

/// Byte offset of `real_token_reserves` in the account data.
const REAL_TOKEN_RESERVES_OFFSET: usize = 24;

/// Byte offset of `token_total_supply` in the account data.
const TOKEN_TOTAL_SUPPLY_OFFSET: usize = 40;

/// Minimum account size covering both fields.
const MIN_ACCOUNT_DATA_LEN: usize = 48;

/// Base units per token (6 decimals).
const TOKEN_DECIMALS: u64 = 1_000_000;

/// Portion of the supply the curve holds back from sale, in base units.
const RESERVED_TOKENS: u64 = 206_900_000 * TOKEN_DECIMALS;

/// Graduation progress for one watched token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenStatus {
    /// Token mint address, as given in the watch-list.
    pub mint: String,
    /// Percentage of sellable supply already sold, 0.0 to 100.0.
    pub percentage: f64,
}

/// Derives the curve account address for a token mint.
pub fn bonding_curve_address(mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[BONDING_CURVE_SEED, mint.as_ref()], program_id)
}

/// Decodes graduation progress from raw curve account data.
pub fn decode_status(mint: &str, data: &[u8]) -> Result<TokenStatus> {
    if data.len() < MIN_ACCOUNT_DATA_LEN {
        return Err(Error::InvalidFormat(format!(
            "curve account for {} is {} bytes, expected at least {}",
            mint,
            data.len(),
            MIN_ACCOUNT_DATA_LEN
        )));
    }

    let real_token_reserves = read_u64_le(data, REAL_TOKEN_RESERVES_OFFSET);
    let token_total_supply = read_u64_le(data, TOKEN_TOTAL_SUPPLY_OFFSET);

    // The reserved portion never trades, so the sellable supply is what is
    // left after subtracting it. i128 keeps the subtraction total.
    let actual_total_supply = token_total_supply as i128 - RESERVED_TOKENS as i128;
    if actual_total_supply <= 0 {
        return Err(Error::InvalidFormat(format!(
            "curve account for {} reports total supply {} not exceeding the reserved {}",
            mint, token_total_supply, RESERVED_TOKENS
        )));
    }

    let percentage =
        100.0 - (real_token_reserves as f64 * 100.0) / (actual_total_supply as f64);

    Ok(TokenStatus { mint: mint.to_string(), percentage })
}

fn read_u64_le(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(buf)
}
