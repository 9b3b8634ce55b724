//! # Gradwatch
//! Discord notification bridge for pump.fun token graduation progress.
//!
//! A poll loop reads a watch-list of token mints, fetches each token's
//! bonding-curve account from Solana and posts graduation percentage embeds
//! to one Discord channel per token.

pub use crate::utils::error::{Error, Result};

pub mod blockchain;
pub mod config;
pub mod monitor;
pub mod registry;
pub mod sink;
pub mod utils;
pub mod watchlist;
