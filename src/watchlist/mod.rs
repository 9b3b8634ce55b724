//! Token watch-list loading
//!
//! The watch-list is a JSON file of the form `{"tokens": ["<mint>", ...]}`.
//! It is re-read on every poll cycle so edits take effect without a restart.

use crate::utils::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct WatchlistFile {
    tokens: Vec<String>,
}

/// Reads the set of watched token mints from a JSON file.
pub struct WatchlistSource {
    path: PathBuf,
}

impl WatchlistSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current watch-list. A missing or malformed file yields an empty set
    /// so a bad edit pauses notifications instead of killing the monitor.
    pub fn read_tokens(&self) -> HashSet<String> {
        match self.try_read() {
            Ok(tokens) => tokens,
            Err(e) => {
                log::warn!("Failed to read watch-list {}: {}", self.path.display(), e);
                HashSet::new()
            }
        }
    }

    fn try_read(&self) -> Result<HashSet<String>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::WatchListReadError(e.to_string()))?;
        let parsed: WatchlistFile = serde_json::from_str(&content)
            .map_err(|e| Error::WatchListReadError(e.to_string()))?;
        Ok(parsed.tokens.into_iter().collect())
    }
}
