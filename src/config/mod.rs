//! Configuration module for the graduation monitor

use crate::blockchain::curve::PUMP_FUN_PROGRAM_ID;
use crate::utils::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Poll loop configuration
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Solana RPC configuration
    #[serde(default)]
    pub solana: SolanaConfig,

    /// Retry / backoff configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Discord sink configuration
    #[serde(default)]
    pub discord: DiscordConfig,
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between poll cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Path to the JSON file holding the token watch-list
    #[serde(default = "default_tokens_file")]
    pub tokens_file: String,
}

/// Solana RPC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaConfig {
    /// RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Commitment level
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Bonding-curve program id
    #[serde(default = "default_program_id")]
    pub program_id: String,

    /// Rate limit in RPC requests per second
    #[serde(default = "default_rate_limit_rps")]
    pub rate_limit_rps: u32,
}

/// Retry / backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts for a failed RPC request
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Base delay in seconds for exponential backoff
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: f64,

    /// Maximum delay in seconds for exponential backoff
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,
}

/// Discord sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Usually supplied via the DISCORD_TOKEN environment
    /// variable rather than the config file.
    #[serde(default)]
    pub bot_token: String,

    /// Id of an existing category to hold token channels. When unset (or it
    /// no longer resolves) a category is created in the bot's first guild.
    #[serde(default)]
    pub category_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            solana: SolanaConfig::default(),
            retry: RetryConfig::default(),
            discord: DiscordConfig::default(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            tokens_file: default_tokens_file(),
        }
    }
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            commitment: default_commitment(),
            program_id: default_program_id(),
            rate_limit_rps: default_rate_limit_rps(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self { bot_token: String::new(), category_id: None }
    }
}

// --------- Helper default functions for serde ---------
fn default_interval_secs() -> u64 {
    5
}
fn default_tokens_file() -> String {
    "test_data/tokens.json".to_string()
}
fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}
fn default_commitment() -> String {
    "confirmed".to_string()
}
fn default_program_id() -> String {
    PUMP_FUN_PROGRAM_ID.to_string()
}
fn default_rate_limit_rps() -> u32 {
    10
}
fn default_max_retries() -> usize {
    5
}
fn default_base_delay_secs() -> f64 {
    1.0
}
fn default_max_delay_secs() -> f64 {
    32.0
}

impl Config {
    /// Serialize default config to TOML string
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).expect("serialize default config")
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {:?}: {}", path.as_ref(), e))
        })?;
        let mut cfg: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;
        cfg.merge_env()?;
        Ok(cfg)
    }

    /// Merge environment variables into the configuration
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(rpc_url) = env::var("SOL_MAINNET_HTTP_URL") {
            self.solana.rpc_url = rpc_url;
        }

        if let Ok(program_id) = env::var("PUMPFUN") {
            self.solana.program_id = program_id;
        }

        if let Ok(bot_token) = env::var("DISCORD_TOKEN") {
            self.discord.bot_token = bot_token;
        }

        if let Ok(category_id) = env::var("DISCORD_CATEGORY_ID") {
            self.discord.category_id = Some(category_id);
        }

        Ok(())
    }

    /// Validate the configuration for required fields and reasonable values
    pub fn validate(&self) -> Result<()> {
        if self.monitor.interval_secs == 0 {
            return Err(Error::ConfigError("monitor.interval_secs must be > 0".to_string()));
        }
        if self.monitor.tokens_file.trim().is_empty() {
            return Err(Error::ConfigError("monitor.tokens_file must be set".to_string()));
        }
        if self.solana.rpc_url.trim().is_empty() {
            return Err(Error::ConfigError("Solana RPC URL must be set".to_string()));
        }
        if self.solana.commitment.trim().is_empty() {
            return Err(Error::ConfigError("Solana commitment must be set".to_string()));
        }
        if self.solana.program_id.trim().is_empty() {
            return Err(Error::ConfigError("Bonding-curve program id must be set".to_string()));
        }
        if self.retry.base_delay_secs <= 0.0 || self.retry.max_delay_secs <= 0.0 {
            return Err(Error::ConfigError("Retry delays must be > 0".to_string()));
        }
        if self.discord.bot_token.trim().is_empty() {
            return Err(Error::ConfigError(
                "Discord bot token must be set (DISCORD_TOKEN or discord.bot_token)".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.monitor.interval_secs, 5);
        assert_eq!(config.monitor.tokens_file, "test_data/tokens.json");
        assert_eq!(config.solana.rpc_url, "https://api.mainnet-beta.solana.com");
        assert_eq!(config.solana.program_id, PUMP_FUN_PROGRAM_ID);
        assert_eq!(config.solana.rate_limit_rps, 10);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay_secs, 1.0);
        assert_eq!(config.retry.max_delay_secs, 32.0);
        assert!(config.discord.bot_token.is_empty());
        assert!(config.discord.category_id.is_none());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[monitor]\ninterval_secs = 30\n\n[solana]\nrate_limit_rps = 3\n",
        )
        .unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.monitor.interval_secs, 30);
        assert_eq!(config.monitor.tokens_file, "test_data/tokens.json");
        assert_eq!(config.solana.rate_limit_rps, 3);
        assert_eq!(config.retry.max_retries, 5);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "not valid toml [").unwrap();

        let result = Config::from_file(&config_path);
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_merge_env() {
        temp_env::with_vars(
            vec![
                ("SOL_MAINNET_HTTP_URL", Some("https://rpc.example.com")),
                ("DISCORD_TOKEN", Some("test-bot-token")),
                ("DISCORD_CATEGORY_ID", Some("123456789")),
            ],
            || {
                let mut config = Config::default();
                config.merge_env().unwrap();

                assert_eq!(config.solana.rpc_url, "https://rpc.example.com");
                assert_eq!(config.discord.bot_token, "test-bot-token");
                assert_eq!(config.discord.category_id, Some("123456789".to_string()));
            },
        );
    }

    #[test]
    fn test_validate_requires_bot_token() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.discord.bot_token = "token".to_string();
        assert!(config.validate().is_ok());

        config.monitor.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_has_all_sections() {
        let rendered = Config::default_toml();
        assert!(rendered.contains("[monitor]"));
        assert!(rendered.contains("[solana]"));
        assert!(rendered.contains("[retry]"));
        assert!(rendered.contains("[discord]"));
    }
}
