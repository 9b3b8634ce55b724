//! Error handling for the graduation monitor.

use thiserror::Error;

/// Main error type for the monitor
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Watch-list file could not be read or parsed
    #[error("Watch-list error: {0}")]
    WatchListReadError(String),

    /// No on-chain account exists at the derived address
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Account data too short or numerically undefined
    #[error("Invalid account data: {0}")]
    InvalidFormat(String),

    /// RPC / network errors
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Notification sink session errors
    #[error("Sink connection error: {0}")]
    SinkConnectionError(String),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

/// Result type for the monitor
pub type Result<T> = std::result::Result<T, Error>;

// All HTTP traffic in this crate goes to the notification sink.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::SinkConnectionError(err.to_string())
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_error = Error::ConfigError("missing field".to_string());
        assert_eq!(
            config_error.to_string(),
            "Configuration error: missing field"
        );

        let not_found = Error::NotFound("no account for mint abc".to_string());
        assert_eq!(not_found.to_string(), "Account not found: no account for mint abc");

        let invalid = Error::InvalidFormat("buffer is 12 bytes".to_string());
        assert!(invalid.to_string().contains("Invalid account data"));

        let transport = Error::TransportError("connection reset".to_string());
        assert!(transport.to_string().contains("Transport error"));

        let str_error = Error::from("custom error");
        assert_eq!(str_error.to_string(), "Error: custom error");
    }

    #[test]
    fn test_result_type() {
        fn might_fail() -> Result<()> {
            if true {
                Ok(())
            } else {
                Err(Error::Other("error".to_string()))
            }
        }

        assert!(might_fail().is_ok());
    }
}
