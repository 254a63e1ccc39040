//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Retry policy for ledger reads. Writes are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadRetryConfig {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Delay before the second attempt; grows linearly
    pub backoff_ms: u64,
}

impl Default for ReadRetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 250,
        }
    }
}

impl ReadRetryConfig {
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(attempt as u64))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Ledger JSON-RPC endpoint
    pub rpc_endpoint: String,

    /// Default wait for a write to confirm
    pub confirmation_timeout_secs: u64,

    /// Interval between transaction status polls
    pub confirmation_poll_ms: u64,

    pub read_retry: ReadRetryConfig,

    /// Hex network key. Fetched from the ledger when unset.
    pub network_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "http://127.0.0.1:9944".to_string(),
            confirmation_timeout_secs: 120,
            confirmation_poll_ms: 1000,
            read_retry: ReadRetryConfig::default(),
            network_key: None,
        }
    }
}

impl ClientConfig {
    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rpc_endpoint.starts_with("http://") || self.rpc_endpoint.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(format!(
                "rpc_endpoint must be an http(s) URL, got {}",
                self.rpc_endpoint
            )));
        }
        if self.confirmation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "confirmation_timeout_secs cannot be zero".into(),
            ));
        }
        if self.confirmation_poll_ms == 0 {
            return Err(ConfigError::Invalid(
                "confirmation_poll_ms cannot be zero".into(),
            ));
        }
        if self.read_retry.attempts == 0 {
            return Err(ConfigError::Invalid(
                "read_retry.attempts must be at least 1".into(),
            ));
        }
        if let Some(key) = &self.network_key {
            let bytes = hex::decode(key.trim_start_matches("0x"))
                .map_err(|e| ConfigError::Invalid(format!("network_key: {e}")))?;
            if bytes.len() != 32 {
                return Err(ConfigError::Invalid("network_key must be 32 bytes".into()));
            }
        }
        Ok(())
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_ms)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(120));
        assert_eq!(config.read_retry.attempts, 3);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            rpc_endpoint = "http://ledger.local:9944"

            [read_retry]
            attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_endpoint, "http://ledger.local:9944");
        assert_eq!(config.read_retry.attempts, 5);
        assert_eq!(config.read_retry.backoff_ms, 250);
        assert_eq!(config.confirmation_poll_ms, 1000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClientConfig {
            rpc_endpoint: "ws://nope".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ClientConfig {
            network_key: Some("abcd".into()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ClientConfig::default();
        config.read_retry.attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_grows_linearly() {
        let retry = ReadRetryConfig::default();
        assert_eq!(retry.backoff(1), Duration::from_millis(250));
        assert_eq!(retry.backoff(3), Duration::from_millis(750));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ClientConfig::load("/nonexistent/artbid.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
