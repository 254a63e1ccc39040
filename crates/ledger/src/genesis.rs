//! Genesis configuration for the ledger.

use artbid_crypto::NetworkKey;
use serde::{Deserialize, Serialize};

/// Limits applied when auctions are started.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionRules {
    /// Shortest allowed auction, in seconds
    pub min_duration_secs: u64,
    /// Longest allowed auction, in seconds
    pub max_duration_secs: u64,
}

impl Default for AuctionRules {
    fn default() -> Self {
        Self {
            min_duration_secs: 60,
            max_duration_secs: 30 * 24 * 60 * 60,
        }
    }
}

impl AuctionRules {
    pub fn allows_duration(&self, duration_secs: u64) -> bool {
        duration_secs > 0
            && duration_secs >= self.min_duration_secs
            && duration_secs <= self.max_duration_secs
    }
}

/// Genesis configuration for the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerGenesisConfig {
    /// Timestamp of block zero (unix seconds)
    pub initial_timestamp: u64,

    /// Seconds added to the ledger clock per produced block
    pub block_time_secs: u64,

    /// Hex network key; a fresh key is generated when absent
    pub network_key: Option<String>,

    /// Auction limits
    pub rules: AuctionRules,
}

impl Default for LedgerGenesisConfig {
    fn default() -> Self {
        Self {
            initial_timestamp: 1_700_000_000,
            block_time_secs: 6,
            network_key: None,
            rules: AuctionRules::default(),
        }
    }
}

impl LedgerGenesisConfig {
    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.block_time_secs == 0 {
            return Err(GenesisValidationError::InvalidBlockTime);
        }

        if self.rules.min_duration_secs == 0 {
            return Err(GenesisValidationError::InvalidRules(
                "Minimum duration cannot be zero".into(),
            ));
        }
        if self.rules.min_duration_secs > self.rules.max_duration_secs {
            return Err(GenesisValidationError::InvalidRules(
                "Minimum duration exceeds maximum".into(),
            ));
        }

        if let Some(key) = &self.network_key {
            NetworkKey::from_hex(key).map_err(|_| GenesisValidationError::InvalidNetworkKey)?;
        }

        Ok(())
    }

    /// Resolve the configured network key, generating one if unset.
    pub fn network_key(&self) -> Result<NetworkKey, GenesisValidationError> {
        match &self.network_key {
            Some(key) => {
                NetworkKey::from_hex(key).map_err(|_| GenesisValidationError::InvalidNetworkKey)
            }
            None => Ok(NetworkKey::generate()),
        }
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Block time cannot be zero")]
    InvalidBlockTime,

    #[error("Invalid auction rules: {0}")]
    InvalidRules(String),

    #[error("Invalid network key")]
    InvalidNetworkKey,
}
