//! Server configuration for the mock ledger.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use artbid_ledger::LedgerGenesisConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockLedgerConfig {
    /// Listen address for the JSON-RPC server
    pub addr: SocketAddr,

    /// Produce a block on this interval. Blocks are only produced through
    /// `admin_advanceBlock` when unset.
    pub block_interval_ms: Option<u64>,

    pub genesis: LedgerGenesisConfig,
}

impl Default for MockLedgerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 9944)),
            block_interval_ms: None,
            genesis: LedgerGenesisConfig::default(),
        }
    }
}

impl MockLedgerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw).context("Invalid mock ledger config")?;
        config.genesis.validate()?;
        Ok(config)
    }
}
