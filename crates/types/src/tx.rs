//! Transaction references and confirmation status.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{Amount, ArtworkId, AuctionId, Identity};

/// Reference to a submitted ledger transaction.
///
/// Opaque to the client; the reference ledger uses `0x`-prefixed hashes.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TxRef(String);

impl TxRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Reference derived from a 32-byte transaction hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(format!("0x{}", hex::encode(hash)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display, e.g. `0x1a2b3c4d...`.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(10)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Effect of a confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TxOutcome {
    ArtworkCreated {
        artwork_id: ArtworkId,
    },
    AuctionStarted {
        auction_id: AuctionId,
    },
    BidPlaced {
        auction_id: AuctionId,
        bid_count: u32,
    },
    AuctionEnded {
        auction_id: AuctionId,
        winner: Option<Identity>,
        winning_price: Option<Amount>,
    },
}

/// Receipt of a transaction included in a block.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_ref: TxRef,
    pub block_height: u64,
    pub outcome: TxOutcome,
}

/// Ledger-side lifecycle of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxStatus {
    /// Accepted into the pending pool, not yet in a block
    Pending,
    /// Included and applied
    Confirmed { receipt: TxReceipt },
    /// Included but rejected by the ledger rules
    Reverted { reason: String },
    /// Not known to the ledger
    Unknown,
}

impl TxStatus {
    /// Whether the status can no longer change.
    pub fn is_final(&self) -> bool {
        matches!(self, TxStatus::Confirmed { .. } | TxStatus::Reverted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_ref_from_hash() {
        let tx = TxRef::from_hash([0xab; 32]);
        assert!(tx.as_str().starts_with("0xabab"));
        assert_eq!(tx.as_str().len(), 66);
        assert_eq!(tx.short(), "0xabababab");
    }

    #[test]
    fn test_tx_ref_short_on_short_input() {
        assert_eq!(TxRef::new("0xabc").short(), "0xabc");
    }

    #[test]
    fn test_status_finality() {
        assert!(!TxStatus::Pending.is_final());
        assert!(!TxStatus::Unknown.is_final());
        assert!(TxStatus::Reverted {
            reason: "bid too low".into()
        }
        .is_final());
    }
}
