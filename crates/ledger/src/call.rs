//! Call message types for the ledger.

use artbid_types::{ArtworkId, AuctionId, EncryptedBid};
use borsh::{BorshDeserialize, BorshSerialize};

/// State-changing calls accepted by the ledger.
///
/// The borsh encoding of a call, together with its sender and the ledger
/// nonce, is what a transaction reference hashes.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum LedgerCall {
    // === Artworks ===
    /// Register a new artwork owned by the sender.
    CreateArtwork {
        title: String,
        description: String,
        content_hash: String,
    },

    // === Auction Lifecycle ===
    /// List an artwork in a new auction (artwork creator only).
    StartAuction {
        artwork_id: ArtworkId,
        duration_secs: u64,
    },

    /// Place a sealed bid. The attached value travels in the clear.
    PlaceEncryptedBid { bid: EncryptedBid },

    /// Close an auction (creator at any time, anyone after it expires).
    EndAuction { auction_id: AuctionId },
}

impl LedgerCall {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCall::CreateArtwork { .. } => "create_artwork",
            LedgerCall::StartAuction { .. } => "start_auction",
            LedgerCall::PlaceEncryptedBid { .. } => "place_encrypted_bid",
            LedgerCall::EndAuction { .. } => "end_auction",
        }
    }
}
