//! Query handlers for the ledger.
//!
//! These functions provide read-only access to ledger state. Plaintext bid
//! amounts are never exposed; only a settled auction reveals its price.

use crate::state::LedgerState;
use artbid_types::{
    Amount, Artwork, ArtworkId, Auction, AuctionId, EncryptedBid, Identity, TxRef, TxStatus,
};
use serde::{Deserialize, Serialize};

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LedgerQuery {
    /// Get artwork details by ID.
    GetArtwork { artwork_id: ArtworkId },

    /// Get all artworks (paginated).
    ListArtworks { offset: u64, limit: u64 },

    /// Get auction details by ID.
    GetAuction { auction_id: AuctionId },

    /// Get all auctions (paginated).
    ListAuctions { offset: u64, limit: u64 },

    /// Get the sealed bids accepted for an auction.
    GetAuctionBids { auction_id: AuctionId },

    /// Get a transaction's lifecycle status.
    GetTransaction { tx_ref: TxRef },

    /// Get an account's released balance.
    GetBalance { address: Identity },
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LedgerQueryResponse {
    Artwork(Option<Artwork>),
    ArtworkList(Vec<Artwork>),
    Auction(Option<Auction>),
    AuctionList(Vec<Auction>),
    Bids(Vec<EncryptedBid>),
    Transaction(TxStatus),
    Balance(Amount),
}

/// Handle a query.
pub fn handle_query(state: &LedgerState, query: LedgerQuery) -> LedgerQueryResponse {
    match query {
        LedgerQuery::GetArtwork { artwork_id } => {
            LedgerQueryResponse::Artwork(state.get_artwork(artwork_id).cloned())
        }

        LedgerQuery::ListArtworks { offset, limit } => LedgerQueryResponse::ArtworkList(
            state
                .artworks
                .values()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect(),
        ),

        LedgerQuery::GetAuction { auction_id } => {
            LedgerQueryResponse::Auction(state.get_auction(auction_id).cloned())
        }

        LedgerQuery::ListAuctions { offset, limit } => LedgerQueryResponse::AuctionList(
            state
                .auctions
                .values()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect(),
        ),

        LedgerQuery::GetAuctionBids { auction_id } => {
            LedgerQueryResponse::Bids(state.get_auction_bids(auction_id).to_vec())
        }

        LedgerQuery::GetTransaction { tx_ref } => LedgerQueryResponse::Transaction(
            state
                .transactions
                .get(&tx_ref)
                .cloned()
                .unwrap_or(TxStatus::Unknown),
        ),

        LedgerQuery::GetBalance { address } => {
            LedgerQueryResponse::Balance(state.get_balance(&address))
        }
    }
}

/// Auctions currently accepting bids at `now`.
pub fn get_active_auctions(state: &LedgerState, now: u64) -> Vec<&Auction> {
    state
        .auctions
        .values()
        .filter(|auction| auction.accepts_bids_at(now))
        .collect()
}
