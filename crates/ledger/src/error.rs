//! Ledger error types.

use artbid_types::{Amount, ArtworkId, AuctionId};
use thiserror::Error;

/// Errors that revert a ledger call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Artwork not found: {0}")]
    ArtworkNotFound(ArtworkId),

    #[error("Auction not found: {0}")]
    AuctionNotFound(AuctionId),

    #[error("Field must not be empty: {0}")]
    EmptyField(&'static str),

    #[error("Invalid content hash")]
    InvalidContentHash,

    #[error("Artwork already sold")]
    ArtworkSold,

    #[error("Artwork already listed in a running auction")]
    AuctionAlreadyRunning,

    #[error("Invalid auction duration: {0}s")]
    InvalidDuration(u64),

    #[error("Auction is not active")]
    AuctionNotActive,

    #[error("Bidding period ended")]
    BiddingEnded,

    #[error("Creator cannot bid on own auction")]
    CreatorCannotBid,

    #[error("Invalid bid proof")]
    InvalidProof,

    #[error("Attached value {attached} does not match sealed amount")]
    ValueMismatch { attached: Amount },

    #[error("Bid must exceed the current highest bid")]
    BidTooLow,

    #[error("Auction already ended")]
    AlreadyEnded,

    #[error("Auction still running until {0}")]
    AuctionStillRunning(u64),

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Call encoding failed: {0}")]
    Encoding(String),
}
