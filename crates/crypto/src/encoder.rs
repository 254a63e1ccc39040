//! Capability traits for sealing and opening bids.

use std::time::{SystemTime, UNIX_EPOCH};

use artbid_types::{Amount, AuctionId, Identity};

use crate::error::CryptoError;

/// Source of wall-clock time in unix seconds.
pub trait TimeSource: Send + Sync {
    fn now_unix(&self) -> u64;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock pinned to a fixed instant, for tests and replay tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl TimeSource for FixedClock {
    fn now_unix(&self) -> u64 {
        self.0
    }
}

/// Output of sealing a bid. Both byte strings are opaque to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBid {
    pub encrypted_amount: Vec<u8>,
    pub proof: Vec<u8>,
    /// Clock reading embedded in the sealed payload
    pub sealed_at: u64,
}

/// Seals plaintext bid amounts.
///
/// Implementations must not perform I/O. Sealing MAY mix in a random nonce
/// and the current time, so repeated calls with identical inputs are
/// expected to produce different bytes: every submission is a distinct
/// event and there is no idempotence guarantee.
pub trait BidEncoder: Send + Sync {
    /// Seal `amount` for `bidder` in `auction_id`.
    ///
    /// Fails with [`CryptoError::InvalidInput`] when the amount is zero or the
    /// bidder is the empty identity.
    fn encode(
        &self,
        amount: Amount,
        bidder: &Identity,
        auction_id: AuctionId,
        clock: &dyn TimeSource,
    ) -> Result<SealedBid, CryptoError>;
}

/// A bid recovered by a [`BidVerifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedBid {
    pub amount: Amount,
    pub sealed_at: u64,
}

/// Opens sealed bids. Held by the ledger's comparison service and by audit
/// tooling, never by the bid submission path.
pub trait BidVerifier: Send + Sync {
    fn open(
        &self,
        auction_id: AuctionId,
        bidder: &Identity,
        encrypted_amount: &[u8],
        proof: &[u8],
    ) -> Result<OpenedBid, CryptoError>;
}

pub(crate) fn check_encode_inputs(amount: Amount, bidder: &Identity) -> Result<(), CryptoError> {
    if !amount.is_positive() {
        return Err(CryptoError::InvalidInput("amount must be positive".into()));
    }
    if bidder.is_empty() {
        return Err(CryptoError::InvalidInput("bidder identity is empty".into()));
    }
    Ok(())
}
