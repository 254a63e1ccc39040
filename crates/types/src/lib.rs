//! Core type definitions for sealed-bid art auctions.
//!
//! This crate provides the data structures shared by the bid client, the
//! reference ledger and the JSON-RPC surface: identities, artwork and auction
//! snapshots, sealed bids and transaction receipts.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

pub mod amount;
pub mod rpc;
pub mod tx;

pub use amount::{Amount, AmountParseError, WEI_PER_ETHER};
pub use tx::{TxOutcome, TxReceipt, TxRef, TxStatus};

// =========================
// IDENTITIES
// =========================

/// Errors from parsing textual identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid content reference: {0}")]
    InvalidContentRef(&'static str),
}

/// Account identity on the ledger (20-byte address).
///
/// Rendered as `0x`-prefixed lowercase hex.
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub struct Identity(pub [u8; 20]);

impl Identity {
    /// The all-zero address, never a valid bidder.
    pub const ZERO: Identity = Identity([0u8; 20]);

    /// Whether this is the all-zero address.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self)
    }
}

impl FromStr for Identity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x"))
            .map_err(|e| ParseError::InvalidHex(e.to_string()))?;
        let got = bytes.len();
        let addr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ParseError::InvalidLength { expected: 20, got })?;
        Ok(Identity(addr))
    }
}

/// Ledger-assigned artwork identifier.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ArtworkId(pub u64);

impl fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger-assigned auction identifier.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct AuctionId(pub u64);

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================
// CONTENT REFERENCES
// =========================

/// Opaque content-address of an artwork's media (e.g. an upload hash).
///
/// The bid pipeline never interprets it beyond requiring it to be a
/// non-empty token without whitespace or control characters.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub struct ContentRef(String);

impl ContentRef {
    /// Validate and wrap an externally produced content hash.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if s.is_empty() {
            return Err(ParseError::InvalidContentRef("empty"));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ParseError::InvalidContentRef(
                "contains whitespace or control characters",
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Content-address raw media bytes as `sha256:<hex>`.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(format!("sha256:{}", hex::encode(sha256(data))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentRef {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =========================
// LEDGER SNAPSHOTS
// =========================

/// Registered artwork as reported by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Artwork {
    pub id: ArtworkId,
    pub title: String,
    pub description: String,
    pub content_ref: ContentRef,
    pub creator: Identity,
    /// Currently listed in a running auction
    pub active: bool,
    pub sold: bool,
}

/// Auction snapshot as reported by the ledger.
///
/// Snapshots are eventually consistent; the ledger stays authoritative for
/// bid ordering.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub artwork_id: ArtworkId,
    pub creator: Identity,

    /// Sealed payload of the leading bid (opaque until settlement)
    #[serde_as(as = "serde_with::hex::Hex")]
    pub sealed_highest_bid: Vec<u8>,
    pub bid_count: u32,
    pub highest_bidder: Option<Identity>,

    pub active: bool,
    pub ended: bool,
    pub start_time: u64,
    pub end_time: u64,

    /// Winning price, revealed once the auction has ended
    pub settled_price: Option<Amount>,
}

impl Auction {
    /// Whether the snapshot says the auction accepts bids at `now`.
    pub fn accepts_bids_at(&self, now: u64) -> bool {
        self.active && !self.ended && now >= self.start_time && now < self.end_time
    }
}

/// A sealed bid as handed to the ledger gateway.
///
/// Immutable once built; the client never decrypts it.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EncryptedBid {
    pub auction_id: AuctionId,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub encrypted_amount: Vec<u8>,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub proof: Vec<u8>,
    pub submitted_by: Identity,
    /// Unix seconds on the submitting client's clock
    pub client_timestamp: u64,
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Domain-separated identifier binding a sealed amount to its auction and bidder.
pub fn bid_binding(auction_id: AuctionId, bidder: &Identity) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"SEALED_ART_BID_V1:");
    hasher.update(auction_id.0.to_le_bytes());
    hasher.update(bidder.0);
    hasher.finalize().into()
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).into()
}
