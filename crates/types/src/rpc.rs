//! JSON-RPC parameter and response types shared by the ledger server and
//! the client gateway.
//!
//! Snapshots (`Artwork`, `Auction`, `TxStatus`) are serialized directly; only
//! call parameters and node metadata need dedicated wire structs.

use serde::{Deserialize, Serialize};

use crate::{Amount, ArtworkId, AuctionId, EncryptedBid, Identity};

/// Error code for a request the sender's wallet refused to sign.
pub const WALLET_REJECTED_CODE: i32 = 4001;

/// Error code for a call the ledger refused at admission.
pub const LEDGER_REJECTED_CODE: i32 = -32010;

/// Block info response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// Parameters for registering an artwork.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArtworkParams {
    pub sender: Identity,
    pub title: String,
    pub description: String,
    pub content_hash: String,
}

/// Parameters for opening an auction on an artwork.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartAuctionParams {
    pub sender: Identity,
    pub artwork_id: ArtworkId,
    pub duration_secs: u64,
}

/// Parameters for placing a sealed bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidParams {
    pub sender: Identity,
    pub bid: EncryptedBid,
    /// Value transferred with the bid (publicly visible)
    pub value: Amount,
}

/// Parameters for closing an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndAuctionParams {
    pub sender: Identity,
    pub auction_id: AuctionId,
}

/// Sealing parameters published by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkKeyRpc {
    /// Hex-encoded 32-byte key
    pub key: String,
    /// Scheme label, e.g. "aes256gcm-pedersen-v1"
    pub scheme: String,
}
