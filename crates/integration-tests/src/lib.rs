//! End-to-end integration tests for sealed-bid art auctions.
//!
//! These tests drive the client pipeline against an in-process ledger:
//! 1. Artwork registration
//! 2. Auction start
//! 3. Sealed bid submission, outbidding and reverts
//! 4. Auction end and settlement

pub mod local;

pub use local::{LocalLedgerGateway, Mining};
