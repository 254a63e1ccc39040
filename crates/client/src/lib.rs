//! Client for sealed-bid art auctions.
//!
//! This crate provides:
//! - Sealed bid submission with a single observable lifecycle per handle
//! - Artwork registration and auction administration
//! - A ledger gateway abstraction with a JSON-RPC implementation
//! - Read helpers with transparent retry
//!
//! Amounts are sealed before leaving the client, but the ledger also
//! receives a value transfer equal to the bid. Observers of the ledger can
//! therefore read bid amounts; see [`bid::ValueTransferExposure`].

pub mod bid;
pub mod config;
pub mod error;
mod flow;
pub mod gateway;
pub mod registration;
pub mod rpc;
pub mod session;
pub mod submission;

#[cfg(test)]
pub(crate) mod test_support;

pub use bid::{validate_amount, BidRequest, BidSubmitter, ValueTransferExposure};
pub use config::{ClientConfig, ConfigError, ReadRetryConfig};
pub use error::{SubmissionError, ValidationError};
pub use gateway::{with_read_retry, GatewayError, LedgerGateway, LedgerReader, StatusStream};
pub use registration::{ArtworkDraft, ArtworkRegistrar, AuctionAdmin, AuctionSettlement};
pub use rpc::RpcLedgerGateway;
pub use session::{IdentityProvider, StaticSession};
pub use submission::{SubmissionHandle, SubmissionState};
