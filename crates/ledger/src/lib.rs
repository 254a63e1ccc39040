//! In-memory ledger for sealed-bid art auctions.
//!
//! Holds artworks and auctions, accepts sealed bids and compares them through
//! a [`artbid_crypto::BidVerifier`], and produces blocks that move submitted
//! transactions from pending to confirmed or reverted.
//!
//! # Layout
//!
//! [`LedgerNode`] owns a [`LedgerState`] and a pending pool of
//! [`LedgerCall`]s. Producing a block runs each call through the matching
//! function in [`handlers`]; a handler error reverts that call alone and
//! refunds its attached value. [`queries`] answers reads without touching
//! the pool, and [`genesis`] holds the startup parameters and auction rules.
//!
//! # Example
//!
//! ```ignore
//! use artbid_ledger::{LedgerCall, LedgerGenesisConfig, LedgerNode};
//!
//! let mut node = LedgerNode::from_genesis(&LedgerGenesisConfig::default())?;
//! let tx = node.submit(sender, Amount::ZERO, LedgerCall::CreateArtwork { .. })?;
//! node.produce_block();
//! assert!(node.tx_status(&tx).is_final());
//! ```

pub mod call;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod node;
pub mod queries;
pub mod state;

pub use call::LedgerCall;
pub use error::LedgerError;
pub use genesis::{AuctionRules, GenesisValidationError, LedgerGenesisConfig};
pub use handlers::{CallContext, HandlerResult};
pub use node::LedgerNode;
pub use queries::{LedgerQuery, LedgerQueryResponse};
pub use state::LedgerState;
