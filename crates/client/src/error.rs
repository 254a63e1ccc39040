//! Error types for submissions.

use artbid_types::TxRef;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Local validation failures. These never reach the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Bid amount is empty")]
    EmptyAmount,

    #[error("Bid amount must be positive")]
    NonPositive,

    #[error("Bid must be higher than the current highest bid")]
    NotHigherThanKnownHighest,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Field must not be empty: {0}")]
    EmptyField(&'static str),

    #[error("Content reference is malformed")]
    InvalidContentRef,

    #[error("Identifier must be positive")]
    InvalidId,

    #[error("Auction duration must be positive")]
    InvalidDuration,

    #[error("Auction is not accepting bids")]
    AuctionNotActive,
}

/// Reason a submission ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Bid encoding failed: {0}")]
    Encoding(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The local watch gave up. The write may still land; query the
    /// transaction by reference instead of resubmitting.
    #[error("Timed out waiting for confirmation of {tx_ref}")]
    ConfirmationTimeout { tx_ref: TxRef },

    #[error("A submission is already in progress on this handle")]
    SubmissionInProgress,

    /// The handle was reset while this attempt was running.
    #[error("Submission abandoned")]
    Abandoned,
}

impl SubmissionError {
    /// Whether a fresh submission with the same input may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            SubmissionError::Gateway(_) | SubmissionError::NotConnected
        )
    }

    /// Reference of a write that may still confirm.
    pub fn pending_tx(&self) -> Option<&TxRef> {
        match self {
            SubmissionError::ConfirmationTimeout { tx_ref } => Some(tx_ref),
            _ => None,
        }
    }
}
