//! Ledger gateway abstraction.
//!
//! Writes return a transaction reference as soon as the ledger accepts them;
//! inclusion is observed separately through [`LedgerGateway::watch_transaction`].

use std::future::Future;
use std::sync::Arc;

use artbid_types::{
    Amount, Artwork, ArtworkId, Auction, AuctionId, ContentRef, EncryptedBid, Identity, TxRef,
    TxStatus,
};
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;
use tracing::warn;

use crate::config::ReadRetryConfig;

/// Classified gateway failures. Messages from the ledger are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Wallet rejected the request")]
    WalletRejected,

    #[error("Ledger unreachable: {0}")]
    Unreachable(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Not found")]
    NotFound,

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl GatewayError {
    /// Whether a read failing this way may succeed when repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unreachable(_))
    }
}

/// Stream of status observations for one transaction.
pub type StatusStream = BoxStream<'static, Result<TxStatus, GatewayError>>;

#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn create_artwork(
        &self,
        sender: &Identity,
        title: &str,
        description: &str,
        content_ref: &ContentRef,
    ) -> Result<TxRef, GatewayError>;

    async fn start_auction(
        &self,
        sender: &Identity,
        artwork_id: ArtworkId,
        duration_secs: u64,
    ) -> Result<TxRef, GatewayError>;

    /// Place a sealed bid. `value` is transferred alongside the bid and is
    /// visible to any ledger observer.
    async fn place_encrypted_bid(
        &self,
        sender: &Identity,
        bid: &EncryptedBid,
        value: Amount,
    ) -> Result<TxRef, GatewayError>;

    async fn end_auction(
        &self,
        sender: &Identity,
        auction_id: AuctionId,
    ) -> Result<TxRef, GatewayError>;

    async fn get_artwork_info(&self, artwork_id: ArtworkId)
        -> Result<Option<Artwork>, GatewayError>;

    async fn get_auction_info(&self, auction_id: AuctionId)
        -> Result<Option<Auction>, GatewayError>;

    async fn transaction_status(&self, tx_ref: &TxRef) -> Result<TxStatus, GatewayError>;

    /// Observe a transaction until it reaches a final status. Dropping the
    /// stream stops observation; it never cancels the transaction.
    fn watch_transaction(&self, tx_ref: &TxRef) -> StatusStream;
}

/// Run a read, retrying transient failures with linear backoff.
pub async fn with_read_retry<T, F, Fut>(
    policy: &ReadRetryConfig,
    op: &'static str,
    mut read: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match read().await {
            Err(e) if e.is_transient() && attempt < attempts => {
                warn!(op, attempt, error = %e, "Ledger read failed, retrying");
                tokio::time::sleep(policy.backoff(attempt)).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Read helpers with transparent retry.
#[derive(Clone)]
pub struct LedgerReader {
    gateway: Arc<dyn LedgerGateway>,
    retry: ReadRetryConfig,
}

impl LedgerReader {
    pub fn new(gateway: Arc<dyn LedgerGateway>, retry: ReadRetryConfig) -> Self {
        Self { gateway, retry }
    }

    pub async fn artwork(&self, artwork_id: ArtworkId) -> Result<Option<Artwork>, GatewayError> {
        with_read_retry(&self.retry, "get_artwork_info", || {
            self.gateway.get_artwork_info(artwork_id)
        })
        .await
    }

    pub async fn auction(&self, auction_id: AuctionId) -> Result<Option<Auction>, GatewayError> {
        with_read_retry(&self.retry, "get_auction_info", || {
            self.gateway.get_auction_info(auction_id)
        })
        .await
    }

    /// Re-query a transaction, e.g. after a local confirmation timeout.
    pub async fn transaction_status(&self, tx_ref: &TxRef) -> Result<TxStatus, GatewayError> {
        with_read_retry(&self.retry, "transaction_status", || {
            self.gateway.transaction_status(tx_ref)
        })
        .await
    }
}
