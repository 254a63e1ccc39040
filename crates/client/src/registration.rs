//! Artwork registration and auction administration.
//!
//! Same write lifecycle as bidding without the encoding step:
//! `Idle -> Validating -> Pending -> Confirming -> Confirmed`.

use std::sync::Arc;
use std::time::Duration;

use artbid_types::{
    Amount, ArtworkId, AuctionId, ContentRef, Identity, TxOutcome, TxReceipt, TxRef,
};
use futures::future::BoxFuture;
use tracing::{info, info_span, Instrument};

use crate::config::ClientConfig;
use crate::error::{SubmissionError, ValidationError};
use crate::flow::WriteFlow;
use crate::gateway::{GatewayError, LedgerGateway};
use crate::session::IdentityProvider;
use crate::submission::SubmissionHandle;

/// Artwork metadata as entered by the creator.
#[derive(Debug, Clone)]
pub struct ArtworkDraft {
    pub title: String,
    pub description: String,
    /// Content address produced by the upload step
    pub content_hash: String,
}

impl ArtworkDraft {
    /// Check required fields and parse the content reference.
    pub fn validate(&self) -> Result<ContentRef, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyField("description"));
        }
        if self.content_hash.trim().is_empty() {
            return Err(ValidationError::EmptyField("content_hash"));
        }
        ContentRef::parse(&self.content_hash).map_err(|_| ValidationError::InvalidContentRef)
    }
}

/// Result of a confirmed `end_auction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionSettlement {
    pub auction_id: AuctionId,
    pub winner: Option<Identity>,
    pub winning_price: Option<Amount>,
}

fn unexpected(receipt: &TxReceipt) -> SubmissionError {
    GatewayError::Protocol(format!("unexpected outcome {:?}", receipt.outcome)).into()
}

type WriteResult = Result<TxRef, GatewayError>;

/// Shared plumbing for non-bid writes.
struct Writer {
    gateway: Arc<dyn LedgerGateway>,
    session: Arc<dyn IdentityProvider>,
    timeout: Duration,
}

impl Writer {
    /// Run the write lifecycle. `validate` yields what `write` needs;
    /// `extract` maps the confirmed receipt to the caller's result and a
    /// mismatching receipt fails the attempt.
    async fn run<P, T, V, W, E>(
        &self,
        handle: &SubmissionHandle,
        validate: V,
        write: W,
        extract: E,
    ) -> Result<T, SubmissionError>
    where
        V: FnOnce() -> Result<P, ValidationError>,
        W: FnOnce(Arc<dyn LedgerGateway>, Identity, P) -> BoxFuture<'static, WriteResult>,
        E: FnOnce(&TxReceipt) -> Option<T>,
    {
        let flow = WriteFlow::begin(handle)?;
        let sender = flow.require_identity(self.session.as_ref())?;
        let params = validate().map_err(|e| flow.fail(e.into()))?;

        let tx_ref = flow
            .write(write(self.gateway.clone(), sender, params))
            .await?;
        let receipt = flow
            .confirm(self.gateway.as_ref(), &tx_ref, self.timeout)
            .await?;

        match extract(&receipt) {
            Some(value) => {
                flow.complete(&tx_ref)?;
                Ok(value)
            }
            None => Err(flow.fail(unexpected(&receipt))),
        }
    }
}

/// Registers artworks on the ledger.
pub struct ArtworkRegistrar {
    writer: Writer,
}

impl ArtworkRegistrar {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        session: Arc<dyn IdentityProvider>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            writer: Writer {
                gateway,
                session,
                timeout: config.confirmation_timeout(),
            },
        }
    }

    /// Register `draft` and return the ledger-assigned id once confirmed.
    pub async fn register(
        &self,
        handle: &SubmissionHandle,
        draft: ArtworkDraft,
    ) -> Result<ArtworkId, SubmissionError> {
        let artwork_id = self
            .writer
            .run(
                handle,
                || draft.validate(),
                |gateway, sender, content_ref| {
                    let ArtworkDraft {
                        title, description, ..
                    } = draft.clone();
                    Box::pin(async move {
                        gateway
                            .create_artwork(&sender, &title, &description, &content_ref)
                            .await
                    })
                },
                |receipt| match receipt.outcome {
                    TxOutcome::ArtworkCreated { artwork_id } => Some(artwork_id),
                    _ => None,
                },
            )
            .instrument(info_span!("register_artwork"))
            .await?;

        info!(%artwork_id, "Artwork registered");
        Ok(artwork_id)
    }
}

/// Starts and ends auctions.
pub struct AuctionAdmin {
    writer: Writer,
}

impl AuctionAdmin {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        session: Arc<dyn IdentityProvider>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            writer: Writer {
                gateway,
                session,
                timeout: config.confirmation_timeout(),
            },
        }
    }

    pub async fn start_auction(
        &self,
        handle: &SubmissionHandle,
        artwork_id: ArtworkId,
        duration_secs: u64,
    ) -> Result<AuctionId, SubmissionError> {
        let auction_id = self
            .writer
            .run(
                handle,
                || {
                    if artwork_id.0 == 0 {
                        return Err(ValidationError::InvalidId);
                    }
                    if duration_secs == 0 {
                        return Err(ValidationError::InvalidDuration);
                    }
                    Ok(())
                },
                |gateway, sender, ()| {
                    Box::pin(async move {
                        gateway
                            .start_auction(&sender, artwork_id, duration_secs)
                            .await
                    })
                },
                |receipt| match receipt.outcome {
                    TxOutcome::AuctionStarted { auction_id } => Some(auction_id),
                    _ => None,
                },
            )
            .instrument(info_span!("start_auction", %artwork_id))
            .await?;

        info!(%auction_id, "Auction started");
        Ok(auction_id)
    }

    pub async fn end_auction(
        &self,
        handle: &SubmissionHandle,
        auction_id: AuctionId,
    ) -> Result<AuctionSettlement, SubmissionError> {
        self.writer
            .run(
                handle,
                || {
                    if auction_id.0 == 0 {
                        return Err(ValidationError::InvalidId);
                    }
                    Ok(())
                },
                |gateway, sender, ()| {
                    Box::pin(async move { gateway.end_auction(&sender, auction_id).await })
                },
                |receipt| match &receipt.outcome {
                    TxOutcome::AuctionEnded {
                        auction_id,
                        winner,
                        winning_price,
                    } => Some(AuctionSettlement {
                        auction_id: *auction_id,
                        winner: *winner,
                        winning_price: *winning_price,
                    }),
                    _ => None,
                },
            )
            .instrument(info_span!("end_auction", %auction_id))
            .await
    }
}
