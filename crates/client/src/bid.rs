//! Sealed bid submission.
//!
//! Amount confidentiality is NOT end to end: the ledger requires a value
//! transfer equal to the bid, so the plaintext amount is visible on the wire
//! next to the sealed payload. See [`ValueTransferExposure`].

use std::sync::Arc;
use std::time::Duration;

use artbid_crypto::{BidEncoder, TimeSource};
use artbid_types::{Amount, AmountParseError, AuctionId, EncryptedBid, TxRef};
use tracing::{info, info_span, warn, Instrument};

use crate::config::ClientConfig;
use crate::error::{SubmissionError, ValidationError};
use crate::flow::WriteFlow;
use crate::gateway::{GatewayError, LedgerGateway, LedgerReader};
use crate::session::IdentityProvider;
use crate::submission::{SubmissionHandle, SubmissionState};

/// What a ledger observer learns about the bid amount from the value
/// transfer attached to a bid write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransferExposure {
    /// The transfer equals the bid amount.
    Plaintext,
}

/// Input for one bid submission.
#[derive(Debug, Clone)]
pub struct BidRequest {
    pub auction_id: AuctionId,
    /// Decimal ether text as entered, e.g. `"2.75"`
    pub amount_text: String,
    /// Highest bid the caller has seen. A display hint; the ledger decides.
    pub known_highest: Option<Amount>,
    /// Overrides the configured confirmation timeout
    pub confirmation_timeout: Option<Duration>,
}

impl BidRequest {
    pub fn new(auction_id: AuctionId, amount_text: impl Into<String>) -> Self {
        Self {
            auction_id,
            amount_text: amount_text.into(),
            known_highest: None,
            confirmation_timeout: None,
        }
    }

    pub fn with_known_highest(mut self, highest: Amount) -> Self {
        self.known_highest = Some(highest);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = Some(timeout);
        self
    }

    /// Exposure of the amount through the attached value transfer.
    pub fn exposure(&self) -> ValueTransferExposure {
        ValueTransferExposure::Plaintext
    }
}

/// Parse and check an entered amount against the known highest bid.
pub fn validate_amount(
    amount_text: &str,
    known_highest: Option<Amount>,
) -> Result<Amount, ValidationError> {
    let amount = Amount::parse_ether(amount_text).map_err(|e| match e {
        AmountParseError::Empty => ValidationError::EmptyAmount,
        AmountParseError::Negative => ValidationError::NonPositive,
        other => ValidationError::InvalidAmount(other.to_string()),
    })?;

    if !amount.is_positive() {
        return Err(ValidationError::NonPositive);
    }
    if let Some(highest) = known_highest {
        if amount <= highest {
            return Err(ValidationError::NotHigherThanKnownHighest);
        }
    }
    Ok(amount)
}

/// Drives bids through validation, sealing, the ledger write and
/// confirmation.
pub struct BidSubmitter {
    gateway: Arc<dyn LedgerGateway>,
    session: Arc<dyn IdentityProvider>,
    encoder: Arc<dyn BidEncoder>,
    clock: Arc<dyn TimeSource>,
    reader: LedgerReader,
    config: ClientConfig,
}

impl BidSubmitter {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        session: Arc<dyn IdentityProvider>,
        encoder: Arc<dyn BidEncoder>,
        clock: Arc<dyn TimeSource>,
        config: ClientConfig,
    ) -> Self {
        Self {
            reader: LedgerReader::new(gateway.clone(), config.read_retry.clone()),
            gateway,
            session,
            encoder,
            clock,
            config,
        }
    }

    /// Submit a bid on `handle` and wait for the outcome.
    ///
    /// Returns `SubmissionInProgress` without touching the handle if another
    /// attempt is running on it. Every other failure is also recorded as
    /// `Failed` on the handle.
    pub async fn submit(
        &self,
        handle: &SubmissionHandle,
        request: BidRequest,
    ) -> Result<TxRef, SubmissionError> {
        let span = info_span!("bid", auction_id = %request.auction_id);
        self.run(handle, request).instrument(span).await
    }

    async fn run(
        &self,
        handle: &SubmissionHandle,
        request: BidRequest,
    ) -> Result<TxRef, SubmissionError> {
        let flow = WriteFlow::begin(handle)?;
        info!("Bid submission started");

        // Validating
        let bidder = flow.require_identity(self.session.as_ref())?;
        let amount = validate_amount(&request.amount_text, request.known_highest)
            .map_err(|e| flow.fail(e.into()))?;

        match self.reader.auction(request.auction_id).await {
            Ok(Some(auction)) if auction.active && !auction.ended => {}
            Ok(Some(_)) => return Err(flow.fail(ValidationError::AuctionNotActive.into())),
            Ok(None) => return Err(flow.fail(GatewayError::NotFound.into())),
            Err(e) => return Err(flow.fail(e.into())),
        }

        // Encoding
        flow.enter(SubmissionState::Encoding)?;
        let sealed = self
            .encoder
            .encode(amount, &bidder, request.auction_id, self.clock.as_ref())
            .map_err(|e| flow.fail(SubmissionError::Encoding(e.to_string())))?;
        let bid = EncryptedBid {
            auction_id: request.auction_id,
            encrypted_amount: sealed.encrypted_amount,
            proof: sealed.proof,
            submitted_by: bidder,
            client_timestamp: sealed.sealed_at,
        };

        // Pending
        warn!(
            exposure = ?request.exposure(),
            "Bid value transfer reveals the bid amount to ledger observers"
        );
        let tx_ref = flow
            .write(self.gateway.place_encrypted_bid(&bidder, &bid, amount))
            .await?;

        // Confirming
        let timeout = request
            .confirmation_timeout
            .unwrap_or_else(|| self.config.confirmation_timeout());
        flow.confirm(self.gateway.as_ref(), &tx_ref, timeout).await?;
        flow.complete(&tx_ref)?;
        Ok(tx_ref)
    }
}
