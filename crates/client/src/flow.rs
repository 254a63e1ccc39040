//! Write driver shared by the bid and registration coordinators.

use std::future::Future;
use std::time::Duration;

use artbid_types::{Identity, TxReceipt, TxRef, TxStatus};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::SubmissionError;
use crate::gateway::{GatewayError, LedgerGateway};
use crate::session::IdentityProvider;
use crate::submission::{Attempt, SubmissionHandle, SubmissionState};

/// One attempt on a [`SubmissionHandle`].
pub(crate) struct WriteFlow<'a> {
    handle: &'a SubmissionHandle,
    attempt: Attempt,
}

impl<'a> WriteFlow<'a> {
    /// Move the handle to `Validating`, or fail with `SubmissionInProgress`
    /// leaving the running attempt untouched.
    pub(crate) fn begin(handle: &'a SubmissionHandle) -> Result<Self, SubmissionError> {
        let attempt = handle.begin()?;
        Ok(Self { handle, attempt })
    }

    /// Record `err` as the terminal reason and hand it back.
    pub(crate) fn fail(&self, err: SubmissionError) -> SubmissionError {
        if self
            .handle
            .advance(self.attempt, SubmissionState::Failed(err.clone()))
        {
            warn!(error = %err, "Submission failed");
            err
        } else {
            SubmissionError::Abandoned
        }
    }

    pub(crate) fn enter(&self, next: SubmissionState) -> Result<(), SubmissionError> {
        if self.handle.advance(self.attempt, next) {
            Ok(())
        } else {
            Err(SubmissionError::Abandoned)
        }
    }

    /// Caller identity, or `NotConnected`.
    pub(crate) fn require_identity(
        &self,
        session: &dyn IdentityProvider,
    ) -> Result<Identity, SubmissionError> {
        match session.current_identity() {
            Some(identity) if session.is_connected() => Ok(identity),
            _ => Err(self.fail(SubmissionError::NotConnected)),
        }
    }

    /// Perform the ledger write once and move to `Pending` on acceptance.
    pub(crate) async fn write<F>(&self, write: F) -> Result<TxRef, SubmissionError>
    where
        F: Future<Output = Result<TxRef, GatewayError>>,
    {
        match write.await {
            Ok(tx_ref) => {
                info!(tx_ref = %tx_ref.short(), "Write accepted");
                self.enter(SubmissionState::Pending(tx_ref.clone()))?;
                Ok(tx_ref)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Observe `tx_ref` until it is final, the wait times out, or the handle
    /// is reset. Leaves the handle in `Confirming` on success so the caller
    /// can inspect the receipt before completing.
    pub(crate) async fn confirm(
        &self,
        gateway: &dyn LedgerGateway,
        tx_ref: &TxRef,
        timeout: Duration,
    ) -> Result<TxReceipt, SubmissionError> {
        self.enter(SubmissionState::Confirming(tx_ref.clone()))?;

        let mut statuses = gateway.watch_transaction(tx_ref);
        let wait = async {
            while let Some(item) = statuses.next().await {
                match item {
                    Ok(TxStatus::Confirmed { receipt }) => return Ok(receipt),
                    Ok(TxStatus::Reverted { reason }) => {
                        return Err(SubmissionError::Gateway(GatewayError::Reverted(reason)))
                    }
                    Ok(status) => debug!(tx_ref = %tx_ref.short(), ?status, "Awaiting inclusion"),
                    Err(e) if e.is_transient() => {
                        debug!(tx_ref = %tx_ref.short(), error = %e, "Status poll failed")
                    }
                    Err(e) => return Err(SubmissionError::Gateway(e)),
                }
            }
            Err(SubmissionError::Gateway(GatewayError::Protocol(
                "status stream closed".into(),
            )))
        };

        let outcome = tokio::select! {
            result = tokio::time::timeout(timeout, wait) => result,
            _ = self.handle.abandoned(self.attempt) => {
                debug!(tx_ref = %tx_ref.short(), "Stopped observing abandoned submission");
                return Err(SubmissionError::Abandoned);
            }
        };

        match outcome {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(e)) => Err(self.fail(e)),
            Err(_elapsed) => Err(self.fail(SubmissionError::ConfirmationTimeout {
                tx_ref: tx_ref.clone(),
            })),
        }
    }

    pub(crate) fn complete(&self, tx_ref: &TxRef) -> Result<(), SubmissionError> {
        self.enter(SubmissionState::Confirmed(tx_ref.clone()))?;
        info!(tx_ref = %tx_ref.short(), "Submission confirmed");
        Ok(())
    }
}
