//! Per-submission lifecycle state.
//!
//! ```text
//! Idle -> Validating -> Encoding -> Pending(tx) -> Confirming(tx) -> Confirmed(tx)
//!              \            \            \               \
//!               `------------`------------`---------------`--> Failed(reason)
//! ```
//!
//! Registration skips `Encoding`. Transitions never regress within an
//! attempt; only [`SubmissionHandle::reset`] (navigate away) or a fresh
//! submission on a terminal handle starts over.

use std::sync::Arc;

use artbid_types::TxRef;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::error::SubmissionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Encoding,
    Pending(TxRef),
    Confirming(TxRef),
    Confirmed(TxRef),
    Failed(SubmissionError),
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Validating => "validating",
            SubmissionState::Encoding => "encoding",
            SubmissionState::Pending(_) => "pending",
            SubmissionState::Confirming(_) => "confirming",
            SubmissionState::Confirmed(_) => "confirmed",
            SubmissionState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Confirmed(_) | SubmissionState::Failed(_)
        )
    }

    /// A submission is running and a new one must not start.
    pub fn is_in_flight(&self) -> bool {
        !self.is_terminal() && *self != SubmissionState::Idle
    }

    /// Reference of a write that is in flight, confirmed, or may still
    /// confirm. A `Failed` state only carries one for
    /// `ConfirmationTimeout`; a reverted write is final and its reference
    /// lives on [`SubmissionHandle::tx_ref`].
    pub fn tx_ref(&self) -> Option<&TxRef> {
        match self {
            SubmissionState::Pending(tx)
            | SubmissionState::Confirming(tx)
            | SubmissionState::Confirmed(tx) => Some(tx),
            SubmissionState::Failed(e) => e.pending_tx(),
            _ => None,
        }
    }

    /// Whether `next` is a legal forward step from `self`.
    pub fn can_transition_to(&self, next: &SubmissionState) -> bool {
        use SubmissionState::*;
        match (self, next) {
            (Idle, Validating) => true,
            (Validating, Encoding) | (Validating, Pending(_)) => true,
            (Encoding, Pending(_)) => true,
            (Pending(a), Confirming(b)) | (Pending(a), Confirmed(b)) => a == b,
            (Confirming(a), Confirmed(b)) => a == b,
            (Validating | Encoding | Pending(_) | Confirming(_), Failed(_)) => true,
            _ => false,
        }
    }
}

/// Token tying transitions to the attempt that started them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    epoch: u64,
}

#[derive(Debug)]
struct Slot {
    state: SubmissionState,
    tx_ref: Option<TxRef>,
    epoch: u64,
}

#[derive(Debug)]
struct Inner {
    slot: Mutex<Slot>,
    state_tx: watch::Sender<SubmissionState>,
    epoch_tx: watch::Sender<u64>,
}

/// Observable handle for one submission slot.
///
/// Cheap to clone; clones share the same slot. At most one attempt runs per
/// handle at a time.
#[derive(Debug, Clone)]
pub struct SubmissionHandle {
    inner: Arc<Inner>,
}

impl Default for SubmissionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionHandle {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(SubmissionState::Idle);
        let (epoch_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot {
                    state: SubmissionState::Idle,
                    tx_ref: None,
                    epoch: 0,
                }),
                state_tx,
                epoch_tx,
            }),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.inner.slot.lock().state.clone()
    }

    /// Reference of the last write the ledger accepted on this handle,
    /// whatever its outcome. Kept after any failure that follows the write
    /// so the transaction can be re-queried; cleared by [`reset`] and by a
    /// new attempt.
    ///
    /// [`reset`]: SubmissionHandle::reset
    pub fn tx_ref(&self) -> Option<TxRef> {
        self.inner.slot.lock().tx_ref.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.inner.state_tx.subscribe()
    }

    /// Wait until the handle is terminal or idle.
    pub async fn settled(&self) -> SubmissionState {
        let mut rx = self.subscribe();
        let result = rx
            .wait_for(|s| s.is_terminal() || *s == SubmissionState::Idle)
            .await
            .map(|s| s.clone());
        match result {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Drop the current attempt and return to `Idle`. An accepted write
    /// cannot be recalled; only its observation stops.
    pub fn reset(&self) {
        let mut slot = self.inner.slot.lock();
        slot.epoch += 1;
        slot.state = SubmissionState::Idle;
        slot.tx_ref = None;
        debug!(epoch = slot.epoch, "Submission reset");
        self.inner.epoch_tx.send_replace(slot.epoch);
        self.inner.state_tx.send_replace(SubmissionState::Idle);
    }

    /// Start a new attempt. Fails if one is already in flight.
    pub(crate) fn begin(&self) -> Result<Attempt, SubmissionError> {
        let mut slot = self.inner.slot.lock();
        if slot.state.is_in_flight() {
            return Err(SubmissionError::SubmissionInProgress);
        }
        slot.epoch += 1;
        slot.state = SubmissionState::Validating;
        slot.tx_ref = None;
        debug!(epoch = slot.epoch, state = "validating", "Submission started");
        self.inner.epoch_tx.send_replace(slot.epoch);
        self.inner.state_tx.send_replace(SubmissionState::Validating);
        Ok(Attempt { epoch: slot.epoch })
    }

    /// Apply a forward transition for `attempt`.
    ///
    /// Returns `false` when the attempt is stale or the step would regress.
    pub(crate) fn advance(&self, attempt: Attempt, next: SubmissionState) -> bool {
        let mut slot = self.inner.slot.lock();
        if slot.epoch != attempt.epoch {
            return false;
        }
        if !slot.state.can_transition_to(&next) {
            debug!(from = slot.state.name(), to = next.name(), "Rejected transition");
            return false;
        }

        if let SubmissionState::Pending(tx) = &next {
            slot.tx_ref = Some(tx.clone());
        }
        debug!(
            from = slot.state.name(),
            to = next.name(),
            tx_ref = slot.tx_ref.as_ref().map(|t| t.short()),
            "Submission transition"
        );
        slot.state = next.clone();
        self.inner.state_tx.send_replace(next);
        true
    }

    pub(crate) fn is_current(&self, attempt: Attempt) -> bool {
        self.inner.slot.lock().epoch == attempt.epoch
    }

    /// Resolves once `attempt` has been superseded or reset.
    pub(crate) async fn abandoned(&self, attempt: Attempt) {
        let mut rx = self.inner.epoch_tx.subscribe();
        // Sender lives as long as the handle
        let _ = rx.wait_for(|epoch| *epoch != attempt.epoch).await;
    }
}
