//! Test doubles with call counters.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use artbid_crypto::{BidEncoder, CryptoError, SealedBid, TimeSource};
use artbid_types::{
    Amount, Artwork, ArtworkId, Auction, AuctionId, ContentRef, EncryptedBid, Identity, TxOutcome,
    TxReceipt, TxRef, TxStatus,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::gateway::{GatewayError, LedgerGateway, StatusStream};

/// Encoder returning a distinct payload on every call.
#[derive(Default)]
pub(crate) struct CountingEncoder {
    calls: AtomicUsize,
    fail_next: AtomicBool,
}

impl CountingEncoder {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl BidEncoder for CountingEncoder {
    fn encode(
        &self,
        _amount: Amount,
        _bidder: &Identity,
        _auction_id: AuctionId,
        clock: &dyn TimeSource,
    ) -> Result<SealedBid, CryptoError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CryptoError::EncryptionFailed("stub failure".into()));
        }
        Ok(SealedBid {
            encrypted_amount: n.to_le_bytes().to_vec(),
            proof: (n + 1000).to_le_bytes().to_vec(),
            sealed_at: clock.now_unix(),
        })
    }
}

#[derive(Default)]
struct FakeState {
    artworks: HashMap<ArtworkId, Artwork>,
    auctions: HashMap<AuctionId, Auction>,
    read_failures: VecDeque<GatewayError>,
    writes: VecDeque<Result<TxRef, GatewayError>>,
    bids: Vec<(Identity, EncryptedBid, Amount)>,
    calls: Vec<&'static str>,
    statuses: VecDeque<TxStatus>,
    confirm_everything: Option<TxOutcome>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<FakeState>,
    notify: Notify,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Shared {
    fn next_status(&self, tx_ref: &TxRef) -> Option<TxStatus> {
        let mut state = self.state.lock();
        if let Some(outcome) = &state.confirm_everything {
            return Some(TxStatus::Confirmed {
                receipt: TxReceipt {
                    tx_ref: tx_ref.clone(),
                    block_height: 1,
                    outcome: outcome.clone(),
                },
            });
        }
        state.statuses.pop_front()
    }
}

/// Scriptable in-memory gateway.
///
/// Writes consume queued results (defaulting to a fresh reference); the
/// status stream replays scripted statuses and otherwise stays silent.
#[derive(Clone, Default)]
pub(crate) struct FakeGateway {
    shared: Arc<Shared>,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn open_auction(id: AuctionId) -> Auction {
        Auction {
            id,
            artwork_id: ArtworkId(1),
            creator: Identity([0xcc; 20]),
            sealed_highest_bid: Vec::new(),
            bid_count: 0,
            highest_bidder: None,
            active: true,
            ended: false,
            start_time: 1_000,
            end_time: u64::MAX,
            settled_price: None,
        }
    }

    pub(crate) fn insert_auction(&self, auction: Auction) {
        self.shared.state.lock().auctions.insert(auction.id, auction);
    }

    pub(crate) fn insert_artwork(&self, artwork: Artwork) {
        self.shared.state.lock().artworks.insert(artwork.id, artwork);
    }

    pub(crate) fn fail_reads(&self, times: usize, error: GatewayError) {
        let mut state = self.shared.state.lock();
        state
            .read_failures
            .extend(std::iter::repeat(error).take(times));
    }

    pub(crate) fn queue_write(&self, result: Result<TxRef, GatewayError>) {
        self.shared.state.lock().writes.push_back(result);
    }

    pub(crate) fn script_statuses(&self, statuses: Vec<TxStatus>) {
        self.shared.state.lock().statuses.extend(statuses);
        self.shared.notify.notify_waiters();
    }

    pub(crate) fn push_status(&self, status: TxStatus) {
        self.script_statuses(vec![status]);
    }

    /// Confirm every watched transaction with `outcome`.
    pub(crate) fn confirm_with(&self, outcome: TxOutcome) {
        self.shared.state.lock().confirm_everything = Some(outcome);
        self.shared.notify.notify_waiters();
    }

    pub(crate) fn confirm_everything(&self, auction_id: AuctionId) {
        self.confirm_with(TxOutcome::BidPlaced {
            auction_id,
            bid_count: 1,
        });
    }

    pub(crate) fn read_calls(&self) -> usize {
        self.shared.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn write_calls(&self) -> usize {
        self.shared.writes.load(Ordering::SeqCst)
    }

    /// Names of the write methods called, in order.
    pub(crate) fn write_log(&self) -> Vec<&'static str> {
        self.shared.state.lock().calls.clone()
    }

    pub(crate) fn bids(&self) -> Vec<EncryptedBid> {
        self.shared
            .state
            .lock()
            .bids
            .iter()
            .map(|(_, bid, _)| bid.clone())
            .collect()
    }

    pub(crate) fn last_bid(&self) -> Option<(Identity, EncryptedBid, Amount)> {
        self.shared.state.lock().bids.last().cloned()
    }

    fn read(&self) -> Result<(), GatewayError> {
        self.shared.reads.fetch_add(1, Ordering::SeqCst);
        match self.shared.state.lock().read_failures.pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn write(&self, call: &'static str) -> Result<TxRef, GatewayError> {
        let n = self.shared.writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.shared.state.lock();
        state.calls.push(call);
        state
            .writes
            .pop_front()
            .unwrap_or_else(|| Ok(TxRef::new(format!("0x{:064x}", n + 1))))
    }
}

#[async_trait]
impl LedgerGateway for FakeGateway {
    async fn create_artwork(
        &self,
        _sender: &Identity,
        _title: &str,
        _description: &str,
        _content_ref: &ContentRef,
    ) -> Result<TxRef, GatewayError> {
        self.write("create_artwork")
    }

    async fn start_auction(
        &self,
        _sender: &Identity,
        _artwork_id: ArtworkId,
        _duration_secs: u64,
    ) -> Result<TxRef, GatewayError> {
        self.write("start_auction")
    }

    async fn place_encrypted_bid(
        &self,
        sender: &Identity,
        bid: &EncryptedBid,
        value: Amount,
    ) -> Result<TxRef, GatewayError> {
        let result = self.write("place_encrypted_bid");
        if result.is_ok() {
            self.shared
                .state
                .lock()
                .bids
                .push((*sender, bid.clone(), value));
        }
        result
    }

    async fn end_auction(
        &self,
        _sender: &Identity,
        _auction_id: AuctionId,
    ) -> Result<TxRef, GatewayError> {
        self.write("end_auction")
    }

    async fn get_artwork_info(
        &self,
        artwork_id: ArtworkId,
    ) -> Result<Option<Artwork>, GatewayError> {
        self.read()?;
        Ok(self.shared.state.lock().artworks.get(&artwork_id).cloned())
    }

    async fn get_auction_info(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<Auction>, GatewayError> {
        self.read()?;
        Ok(self.shared.state.lock().auctions.get(&auction_id).cloned())
    }

    async fn transaction_status(&self, tx_ref: &TxRef) -> Result<TxStatus, GatewayError> {
        self.read()?;
        Ok(self
            .shared
            .next_status(tx_ref)
            .unwrap_or(TxStatus::Pending))
    }

    fn watch_transaction(&self, tx_ref: &TxRef) -> StatusStream {
        let shared = self.shared.clone();
        let tx_ref = tx_ref.clone();
        Box::pin(futures::stream::unfold(
            (shared, tx_ref),
            |(shared, tx_ref)| async move {
                loop {
                    let notified = shared.notify.notified();
                    match shared.next_status(&tx_ref) {
                        Some(status) => {
                            drop(notified);
                            return Some((Ok(status), (shared, tx_ref)));
                        }
                        None => notified.await,
                    }
                }
            },
        ))
    }
}
