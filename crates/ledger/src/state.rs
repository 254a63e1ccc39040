//! Ledger state structures.

use artbid_types::{
    Amount, Artwork, ArtworkId, Auction, AuctionId, EncryptedBid, Identity, TxRef, TxStatus,
};
use std::collections::{BTreeMap, HashMap};

use crate::call::LedgerCall;

/// Plaintext view of an auction's leading bid.
///
/// Only the comparison service writes this; it is never served by queries
/// until the auction has ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leader {
    pub bidder: Identity,
    pub amount: Amount,
}

/// A transaction accepted into the pending pool.
#[derive(Debug, Clone)]
pub struct PendingTx {
    pub tx_ref: TxRef,
    pub sender: Identity,
    pub value: Amount,
    pub call: LedgerCall,
}

/// Ledger state.
///
/// A simplified in-memory representation for development and tests.
#[derive(Debug, Default)]
pub struct LedgerState {
    /// Next artwork ID to assign
    pub next_artwork_id: u64,

    /// Next auction ID to assign
    pub next_auction_id: u64,

    /// All artworks by ID
    pub artworks: BTreeMap<ArtworkId, Artwork>,

    /// All auctions by ID
    pub auctions: BTreeMap<AuctionId, Auction>,

    /// Accepted sealed bids, in arrival order, per auction
    pub bids: HashMap<AuctionId, Vec<EncryptedBid>>,

    /// Comparison-service view of each auction's leader
    pub leaders: HashMap<AuctionId, Leader>,

    /// Value held for bids: (auction_id, bidder) -> total attached
    pub escrow: HashMap<(AuctionId, Identity), Amount>,

    /// Released funds per account (refunds and sale proceeds)
    pub balances: HashMap<Identity, Amount>,

    /// Transactions waiting for the next block
    pub pending: Vec<PendingTx>,

    /// Lifecycle of every transaction ever submitted
    pub transactions: HashMap<TxRef, TxStatus>,

    /// Monotonic submission counter mixed into tx references
    pub tx_nonce: u64,

    /// Height of the last produced block
    pub block_height: u64,

    /// Timestamp of the last produced block
    pub timestamp: u64,
}

impl LedgerState {
    /// Create a new ledger state starting at `timestamp`.
    pub fn new(timestamp: u64) -> Self {
        Self {
            next_artwork_id: 1,
            next_auction_id: 1,
            timestamp,
            ..Default::default()
        }
    }

    /// Get the next artwork ID and increment.
    pub fn allocate_artwork_id(&mut self) -> ArtworkId {
        let id = self.next_artwork_id;
        self.next_artwork_id += 1;
        ArtworkId(id)
    }

    /// Get the next auction ID and increment.
    pub fn allocate_auction_id(&mut self) -> AuctionId {
        let id = self.next_auction_id;
        self.next_auction_id += 1;
        AuctionId(id)
    }

    pub fn get_artwork(&self, artwork_id: ArtworkId) -> Option<&Artwork> {
        self.artworks.get(&artwork_id)
    }

    pub fn get_auction(&self, auction_id: AuctionId) -> Option<&Auction> {
        self.auctions.get(&auction_id)
    }

    pub fn get_auction_mut(&mut self, auction_id: AuctionId) -> Option<&mut Auction> {
        self.auctions.get_mut(&auction_id)
    }

    /// Get all accepted bids for an auction.
    pub fn get_auction_bids(&self, auction_id: AuctionId) -> &[EncryptedBid] {
        self.bids
            .get(&auction_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Value held for `bidder` in `auction_id`.
    pub fn get_escrow(&self, auction_id: AuctionId, bidder: &Identity) -> Amount {
        self.escrow
            .get(&(auction_id, *bidder))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn add_escrow(&mut self, auction_id: AuctionId, bidder: Identity, amount: Amount) {
        let entry = self.escrow.entry((auction_id, bidder)).or_default();
        *entry = Amount::from_wei(entry.wei().saturating_add(amount.wei()));
    }

    /// Released balance of an account.
    pub fn get_balance(&self, address: &Identity) -> Amount {
        self.balances.get(address).copied().unwrap_or(Amount::ZERO)
    }

    pub fn credit(&mut self, address: Identity, amount: Amount) {
        let entry = self.balances.entry(address).or_default();
        *entry = Amount::from_wei(entry.wei().saturating_add(amount.wei()));
    }

    /// Release every escrow entry of an auction. `payee` receives exactly
    /// the winning amount; everything else held, including the winner's
    /// earlier bids, goes back to the bidder.
    pub fn release_escrow(
        &mut self,
        auction_id: AuctionId,
        winner: Option<&Leader>,
        payee: Identity,
    ) {
        let held: Vec<(Identity, Amount)> = self
            .escrow
            .iter()
            .filter(|((aid, _), _)| *aid == auction_id)
            .map(|((_, bidder), amount)| (*bidder, *amount))
            .collect();

        for (bidder, amount) in held {
            self.escrow.remove(&(auction_id, bidder));
            let refund = match winner {
                Some(leader) if leader.bidder == bidder => {
                    let paid = leader.amount.wei().min(amount.wei());
                    self.credit(payee, Amount::from_wei(paid));
                    Amount::from_wei(amount.wei() - paid)
                }
                _ => amount,
            };
            if refund.is_positive() {
                self.credit(bidder, refund);
            }
        }
    }
}
