//! Call handlers for the ledger.
//!
//! These functions implement the business logic for each call type. A
//! handler either applies its whole effect or returns an error and leaves
//! the state untouched.

use artbid_crypto::{check_proof_binding, BidVerifier};
use artbid_types::{
    Amount, Artwork, ArtworkId, Auction, AuctionId, ContentRef, EncryptedBid, Identity,
};
use tracing::debug;

use crate::error::LedgerError;
use crate::genesis::AuctionRules;
use crate::state::{Leader, LedgerState};

/// Context provided by the block producer for each call.
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Identity,
    /// Height of the block including the call
    pub block_height: u64,
    /// Timestamp of the block including the call
    pub timestamp: u64,
    /// Value attached to the call
    pub value: Amount,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, LedgerError>;

fn require_text(value: &str, field: &'static str) -> HandlerResult<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::EmptyField(field));
    }
    Ok(())
}

/// Handle CreateArtwork call.
pub fn handle_create_artwork(
    state: &mut LedgerState,
    ctx: &CallContext,
    title: &str,
    description: &str,
    content_hash: &str,
) -> HandlerResult<ArtworkId> {
    require_text(title, "title")?;
    require_text(description, "description")?;
    let content_ref =
        ContentRef::parse(content_hash).map_err(|_| LedgerError::InvalidContentHash)?;

    let artwork_id = state.allocate_artwork_id();
    state.artworks.insert(
        artwork_id,
        Artwork {
            id: artwork_id,
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            content_ref,
            creator: ctx.sender,
            active: false,
            sold: false,
        },
    );

    Ok(artwork_id)
}

/// Handle StartAuction call.
pub fn handle_start_auction(
    state: &mut LedgerState,
    ctx: &CallContext,
    rules: &AuctionRules,
    artwork_id: ArtworkId,
    duration_secs: u64,
) -> HandlerResult<AuctionId> {
    let artwork = state
        .get_artwork(artwork_id)
        .ok_or(LedgerError::ArtworkNotFound(artwork_id))?;

    if artwork.creator != ctx.sender {
        return Err(LedgerError::NotAuthorized);
    }
    if artwork.sold {
        return Err(LedgerError::ArtworkSold);
    }
    if artwork.active {
        return Err(LedgerError::AuctionAlreadyRunning);
    }
    if !rules.allows_duration(duration_secs) {
        return Err(LedgerError::InvalidDuration(duration_secs));
    }

    let auction_id = state.allocate_auction_id();
    state.auctions.insert(
        auction_id,
        Auction {
            id: auction_id,
            artwork_id,
            creator: ctx.sender,
            sealed_highest_bid: Vec::new(),
            bid_count: 0,
            highest_bidder: None,
            active: true,
            ended: false,
            start_time: ctx.timestamp,
            end_time: ctx.timestamp.saturating_add(duration_secs),
            settled_price: None,
        },
    );
    if let Some(artwork) = state.artworks.get_mut(&artwork_id) {
        artwork.active = true;
    }

    Ok(auction_id)
}

/// Handle PlaceEncryptedBid call.
///
/// The comparison runs against the opened amount; only the sealed payload
/// of the new leader is stored on the auction.
pub fn handle_place_encrypted_bid(
    state: &mut LedgerState,
    ctx: &CallContext,
    verifier: &dyn BidVerifier,
    bid: &EncryptedBid,
) -> HandlerResult<u32> {
    if bid.submitted_by != ctx.sender {
        return Err(LedgerError::NotAuthorized);
    }

    let auction = state
        .get_auction(bid.auction_id)
        .ok_or(LedgerError::AuctionNotFound(bid.auction_id))?;

    if !auction.active || auction.ended {
        return Err(LedgerError::AuctionNotActive);
    }
    if ctx.timestamp >= auction.end_time {
        return Err(LedgerError::BiddingEnded);
    }
    if auction.creator == ctx.sender {
        return Err(LedgerError::CreatorCannotBid);
    }

    check_proof_binding(bid.auction_id, &ctx.sender, &bid.encrypted_amount, &bid.proof)
        .map_err(|_| LedgerError::InvalidProof)?;
    let opened = verifier
        .open(bid.auction_id, &ctx.sender, &bid.encrypted_amount, &bid.proof)
        .map_err(|_| LedgerError::InvalidProof)?;

    if ctx.value != opened.amount {
        return Err(LedgerError::ValueMismatch {
            attached: ctx.value,
        });
    }
    if let Some(leader) = state.leaders.get(&bid.auction_id) {
        if opened.amount <= leader.amount {
            return Err(LedgerError::BidTooLow);
        }
    }

    debug!(
        auction_id = %bid.auction_id,
        bidder = %ctx.sender,
        sealed_at = opened.sealed_at,
        "New leading bid"
    );

    state.leaders.insert(
        bid.auction_id,
        Leader {
            bidder: ctx.sender,
            amount: opened.amount,
        },
    );
    state.bids.entry(bid.auction_id).or_default().push(bid.clone());
    state.add_escrow(bid.auction_id, ctx.sender, ctx.value);

    let auction = state
        .get_auction_mut(bid.auction_id)
        .ok_or(LedgerError::AuctionNotFound(bid.auction_id))?;
    auction.sealed_highest_bid = bid.encrypted_amount.clone();
    auction.highest_bidder = Some(ctx.sender);
    auction.bid_count += 1;

    Ok(auction.bid_count)
}

/// Handle EndAuction call.
///
/// The creator may end an auction at any time; anyone may end it once the
/// bidding period is over. Returns the winner and the revealed price.
pub fn handle_end_auction(
    state: &mut LedgerState,
    ctx: &CallContext,
    auction_id: AuctionId,
) -> HandlerResult<Option<Leader>> {
    let auction = state
        .get_auction(auction_id)
        .ok_or(LedgerError::AuctionNotFound(auction_id))?;

    if auction.ended {
        return Err(LedgerError::AlreadyEnded);
    }
    if auction.creator != ctx.sender && ctx.timestamp < auction.end_time {
        return Err(LedgerError::AuctionStillRunning(auction.end_time));
    }

    let creator = auction.creator;
    let artwork_id = auction.artwork_id;
    let leader = state.leaders.get(&auction_id).cloned();

    if let Some(auction) = state.get_auction_mut(auction_id) {
        auction.active = false;
        auction.ended = true;
        auction.settled_price = leader.as_ref().map(|l| l.amount);
    }
    if let Some(artwork) = state.artworks.get_mut(&artwork_id) {
        artwork.active = false;
        artwork.sold = leader.is_some();
    }
    state.release_escrow(auction_id, leader.as_ref(), creator);

    Ok(leader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use artbid_crypto::{BidEncoder, FixedClock, NetworkKey, SealedBidEncoder, SealedBidOpener};

    const CREATOR: Identity = Identity([1u8; 20]);
    const ALICE: Identity = Identity([2u8; 20]);
    const BOB: Identity = Identity([3u8; 20]);

    fn test_context(sender: Identity, timestamp: u64, value: Amount) -> CallContext {
        CallContext {
            sender,
            block_height: 100,
            timestamp,
            value,
        }
    }

    fn setup_auction(state: &mut LedgerState) -> AuctionId {
        let ctx = test_context(CREATOR, 1000, Amount::ZERO);
        let artwork_id = handle_create_artwork(
            state,
            &ctx,
            "Nocturne",
            "Oil on canvas",
            "sha256:abcd",
        )
        .unwrap();
        handle_start_auction(state, &ctx, &AuctionRules::default(), artwork_id, 3600).unwrap()
    }

    fn seal(key: &NetworkKey, auction_id: AuctionId, bidder: Identity, wei: u128) -> EncryptedBid {
        let sealed = SealedBidEncoder::new(key.clone())
            .encode(Amount::from_wei(wei), &bidder, auction_id, &FixedClock(1500))
            .unwrap();
        EncryptedBid {
            auction_id,
            encrypted_amount: sealed.encrypted_amount,
            proof: sealed.proof,
            submitted_by: bidder,
            client_timestamp: 1500,
        }
    }

    #[test]
    fn test_create_artwork() {
        let mut state = LedgerState::new(1000);
        let ctx = test_context(CREATOR, 1000, Amount::ZERO);

        let id = handle_create_artwork(&mut state, &ctx, " Nocturne ", "Oil", "ipfs-Qm1").unwrap();
        assert_eq!(id, ArtworkId(1));

        let artwork = state.get_artwork(id).unwrap();
        assert_eq!(artwork.title, "Nocturne");
        assert_eq!(artwork.creator, CREATOR);
        assert!(!artwork.active);
        assert!(!artwork.sold);
    }

    #[test]
    fn test_create_artwork_rejects_empty_fields() {
        let mut state = LedgerState::new(1000);
        let ctx = test_context(CREATOR, 1000, Amount::ZERO);

        assert_eq!(
            handle_create_artwork(&mut state, &ctx, "  ", "Oil", "h"),
            Err(LedgerError::EmptyField("title"))
        );
        assert_eq!(
            handle_create_artwork(&mut state, &ctx, "T", "Oil", "has space"),
            Err(LedgerError::InvalidContentHash)
        );
        assert!(state.artworks.is_empty());
    }

    #[test]
    fn test_start_auction_rules() {
        let mut state = LedgerState::new(1000);
        let rules = AuctionRules::default();
        let ctx = test_context(CREATOR, 1000, Amount::ZERO);
        let artwork_id = handle_create_artwork(&mut state, &ctx, "T", "D", "h").unwrap();

        let other = test_context(ALICE, 1000, Amount::ZERO);
        assert_eq!(
            handle_start_auction(&mut state, &other, &rules, artwork_id, 3600),
            Err(LedgerError::NotAuthorized)
        );
        assert_eq!(
            handle_start_auction(&mut state, &ctx, &rules, artwork_id, 0),
            Err(LedgerError::InvalidDuration(0))
        );

        let auction_id = handle_start_auction(&mut state, &ctx, &rules, artwork_id, 3600).unwrap();
        let auction = state.get_auction(auction_id).unwrap();
        assert_eq!(auction.start_time, 1000);
        assert_eq!(auction.end_time, 4600);
        assert!(auction.accepts_bids_at(1000));
        assert!(state.get_artwork(artwork_id).unwrap().active);

        assert_eq!(
            handle_start_auction(&mut state, &ctx, &rules, artwork_id, 3600),
            Err(LedgerError::AuctionAlreadyRunning)
        );
    }

    #[test]
    fn test_place_bid_and_outbid() {
        let key = NetworkKey::generate();
        let opener = SealedBidOpener::new(key.clone());
        let mut state = LedgerState::new(1000);
        let auction_id = setup_auction(&mut state);

        let first = seal(&key, auction_id, ALICE, 100);
        let ctx = test_context(ALICE, 1500, Amount::from_wei(100));
        assert_eq!(
            handle_place_encrypted_bid(&mut state, &ctx, &opener, &first),
            Ok(1)
        );

        // Equal amount does not outbid
        let tie = seal(&key, auction_id, BOB, 100);
        let ctx = test_context(BOB, 1600, Amount::from_wei(100));
        assert_eq!(
            handle_place_encrypted_bid(&mut state, &ctx, &opener, &tie),
            Err(LedgerError::BidTooLow)
        );

        let higher = seal(&key, auction_id, BOB, 150);
        let ctx = test_context(BOB, 1600, Amount::from_wei(150));
        assert_eq!(
            handle_place_encrypted_bid(&mut state, &ctx, &opener, &higher),
            Ok(2)
        );

        let auction = state.get_auction(auction_id).unwrap();
        assert_eq!(auction.highest_bidder, Some(BOB));
        assert_eq!(auction.sealed_highest_bid, higher.encrypted_amount);
        assert_eq!(auction.settled_price, None);
        assert_eq!(state.get_auction_bids(auction_id).len(), 2);
    }

    #[test]
    fn test_place_bid_value_must_match() {
        let key = NetworkKey::generate();
        let opener = SealedBidOpener::new(key.clone());
        let mut state = LedgerState::new(1000);
        let auction_id = setup_auction(&mut state);

        let bid = seal(&key, auction_id, ALICE, 100);
        let ctx = test_context(ALICE, 1500, Amount::from_wei(99));
        assert!(matches!(
            handle_place_encrypted_bid(&mut state, &ctx, &opener, &bid),
            Err(LedgerError::ValueMismatch { .. })
        ));
        assert_eq!(state.get_auction(auction_id).unwrap().bid_count, 0);
    }

    #[test]
    fn test_place_bid_rejects_foreign_and_late_bids() {
        let key = NetworkKey::generate();
        let opener = SealedBidOpener::new(key.clone());
        let mut state = LedgerState::new(1000);
        let auction_id = setup_auction(&mut state);

        // Sealed for Alice, sent by Bob
        let bid = seal(&key, auction_id, ALICE, 100);
        let ctx = test_context(BOB, 1500, Amount::from_wei(100));
        assert_eq!(
            handle_place_encrypted_bid(&mut state, &ctx, &opener, &bid),
            Err(LedgerError::NotAuthorized)
        );

        let ctx = test_context(ALICE, 4600, Amount::from_wei(100));
        assert_eq!(
            handle_place_encrypted_bid(&mut state, &ctx, &opener, &bid),
            Err(LedgerError::BiddingEnded)
        );

        let own = seal(&key, auction_id, CREATOR, 100);
        let ctx = test_context(CREATOR, 1500, Amount::from_wei(100));
        assert_eq!(
            handle_place_encrypted_bid(&mut state, &ctx, &opener, &own),
            Err(LedgerError::CreatorCannotBid)
        );
    }

    #[test]
    fn test_place_bid_wrong_network_key() {
        let opener = SealedBidOpener::new(NetworkKey::generate());
        let mut state = LedgerState::new(1000);
        let auction_id = setup_auction(&mut state);

        let bid = seal(&NetworkKey::generate(), auction_id, ALICE, 100);
        let ctx = test_context(ALICE, 1500, Amount::from_wei(100));
        assert_eq!(
            handle_place_encrypted_bid(&mut state, &ctx, &opener, &bid),
            Err(LedgerError::InvalidProof)
        );
    }

    #[test]
    fn test_end_auction_settles() {
        let key = NetworkKey::generate();
        let opener = SealedBidOpener::new(key.clone());
        let mut state = LedgerState::new(1000);
        let auction_id = setup_auction(&mut state);

        for (bidder, wei) in [(ALICE, 100u128), (BOB, 150)] {
            let bid = seal(&key, auction_id, bidder, wei);
            let ctx = test_context(bidder, 1500, Amount::from_wei(wei));
            handle_place_encrypted_bid(&mut state, &ctx, &opener, &bid).unwrap();
        }

        // Non-creator before expiry
        let ctx = test_context(ALICE, 2000, Amount::ZERO);
        assert_eq!(
            handle_end_auction(&mut state, &ctx, auction_id),
            Err(LedgerError::AuctionStillRunning(4600))
        );

        let ctx = test_context(CREATOR, 2000, Amount::ZERO);
        let leader = handle_end_auction(&mut state, &ctx, auction_id).unwrap().unwrap();
        assert_eq!(leader.bidder, BOB);
        assert_eq!(leader.amount, Amount::from_wei(150));

        let auction = state.get_auction(auction_id).unwrap();
        assert!(auction.ended);
        assert!(!auction.active);
        assert_eq!(auction.settled_price, Some(Amount::from_wei(150)));
        let artwork = state.get_artwork(auction.artwork_id).unwrap();
        assert!(artwork.sold);
        assert!(!artwork.active);

        assert_eq!(state.get_balance(&CREATOR), Amount::from_wei(150));
        assert_eq!(state.get_balance(&ALICE), Amount::from_wei(100));

        assert_eq!(
            handle_end_auction(&mut state, &ctx, auction_id),
            Err(LedgerError::AlreadyEnded)
        );
    }

    #[test]
    fn test_end_auction_without_bids_relists() {
        let mut state = LedgerState::new(1000);
        let auction_id = setup_auction(&mut state);

        // Anyone may close an expired auction
        let ctx = test_context(ALICE, 4600, Amount::ZERO);
        assert_eq!(handle_end_auction(&mut state, &ctx, auction_id), Ok(None));

        let artwork_id = state.get_auction(auction_id).unwrap().artwork_id;
        let artwork = state.get_artwork(artwork_id).unwrap();
        assert!(!artwork.sold);
        assert!(!artwork.active);

        let ctx = test_context(CREATOR, 5000, Amount::ZERO);
        assert!(
            handle_start_auction(&mut state, &ctx, &AuctionRules::default(), artwork_id, 600)
                .is_ok()
        );
    }

    #[test]
    fn test_self_raise_settles_at_winning_price() {
        let key = NetworkKey::generate();
        let opener = SealedBidOpener::new(key.clone());
        let mut state = LedgerState::new(1000);
        let auction_id = setup_auction(&mut state);

        for wei in [2u128, 3] {
            let bid = seal(&key, auction_id, ALICE, wei);
            let ctx = test_context(ALICE, 1500, Amount::from_wei(wei));
            handle_place_encrypted_bid(&mut state, &ctx, &opener, &bid).unwrap();
        }

        let ctx = test_context(CREATOR, 2000, Amount::ZERO);
        let leader = handle_end_auction(&mut state, &ctx, auction_id).unwrap().unwrap();
        assert_eq!(leader.bidder, ALICE);
        assert_eq!(leader.amount, Amount::from_wei(3));

        let auction = state.get_auction(auction_id).unwrap();
        assert_eq!(auction.settled_price, Some(leader.amount));
        assert_eq!(state.get_balance(&CREATOR), leader.amount);
        assert_eq!(state.get_balance(&ALICE), Amount::from_wei(2));
    }
}
