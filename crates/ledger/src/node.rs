//! Single-node block producer over [`LedgerState`].
//!
//! Calls are queued by [`LedgerNode::submit`] and applied in arrival order
//! by [`LedgerNode::produce_block`]. A failing call is recorded as reverted;
//! it never aborts the block.

use artbid_crypto::{BidVerifier, NetworkKey, SealedBidOpener};
use artbid_types::{
    Amount, Identity, TxOutcome, TxReceipt, TxRef, TxStatus,
};
use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::call::LedgerCall;
use crate::error::LedgerError;
use crate::genesis::{AuctionRules, GenesisValidationError, LedgerGenesisConfig};
use crate::handlers::{self, CallContext, HandlerResult};
use crate::queries::{handle_query, LedgerQuery, LedgerQueryResponse};
use crate::state::{LedgerState, PendingTx};

pub struct LedgerNode {
    state: LedgerState,
    rules: AuctionRules,
    block_time_secs: u64,
    network_key: NetworkKey,
    verifier: Box<dyn BidVerifier>,
}

impl LedgerNode {
    /// Build a node from a validated genesis configuration.
    pub fn from_genesis(config: &LedgerGenesisConfig) -> Result<Self, GenesisValidationError> {
        config.validate()?;
        let network_key = config.network_key()?;

        Ok(Self {
            state: LedgerState::new(config.initial_timestamp),
            rules: config.rules.clone(),
            block_time_secs: config.block_time_secs,
            verifier: Box::new(SealedBidOpener::new(network_key.clone())),
            network_key,
        })
    }

    /// Key bidders seal amounts under.
    pub fn network_key(&self) -> &NetworkKey {
        &self.network_key
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn block_height(&self) -> u64 {
        self.state.block_height
    }

    pub fn timestamp(&self) -> u64 {
        self.state.timestamp
    }

    /// Number of calls waiting for the next block.
    pub fn pending_count(&self) -> usize {
        self.state.pending.len()
    }

    /// Move the ledger clock forward. Earlier timestamps are ignored.
    pub fn set_timestamp(&mut self, timestamp: u64) -> u64 {
        if timestamp > self.state.timestamp {
            self.state.timestamp = timestamp;
        }
        self.state.timestamp
    }

    /// Accept a call into the pending pool and return its reference.
    pub fn submit(
        &mut self,
        sender: Identity,
        value: Amount,
        call: LedgerCall,
    ) -> Result<TxRef, LedgerError> {
        if sender.is_empty() {
            return Err(LedgerError::NotAuthorized);
        }

        let nonce = self.state.tx_nonce;
        self.state.tx_nonce += 1;

        let mut hasher = Sha256::new();
        call.serialize(&mut hasher)
            .map_err(|e| LedgerError::Encoding(e.to_string()))?;
        hasher.update(sender.0);
        hasher.update(value.wei().to_le_bytes());
        hasher.update(nonce.to_le_bytes());
        let tx_ref = TxRef::from_hash(hasher.finalize().into());

        debug!(tx = %tx_ref.short(), call = call.name(), %sender, "Accepted into pending pool");

        self.state.transactions.insert(tx_ref.clone(), TxStatus::Pending);
        self.state.pending.push(PendingTx {
            tx_ref: tx_ref.clone(),
            sender,
            value,
            call,
        });
        Ok(tx_ref)
    }

    /// Produce one block: advance height and clock, then apply every
    /// pending call. Returns the references included.
    pub fn produce_block(&mut self) -> Vec<TxRef> {
        self.state.block_height += 1;
        self.state.timestamp += self.block_time_secs;
        let height = self.state.block_height;
        let timestamp = self.state.timestamp;

        let pending = std::mem::take(&mut self.state.pending);
        let mut included = Vec::with_capacity(pending.len());

        for tx in pending {
            let ctx = CallContext {
                sender: tx.sender,
                block_height: height,
                timestamp,
                value: tx.value,
            };

            let status = match self.apply(&ctx, &tx.call) {
                Ok(outcome) => TxStatus::Confirmed {
                    receipt: TxReceipt {
                        tx_ref: tx.tx_ref.clone(),
                        block_height: height,
                        outcome,
                    },
                },
                Err(e) => {
                    warn!(tx = %tx.tx_ref.short(), call = tx.call.name(), error = %e, "Call reverted");
                    // Reverted calls return attached value
                    if tx.value.is_positive() {
                        self.state.credit(tx.sender, tx.value);
                    }
                    TxStatus::Reverted {
                        reason: e.to_string(),
                    }
                }
            };

            self.state.transactions.insert(tx.tx_ref.clone(), status);
            included.push(tx.tx_ref);
        }

        if !included.is_empty() {
            info!(height, timestamp, txs = included.len(), "Produced block");
        }
        included
    }

    /// Lifecycle status of a submitted transaction.
    pub fn tx_status(&self, tx_ref: &TxRef) -> TxStatus {
        self.state
            .transactions
            .get(tx_ref)
            .cloned()
            .unwrap_or(TxStatus::Unknown)
    }

    pub fn query(&self, query: LedgerQuery) -> LedgerQueryResponse {
        handle_query(&self.state, query)
    }

    fn apply(&mut self, ctx: &CallContext, call: &LedgerCall) -> HandlerResult<TxOutcome> {
        match call {
            LedgerCall::CreateArtwork {
                title,
                description,
                content_hash,
            } => {
                let artwork_id = handlers::handle_create_artwork(
                    &mut self.state,
                    ctx,
                    title,
                    description,
                    content_hash,
                )?;
                Ok(TxOutcome::ArtworkCreated { artwork_id })
            }

            LedgerCall::StartAuction {
                artwork_id,
                duration_secs,
            } => {
                let auction_id = handlers::handle_start_auction(
                    &mut self.state,
                    ctx,
                    &self.rules,
                    *artwork_id,
                    *duration_secs,
                )?;
                Ok(TxOutcome::AuctionStarted { auction_id })
            }

            LedgerCall::PlaceEncryptedBid { bid } => {
                let bid_count = handlers::handle_place_encrypted_bid(
                    &mut self.state,
                    ctx,
                    self.verifier.as_ref(),
                    bid,
                )?;
                Ok(TxOutcome::BidPlaced {
                    auction_id: bid.auction_id,
                    bid_count,
                })
            }

            LedgerCall::EndAuction { auction_id } => {
                let leader = handlers::handle_end_auction(&mut self.state, ctx, *auction_id)?;
                Ok(TxOutcome::AuctionEnded {
                    auction_id: *auction_id,
                    winner: leader.as_ref().map(|l| l.bidder),
                    winning_price: leader.map(|l| l.amount),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artbid_crypto::{BidEncoder, FixedClock, SealedBidEncoder};
    use artbid_types::{ArtworkId, AuctionId, EncryptedBid};

    const CREATOR: Identity = Identity([1u8; 20]);
    const BIDDER: Identity = Identity([2u8; 20]);

    fn node() -> LedgerNode {
        LedgerNode::from_genesis(&LedgerGenesisConfig::default()).unwrap()
    }

    fn confirmed_outcome(node: &LedgerNode, tx: &TxRef) -> TxOutcome {
        match node.tx_status(tx) {
            TxStatus::Confirmed { receipt } => receipt.outcome,
            other => panic!("expected confirmed, got {other:?}"),
        }
    }

    #[test]
    fn test_pending_until_block() {
        let mut node = node();
        let tx = node
            .submit(
                CREATOR,
                Amount::ZERO,
                LedgerCall::CreateArtwork {
                    title: "T".into(),
                    description: "D".into(),
                    content_hash: "sha256:00".into(),
                },
            )
            .unwrap();

        assert_eq!(node.tx_status(&tx), TxStatus::Pending);
        assert_eq!(node.pending_count(), 1);

        let included = node.produce_block();
        assert_eq!(included, vec![tx.clone()]);
        assert_eq!(node.block_height(), 1);
        assert_eq!(
            confirmed_outcome(&node, &tx),
            TxOutcome::ArtworkCreated {
                artwork_id: ArtworkId(1)
            }
        );
    }

    #[test]
    fn test_identical_calls_get_distinct_refs() {
        let mut node = node();
        let call = LedgerCall::EndAuction {
            auction_id: AuctionId(1),
        };
        let a = node.submit(CREATOR, Amount::ZERO, call.clone()).unwrap();
        let b = node.submit(CREATOR, Amount::ZERO, call).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_reverted_call_refunds_value() {
        let mut node = node();
        let bid = EncryptedBid {
            auction_id: AuctionId(42),
            encrypted_amount: vec![1, 2, 3],
            proof: vec![],
            submitted_by: BIDDER,
            client_timestamp: 0,
        };
        let tx = node
            .submit(BIDDER, Amount::from_wei(5), LedgerCall::PlaceEncryptedBid { bid })
            .unwrap();
        node.produce_block();

        assert!(matches!(node.tx_status(&tx), TxStatus::Reverted { .. }));
        assert_eq!(node.state().get_balance(&BIDDER), Amount::from_wei(5));
    }

    #[test]
    fn test_full_lifecycle() {
        let mut node = node();
        let create = node
            .submit(
                CREATOR,
                Amount::ZERO,
                LedgerCall::CreateArtwork {
                    title: "T".into(),
                    description: "D".into(),
                    content_hash: "sha256:00".into(),
                },
            )
            .unwrap();
        node.produce_block();
        let artwork_id = match confirmed_outcome(&node, &create) {
            TxOutcome::ArtworkCreated { artwork_id } => artwork_id,
            other => panic!("unexpected {other:?}"),
        };

        let start = node
            .submit(
                CREATOR,
                Amount::ZERO,
                LedgerCall::StartAuction {
                    artwork_id,
                    duration_secs: 600,
                },
            )
            .unwrap();
        node.produce_block();
        let auction_id = match confirmed_outcome(&node, &start) {
            TxOutcome::AuctionStarted { auction_id } => auction_id,
            other => panic!("unexpected {other:?}"),
        };

        let amount = Amount::from_wei(2_000);
        let sealed = SealedBidEncoder::new(node.network_key().clone())
            .encode(amount, &BIDDER, auction_id, &FixedClock(node.timestamp()))
            .unwrap();
        let bid = EncryptedBid {
            auction_id,
            encrypted_amount: sealed.encrypted_amount,
            proof: sealed.proof,
            submitted_by: BIDDER,
            client_timestamp: sealed.sealed_at,
        };
        let place = node
            .submit(BIDDER, amount, LedgerCall::PlaceEncryptedBid { bid })
            .unwrap();
        node.produce_block();
        assert_eq!(
            confirmed_outcome(&node, &place),
            TxOutcome::BidPlaced {
                auction_id,
                bid_count: 1
            }
        );

        node.set_timestamp(node.timestamp() + 600);
        let end = node
            .submit(BIDDER, Amount::ZERO, LedgerCall::EndAuction { auction_id })
            .unwrap();
        node.produce_block();
        assert_eq!(
            confirmed_outcome(&node, &end),
            TxOutcome::AuctionEnded {
                auction_id,
                winner: Some(BIDDER),
                winning_price: Some(amount),
            }
        );
        assert_eq!(node.state().get_balance(&CREATOR), amount);
    }

    #[test]
    fn test_clock_only_moves_forward() {
        let mut node = node();
        let now = node.timestamp();
        assert_eq!(node.set_timestamp(now - 10), now);
        assert_eq!(node.set_timestamp(now + 10), now + 10);
    }

    #[test]
    fn test_empty_sender_rejected() {
        let mut node = node();
        let result = node.submit(
            Identity::ZERO,
            Amount::ZERO,
            LedgerCall::EndAuction {
                auction_id: AuctionId(1),
            },
        );
        assert_eq!(result, Err(LedgerError::NotAuthorized));
    }
}
