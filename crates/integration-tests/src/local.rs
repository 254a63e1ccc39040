//! In-process gateway over a [`LedgerNode`].

use std::sync::Arc;
use std::time::Duration;

use artbid_client::{GatewayError, LedgerGateway, StatusStream};
use artbid_ledger::{LedgerCall, LedgerError, LedgerNode, LedgerQuery, LedgerQueryResponse};
use artbid_types::{
    Amount, Artwork, ArtworkId, Auction, AuctionId, ContentRef, EncryptedBid, Identity, TxRef,
    TxStatus,
};
use async_trait::async_trait;
use futures::stream;
use parking_lot::RwLock;

/// When blocks get produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mining {
    /// A watcher that sees a pending transaction produces the next block.
    OnWatch,
    /// Only [`LocalLedgerGateway::produce_block`] produces blocks.
    Manual,
}

#[derive(Clone)]
pub struct LocalLedgerGateway {
    node: Arc<RwLock<LedgerNode>>,
    mining: Mining,
    poll_interval: Duration,
}

impl LocalLedgerGateway {
    pub fn new(node: LedgerNode, mining: Mining) -> Self {
        Self {
            node: Arc::new(RwLock::new(node)),
            mining,
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Another gateway over the same ledger with a different mining mode.
    pub fn with_mining(&self, mining: Mining) -> Self {
        Self {
            mining,
            ..self.clone()
        }
    }

    pub fn node(&self) -> Arc<RwLock<LedgerNode>> {
        self.node.clone()
    }

    pub fn produce_block(&self) -> Vec<TxRef> {
        self.node.write().produce_block()
    }

    pub fn advance_time(&self, secs: u64) {
        let mut node = self.node.write();
        let now = node.timestamp();
        node.set_timestamp(now + secs);
    }

    pub fn pending_count(&self) -> usize {
        self.node.read().pending_count()
    }

    pub fn balance(&self, address: Identity) -> Amount {
        match self.node.read().query(LedgerQuery::GetBalance { address }) {
            LedgerQueryResponse::Balance(balance) => balance,
            _ => Amount::ZERO,
        }
    }

    pub fn bids(&self, auction_id: AuctionId) -> Vec<EncryptedBid> {
        match self.node.read().query(LedgerQuery::GetAuctionBids { auction_id }) {
            LedgerQueryResponse::Bids(bids) => bids,
            _ => Vec::new(),
        }
    }

    fn submit(
        &self,
        sender: &Identity,
        value: Amount,
        call: LedgerCall,
    ) -> Result<TxRef, GatewayError> {
        if sender.is_empty() {
            return Err(GatewayError::WalletRejected);
        }
        self.node
            .write()
            .submit(*sender, value, call)
            .map_err(|e: LedgerError| GatewayError::Reverted(e.to_string()))
    }
}

#[async_trait]
impl LedgerGateway for LocalLedgerGateway {
    async fn create_artwork(
        &self,
        sender: &Identity,
        title: &str,
        description: &str,
        content_ref: &ContentRef,
    ) -> Result<TxRef, GatewayError> {
        self.submit(
            sender,
            Amount::ZERO,
            LedgerCall::CreateArtwork {
                title: title.to_string(),
                description: description.to_string(),
                content_hash: content_ref.to_string(),
            },
        )
    }

    async fn start_auction(
        &self,
        sender: &Identity,
        artwork_id: ArtworkId,
        duration_secs: u64,
    ) -> Result<TxRef, GatewayError> {
        self.submit(
            sender,
            Amount::ZERO,
            LedgerCall::StartAuction {
                artwork_id,
                duration_secs,
            },
        )
    }

    async fn place_encrypted_bid(
        &self,
        sender: &Identity,
        bid: &EncryptedBid,
        value: Amount,
    ) -> Result<TxRef, GatewayError> {
        self.submit(
            sender,
            value,
            LedgerCall::PlaceEncryptedBid { bid: bid.clone() },
        )
    }

    async fn end_auction(
        &self,
        sender: &Identity,
        auction_id: AuctionId,
    ) -> Result<TxRef, GatewayError> {
        self.submit(sender, Amount::ZERO, LedgerCall::EndAuction { auction_id })
    }

    async fn get_artwork_info(
        &self,
        artwork_id: ArtworkId,
    ) -> Result<Option<Artwork>, GatewayError> {
        match self.node.read().query(LedgerQuery::GetArtwork { artwork_id }) {
            LedgerQueryResponse::Artwork(artwork) => Ok(artwork),
            other => Err(GatewayError::Protocol(format!("{other:?}"))),
        }
    }

    async fn get_auction_info(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<Auction>, GatewayError> {
        match self.node.read().query(LedgerQuery::GetAuction { auction_id }) {
            LedgerQueryResponse::Auction(auction) => Ok(auction),
            other => Err(GatewayError::Protocol(format!("{other:?}"))),
        }
    }

    async fn transaction_status(&self, tx_ref: &TxRef) -> Result<TxStatus, GatewayError> {
        Ok(self.node.read().tx_status(tx_ref))
    }

    fn watch_transaction(&self, tx_ref: &TxRef) -> StatusStream {
        let watcher = Watcher {
            gateway: self.clone(),
            tx_ref: tx_ref.clone(),
            first: true,
            done: false,
        };
        Box::pin(stream::unfold(watcher, |mut w| async move {
            if w.done {
                return None;
            }
            if !w.first {
                tokio::time::sleep(w.gateway.poll_interval).await;
            }
            w.first = false;

            let mut status = w.gateway.node.read().tx_status(&w.tx_ref);
            if status == TxStatus::Pending && w.gateway.mining == Mining::OnWatch {
                let mut node = w.gateway.node.write();
                node.produce_block();
                status = node.tx_status(&w.tx_ref);
            }
            w.done = status.is_final();
            Some((Ok(status), w))
        }))
    }
}

struct Watcher {
    gateway: LocalLedgerGateway,
    tx_ref: TxRef,
    first: bool,
    done: bool,
}
