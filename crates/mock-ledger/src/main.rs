//! Mock ledger server for local testing of sealed-bid art auctions.
//!
//! Serves an in-memory [`LedgerNode`] over JSON-RPC so the client and CLI
//! can run the full artwork, auction and bid lifecycle without a real chain.
//! Writes land in a pending pool and are applied when a block is produced,
//! either on a timer or through `admin_advanceBlock`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::Parser;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use tracing::info;

use artbid_crypto::SCHEME_LABEL;
use artbid_ledger::{LedgerCall, LedgerError, LedgerNode, LedgerQuery, LedgerQueryResponse};
use artbid_types::rpc::{
    BlockInfo, CreateArtworkParams, EndAuctionParams, NetworkKeyRpc, PlaceBidParams,
    StartAuctionParams, LEDGER_REJECTED_CODE, WALLET_REJECTED_CODE,
};
use artbid_types::{
    Amount, Artwork, ArtworkId, Auction, AuctionId, EncryptedBid, Identity, TxRef, TxStatus,
};

mod config;
use config::MockLedgerConfig;

#[derive(Parser)]
#[command(name = "mock-ledger")]
#[command(about = "In-memory ledger for sealed-bid art auctions")]
struct Cli {
    /// Server config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address (overrides the config file)
    #[arg(long)]
    addr: Option<String>,

    /// Produce a block every N milliseconds
    #[arg(long)]
    block_interval_ms: Option<u64>,
}

/// RPC API definition for the mock ledger.
#[rpc(server)]
pub trait MockLedgerApi {
    // ============ Admin Methods ============

    /// Produce one block from the pending pool.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Move the ledger clock forward (for testing time-dependent logic).
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<u64, ErrorObjectOwned>;

    // ============ Write Methods ============

    #[method(name = "ledger_createArtwork")]
    async fn ledger_create_artwork(
        &self,
        params: CreateArtworkParams,
    ) -> Result<TxRef, ErrorObjectOwned>;

    #[method(name = "ledger_startAuction")]
    async fn ledger_start_auction(
        &self,
        params: StartAuctionParams,
    ) -> Result<TxRef, ErrorObjectOwned>;

    #[method(name = "ledger_placeEncryptedBid")]
    async fn ledger_place_encrypted_bid(
        &self,
        params: PlaceBidParams,
    ) -> Result<TxRef, ErrorObjectOwned>;

    #[method(name = "ledger_endAuction")]
    async fn ledger_end_auction(&self, params: EndAuctionParams)
        -> Result<TxRef, ErrorObjectOwned>;

    // ============ Query Methods ============

    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    #[method(name = "query_getNetworkKey")]
    async fn query_get_network_key(&self) -> Result<NetworkKeyRpc, ErrorObjectOwned>;

    #[method(name = "query_getArtworkInfo")]
    async fn query_get_artwork_info(
        &self,
        artwork_id: ArtworkId,
    ) -> Result<Option<Artwork>, ErrorObjectOwned>;

    #[method(name = "query_getAuctionInfo")]
    async fn query_get_auction_info(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<Auction>, ErrorObjectOwned>;

    #[method(name = "query_listArtworks")]
    async fn query_list_artworks(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Artwork>, ErrorObjectOwned>;

    #[method(name = "query_listAuctions")]
    async fn query_list_auctions(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Auction>, ErrorObjectOwned>;

    /// Sealed bids accepted for an auction. Amounts stay sealed.
    #[method(name = "query_getAuctionBids")]
    async fn query_get_auction_bids(
        &self,
        auction_id: AuctionId,
    ) -> Result<Vec<EncryptedBid>, ErrorObjectOwned>;

    #[method(name = "query_getTransaction")]
    async fn query_get_transaction(&self, tx_ref: TxRef) -> Result<TxStatus, ErrorObjectOwned>;

    /// Released balance (refunds and settled proceeds) of an account.
    #[method(name = "query_getBalance")]
    async fn query_get_balance(&self, address: Identity) -> Result<Amount, ErrorObjectOwned>;
}

/// Implementation of the mock ledger RPC server.
struct MockLedgerServer {
    node: Arc<RwLock<LedgerNode>>,
}

impl MockLedgerServer {
    fn new(node: Arc<RwLock<LedgerNode>>) -> Self {
        Self { node }
    }

    fn submit(
        &self,
        sender: Identity,
        value: Amount,
        call: LedgerCall,
    ) -> Result<TxRef, ErrorObjectOwned> {
        // No signer behind an empty sender; report it like a declined wallet prompt
        if sender.is_empty() {
            return Err(ErrorObjectOwned::owned(
                WALLET_REJECTED_CODE,
                "No account to sign with",
                None::<()>,
            ));
        }

        let name = call.name();
        let tx_ref = self
            .node
            .write()
            .submit(sender, value, call)
            .map_err(rejected)?;
        info!(tx = %tx_ref.short(), call = name, %sender, "Transaction submitted");
        Ok(tx_ref)
    }

    fn query(&self, query: LedgerQuery) -> LedgerQueryResponse {
        self.node.read().query(query)
    }

    fn block_info(&self) -> BlockInfo {
        let node = self.node.read();
        BlockInfo {
            height: node.block_height(),
            timestamp: node.timestamp(),
        }
    }
}

fn rejected(err: LedgerError) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(LEDGER_REJECTED_CODE, err.to_string(), None::<()>)
}

fn unexpected(resp: LedgerQueryResponse) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        -32603,
        format!("Unexpected query response: {:?}", resp),
        None::<()>,
    )
}

#[async_trait]
impl MockLedgerApiServer for MockLedgerServer {
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let included = self.node.write().produce_block();
        let info = self.block_info();
        info!(height = info.height, txs = included.len(), "Advanced block");
        Ok(info)
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<u64, ErrorObjectOwned> {
        let now = self.node.write().set_timestamp(timestamp);
        info!("Timestamp set to {}", now);
        Ok(now)
    }

    async fn ledger_create_artwork(
        &self,
        params: CreateArtworkParams,
    ) -> Result<TxRef, ErrorObjectOwned> {
        self.submit(
            params.sender,
            Amount::ZERO,
            LedgerCall::CreateArtwork {
                title: params.title,
                description: params.description,
                content_hash: params.content_hash,
            },
        )
    }

    async fn ledger_start_auction(
        &self,
        params: StartAuctionParams,
    ) -> Result<TxRef, ErrorObjectOwned> {
        self.submit(
            params.sender,
            Amount::ZERO,
            LedgerCall::StartAuction {
                artwork_id: params.artwork_id,
                duration_secs: params.duration_secs,
            },
        )
    }

    async fn ledger_place_encrypted_bid(
        &self,
        params: PlaceBidParams,
    ) -> Result<TxRef, ErrorObjectOwned> {
        self.submit(
            params.sender,
            params.value,
            LedgerCall::PlaceEncryptedBid { bid: params.bid },
        )
    }

    async fn ledger_end_auction(
        &self,
        params: EndAuctionParams,
    ) -> Result<TxRef, ErrorObjectOwned> {
        self.submit(
            params.sender,
            Amount::ZERO,
            LedgerCall::EndAuction {
                auction_id: params.auction_id,
            },
        )
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        Ok(self.block_info())
    }

    async fn query_get_network_key(&self) -> Result<NetworkKeyRpc, ErrorObjectOwned> {
        Ok(NetworkKeyRpc {
            key: self.node.read().network_key().to_hex(),
            scheme: SCHEME_LABEL.to_string(),
        })
    }

    async fn query_get_artwork_info(
        &self,
        artwork_id: ArtworkId,
    ) -> Result<Option<Artwork>, ErrorObjectOwned> {
        match self.query(LedgerQuery::GetArtwork { artwork_id }) {
            LedgerQueryResponse::Artwork(artwork) => Ok(artwork),
            other => Err(unexpected(other)),
        }
    }

    async fn query_get_auction_info(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<Auction>, ErrorObjectOwned> {
        match self.query(LedgerQuery::GetAuction { auction_id }) {
            LedgerQueryResponse::Auction(auction) => Ok(auction),
            other => Err(unexpected(other)),
        }
    }

    async fn query_list_artworks(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Artwork>, ErrorObjectOwned> {
        match self.query(LedgerQuery::ListArtworks { offset, limit }) {
            LedgerQueryResponse::ArtworkList(list) => Ok(list),
            other => Err(unexpected(other)),
        }
    }

    async fn query_list_auctions(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Auction>, ErrorObjectOwned> {
        match self.query(LedgerQuery::ListAuctions { offset, limit }) {
            LedgerQueryResponse::AuctionList(list) => Ok(list),
            other => Err(unexpected(other)),
        }
    }

    async fn query_get_auction_bids(
        &self,
        auction_id: AuctionId,
    ) -> Result<Vec<EncryptedBid>, ErrorObjectOwned> {
        match self.query(LedgerQuery::GetAuctionBids { auction_id }) {
            LedgerQueryResponse::Bids(bids) => Ok(bids),
            other => Err(unexpected(other)),
        }
    }

    async fn query_get_transaction(&self, tx_ref: TxRef) -> Result<TxStatus, ErrorObjectOwned> {
        Ok(self.node.read().tx_status(&tx_ref))
    }

    async fn query_get_balance(&self, address: Identity) -> Result<Amount, ErrorObjectOwned> {
        match self.query(LedgerQuery::GetBalance { address }) {
            LedgerQueryResponse::Balance(balance) => Ok(balance),
            other => Err(unexpected(other)),
        }
    }
}

/// Produce a block every `interval` until the task is dropped.
async fn mine_blocks(node: Arc<RwLock<LedgerNode>>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        node.write().produce_block();
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_ledger=info".parse()?)
                .add_directive("artbid_ledger=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => MockLedgerConfig::load(path)?,
        None => {
            let mut config = MockLedgerConfig::default();
            config.genesis.initial_timestamp = unix_now();
            config
        }
    };
    if let Some(addr) = &cli.addr {
        config.addr = addr.parse()?;
    }
    if cli.block_interval_ms.is_some() {
        config.block_interval_ms = cli.block_interval_ms;
    }

    let node = Arc::new(RwLock::new(LedgerNode::from_genesis(&config.genesis)?));

    info!("Starting mock ledger server on {}", config.addr);

    let server = Server::builder().build(config.addr).await?;
    let handle = server.start(MockLedgerServer::new(node.clone()).into_rpc());

    let miner = config.block_interval_ms.filter(|ms| *ms > 0).map(|ms| {
        info!("Producing a block every {}ms", ms);
        tokio::spawn(mine_blocks(node.clone(), Duration::from_millis(ms)))
    });

    info!("Mock ledger running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    if let Some(miner) = miner {
        miner.abort();
    }
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use artbid_crypto::{BidEncoder, FixedClock, NetworkKey, SealedBidEncoder};
    use artbid_ledger::LedgerGenesisConfig;
    use artbid_types::ContentRef;

    fn server() -> MockLedgerServer {
        let node = LedgerNode::from_genesis(&LedgerGenesisConfig::default()).unwrap();
        MockLedgerServer::new(Arc::new(RwLock::new(node)))
    }

    fn addr(byte: u8) -> Identity {
        Identity([byte; 20])
    }

    async fn mine(server: &MockLedgerServer, tx: &TxRef) -> TxStatus {
        server.admin_advance_block().await.unwrap();
        server.query_get_transaction(tx.clone()).await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_sender_is_wallet_rejected() {
        let server = server();
        let err = server
            .ledger_create_artwork(CreateArtworkParams {
                sender: Identity::default(),
                title: "Dawn".into(),
                description: "Oil on canvas".into(),
                content_hash: ContentRef::from_bytes(b"dawn").to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), WALLET_REJECTED_CODE);
    }

    #[tokio::test]
    async fn test_lifecycle_over_rpc_surface() {
        let server = server();
        let creator = addr(1);
        let bidder = addr(2);

        let tx = server
            .ledger_create_artwork(CreateArtworkParams {
                sender: creator,
                title: "Dawn".into(),
                description: "Oil on canvas".into(),
                content_hash: ContentRef::from_bytes(b"dawn").to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            server.query_get_transaction(tx.clone()).await.unwrap(),
            TxStatus::Pending
        );
        assert!(mine(&server, &tx).await.is_final());
        let artwork = server
            .query_get_artwork_info(ArtworkId(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(artwork.creator, creator);

        let tx = server
            .ledger_start_auction(StartAuctionParams {
                sender: creator,
                artwork_id: ArtworkId(1),
                duration_secs: 3600,
            })
            .await
            .unwrap();
        assert!(matches!(mine(&server, &tx).await, TxStatus::Confirmed { .. }));

        let key = NetworkKey::from_hex(&server.query_get_network_key().await.unwrap().key).unwrap();
        let amount = Amount::parse_ether("2.75").unwrap();
        let sealed = SealedBidEncoder::new(key)
            .encode(amount, &bidder, AuctionId(1), &FixedClock(1_700_000_010))
            .unwrap();
        let tx = server
            .ledger_place_encrypted_bid(PlaceBidParams {
                sender: bidder,
                bid: EncryptedBid {
                    auction_id: AuctionId(1),
                    encrypted_amount: sealed.encrypted_amount,
                    proof: sealed.proof,
                    submitted_by: bidder,
                    client_timestamp: sealed.sealed_at,
                },
                value: amount,
            })
            .await
            .unwrap();
        assert!(matches!(mine(&server, &tx).await, TxStatus::Confirmed { .. }));
        assert_eq!(
            server
                .query_get_auction_bids(AuctionId(1))
                .await
                .unwrap()
                .len(),
            1
        );

        let tx = server
            .ledger_end_auction(EndAuctionParams {
                sender: creator,
                auction_id: AuctionId(1),
            })
            .await
            .unwrap();
        assert!(matches!(mine(&server, &tx).await, TxStatus::Confirmed { .. }));

        let auction = server
            .query_get_auction_info(AuctionId(1))
            .await
            .unwrap()
            .unwrap();
        assert!(auction.ended);
        assert_eq!(auction.settled_price, Some(amount));
        assert_eq!(server.query_get_balance(creator).await.unwrap(), amount);
    }

    #[tokio::test]
    async fn test_reverted_call_reports_reason() {
        let server = server();
        let tx = server
            .ledger_start_auction(StartAuctionParams {
                sender: addr(1),
                artwork_id: ArtworkId(99),
                duration_secs: 3600,
            })
            .await
            .unwrap();
        match mine(&server, &tx).await {
            TxStatus::Reverted { reason } => assert!(reason.contains("not found")),
            other => panic!("expected revert, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_timestamp_only_moves_forward() {
        let server = server();
        let start = server.chain_get_block_info().await.unwrap().timestamp;
        assert_eq!(server.admin_set_timestamp(start + 100).await.unwrap(), start + 100);
        assert_eq!(server.admin_set_timestamp(start).await.unwrap(), start + 100);
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let server = server();
        let status = server
            .query_get_transaction(TxRef::new("0xdeadbeef"))
            .await
            .unwrap();
        assert_eq!(status, TxStatus::Unknown);
    }
}
