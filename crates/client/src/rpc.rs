//! JSON-RPC ledger gateway.

use std::sync::Arc;
use std::time::Duration;

use artbid_types::rpc::{
    BlockInfo, CreateArtworkParams, EndAuctionParams, NetworkKeyRpc, PlaceBidParams,
    StartAuctionParams, LEDGER_REJECTED_CODE, WALLET_REJECTED_CODE,
};
use artbid_types::{
    Amount, Artwork, ArtworkId, Auction, AuctionId, ContentRef, EncryptedBid, Identity, TxRef,
    TxStatus,
};
use async_trait::async_trait;
use futures::stream;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::ClientError;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use tracing::debug;

use crate::config::ClientConfig;
use crate::gateway::{GatewayError, LedgerGateway, StatusStream};

/// Map a JSON-RPC client failure onto the gateway classification.
pub fn classify(err: ClientError) -> GatewayError {
    match err {
        ClientError::Call(obj) => match obj.code() {
            WALLET_REJECTED_CODE => GatewayError::WalletRejected,
            LEDGER_REJECTED_CODE => GatewayError::Reverted(obj.message().to_string()),
            _ => GatewayError::Protocol(obj.message().to_string()),
        },
        ClientError::Transport(e) => GatewayError::Unreachable(e.to_string()),
        ClientError::RequestTimeout => GatewayError::Unreachable("request timed out".into()),
        other => GatewayError::Protocol(other.to_string()),
    }
}

/// Gateway talking to a ledger node over HTTP JSON-RPC.
#[derive(Clone)]
pub struct RpcLedgerGateway {
    client: Arc<HttpClient>,
    poll_interval: Duration,
}

impl RpcLedgerGateway {
    pub fn connect(config: &ClientConfig) -> Result<Self, GatewayError> {
        let client = HttpClientBuilder::default()
            .build(&config.rpc_endpoint)
            .map_err(classify)?;
        Ok(Self {
            client: Arc::new(client),
            poll_interval: config.poll_interval(),
        })
    }

    /// Sealing key published by the ledger.
    pub async fn network_key(&self) -> Result<NetworkKeyRpc, GatewayError> {
        self.client
            .request("query_getNetworkKey", Vec::<()>::new())
            .await
            .map_err(classify)
    }

    pub async fn block_info(&self) -> Result<BlockInfo, GatewayError> {
        self.client
            .request("chain_getBlockInfo", Vec::<()>::new())
            .await
            .map_err(classify)
    }
}

#[async_trait]
impl LedgerGateway for RpcLedgerGateway {
    async fn create_artwork(
        &self,
        sender: &Identity,
        title: &str,
        description: &str,
        content_ref: &ContentRef,
    ) -> Result<TxRef, GatewayError> {
        let params = CreateArtworkParams {
            sender: *sender,
            title: title.to_string(),
            description: description.to_string(),
            content_hash: content_ref.to_string(),
        };
        self.client
            .request("ledger_createArtwork", vec![params])
            .await
            .map_err(classify)
    }

    async fn start_auction(
        &self,
        sender: &Identity,
        artwork_id: ArtworkId,
        duration_secs: u64,
    ) -> Result<TxRef, GatewayError> {
        let params = StartAuctionParams {
            sender: *sender,
            artwork_id,
            duration_secs,
        };
        self.client
            .request("ledger_startAuction", vec![params])
            .await
            .map_err(classify)
    }

    async fn place_encrypted_bid(
        &self,
        sender: &Identity,
        bid: &EncryptedBid,
        value: Amount,
    ) -> Result<TxRef, GatewayError> {
        let params = PlaceBidParams {
            sender: *sender,
            bid: bid.clone(),
            value,
        };
        self.client
            .request("ledger_placeEncryptedBid", vec![params])
            .await
            .map_err(classify)
    }

    async fn end_auction(
        &self,
        sender: &Identity,
        auction_id: AuctionId,
    ) -> Result<TxRef, GatewayError> {
        let params = EndAuctionParams {
            sender: *sender,
            auction_id,
        };
        self.client
            .request("ledger_endAuction", vec![params])
            .await
            .map_err(classify)
    }

    async fn get_artwork_info(
        &self,
        artwork_id: ArtworkId,
    ) -> Result<Option<Artwork>, GatewayError> {
        self.client
            .request("query_getArtworkInfo", vec![artwork_id])
            .await
            .map_err(classify)
    }

    async fn get_auction_info(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<Auction>, GatewayError> {
        self.client
            .request("query_getAuctionInfo", vec![auction_id])
            .await
            .map_err(classify)
    }

    async fn transaction_status(&self, tx_ref: &TxRef) -> Result<TxStatus, GatewayError> {
        fetch_status(&self.client, tx_ref).await
    }

    /// Polls `query_getTransaction` every `confirmation_poll_ms` and ends
    /// after the first final status.
    fn watch_transaction(&self, tx_ref: &TxRef) -> StatusStream {
        let state = PollState {
            client: self.client.clone(),
            tx_ref: tx_ref.clone(),
            interval: self.poll_interval,
            first: true,
            done: false,
        };
        Box::pin(stream::unfold(state, |mut state| async move {
            if state.done {
                return None;
            }
            if !state.first {
                tokio::time::sleep(state.interval).await;
            }
            state.first = false;

            let status = fetch_status(&state.client, &state.tx_ref).await;
            if let Ok(s) = &status {
                debug!(tx_ref = %state.tx_ref.short(), status = ?s, "Polled transaction");
                state.done = s.is_final();
            }
            Some((status, state))
        }))
    }
}

struct PollState {
    client: Arc<HttpClient>,
    tx_ref: TxRef,
    interval: Duration,
    first: bool,
    done: bool,
}

async fn fetch_status(client: &HttpClient, tx_ref: &TxRef) -> Result<TxStatus, GatewayError> {
    client
        .request("query_getTransaction", vec![tx_ref])
        .await
        .map_err(classify)
}
