//! CLI for sealed-bid art auctions.
//!
//! This binary provides commands for:
//! - Registering artworks
//! - Starting and ending auctions
//! - Submitting sealed bids
//! - Querying artworks, auctions and transactions

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use artbid_client::{
    ArtworkDraft, ArtworkRegistrar, AuctionAdmin, BidRequest, BidSubmitter, ClientConfig,
    LedgerGateway, LedgerReader, RpcLedgerGateway, StaticSession, SubmissionError,
    SubmissionHandle,
};
use artbid_crypto::{NetworkKey, SealedBidEncoder, SystemClock, SCHEME_LABEL};
use artbid_types::{Amount, ArtworkId, AuctionId, ContentRef, Identity, TxRef, TxStatus};

#[derive(Parser)]
#[command(name = "artbid-cli")]
#[command(about = "CLI for sealed-bid art auctions")]
struct Cli {
    /// Client config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ledger RPC endpoint (overrides the config file)
    #[arg(long)]
    rpc: Option<String>,

    /// Sender address (hex); writes fail as not connected without it
    #[arg(long, global = true)]
    sender: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new artwork
    CreateArtwork {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// Content reference of the uploaded media
        #[arg(long, conflicts_with = "file")]
        content_hash: Option<String>,

        /// Compute the content reference from a local file instead
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Start an auction for an artwork you created
    StartAuction {
        #[arg(long)]
        artwork_id: u64,

        /// Auction length in seconds
        #[arg(long)]
        duration_secs: u64,
    },

    /// Submit a sealed bid
    Bid {
        #[arg(long)]
        auction_id: u64,

        /// Bid amount in ether, e.g. 2.75 (sealed, but also sent as value)
        #[arg(long)]
        amount: String,

        /// Highest bid you have seen, in ether
        #[arg(long)]
        known_highest: Option<String>,

        /// Confirmation timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// End an auction and reveal the winning price
    EndAuction {
        #[arg(long)]
        auction_id: u64,
    },

    /// Get artwork details
    Artwork {
        #[arg(long)]
        artwork_id: u64,
    },

    /// Get auction details
    Auction {
        #[arg(long)]
        auction_id: u64,
    },

    /// Get the status of a submitted transaction
    TxStatus {
        /// Transaction reference (0x-prefixed hash)
        #[arg(long)]
        tx: String,
    },

    /// Print the content reference of a local file
    ContentHash {
        #[arg(long)]
        file: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(rpc) = &cli.rpc {
        config.rpc_endpoint = rpc.clone();
    }
    config.validate()?;
    Ok(config)
}

fn session(sender: Option<&str>) -> Result<Arc<StaticSession>> {
    match sender {
        Some(s) => {
            let identity: Identity = s.parse().context("Invalid sender address")?;
            Ok(Arc::new(StaticSession::connected(identity)))
        }
        None => Ok(Arc::new(StaticSession::disconnected())),
    }
}

fn content_ref_of(path: &Path) -> Result<ContentRef> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ContentRef::from_bytes(&bytes))
}

async fn network_key(config: &ClientConfig, gateway: &RpcLedgerGateway) -> Result<NetworkKey> {
    if let Some(key) = &config.network_key {
        return Ok(NetworkKey::from_hex(key)?);
    }
    let published = gateway.network_key().await?;
    if published.scheme != SCHEME_LABEL {
        bail!("Unsupported sealing scheme: {}", published.scheme);
    }
    Ok(NetworkKey::from_hex(&published.key)?)
}

fn report_failure(err: SubmissionError) -> anyhow::Error {
    if let Some(tx_ref) = err.pending_tx() {
        println!("Write was accepted but not confirmed in time.");
        println!("Check it with: artbid-cli tx-status --tx {}", tx_ref);
    }
    anyhow!(err)
}

async fn create_artwork_cmd(
    registrar: &ArtworkRegistrar,
    title: String,
    description: String,
    content_hash: String,
) -> Result<()> {
    let handle = SubmissionHandle::new();
    let artwork_id = registrar
        .register(
            &handle,
            ArtworkDraft {
                title,
                description,
                content_hash,
            },
        )
        .await
        .map_err(report_failure)?;

    info!("Created artwork with ID: {}", artwork_id);
    println!("Artwork ID: {}", artwork_id);
    if let Some(tx) = handle.tx_ref() {
        println!("  Tx: {}", tx);
    }
    Ok(())
}

async fn bid_cmd(
    submitter: &BidSubmitter,
    auction_id: u64,
    amount: String,
    known_highest: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let mut request = BidRequest::new(AuctionId(auction_id), amount);
    if let Some(text) = known_highest {
        request = request.with_known_highest(Amount::parse_ether(&text)?);
    }
    if let Some(secs) = timeout_secs {
        request = request.with_timeout(Duration::from_secs(secs));
    }

    println!("Note: the bid amount is sent as a plaintext value transfer.");
    let handle = SubmissionHandle::new();
    let tx_ref = submitter
        .submit(&handle, request)
        .await
        .map_err(report_failure)?;

    println!("Bid confirmed");
    println!("  Auction ID: {}", auction_id);
    println!("  Tx: {}", tx_ref);
    Ok(())
}

async fn get_artwork_cmd(reader: &LedgerReader, artwork_id: u64) -> Result<()> {
    match reader.artwork(ArtworkId(artwork_id)).await? {
        Some(a) => {
            println!("Artwork {}:", a.id);
            println!("  Title: {}", a.title);
            println!("  Description: {}", a.description);
            println!("  Content: {}", a.content_ref);
            println!("  Creator: {}", a.creator);
            println!("  Active: {}", a.active);
            println!("  Sold: {}", a.sold);
        }
        None => {
            println!("Artwork {} not found", artwork_id);
        }
    }
    Ok(())
}

async fn get_auction_cmd(reader: &LedgerReader, auction_id: u64) -> Result<()> {
    match reader.auction(AuctionId(auction_id)).await? {
        Some(a) => {
            println!("Auction {}:", a.id);
            println!("  Artwork: {}", a.artwork_id);
            println!("  Creator: {}", a.creator);
            println!("  Bids: {}", a.bid_count);
            match a.highest_bidder {
                Some(bidder) => println!("  Highest Bidder: {}", bidder),
                None => println!("  Highest Bidder: none"),
            }
            if !a.sealed_highest_bid.is_empty() {
                let sealed = hex::encode(&a.sealed_highest_bid);
                println!("  Highest Bid: sealed ({}...)", &sealed[..16.min(sealed.len())]);
            }
            println!("  Active: {}", a.active);
            println!("  Ended: {}", a.ended);
            println!("  Start: {}", a.start_time);
            println!("  End: {}", a.end_time);
            if let Some(price) = a.settled_price {
                println!("  Winning Price: {} ETH", price);
            }
        }
        None => {
            println!("Auction {} not found", auction_id);
        }
    }
    Ok(())
}

async fn tx_status_cmd(reader: &LedgerReader, tx: String) -> Result<()> {
    let tx_ref = TxRef::new(tx);
    match reader.transaction_status(&tx_ref).await? {
        TxStatus::Pending => println!("{}: pending", tx_ref),
        TxStatus::Confirmed { receipt } => {
            println!("{}: confirmed in block {}", tx_ref, receipt.block_height);
            println!("  Outcome: {:?}", receipt.outcome);
        }
        TxStatus::Reverted { reason } => println!("{}: reverted ({})", tx_ref, reason),
        TxStatus::Unknown => println!("{}: unknown", tx_ref),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("artbid_cli=info".parse()?)
                .add_directive("artbid_client=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Building the client does not touch the network
    let rpc = RpcLedgerGateway::connect(&config)?;
    let gateway: Arc<dyn LedgerGateway> = Arc::new(rpc.clone());
    let session = session(cli.sender.as_deref())?;
    let reader = LedgerReader::new(gateway.clone(), config.read_retry.clone());

    match cli.command {
        Commands::CreateArtwork {
            title,
            description,
            content_hash,
            file,
        } => {
            let content_hash = match (content_hash, file) {
                (Some(hash), _) => hash,
                (None, Some(path)) => content_ref_of(&path)?.to_string(),
                (None, None) => bail!("Either --content-hash or --file is required"),
            };
            let registrar = ArtworkRegistrar::new(gateway, session, &config);
            create_artwork_cmd(&registrar, title, description, content_hash).await?;
        }

        Commands::StartAuction {
            artwork_id,
            duration_secs,
        } => {
            let admin = AuctionAdmin::new(gateway, session, &config);
            let handle = SubmissionHandle::new();
            let auction_id = admin
                .start_auction(&handle, ArtworkId(artwork_id), duration_secs)
                .await
                .map_err(report_failure)?;
            println!("Auction ID: {}", auction_id);
        }

        Commands::Bid {
            auction_id,
            amount,
            known_highest,
            timeout_secs,
        } => {
            let key = network_key(&config, &rpc).await?;
            let submitter = BidSubmitter::new(
                gateway,
                session,
                Arc::new(SealedBidEncoder::new(key)),
                Arc::new(SystemClock),
                config.clone(),
            );
            bid_cmd(&submitter, auction_id, amount, known_highest, timeout_secs).await?;
        }

        Commands::EndAuction { auction_id } => {
            let admin = AuctionAdmin::new(gateway, session, &config);
            let handle = SubmissionHandle::new();
            let settlement = admin
                .end_auction(&handle, AuctionId(auction_id))
                .await
                .map_err(report_failure)?;

            println!("Auction {} ended", settlement.auction_id);
            match (settlement.winner, settlement.winning_price) {
                (Some(winner), Some(price)) => {
                    println!("  Winner: {}", winner);
                    println!("  Price: {} ETH", price);
                }
                _ => println!("  No bids"),
            }
        }

        Commands::Artwork { artwork_id } => {
            get_artwork_cmd(&reader, artwork_id).await?;
        }

        Commands::Auction { auction_id } => {
            get_auction_cmd(&reader, auction_id).await?;
        }

        Commands::TxStatus { tx } => {
            tx_status_cmd(&reader, tx).await?;
        }

        Commands::ContentHash { file } => {
            println!("{}", content_ref_of(&file)?);
        }
    }

    Ok(())
}
