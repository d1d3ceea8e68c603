use anyhow::{bail, Context};
use carematch::loader::{load_collection, load_collection_embedded, load_query, read_events};
use carematch::prelude::*;
use carematch::{HttpEmbeddingProvider, ProfileEmbedder, ProfileEncoder};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Rank doctors or hospitals against a query
#[derive(Parser, Debug)]
#[command(name = "carematch")]
#[command(about = "Embedding-based healthcare entity matching", long_about = None)]
struct Args {
    /// Collection file (JSON array of entities, or {config, entities})
    #[arg(short, long)]
    collection: PathBuf,

    /// Collection name; defaults to the configured name or the file stem
    #[arg(long)]
    name: Option<String>,

    /// Query file (JSON)
    #[arg(short, long, conflicts_with = "text")]
    query: Option<PathBuf>,

    /// Free-text query
    #[arg(short, long)]
    text: Option<String>,

    /// Maximum number of results
    #[arg(short, long)]
    limit: Option<i64>,

    /// Update log replayed before the query (JSON lines)
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// HTTP embedding endpoint; without it text queries use the fallback encoding
    #[arg(long)]
    embed_url: Option<String>,

    /// Engine configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Encode a base vector from the profile for entities without an embedding
    #[arg(long)]
    encode_missing: bool,

    /// Embed the profile text of entities without an embedding through the
    /// embedding endpoint, falling back to the local text encoding
    #[arg(long, conflicts_with = "encode_missing")]
    embed_missing: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // results go to stdout, logs to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting CareMatch v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path).with_context(|| format!("loading config {:?}", path))?,
        None => EngineConfig::default(),
    };

    let provider: Arc<dyn EmbeddingProvider> = match &args.embed_url {
        Some(url) => Arc::new(HttpEmbeddingProvider::new(url.clone(), config.embed_timeout())?),
        None => Arc::new(DisabledProvider),
    };

    let collection = if args.embed_missing {
        let embedder = ProfileEmbedder::new(provider.clone(), config.embed_timeout());
        load_collection_embedded(&args.collection, args.name.as_deref(), &embedder).await
    } else {
        let encoder = ProfileEncoder::new(config.layout.clone());
        load_collection(&args.collection, args.name.as_deref(), args.encode_missing.then_some(&encoder))
    }
    .with_context(|| format!("loading collection {:?}", args.collection))?;
    let name = collection.name().to_string();
    let store = collection.store().clone();

    let registry = Arc::new(CollectionRegistry::new());
    registry.insert(collection);

    if let Some(path) = &args.events {
        let events = read_events(path).with_context(|| format!("reading events {:?}", path))?;
        let (tx, rx) = mpsc::channel(1024);
        let ingest = tokio::spawn(DeltaIngestor::new(store, DeltaSchema::default()).run(rx));
        for event in events {
            tx.send(event).await.context("update stream closed")?;
        }
        drop(tx);
        let stats = ingest.await?;
        info!(applied = stats.applied, rejected = stats.rejected, "update log replayed");
    }

    let mut query = match (&args.query, &args.text) {
        (Some(path), _) => load_query(path).with_context(|| format!("loading query {:?}", path))?,
        (None, Some(text)) => Query::text(text.clone()),
        (None, None) => bail!("either --query or --text is required"),
    };
    if let Some(limit) = args.limit {
        query.limit = Some(limit);
    }

    let engine = RankingEngine::new(registry, provider, config);
    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling query");
            on_interrupt.cancel();
        }
    });

    let response = engine.search_with_cancel(&name, &query, &cancel).await?;
    info!(
        results = response.stats.results_count,
        quality = ?response.embedding_quality,
        "query complete"
    );
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
