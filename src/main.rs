//! partition-writer - seed synthetic posts and bulk insert them by author
//!
//! Runs against the in-memory store emulator, optionally with a provisioned
//! throughput limit so throttling and backoff can be observed.

use anyhow::Context;
use clap::Parser;
use partition_writer::fixtures::{SeedOptions, seed_posts};
use partition_writer::{
    Config, InMemoryDocumentStore, InMemoryStoreConfig, PartitionedWriter, init_logging,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

#[derive(Debug, Parser)]
#[command(name = "partition-writer", version, long_version = LONG_VERSION)]
#[command(about = "Bulk insert synthetic posts partitioned by author")]
struct Args {
    /// YAML configuration file; environment overrides still apply
    #[arg(short, long, env = "PARTITION_WRITER_CONFIG")]
    config: Option<PathBuf>,

    /// Number of distinct authors (partition keys)
    #[arg(long, default_value_t = 10_000)]
    authors: usize,

    /// Minimum posts per author
    #[arg(long, default_value_t = 2)]
    min_posts: usize,

    /// Maximum posts per author
    #[arg(long, default_value_t = 20)]
    max_posts: usize,

    /// Emulated provisioned throughput in request units per second
    #[arg(long)]
    throughput: Option<f64>,

    /// Emulated service latency per batch, in milliseconds
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Seed for reproducible data sets
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let config = load_config(args.config.as_deref()).await?;
    init_logging(&config.logging)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let options = SeedOptions {
        authors: args.authors,
        min_posts_per_author: args.min_posts,
        max_posts_per_author: args.max_posts,
    };
    info!(
        authors = options.authors,
        min_posts = options.min_posts_per_author,
        max_posts = options.max_posts_per_author,
        "Seeding posts"
    );
    let posts = seed_posts(&options, &mut rng);

    let mut store_config = InMemoryStoreConfig::default();
    if let Some(throughput) = args.throughput {
        store_config = store_config.with_throughput(throughput);
    }
    if let Some(latency_ms) = args.latency_ms {
        store_config = store_config.with_latency(Duration::from_millis(latency_ms));
    }
    let store = InMemoryDocumentStore::new(store_config);

    let writer = PartitionedWriter::new(Arc::new(store.clone()), config)?;
    let cancel = writer.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling remaining chunks");
            cancel.cancel();
        }
    });

    let summary = writer
        .insert_partitioned(posts, |post| post.author.clone())
        .await
        .context("batch insert aborted")?;

    println!("Items:        {}", summary.total_items);
    println!("Partitions:   {}", summary.partitions);
    println!("Succeeded:    {}", summary.succeeded);
    println!("Failed:       {}", summary.failed);
    if summary.cancelled > 0 {
        println!("Cancelled:    {}", summary.cancelled);
    }
    println!("Throttled:    {}", summary.throttled_responses);
    println!(
        "Cost:         {} RU",
        partition_writer::utils::format_cost_units(summary.total_cost_units)
    );
    println!("Elapsed:      {}", summary.elapsed_display());
    println!("Stored:       {}", store.document_count());

    Ok(summary.is_complete())
}

async fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            let mut config = Config::from_file(path)
                .await
                .with_context(|| format!("loading {}", path.display()))?;
            config.apply_env_overrides()?;
            config.validate()?;
            config
        }
        None => Config::from_env()?,
    };
    Ok(config)
}
