mod arrow_io;
mod models;
mod print;
mod storage;

use anyhow::Context;
use arrow_io::CHUNK_SIZE;
use carmen::{
    convert, default_registry, write_records, ConvertOptions, DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_RETAINED_SKIPPED,
};
use clap::Parser;
use print::PrintSink;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storage::BagStorage;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Convert a CARMEN log into a channel-grouped Arrow bag
#[derive(Debug, Parser)]
#[command(name = "carmen2bag", version)]
struct Args {
    /// Input CARMEN log file
    #[arg(short, long)]
    input: PathBuf,

    /// Output bag directory; records are printed as JSON lines when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Runtime worker threads; 0 runs everything on the current thread
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Wake up every N milliseconds while waiting for lines (debug logging only)
    #[arg(long)]
    poll_timeout_ms: Option<u64>,

    /// Lines buffered between the file reader and the converter
    #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    channel_capacity: usize,

    /// Rejected lines kept for the end-of-run report
    #[arg(long, default_value_t = DEFAULT_MAX_RETAINED_SKIPPED)]
    max_skipped: usize,

    /// Rows per Arrow chunk file
    #[arg(long, default_value_t = CHUNK_SIZE)]
    chunk_size: usize,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so print mode can own stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carmen2bag=info,carmen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let runtime = build_runtime(args.workers).context("failed to start async runtime")?;
    runtime.block_on(run(args))
}

fn build_runtime(workers: usize) -> std::io::Result<tokio::runtime::Runtime> {
    if workers == 0 {
        tokio::runtime::Builder::new_current_thread().enable_all().build()
    } else {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .enable_all()
            .build()
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let registry = Arc::new(default_registry().context("invalid parser registration")?);
    let options = ConvertOptions {
        channel_capacity: args.channel_capacity,
        poll_interval: args.poll_timeout_ms.map(Duration::from_millis),
        max_retained_skipped: args.max_skipped,
    };

    let mut conversion = convert(&args.input, &options, registry)
        .with_context(|| format!("cannot convert {}", args.input.display()))?;

    match &args.output {
        Some(output) => {
            let mut bag = BagStorage::create(output, args.chunk_size)
                .with_context(|| format!("cannot create bag at {}", output.display()))?;
            let stats = write_records(&mut conversion, &mut bag).await?;
            drop(bag);

            let meta = storage::read_meta(output)?;
            for channel in &meta.channels {
                info!(
                    "{:<16} {:<28} {:>8} messages in {} chunks",
                    channel.name, channel.type_name, channel.message_count, channel.chunk_count
                );
            }
            info!(
                "Converted {} of {} lines into {} ({} skipped)",
                stats.records,
                stats.lines,
                output.display(),
                stats.skipped
            );
        }
        None => {
            let mut sink = PrintSink::new(BufWriter::new(std::io::stdout()));
            let stats = write_records(&mut conversion, &mut sink).await?;
            info!("Printed {} records ({} lines skipped)", stats.records, stats.skipped);
        }
    }

    for skipped in conversion.skipped() {
        debug!("Skipped line {}: {}", skipped.number, skipped.error);
    }
    if conversion.skipped_truncated() > 0 {
        debug!("{} more skipped lines not listed", conversion.skipped_truncated());
    }

    Ok(())
}
