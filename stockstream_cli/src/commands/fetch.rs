//! The `fetch` subcommand: one day of prices for one batch of symbols.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use stockstream_lib::storage::{MemoryObjectStore, ObjectStore, SharedStore};
use stockstream_lib::{
    load_symbols, load_symbols_from_file, run_ingest, Config, Fetcher, IngestReport, RawDataStore,
    StockStreamError, YahooSource,
};

use crate::output::{print_failure, print_ingest_report, FailureReport, OutputFormat};

/// Local symbol list used when the stored configuration is unavailable.
pub const DEFAULT_SYMBOLS_FILE: &str = "config/symbols.json";

#[derive(Args)]
pub struct FetchArgs {
    /// Comma-separated symbols (e.g. BHP,CBA). Overrides every other source.
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// JSON file of the form {"symbols": [...]}
    #[arg(long)]
    pub symbols_file: Option<PathBuf>,

    /// Trading date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<String>,

    /// Batch number, when the universe is partitioned
    #[arg(long)]
    pub batch_number: Option<u32>,

    /// Suffix appended to every symbol when querying Yahoo Finance
    #[arg(long, default_value = ".AX")]
    pub exchange_suffix: String,

    /// Fetch and validate, but keep the batch in memory instead of the bucket
    #[arg(long)]
    pub dry_run: bool,
}

/// Explicit list first, then `--symbols-file`, then the stored
/// configuration with the default local file as fallback.
fn resolve_symbols(
    args: &FetchArgs,
    store: &dyn ObjectStore,
    config: &Config,
) -> Result<Vec<String>, StockStreamError> {
    let explicit: Vec<String> = args
        .symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    if !explicit.is_empty() {
        return Ok(explicit);
    }
    if let Some(path) = &args.symbols_file {
        return load_symbols_from_file(path);
    }
    load_symbols(
        store,
        &config.symbols_config_key(),
        Path::new(DEFAULT_SYMBOLS_FILE),
    )
}

pub async fn run(args: &FetchArgs, config: &Config, format: &OutputFormat) -> Result<()> {
    let start = Instant::now();
    match ingest(args, config).await {
        Ok(report) => {
            print_ingest_report(&report, format);
            Ok(())
        }
        Err(err) => {
            print_failure(&FailureReport::new(&err, start.elapsed()), format);
            Err(err.into())
        }
    }
}

async fn ingest(args: &FetchArgs, config: &Config) -> Result<IngestReport, StockStreamError> {
    let date = super::resolve_date(args.date.as_deref())?;
    let bucket = config.open_store()?;
    let symbols = resolve_symbols(args, bucket.as_ref(), config)?;

    let target: SharedStore = if args.dry_run {
        tracing::info!("Dry run: batch will not be written to the bucket");
        Arc::new(MemoryObjectStore::new())
    } else {
        bucket
    };
    let raw = RawDataStore::new(target, &config.raw_data_prefix);

    let source = YahooSource::with_exchange_suffix(&args.exchange_suffix)?;
    let mut fetcher = Fetcher::new(source, config.fetch.clone()).with_thresholds(config.thresholds);

    run_ingest(&mut fetcher, &raw, &symbols, date, args.batch_number).await
}
