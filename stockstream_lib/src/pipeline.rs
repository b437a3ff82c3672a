//! End-to-end runs: daily ingest and symbol universe refresh.

use std::path::Path;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use stockstream_source::PriceSource;

use crate::batching::{split_into_batches, SymbolBatch};
use crate::error::StockStreamError;
use crate::fetcher::Fetcher;
use crate::storage::{ObjectStore, RawDataStore};
use crate::symbols::{parse_directory_csv, DirectorySource, SymbolArchive};
use crate::validation::validate_symbol_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    /// Every symbol produced an observation.
    Success,
    /// Some symbols failed; the successes were stored.
    Partial,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub status: IngestStatus,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<u32>,
    pub symbols_processed: u64,
    pub symbols_fetched: u64,
    pub symbols_failed: u64,
    pub validation_findings: usize,
    pub key: String,
    pub execution_time: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub date: NaiveDate,
    pub key: String,
    pub total_symbols: usize,
    pub num_batches: usize,
    pub batch_size: usize,
    pub symbols: Vec<String>,
    pub batches: Vec<SymbolBatch>,
    pub execution_time: f64,
}

fn symbols_from_json(bytes: &[u8], origin: &str) -> Result<Vec<String>, StockStreamError> {
    let doc: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| StockStreamError::SymbolList(format!("{}: {}", origin, e)))?;
    validate_symbol_config(&doc)
        .map_err(|e| StockStreamError::SymbolList(format!("{}: {}", origin, e)))
}

/// Load the `{"symbols": [...]}` document stored under `key`.
pub fn load_symbols_from_store(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<Vec<String>, StockStreamError> {
    tracing::info!(key, "Loading symbols from store");
    let bytes = store.get(key)?;
    let symbols = symbols_from_json(&bytes, key)?;
    tracing::info!(count = symbols.len(), key, "Loaded symbols");
    Ok(symbols)
}

/// Load a `{"symbols": [...]}` document from a local file.
pub fn load_symbols_from_file(path: &Path) -> Result<Vec<String>, StockStreamError> {
    let origin = path.display().to_string();
    let bytes = std::fs::read(path)
        .map_err(|e| StockStreamError::SymbolList(format!("{}: {}", origin, e)))?;
    let symbols = symbols_from_json(&bytes, &origin)?;
    tracing::info!(count = symbols.len(), path = %origin, "Loaded symbols");
    Ok(symbols)
}

/// Stored configuration first, local file second.
pub fn load_symbols(
    store: &dyn ObjectStore,
    key: &str,
    fallback: &Path,
) -> Result<Vec<String>, StockStreamError> {
    match load_symbols_from_store(store, key) {
        Ok(symbols) => Ok(symbols),
        Err(e) => {
            tracing::warn!("Failed to load symbols from store: {}, trying local file", e);
            load_symbols_from_file(fallback)
        }
    }
}

/// Fetch one batch of symbols for `date` and store the observations.
///
/// Returns `Partial` when some symbols failed. Rate-limit exhaustion, a
/// batch with no observations, and storage failures are errors.
pub async fn run_ingest<S: PriceSource>(
    fetcher: &mut Fetcher<S>,
    store: &RawDataStore,
    symbols: &[String],
    date: NaiveDate,
    batch_number: Option<u32>,
) -> Result<IngestReport, StockStreamError> {
    let start = Instant::now();
    tracing::info!(symbols = symbols.len(), date = %date, ?batch_number, "Ingest started");

    let batch = fetcher.fetch_multiple_symbols(symbols, Some(date)).await?;
    let key = store.upload_observations(&batch.observations, date, batch_number)?;

    let stats = batch.stats;
    let status = if stats.symbols_failed > 0 {
        IngestStatus::Partial
    } else {
        IngestStatus::Success
    };
    let report = IngestReport {
        status,
        date,
        batch_number,
        symbols_processed: stats.total(),
        symbols_fetched: stats.symbols_fetched,
        symbols_failed: stats.symbols_failed,
        validation_findings: batch.validation.len(),
        key,
        execution_time: start.elapsed().as_secs_f64(),
    };

    tracing::info!(
        status = ?report.status,
        fetched = report.symbols_fetched,
        failed = report.symbols_failed,
        key = %report.key,
        "Ingest completed"
    );
    Ok(report)
}

/// Download the directory, archive it, and partition the latest archive.
pub async fn run_symbol_refresh<D: DirectorySource>(
    source: &D,
    archive: &SymbolArchive,
    date: NaiveDate,
    batch_size: usize,
) -> Result<RefreshReport, StockStreamError> {
    let start = Instant::now();

    tracing::info!("Step 1: downloading directory CSV");
    let csv = source.download_csv().await?;
    let companies = parse_directory_csv(&csv)?;
    tracing::info!(count = companies.len(), "Downloaded and parsed directory");

    tracing::info!("Step 2: publishing archive");
    let key = archive.publish(&csv, date)?;

    tracing::info!("Step 3: reading latest archive");
    let latest = archive.latest_companies()?;
    let symbols: Vec<String> = latest.into_iter().map(|c| c.symbol).collect();

    tracing::info!("Step 4: splitting into batches");
    let batches = split_into_batches(&symbols, batch_size)?;

    let report = RefreshReport {
        date,
        key,
        total_symbols: symbols.len(),
        num_batches: batches.len(),
        batch_size,
        symbols,
        batches,
        execution_time: start.elapsed().as_secs_f64(),
    };
    tracing::info!(
        total_symbols = report.total_symbols,
        num_batches = report.num_batches,
        "Symbol refresh completed"
    );
    Ok(report)
}
