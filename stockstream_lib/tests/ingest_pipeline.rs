use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use stockstream_lib::storage::{MemoryObjectStore, ObjectMetadata, ObjectStore};
use stockstream_lib::{
    load_symbols, run_ingest, DailyBar, FetchConfig, Fetcher, IngestStatus, PriceSource,
    RawDataStore, SourceError, StockStreamError,
};

type Reply = Result<Vec<DailyBar>, SourceError>;

/// Answers every request for a symbol with the same reply; unknown symbols
/// have no data.
#[derive(Default)]
struct FixedSource {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<(String, Option<NaiveDate>)>>,
}

impl FixedSource {
    fn with(mut self, symbol: &str, reply: Reply) -> Self {
        self.replies.insert(symbol.to_string(), reply);
        self
    }

    fn call_count(&self, symbol: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == symbol)
            .count()
    }
}

impl PriceSource for FixedSource {
    fn fetch_daily(
        &self,
        symbol: &str,
        date: Option<NaiveDate>,
    ) -> impl Future<Output = Reply> + Send {
        self.calls.lock().unwrap().push((symbol.to_string(), date));
        let reply = self.replies.get(symbol).cloned().unwrap_or(Ok(vec![]));
        async move { reply }
    }
}

fn trading_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 24).unwrap()
}

fn bar(open: f64, close: f64) -> DailyBar {
    DailyBar {
        date: trading_day(),
        open,
        high: open.max(close) + 1.0,
        low: open.min(close) - 1.0,
        close,
        volume: 250_000,
        adjusted_close: close,
    }
}

fn fast_config() -> FetchConfig {
    FetchConfig {
        rate_limit_delay: Duration::from_millis(10),
        max_retries: 3,
        retry_delay: Duration::from_secs(1),
        request_timeout: Duration::from_secs(30),
        max_backoff: None,
    }
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn partial_batch_is_stored_and_reported() {
    let source = FixedSource::default()
        .with("BHP", Ok(vec![bar(45.0, 45.5)]))
        .with("CBA", Ok(vec![bar(120.0, 121.0)]));
    let mut fetcher = Fetcher::new(source, fast_config());
    let store = Arc::new(MemoryObjectStore::new());
    let raw = RawDataStore::new(store.clone(), "raw-data");

    let report = run_ingest(
        &mut fetcher,
        &raw,
        &symbols(&["BHP", "CBA", "XYZ"]),
        trading_day(),
        Some(2),
    )
    .await
    .unwrap();

    assert_eq!(report.status, IngestStatus::Partial);
    assert_eq!(report.symbols_processed, 3);
    assert_eq!(report.symbols_fetched, 2);
    assert_eq!(report.symbols_failed, 1);
    assert_eq!(report.validation_findings, 0);
    assert_eq!(report.key, "raw-data/2024-12-24-batch-2.parquet");

    let frame = raw.download_frame(&report.key).unwrap();
    assert_eq!(frame.len(), 2);
    let stored: Vec<&str> = frame.rows().iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(stored, vec!["BHP", "CBA"]);

    // Every request carried the ingest date.
    let calls = fetcher.source().calls.lock().unwrap().clone();
    assert!(calls.iter().all(|(_, d)| *d == Some(trading_day())));
}

#[tokio::test(start_paused = true)]
async fn clean_batch_reports_success() {
    let source = FixedSource::default().with("NAB", Ok(vec![bar(30.0, 30.2)]));
    let mut fetcher = Fetcher::new(source, fast_config());
    let raw = RawDataStore::new(Arc::new(MemoryObjectStore::new()), "raw-data/");

    let report = run_ingest(&mut fetcher, &raw, &symbols(&["NAB"]), trading_day(), None)
        .await
        .unwrap();

    assert_eq!(report.status, IngestStatus::Success);
    assert_eq!(report.key, "raw-data/2024-12-24.parquet");
    assert!(raw.exists(&report.key));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "success");
    assert!(json.get("batch_number").is_none());
}

#[tokio::test(start_paused = true)]
async fn suspicious_rows_are_stored_with_findings() {
    let source = FixedSource::default().with("WES", Ok(vec![bar(10.0, 20.0)]));
    let mut fetcher = Fetcher::new(source, fast_config());
    let raw = RawDataStore::new(Arc::new(MemoryObjectStore::new()), "raw-data/");

    let report = run_ingest(&mut fetcher, &raw, &symbols(&["WES"]), trading_day(), None)
        .await
        .unwrap();

    assert_eq!(report.status, IngestStatus::Success);
    assert_eq!(report.validation_findings, 1);
    assert!(raw.exists(&report.key));
}

#[tokio::test(start_paused = true)]
async fn rate_limit_exhaustion_stores_nothing() {
    let source = FixedSource::default()
        .with("BHP", Ok(vec![bar(45.0, 45.5)]))
        .with("CBA", Err(SourceError::RateLimited));
    let mut fetcher = Fetcher::new(source, fast_config());
    let store = Arc::new(MemoryObjectStore::new());
    let raw = RawDataStore::new(store.clone(), "raw-data/");

    let err = run_ingest(
        &mut fetcher,
        &raw,
        &symbols(&["BHP", "CBA", "NAB"]),
        trading_day(),
        None,
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), "RateLimitError");
    assert!(store.is_empty());
    assert_eq!(fetcher.source().call_count("CBA"), 3);
    assert_eq!(fetcher.source().call_count("NAB"), 0);
}

#[tokio::test(start_paused = true)]
async fn nothing_fetched_is_a_data_error() {
    let mut fetcher = Fetcher::new(FixedSource::default(), fast_config());
    let store = Arc::new(MemoryObjectStore::new());
    let raw = RawDataStore::new(store.clone(), "raw-data/");

    let err = run_ingest(
        &mut fetcher,
        &raw,
        &symbols(&["AAA", "BBB"]),
        trading_day(),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StockStreamError::Fetch(_)));
    assert_eq!(err.kind(), "DataFetchError");
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn symbols_from_stored_config_drive_the_ingest() {
    let store = Arc::new(MemoryObjectStore::new());
    store
        .put(
            "config/symbols.json",
            br#"{"symbols": ["BHP", "CBA"]}"#,
            &ObjectMetadata::new(),
        )
        .unwrap();
    let list = load_symbols(
        store.as_ref(),
        "config/symbols.json",
        std::path::Path::new("config/symbols.json"),
    )
    .unwrap();

    let source = FixedSource::default()
        .with("BHP", Ok(vec![bar(45.0, 45.5)]))
        .with("CBA", Ok(vec![bar(120.0, 121.0)]));
    let mut fetcher = Fetcher::new(source, fast_config());
    let raw = RawDataStore::new(store.clone(), "raw-data/");

    let report = run_ingest(&mut fetcher, &raw, &list, trading_day(), None)
        .await
        .unwrap();

    assert_eq!(report.symbols_fetched, 2);
    assert_eq!(raw.latest().unwrap().unwrap().key, report.key);
}
