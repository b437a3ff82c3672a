//! Library layer for StockStream: validation, rate-limited fetching, and storage.
//!
//! Wraps the `stockstream_source` price sources with a retrying fetcher,
//! validates every batch before it is stored as Parquet, and maintains the
//! symbol universe from the exchange directory.

pub mod batching;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod pipeline;
pub mod storage;
pub mod symbols;
pub mod validation;

pub use stockstream_source;
pub use stockstream_source::{DailyBar, PriceSource, SourceError, YahooSource};

pub use batching::{split_into_batches, BatchingError, SymbolBatch, DEFAULT_BATCH_SIZE};
pub use config::{Config, ConfigError, LogFormat};
pub use error::StockStreamError;
pub use fetcher::{BatchResult, FetchConfig, FetchError, FetchStats, Fetcher};
pub use model::{Observation, ObservationFrame, OhlcvRow, RowKey};
pub use pipeline::{
    load_symbols, load_symbols_from_file, load_symbols_from_store, run_ingest,
    run_symbol_refresh, IngestReport, IngestStatus, RefreshReport,
};
pub use storage::{
    LocalObjectStore, MemoryObjectStore, ObjectStore, ParquetCodec, RawDataStore, SharedStore,
    StorageError,
};
pub use symbols::{
    DirectoryClient, DirectorySource, ListedCompany, SampleDirectory, SymbolArchive, SymbolsError,
};
pub use validation::{
    validate_batch, validate_date, validate_observation, validate_symbol, Severity,
    ValidationError, ValidationReport, ValidationThresholds,
};
