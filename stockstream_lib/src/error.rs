//! Error types for the library layer.

use std::fmt;

use stockstream_source::SourceError;

use crate::batching::BatchingError;
use crate::config::ConfigError;
use crate::fetcher::FetchError;
use crate::storage::StorageError;
use crate::symbols::SymbolsError;
use crate::validation::ValidationError;

/// Errors surfaced by the pipelines, wrapping each component's error.
#[derive(Debug)]
pub enum StockStreamError {
    /// Configuration is missing or malformed.
    Config(ConfigError),
    /// A symbol or date input failed format validation.
    Validation(ValidationError),
    /// Fetching failed as a whole (rate limit exhausted or no data at all).
    Fetch(FetchError),
    /// The price source could not be set up.
    Source(SourceError),
    Storage(StorageError),
    Symbols(SymbolsError),
    Batching(BatchingError),
    /// No usable symbol list could be loaded.
    SymbolList(String),
}

impl StockStreamError {
    /// Short machine-readable name of the failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigurationError",
            Self::Validation(_) => "ValidationError",
            Self::Fetch(FetchError::RateLimitExceeded { .. }) => "RateLimitError",
            Self::Fetch(_) => "DataFetchError",
            Self::Source(_) => "DataFetchError",
            Self::Storage(_) => "StorageError",
            Self::Symbols(_) => "SymbolDirectoryError",
            Self::Batching(_) => "BatchingError",
            Self::SymbolList(_) => "ConfigurationError",
        }
    }
}

impl fmt::Display for StockStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::Fetch(e) => write!(f, "Fetch error: {}", e),
            Self::Source(e) => write!(f, "Price source error: {}", e),
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Symbols(e) => write!(f, "Symbol directory error: {}", e),
            Self::Batching(e) => write!(f, "Batching error: {}", e),
            Self::SymbolList(msg) => write!(f, "Failed to load symbols: {}", msg),
        }
    }
}

impl std::error::Error for StockStreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Validation(e) => Some(e),
            Self::Fetch(e) => Some(e),
            Self::Source(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::Symbols(e) => Some(e),
            Self::Batching(e) => Some(e),
            Self::SymbolList(_) => None,
        }
    }
}

impl From<ConfigError> for StockStreamError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ValidationError> for StockStreamError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<FetchError> for StockStreamError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<SourceError> for StockStreamError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

impl From<StorageError> for StockStreamError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<SymbolsError> for StockStreamError {
    fn from(e: SymbolsError) -> Self {
        Self::Symbols(e)
    }
}

impl From<BatchingError> for StockStreamError {
    fn from(e: BatchingError) -> Self {
        Self::Batching(e)
    }
}
