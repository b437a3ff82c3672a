//! Error types for symbol directory operations.

use reqwest::StatusCode;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum SymbolsError {
    #[error("Network error")]
    Network(#[from] reqwest::Error),
    #[error("Unexpected status {status} from {url}")]
    HttpStatus { url: String, status: StatusCode },
    #[error("Could not find CSV download link on directory page")]
    MissingDownloadLink,
    #[error("Could not extract CSV download URL from link (onclick={onclick:?}, href={href:?})")]
    UnusableDownloadLink { onclick: String, href: String },
    #[error("Failed to parse directory CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("No companies found in directory CSV")]
    NoCompanies { preview: String },
    #[error("No symbol archives found under {prefix}")]
    NoArchive { prefix: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
