//! Error types for storage operations.

use thiserror::Error;

/// Errors from object store and Parquet codec operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot upload an empty batch")]
    EmptyBatch,
    #[error("Object not found: {key}")]
    NotFound { key: String },
    #[error("Invalid object key: {key}")]
    InvalidKey { key: String },
    #[error("I/O error on {key}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parquet codec error: {0}")]
    Codec(String),
    #[error("Invalid object metadata for {key}: {message}")]
    Metadata { key: String, message: String },
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}
