//! Durable storage for observation batches and symbol archives.
//!
//! Objects live in an [`ObjectStore`] under string keys. Observation batches
//! are Parquet files keyed by trade date (and batch number when the symbol
//! universe is partitioned); re-running a day overwrites the same key.

pub mod error;
pub mod object_store;
pub mod parquet;
pub mod raw;

pub use error::StorageError;
pub use object_store::{
    LocalObjectStore, MemoryObjectStore, ObjectInfo, ObjectMetadata, ObjectStore, SharedStore,
};
pub use parquet::ParquetCodec;
pub use raw::RawDataStore;
