//! Date-partitioned observation batches.

use chrono::{NaiveDate, Utc};

use super::error::StorageError;
use super::object_store::{ObjectInfo, ObjectMetadata, SharedStore};
use super::parquet::{ParquetCodec, PARQUET_CONTENT_TYPE};
use crate::model::{Observation, ObservationFrame};

pub const DEFAULT_RAW_DATA_PREFIX: &str = "raw-data/";

/// Reads and writes observation batches under one key prefix.
///
/// Keys are `{prefix}{date}.parquet`, or `{prefix}{date}-batch-{n}.parquet`
/// when the symbol universe is partitioned.
#[derive(Clone)]
pub struct RawDataStore {
    store: SharedStore,
    prefix: String,
    codec: ParquetCodec,
}

/// Normalize a prefix to exactly one trailing slash (empty stays empty).
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

impl RawDataStore {
    pub fn new(store: SharedStore, prefix: &str) -> Self {
        Self {
            store,
            prefix: normalize_prefix(prefix),
            codec: ParquetCodec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn object_key(&self, date: NaiveDate, batch_number: Option<u32>) -> String {
        match batch_number {
            Some(n) => format!("{}{}-batch-{}.parquet", self.prefix, date, n),
            None => format!("{}{}.parquet", self.prefix, date),
        }
    }

    /// Encode and store a batch, returning its key. Overwrites an existing
    /// object with the same key.
    pub fn upload_observations(
        &self,
        observations: &[Observation],
        date: NaiveDate,
        batch_number: Option<u32>,
    ) -> Result<String, StorageError> {
        if observations.is_empty() {
            return Err(StorageError::EmptyBatch);
        }

        let key = self.object_key(date, batch_number);
        tracing::info!(rows = observations.len(), date = %date, ?batch_number, "Writing batch to Parquet");
        let bytes = self.codec.encode(observations)?;

        let mut metadata = ObjectMetadata::new();
        metadata.insert("content-type".to_string(), PARQUET_CONTENT_TYPE.to_string());
        metadata.insert("date".to_string(), date.to_string());
        metadata.insert("rows".to_string(), observations.len().to_string());
        metadata.insert("uploaded-at".to_string(), Utc::now().to_rfc3339());

        self.store.put(&key, &bytes, &metadata)?;
        tracing::info!(key = %key, bytes = bytes.len(), "Uploaded batch");
        Ok(key)
    }

    pub fn download_frame(&self, key: &str) -> Result<ObservationFrame, StorageError> {
        let bytes = self.store.get(key)?;
        let frame = self.codec.decode(&bytes)?;
        tracing::info!(key, rows = frame.len(), "Downloaded batch");
        Ok(frame)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.store.exists(key)
    }

    /// Most recently written batch under this store's prefix.
    pub fn latest(&self) -> Result<Option<ObjectInfo>, StorageError> {
        self.store.latest(&self.prefix)
    }
}
