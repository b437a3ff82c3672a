//! Dated copies of the directory CSV in the object store.

use chrono::{NaiveDate, Utc};

use super::error::SymbolsError;
use super::parse::{parse_directory_csv, ListedCompany};
use crate::storage::raw::normalize_prefix;
use crate::storage::{ObjectMetadata, SharedStore};

pub const DEFAULT_SYMBOLS_PREFIX: &str = "symbols/";

#[derive(Clone)]
pub struct SymbolArchive {
    store: SharedStore,
    prefix: String,
}

impl SymbolArchive {
    pub fn new(store: SharedStore, prefix: &str) -> Self {
        Self {
            store,
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn archive_key(&self, date: NaiveDate) -> String {
        format!("{}{}-symbols.csv", self.prefix, date)
    }

    /// Store the raw CSV under the day's key, replacing an earlier copy.
    pub fn publish(&self, csv_content: &str, date: NaiveDate) -> Result<String, SymbolsError> {
        let key = self.archive_key(date);

        let mut metadata = ObjectMetadata::new();
        metadata.insert("content-type".to_string(), "text/csv".to_string());
        metadata.insert("source".to_string(), "directory".to_string());
        metadata.insert("upload-date".to_string(), date.to_string());
        metadata.insert("upload-timestamp".to_string(), Utc::now().to_rfc3339());

        tracing::info!(key = %key, bytes = csv_content.len(), "Publishing symbol archive");
        self.store.put(&key, csv_content.as_bytes(), &metadata)?;
        Ok(key)
    }

    /// Key of the most recently modified archive.
    pub fn latest_key(&self) -> Result<String, SymbolsError> {
        self.store
            .latest(&self.prefix)?
            .map(|info| info.key)
            .ok_or_else(|| SymbolsError::NoArchive {
                prefix: self.prefix.clone(),
            })
    }

    /// Companies listed in the most recently modified archive.
    pub fn latest_companies(&self) -> Result<Vec<ListedCompany>, SymbolsError> {
        let key = self.latest_key()?;
        tracing::info!(key = %key, "Reading latest symbol archive");
        let bytes = self.store.get(&key)?;
        parse_directory_csv(&String::from_utf8_lossy(&bytes))
    }
}
