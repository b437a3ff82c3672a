//! Static partitioning of the symbol universe into fetch batches.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// One partition of symbols, processed by its own fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolBatch {
    pub symbols: Vec<String>,
    pub batch_number: u32,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BatchingError {
    #[error("Batch size must be at least 1")]
    ZeroBatchSize,
}

/// Split symbols into consecutive batches of `batch_size`, numbered from 0.
///
/// Order is preserved; only the last batch may be short.
pub fn split_into_batches<S: AsRef<str>>(
    symbols: &[S],
    batch_size: usize,
) -> Result<Vec<SymbolBatch>, BatchingError> {
    if batch_size == 0 {
        return Err(BatchingError::ZeroBatchSize);
    }

    let batches: Vec<SymbolBatch> = symbols
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| SymbolBatch {
            symbols: chunk.iter().map(|s| s.as_ref().to_string()).collect(),
            batch_number: i as u32,
        })
        .collect();

    tracing::info!(
        total_symbols = symbols.len(),
        num_batches = batches.len(),
        batch_size,
        "Split symbols into batches"
    );
    Ok(batches)
}
