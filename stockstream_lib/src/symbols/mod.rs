//! Symbol universe discovery: the exchange's listed-companies directory.
//!
//! The directory is published as a CSV file. `DirectoryClient` downloads it
//! (falling back to scraping the directory page for the link), `parse`
//! turns it into companies, and `SymbolArchive` keeps dated copies in the
//! object store.

pub mod archive;
pub mod client;
pub mod error;
pub mod parse;

use std::future::Future;

pub use archive::SymbolArchive;
pub use client::DirectoryClient;
pub use error::SymbolsError;
pub use parse::{extract_csv_download_url, parse_directory_csv, sample_directory_csv, ListedCompany};

/// Anything that can produce the raw directory CSV.
pub trait DirectorySource {
    fn download_csv(&self) -> impl Future<Output = Result<String, SymbolsError>> + Send;
}

/// Serves the built-in sample listing, for offline runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleDirectory;

impl DirectorySource for SampleDirectory {
    fn download_csv(&self) -> impl Future<Output = Result<String, SymbolsError>> + Send {
        tracing::info!("Using built-in sample directory listing");
        async { Ok(sample_directory_csv().to_string()) }
    }
}
