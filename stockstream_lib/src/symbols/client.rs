//! HTTP client for the listed-companies directory.

use std::time::Duration;

use stockstream_source::user_agent::get_user_agent;

use super::error::SymbolsError;
use super::parse::{extract_csv_download_url, parse_directory_csv};
use super::DirectorySource;

const SITE_ORIGIN: &str = "https://www.asx.com.au";
const CSV_API_ORIGIN: &str = "https://asx.api.markitdigital.com";
const CSV_PATH: &str = "/asx-research/1.0/companies/directory/file";
const DIRECTORY_PAGE_PATH: &str = "/markets/trade-our-cash-market/directory";

const CSV_TIMEOUT: Duration = Duration::from_secs(60);
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DirectoryClient {
    http: reqwest::Client,
    csv_url: String,
    page_url: String,
    site_origin: String,
}

impl DirectoryClient {
    pub fn new() -> Result<Self, SymbolsError> {
        Ok(Self {
            http: Self::http_client()?,
            csv_url: format!("{}{}", CSV_API_ORIGIN, CSV_PATH),
            page_url: format!("{}{}", SITE_ORIGIN, DIRECTORY_PAGE_PATH),
            site_origin: SITE_ORIGIN.to_string(),
        })
    }

    /// Point every endpoint at one origin. Used for testing.
    pub fn with_base_url(base_url: &str) -> Result<Self, SymbolsError> {
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            http: Self::http_client()?,
            csv_url: format!("{}{}", base, CSV_PATH),
            page_url: format!("{}{}", base, DIRECTORY_PAGE_PATH),
            site_origin: base.to_string(),
        })
    }

    fn http_client() -> Result<reqwest::Client, SymbolsError> {
        Ok(reqwest::Client::builder()
            .user_agent(get_user_agent())
            .build()?)
    }

    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, SymbolsError> {
        let resp = self.http.get(url).timeout(timeout).send().await?;

        if !resp.status().is_success() {
            return Err(SymbolsError::HttpStatus {
                url: url.to_string(),
                status: resp.status(),
            });
        }

        Ok(resp.text().await?)
    }

    fn log_preview(content: &str) {
        match parse_directory_csv(content) {
            Ok(companies) => {
                let sample: Vec<&str> = companies.iter().take(5).map(|c| c.symbol.as_str()).collect();
                tracing::info!(total = companies.len(), ?sample, "Directory CSV downloaded");
            }
            Err(e) => tracing::warn!("Could not parse CSV for preview: {}", e),
        }
    }

    /// Download the directory CSV.
    ///
    /// Tries the direct CSV endpoint first; if that fails, loads the directory
    /// page, extracts the download link and follows it.
    pub async fn download_csv(&self) -> Result<String, SymbolsError> {
        tracing::info!(url = %self.csv_url, "Attempting direct CSV download");
        match self.fetch_text(&self.csv_url, CSV_TIMEOUT).await {
            Ok(content) => {
                Self::log_preview(&content);
                return Ok(content);
            }
            Err(e) => {
                tracing::warn!(url = %self.csv_url, "Direct CSV download failed, trying directory page: {}", e);
            }
        }

        let html = self.fetch_text(&self.page_url, PAGE_TIMEOUT).await?;
        let csv_url = extract_csv_download_url(&html, &self.site_origin)?;
        tracing::info!(url = %csv_url, "Found CSV download URL");

        let content = self.fetch_text(&csv_url, CSV_TIMEOUT).await?;
        Self::log_preview(&content);
        Ok(content)
    }
}

impl DirectorySource for DirectoryClient {
    fn download_csv(
        &self,
    ) -> impl std::future::Future<Output = Result<String, SymbolsError>> + Send {
        DirectoryClient::download_csv(self)
    }
}
