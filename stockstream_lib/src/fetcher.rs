//! Rate-limited fetch-with-retry over a [`PriceSource`].
//!
//! A `Fetcher` owns its counters and is driven through `&mut self`; run one
//! per partition for parallelism. The only suspension points are the source
//! call (bounded by `request_timeout`) and the pacing/backoff sleeps.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use stockstream_source::{PriceSource, SourceError};
use tokio::time::sleep;

use crate::model::{Observation, ObservationFrame};
use crate::validation::{
    validate_batch_with, validate_symbol, ValidationError, ValidationReport, ValidationThresholds,
};

/// Findings logged per batch; the rest stay in the report.
const LOGGED_FINDINGS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Pause between consecutive symbols in a batch.
    pub rate_limit_delay: Duration,
    /// Total attempts per symbol (including the first).
    pub max_retries: u32,
    /// Base of the exponential backoff: attempt `n` waits `retry_delay * 2^n`.
    pub retry_delay: Duration,
    /// Upper bound on a single source request.
    pub request_timeout: Duration,
    /// Optional cap on a single backoff sleep.
    pub max_backoff: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay: Duration::from_secs(2),
            max_retries: 5,
            retry_delay: Duration::from_secs(60),
            request_timeout: Duration::from_secs(900),
            max_backoff: None,
        }
    }
}

impl FetchConfig {
    /// Backoff before retrying after the given zero-based attempt.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        // Past u32 the multiplier alone overflows; treat as unbounded.
        let delay = 2u32
            .checked_pow(attempt)
            .map_or(Duration::MAX, |multiplier| self.retry_delay.saturating_mul(multiplier));
        match self.max_backoff {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Per-fetcher outcome counters. Monotonic for the fetcher's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub symbols_fetched: u64,
    pub symbols_failed: u64,
}

impl FetchStats {
    pub fn total(&self) -> u64 {
        self.symbols_fetched + self.symbols_failed
    }
}

/// Attempts made and backoff slept by the most recent single-symbol fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    pub attempts: u32,
    pub total_backoff: Duration,
}

/// Result of one source attempt for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Observation),
    NoData,
    Failed(SourceError),
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Invalid symbol {symbol}: {source}")]
    InvalidSymbol {
        symbol: String,
        #[source]
        source: ValidationError,
    },
    #[error("Rate limit exceeded for {symbol} after {attempts} attempts")]
    RateLimitExceeded { symbol: String, attempts: u32 },
    #[error("No data fetched for any of {symbols_attempted} symbols")]
    NoData { symbols_attempted: usize },
}

/// Successful observations of one batch, in input order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub observations: Vec<Observation>,
    /// Counter snapshot taken when the batch finished.
    pub stats: FetchStats,
    /// Advisory findings over `observations`.
    pub validation: ValidationReport,
}

impl BatchResult {
    pub fn frame(&self) -> ObservationFrame {
        ObservationFrame::from_observations(&self.observations)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

pub struct Fetcher<S> {
    source: S,
    config: FetchConfig,
    thresholds: ValidationThresholds,
    stats: FetchStats,
    last_retry: Option<RetryState>,
}

impl<S: PriceSource> Fetcher<S> {
    pub fn new(source: S, config: FetchConfig) -> Self {
        Self {
            source,
            config,
            thresholds: ValidationThresholds::default(),
            stats: FetchStats::default(),
            last_retry: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: ValidationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    pub fn last_retry_state(&self) -> Option<RetryState> {
        self.last_retry
    }

    async fn attempt(&self, symbol: &str, date: Option<NaiveDate>) -> FetchOutcome {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.source.fetch_daily(symbol, date)).await {
            Err(_) => FetchOutcome::Failed(SourceError::Timeout(timeout)),
            Ok(Err(err)) => FetchOutcome::Failed(err),
            Ok(Ok(bars)) => match bars.first() {
                Some(bar) => FetchOutcome::Success(Observation::from_bar(symbol, bar)),
                None => FetchOutcome::NoData,
            },
        }
    }

    /// Fetch one symbol with retry and exponential backoff.
    ///
    /// Returns `Ok(None)` when the source has no data or every attempt failed
    /// with a non-rate-limit error. Rate-limit exhaustion is an error so
    /// callers can stop the whole batch.
    pub async fn fetch_single_symbol(
        &mut self,
        symbol: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<Observation>, FetchError> {
        validate_symbol(symbol).map_err(|source| FetchError::InvalidSymbol {
            symbol: symbol.to_string(),
            source,
        })?;

        let attempts = self.config.attempts();
        let mut retry = RetryState::default();

        let result = 'attempts: {
            for attempt in 0..attempts {
                retry.attempts = attempt + 1;
                let last = attempt + 1 == attempts;

                match self.attempt(symbol, date).await {
                    FetchOutcome::Success(obs) => {
                        self.stats.symbols_fetched += 1;
                        tracing::info!(symbol, date = %obs.date, "Fetched observation");
                        break 'attempts Ok(Some(obs));
                    }
                    FetchOutcome::NoData => {
                        self.stats.symbols_failed += 1;
                        tracing::warn!(symbol, "No data returned");
                        break 'attempts Ok(None);
                    }
                    FetchOutcome::Failed(err) if last => {
                        self.stats.symbols_failed += 1;
                        if err.is_rate_limited() {
                            tracing::error!(symbol, attempts, "Rate limit exceeded, giving up");
                            break 'attempts Err(FetchError::RateLimitExceeded {
                                symbol: symbol.to_string(),
                                attempts,
                            });
                        }
                        tracing::error!(symbol, attempts, "Fetch failed: {}", err);
                        break 'attempts Ok(None);
                    }
                    FetchOutcome::Failed(err) => {
                        let delay = self.config.backoff_for(attempt);
                        if err.is_rate_limited() {
                            tracing::warn!(
                                symbol,
                                attempt = attempt + 1,
                                delay_secs = delay.as_secs_f64(),
                                "Rate limited, backing off"
                            );
                        } else {
                            tracing::warn!(
                                symbol,
                                attempt = attempt + 1,
                                delay_secs = delay.as_secs_f64(),
                                "Fetch attempt failed: {}",
                                err
                            );
                        }
                        retry.total_backoff += delay;
                        sleep(delay).await;
                    }
                }
            }
            Ok(None)
        };

        self.last_retry = Some(retry);
        result
    }

    /// Fetch symbols strictly in order, pausing `rate_limit_delay` between them.
    ///
    /// Malformed symbols are counted as failed and skipped. Rate-limit
    /// exhaustion aborts the batch. The batch is validated before it is
    /// returned; findings are advisory.
    pub async fn fetch_multiple_symbols<T: AsRef<str>>(
        &mut self,
        symbols: &[T],
        date: Option<NaiveDate>,
    ) -> Result<BatchResult, FetchError> {
        tracing::info!(count = symbols.len(), "Fetching batch");
        let mut observations = Vec::new();

        for (i, symbol) in symbols.iter().enumerate() {
            let symbol = symbol.as_ref();
            match self.fetch_single_symbol(symbol, date).await {
                Ok(Some(obs)) => observations.push(obs),
                Ok(None) => {}
                Err(FetchError::InvalidSymbol { symbol, source }) => {
                    self.stats.symbols_failed += 1;
                    tracing::warn!(symbol = %symbol, "Skipping symbol: {}", source);
                }
                Err(err) => return Err(err),
            }

            if i + 1 < symbols.len() {
                sleep(self.config.rate_limit_delay).await;
            }
        }

        if observations.is_empty() {
            tracing::error!(count = symbols.len(), "No data fetched for any symbol");
            return Err(FetchError::NoData {
                symbols_attempted: symbols.len(),
            });
        }

        let frame = ObservationFrame::from_observations(&observations);
        let validation = validate_batch_with(&frame, &self.thresholds);
        if !validation.is_clean() {
            tracing::warn!(
                findings = validation.len(),
                "Data quality findings in batch"
            );
            for finding in validation.findings().iter().take(LOGGED_FINDINGS) {
                tracing::warn!("  {}", finding);
            }
        }

        tracing::info!(
            fetched = observations.len(),
            failed = self.stats.symbols_failed,
            "Batch complete"
        );

        Ok(BatchResult {
            observations,
            stats: self.stats,
            validation,
        })
    }
}
