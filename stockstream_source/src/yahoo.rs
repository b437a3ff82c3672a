//! Yahoo Finance adapter for the `PriceSource` contract.
//!
//! `yahoo_finance_api` reports failures as opaque errors, so rate limiting is
//! recognized from the error text here and nowhere else.

use std::future::Future;

use chrono::{Days, NaiveDate};
use time::OffsetDateTime;
use yahoo_finance_api::Quote;

use crate::{DailyBar, PriceSource, SourceError};

/// Convert chrono::NaiveDate to time::OffsetDateTime at UTC midnight.
pub fn date_to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, SourceError> {
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| SourceError::ParseFailed(format!("invalid date {}", date)))?;

    OffsetDateTime::from_unix_timestamp(datetime.and_utc().timestamp())
        .map_err(|_| SourceError::ParseFailed(format!("invalid date {}", date)))
}

/// Trading date of a quote in the exchange's local time.
///
/// Yahoo stamps daily bars at the session open, so for exchanges east of UTC
/// the UTC date can be the previous calendar day.
fn exchange_local_date(timestamp: i64, gmtoffset: i32) -> Result<NaiveDate, SourceError> {
    timestamp
        .checked_add(i64::from(gmtoffset))
        .and_then(|local| chrono::DateTime::from_timestamp(local, 0))
        .map(|dt| dt.date_naive())
        .ok_or_else(|| SourceError::ParseFailed(format!("invalid quote timestamp {}", timestamp)))
}

/// Turn raw quotes into bars dated in exchange-local time.
///
/// With a date, only that day's bars are kept. Without one, only the most
/// recent bar is kept.
fn select_bars(
    quotes: &[Quote],
    gmtoffset: i32,
    date: Option<NaiveDate>,
) -> Result<Vec<DailyBar>, SourceError> {
    let mut bars = Vec::with_capacity(quotes.len());
    for q in quotes {
        bars.push(DailyBar {
            date: exchange_local_date(q.timestamp, gmtoffset)?,
            open: q.open,
            high: q.high,
            low: q.low,
            close: q.close,
            volume: q.volume,
            adjusted_close: q.adjclose,
        });
    }

    match date {
        Some(day) => bars.retain(|bar| bar.date == day),
        None => {
            if let Some(last) = bars.pop() {
                bars = vec![last];
            }
        }
    }
    Ok(bars)
}

/// Messages the upstream uses for "the request worked but there is nothing there".
fn is_empty_result(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("empty data") || lower.contains("no quotes") || lower.contains("no result")
}

/// Yahoo Finance daily bars.
pub struct YahooSource {
    connector: yahoo_finance_api::YahooConnector,
    /// Appended to every symbol, e.g. `.AX` for ASX listings.
    exchange_suffix: String,
}

impl YahooSource {
    /// Create a source that queries symbols as given.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_exchange_suffix("")
    }

    /// Create a source that appends `suffix` to every symbol before querying.
    pub fn with_exchange_suffix(suffix: &str) -> Result<Self, SourceError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| SourceError::Upstream(e.to_string()))?;
        Ok(Self {
            connector,
            exchange_suffix: suffix.to_string(),
        })
    }

    /// The ticker string sent upstream for `symbol`.
    pub fn upstream_ticker(&self, symbol: &str) -> String {
        format!("{}{}", symbol, self.exchange_suffix)
    }

    async fn fetch(&self, symbol: &str, date: Option<NaiveDate>) -> Result<Vec<DailyBar>, SourceError> {
        let ticker = self.upstream_ticker(symbol);
        let response = match date {
            Some(day) => {
                // One extra day each side covers any exchange offset; bars
                // are filtered back to `day` by local date.
                let invalid = || SourceError::ParseFailed(format!("invalid date {}", day));
                let first = day.checked_sub_days(Days::new(1)).ok_or_else(invalid)?;
                let last = day.checked_add_days(Days::new(2)).ok_or_else(invalid)?;
                let start = date_to_offset_datetime(first)?;
                let end = date_to_offset_datetime(last)?;
                self.connector.get_quote_history(&ticker, start, end).await
            }
            None => self.connector.get_quote_range(&ticker, "1d", "5d").await,
        };

        let response = match response {
            Ok(resp) => resp,
            Err(e) => {
                let message = e.to_string();
                if is_empty_result(&message) {
                    return Ok(Vec::new());
                }
                tracing::debug!("Yahoo request for {} failed: {}", ticker, message);
                return Err(SourceError::from_upstream_message(message));
            }
        };

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) => {
                let message = e.to_string();
                if is_empty_result(&message) {
                    return Ok(Vec::new());
                }
                return Err(SourceError::ParseFailed(message));
            }
        };

        let gmtoffset = response
            .metadata()
            .map_err(|e| SourceError::ParseFailed(e.to_string()))?
            .gmtoffset;

        select_bars(&quotes, gmtoffset, date)
    }
}

impl PriceSource for YahooSource {
    fn fetch_daily(
        &self,
        symbol: &str,
        date: Option<NaiveDate>,
    ) -> impl Future<Output = Result<Vec<DailyBar>, SourceError>> + Send {
        self.fetch(symbol, date)
    }
}
