//! Domain records flowing between the fetcher, the validator and storage.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stockstream_source::DailyBar;

/// Columns every persisted batch must carry.
pub const REQUIRED_COLUMNS: &[&str] = &["symbol", "date", "open", "high", "low", "close", "volume"];

/// Every column an observation frame can carry, in storage order.
pub const ALL_COLUMNS: &[&str] = &[
    "symbol",
    "date",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "adjusted_close",
];

/// One OHLCV observation for a symbol on a trading day.
///
/// Built once from the first bar of a source response and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjusted_close: f64,
}

impl Observation {
    pub fn from_bar(symbol: &str, bar: &DailyBar) -> Self {
        Self {
            symbol: symbol.to_string(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            adjusted_close: bar.adjusted_close,
        }
    }

    pub fn key(&self) -> RowKey {
        RowKey {
            symbol: self.symbol.clone(),
            date: Some(self.date),
        }
    }

    pub fn to_row(&self) -> OhlcvRow {
        OhlcvRow {
            symbol: self.symbol.clone(),
            date: Some(self.date),
            open: Some(self.open),
            high: Some(self.high),
            low: Some(self.low),
            close: Some(self.close),
            volume: Some(self.volume as f64),
            adjusted_close: Some(self.adjusted_close),
        }
    }
}

/// Identity of a row within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub symbol: String,
    pub date: Option<NaiveDate>,
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = if self.symbol.is_empty() {
            "unknown"
        } else {
            self.symbol.as_str()
        };
        match self.date {
            Some(date) => write!(f, "{} {}", symbol, date),
            None => write!(f, "{} unknown", symbol),
        }
    }
}

/// Loosely typed view of an observation, as the validator sees it.
///
/// Numeric fields are optional so rows read back from storage can report
/// missing values, and floating point so non-finite values survive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRow {
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub adjusted_close: Option<f64>,
}

impl OhlcvRow {
    pub fn key(&self) -> RowKey {
        RowKey {
            symbol: self.symbol.clone(),
            date: self.date,
        }
    }

    /// Look up a numeric field by column name.
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "open" => self.open,
            "high" => self.high,
            "low" => self.low,
            "close" => self.close,
            "volume" => self.volume,
            "adjusted_close" => self.adjusted_close,
            _ => None,
        }
    }
}

impl From<&Observation> for OhlcvRow {
    fn from(obs: &Observation) -> Self {
        obs.to_row()
    }
}

/// A batch of rows plus the columns that were actually present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationFrame {
    columns: BTreeSet<String>,
    rows: Vec<OhlcvRow>,
}

impl ObservationFrame {
    pub fn new<I, S>(columns: I, rows: Vec<OhlcvRow>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        }
    }

    /// A frame carrying every column, built from typed observations.
    pub fn from_observations(observations: &[Observation]) -> Self {
        Self::new(
            ALL_COLUMNS.iter().copied(),
            observations.iter().map(OhlcvRow::from).collect(),
        )
    }

    pub fn rows(&self) -> &[OhlcvRow] {
        &self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Required columns absent from this frame, in `REQUIRED_COLUMNS` order.
    pub fn missing_columns(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !self.has_column(c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
