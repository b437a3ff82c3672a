//! The daily bar shape every price source returns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of prices and volume for a single symbol, as reported
/// by the upstream source. No invariants are enforced here; the bar is
/// raw input for the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjusted_close: f64,
}
