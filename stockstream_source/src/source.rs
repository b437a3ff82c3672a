use std::future::Future;

use chrono::NaiveDate;

use crate::{DailyBar, SourceError};

/// A remote source of daily price bars.
///
/// Given a symbol and an optional trading date, an implementation returns
/// zero or more bars (an empty vector means the source had no data) or a
/// `SourceError` on transport or application failure. When `date` is
/// `None` the most recent trading day is requested.
pub trait PriceSource {
    fn fetch_daily(
        &self,
        symbol: &str,
        date: Option<NaiveDate>,
    ) -> impl Future<Output = Result<Vec<DailyBar>, SourceError>> + Send;
}
