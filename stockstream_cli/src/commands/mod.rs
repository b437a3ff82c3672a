//! CLI subcommand implementations.

pub mod fetch;
pub mod split;
pub mod update_symbols;
pub mod validate;

use chrono::{NaiveDate, Utc};
use stockstream_lib::{validate_date, StockStreamError};

/// Validated `--date`, or today (UTC) when absent.
pub(crate) fn resolve_date(date: Option<&str>) -> Result<NaiveDate, StockStreamError> {
    match date {
        Some(raw) => Ok(validate_date(raw)?),
        None => Ok(Utc::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_date_is_validated() {
        assert_eq!(
            resolve_date(Some("2024-12-24")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 24).unwrap()
        );
        assert!(resolve_date(Some("24/12/2024")).is_err());
        assert_eq!(resolve_date(Some("1989-12-31")).unwrap_err().kind(), "ValidationError");
    }
}
