//! OHLCV data-quality checks.
//!
//! Input checks (`validate_symbol`, `validate_date`) fail with a fatal
//! [`ValidationError`]. Row and batch checks never fail: they return findings
//! for logging and diagnostics, and flagged rows are still persisted.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::model::{ObservationFrame, OhlcvRow, RowKey};

/// Relative open-to-close move above which a row is flagged as suspicious.
pub const SUSPICIOUS_CHANGE_THRESHOLD: f64 = 0.5;

/// Earliest accepted trading date, as (year, month, day).
pub const EPOCH_FLOOR: (i32, u32, u32) = (1990, 1, 1);

pub const MAX_SYMBOL_LENGTH: usize = 5;

const PRICE_FIELDS: &[&str] = &["open", "high", "low", "close"];
const NUMERIC_FIELDS: &[&str] = &["open", "high", "low", "close", "volume"];

/// How much a finding matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The input cannot be used at all (malformed symbol/date, missing columns, empty batch).
    Fatal,
    /// An OHLCV invariant does not hold. Advisory.
    Violation,
    /// Plausible but unusual data. Advisory.
    Warning,
}

/// The rule a finding reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    EmptySymbol,
    SymbolFormat,
    DateFormat,
    FutureDate,
    DateBeforeFloor,
    InvalidConfig,
    MissingColumns,
    EmptyBatch,
    DuplicateRows,
    MissingField,
    NotPositive,
    NegativeVolume,
    HighBelowLow,
    HighBelowOpen,
    HighBelowClose,
    LowAboveOpen,
    LowAboveClose,
    SuspiciousChange,
    NotFinite,
}

/// A structured validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub rule: Rule,
    pub severity: Severity,
    /// Field or column the finding is about.
    pub field: String,
    /// Observed value, rendered as text.
    pub value: String,
    pub message: String,
    /// Row the finding belongs to, for batch-level reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<RowKey>,
}

impl ValidationError {
    fn new(
        rule: Rule,
        severity: Severity,
        field: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule,
            severity,
            field: field.into(),
            value: value.to_string(),
            message: message.into(),
            row: None,
        }
    }

    fn fatal(rule: Rule, field: &str, value: impl ToString, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Fatal, field, value, message)
    }

    fn violation(rule: Rule, field: &str, value: f64, message: String) -> Self {
        Self::new(rule, Severity::Violation, field, value, message)
    }

    fn at_row(mut self, key: RowKey) -> Self {
        self.row = Some(key);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.row {
            Some(key) => write!(f, "Row {}: {}", key, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Ordered findings from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    findings: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn findings(&self) -> &[ValidationError] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.findings.iter().any(ValidationError::is_fatal)
    }

    pub fn fatal(&self) -> impl Iterator<Item = &ValidationError> {
        self.findings.iter().filter(|f| f.is_fatal())
    }

    pub fn advisory(&self) -> impl Iterator<Item = &ValidationError> {
        self.findings.iter().filter(|f| !f.is_fatal())
    }

    pub fn messages(&self) -> Vec<String> {
        self.findings.iter().map(ToString::to_string).collect()
    }
}

impl From<Vec<ValidationError>> for ValidationReport {
    fn from(findings: Vec<ValidationError>) -> Self {
        Self { findings }
    }
}

/// Business thresholds used by the checks. Defaults match the constants above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationThresholds {
    pub suspicious_change: f64,
    pub epoch_floor: NaiveDate,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        let (y, m, d) = EPOCH_FLOOR;
        Self {
            suspicious_change: SUSPICIOUS_CHANGE_THRESHOLD,
            epoch_floor: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN),
        }
    }
}

/// A date given either as a calendar date or as ISO-8601 text.
#[derive(Debug, Clone, Copy)]
pub enum DateInput<'a> {
    Date(NaiveDate),
    Text(&'a str),
}

impl From<NaiveDate> for DateInput<'_> {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for DateInput<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text.as_str())
    }
}

/// Validate ticker format: 1 to 5 characters, each `A-Z` or `0-9`.
pub fn validate_symbol(symbol: &str) -> Result<(), ValidationError> {
    if symbol.is_empty() {
        return Err(ValidationError::fatal(
            Rule::EmptySymbol,
            "symbol",
            symbol,
            "Symbol cannot be empty",
        ));
    }
    let well_formed = symbol.len() <= MAX_SYMBOL_LENGTH
        && symbol
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    if !well_formed {
        return Err(ValidationError::fatal(
            Rule::SymbolFormat,
            "symbol",
            symbol,
            format!(
                "Invalid symbol format: {}. Must be 1-{} uppercase alphanumeric characters",
                symbol, MAX_SYMBOL_LENGTH
            ),
        ));
    }
    Ok(())
}

fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Validate a date against today's UTC date and the default floor.
pub fn validate_date<'a>(value: impl Into<DateInput<'a>>) -> Result<NaiveDate, ValidationError> {
    validate_date_at(value, Utc::now().date_naive(), &ValidationThresholds::default())
}

/// Validate a date against an explicit "today".
///
/// Accepts any date in `[thresholds.epoch_floor, today]`, both ends inclusive.
pub fn validate_date_at<'a>(
    value: impl Into<DateInput<'a>>,
    today: NaiveDate,
    thresholds: &ValidationThresholds,
) -> Result<NaiveDate, ValidationError> {
    let date = match value.into() {
        DateInput::Date(date) => date,
        DateInput::Text(text) => parse_iso_date(text).ok_or_else(|| {
            ValidationError::fatal(
                Rule::DateFormat,
                "date",
                text,
                format!("Invalid date format: {}. Expected ISO format YYYY-MM-DD", text),
            )
        })?,
    };

    if date > today {
        return Err(ValidationError::fatal(
            Rule::FutureDate,
            "date",
            date,
            format!("Date cannot be in the future: {}", date),
        ));
    }
    if date < thresholds.epoch_floor {
        return Err(ValidationError::fatal(
            Rule::DateBeforeFloor,
            "date",
            date,
            format!("Date too far in the past: {}", date),
        ));
    }
    Ok(date)
}

/// Check one row with the default thresholds.
pub fn validate_observation(row: &OhlcvRow) -> Vec<ValidationError> {
    validate_observation_with(row, &ValidationThresholds::default())
}

/// Check one row against the OHLCV invariants.
///
/// Missing numeric fields short-circuit: only the missing-field findings are
/// returned. Every other check runs independently and findings accumulate.
pub fn validate_observation_with(
    row: &OhlcvRow,
    thresholds: &ValidationThresholds,
) -> Vec<ValidationError> {
    let missing: Vec<ValidationError> = NUMERIC_FIELDS
        .iter()
        .filter(|field| row.field(field).is_none())
        .map(|field| {
            ValidationError::new(
                Rule::MissingField,
                Severity::Violation,
                *field,
                "",
                format!("Missing required field: {}", field),
            )
        })
        .collect();
    if !missing.is_empty() {
        return missing;
    }

    let (Some(open), Some(high), Some(low), Some(close), Some(volume)) =
        (row.open, row.high, row.low, row.close, row.volume)
    else {
        return missing;
    };

    let mut errors = Vec::new();

    for (field, value) in PRICE_FIELDS.iter().zip([open, high, low, close]) {
        if value <= 0.0 {
            errors.push(ValidationError::violation(
                Rule::NotPositive,
                field,
                value,
                format!("{} must be positive: {}", field, value),
            ));
        }
    }

    if volume < 0.0 {
        errors.push(ValidationError::violation(
            Rule::NegativeVolume,
            "volume",
            volume,
            format!("volume must be non-negative: {}", volume),
        ));
    }

    let relations = [
        (high < low, Rule::HighBelowLow, "high", high, "low", low, ">="),
        (high < open, Rule::HighBelowOpen, "high", high, "open", open, ">="),
        (high < close, Rule::HighBelowClose, "high", high, "close", close, ">="),
        (low > open, Rule::LowAboveOpen, "low", low, "open", open, "<="),
        (low > close, Rule::LowAboveClose, "low", low, "close", close, "<="),
    ];
    for (violated, rule, field, value, other, other_value, op) in relations {
        if violated {
            errors.push(ValidationError::violation(
                rule,
                field,
                value,
                format!("{} ({}) must be {} {} ({})", field, value, op, other, other_value),
            ));
        }
    }

    if open > 0.0 {
        let change = (close - open).abs() / open;
        if change > thresholds.suspicious_change {
            errors.push(ValidationError::new(
                Rule::SuspiciousChange,
                Severity::Warning,
                "close",
                close,
                format!(
                    "Suspicious price change >{}%: open={}, close={}",
                    thresholds.suspicious_change * 100.0,
                    open,
                    close
                ),
            ));
        }
    }

    for (field, value) in NUMERIC_FIELDS.iter().zip([open, high, low, close, volume]) {
        if !value.is_finite() {
            errors.push(ValidationError::violation(
                Rule::NotFinite,
                field,
                value,
                format!("{} is not finite: {}", field, value),
            ));
        }
    }

    errors
}

/// Check a batch with the default thresholds.
pub fn validate_batch(frame: &ObservationFrame) -> ValidationReport {
    validate_batch_with(frame, &ValidationThresholds::default())
}

/// Check a whole batch.
///
/// Missing required columns or an empty batch produce a single fatal finding
/// and stop. Otherwise duplicates are reported once in aggregate, followed by
/// every row's findings tagged with the row key.
pub fn validate_batch_with(
    frame: &ObservationFrame,
    thresholds: &ValidationThresholds,
) -> ValidationReport {
    let missing = frame.missing_columns();
    if !missing.is_empty() {
        return ValidationReport::from(vec![ValidationError::fatal(
            Rule::MissingColumns,
            "columns",
            missing.join(","),
            format!("Missing required columns: {:?}", missing),
        )]);
    }

    if frame.is_empty() {
        return ValidationReport::from(vec![ValidationError::fatal(
            Rule::EmptyBatch,
            "rows",
            0,
            "Batch is empty",
        )]);
    }

    let mut findings = Vec::new();

    let duplicates = count_duplicate_rows(frame.rows());
    if duplicates > 0 {
        findings.push(ValidationError::new(
            Rule::DuplicateRows,
            Severity::Violation,
            "symbol,date",
            duplicates,
            format!("Found {} duplicate (symbol, date) pairs", duplicates),
        ));
    }

    for row in frame.rows() {
        let key = row.key();
        findings.extend(
            validate_observation_with(row, thresholds)
                .into_iter()
                .map(|e| e.at_row(key.clone())),
        );
    }

    ValidationReport::from(findings)
}

/// Number of rows whose (symbol, date) key occurs more than once.
fn count_duplicate_rows(rows: &[OhlcvRow]) -> usize {
    let mut counts: HashMap<RowKey, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.key()).or_default() += 1;
    }
    counts.values().filter(|&&n| n > 1).sum()
}

/// Validate a symbol configuration document and return its symbols.
///
/// The document must be an object with a non-empty `symbols` array of
/// well-formed tickers.
pub fn validate_symbol_config(config: &serde_json::Value) -> Result<Vec<String>, ValidationError> {
    let invalid = |message: String| {
        ValidationError::fatal(Rule::InvalidConfig, "symbols", "", message)
    };

    let obj = config
        .as_object()
        .ok_or_else(|| invalid("Configuration must be an object".to_string()))?;
    let symbols = obj
        .get("symbols")
        .ok_or_else(|| invalid("Missing required configuration keys: [\"symbols\"]".to_string()))?;
    let list = symbols
        .as_array()
        .ok_or_else(|| invalid("Configuration 'symbols' must be a list".to_string()))?;
    if list.is_empty() {
        return Err(invalid("Configuration 'symbols' list is empty".to_string()));
    }

    let mut out = Vec::with_capacity(list.len());
    for entry in list {
        let symbol = entry
            .as_str()
            .ok_or_else(|| invalid(format!("Configuration symbol is not a string: {}", entry)))?;
        validate_symbol(symbol)?;
        out.push(symbol.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Observation;

    fn row(open: f64, high: f64, low: f64, close: f64, volume: f64) -> OhlcvRow {
        OhlcvRow {
            symbol: "BHP".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 24),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
            adjusted_close: Some(close),
        }
    }

    fn good_row() -> OhlcvRow {
        row(50.0, 52.0, 49.0, 51.0, 1_000_000.0)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(symbol: &str, day: u32) -> Observation {
        Observation {
            symbol: symbol.to_string(),
            date: ymd(2024, 12, day),
            open: 50.0,
            high: 52.0,
            low: 49.0,
            close: 51.0,
            volume: 1_000_000,
            adjusted_close: 51.0,
        }
    }

    // -- validate_symbol --

    #[test]
    fn symbol_valid_forms() {
        for s in ["A", "BHP", "CBA", "ABCDE", "A1", "12345", "X9Z"] {
            assert!(validate_symbol(s).is_ok(), "{} should be valid", s);
        }
    }

    #[test]
    fn symbol_empty() {
        let err = validate_symbol("").unwrap_err();
        assert_eq!(err.rule, Rule::EmptySymbol);
        assert!(err.is_fatal());
    }

    #[test]
    fn symbol_invalid_forms() {
        for s in ["bhp", "Bhp", "ABCDEF", "BH-P", "BH.P", "BH P", "\u{00C7}A", "ÄBC"] {
            let err = validate_symbol(s).unwrap_err();
            assert_eq!(err.rule, Rule::SymbolFormat, "{}", s);
        }
    }

    // -- validate_date --

    #[test]
    fn date_accepts_structured_date() {
        let today = ymd(2025, 6, 1);
        let d = ymd(2024, 12, 24);
        assert_eq!(validate_date_at(d, today, &Default::default()).unwrap(), d);
    }

    #[test]
    fn date_accepts_iso_string() {
        let today = ymd(2025, 6, 1);
        assert_eq!(
            validate_date_at("2024-12-24", today, &Default::default()).unwrap(),
            ymd(2024, 12, 24)
        );
        assert_eq!(
            validate_date_at("2024-12-24T10:30:00", today, &Default::default()).unwrap(),
            ymd(2024, 12, 24)
        );
    }

    #[test]
    fn date_rejects_garbage() {
        let err = validate_date_at("24/12/2024", ymd(2025, 1, 1), &Default::default()).unwrap_err();
        assert_eq!(err.rule, Rule::DateFormat);
        assert!(err.to_string().contains("Invalid date format"));
    }

    #[test]
    fn date_today_is_inclusive() {
        let today = Utc::now().date_naive();
        assert_eq!(validate_date(today).unwrap(), today);
    }

    #[test]
    fn date_future_rejected() {
        let tomorrow = Utc::now().date_naive() + chrono::Duration::days(1);
        let err = validate_date(tomorrow).unwrap_err();
        assert_eq!(err.rule, Rule::FutureDate);
    }

    #[test]
    fn date_floor_boundaries() {
        let today = ymd(2025, 1, 1);
        assert!(validate_date_at(ymd(1990, 1, 1), today, &Default::default()).is_ok());
        let err = validate_date_at(ymd(1989, 12, 31), today, &Default::default()).unwrap_err();
        assert_eq!(err.rule, Rule::DateBeforeFloor);
    }

    #[test]
    fn date_floor_is_configurable() {
        let thresholds = ValidationThresholds {
            epoch_floor: ymd(2000, 1, 1),
            ..Default::default()
        };
        assert!(validate_date_at(ymd(1999, 6, 1), ymd(2025, 1, 1), &thresholds).is_err());
    }

    // -- validate_observation --

    #[test]
    fn observation_valid_row_has_no_findings() {
        assert!(validate_observation(&good_row()).is_empty());
    }

    #[test]
    fn observation_high_below_low_mentions_both() {
        let errors = validate_observation(&row(50.0, 48.0, 49.0, 48.5, 100.0));
        let hit = errors
            .iter()
            .find(|e| e.rule == Rule::HighBelowLow)
            .expect("high < low flagged");
        assert!(hit.message.contains("high"));
        assert!(hit.message.contains("low"));
    }

    #[test]
    fn observation_relations_are_independent() {
        // high below everything, low above everything
        let errors = validate_observation(&row(50.0, 40.0, 60.0, 55.0, 100.0));
        let rules: Vec<Rule> = errors.iter().map(|e| e.rule).collect();
        for rule in [
            Rule::HighBelowLow,
            Rule::HighBelowOpen,
            Rule::HighBelowClose,
            Rule::LowAboveOpen,
            Rule::LowAboveClose,
        ] {
            assert!(rules.contains(&rule), "missing {:?}", rule);
        }
    }

    #[test]
    fn observation_missing_field_short_circuits() {
        let mut r = row(-1.0, 48.0, 49.0, 48.5, 100.0);
        r.volume = None;
        let errors = validate_observation(&r);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, Rule::MissingField);
        assert_eq!(errors[0].message, "Missing required field: volume");
    }

    #[test]
    fn observation_reports_every_missing_field() {
        let r = OhlcvRow {
            symbol: "BHP".to_string(),
            open: Some(1.0),
            ..Default::default()
        };
        let errors = validate_observation(&r);
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().all(|e| e.rule == Rule::MissingField));
    }

    #[test]
    fn observation_non_positive_prices() {
        let errors = validate_observation(&row(0.0, 52.0, -1.0, 51.0, 100.0));
        let fields: Vec<&str> = errors
            .iter()
            .filter(|e| e.rule == Rule::NotPositive)
            .map(|e| e.field.as_str())
            .collect();
        assert_eq!(fields, vec!["open", "low"]);
    }

    #[test]
    fn observation_negative_volume() {
        let errors = validate_observation(&row(50.0, 52.0, 49.0, 51.0, -5.0));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, Rule::NegativeVolume);
    }

    #[test]
    fn observation_suspicious_change_is_warning() {
        let errors = validate_observation(&row(10.0, 16.0, 10.0, 16.0, 100.0));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, Rule::SuspiciousChange);
        assert_eq!(errors[0].severity, Severity::Warning);
        assert!(errors[0].message.contains("open=10"));
    }

    #[test]
    fn observation_change_at_threshold_not_flagged() {
        assert!(validate_observation(&row(10.0, 15.0, 10.0, 15.0, 100.0)).is_empty());
    }

    #[test]
    fn observation_threshold_is_configurable() {
        let thresholds = ValidationThresholds {
            suspicious_change: 0.1,
            ..Default::default()
        };
        let errors = validate_observation_with(&row(10.0, 12.0, 10.0, 12.0, 100.0), &thresholds);
        assert_eq!(errors[0].rule, Rule::SuspiciousChange);
    }

    #[test]
    fn observation_non_finite_values() {
        let errors = validate_observation(&row(50.0, f64::INFINITY, 49.0, f64::NAN, 100.0));
        let not_finite: Vec<&str> = errors
            .iter()
            .filter(|e| e.rule == Rule::NotFinite)
            .map(|e| e.field.as_str())
            .collect();
        assert_eq!(not_finite, vec!["high", "close"]);
    }

    // -- validate_batch --

    #[test]
    fn batch_clean() {
        let frame = ObservationFrame::from_observations(&[obs("BHP", 24), obs("CBA", 24)]);
        assert!(validate_batch(&frame).is_clean());
    }

    #[test]
    fn batch_missing_columns_is_fatal_and_alone() {
        let frame = ObservationFrame::new(["symbol", "date", "open"], vec![good_row()]);
        let report = validate_batch(&frame);
        assert_eq!(report.len(), 1);
        assert!(report.has_fatal());
        assert_eq!(report.findings()[0].rule, Rule::MissingColumns);
        assert!(report.findings()[0].message.contains("volume"));
    }

    #[test]
    fn batch_empty_is_fatal() {
        let frame = ObservationFrame::from_observations(&[]);
        let report = validate_batch(&frame);
        assert_eq!(report.len(), 1);
        assert_eq!(report.findings()[0].rule, Rule::EmptyBatch);
    }

    #[test]
    fn batch_duplicates_reported_once() {
        let frame = ObservationFrame::from_observations(&[
            obs("BHP", 24),
            obs("BHP", 24),
            obs("CBA", 24),
        ]);
        let report = validate_batch(&frame);
        assert_eq!(report.len(), 1);
        assert_eq!(report.findings()[0].rule, Rule::DuplicateRows);
        assert_eq!(report.findings()[0].message, "Found 2 duplicate (symbol, date) pairs");
    }

    #[test]
    fn batch_row_findings_are_prefixed() {
        let mut bad = obs("NAB", 24);
        bad.high = 10.0;
        let frame = ObservationFrame::from_observations(&[obs("BHP", 24), bad]);
        let report = validate_batch(&frame);
        assert!(!report.has_fatal());
        assert!(report
            .messages()
            .iter()
            .all(|m| m.starts_with("Row NAB 2024-12-24: ")));
        assert_eq!(report.advisory().count(), report.len());
    }

    #[test]
    fn batch_validation_is_idempotent() {
        let mut bad = obs("NAB", 24);
        bad.low = 60.0;
        let frame = ObservationFrame::from_observations(&[bad, obs("BHP", 24), obs("BHP", 24)]);
        assert_eq!(validate_batch(&frame), validate_batch(&frame));
    }

    // -- validate_symbol_config --

    #[test]
    fn symbol_config_valid() {
        let cfg = serde_json::json!({"symbols": ["BHP", "CBA"]});
        assert_eq!(validate_symbol_config(&cfg).unwrap(), vec!["BHP", "CBA"]);
    }

    #[test]
    fn symbol_config_rejections() {
        for cfg in [
            serde_json::json!([]),
            serde_json::json!({}),
            serde_json::json!({"symbols": "BHP"}),
            serde_json::json!({"symbols": []}),
            serde_json::json!({"symbols": [1]}),
        ] {
            let err = validate_symbol_config(&cfg).unwrap_err();
            assert_eq!(err.rule, Rule::InvalidConfig, "{}", cfg);
        }
    }

    #[test]
    fn symbol_config_bad_symbol() {
        let cfg = serde_json::json!({"symbols": ["BHP", "bad"]});
        assert_eq!(validate_symbol_config(&cfg).unwrap_err().rule, Rule::SymbolFormat);
    }
}
