use std::time::Duration;

use serde::Serialize;
use stockstream_lib::{IngestReport, RefreshReport, StockStreamError, SymbolBatch, ValidationReport};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

/// Printed instead of a report when a run fails.
#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub status: &'static str,
    pub error: String,
    pub error_type: &'static str,
    pub execution_time: f64,
}

impl FailureReport {
    pub fn new(err: &StockStreamError, elapsed: Duration) -> Self {
        Self {
            status: "failed",
            error: err.to_string(),
            error_type: err.kind(),
            execution_time: elapsed.as_secs_f64(),
        }
    }
}

#[derive(Tabled, Serialize)]
struct SummaryRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled, Serialize)]
struct BatchRow {
    #[tabled(rename = "Batch")]
    batch: u32,
    #[tabled(rename = "Symbols")]
    count: usize,
    #[tabled(rename = "First")]
    first: String,
    #[tabled(rename = "Last")]
    last: String,
}

#[derive(Tabled, Serialize)]
struct FindingRow {
    #[tabled(rename = "Row")]
    row: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Message")]
    message: String,
}

// -- Row builders --

fn summary(pairs: Vec<(&str, String)>) -> Vec<SummaryRow> {
    pairs
        .into_iter()
        .map(|(field, value)| SummaryRow {
            field: field.to_string(),
            value,
        })
        .collect()
}

fn build_ingest_rows(report: &IngestReport) -> Vec<SummaryRow> {
    let status = match report.status {
        stockstream_lib::IngestStatus::Success => "success",
        stockstream_lib::IngestStatus::Partial => "partial",
    };
    summary(vec![
        ("Status", status.to_string()),
        ("Date", report.date.to_string()),
        (
            "Batch",
            report
                .batch_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Processed", report.symbols_processed.to_string()),
        ("Fetched", report.symbols_fetched.to_string()),
        ("Failed", report.symbols_failed.to_string()),
        ("Findings", report.validation_findings.to_string()),
        ("Key", report.key.clone()),
        ("Elapsed", format_secs(report.execution_time)),
    ])
}

fn build_refresh_rows(report: &RefreshReport) -> Vec<SummaryRow> {
    summary(vec![
        ("Date", report.date.to_string()),
        ("Key", report.key.clone()),
        ("Symbols", report.total_symbols.to_string()),
        ("Batches", report.num_batches.to_string()),
        ("Batch size", report.batch_size.to_string()),
        ("Elapsed", format_secs(report.execution_time)),
    ])
}

fn build_failure_rows(report: &FailureReport) -> Vec<SummaryRow> {
    summary(vec![
        ("Status", report.status.to_string()),
        ("Error type", report.error_type.to_string()),
        ("Error", report.error.clone()),
        ("Elapsed", format_secs(report.execution_time)),
    ])
}

fn build_batch_rows(batches: &[SymbolBatch]) -> Vec<BatchRow> {
    batches
        .iter()
        .map(|b| BatchRow {
            batch: b.batch_number,
            count: b.symbols.len(),
            first: b.symbols.first().cloned().unwrap_or_default(),
            last: b.symbols.last().cloned().unwrap_or_default(),
        })
        .collect()
}

fn build_finding_rows(report: &ValidationReport) -> Vec<FindingRow> {
    report
        .findings()
        .iter()
        .map(|f| FindingRow {
            row: f
                .row
                .as_ref()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "batch".to_string()),
            severity: format!("{:?}", f.severity).to_lowercase(),
            field: f.field.clone(),
            message: f.message.clone(),
        })
        .collect()
}

fn format_secs(secs: f64) -> String {
    format!("{:.2}s", secs)
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

// -- Reports --

pub fn print_ingest_report(report: &IngestReport, format: &OutputFormat) {
    match format {
        OutputFormat::Table => print_table(build_ingest_rows(report)),
        OutputFormat::Json => print_json(report),
    }
}

pub fn print_refresh_report(report: &RefreshReport, format: &OutputFormat) {
    match format {
        OutputFormat::Table => {
            print_table(build_refresh_rows(report));
            print_table(build_batch_rows(&report.batches));
        }
        OutputFormat::Json => print_json(report),
    }
}

pub fn print_failure(report: &FailureReport, format: &OutputFormat) {
    match format {
        OutputFormat::Table => print_table(build_failure_rows(report)),
        OutputFormat::Json => print_json(report),
    }
}

#[derive(Serialize)]
struct FindingsOutput<'a> {
    key: &'a str,
    rows: usize,
    findings: &'a ValidationReport,
}

pub fn print_findings(key: &str, rows: usize, report: &ValidationReport, format: &OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{}: {} rows, {} findings", key, rows, report.len());
            if !report.is_empty() {
                print_table(build_finding_rows(report));
            }
        }
        OutputFormat::Json => print_json(&FindingsOutput {
            key,
            rows,
            findings: report,
        }),
    }
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockstream_lib::model::{ObservationFrame, OhlcvRow};
    use stockstream_lib::{validate_batch, FetchError, IngestStatus};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 24).unwrap()
    }

    fn value_of<'a>(rows: &'a [SummaryRow], field: &str) -> &'a str {
        rows.iter()
            .find(|r| r.field == field)
            .map(|r| r.value.as_str())
            .unwrap()
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::parse("anything"), OutputFormat::Table);
    }

    #[test]
    fn test_build_ingest_rows() {
        let report = IngestReport {
            status: IngestStatus::Partial,
            date: day(),
            batch_number: None,
            symbols_processed: 3,
            symbols_fetched: 2,
            symbols_failed: 1,
            validation_findings: 0,
            key: "raw-data/2024-12-24.parquet".to_string(),
            execution_time: 1.234,
        };
        let rows = build_ingest_rows(&report);
        assert_eq!(value_of(&rows, "Status"), "partial");
        assert_eq!(value_of(&rows, "Batch"), "-");
        assert_eq!(value_of(&rows, "Failed"), "1");
        assert_eq!(value_of(&rows, "Elapsed"), "1.23s");
    }

    #[test]
    fn test_build_batch_rows() {
        let batches = vec![
            SymbolBatch {
                symbols: vec!["BHP".into(), "CBA".into(), "NAB".into()],
                batch_number: 0,
            },
            SymbolBatch {
                symbols: vec!["WBC".into()],
                batch_number: 1,
            },
        ];
        let rows = build_batch_rows(&batches);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].count, 3);
        assert_eq!(rows[0].first, "BHP");
        assert_eq!(rows[0].last, "NAB");
        assert_eq!(rows[1].first, rows[1].last);
    }

    #[test]
    fn test_build_finding_rows() {
        let row = OhlcvRow {
            symbol: "BHP".to_string(),
            date: Some(day()),
            open: Some(10.0),
            high: Some(9.0),
            low: Some(11.0),
            close: Some(10.0),
            volume: Some(100.0),
            adjusted_close: Some(10.0),
        };
        let frame = ObservationFrame::new(
            stockstream_lib::model::ALL_COLUMNS.iter().copied(),
            vec![row],
        );
        let report = validate_batch(&frame);
        let rows = build_finding_rows(&report);

        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.row == "BHP 2024-12-24"));
        assert!(rows.iter().all(|r| r.severity == "violation"));
    }

    #[test]
    fn test_batch_level_finding_row() {
        let frame = ObservationFrame::new(
            stockstream_lib::model::ALL_COLUMNS.iter().copied(),
            Vec::new(),
        );
        let rows = build_finding_rows(&validate_batch(&frame));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row, "batch");
        assert_eq!(rows[0].severity, "fatal");
    }

    #[test]
    fn test_failure_report_serialization() {
        let err: StockStreamError = FetchError::RateLimitExceeded {
            symbol: "BHP".to_string(),
            attempts: 5,
        }
        .into();
        let report = FailureReport::new(&err, Duration::from_millis(1500));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["error_type"], "RateLimitError");
        assert_eq!(json["execution_time"], 1.5);
        assert!(json["error"].as_str().unwrap().contains("BHP"));

        let rows = build_failure_rows(&report);
        assert_eq!(value_of(&rows, "Error type"), "RateLimitError");
    }
}
