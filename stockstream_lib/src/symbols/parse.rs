//! Parsing of the directory page and the directory CSV.

use regex::Regex;
use serde::Serialize;

use super::error::SymbolsError;

/// Header keywords that mark the first real CSV line (preamble lines precede it).
const HEADER_KEYWORDS: &[&str] = &["code", "symbol", "company", "name"];

const SYMBOL_COLUMNS: &[&str] = &["ASX code", "Code", "Symbol", "Ticker", "ASX Code"];
const NAME_COLUMNS: &[&str] = &["Company name", "Name", "Company"];
const SECTOR_COLUMNS: &[&str] = &["GICS industry group", "Industry", "Sector"];
const MARKET_CAP_COLUMNS: &[&str] = &["Market Cap", "MarketCap"];

const UNKNOWN_SECTOR: &str = "Unknown";

const SAMPLE_DIRECTORY_CSV: &str = "\
ASX code,Company name,GICS industry group,Market Cap
BHP,BHP Group Limited,Materials,180500000000
CBA,Commonwealth Bank,Financials,165200000000
NAB,National Australia Bank,Financials,98450000000
WBC,Westpac Banking Corporation,Financials,87320000000
ANZ,Australia and New Zealand Banking Group,Financials,75690000000
CSL,CSL Limited,Health Care Equipment & Services,142300000000
WES,Wesfarmers Limited,Consumer Discretionary Distribution & Retail,68900000000
WOW,Woolworths Group,Consumer Staples Distribution & Retail,45200000000
FMG,Fortescue Metals Group,Materials,56800000000
RIO,Rio Tinto Limited,Materials,134700000000
";

/// A ten-company listing in the directory's CSV format.
pub fn sample_directory_csv() -> &'static str {
    SAMPLE_DIRECTORY_CSV
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedCompany {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub market_cap: Option<String>,
}

fn regex(pattern: &str) -> Result<Regex, SymbolsError> {
    Regex::new(pattern).map_err(|e| SymbolsError::Parse(format!("regex compile error: {}", e)))
}

fn attribute(attrs: &str, name: &str) -> Result<Option<String>, SymbolsError> {
    let re = regex(&format!(
        r#"(?is)(?:^|\s){}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        regex::escape(name)
    ))?;
    Ok(re.captures(attrs).and_then(|cap| {
        cap.get(1)
            .or_else(|| cap.get(2))
            .map(|m| m.as_str().to_string())
    }))
}

/// Find the CSV download URL on the directory page.
///
/// Picks the first anchor whose text contains "CSV download", else the first
/// anchor carrying a `data-download` attribute. From that anchor an absolute
/// URL inside `onclick` wins, then an absolute `href`, then a site-relative
/// `href` resolved against `site_origin`.
pub fn extract_csv_download_url(html: &str, site_origin: &str) -> Result<String, SymbolsError> {
    let anchor_re = regex(r"(?is)<a\b([^>]*)>(.*?)</a>")?;
    let tag_re = regex(r"(?s)<[^>]*>")?;
    let data_download_re = regex(r"(?i)(?:^|\s)data-download(?:\s|=|$)")?;

    let anchors: Vec<(String, String)> = anchor_re
        .captures_iter(html)
        .map(|cap| {
            let attrs = cap[1].to_string();
            let text = tag_re.replace_all(&cap[2], "").to_string();
            (attrs, text)
        })
        .collect();

    let attrs = anchors
        .iter()
        .find(|(_, text)| text.contains("CSV download"))
        .or_else(|| anchors.iter().find(|(attrs, _)| data_download_re.is_match(attrs)))
        .map(|(attrs, _)| attrs.as_str())
        .ok_or(SymbolsError::MissingDownloadLink)?;

    let onclick = attribute(attrs, "onclick")?.unwrap_or_default();
    let href = attribute(attrs, "href")?.unwrap_or_default();

    if onclick.contains("http") {
        let url_re = regex(r#"https?://[^\s'"]+"#)?;
        if let Some(m) = url_re.find(&onclick) {
            return Ok(m.as_str().to_string());
        }
    }

    if href.starts_with("http") {
        return Ok(href);
    }
    if !href.is_empty() && !href.starts_with("javascript") {
        return Ok(format!("{}{}", site_origin.trim_end_matches('/'), href));
    }

    Err(SymbolsError::UnusableDownloadLink { onclick, href })
}

fn pick(record: &csv::StringRecord, headers: &csv::StringRecord, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        let idx = headers.iter().position(|h| h == *name)?;
        let value = record.get(idx)?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Parse the directory CSV into companies.
///
/// Lines before the first header-looking line are skipped. Rows without a
/// symbol or a name are dropped; an empty result is an error.
pub fn parse_directory_csv(content: &str) -> Result<Vec<ListedCompany>, SymbolsError> {
    let content = content.trim().trim_start_matches('\u{feff}');
    let lines: Vec<&str> = content.lines().collect();
    let start = lines
        .iter()
        .position(|line| {
            let lower = line.to_lowercase();
            HEADER_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .unwrap_or(0);
    let data = lines[start..].join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data.as_bytes());
    let headers = reader.headers()?.clone();

    let mut companies = Vec::new();
    for record in reader.records() {
        let record = record?;
        let (Some(symbol), Some(name)) = (
            pick(&record, &headers, SYMBOL_COLUMNS),
            pick(&record, &headers, NAME_COLUMNS),
        ) else {
            continue;
        };
        companies.push(ListedCompany {
            symbol,
            name,
            sector: pick(&record, &headers, SECTOR_COLUMNS)
                .unwrap_or_else(|| UNKNOWN_SECTOR.to_string()),
            market_cap: pick(&record, &headers, MARKET_CAP_COLUMNS),
        });
    }

    if companies.is_empty() {
        return Err(SymbolsError::NoCompanies {
            preview: content.chars().take(500).collect(),
        });
    }

    tracing::info!(count = companies.len(), "Parsed companies from directory CSV");
    Ok(companies)
}
