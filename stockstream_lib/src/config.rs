//! Runtime configuration read from the environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::fetcher::FetchConfig;
use crate::storage::raw::DEFAULT_RAW_DATA_PREFIX;
use crate::storage::{LocalObjectStore, SharedStore, StorageError};
use crate::symbols::archive::DEFAULT_SYMBOLS_PREFIX;
use crate::validation::ValidationThresholds;

pub const DEFAULT_CONFIG_PREFIX: &str = "config/";
pub const SYMBOLS_CONFIG_FILE: &str = "symbols.json";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} environment variable not set")]
    Missing { name: &'static str },
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root directory of the object store.
    pub bucket: PathBuf,
    pub raw_data_prefix: String,
    pub config_prefix: String,
    pub symbols_prefix: String,
    pub fetch: FetchConfig,
    pub thresholds: ValidationThresholds,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Unset and empty variables
    /// take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bucket = get("STOCKSTREAM_BUCKET").ok_or(ConfigError::Missing {
            name: "STOCKSTREAM_BUCKET",
        })?;

        let defaults = FetchConfig::default();
        let fetch = FetchConfig {
            request_timeout: Duration::from_secs(parse_or(
                &get,
                "YAHOO_FINANCE_TIMEOUT",
                defaults.request_timeout.as_secs(),
            )?),
            max_retries: parse_or(&get, "YAHOO_FINANCE_MAX_RETRIES", defaults.max_retries)?,
            retry_delay: Duration::from_secs(parse_or(
                &get,
                "YAHOO_FINANCE_RETRY_DELAY",
                defaults.retry_delay.as_secs(),
            )?),
            rate_limit_delay: seconds_or(
                &get,
                "YAHOO_FINANCE_RATE_LIMIT_DELAY",
                defaults.rate_limit_delay,
            )?,
            max_backoff: match get("YAHOO_FINANCE_MAX_BACKOFF") {
                Some(_) => Some(seconds_or(&get, "YAHOO_FINANCE_MAX_BACKOFF", Duration::ZERO)?),
                None => None,
            },
        };

        let mut thresholds = ValidationThresholds::default();
        thresholds.suspicious_change =
            parse_or(&get, "STOCKSTREAM_SUSPICIOUS_CHANGE", thresholds.suspicious_change)?;
        if !(thresholds.suspicious_change.is_finite() && thresholds.suspicious_change > 0.0) {
            return Err(ConfigError::Invalid {
                name: "STOCKSTREAM_SUSPICIOUS_CHANGE",
                value: thresholds.suspicious_change.to_string(),
                reason: "must be a positive number".to_string(),
            });
        }

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                name: "LOG_FORMAT",
                value: raw.clone(),
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bucket: PathBuf::from(bucket),
            raw_data_prefix: get("STOCKSTREAM_RAW_DATA_PREFIX")
                .unwrap_or_else(|| DEFAULT_RAW_DATA_PREFIX.to_string()),
            config_prefix: get("STOCKSTREAM_CONFIG_PREFIX")
                .unwrap_or_else(|| DEFAULT_CONFIG_PREFIX.to_string()),
            symbols_prefix: get("STOCKSTREAM_SYMBOLS_PREFIX")
                .unwrap_or_else(|| DEFAULT_SYMBOLS_PREFIX.to_string()),
            fetch,
            thresholds,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
        })
    }

    /// Object key of the symbol configuration document.
    pub fn symbols_config_key(&self) -> String {
        format!(
            "{}{}",
            crate::storage::raw::normalize_prefix(&self.config_prefix),
            SYMBOLS_CONFIG_FILE
        )
    }

    /// Open the bucket directory as an object store.
    pub fn open_store(&self) -> Result<SharedStore, StorageError> {
        Ok(Arc::new(LocalObjectStore::new(&self.bucket)?))
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn seconds_or<G>(get: &G, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(name) else {
        return Ok(default);
    };
    let secs: f64 = parse_or(get, name, 0.0)?;
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::Invalid {
        name,
        value: raw,
        reason: e.to_string(),
    })
}
