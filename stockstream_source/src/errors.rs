//! Error types for price source requests.

use std::time::Duration;

/// Errors that can occur when requesting bars from a price source.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The upstream refused the request because of its rate limit.
    #[error("Rate limited by upstream (HTTP 429)")]
    RateLimited,
    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// The upstream returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    ParseFailed(String),
    /// Any other upstream failure, carrying the upstream message.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl SourceError {
    /// Classify an opaque upstream failure message.
    ///
    /// Upstream libraries that only expose error text are mapped onto
    /// `RateLimited` when the text mentions HTTP 429 or "too many requests"
    /// (case-insensitive). Everything else stays an `Upstream` error.
    pub fn from_upstream_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("429") || lower.contains("too many requests") {
            Self::RateLimited
        } else {
            Self::Upstream(message)
        }
    }

    /// Whether retrying this failure should be treated as rate-limit backoff.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited => true,
            Self::HttpStatus { status, .. } => *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_429_text_as_rate_limited() {
        let err = SourceError::from_upstream_message("HTTP status 429 returned");
        assert_eq!(err, SourceError::RateLimited);
    }

    #[test]
    fn classifies_too_many_requests_case_insensitive() {
        let err = SourceError::from_upstream_message("Too Many Requests. Rate limited. Try after a while.");
        assert!(err.is_rate_limited());
    }

    #[test]
    fn other_text_stays_upstream() {
        let err = SourceError::from_upstream_message("connection reset by peer");
        assert!(!err.is_rate_limited());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn http_429_status_is_rate_limited() {
        let err = SourceError::HttpStatus {
            status: 429,
            body: String::new(),
        };
        assert!(err.is_rate_limited());

        let err = SourceError::HttpStatus {
            status: 503,
            body: String::new(),
        };
        assert!(!err.is_rate_limited());
    }
}
