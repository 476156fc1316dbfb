//! Error types for the market quote layer.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors returned by an upstream quote provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Provider throttled the request: {0}")]
    Throttled(String),

    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Provider returned an empty series for {0}")]
    EmptySeries(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Whether another attempt against the same provider may succeed.
    ///
    /// Network trouble, server errors, throttling and unusable bodies are
    /// transient. A rejected symbol, a 4xx or a broken client setup is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout(_)
            | ProviderError::Network(_)
            | ProviderError::Throttled(_)
            | ProviderError::Malformed(_)
            | ProviderError::EmptySeries(_) => true,
            ProviderError::Http { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Rejected(_) | ProviderError::Configuration(_) => false,
        }
    }
}

/// Cache tier errors. Readers treat all of these as misses.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache entry at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Cache serialization error: {0}")]
    Serialize(String),
}

/// Time series errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Bar dated {date} is not after the last bar dated {last}")]
    OutOfOrder {
        date: chrono::NaiveDate,
        last: chrono::NaiveDate,
    },
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Rate limiter errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("No call slot within {max_wait:?}, next slot in {available_in:?}")]
    WaitExceeded {
        max_wait: Duration,
        available_in: Duration,
    },
}

/// Result type alias for market operations.
pub type MarketResult<T> = Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(ProviderError::Timeout(Duration::from_secs(10)).is_retryable());
        assert!(ProviderError::Network("reset".into()).is_retryable());
        assert!(ProviderError::Throttled("5 calls per minute".into()).is_retryable());
        assert!(ProviderError::Malformed("missing series".into()).is_retryable());
        assert!(ProviderError::EmptySeries("AAPL".into()).is_retryable());
        assert!(ProviderError::Http { status: 503, body: String::new() }.is_retryable());
        assert!(ProviderError::Http { status: 429, body: String::new() }.is_retryable());

        assert!(!ProviderError::Http { status: 404, body: String::new() }.is_retryable());
        assert!(!ProviderError::Rejected("Invalid API call".into()).is_retryable());
        assert!(!ProviderError::Configuration("bad header".into()).is_retryable());
    }

    #[test]
    fn test_error_conversion() {
        let err: MarketError = ProviderError::EmptySeries("AAPL".into()).into();
        assert!(matches!(err, MarketError::Provider(_)));
        assert!(err.to_string().contains("AAPL"));
    }
}
