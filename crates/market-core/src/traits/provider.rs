//! Quote provider trait definitions.

use crate::error::ProviderError;
use crate::types::{Interval, NormalizedSymbol, TimeSeries};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of most recent points a compact response carries.
pub const COMPACT_POINTS: u32 = 100;

/// How much history the provider should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// Latest 100 points
    Compact,
    /// Full available history
    Full,
}

impl OutputSize {
    /// Pick the smallest size that covers a lookback of `days`.
    pub fn for_days(days: u32) -> Self {
        if days == 0 || days > COMPACT_POINTS {
            OutputSize::Full
        } else {
            OutputSize::Compact
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single upstream series request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub symbol: NormalizedSymbol,
    pub interval: Interval,
    pub output_size: OutputSize,
}

impl SeriesRequest {
    pub fn new(symbol: NormalizedSymbol, interval: Interval, output_size: OutputSize) -> Self {
        Self {
            symbol,
            interval,
            output_size,
        }
    }
}

/// Trait for upstream market-data providers.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch a historical series.
    ///
    /// # Arguments
    /// * `request` - Normalized symbol, interval and output size
    ///
    /// # Returns
    /// A non-empty series ordered from oldest to newest, or the reason
    /// the call failed
    async fn series(&self, request: &SeriesRequest) -> Result<TimeSeries, ProviderError>;

    /// Provider function name for a request, used in cache keys.
    fn function(&self, request: &SeriesRequest) -> String;

    /// Get the provider name.
    fn name(&self) -> &str;
}
