//! Derived analysis values computed from a price series.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the fitted price trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Trend {
    /// Classify a regression slope.
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            Trend::Bullish
        } else if slope < 0.0 {
            Trend::Bearish
        } else {
            Trend::Neutral
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Bullish => "Bullish",
            Trend::Bearish => "Bearish",
            Trend::Neutral => "Neutral",
        };
        write!(f, "{}", s)
    }
}

/// Scalar fields derived from a series, suitable for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFields {
    /// Latest close
    pub current_price: Decimal,
    /// Trend direction of the linear fit
    pub trend: Trend,
    /// Slope of the linear fit, price units per bar
    pub slope: f64,
    /// Lowest recent closes, ascending
    pub support: Vec<Decimal>,
    /// Highest recent closes, descending
    pub resistance: Vec<Decimal>,
}

/// Latest values of the standard indicator set.
///
/// Values that cannot be computed from the available history are 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub sma200: f64,
}

/// One projected close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub date: NaiveDate,
    pub price: f64,
}
