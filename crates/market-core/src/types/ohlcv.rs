//! Daily OHLC bars and the time series container.

use chrono::{Duration, NaiveDate};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Interval;
use crate::error::DataError;

/// One OHLC bar for a calendar day.
///
/// Prices are kept as `Decimal` so cached payloads round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Trading day
    pub date: NaiveDate,
    /// Opening price
    pub open: Decimal,
    /// Highest price
    pub high: Decimal,
    /// Lowest price
    pub low: Decimal,
    /// Closing price
    pub close: Decimal,
    /// Traded volume; forex quotes carry none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}

impl DailyBar {
    /// Create a new bar without volume.
    pub fn new(date: NaiveDate, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// Attach a traded volume.
    pub fn with_volume(mut self, volume: Decimal) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Bar range (high - low).
    #[inline]
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// Check if the bar is bullish (close > open).
    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Close as `f64` for indicator math.
    #[inline]
    pub fn close_f64(&self) -> f64 {
        self.close.to_f64().unwrap_or_default()
    }
}

/// Ordered daily series for one symbol.
///
/// Dates are strictly increasing with no duplicates. An empty series is the
/// "no data" signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Canonical symbol the bars belong to
    pub symbol: String,
    /// Bar interval
    pub interval: Interval,
    bars: Vec<DailyBar>,
}

impl TimeSeries {
    /// Create an empty series.
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            bars: Vec::new(),
        }
    }

    /// Build a series from bars in any order.
    ///
    /// Bars are sorted by date; when a date repeats the later bar wins.
    pub fn from_bars(
        symbol: impl Into<String>,
        interval: Interval,
        bars: impl IntoIterator<Item = DailyBar>,
    ) -> Self {
        let by_date: BTreeMap<NaiveDate, DailyBar> =
            bars.into_iter().map(|bar| (bar.date, bar)).collect();

        Self {
            symbol: symbol.into(),
            interval,
            bars: by_date.into_values().collect(),
        }
    }

    /// Append a bar, rejecting anything not strictly after the last date.
    pub fn push(&mut self, bar: DailyBar) -> Result<(), DataError> {
        if let Some(last) = self.bars.last() {
            if bar.date <= last.date {
                return Err(DataError::OutOfOrder {
                    date: bar.date,
                    last: last.date,
                });
            }
        }
        self.bars.push(bar);
        Ok(())
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get all bars, oldest first.
    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    /// Get the first bar.
    pub fn first(&self) -> Option<&DailyBar> {
        self.bars.first()
    }

    /// Get the last bar.
    pub fn last(&self) -> Option<&DailyBar> {
        self.bars.last()
    }

    /// Latest close price.
    pub fn latest_close(&self) -> Option<Decimal> {
        self.bars.last().map(|b| b.close)
    }

    /// Extract close prices as `f64` for indicator math.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(DailyBar::close_f64).collect()
    }

    /// Extract dates.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Restrict the series to a lookback window ending at `today`.
    ///
    /// Keeps bars dated on or after `today - days`. `days == 0` keeps
    /// everything, as does a window reaching past the earliest
    /// representable date. When no bar falls inside the window, the most
    /// recent `days` bars are kept instead so a non-empty series stays
    /// non-empty.
    pub fn window(&self, days: u32, today: NaiveDate) -> TimeSeries {
        if days == 0 {
            return self.clone();
        }
        let Some(start) = today.checked_sub_signed(Duration::days(i64::from(days))) else {
            return self.clone();
        };

        let mut bars: Vec<DailyBar> = self
            .bars
            .iter()
            .filter(|b| b.date >= start)
            .cloned()
            .collect();

        if bars.is_empty() {
            let skip = self.bars.len().saturating_sub(days as usize);
            bars = self.bars[skip..].to_vec();
        }

        Self {
            symbol: self.symbol.clone(),
            interval: self.interval,
            bars,
        }
    }

    /// Get an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &DailyBar> {
        self.bars.iter()
    }
}
