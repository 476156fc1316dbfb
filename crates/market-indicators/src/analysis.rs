//! Assembly of derived fields and indicator snapshots from a series.

use chrono::{Duration, NaiveDate};
use market_core::traits::{Indicator, MultiOutputIndicator};
use market_core::types::{DerivedFields, Prediction, TechnicalSnapshot, TimeSeries, Trend};
use serde::{Deserialize, Serialize};

use crate::levels::support_resistance;
use crate::momentum::{Macd, Rsi};
use crate::moving_average::Sma;
use crate::regression::LinearTrend;

/// Days projected by the dashboard's forecast.
pub const PREDICTION_DAYS: usize = 5;

/// Current price, trend and levels for a series.
///
/// Returns `None` for an empty series.
pub fn derive_fields(series: &TimeSeries) -> Option<DerivedFields> {
    let current_price = series.latest_close()?;
    let fit = LinearTrend::fit(&series.closes());
    let closes: Vec<_> = series.iter().map(|b| b.close).collect();
    let (support, resistance) = support_resistance(&closes);

    Some(DerivedFields {
        current_price,
        trend: fit.trend(),
        slope: fit.slope,
        support,
        resistance,
    })
}

/// Latest RSI(14), MACD(12, 26, 9) and SMA(20/50/200) values.
pub fn technical_snapshot(closes: &[f64]) -> TechnicalSnapshot {
    let macd = Macd::new().calculate(closes).pop();

    TechnicalSnapshot {
        rsi: Rsi::new(14).latest(closes).unwrap_or_default(),
        macd: macd.map(|m| m.macd).unwrap_or_default(),
        macd_signal: macd.map(|m| m.signal).unwrap_or_default(),
        macd_hist: macd.map(|m| m.histogram).unwrap_or_default(),
        sma20: Sma::new(20).latest(closes).unwrap_or_default(),
        sma50: Sma::new(50).latest(closes).unwrap_or_default(),
        sma200: Sma::new(200).latest(closes).unwrap_or_default(),
    }
}

/// Project `count` closes forward, dated from the day after `today`.
pub fn predictions(series: &TimeSeries, count: usize, today: NaiveDate) -> Vec<Prediction> {
    LinearTrend::fit(&series.closes())
        .forecast(count)
        .into_iter()
        .enumerate()
        .map(|(i, price)| Prediction {
            date: today + Duration::days(i as i64 + 1),
            price,
        })
        .collect()
}

/// Share of bullish, bearish and neutral symbols across a watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub overall: Trend,
    pub bullish_percentage: f64,
    pub bearish_percentage: f64,
    pub neutral_percentage: f64,
    pub total_symbols: usize,
}

impl TrendSummary {
    /// Summarize trends. Returns `None` when there is nothing to summarize.
    ///
    /// The overall trend is bullish (or bearish) only when that side holds
    /// more than half of the symbols and outnumbers the other side.
    pub fn from_trends(trends: impl IntoIterator<Item = Trend>) -> Option<Self> {
        let (mut bullish, mut bearish, mut neutral) = (0usize, 0usize, 0usize);
        for trend in trends {
            match trend {
                Trend::Bullish => bullish += 1,
                Trend::Bearish => bearish += 1,
                Trend::Neutral => neutral += 1,
            }
        }

        let total = bullish + bearish + neutral;
        if total == 0 {
            return None;
        }

        let pct = |count: usize| count as f64 / total as f64 * 100.0;
        let (bull_pct, bear_pct) = (pct(bullish), pct(bearish));

        let overall = if bull_pct > bear_pct && bull_pct > 50.0 {
            Trend::Bullish
        } else if bear_pct > bull_pct && bear_pct > 50.0 {
            Trend::Bearish
        } else {
            Trend::Neutral
        };

        Some(Self {
            overall,
            bullish_percentage: round2(bull_pct),
            bearish_percentage: round2(bear_pct),
            neutral_percentage: round2(pct(neutral)),
            total_symbols: total,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
