//! Deterministic stand-in series for when no real data can be had.
//!
//! The generator is seeded from a hash of the canonical symbol, so the same
//! symbol on the same day always yields the same numbers.

use chrono::{Duration, NaiveDate};
use market_core::types::{
    DailyBar, DerivedFields, Interval, NormalizedSymbol, SymbolClass, TechnicalSnapshot,
    TimeSeries, Trend,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Bars produced when the caller asks for the full history.
pub const DEFAULT_SYNTHETIC_DAYS: u32 = 30;

/// Most bars a single series is generated with.
pub const MAX_SYNTHETIC_BARS: u32 = 3_650;

/// Shape of the random walk for one symbol class.
struct Profile {
    base_range: (f64, f64),
    /// Largest daily move, as a fraction of price
    volatility: f64,
    decimals: u32,
    volume_range: Option<(f64, f64)>,
}

impl Profile {
    fn for_class(class: &SymbolClass) -> Self {
        match class {
            SymbolClass::ForexPair { .. } => Profile {
                base_range: (1.0, 1.5),
                volatility: 0.005,
                decimals: 5,
                volume_range: None,
            },
            SymbolClass::Index => Profile {
                base_range: (1_000.0, 5_000.0),
                volatility: 0.01,
                decimals: 2,
                volume_range: Some((1.0e8, 5.0e9)),
            },
            SymbolClass::Equity => Profile {
                base_range: (20.0, 500.0),
                volatility: 0.02,
                decimals: 2,
                volume_range: Some((1.0e5, 1.0e7)),
            },
        }
    }

    fn price(&self, value: f64) -> Decimal {
        Decimal::from_f64(value)
            .unwrap_or(Decimal::ONE)
            .round_dp(self.decimals)
    }
}

/// Seed derived from the first 8 bytes of SHA-256 of the symbol.
pub fn seed_for(canonical: &str) -> u64 {
    let digest = Sha256::digest(canonical.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Generate `days` consecutive daily bars ending at `today`.
///
/// `days == 0` yields [`DEFAULT_SYNTHETIC_DAYS`] bars and the count is
/// capped at [`MAX_SYNTHETIC_BARS`]. The result is never empty.
pub fn generate(symbol: &NormalizedSymbol, days: u32, today: NaiveDate) -> TimeSeries {
    generate_interval(symbol, Interval::Daily, days, today)
}

/// Generate bars spaced by `interval` covering `days` calendar days up to
/// `today`, the last bar dated `today`.
pub fn generate_interval(
    symbol: &NormalizedSymbol,
    interval: Interval,
    days: u32,
    today: NaiveDate,
) -> TimeSeries {
    let step = i64::from(interval.as_days().max(1));
    let count = match days {
        0 => i64::from(DEFAULT_SYNTHETIC_DAYS),
        days => (i64::from(days) + step - 1) / step,
    }
    .min(i64::from(MAX_SYNTHETIC_BARS)) as u32;

    let profile = Profile::for_class(&symbol.class);
    let mut rng = StdRng::seed_from_u64(seed_for(&symbol.canonical));

    let mut close = rng.gen_range(profile.base_range.0..profile.base_range.1);
    let start = today - Duration::days(step * (i64::from(count) - 1));

    let bars = (0..count).map(|i| {
        let open = close;
        close = (open * (1.0 + rng.gen_range(-profile.volatility..profile.volatility)))
            .max(f64::EPSILON);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..profile.volatility / 2.0));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..profile.volatility / 2.0));

        let bar = DailyBar::new(
            start + Duration::days(step * i64::from(i)),
            profile.price(open),
            profile.price(high),
            profile.price(low),
            profile.price(close),
        );
        match profile.volume_range {
            Some((lo, hi)) => bar.with_volume(Decimal::from(rng.gen_range(lo..hi) as u64)),
            None => bar,
        }
    });

    TimeSeries::from_bars(symbol.canonical.clone(), interval, bars)
}

/// Neutral indicator values for a synthetic series.
pub fn placeholder_indicators(price: f64) -> TechnicalSnapshot {
    TechnicalSnapshot {
        rsi: 50.0,
        macd: 0.0,
        macd_signal: 0.0,
        macd_hist: 0.0,
        sma20: price,
        sma50: price,
        sma200: price,
    }
}

/// Flat derived fields at `price`, for a series too short to analyse.
pub fn placeholder_fields(price: Decimal) -> DerivedFields {
    DerivedFields {
        current_price: price,
        trend: Trend::Neutral,
        slope: 0.0,
        support: Vec::new(),
        resistance: Vec::new(),
    }
}
