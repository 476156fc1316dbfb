//! Trend, momentum and level transforms over price series.
//!
//! Everything here is a pure function of the closes it is given:
//! - Moving averages (SMA, first-value-seeded EMA)
//! - Momentum indicators (RSI, MACD)
//! - Least-squares linear trend and forecast
//! - Naive support/resistance levels
//! - Derived-field, indicator-snapshot and trend-summary assembly

pub mod analysis;
pub mod levels;
pub mod momentum;
pub mod moving_average;
pub mod regression;

pub use analysis::{derive_fields, predictions, technical_snapshot, TrendSummary, PREDICTION_DAYS};
pub use levels::support_resistance;
pub use momentum::{Macd, MacdOutput, Rsi};
pub use moving_average::{Ema, Sma};
pub use regression::LinearTrend;
