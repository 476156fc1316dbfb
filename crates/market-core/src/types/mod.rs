//! Core data types for the market quote layer.

mod analysis;
mod interval;
mod ohlcv;
mod symbol;

pub use analysis::{DerivedFields, Prediction, TechnicalSnapshot, Trend};
pub use interval::Interval;
pub use ohlcv::{DailyBar, TimeSeries};
pub use symbol::{NormalizedSymbol, SymbolClass};
