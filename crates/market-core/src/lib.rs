//! Core types and traits for the market quote layer.
//!
//! This crate provides the foundational building blocks including:
//! - Price series types (DailyBar, TimeSeries, Interval)
//! - Symbol classification and normalized symbols
//! - Derived analysis values (trend, support/resistance, indicator snapshot)
//! - Core traits for quote providers, indicators and clocks

pub mod types;
pub mod traits;
pub mod error;

pub use error::{MarketError, MarketResult};
pub use types::*;
pub use traits::*;
