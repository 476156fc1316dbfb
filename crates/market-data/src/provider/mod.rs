//! Upstream quote providers.

mod alpha_vantage;

pub use alpha_vantage::{AlphaVantageConfig, AlphaVantageProvider, DEFAULT_BASE_URL};
