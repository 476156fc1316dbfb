//! Core traits for the market quote layer.

mod clock;
mod indicator;
mod provider;

pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use indicator::{Indicator, MultiOutputIndicator};
pub use provider::{OutputSize, QuoteProvider, SeriesRequest, COMPACT_POINTS};
