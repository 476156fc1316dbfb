//! Freshness policy per symbol class and lookback.

use market_core::types::SymbolClass;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(60 * 60);

/// How long a cached series stays fresh.
///
/// Actively traded instruments go stale sooner, and short lookbacks are
/// capped regardless of class since their last bar is what callers show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    pub forex: Duration,
    pub index: Duration,
    pub equity: Duration,
    /// Lookbacks of at most this many days use `short_lookback`
    pub short_lookback_days: u32,
    pub short_lookback: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            forex: HOUR,
            index: 4 * HOUR,
            equity: 24 * HOUR,
            short_lookback_days: 7,
            short_lookback: HOUR,
        }
    }
}

impl TtlPolicy {
    /// TTL for a request of `days` history on a symbol of `class`.
    ///
    /// `days == 0` asks for the full history and is never a short lookback.
    pub fn ttl_for(&self, class: &SymbolClass, days: u32) -> Duration {
        let base = match class {
            SymbolClass::ForexPair { .. } => self.forex,
            SymbolClass::Index => self.index,
            SymbolClass::Equity => self.equity,
        };

        if days > 0 && days <= self.short_lookback_days {
            base.min(self.short_lookback)
        } else {
            base
        }
    }
}
