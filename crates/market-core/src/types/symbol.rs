//! Symbol classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of instrument a symbol names.
///
/// Drives both the shape of the upstream request and the cache TTL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolClass {
    /// Single listed security
    Equity,
    /// Currency pair, e.g. EUR/USD
    ForexPair { base: String, quote: String },
    /// Market index, e.g. ^GSPC
    Index,
}

impl SymbolClass {
    /// Short label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            SymbolClass::Equity => "equity",
            SymbolClass::ForexPair { .. } => "forex",
            SymbolClass::Index => "index",
        }
    }

    pub fn is_forex(&self) -> bool {
        matches!(self, SymbolClass::ForexPair { .. })
    }
}

impl fmt::Display for SymbolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolClass::ForexPair { base, quote } => write!(f, "forex({}/{})", base, quote),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// A symbol in the form the upstream provider expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedSymbol {
    /// Canonical upstream symbol, e.g. `EURUSD=X`, `^GSPC`, `AAPL`
    pub canonical: String,
    /// Instrument class
    pub class: SymbolClass,
}

impl NormalizedSymbol {
    pub fn new(canonical: impl Into<String>, class: SymbolClass) -> Self {
        Self {
            canonical: canonical.into(),
            class,
        }
    }
}

impl fmt::Display for NormalizedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}
