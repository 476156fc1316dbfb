//! Cache keys and their on-disk file names.

use market_core::traits::OutputSize;
use market_core::types::Interval;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separates key components in a file name. Always escaped inside a field.
const FIELD_SEPARATOR: char = '+';

/// Extension of cache files.
pub const FILE_EXTENSION: &str = "json";

/// Identity of one cached upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Provider function, e.g. `TIME_SERIES_DAILY`
    pub function: String,
    /// Canonical symbol
    pub symbol: String,
    pub interval: Interval,
    pub output_size: OutputSize,
}

impl CacheKey {
    pub fn new(
        function: impl Into<String>,
        symbol: impl Into<String>,
        interval: Interval,
        output_size: OutputSize,
    ) -> Self {
        Self {
            function: function.into(),
            symbol: symbol.into(),
            interval,
            output_size,
        }
    }

    /// File name of this key in the disk tier.
    ///
    /// Each field is percent-encoded, so distinct keys always map to
    /// distinct names and no name contains a path separator.
    pub fn file_name(&self) -> String {
        let fields = [
            encode(&self.function),
            encode(&self.symbol),
            encode(&self.interval.to_string()),
            encode(self.output_size.as_str()),
        ];
        format!(
            "{}.{}",
            fields.join(&FIELD_SEPARATOR.to_string()),
            FILE_EXTENSION
        )
    }

    /// Recover a key from a file name produced by [`CacheKey::file_name`].
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(FILE_EXTENSION)?.strip_suffix('.')?;
        let mut fields = stem.split(FIELD_SEPARATOR);

        let function = decode(fields.next()?)?;
        let symbol = decode(fields.next()?)?;
        let interval = decode(fields.next()?)?.parse().ok()?;
        let output_size = match decode(fields.next()?)?.as_str() {
            "compact" => OutputSize::Compact,
            "full" => OutputSize::Full,
            _ => return None,
        };

        if fields.next().is_some() {
            return None;
        }

        Some(Self::new(function, symbol, interval, output_size))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.function, self.symbol, self.interval, self.output_size
        )
    }
}

fn encode(field: &str) -> String {
    urlencoding::encode(field).into_owned()
}

/// Inverse of [`encode`]. Only accepts the exact text `encode` produces.
fn decode(field: &str) -> Option<String> {
    let decoded = urlencoding::decode(field).ok()?.into_owned();
    (encode(&decoded) == field).then_some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(symbol: &str) -> CacheKey {
        CacheKey::new("FX_DAILY", symbol, Interval::Daily, OutputSize::Compact)
    }

    #[test]
    fn test_file_name_is_safe() {
        let name = key("EURUSD=X").file_name();
        assert_eq!(name, "FX_DAILY+EURUSD%3DX+daily+compact.json");

        let index = key("^GSPC").file_name();
        assert!(index.contains("%5EGSPC"));

        let traversal = key("../etc/passwd").file_name();
        assert!(!traversal.contains('/'));
    }

    #[test]
    fn test_file_name_round_trips() {
        for symbol in ["AAPL", "EURUSD=X", "^GSPC", "BRK.B", "A+B", "A%3DB", "../etc", "", "é"] {
            let original = key(symbol);
            let name = original.file_name();
            assert_eq!(CacheKey::from_file_name(&name), Some(original), "symbol {symbol:?}");
        }
    }

    #[test]
    fn test_distinct_keys_distinct_names() {
        // Literal text that looks like an escape must not collide with it
        assert_ne!(key("A=B").file_name(), key("A%3DB").file_name());
        assert_ne!(key("A+B").file_name(), key("A B").file_name());
        assert_ne!(key("EURUSD=X").file_name(), key("EURUSD_X").file_name());

        let compact = key("AAPL");
        let full = CacheKey::new("FX_DAILY", "AAPL", Interval::Daily, OutputSize::Full);
        assert_ne!(compact.file_name(), full.file_name());
    }

    #[test]
    fn test_foreign_file_names_rejected() {
        assert_eq!(CacheKey::from_file_name("notes.txt"), None);
        assert_eq!(CacheKey::from_file_name("a+b+daily.json"), None);
        assert_eq!(CacheKey::from_file_name("a+b+hourly+compact.json"), None);
        assert_eq!(CacheKey::from_file_name("a+b+daily+compact+x.json"), None);
        // Escapes must be in the form encoding produces
        assert_eq!(CacheKey::from_file_name("a%ZZ+b+daily+compact.json"), None);
        assert_eq!(CacheKey::from_file_name("%41+b+daily+compact.json"), None);
    }
}
