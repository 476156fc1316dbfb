//! Symbol normalization.
//!
//! Maps user-supplied tickers and pairs onto the canonical form the upstream
//! expects: `EURUSD=X` for currency pairs, `^GSPC` for indices, the
//! upper-cased ticker for everything else.

use market_core::types::{NormalizedSymbol, SymbolClass};

/// Marker the upstream expects on currency pairs.
pub const FOREX_SUFFIX: &str = "=X";

/// Suffix spellings accepted for currency pairs.
const FOREX_MARKERS: &[&str] = &["=X", "-X", "_X"];

/// Prefix the upstream expects on index tickers.
pub const INDEX_PREFIX: char = '^';

/// ISO 4217 codes recognized as pair legs.
pub const CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "AUD", "CAD", "CHF", "NZD", "CNY", "HKD", "SGD", "SEK", "NOK",
    "DKK", "MXN", "ZAR", "TRY", "INR", "KRW", "BRL", "RUB", "PLN", "THB", "IDR", "MYR", "PHP",
    "CZK", "HUF", "ILS", "AED", "SAR", "TWD",
];

/// Index tickers, without their prefix.
pub const INDICES: &[&str] = &[
    "GSPC", "DJI", "IXIC", "NDX", "RUT", "VIX", "NYA", "FTSE", "GDAXI", "FCHI", "STOXX50E",
    "N225", "HSI", "AXJO", "GSPTSE", "BSESN", "NSEI", "KS11",
];

fn is_currency(code: &str) -> bool {
    CURRENCIES.contains(&code)
}

fn is_index(ticker: &str) -> bool {
    INDICES.contains(&ticker)
}

/// Remove a pair marker: a trailing `=X`/`-X`/`_X` or a single `/`.
fn strip_pair_marker(symbol: &str) -> &str {
    FOREX_MARKERS
        .iter()
        .find_map(|marker| symbol.strip_suffix(marker))
        .unwrap_or(symbol)
}

/// Split a 6-letter string into two recognized currency codes.
fn split_pair(text: &str) -> Option<(&str, &str)> {
    if text.len() != 6 || !text.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let (base, quote) = text.split_at(3);
    (is_currency(base) && is_currency(quote)).then_some((base, quote))
}

/// Normalize a raw symbol.
///
/// Never fails: anything unrecognized passes through (trimmed and
/// upper-cased) as an equity. Normalizing a canonical symbol returns it
/// unchanged.
pub fn normalize(raw: &str) -> NormalizedSymbol {
    let symbol = raw.trim().to_uppercase();

    let stripped = strip_pair_marker(&symbol);
    let compact: String = match stripped.split_once('/') {
        Some((base, quote)) if !quote.contains('/') => format!("{}{}", base, quote),
        _ => stripped.to_string(),
    };

    if let Some((base, quote)) = split_pair(&compact) {
        return NormalizedSymbol::new(
            format!("{}{}", compact, FOREX_SUFFIX),
            SymbolClass::ForexPair {
                base: base.to_string(),
                quote: quote.to_string(),
            },
        );
    }

    let bare = symbol.strip_prefix(INDEX_PREFIX).unwrap_or(&symbol);
    if is_index(bare) {
        return NormalizedSymbol::new(format!("{}{}", INDEX_PREFIX, bare), SymbolClass::Index);
    }

    NormalizedSymbol::new(symbol, SymbolClass::Equity)
}
