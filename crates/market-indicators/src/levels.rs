//! Naive support and resistance levels.

use rust_decimal::Decimal;

/// Closes considered when picking levels.
pub const LEVEL_LOOKBACK: usize = 20;
/// Levels reported per side.
pub const LEVEL_COUNT: usize = 3;

/// Support and resistance from recent closes.
///
/// Support is the lowest closes of the lookback (ascending), resistance the
/// highest (descending). Repeated closes count individually.
pub fn support_resistance(closes: &[Decimal]) -> (Vec<Decimal>, Vec<Decimal>) {
    let start = closes.len().saturating_sub(LEVEL_LOOKBACK);
    let mut recent = closes[start..].to_vec();
    recent.sort();

    let support = recent.iter().take(LEVEL_COUNT).copied().collect();
    let resistance = recent.iter().rev().take(LEVEL_COUNT).copied().collect();
    (support, resistance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_levels_use_recent_closes_only() {
        // The first five closes fall outside the lookback
        let mut closes = vec![dec!(1), dec!(2), dec!(3), dec!(999), dec!(998)];
        closes.extend((10..30).map(Decimal::from));

        let (support, resistance) = support_resistance(&closes);
        assert_eq!(support, vec![dec!(10), dec!(11), dec!(12)]);
        assert_eq!(resistance, vec![dec!(29), dec!(28), dec!(27)]);
    }

    #[test]
    fn test_levels_short_history() {
        let (support, resistance) = support_resistance(&[dec!(1.1), dec!(1.3)]);
        assert_eq!(support, vec![dec!(1.1), dec!(1.3)]);
        assert_eq!(resistance, vec![dec!(1.3), dec!(1.1)]);

        let (support, resistance) = support_resistance(&[]);
        assert!(support.is_empty() && resistance.is_empty());
    }
}
