//! Bar interval definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// Resolution of the bars in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// Daily bars
    #[default]
    Daily,
    /// Weekly bars
    Weekly,
    /// Monthly bars
    Monthly,
}

impl Interval {
    /// Approximate length of one bar in calendar days.
    pub fn as_days(&self) -> u32 {
        match self {
            Interval::Daily => 1,
            Interval::Weekly => 7,
            Interval::Monthly => 30, // Approximate
        }
    }

    /// Get all available intervals.
    pub fn all() -> &'static [Interval] {
        &[Interval::Daily, Interval::Weekly, Interval::Monthly]
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1d" | "d" | "day" | "daily" => Ok(Interval::Daily),
            "1w" | "w" | "week" | "weekly" => Ok(Interval::Weekly),
            "1mo" | "mo" | "month" | "monthly" => Ok(Interval::Monthly),
            _ => Err(DataError::InvalidInterval(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_days() {
        assert_eq!(Interval::Daily.as_days(), 1);
        assert_eq!(Interval::Weekly.as_days(), 7);
    }

    #[test]
    fn test_interval_parse() {
        assert_eq!(Interval::from_str("1d").unwrap(), Interval::Daily);
        assert_eq!(Interval::from_str("Weekly").unwrap(), Interval::Weekly);
        assert_eq!(Interval::from_str("month").unwrap(), Interval::Monthly);
        assert!(Interval::from_str("5m").is_err());
    }

    #[test]
    fn test_interval_display_round_trips() {
        for interval in Interval::all() {
            assert_eq!(Interval::from_str(&interval.to_string()).unwrap(), *interval);
        }
    }
}
