//! Least-squares linear trend over bar index.

use market_core::types::Trend;

/// Fitted line `price = intercept + slope * index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    /// Number of points the line was fitted on
    pub points: usize,
}

impl LinearTrend {
    /// Fit against closes indexed 0..n.
    ///
    /// Fewer than two points yield a flat line through the only value (or
    /// zero for an empty input).
    pub fn fit(closes: &[f64]) -> Self {
        let n = closes.len();
        if n < 2 {
            return Self {
                slope: 0.0,
                intercept: closes.first().copied().unwrap_or_default(),
                points: n,
            };
        }

        let n_f64 = n as f64;
        let mean_x = (n_f64 - 1.0) / 2.0;
        let mean_y = closes.iter().sum::<f64>() / n_f64;

        let (num, den) = closes
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (i, &y)| {
                let dx = i as f64 - mean_x;
                (num + dx * (y - mean_y), den + dx * dx)
            });

        let slope = num / den;
        Self {
            slope,
            intercept: mean_y - slope * mean_x,
            points: n,
        }
    }

    /// Value of the line at a bar index.
    pub fn value_at(&self, index: usize) -> f64 {
        self.intercept + self.slope * index as f64
    }

    /// Project the next `count` bars after the fitted range.
    pub fn forecast(&self, count: usize) -> Vec<f64> {
        (self.points..self.points + count)
            .map(|i| self.value_at(i))
            .collect()
    }

    pub fn trend(&self) -> Trend {
        Trend::from_slope(self.slope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_exact_line() {
        let closes: Vec<f64> = (0..10).map(|i| 5.0 + 2.0 * i as f64).collect();
        let fit = LinearTrend::fit(&closes);

        assert!((fit.slope - 2.0).abs() < 1e-10);
        assert!((fit.intercept - 5.0).abs() < 1e-10);
        assert_eq!(fit.trend(), Trend::Bullish);

        let next = fit.forecast(3);
        assert!((next[0] - 25.0).abs() < 1e-10);
        assert!((next[2] - 29.0).abs() < 1e-10);
    }

    #[test]
    fn test_fit_falling() {
        let fit = LinearTrend::fit(&[10.0, 9.0, 8.5, 7.0]);
        assert!(fit.slope < 0.0);
        assert_eq!(fit.trend(), Trend::Bearish);
    }

    #[test]
    fn test_fit_degenerate_inputs() {
        let single = LinearTrend::fit(&[3.5]);
        assert_eq!(single.slope, 0.0);
        assert_eq!(single.forecast(2), vec![3.5, 3.5]);

        let empty = LinearTrend::fit(&[]);
        assert_eq!(empty.trend(), Trend::Neutral);
        assert_eq!(empty.forecast(1), vec![0.0]);
    }
}
