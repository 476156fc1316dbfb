//! Moving average indicators.

use market_core::traits::Indicator;

/// Simple Moving Average (SMA).
///
/// Arithmetic mean of the last N closes.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let period_f64 = self.period as f64;
        let mut sum: f64 = data[..self.period].iter().sum();
        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        result.push(sum / period_f64);

        for i in self.period..data.len() {
            sum += data[i] - data[i - self.period];
            result.push(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average seeded with the first observation.
///
/// Produces one value per input point:
/// `ema[0] = x[0]`, `ema[t] = a * x[t] + (1 - a) * ema[t-1]` with
/// `a = 2 / (span + 1)`. This is the recursive form dashboards usually
/// chart, as opposed to the SMA-seeded variant.
#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    alpha: f64,
}

impl Ema {
    /// Create a new EMA with the given span.
    pub fn new(span: usize) -> Self {
        assert!(span > 0, "Span must be greater than 0");
        Self {
            span,
            alpha: 2.0 / (span as f64 + 1.0),
        }
    }

    /// Span the smoothing factor was derived from.
    pub fn span(&self) -> usize {
        self.span
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        let mut iter = data.iter();
        let Some(&first) = iter.next() else {
            return vec![];
        };

        let mut result = Vec::with_capacity(data.len());
        let mut ema = first;
        result.push(ema);
        for &price in iter {
            ema = self.alpha * price + (1.0 - self.alpha) * ema;
            result.push(ema);
        }
        result
    }

    fn period(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let sma = Sma::new(3);
        let result = sma.calculate(&[2.0, 4.0, 6.0, 8.0, 10.0]);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 4.0).abs() < 1e-10);
        assert!((result[2] - 8.0).abs() < 1e-10);
        assert_eq!(sma.latest(&[2.0, 4.0, 6.0, 8.0, 10.0]), Some(8.0));
    }

    #[test]
    fn test_sma_insufficient_data() {
        assert!(Sma::new(20).calculate(&[1.0, 2.0, 3.0]).is_empty());
    }

    #[test]
    fn test_ema_seeded_with_first_value() {
        // span 3 -> alpha 0.5
        let result = Ema::new(3).calculate(&[2.0, 4.0, 8.0]);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 1e-10);
        assert!((result[1] - 3.0).abs() < 1e-10);
        assert!((result[2] - 5.5).abs() < 1e-10);
    }

    #[test]
    fn test_ema_empty() {
        assert!(Ema::new(12).calculate(&[]).is_empty());
    }
}
