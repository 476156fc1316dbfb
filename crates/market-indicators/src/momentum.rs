//! Momentum indicators.

use market_core::traits::{Indicator, MultiOutputIndicator};
use serde::{Deserialize, Serialize};

use crate::moving_average::Ema;

/// Relative Strength Index (RSI) over simple rolling means.
///
/// Average gain and loss are plain means of the last `period` changes
/// (not Wilder-smoothed). A window with no losses reads 100, a window with
/// no movement at all reads 50.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator. The dashboard uses 14.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }

        let changes: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
        let period_f64 = self.period as f64;

        changes
            .windows(self.period)
            .map(|window| {
                let gain = window.iter().filter(|c| **c > 0.0).sum::<f64>() / period_f64;
                let loss = -window.iter().filter(|c| **c < 0.0).sum::<f64>() / period_f64;
                match (gain, loss) {
                    (g, l) if g == 0.0 && l == 0.0 => 50.0,
                    (_, l) if l == 0.0 => 100.0,
                    (g, l) => 100.0 - 100.0 / (1.0 + g / l),
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.period + 1 // Need period+1 data points
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// MACD output for one point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    /// Fast EMA - slow EMA
    pub macd: f64,
    /// EMA of the MACD line
    pub signal: f64,
    /// MACD - signal
    pub histogram: f64,
}

/// MACD built from first-value-seeded EMAs, one output per input point.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
}

impl Macd {
    /// Create a new MACD with default spans (12, 26, 9).
    pub fn new() -> Self {
        Self::with_spans(12, 26, 9)
    }

    /// Create a MACD with custom spans.
    pub fn with_spans(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast < slow, "Fast span must be less than slow span");
        Self {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for Macd {
    type Outputs = MacdOutput;

    fn calculate(&self, data: &[f64]) -> Vec<MacdOutput> {
        let fast = self.fast.calculate(data);
        let slow = self.slow.calculate(data);
        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = self.signal.calculate(&line);

        line.iter()
            .zip(&signal)
            .map(|(&macd, &signal)| MacdOutput {
                macd,
                signal,
                histogram: macd - signal,
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.slow.span()
    }

    fn name(&self) -> &str {
        "MACD"
    }
}
