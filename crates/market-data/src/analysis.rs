//! Per-symbol market analysis and watchlist trend summaries.

use chrono::{DateTime, Utc};
use market_core::types::{NormalizedSymbol, Prediction, TechnicalSnapshot, TimeSeries, Trend};
use market_indicators::{predictions, technical_snapshot, TrendSummary, PREDICTION_DAYS};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::fetcher::{FetchResult, Provenance, QuoteFetcher};
use crate::synthetic::placeholder_indicators;

/// Calendar days of history an analysis looks at.
pub const ANALYSIS_DAYS: u32 = 30;

/// Everything the dashboard shows for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAnalysis {
    pub symbol: NormalizedSymbol,
    pub provenance: Provenance,
    pub current_price: Decimal,
    pub trend: Trend,
    pub slope: f64,
    pub support: Vec<Decimal>,
    pub resistance: Vec<Decimal>,
    pub indicators: TechnicalSnapshot,
    pub predictions: Vec<Prediction>,
    pub history: TimeSeries,
    pub as_of: DateTime<Utc>,
}

/// Builds analyses from fetched series.
pub struct MarketAnalyzer {
    fetcher: Arc<QuoteFetcher>,
    lookback_days: u32,
}

impl MarketAnalyzer {
    pub fn new(fetcher: Arc<QuoteFetcher>) -> Self {
        Self {
            fetcher,
            lookback_days: ANALYSIS_DAYS,
        }
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// Fetch and analyse one symbol.
    pub async fn analyze(&self, symbol: &str, force_refresh: bool) -> MarketAnalysis {
        let fetched = self
            .fetcher
            .fetch_symbol(symbol, self.lookback_days, force_refresh)
            .await;
        self.build(fetched)
    }

    /// Trend breakdown across `symbols`. `None` for an empty list.
    pub async fn trends<S: AsRef<str>>(
        &self,
        symbols: &[S],
        force_refresh: bool,
    ) -> Option<TrendSummary> {
        let results = self
            .fetcher
            .fetch_many(symbols, self.lookback_days, force_refresh)
            .await;

        let summary = TrendSummary::from_trends(results.iter().map(|r| r.derived.trend))?;
        info!(
            total = summary.total_symbols,
            overall = %summary.overall,
            "Computed market trends"
        );
        Some(summary)
    }

    fn build(&self, fetched: FetchResult) -> MarketAnalysis {
        let today = self.fetcher.clock().today();
        let price = fetched.derived.current_price;

        let indicators = match fetched.provenance {
            Provenance::Synthetic => placeholder_indicators(price.to_f64().unwrap_or_default()),
            Provenance::Fresh | Provenance::Stale => technical_snapshot(&fetched.series.closes()),
        };

        MarketAnalysis {
            predictions: predictions(&fetched.series, PREDICTION_DAYS, today),
            symbol: fetched.symbol,
            provenance: fetched.provenance,
            current_price: price,
            trend: fetched.derived.trend,
            slope: fetched.derived.slope,
            support: fetched.derived.support,
            resistance: fetched.derived.resistance,
            indicators,
            history: fetched.series,
            as_of: fetched.as_of,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::tests::{daily_series, harness, start, FakeProvider, Harness};
    use chrono::Duration as ChronoDuration;
    use market_core::error::ProviderError;
    use market_core::types::Interval;

    fn analyzer(provider: FakeProvider) -> (MarketAnalyzer, Harness) {
        let h = harness(provider);
        (MarketAnalyzer::new(h.fetcher.clone()), h)
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_fresh_series() {
        let (analyzer, _h) = analyzer(FakeProvider::serving(30, start().date_naive()));

        let analysis = analyzer.analyze("aapl", false).await;

        assert_eq!(analysis.symbol.canonical, "AAPL");
        assert_eq!(analysis.provenance, Provenance::Fresh);
        assert_eq!(analysis.trend, Trend::Bullish);
        assert_eq!(analysis.current_price, Decimal::from(129));
        assert_eq!(analysis.support.len(), 3);
        assert!(analysis.indicators.sma20 > 0.0);
        assert_eq!(analysis.indicators.sma200, 0.0);

        assert_eq!(analysis.predictions.len(), PREDICTION_DAYS);
        assert_eq!(
            analysis.predictions[0].date,
            start().date_naive() + ChronoDuration::days(1)
        );
        assert!((analysis.predictions[0].price - 130.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_synthetic_uses_placeholders() {
        let (analyzer, _h) =
            analyzer(FakeProvider::failing(ProviderError::Network("down".into())));

        let analysis = analyzer.analyze("MSFT", false).await;

        assert_eq!(analysis.provenance, Provenance::Synthetic);
        assert_eq!(analysis.indicators.rsi, 50.0);
        assert_eq!(analysis.indicators.macd, 0.0);
        assert_eq!(
            analysis.indicators.sma50,
            analysis.current_price.to_f64().unwrap()
        );
        assert_eq!(analysis.predictions.len(), PREDICTION_DAYS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trends_across_watchlist() {
        let today = start().date_naive();
        let (analyzer, _h) = analyzer(FakeProvider::new(move |_, request| {
            let rising = daily_series(&request.symbol.canonical, 30, today);
            if request.symbol.canonical == "TSLA" {
                // Reverse the closes to make a falling series
                let closes: Vec<_> = rising.bars().iter().map(|b| b.close).rev().collect();
                let bars = rising.iter().zip(closes).map(|(bar, close)| {
                    let mut bar = bar.clone();
                    bar.open = close;
                    bar.high = close;
                    bar.low = close;
                    bar.close = close;
                    bar
                });
                Ok(TimeSeries::from_bars("TSLA", Interval::Daily, bars))
            } else {
                Ok(rising)
            }
        }));

        let summary = analyzer
            .trends(&["AAPL", "MSFT", "TSLA"], false)
            .await
            .unwrap();

        assert_eq!(summary.total_symbols, 3);
        assert_eq!(summary.overall, Trend::Bullish);
        assert!((summary.bullish_percentage - 66.67).abs() < 1e-9);
        assert!((summary.bearish_percentage - 33.33).abs() < 1e-9);

        let empty: [&str; 0] = [];
        assert!(analyzer.trends(&empty, false).await.is_none());
    }
}
