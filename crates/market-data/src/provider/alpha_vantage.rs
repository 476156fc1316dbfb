//! Alpha Vantage quote provider.
//!
//! Equities and indices use the `TIME_SERIES_*` functions, currency pairs
//! the `FX_*` functions. Daily, weekly and monthly intervals are supported.

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::error::ProviderError;
use market_core::traits::{QuoteProvider, SeriesRequest};
use market_core::types::{DailyBar, Interval, SymbolClass, TimeSeries};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
const PROVIDER_ID: &str = "alpha_vantage";

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 256;

/// Connection settings.
#[derive(Debug, Clone)]
pub struct AlphaVantageConfig {
    pub base_url: String,
    pub api_key: String,
    /// Whole-request timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: "demo".to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Any `TIME_SERIES_*` or `FX_*` response.
#[derive(Debug, Deserialize)]
struct SeriesResponse {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(flatten)]
    fields: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume", default)]
    volume: Option<String>,
}

impl RawBar {
    fn into_bar(self, date: &str) -> Option<DailyBar> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        let bar = DailyBar::new(
            date,
            Decimal::from_str(&self.open).ok()?,
            Decimal::from_str(&self.high).ok()?,
            Decimal::from_str(&self.low).ok()?,
            Decimal::from_str(&self.close).ok()?,
        );
        Some(match self.volume.as_deref().map(Decimal::from_str) {
            Some(Ok(volume)) => bar.with_volume(volume),
            _ => bar,
        })
    }
}

/// HTTP client for the Alpha Vantage query API.
pub struct AlphaVantageProvider {
    client: Client,
    config: AlphaVantageConfig,
}

impl AlphaVantageProvider {
    pub fn new(config: AlphaVantageConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Upstream function for a symbol class and interval.
    pub fn function_for(class: &SymbolClass, interval: Interval) -> &'static str {
        match (class.is_forex(), interval) {
            (true, Interval::Daily) => "FX_DAILY",
            (true, Interval::Weekly) => "FX_WEEKLY",
            (true, Interval::Monthly) => "FX_MONTHLY",
            (false, Interval::Daily) => "TIME_SERIES_DAILY",
            (false, Interval::Weekly) => "TIME_SERIES_WEEKLY",
            (false, Interval::Monthly) => "TIME_SERIES_MONTHLY",
        }
    }

    /// Name of the object holding the bars in a response to `function`.
    fn series_field(function: &str) -> &'static str {
        match function {
            "FX_DAILY" => "Time Series FX (Daily)",
            "FX_WEEKLY" => "Time Series FX (Weekly)",
            "FX_MONTHLY" => "Time Series FX (Monthly)",
            "TIME_SERIES_WEEKLY" => "Weekly Time Series",
            "TIME_SERIES_MONTHLY" => "Monthly Time Series",
            _ => "Time Series (Daily)",
        }
    }

    fn query_params(&self, request: &SeriesRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![(
            "function",
            Self::function_for(&request.symbol.class, request.interval).to_string(),
        )];

        match &request.symbol.class {
            SymbolClass::ForexPair { base, quote } => {
                params.push(("from_symbol", base.clone()));
                params.push(("to_symbol", quote.clone()));
            }
            SymbolClass::Equity | SymbolClass::Index => {
                params.push(("symbol", request.symbol.canonical.clone()));
            }
        }

        params.push(("outputsize", request.output_size.as_str().to_string()));
        params.push(("apikey", self.config.api_key.clone()));
        params
    }

    async fn get(&self, request: &SeriesRequest) -> Result<String, ProviderError> {
        let url = format!("{}/query", self.config.base_url.trim_end_matches('/'));
        let params = self.query_params(request);

        debug!(
            symbol = %request.symbol,
            function = %params[0].1,
            outputsize = %request.output_size,
            "Alpha Vantage request"
        );

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        Ok(body)
    }

    fn transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.config.timeout)
        } else {
            // Strip the URL so the API key never lands in logs
            ProviderError::Network(error.without_url().to_string())
        }
    }

    /// Turn a response body into a series.
    fn parse(
        body: &str,
        request: &SeriesRequest,
        function: &str,
    ) -> Result<TimeSeries, ProviderError> {
        let mut response: SeriesResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::Malformed(format!("invalid JSON: {}", e)))?;

        if let Some(message) = response.error_message {
            return Err(ProviderError::Rejected(message));
        }
        if let Some(note) = response.note {
            return Err(ProviderError::Throttled(note));
        }
        if let Some(info) = response.information {
            let lower = info.to_lowercase();
            if lower.contains("rate limit") || lower.contains("call frequency") {
                return Err(ProviderError::Throttled(info));
            }
            return Err(ProviderError::Rejected(info));
        }

        let field = Self::series_field(function);
        let raw = response
            .fields
            .remove(field)
            .ok_or_else(|| ProviderError::Malformed(format!("missing \"{}\"", field)))?;
        let raw: HashMap<String, RawBar> = serde_json::from_value(raw)
            .map_err(|e| ProviderError::Malformed(format!("bad \"{}\": {}", field, e)))?;

        let total = raw.len();
        let bars: Vec<DailyBar> = raw
            .into_iter()
            .filter_map(|(date, bar)| bar.into_bar(&date))
            .collect();

        if bars.len() < total {
            warn!(
                symbol = %request.symbol,
                skipped = total - bars.len(),
                "Skipped unparseable bars"
            );
        }
        if bars.is_empty() {
            return Err(ProviderError::EmptySeries(request.symbol.canonical.clone()));
        }

        Ok(TimeSeries::from_bars(
            request.symbol.canonical.clone(),
            request.interval,
            bars,
        ))
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    async fn series(&self, request: &SeriesRequest) -> Result<TimeSeries, ProviderError> {
        let function = self.function(request);
        let body = self.get(request).await?;
        let series = Self::parse(&body, request, &function)?;

        info!(
            symbol = %request.symbol,
            bars = series.len(),
            "Fetched series from Alpha Vantage"
        );
        Ok(series)
    }

    fn function(&self, request: &SeriesRequest) -> String {
        Self::function_for(&request.symbol.class, request.interval).to_string()
    }

    fn name(&self) -> &str {
        PROVIDER_ID
    }
}
