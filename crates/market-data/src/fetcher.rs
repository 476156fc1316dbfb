//! Cache-first, rate-limited quote fetching with graceful degradation.
//!
//! A fetch normalizes the symbol, serves a fresh cache entry when there is
//! one, and otherwise calls the provider under the rate limiter with bounded
//! retries. When the provider cannot deliver, the newest cached entry is
//! served regardless of age, and failing that a synthetic series. Every
//! result says which of these it came from.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use market_core::error::ProviderError;
use market_core::traits::{Clock, OutputSize, QuoteProvider, SeriesRequest};
use market_core::types::{DerivedFields, Interval, NormalizedSymbol, TimeSeries};
use market_indicators::derive_fields;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, TtlPolicy, TwoTierCache};
use crate::rate_limiter::RateLimiter;
use crate::retry::{Attempt, RetryPolicy};
use crate::symbol::normalize;
use crate::synthetic;

/// Default number of symbols fetched at once by [`QuoteFetcher::fetch_many`].
pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;

/// Where the data in a [`FetchResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Upstream, now or within the TTL
    Fresh,
    /// Expired cache, served because upstream failed
    Stale,
    /// Generated, no real data was available
    Synthetic,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provenance::Fresh => "fresh",
            Provenance::Stale => "stale",
            Provenance::Synthetic => "synthetic",
        };
        write!(f, "{}", s)
    }
}

/// A request for recent history of one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Raw symbol as the user typed it
    pub symbol: String,
    /// Calendar days of history; 0 for everything available
    pub days: u32,
    pub interval: Interval,
    /// Skip the cache lookup
    pub force_refresh: bool,
}

impl FetchRequest {
    pub fn new(symbol: impl Into<String>, days: u32) -> Self {
        Self {
            symbol: symbol.into(),
            days,
            interval: Interval::Daily,
            force_refresh: false,
        }
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }
}

/// Series for one symbol, windowed to the requested lookback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    pub symbol: NormalizedSymbol,
    pub provenance: Provenance,
    /// Never empty
    pub series: TimeSeries,
    pub derived: DerivedFields,
    /// When the data was obtained from upstream, or generated
    pub as_of: DateTime<Utc>,
}

impl FetchResult {
    pub fn is_synthetic(&self) -> bool {
        self.provenance == Provenance::Synthetic
    }
}

/// The fetch pipeline and the shared state it runs against.
pub struct QuoteFetcher {
    provider: Arc<dyn QuoteProvider>,
    cache: Arc<TwoTierCache>,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    ttl: TtlPolicy,
    retry: RetryPolicy,
    batch_concurrency: usize,
}

impl QuoteFetcher {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        cache: Arc<TwoTierCache>,
        limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            cache,
            limiter,
            clock,
            ttl: TtlPolicy::default(),
            retry: RetryPolicy::default(),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    pub fn with_ttl_policy(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<TwoTierCache> {
        &self.cache
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Cache key for an upstream request.
    pub fn key_for(&self, request: &SeriesRequest) -> CacheKey {
        CacheKey::new(
            self.provider.function(request),
            request.symbol.canonical.clone(),
            request.interval,
            request.output_size,
        )
    }

    /// Fetch daily history for `symbol`.
    pub async fn fetch_symbol(&self, symbol: &str, days: u32, force_refresh: bool) -> FetchResult {
        self.fetch(&FetchRequest::new(symbol, days).force_refresh(force_refresh))
            .await
    }

    /// Run the fetch pipeline. Always yields a non-empty series.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        let symbol = normalize(&request.symbol);
        let upstream = SeriesRequest::new(
            symbol.clone(),
            request.interval,
            OutputSize::for_days(request.days),
        );
        let key = self.key_for(&upstream);
        let ttl = self.ttl.ttl_for(&symbol.class, request.days);

        if !request.force_refresh {
            if let Some(entry) = self.cache.get(&key, ttl).await {
                if !entry.payload.is_empty() {
                    debug!(symbol = %symbol, key = %key, "Serving cached series");
                    return self.respond(
                        symbol,
                        request.days,
                        Provenance::Fresh,
                        &entry.payload,
                        entry.created_at,
                    );
                }
            }
        }

        match self.fetch_upstream(&upstream).await {
            Ok(series) => {
                let as_of = self.clock.now();
                let result =
                    self.respond(symbol, request.days, Provenance::Fresh, &series, as_of);
                if let Err(e) = self.cache.put(key, series).await {
                    warn!(
                        symbol = %result.symbol,
                        error = %e,
                        "Failed to persist series to disk cache"
                    );
                }
                return result;
            }
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "Upstream fetch failed, degrading");
            }
        }

        if let Some(entry) = self.cache.get_stale(&key).await {
            if !entry.payload.is_empty() {
                warn!(
                    symbol = %symbol,
                    provenance = %Provenance::Stale,
                    created_at = %entry.created_at,
                    "Serving expired cache entry"
                );
                return self.respond(
                    symbol,
                    request.days,
                    Provenance::Stale,
                    &entry.payload,
                    entry.created_at,
                );
            }
        }

        warn!(
            symbol = %symbol,
            provenance = %Provenance::Synthetic,
            "No data available, serving synthetic series"
        );
        self.synthesize(symbol, request.interval, request.days)
    }

    /// Fetch several symbols, at most `batch_concurrency` at a time.
    ///
    /// Results are in input order.
    pub async fn fetch_many<S: AsRef<str>>(
        &self,
        symbols: &[S],
        days: u32,
        force_refresh: bool,
    ) -> Vec<FetchResult> {
        stream::iter(symbols)
            .map(|symbol| self.fetch_symbol(symbol.as_ref(), days, force_refresh))
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }

    /// Call the provider under the rate limiter, retrying transient failures.
    async fn fetch_upstream(&self, request: &SeriesRequest) -> Result<TimeSeries, ProviderError> {
        self.retry
            .run(|attempt| async move {
                self.limiter.acquire().await;
                info!(
                    symbol = %request.symbol,
                    attempt,
                    provider = self.provider.name(),
                    "Calling upstream"
                );

                let result = match self.provider.series(request).await {
                    Ok(series) if series.is_empty() => {
                        Err(ProviderError::EmptySeries(request.symbol.canonical.clone()))
                    }
                    other => other,
                };
                Attempt::from(result)
            })
            .await
            .map_err(|failure| failure.last_error)
    }

    fn respond(
        &self,
        symbol: NormalizedSymbol,
        days: u32,
        provenance: Provenance,
        payload: &TimeSeries,
        as_of: DateTime<Utc>,
    ) -> FetchResult {
        let series = payload.window(days, self.clock.today());
        match derive_fields(&series) {
            Some(derived) => FetchResult {
                symbol,
                provenance,
                series,
                derived,
                as_of,
            },
            None => self.synthesize(symbol, payload.interval, days),
        }
    }

    fn synthesize(&self, symbol: NormalizedSymbol, interval: Interval, days: u32) -> FetchResult {
        let series = synthetic::generate_interval(&symbol, interval, days, self.clock.today());
        let derived = derive_fields(&series).unwrap_or_else(|| {
            synthetic::placeholder_fields(series.latest_close().unwrap_or_default())
        });

        FetchResult {
            symbol,
            provenance: Provenance::Synthetic,
            series,
            derived,
            as_of: self.clock.now(),
        }
    }
}
