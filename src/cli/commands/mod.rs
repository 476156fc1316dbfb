//! CLI command implementations.

pub mod analyze;
pub mod batch;
pub mod cache;
pub mod fetch;
pub mod trends;
pub mod validate;

use anyhow::{Context, Result};
use market_config::AppConfig;
use market_core::traits::{Clock, SystemClock};
use market_data::{AlphaVantageProvider, QuoteFetcher, RateLimiter, TwoTierCache};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the process-wide cache, limiter and provider behind one fetcher.
pub async fn build_fetcher(config: &AppConfig) -> Result<Arc<QuoteFetcher>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cache_config = config.cache.to_cache_config();
    tokio::fs::create_dir_all(&cache_config.dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create cache directory '{}'",
                cache_config.dir.display()
            )
        })?;
    let memory_ttl = cache_config.memory_ttl;
    let cache = Arc::new(TwoTierCache::new(cache_config, clock.clone()));
    if let Err(e) = cache.warm(memory_ttl).await {
        warn!(error = %e, "Could not warm memory cache");
    }

    let limiter = Arc::new(RateLimiter::new((&config.rate_limit).into()));

    if config.provider.is_demo_key() {
        warn!(
            env = %config.provider.api_key_env,
            "No API key set, using the demo key"
        );
    }
    let provider = AlphaVantageProvider::new(config.provider.to_provider_config())
        .context("Failed to create quote provider")?;

    info!(
        cache_dir = %config.cache.dir,
        max_calls = config.rate_limit.max_calls,
        window_secs = config.rate_limit.window_secs,
        "Quote fetcher ready"
    );

    let fetcher = QuoteFetcher::new(Arc::new(provider), cache, limiter, clock)
        .with_ttl_policy(config.cache.to_ttl_policy())
        .with_retry_policy((&config.retry).into())
        .with_batch_concurrency(config.batch.concurrency);
    Ok(Arc::new(fetcher))
}

/// Write `value` as pretty JSON to `path`.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    info!("Results saved to {:?}", path);
    Ok(())
}

/// Prices joined for display.
pub fn join_prices(prices: &[rust_decimal::Decimal]) -> String {
    if prices.is_empty() {
        return "-".to_string();
    }
    prices
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
