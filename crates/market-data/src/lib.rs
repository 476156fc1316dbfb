//! Cached, rate-limited quote fetching.
//!
//! This crate provides:
//! - Symbol normalization into the upstream's canonical form
//! - A two-tier (memory + disk) cache with per-request TTLs
//! - A rolling-window rate limiter and bounded retry policy
//! - The Alpha Vantage provider
//! - The fetch pipeline with stale and synthetic fallbacks
//! - Market analysis built on fetched series

pub mod analysis;
pub mod cache;
pub mod fetcher;
pub mod provider;
pub mod rate_limiter;
pub mod retry;
pub mod symbol;
pub mod synthetic;

pub use analysis::{MarketAnalysis, MarketAnalyzer, ANALYSIS_DAYS};
pub use cache::{CacheConfig, CacheEntry, CacheKey, CacheStats, TtlPolicy, TwoTierCache};
pub use fetcher::{
    FetchRequest, FetchResult, Provenance, QuoteFetcher, DEFAULT_BATCH_CONCURRENCY,
};
pub use provider::{AlphaVantageConfig, AlphaVantageProvider};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use retry::{Attempt, RetryFailure, RetryPolicy};
pub use symbol::normalize;
