//! Configuration structures.

use market_data::{
    AlphaVantageConfig, CacheConfig, RateLimitConfig, RetryPolicy, TtlPolicy,
    DEFAULT_BATCH_CONCURRENCY,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// API key used when the configured variable is unset.
const DEMO_API_KEY: &str = "demo";

/// A setting that parsed but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid setting `{field}`: {reason}")]
pub struct InvalidSetting {
    pub field: &'static str,
    pub reason: &'static str,
}

impl InvalidSetting {
    fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

impl From<InvalidSetting> for config::ConfigError {
    fn from(err: InvalidSetting) -> Self {
        config::ConfigError::Message(err.to_string())
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub batch: BatchSettings,
}

impl AppConfig {
    /// Reject values that parse but would stall or disable the pipeline.
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        if self.rate_limit.max_calls == 0 {
            return Err(InvalidSetting::new("rate_limit.max_calls", "must be at least 1"));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(InvalidSetting::new("rate_limit.window_secs", "must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(InvalidSetting::new("retry.max_attempts", "must be at least 1"));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(InvalidSetting::new(
                "retry.base_delay_ms",
                "must not exceed retry.max_delay_ms",
            ));
        }
        if self.cache.memory_capacity == 0 {
            return Err(InvalidSetting::new("cache.memory_capacity", "must be at least 1"));
        }
        if self.batch.concurrency == 0 {
            return Err(InvalidSetting::new("batch.concurrency", "must be at least 1"));
        }
        if self.provider.timeout_secs == 0 {
            return Err(InvalidSetting::new("provider.timeout_secs", "must be positive"));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(InvalidSetting::new(
                "logging.format",
                "must be `pretty` or `json`",
            ));
        }
        Ok(())
    }

    /// Effective configuration rendered back as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "market".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Also write logs to this file, rotated daily
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Upstream quote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: market_data::provider::DEFAULT_BASE_URL.to_string(),
            api_key_env: "ALPHA_VANTAGE_API_KEY".to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

impl ProviderSettings {
    /// The key from `api_key_env`, or the public demo key.
    pub fn api_key(&self) -> String {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| DEMO_API_KEY.to_string())
    }

    pub fn is_demo_key(&self) -> bool {
        self.api_key() == DEMO_API_KEY
    }

    pub fn to_provider_config(&self) -> AlphaVantageConfig {
        AlphaVantageConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key(),
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

/// Cache tiers and freshness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub dir: String,
    pub memory_ttl_secs: u64,
    pub memory_capacity: usize,
    pub forex_ttl_secs: u64,
    pub index_ttl_secs: u64,
    pub equity_ttl_secs: u64,
    pub short_lookback_days: u32,
    pub short_lookback_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let cache = CacheConfig::default();
        let ttl = TtlPolicy::default();
        Self {
            dir: cache.dir.to_string_lossy().into_owned(),
            memory_ttl_secs: cache.memory_ttl.as_secs(),
            memory_capacity: cache.memory_capacity,
            forex_ttl_secs: ttl.forex.as_secs(),
            index_ttl_secs: ttl.index.as_secs(),
            equity_ttl_secs: ttl.equity.as_secs(),
            short_lookback_days: ttl.short_lookback_days,
            short_lookback_ttl_secs: ttl.short_lookback.as_secs(),
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            dir: PathBuf::from(&self.dir),
            memory_ttl: Duration::from_secs(self.memory_ttl_secs),
            memory_capacity: self.memory_capacity,
        }
    }

    pub fn to_ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            forex: Duration::from_secs(self.forex_ttl_secs),
            index: Duration::from_secs(self.index_ttl_secs),
            equity: Duration::from_secs(self.equity_ttl_secs),
            short_lookback_days: self.short_lookback_days,
            short_lookback: Duration::from_secs(self.short_lookback_ttl_secs),
        }
    }
}

/// Upstream call quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_calls: usize,
    pub window_secs: u64,
    pub max_jitter_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        let limits = RateLimitConfig::default();
        Self {
            max_calls: limits.max_calls,
            window_secs: limits.window.as_secs(),
            max_jitter_ms: limits.max_jitter.as_millis() as u64,
        }
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        RateLimitConfig {
            max_calls: settings.max_calls,
            window: Duration::from_secs(settings.window_secs),
            max_jitter: Duration::from_millis(settings.max_jitter_ms),
        }
    }
}

/// Upstream retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_elapsed_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            max_elapsed_secs: policy.max_elapsed.as_secs(),
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy {
            max_attempts: settings.max_attempts,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            max_elapsed: Duration::from_secs(settings.max_elapsed_secs),
        }
    }
}

/// Multi-symbol fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Symbols fetched at once
    pub concurrency: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}
