//! Two-tier quote cache.
//!
//! A bounded in-process map in front of a directory of JSON files. Lookups
//! go memory first, then disk; fresh disk hits are promoted into memory.
//! Writes go to both tiers. Freshness is decided per call from a TTL the
//! caller picks (see [`TtlPolicy`]).

mod disk;
mod key;
mod memory;
mod policy;

pub use disk::{DiskTier, FORMAT_VERSION};
pub use key::CacheKey;
pub use memory::MemoryTier;
pub use policy::TtlPolicy;

use chrono::{DateTime, Utc};
use market_core::error::CacheError;
use market_core::traits::Clock;
use market_core::types::TimeSeries;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A cached upstream response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: TimeSeries,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        is_fresh(self, ttl, now)
    }
}

/// `now - created_at < ttl`. Entries stamped in the future count as fresh.
pub fn is_fresh(entry: &CacheEntry, ttl: Duration, now: DateTime<Utc>) -> bool {
    match (now - entry.created_at).to_std() {
        Ok(age) => age < ttl,
        Err(_) => true,
    }
}

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory of the disk tier
    pub dir: PathBuf,
    /// Longest an entry stays in memory
    pub memory_ttl: Duration,
    /// Maximum number of entries in memory
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache/alpha_vantage"),
            memory_ttl: Duration::from_secs(60 * 60),
            memory_capacity: 512,
        }
    }
}

/// Size of both tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub memory_entries: usize,
    pub disk_entries: usize,
    pub disk_bytes: u64,
}

/// Memory tier backed by a disk tier.
pub struct TwoTierCache {
    memory: MemoryTier,
    disk: DiskTier,
    clock: Arc<dyn Clock>,
}

impl TwoTierCache {
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: MemoryTier::new(config.memory_ttl, config.memory_capacity),
            disk: DiskTier::new(config.dir),
            clock,
        }
    }

    pub fn disk(&self) -> &DiskTier {
        &self.disk
    }

    /// Fresh entry for `key`, or `None`.
    pub async fn get(&self, key: &CacheKey, ttl: Duration) -> Option<CacheEntry> {
        let now = self.clock.now();

        if let Some(entry) = self.memory.get(key, now) {
            if entry.is_fresh(ttl, now) {
                debug!(key = %key, tier = "memory", "Cache hit");
                return Some(entry);
            }
        }

        match self.disk.read(key).await {
            Ok(Some(entry)) if entry.is_fresh(ttl, now) => {
                debug!(key = %key, tier = "disk", "Cache hit");
                self.memory.insert(entry.clone(), now);
                Some(entry)
            }
            Ok(_) => {
                debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                self.disk.report(&e);
                None
            }
        }
    }

    /// Store `payload` under `key` in both tiers.
    ///
    /// The memory tier is always updated. A failed disk write is returned so
    /// the caller can log it; the entry is still served from memory.
    pub async fn put(&self, key: CacheKey, payload: TimeSeries) -> Result<CacheEntry, CacheError> {
        let now = self.clock.now();
        let entry = CacheEntry {
            key,
            payload,
            created_at: now,
        };

        self.memory.insert(entry.clone(), now);
        self.disk.write(&entry).await?;
        Ok(entry)
    }

    /// Newest entry for `key` in either tier, however old.
    pub async fn get_stale(&self, key: &CacheKey) -> Option<CacheEntry> {
        let in_memory = self.memory.peek(key);
        let on_disk = match self.disk.read(key).await {
            Ok(entry) => entry,
            Err(e) => {
                self.disk.report(&e);
                None
            }
        };

        match (in_memory, on_disk) {
            (Some(m), Some(d)) => Some(if d.created_at > m.created_at { d } else { m }),
            (m, d) => m.or(d),
        }
    }

    /// Drop `key` from both tiers. Returns whether anything was removed.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let in_memory = self.memory.remove(key);
        let on_disk = self.disk.remove(key).await?;
        Ok(in_memory || on_disk)
    }

    /// Drop every entry for a canonical symbol. Returns the files removed.
    pub async fn clear_symbol(&self, symbol: &str) -> Result<usize, CacheError> {
        self.memory.remove_symbol(symbol);

        let mut removed = 0;
        for (key, _) in self.disk.list().await? {
            if key.symbol == symbol && self.disk.remove(&key).await? {
                removed += 1;
            }
        }

        info!(symbol, removed, "Cleared cache for symbol");
        Ok(removed)
    }

    /// Drop everything. Returns the files removed.
    pub async fn clear_all(&self) -> Result<usize, CacheError> {
        self.memory.clear();

        let mut removed = 0;
        for (key, _) in self.disk.list().await? {
            if self.disk.remove(&key).await? {
                removed += 1;
            }
        }

        info!(removed, "Cleared cache");
        Ok(removed)
    }

    /// Load disk entries younger than `max_age` into memory.
    pub async fn warm(&self, max_age: Duration) -> Result<usize, CacheError> {
        let now = self.clock.now();
        let mut loaded = 0;

        for (key, _) in self.disk.list().await? {
            match self.disk.read(&key).await {
                Ok(Some(entry)) if entry.is_fresh(max_age, now) => {
                    self.memory.insert(entry, now);
                    loaded += 1;
                }
                Ok(_) => {}
                Err(e) => self.disk.report(&e),
            }
        }

        info!(loaded, "Warmed memory cache from disk");
        Ok(loaded)
    }

    /// Disk entries younger than `max_age`, without loading them.
    pub async fn count_fresh(&self, max_age: Duration) -> Result<usize, CacheError> {
        let now = self.clock.now();
        let mut fresh = 0;

        for (key, _) in self.disk.list().await? {
            match self.disk.read(&key).await {
                Ok(Some(entry)) if entry.is_fresh(max_age, now) => fresh += 1,
                Ok(_) => {}
                Err(e) => self.disk.report(&e),
            }
        }
        Ok(fresh)
    }

    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let files = self.disk.list().await?;
        Ok(CacheStats {
            memory_entries: self.memory.len(),
            disk_entries: files.len(),
            disk_bytes: files.iter().map(|(_, size)| size).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone};
    use market_core::traits::{FixedClock, ManualClock, OutputSize};
    use market_core::types::{DailyBar, Interval};
    use rust_decimal_macros::dec;

    const HOUR: Duration = Duration::from_secs(3600);

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn key(symbol: &str) -> CacheKey {
        CacheKey::new(
            "TIME_SERIES_DAILY",
            symbol,
            Interval::Daily,
            OutputSize::Compact,
        )
    }

    fn series(symbol: &str, close: rust_decimal::Decimal) -> TimeSeries {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        TimeSeries::from_bars(
            symbol,
            Interval::Daily,
            vec![DailyBar::new(date, close, close, close, close)],
        )
    }

    fn cache_in(dir: &std::path::Path, clock: Arc<dyn Clock>) -> TwoTierCache {
        TwoTierCache::new(
            CacheConfig {
                dir: dir.to_path_buf(),
                ..CacheConfig::default()
            },
            clock,
        )
    }

    #[test]
    fn test_is_fresh_boundary() {
        let e = CacheEntry {
            key: key("AAPL"),
            payload: series("AAPL", dec!(1)),
            created_at: start(),
        };

        assert!(is_fresh(&e, HOUR, start()));
        assert!(is_fresh(&e, HOUR, start() + ChronoDuration::seconds(3599)));
        assert!(!is_fresh(&e, HOUR, start() + ChronoDuration::seconds(3600)));
        assert!(is_fresh(&e, HOUR, start() - ChronoDuration::seconds(5)));
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path(), Arc::new(FixedClock(start())));

        let stored = cache.put(key("AAPL"), series("AAPL", dec!(190.5))).await.unwrap();
        let hit = cache.get(&key("AAPL"), HOUR).await.unwrap();

        assert_eq!(hit, stored);
        assert_eq!(hit.payload.latest_close(), Some(dec!(190.5)));
        assert!(cache.get(&key("MSFT"), HOUR).await.is_none());
    }

    #[tokio::test]
    async fn test_disk_survives_restart_and_promotes() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FixedClock(start()));

        cache_in(dir.path(), clock.clone())
            .put(key("AAPL"), series("AAPL", dec!(1)))
            .await
            .unwrap();

        let fresh = cache_in(dir.path(), clock);
        assert_eq!(fresh.stats().await.unwrap().memory_entries, 0);
        assert!(fresh.get(&key("AAPL"), HOUR).await.is_some());
        assert_eq!(fresh.stats().await.unwrap().memory_entries, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss_but_stale_hit() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache_in(dir.path(), clock.clone());

        cache.put(key("AAPL"), series("AAPL", dec!(1))).await.unwrap();
        clock.advance(ChronoDuration::days(2));

        assert!(cache.get(&key("AAPL"), 24 * HOUR).await.is_none());
        let stale = cache.get_stale(&key("AAPL")).await.unwrap();
        assert_eq!(stale.created_at, start());
    }

    #[tokio::test]
    async fn test_stale_prefers_newest_tier() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache_in(dir.path(), clock.clone());

        cache.put(key("AAPL"), series("AAPL", dec!(1))).await.unwrap();
        clock.advance(ChronoDuration::hours(3));

        // Another process refreshed the file
        let other = cache_in(dir.path(), clock.clone());
        other.put(key("AAPL"), series("AAPL", dec!(2))).await.unwrap();

        let stale = cache.get_stale(&key("AAPL")).await.unwrap();
        assert_eq!(stale.payload.latest_close(), Some(dec!(2)));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path(), Arc::new(FixedClock(start())));
        std::fs::write(dir.path().join(key("AAPL").file_name()), b"not json").unwrap();

        assert!(cache.get(&key("AAPL"), HOUR).await.is_none());
        assert!(cache.get_stale(&key("AAPL")).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_disk_write_still_serves_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        // A regular file where the cache directory should be
        let cache = cache_in(&blocker, Arc::new(FixedClock(start())));

        assert!(cache.put(key("AAPL"), series("AAPL", dec!(1))).await.is_err());
        assert!(cache.get(&key("AAPL"), HOUR).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path(), Arc::new(FixedClock(start())));
        let full = CacheKey::new("TIME_SERIES_DAILY", "AAPL", Interval::Daily, OutputSize::Full);

        cache.put(key("AAPL"), series("AAPL", dec!(1))).await.unwrap();
        cache.put(full.clone(), series("AAPL", dec!(1))).await.unwrap();
        cache.put(key("MSFT"), series("MSFT", dec!(1))).await.unwrap();

        assert!(cache.invalidate(&full).await.unwrap());
        assert!(!cache.invalidate(&full).await.unwrap());
        assert_eq!(cache.clear_symbol("AAPL").await.unwrap(), 1);
        assert!(cache.get(&key("AAPL"), HOUR).await.is_none());

        assert_eq!(cache.clear_all().await.unwrap(), 1);
        assert_eq!(cache.stats().await.unwrap(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_warm_loads_fresh_entries() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(start()));

        let writer = cache_in(dir.path(), clock.clone());
        writer.put(key("OLD"), series("OLD", dec!(1))).await.unwrap();
        clock.advance(ChronoDuration::hours(30));
        writer.put(key("NEW"), series("NEW", dec!(1))).await.unwrap();

        let cache = cache_in(dir.path(), clock);
        assert_eq!(cache.count_fresh(24 * HOUR).await.unwrap(), 1);
        assert_eq!(cache.stats().await.unwrap().memory_entries, 0);
        assert_eq!(cache.warm(24 * HOUR).await.unwrap(), 1);

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.memory_entries, 1);
        assert_eq!(stats.disk_entries, 2);
        assert!(stats.disk_bytes > 0);
    }
}
