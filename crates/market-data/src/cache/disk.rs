//! Durable per-key file store.

use market_core::error::CacheError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{CacheEntry, CacheKey};

/// Version of the on-disk envelope. Files with another version are misses.
pub const FORMAT_VERSION: u32 = 1;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    entry: CacheEntry,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    entry: &'a CacheEntry,
}

/// One JSON file per key under a directory.
///
/// Writes go to a unique temp file that is synced and then renamed over the
/// target, so readers see either the old entry or the new one. Within a
/// process, a write never replaces an entry created later than its own.
pub struct DiskTier {
    dir: PathBuf,
    reported: Mutex<HashSet<PathBuf>>,
    /// Held from the freshness check through the rename
    replace: tokio::sync::Mutex<()>,
}

impl DiskTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            reported: Mutex::new(HashSet::new()),
            replace: tokio::sync::Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read the entry for `key`. A missing file is `Ok(None)`.
    pub async fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if envelope.version != FORMAT_VERSION {
            return Err(CacheError::Corrupt {
                path,
                reason: format!("unsupported format version {}", envelope.version),
            });
        }
        if envelope.entry.key != *key {
            return Err(CacheError::Corrupt {
                path,
                reason: format!("holds key {}", envelope.entry.key),
            });
        }

        Ok(Some(envelope.entry))
    }

    /// Atomically replace the file for `entry.key`.
    pub async fn write(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CacheError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let bytes = serde_json::to_vec(&EnvelopeRef {
            version: FORMAT_VERSION,
            entry,
        })
        .map_err(|e| CacheError::Serialize(e.to_string()))?;

        let target = self.path_for(&entry.key);
        let temp = self.dir.join(format!(
            ".{}.{}-{}.tmp",
            entry.key.file_name(),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(source) = write_synced(&temp, &bytes).await {
            let _ = fs::remove_file(&temp).await;
            return Err(CacheError::Io { path: temp, source });
        }

        let _replace = self.replace.lock().await;
        if let Ok(Some(existing)) = self.read(&entry.key).await {
            if existing.created_at > entry.created_at {
                let _ = fs::remove_file(&temp).await;
                debug!(
                    key = %entry.key,
                    existing = %existing.created_at,
                    "Kept newer cache file"
                );
                return Ok(());
            }
        }

        if let Err(source) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(CacheError::Io {
                path: target,
                source,
            });
        }

        debug!(key = %entry.key, path = %target.display(), "Wrote cache file");
        Ok(())
    }

    /// Delete the file for `key`. Returns whether one existed.
    pub async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    /// Keys of all cache files, with their sizes in bytes.
    pub async fn list(&self) -> Result<Vec<(CacheKey, u64)>, CacheError> {
        let io_err = |source| CacheError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_err(source)),
        };

        let mut keys = Vec::new();
        while let Some(item) = dir.next_entry().await.map_err(io_err)? {
            let name = item.file_name();
            let Some(key) = name.to_str().and_then(CacheKey::from_file_name) else {
                continue;
            };
            let size = item.metadata().await.map(|m| m.len()).unwrap_or(0);
            keys.push((key, size));
        }
        Ok(keys)
    }

    /// Log an unreadable entry: `warn` the first time per file, `debug` after.
    pub fn report(&self, error: &CacheError) {
        let path = match error {
            CacheError::Io { path, .. } | CacheError::Corrupt { path, .. } => path.clone(),
            CacheError::Serialize(_) => {
                warn!(error = %error, "Cache entry unusable");
                return;
            }
        };

        let first = self
            .reported
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path);

        if first {
            warn!(error = %error, "Ignoring unreadable cache entry");
        } else {
            debug!(error = %error, "Ignoring unreadable cache entry");
        }
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use market_core::traits::OutputSize;
    use market_core::types::{DailyBar, Interval, TimeSeries};
    use rust_decimal_macros::dec;

    fn entry(symbol: &str) -> CacheEntry {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        CacheEntry {
            key: CacheKey::new(
                "TIME_SERIES_DAILY",
                symbol,
                Interval::Daily,
                OutputSize::Compact,
            ),
            payload: TimeSeries::from_bars(
                symbol,
                Interval::Daily,
                vec![DailyBar::new(date, dec!(1.5), dec!(2), dec!(1), dec!(1.75))
                    .with_volume(dec!(1000))],
            ),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(dir.path().join("nested"));
        let e = entry("EURUSD=X");

        tier.write(&e).await.unwrap();
        assert_eq!(tier.read(&e.key).await.unwrap(), Some(e.clone()));

        let names: Vec<_> = std::fs::read_dir(tier.dir())
            .unwrap()
            .map(|d| d.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![e.key.file_name()]);
    }

    #[tokio::test]
    async fn test_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(dir.path());

        assert_eq!(tier.read(&entry("AAPL").key).await.unwrap(), None);
        assert!(!tier.remove(&entry("AAPL").key).await.unwrap());
        assert!(tier.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(dir.path());
        let e = entry("AAPL");

        std::fs::write(tier.path_for(&e.key), b"{\"version\": 1, \"entry\":").unwrap();
        let err = tier.read(&e.key).await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { .. }));

        // Logged once, then quietly
        tier.report(&err);
        tier.report(&err);
        assert_eq!(tier.reported.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_version_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(dir.path());
        let e = entry("AAPL");

        let body = serde_json::json!({ "version": 99, "entry": e });
        std::fs::write(tier.path_for(&e.key), body.to_string()).unwrap();

        assert!(matches!(
            tier.read(&e.key).await,
            Err(CacheError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(dir.path());
        tier.write(&entry("AAPL")).await.unwrap();
        tier.write(&entry("MSFT")).await.unwrap();
        std::fs::write(dir.path().join("README.txt"), b"hello").unwrap();

        let mut keys: Vec<_> = tier
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|(k, size)| {
                assert!(size > 0);
                k.symbol
            })
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["AAPL", "MSFT"]);
    }

    #[tokio::test]
    async fn test_concurrent_writers_leave_one_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let tier = std::sync::Arc::new(DiskTier::new(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tier = tier.clone();
                tokio::spawn(async move {
                    let mut e = entry("AAPL");
                    e.created_at += chrono::Duration::seconds(i);
                    tier.write(&e).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let kept = tier.read(&entry("AAPL").key).await.unwrap().unwrap();
        assert_eq!(
            kept.created_at,
            entry("AAPL").created_at + chrono::Duration::seconds(7)
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_older_write_does_not_replace_newer_file() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(dir.path());
        let older = entry("AAPL");
        let mut newer = entry("AAPL");
        newer.created_at += chrono::Duration::minutes(5);

        tier.write(&newer).await.unwrap();
        tier.write(&older).await.unwrap();

        assert_eq!(tier.read(&older.key).await.unwrap(), Some(newer.clone()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        // Equal or later stamps still replace
        let mut latest = newer.clone();
        latest.created_at += chrono::Duration::minutes(1);
        tier.write(&latest).await.unwrap();
        assert_eq!(tier.read(&older.key).await.unwrap(), Some(latest));
    }
}
