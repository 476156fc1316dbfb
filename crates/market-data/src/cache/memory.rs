//! In-process cache tier.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

use super::{CacheEntry, CacheKey};

struct Resident {
    entry: CacheEntry,
    /// When the entry entered this tier. Differs from `created_at` for
    /// entries promoted from disk.
    inserted_at: DateTime<Utc>,
}

/// Bounded key -> entry map.
///
/// An entry resides for at most `ttl` after insertion; past that it is
/// dropped on the next lookup. When full, inserting a new key evicts the
/// entry inserted longest ago.
pub struct MemoryTier {
    entries: Mutex<HashMap<CacheKey, Resident>>,
    ttl: Duration,
    capacity: usize,
}

impl MemoryTier {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Resident>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Memory cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn resident(&self, inserted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match (now - inserted_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }

    /// Entry for `key` if it is still resident.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<CacheEntry> {
        let mut entries = self.lock();
        let inserted_at = entries.get(key)?.inserted_at;

        if self.resident(inserted_at, now) {
            entries.get(key).map(|r| r.entry.clone())
        } else {
            debug!(key = %key, "Memory cache entry expired");
            entries.remove(key);
            None
        }
    }

    /// Entry for `key` regardless of residency.
    pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().get(key).map(|r| r.entry.clone())
    }

    pub fn insert(&self, entry: CacheEntry, now: DateTime<Utc>) {
        let mut entries = self.lock();

        if !entries.contains_key(&entry.key) && entries.len() >= self.capacity {
            entries.retain(|_, r| self.resident(r.inserted_at, now));

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, r)| r.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!(key = %oldest, "Evicting from memory cache");
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            entry.key.clone(),
            Resident {
                entry,
                inserted_at: now,
            },
        );
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove every entry for a canonical symbol.
    pub fn remove_symbol(&self, symbol: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|k, _| k.symbol != symbol);
        before - entries.len()
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
