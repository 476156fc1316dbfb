//! Cache maintenance command implementation.

use anyhow::{Context, Result};
use market_config::AppConfig;
use market_core::traits::SystemClock;
use market_data::{normalize, TwoTierCache};
use std::sync::Arc;

use crate::cli::{CacheAction, CacheArgs};

pub async fn run(args: CacheArgs, config: &AppConfig) -> Result<()> {
    let cache_config = config.cache.to_cache_config();
    let memory_ttl = cache_config.memory_ttl;
    let cache = TwoTierCache::new(cache_config, Arc::new(SystemClock));

    match args.action {
        CacheAction::Stats => {
            let stats = cache.stats().await.context("Failed to read cache")?;
            println!("Directory:     {}", cache.disk().dir().display());
            println!("Disk entries:  {}", stats.disk_entries);
            println!("Disk size:     {} bytes", stats.disk_bytes);
        }
        CacheAction::Clear => {
            let removed = cache.clear_all().await.context("Failed to clear cache")?;
            println!("Removed {} cached entries", removed);
        }
        CacheAction::ClearSymbol { symbol } => {
            let symbol = normalize(&symbol);
            let removed = cache
                .clear_symbol(&symbol.canonical)
                .await
                .context("Failed to clear cache")?;
            println!("Removed {} cached entries for {}", removed, symbol);
        }
        CacheAction::Fresh => {
            let fresh = cache
                .count_fresh(memory_ttl)
                .await
                .context("Failed to read cache")?;
            println!("{} entries fresh", fresh);
        }
    }

    Ok(())
}
