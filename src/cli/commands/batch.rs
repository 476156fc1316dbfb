//! Batch fetch command implementation.

use anyhow::Result;
use market_config::AppConfig;
use tracing::info;

use super::{build_fetcher, save_json};
use crate::cli::{BatchArgs, OutputFormat};

pub async fn run(args: BatchArgs, config: &AppConfig) -> Result<()> {
    info!("Fetching {} symbols", args.symbols.len());

    let fetcher = build_fetcher(config).await?;
    let results = fetcher.fetch_many(&args.symbols, args.days, args.force).await;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Text => {
            println!(
                "{:<12} {:<10} {:>6} {:>14} {:<8}",
                "Symbol", "Source", "Bars", "Price", "Trend"
            );
            for result in &results {
                println!(
                    "{:<12} {:<10} {:>6} {:>14} {:<8}",
                    result.symbol.canonical,
                    result.provenance.to_string(),
                    result.series.len(),
                    result.derived.current_price.to_string(),
                    result.derived.trend.to_string()
                );
            }
        }
    }

    if let Some(save_path) = &args.save {
        save_json(&results, save_path)?;
    }

    Ok(())
}
