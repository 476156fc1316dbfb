//! Fetch command implementation.

use anyhow::Result;
use market_config::AppConfig;
use market_data::{FetchRequest, FetchResult};
use tracing::info;

use super::{build_fetcher, join_prices, save_json};
use crate::cli::{FetchArgs, OutputFormat};

/// Bars listed in the text output.
const RECENT_BARS: usize = 10;

pub async fn run(args: FetchArgs, config: &AppConfig) -> Result<()> {
    info!("Fetching {} ({} days)", args.symbol, args.days);

    let fetcher = build_fetcher(config).await?;
    let request = FetchRequest::new(&args.symbol, args.days)
        .with_interval(args.interval)
        .force_refresh(args.force);
    let result = fetcher.fetch(&request).await;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => println!("{}", summary(&result)),
    }

    if let Some(save_path) = &args.save {
        save_json(&result, save_path)?;
    }

    Ok(())
}

fn summary(result: &FetchResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} [{}] {} bars, {}\n",
        result.symbol.canonical,
        result.symbol.class,
        result.series.len(),
        result.provenance
    ));
    out.push_str(&format!("As of:       {}\n", result.as_of.format("%Y-%m-%d %H:%M UTC")));
    out.push_str(&format!("Price:       {}\n", result.derived.current_price));
    out.push_str(&format!(
        "Trend:       {} (slope {:.4})\n",
        result.derived.trend, result.derived.slope
    ));
    out.push_str(&format!("Support:     {}\n", join_prices(&result.derived.support)));
    out.push_str(&format!("Resistance:  {}\n", join_prices(&result.derived.resistance)));

    out.push_str("\nDate        Open        High        Low         Close\n");
    let skip = result.series.len().saturating_sub(RECENT_BARS);
    for bar in result.series.iter().skip(skip) {
        out.push_str(&format!(
            "{}  {:<10}  {:<10}  {:<10}  {}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close
        ));
    }
    out
}
