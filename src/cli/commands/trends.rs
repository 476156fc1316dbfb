//! Market trends command implementation.

use anyhow::Result;
use market_config::AppConfig;
use market_data::MarketAnalyzer;

use super::build_fetcher;
use crate::cli::{OutputFormat, TrendsArgs};

pub async fn run(args: TrendsArgs, config: &AppConfig) -> Result<()> {
    let fetcher = build_fetcher(config).await?;
    let analyzer = MarketAnalyzer::new(fetcher);

    let Some(summary) = analyzer.trends(&args.symbols, args.force).await else {
        anyhow::bail!("No symbols given");
    };

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            println!("Overall:  {}", summary.overall);
            println!("Symbols:  {}", summary.total_symbols);
            println!("Bullish:  {:.2}%", summary.bullish_percentage);
            println!("Bearish:  {:.2}%", summary.bearish_percentage);
            println!("Neutral:  {:.2}%", summary.neutral_percentage);
        }
    }

    Ok(())
}
