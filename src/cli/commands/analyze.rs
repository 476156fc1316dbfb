//! Analyze command implementation.

use anyhow::Result;
use market_config::AppConfig;
use market_data::{MarketAnalysis, MarketAnalyzer};
use tracing::info;

use super::{build_fetcher, join_prices, save_json};
use crate::cli::{AnalyzeArgs, OutputFormat};

pub async fn run(args: AnalyzeArgs, config: &AppConfig) -> Result<()> {
    info!("Analyzing {}", args.symbol);

    let fetcher = build_fetcher(config).await?;
    let analyzer = MarketAnalyzer::new(fetcher).with_lookback_days(args.days);
    let analysis = analyzer.analyze(&args.symbol, args.force).await;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => println!("{}", report(&analysis)),
    }

    if let Some(save_path) = &args.save {
        save_json(&analysis, save_path)?;
    }

    Ok(())
}

fn report(analysis: &MarketAnalysis) -> String {
    let ind = &analysis.indicators;
    let mut out = format!(
        "{} ({})\n\
         Price:       {}\n\
         Trend:       {} (slope {:.4})\n\
         Support:     {}\n\
         Resistance:  {}\n\n\
         RSI(14):     {:.2}\n\
         MACD:        {:.4} / signal {:.4} / hist {:.4}\n\
         SMA 20/50/200: {:.2} / {:.2} / {:.2}\n\n\
         Predictions:\n",
        analysis.symbol.canonical,
        analysis.provenance,
        analysis.current_price,
        analysis.trend,
        analysis.slope,
        join_prices(&analysis.support),
        join_prices(&analysis.resistance),
        ind.rsi,
        ind.macd,
        ind.macd_signal,
        ind.macd_hist,
        ind.sma20,
        ind.sma50,
        ind.sma200,
    );
    for prediction in &analysis.predictions {
        out.push_str(&format!("  {}  {:.2}\n", prediction.date, prediction.price));
    }
    out
}
