//! Market quote CLI application.

mod cli;
mod logging;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use logging::setup_logging;
use market_config::{load_config_or_default, LoggingConfig};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config_or_default(&cli.config);

    // Setup logging
    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_else(|_| LoggingConfig::default());
    let log_level = match cli.log_level {
        Some(level) => level.as_str().to_string(),
        None => logging.level.clone(),
    };
    let json = cli.json_logs || logging.format == "json";
    let _guard = setup_logging(&log_level, json, logging.file.as_deref().map(Path::new));

    // Execute command
    match cli.command {
        Commands::Fetch(args) => cli::commands::fetch::run(args, &config?).await,
        Commands::Analyze(args) => cli::commands::analyze::run(args, &config?).await,
        Commands::Batch(args) => cli::commands::batch::run(args, &config?).await,
        Commands::Trends(args) => cli::commands::trends::run(args, &config?).await,
        Commands::Cache(args) => cli::commands::cache::run(args, &config?).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
    }
}
