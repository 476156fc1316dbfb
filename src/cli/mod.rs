//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use market_core::types::Interval;
use std::path::PathBuf;

/// Longest lookback accepted on the command line, about a century.
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

#[derive(Parser)]
#[command(name = "market")]
#[command(author, version, about = "Cached, rate-limited market quote fetcher")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level, overrides `logging.level`
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch price history for one symbol
    Fetch(FetchArgs),
    /// Technical analysis and short-term predictions for one symbol
    Analyze(AnalyzeArgs),
    /// Fetch several symbols concurrently
    Batch(BatchArgs),
    /// Bullish/bearish breakdown across a watchlist
    Trends(TrendsArgs),
    /// Inspect or clear the quote cache
    Cache(CacheArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct FetchArgs {
    /// Ticker, index or currency pair (e.g. AAPL, ^GSPC, EUR/USD)
    pub symbol: String,

    /// Calendar days of history, 0 for everything available
    #[arg(
        short,
        long,
        default_value = "30",
        value_parser = clap::value_parser!(u32).range(0..=MAX_LOOKBACK_DAYS)
    )]
    pub days: u32,

    /// Bar interval (daily, weekly, monthly)
    #[arg(short, long, default_value = "daily")]
    pub interval: Interval,

    /// Bypass the cache
    #[arg(long)]
    pub force: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,

    /// Save the result as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct AnalyzeArgs {
    /// Ticker, index or currency pair
    pub symbol: String,

    /// Calendar days of history to analyse
    #[arg(
        short,
        long,
        default_value = "30",
        value_parser = clap::value_parser!(u32).range(0..=MAX_LOOKBACK_DAYS)
    )]
    pub days: u32,

    /// Bypass the cache
    #[arg(long)]
    pub force: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,

    /// Save the analysis as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct BatchArgs {
    /// Symbols to fetch (comma-separated)
    #[arg(short = 'S', long, value_delimiter = ',', required = true)]
    pub symbols: Vec<String>,

    /// Calendar days of history
    #[arg(
        short,
        long,
        default_value = "30",
        value_parser = clap::value_parser!(u32).range(0..=MAX_LOOKBACK_DAYS)
    )]
    pub days: u32,

    /// Bypass the cache
    #[arg(long)]
    pub force: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,

    /// Save the results as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct TrendsArgs {
    /// Watchlist (comma-separated)
    #[arg(short = 'S', long, value_delimiter = ',', required = true)]
    pub symbols: Vec<String>,

    /// Bypass the cache
    #[arg(long)]
    pub force: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Entry counts and disk usage
    Stats,
    /// Remove every cached entry
    Clear,
    /// Remove the entries of one symbol
    ClearSymbol {
        /// Symbol in any accepted spelling
        symbol: String,
    },
    /// Count disk entries still fresh enough to be served
    Fresh,
}
