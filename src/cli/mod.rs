//! CLI definitions.

pub mod commands;
mod context;

pub use context::{build_market_data, build_predictor, load_app_config, print_output};

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use stockscope_risk::RiskTolerance;

#[derive(Parser)]
#[command(name = "stockscope")]
#[command(author, version, about = "Stock data aggregation, technical scoring and risk sizing")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level (defaults to logging.level from the config)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub output: OutputFormat,

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
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stop-loss price and profit targets
    StopLoss(StopLossArgs),
    /// Kelly position size from trade statistics
    PositionSize(PositionSizeArgs),
    /// Concentration and diversification of a portfolio
    Portfolio(PortfolioArgs),
    /// Technical indicators, composite score and prediction
    Analyze(AnalyzeArgs),
    /// Latest quote through the provider chain
    Quote(QuoteArgs),
    /// Foreign / investment trust / dealer net buying
    Institutional(InstitutionalArgs),
    /// Cross-validate the rule-based classifier on history
    CrossValidate(CrossValidateArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct StopLossArgs {
    /// Entry price
    #[arg(short, long, required_unless_present_any = ["data", "symbol"])]
    pub price: Option<Decimal>,

    /// Average true range
    #[arg(long)]
    pub atr: Option<Decimal>,

    /// Daily return volatility as a fraction (0.02 = 2%)
    #[arg(long)]
    pub volatility: Option<Decimal>,

    /// Derive price, ATR and volatility from a CSV of daily bars
    #[arg(long, conflicts_with_all = ["price", "symbol"])]
    pub data: Option<PathBuf>,

    /// Derive price, ATR and volatility from fetched history
    #[arg(short, long, conflicts_with = "price")]
    pub symbol: Option<String>,

    /// Calendar days of history to fetch with --symbol
    #[arg(long, default_value = "120")]
    pub days: u32,
}

#[derive(clap::Args)]
pub struct PositionSizeArgs {
    /// Fraction of winning trades (0-1)
    #[arg(short, long)]
    pub win_rate: Decimal,

    /// Average winning trade
    #[arg(long)]
    pub avg_win: Decimal,

    /// Average losing trade (positive)
    #[arg(long)]
    pub avg_loss: Decimal,

    /// conservative, moderate or aggressive
    #[arg(short, long, default_value = "moderate")]
    pub tolerance: RiskTolerance,

    /// Capital to size against
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Share price, to report a share count with --capital
    #[arg(long, requires = "capital")]
    pub price: Option<Decimal>,
}

#[derive(clap::Args)]
pub struct PortfolioArgs {
    /// CSV with symbol, name, market_value, industry columns
    #[arg(long)]
    pub holdings: PathBuf,
}

#[derive(clap::Args)]
pub struct AnalyzeArgs {
    /// CSV of daily bars
    #[arg(long, required_unless_present = "symbol", conflicts_with = "symbol")]
    pub data: Option<PathBuf>,

    /// Symbol to fetch (2330, 6488.TWO, AAPL)
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Calendar days of history to fetch
    #[arg(long, default_value = "180")]
    pub days: u32,
}

#[derive(clap::Args)]
pub struct QuoteArgs {
    /// Symbols (comma-separated)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub symbol: Vec<String>,
}

#[derive(clap::Args)]
pub struct InstitutionalArgs {
    /// Taiwan stock code
    #[arg(short, long)]
    pub symbol: String,

    /// Calendar days to look back
    #[arg(long, default_value = "30")]
    pub days: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    Expanding,
    WalkForward,
    Purged,
}

#[derive(clap::Args)]
pub struct CrossValidateArgs {
    /// CSV of daily bars
    #[arg(long)]
    pub data: PathBuf,

    /// Splitter (defaults to validation.strategy from the config)
    #[arg(long)]
    pub strategy: Option<StrategyArg>,

    /// Number of folds for expanding and purged splits
    #[arg(long)]
    pub splits: Option<usize>,

    /// Bars ahead the up/down label looks
    #[arg(long)]
    pub horizon: Option<usize>,
}
