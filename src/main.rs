//! Market data, technical scoring and risk sizing CLI.

mod cli;
mod logging;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use logging::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli::load_app_config(&cli.config)?;

    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json_logs || config.logging.format.eq_ignore_ascii_case("json");
    // Dropping the guard flushes the file writer
    let _guard = setup_logging(&level, json, config.logging.file.as_deref())?;

    let output = cli.output;
    match cli.command {
        Commands::StopLoss(args) => cli::commands::stop_loss::run(args, &config, output).await,
        Commands::PositionSize(args) => cli::commands::position_size::run(args, &config, output),
        Commands::Portfolio(args) => cli::commands::portfolio::run(args, &config, output),
        Commands::Analyze(args) => cli::commands::analyze::run(args, &config, output).await,
        Commands::Quote(args) => cli::commands::quote::run(args, &config, output).await,
        Commands::Institutional(args) => {
            cli::commands::institutional::run(args, &config, output).await
        }
        Commands::CrossValidate(args) => cli::commands::cross_validate::run(args, &config, output),
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config, &config),
    }
}
