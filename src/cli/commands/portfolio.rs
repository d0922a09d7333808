//! Portfolio risk command.

use anyhow::{Context, Result};
use stockscope_config::AppConfig;
use stockscope_data::CsvDataSource;
use stockscope_risk::RiskCalculator;

use crate::cli::{print_output, OutputFormat, PortfolioArgs};

pub fn run(args: PortfolioArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let holdings = CsvDataSource::new(&args.holdings)
        .and_then(|source| source.load_holdings())
        .with_context(|| format!("Failed to read holdings from {}", args.holdings.display()))?;

    let calculator = RiskCalculator::new(config.risk.clone());
    let risk = calculator.portfolio_risk(&holdings);

    print_output(output, &risk, |risk| {
        println!("Total value:      {}", risk.total_value.round_dp(2));
        println!("Holdings:         {}", risk.holding_count);
        println!(
            "Largest holding:  {} ({}%)",
            risk.largest_holding.as_deref().unwrap_or("-"),
            risk.max_single_exposure
        );
        println!("Diversification:  {} ({:?} risk)", risk.diversification_score, risk.risk_level);
        println!("Sectors:");
        for (sector, weight) in &risk.sector_exposure {
            println!("  {:<20} {}%", sector, weight);
        }
        for warning in &risk.warnings {
            println!("! {}", warning);
        }
        for recommendation in &risk.recommendations {
            println!("- {}", recommendation);
        }
    })
}
