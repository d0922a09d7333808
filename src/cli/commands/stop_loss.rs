//! Stop-loss command.

use anyhow::{bail, Result};
use stockscope_config::AppConfig;
use stockscope_data::load_csv;
use stockscope_risk::{RiskCalculator, StopLossTarget};
use tracing::info;

use super::pct;
use crate::cli::{build_market_data, print_output, OutputFormat, StopLossArgs};

pub async fn run(args: StopLossArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let calculator = RiskCalculator::new(config.risk.clone());

    let target = if let Some(path) = &args.data {
        let bars = load_csv(path)?;
        info!(bars = bars.len(), "Deriving stop-loss from {}", path.display());
        calculator.stop_loss_from_bars(&bars)
    } else if let Some(symbol) = &args.symbol {
        let service = build_market_data(config)?;
        let bars = service.recent_history(symbol, args.days).await;
        if bars.is_empty() {
            bail!("No history available for {}", symbol);
        }
        calculator.stop_loss_from_bars(&bars)
    } else {
        let price = args.price.unwrap_or_default();
        calculator.stop_loss(price, args.atr, args.volatility)
    };

    print_output(output, &target, print_target)
}

pub(crate) fn print_target(target: &StopLossTarget) {
    println!("Entry:        {}", target.entry_price);
    println!(
        "Stop-loss:    {} (-{}, {:?})",
        target.stop_loss_price,
        pct(target.stop_loss_pct),
        target.basis
    );
    for (i, t) in target.targets.iter().enumerate() {
        println!("Target {}:     {} ({}R)", i + 1, t.price, t.ratio);
    }
    println!("Risk/reward:  {}", target.risk_reward_ratio);
}
