//! Position size command.

use anyhow::Result;
use stockscope_config::AppConfig;
use stockscope_risk::RiskCalculator;

use super::pct;
use crate::cli::{print_output, OutputFormat, PositionSizeArgs};

pub fn run(args: PositionSizeArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let calculator = RiskCalculator::new(config.risk.clone());
    let size = calculator.position_size(args.win_rate, args.avg_win, args.avg_loss, args.tolerance);

    print_output(output, &size, |size| {
        println!("Tolerance:      {}", size.risk_tolerance);
        println!("Win rate:       {}", pct(size.win_rate));
        println!("Win/loss ratio: {}", size.win_loss_ratio.round_dp(2));
        println!("Kelly fraction: {}", pct(size.kelly_fraction));
        println!("Recommended:    {}", pct(size.recommended_position));
        println!("Maximum:        {}", pct(size.max_position));

        if let Some(capital) = args.capital {
            println!("Allocation:     {}", size.allocation(capital).round_dp(2));
            if let Some(price) = args.price {
                println!("Shares:         {}", size.shares(capital, price));
            }
        }
    })
}
