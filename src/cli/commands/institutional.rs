//! Institutional flow command.

use anyhow::{bail, Result};
use serde::Serialize;
use stockscope_config::AppConfig;
use stockscope_core::types::{InstitutionalFlow, Market};

use crate::cli::{build_market_data, print_output, InstitutionalArgs, OutputFormat};

#[derive(Serialize)]
struct FlowReport {
    symbol: String,
    days: usize,
    foreign_net: i64,
    trust_net: i64,
    dealer_net: i64,
    total_net: i64,
    /// Consecutive most recent days with positive total net buying
    buy_streak: usize,
    flows: Vec<InstitutionalFlow>,
}

impl FlowReport {
    fn new(symbol: String, flows: Vec<InstitutionalFlow>) -> Self {
        let buy_streak = flows.iter().rev().take_while(|f| f.total_net() > 0).count();
        Self {
            symbol,
            days: flows.len(),
            foreign_net: flows.iter().map(|f| f.foreign_net).sum(),
            trust_net: flows.iter().map(|f| f.trust_net).sum(),
            dealer_net: flows.iter().map(|f| f.dealer_net).sum(),
            total_net: flows.iter().map(|f| f.total_net()).sum(),
            buy_streak,
            flows,
        }
    }
}

pub async fn run(args: InstitutionalArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    if !Market::infer(&args.symbol).is_taiwan() {
        bail!("Institutional flow is only published for Taiwan stocks");
    }
    let service = build_market_data(config)?;
    let flows = service.institutional_flow(&args.symbol, args.days).await;
    if flows.is_empty() {
        bail!("No institutional flow available for {}", args.symbol);
    }

    let report = FlowReport::new(Market::bare_symbol(&args.symbol), flows);
    print_output(output, &report, |r| {
        println!("{:<12} {:>14} {:>14} {:>14} {:>14}", "Date", "Foreign", "Trust", "Dealer", "Total");
        for f in &r.flows {
            println!(
                "{:<12} {:>14} {:>14} {:>14} {:>14}",
                f.date.to_string(),
                f.foreign_net,
                f.trust_net,
                f.dealer_net,
                f.total_net()
            );
        }
        println!(
            "{:<12} {:>14} {:>14} {:>14} {:>14}",
            format!("{} days", r.days),
            r.foreign_net,
            r.trust_net,
            r.dealer_net,
            r.total_net
        );
        println!("Net buying streak: {} day(s)", r.buy_streak);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn flow(day: u32, foreign: i64, trust: i64, dealer: i64) -> InstitutionalFlow {
        InstitutionalFlow {
            symbol: "2330".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            foreign_net: foreign,
            trust_net: trust,
            dealer_net: dealer,
        }
    }

    #[test]
    fn test_report_totals_and_streak() {
        let flows = vec![flow(2, 100, 0, 0), flow(3, -500, 0, 0), flow(4, 200, 10, -5), flow(5, 0, 30, 0)];
        let report = FlowReport::new("2330".to_string(), flows);

        assert_eq!(report.days, 4);
        assert_eq!(report.foreign_net, -200);
        assert_eq!(report.trust_net, 40);
        assert_eq!(report.total_net, -165);
        assert_eq!(report.buy_streak, 2);
    }
}
