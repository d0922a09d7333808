//! Quote command.

use anyhow::{bail, Result};
use stockscope_config::AppConfig;
use stockscope_core::types::StockQuote;

use crate::cli::{build_market_data, print_output, OutputFormat, QuoteArgs};

pub async fn run(args: QuoteArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let service = build_market_data(config)?;

    let mut quotes: Vec<StockQuote> = Vec::with_capacity(args.symbol.len());
    let mut missing = Vec::new();
    for symbol in &args.symbol {
        match service.quote(symbol).await {
            Some(quote) => quotes.push(quote),
            None => missing.push(symbol.as_str()),
        }
    }
    if quotes.is_empty() {
        bail!("No quotes available for {}", missing.join(", "));
    }

    print_output(output, &quotes, |quotes| {
        for q in quotes {
            let change = match (q.change(), q.change_percent()) {
                (Some(c), Some(p)) => format!("{:+.2} ({:+.2}%)", c, p),
                _ => "-".to_string(),
            };
            println!(
                "{:<8} {:<12} {:>10.2} {:>20}  [{} via {}]",
                q.symbol,
                q.name.as_deref().unwrap_or(""),
                q.price,
                change,
                q.market,
                q.source
            );
        }
    })?;

    for symbol in missing {
        eprintln!("No quote available for {}", symbol);
    }
    Ok(())
}
