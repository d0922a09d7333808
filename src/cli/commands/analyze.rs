//! Technical analysis command.

use anyhow::{bail, Result};
use serde::Serialize;
use stockscope_config::AppConfig;
use stockscope_core::types::{Bar, Fundamentals};
use stockscope_data::load_csv;
use stockscope_indicators::{TechnicalAnalyzer, TechnicalIndicators};
use stockscope_risk::{RiskCalculator, StopLossTarget};
use stockscope_validation::Prediction;
use tracing::info;

use super::stop_loss::print_target;
use crate::cli::{build_market_data, build_predictor, print_output, AnalyzeArgs, OutputFormat};

#[derive(Serialize)]
struct AnalysisReport {
    symbol: String,
    bars: usize,
    technical: TechnicalIndicators,
    stop_loss: StopLossTarget,
    prediction: Prediction,
    fundamentals: Option<Fundamentals>,
    valuation_score: Option<f64>,
}

pub async fn run(args: AnalyzeArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let (symbol, bars, fundamentals) = match (&args.data, &args.symbol) {
        (Some(path), _) => {
            let symbol = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_uppercase())
                .unwrap_or_else(|| "DATA".to_string());
            (symbol, load_csv(path)?, None)
        }
        (None, Some(symbol)) => {
            let service = build_market_data(config)?;
            let bars = service.recent_history(symbol, args.days).await;
            let fundamentals = service.fundamentals(symbol).await;
            (symbol.to_uppercase(), bars, fundamentals)
        }
        (None, None) => bail!("Provide --data or --symbol"),
    };
    if bars.is_empty() {
        bail!("No history available for {}", symbol);
    }
    info!(%symbol, bars = bars.len(), "Analyzing");

    let report = analyze(&symbol, &bars, fundamentals, config).await;
    print_output(output, &report, print_report)
}

async fn analyze(
    symbol: &str,
    bars: &[Bar],
    fundamentals: Option<Fundamentals>,
    config: &AppConfig,
) -> AnalysisReport {
    let technical = TechnicalAnalyzer::new(config.technical.clone()).analyze(bars);
    let stop_loss = RiskCalculator::new(config.risk.clone()).stop_loss_from_bars(bars);
    let prediction = build_predictor(config).await.predict(symbol, bars).await;

    AnalysisReport {
        symbol: symbol.to_string(),
        bars: bars.len(),
        valuation_score: fundamentals.as_ref().map(|f| f.valuation_score()),
        technical,
        stop_loss,
        prediction,
        fundamentals,
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn print_report(r: &AnalysisReport) {
    let t = &r.technical;
    println!("{} ({} bars)", r.symbol, r.bars);
    println!("Score:       {:.1}  {:?}  {:?}", t.score, t.signal, t.trend);
    println!("Price:       {}", fmt_opt(t.price));
    println!("RSI:         {}", fmt_opt(t.rsi));
    if let Some(m) = t.macd {
        println!("MACD:        {:.2} / {:.2} (hist {:.2})", m.macd, m.signal, m.histogram);
    }
    if let Some(kd) = t.kd {
        println!("KD:          {:.2} / {:.2}", kd.k, kd.d);
    }
    println!(
        "MA:          {} / {} / {}",
        fmt_opt(t.ma_short),
        fmt_opt(t.ma_mid),
        fmt_opt(t.ma_long)
    );
    if let Some(b) = t.bollinger {
        println!("Bollinger:   {:.2} - {:.2} (%B {:.2})", b.lower, b.upper, b.percent_b);
    }
    println!("ATR:         {}", fmt_opt(t.atr));
    println!(
        "Volatility:  {} annualized",
        t.annualized_volatility
            .map(|v| format!("{:.1}%", v * 100.0))
            .unwrap_or_else(|| "-".to_string())
    );
    for reason in &t.reasons {
        println!("  - {}", reason);
    }

    println!();
    print_target(&r.stop_loss);

    println!();
    println!(
        "Prediction:  {:?} ({:.0}% via {})",
        r.prediction.direction,
        r.prediction.confidence * 100.0,
        r.prediction.source
    );
    if let Some(f) = &r.fundamentals {
        println!(
            "Valuation:   P/E {}  P/B {}  yield {}  score {}",
            fmt_opt(f.pe_ratio),
            fmt_opt(f.pb_ratio),
            fmt_opt(f.dividend_yield),
            fmt_opt(r.valuation_score)
        );
    }
}
