//! Cross-validation command.

use anyhow::{bail, Result};
use stockscope_config::{AppConfig, StrategyKind};
use stockscope_data::load_csv;
use stockscope_validation::{Dataset, EvaluationReport, ModelEvaluator, RuleBasedPredictor, SplitStrategy};
use tracing::info;

use crate::cli::{print_output, CrossValidateArgs, OutputFormat, StrategyArg};

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Expanding => StrategyKind::Expanding,
            StrategyArg::WalkForward => StrategyKind::WalkForward,
            StrategyArg::Purged => StrategyKind::Purged,
        }
    }
}

fn resolve_strategy(args: &CrossValidateArgs, config: &AppConfig) -> SplitStrategy {
    let mut settings = config.validation.clone();
    if let Some(splits) = args.splits {
        settings.n_splits = splits;
    }
    let kind = args.strategy.map(StrategyKind::from).unwrap_or(settings.strategy);
    settings.strategy(kind)
}

pub fn run(args: CrossValidateArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let bars = load_csv(&args.data)?;
    let horizon = args.horizon.unwrap_or(config.validation.horizon).max(1);
    let dataset = Dataset::from_bars(&bars, horizon);
    if dataset.is_empty() {
        bail!(
            "{} bars are not enough to build features with a {}-bar horizon",
            bars.len(),
            horizon
        );
    }

    let strategy = resolve_strategy(&args, config);
    info!(
        samples = dataset.len(),
        strategy = strategy.name(),
        positive_rate = dataset.positive_rate(),
        "Cross-validating"
    );

    let mut classifier = RuleBasedPredictor::new(config.technical.clone());
    let report = ModelEvaluator::new().evaluate(&mut classifier, &dataset, &strategy);
    print_output(output, &report, print_report)
}

fn print_report(r: &EvaluationReport) {
    println!("{} on {} samples, {} split", r.classifier, r.samples, r.strategy);
    println!("{:<6} {:>7} {:>6} {:>9} {:>10} {:>8} {:>6}", "Fold", "Train", "Test", "Accuracy", "Precision", "Recall", "F1");
    for f in &r.folds {
        println!(
            "{:<6} {:>7} {:>6} {:>9.3} {:>10.3} {:>8.3} {:>6.3}",
            f.fold,
            f.train_size,
            f.test_size,
            f.metrics.accuracy,
            f.metrics.precision,
            f.metrics.recall,
            f.metrics.f1
        );
    }
    for (name, m) in [
        ("Accuracy", r.accuracy),
        ("Precision", r.precision),
        ("Recall", r.recall),
        ("F1", r.f1),
    ] {
        println!("{:<10} {:.3} ± {:.3}", name, m.mean, m.std);
    }
    for warning in &r.warnings {
        println!("! {}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(strategy: Option<StrategyArg>, splits: Option<usize>) -> CrossValidateArgs {
        CrossValidateArgs {
            data: PathBuf::from("bars.csv"),
            strategy,
            splits,
            horizon: None,
        }
    }

    #[test]
    fn test_strategy_defaults_to_config() {
        let config = AppConfig::default();
        assert_eq!(resolve_strategy(&args(None, None), &config), SplitStrategy::expanding(5));
    }

    #[test]
    fn test_strategy_overrides() {
        let config = AppConfig::default();
        assert_eq!(
            resolve_strategy(&args(Some(StrategyArg::Purged), Some(3)), &config),
            SplitStrategy::purged_k_fold(3, 5)
        );
    }
}
