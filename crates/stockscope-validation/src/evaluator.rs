//! Cross-validated classifier evaluation.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use stockscope_core::error::ValidationError;
use tracing::{debug, warn};

use crate::dataset::Dataset;
use crate::metrics::ClassificationMetrics;
use crate::split::SplitStrategy;

/// A trainable up/down classifier.
pub trait Classifier: Send {
    fn name(&self) -> &str;

    /// Train on a chronological slice.
    fn fit(&mut self, train: &Dataset) -> Result<(), ValidationError>;

    /// One prediction per row of `data`.
    fn predict(&self, data: &Dataset) -> Result<Vec<bool>, ValidationError>;
}

/// Scores for a single fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldScore {
    pub fold: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub metrics: ClassificationMetrics,
}

/// Mean and sample standard deviation of one metric across folds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
}

impl MetricSummary {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let std = if values.len() > 1 { values.iter().std_dev() } else { 0.0 };
        Self {
            mean: values.iter().mean(),
            std,
        }
    }
}

/// Aggregated cross-validation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub classifier: String,
    pub strategy: String,
    pub samples: usize,
    pub folds: Vec<FoldScore>,
    pub accuracy: MetricSummary,
    pub precision: MetricSummary,
    pub recall: MetricSummary,
    pub f1: MetricSummary,
    pub warnings: Vec<String>,
}

impl EvaluationReport {
    pub fn fold_count(&self) -> usize {
        self.folds.len()
    }
}

/// Runs a classifier over every fold of a split strategy.
#[derive(Debug, Clone, Default)]
pub struct ModelEvaluator;

impl ModelEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Fit and score `classifier` on each fold. Folds whose training or
    /// prediction fails are skipped with a warning.
    pub fn evaluate(
        &self,
        classifier: &mut dyn Classifier,
        dataset: &Dataset,
        strategy: &SplitStrategy,
    ) -> EvaluationReport {
        let mut warnings = Vec::new();
        let mut folds = Vec::new();

        for split in strategy.split(dataset.len()) {
            let train = dataset.subset(&split.train);
            let test = dataset.subset(&split.test);

            if let Err(e) = classifier.fit(&train) {
                warn!(fold = split.fold, error = %e, "Fold training failed");
                warnings.push(format!("Fold {}: {}", split.fold, e));
                continue;
            }
            let predictions = match classifier.predict(&test) {
                Ok(p) => p,
                Err(e) => {
                    warn!(fold = split.fold, error = %e, "Fold prediction failed");
                    warnings.push(format!("Fold {}: {}", split.fold, e));
                    continue;
                }
            };

            let metrics = ClassificationMetrics::compute(test.labels(), &predictions);
            debug!(
                fold = split.fold,
                train = train.len(),
                test = test.len(),
                accuracy = metrics.accuracy,
                "Fold scored"
            );
            folds.push(FoldScore {
                fold: split.fold,
                train_size: train.len(),
                test_size: test.len(),
                metrics,
            });
        }

        if folds.is_empty() {
            warnings.push(format!(
                "No folds evaluated: {} samples is not enough for {}",
                dataset.len(),
                strategy.name()
            ));
        }

        let per_fold = |f: fn(&ClassificationMetrics) -> f64| -> Vec<f64> {
            folds.iter().map(|s| f(&s.metrics)).collect()
        };
        let accuracy = MetricSummary::from_values(&per_fold(|m| m.accuracy));
        let precision = MetricSummary::from_values(&per_fold(|m| m.precision));
        let recall = MetricSummary::from_values(&per_fold(|m| m.recall));
        let f1 = MetricSummary::from_values(&per_fold(|m| m.f1));

        EvaluationReport {
            classifier: classifier.name().to_string(),
            strategy: strategy.name().to_string(),
            samples: dataset.len(),
            folds,
            accuracy,
            precision,
            recall,
            f1,
            warnings,
        }
    }
}
