//! Time-series model validation.
//!
//! Chronological splitters that avoid look-ahead bias, classification
//! metrics, a cross-validated evaluator, and the direction predictors used
//! by the analysis commands.

pub mod dataset;
pub mod evaluator;
pub mod metrics;
pub mod predictor;
pub mod split;

pub use dataset::{latest_features, Dataset, FEATURE_NAMES};
pub use evaluator::{Classifier, EvaluationReport, FoldScore, MetricSummary, ModelEvaluator};
pub use metrics::ClassificationMetrics;
pub use predictor::{
    select_predictor, BackendPrediction, Direction, HttpModelBackend, MlPredictor, ModelBackend,
    Prediction, Predictor, RuleBasedPredictor,
};
pub use split::{Split, SplitStrategy};
