//! Direction predictors.
//!
//! [`RuleBasedPredictor`] is always available. [`MlPredictor`] delegates to a
//! [`ModelBackend`] and is only chosen when [`select_predictor`] finds the
//! backend healthy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stockscope_core::error::ValidationError;
use stockscope_core::types::Bar;
use stockscope_indicators::{AnalyzerConfig, Signal, TechnicalAnalyzer};
use tracing::{info, warn};

use crate::dataset::{latest_features, Dataset, FEATURE_NAMES};
use crate::evaluator::Classifier;

/// Predicted price direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "up" | "buy" | "bullish" => Direction::Up,
            "down" | "sell" | "bearish" => Direction::Down,
            _ => Direction::Neutral,
        }
    }
}

/// A direction call for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub symbol: String,
    pub direction: Direction,
    /// 0-1
    pub confidence: f64,
    /// Name of the predictor that produced this call
    pub source: String,
}

/// Produces a direction call from recent history.
#[async_trait]
pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    async fn predict(&self, symbol: &str, bars: &[Bar]) -> Prediction;
}

const RULE_BASED: &str = "rule_based";

/// Technical-score predictor. Needs no model and never fails.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedPredictor {
    analyzer: TechnicalAnalyzer,
    /// Training-set majority, used when the rules are neutral
    fallback_up: bool,
}

impl RuleBasedPredictor {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            analyzer: TechnicalAnalyzer::new(config),
            fallback_up: false,
        }
    }

    /// Synchronous prediction used by the async trait and the ML fallback.
    pub fn predict_bars(&self, symbol: &str, bars: &[Bar]) -> Prediction {
        let analysis = self.analyzer.analyze(bars);
        let direction = match analysis.signal {
            Signal::Buy => Direction::Up,
            Signal::Sell => Direction::Down,
            Signal::Hold => Direction::Neutral,
        };
        Prediction {
            symbol: symbol.to_string(),
            direction,
            confidence: ((analysis.score - 50.0).abs() / 50.0).clamp(0.0, 1.0),
            source: RULE_BASED.to_string(),
        }
    }

    /// Vote over one feature row laid out as in [`FEATURE_NAMES`].
    fn vote(&self, row: &[f64], index: &FeatureIndex) -> bool {
        let cfg = self.analyzer.config();
        let get = |i: Option<usize>| i.and_then(|i| row.get(i)).copied();
        let mut score = 0.0;

        if let Some(rsi) = get(index.rsi).map(|r| r * 100.0) {
            if rsi < cfg.rsi_oversold {
                score += 15.0;
            } else if rsi > cfg.rsi_overbought {
                score -= 15.0;
            }
        }
        if let Some(hist) = get(index.macd_histogram) {
            if hist > 0.0 {
                score += 10.0;
            } else if hist < 0.0 {
                score -= 10.0;
            }
        }
        if let Some(pb) = get(index.percent_b) {
            if pb < 0.0 {
                score += 10.0;
            } else if pb > 1.0 {
                score -= 10.0;
            }
        }
        if let Some(ret) = get(index.return_5d) {
            if ret > 0.0 {
                score += 5.0;
            } else if ret < 0.0 {
                score -= 5.0;
            }
        }

        if score > 0.0 {
            true
        } else if score < 0.0 {
            false
        } else {
            self.fallback_up
        }
    }
}

struct FeatureIndex {
    return_5d: Option<usize>,
    rsi: Option<usize>,
    macd_histogram: Option<usize>,
    percent_b: Option<usize>,
}

impl FeatureIndex {
    fn of(data: &Dataset) -> Self {
        Self {
            return_5d: data.feature_index(FEATURE_NAMES[1]),
            rsi: data.feature_index(FEATURE_NAMES[2]),
            macd_histogram: data.feature_index(FEATURE_NAMES[3]),
            percent_b: data.feature_index(FEATURE_NAMES[4]),
        }
    }
}

#[async_trait]
impl Predictor for RuleBasedPredictor {
    fn name(&self) -> &str {
        RULE_BASED
    }

    async fn predict(&self, symbol: &str, bars: &[Bar]) -> Prediction {
        self.predict_bars(symbol, bars)
    }
}

impl Classifier for RuleBasedPredictor {
    fn name(&self) -> &str {
        RULE_BASED
    }

    /// Rules are fixed; training only sets the tie-break class.
    fn fit(&mut self, train: &Dataset) -> Result<(), ValidationError> {
        self.fallback_up = train.positive_rate() >= 0.5;
        Ok(())
    }

    fn predict(&self, data: &Dataset) -> Result<Vec<bool>, ValidationError> {
        let index = FeatureIndex::of(data);
        Ok(data.rows().iter().map(|row| self.vote(row, &index)).collect())
    }
}

/// Raw answer from a model backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendPrediction {
    /// "up", "down" or "neutral"
    pub direction: String,
    pub confidence: f64,
}

/// An external model that can score a feature vector.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn backend_name(&self) -> &str;

    /// Capability probe.
    async fn health_check(&self) -> Result<(), ValidationError>;

    async fn predict(
        &self,
        symbol: &str,
        features: &[f64],
    ) -> Result<BackendPrediction, ValidationError>;
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    symbol: &'a str,
    feature_names: &'a [&'a str],
    features: &'a [f64],
}

/// Model service reached over HTTP (`GET /health`, `POST /predict`).
#[derive(Clone)]
pub struct HttpModelBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpModelBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ValidationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValidationError::BackendUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ModelBackend for HttpModelBackend {
    fn backend_name(&self) -> &str {
        "http"
    }

    async fn health_check(&self) -> Result<(), ValidationError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| ValidationError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ValidationError::BackendUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn predict(
        &self,
        symbol: &str,
        features: &[f64],
    ) -> Result<BackendPrediction, ValidationError> {
        let request = PredictRequest {
            symbol,
            feature_names: &FEATURE_NAMES,
            features,
        };

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ValidationError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ValidationError::Prediction(format!(
                "Status: {}",
                response.status()
            )));
        }

        response
            .json::<BackendPrediction>()
            .await
            .map_err(|e| ValidationError::Prediction(e.to_string()))
    }
}

/// Backend-driven predictor that falls back to the rules on any failure.
pub struct MlPredictor {
    backend: Arc<dyn ModelBackend>,
    fallback: RuleBasedPredictor,
}

impl MlPredictor {
    pub fn new(backend: Arc<dyn ModelBackend>, fallback: RuleBasedPredictor) -> Self {
        Self { backend, fallback }
    }
}

#[async_trait]
impl Predictor for MlPredictor {
    fn name(&self) -> &str {
        "ml"
    }

    async fn predict(&self, symbol: &str, bars: &[Bar]) -> Prediction {
        let Some(features) = latest_features(bars) else {
            return self.fallback.predict_bars(symbol, bars);
        };

        match self.backend.predict(symbol, &features).await {
            Ok(p) => Prediction {
                symbol: symbol.to_string(),
                direction: Direction::parse(&p.direction),
                confidence: p.confidence.clamp(0.0, 1.0),
                source: format!("ml:{}", self.backend.backend_name()),
            },
            Err(e) => {
                warn!(symbol, error = %e, "Model backend failed, using rule-based prediction");
                self.fallback.predict_bars(symbol, bars)
            }
        }
    }
}

/// Probe `backend` once and pick the predictor to use for this process.
pub async fn select_predictor(
    backend: Option<Arc<dyn ModelBackend>>,
    config: AnalyzerConfig,
) -> Box<dyn Predictor> {
    let rules = RuleBasedPredictor::new(config);
    let Some(backend) = backend else {
        info!("No model backend configured, using rule-based predictor");
        return Box::new(rules);
    };

    match backend.health_check().await {
        Ok(()) => {
            info!(backend = backend.backend_name(), "Model backend available");
            Box::new(MlPredictor::new(backend, rules))
        }
        Err(e) => {
            warn!(error = %e, "Model backend probe failed, using rule-based predictor");
            Box::new(rules)
        }
    }
}
