//! Feature datasets built from price history.

use serde::{Deserialize, Serialize};
use stockscope_core::error::ValidationError;
use stockscope_core::traits::{Indicator, MultiOutputIndicator};
use stockscope_core::types::Bar;
use stockscope_indicators::{BollingerBands, Macd, Rsi};

/// Feature columns produced by [`Dataset::from_bars`].
pub const FEATURE_NAMES: [&str; 5] = [
    "return_1d",
    "return_5d",
    "rsi",
    "macd_histogram",
    "bollinger_percent_b",
];

/// Chronologically ordered feature rows with up/down labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    feature_names: Vec<String>,
    rows: Vec<Vec<f64>>,
    labels: Vec<bool>,
    timestamps: Vec<i64>,
}

impl Dataset {
    /// Build from explicit rows. Timestamps default to row indices.
    pub fn new(
        feature_names: Vec<String>,
        rows: Vec<Vec<f64>>,
        labels: Vec<bool>,
    ) -> Result<Self, ValidationError> {
        if rows.len() != labels.len() {
            return Err(ValidationError::LengthMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        let timestamps = (0..rows.len() as i64).collect();
        Ok(Self {
            feature_names,
            rows,
            labels,
            timestamps,
        })
    }

    /// Features at each bar with a label of whether the close `horizon` bars
    /// later is higher. Bars without full indicator history or without a
    /// future close are skipped.
    pub fn from_bars(bars: &[Bar], horizon: usize) -> Self {
        let mut dataset = Self {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        };
        if horizon == 0 {
            return dataset;
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        for (i, features) in feature_rows(&closes).into_iter().enumerate() {
            let future = i.checked_add(horizon).and_then(|j| closes.get(j));
            let (Some(features), Some(future)) = (features, future) else {
                continue;
            };
            dataset.rows.push(features);
            dataset.labels.push(*future > closes[i]);
            dataset.timestamps.push(bars[i].timestamp);
        }

        dataset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// Share of positive labels; 0 when empty.
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&l| l).count() as f64 / self.labels.len() as f64
    }

    /// Rows at the given indices, in the given order. Out-of-range indices
    /// are skipped.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        let mut out = Dataset {
            feature_names: self.feature_names.clone(),
            ..Dataset::default()
        };
        for &i in indices {
            if let (Some(row), Some(&label)) = (self.rows.get(i), self.labels.get(i)) {
                out.rows.push(row.clone());
                out.labels.push(label);
                out.timestamps.push(self.timestamps.get(i).copied().unwrap_or(i as i64));
            }
        }
        out
    }
}

/// Feature row for the most recent bar, if enough history exists.
pub fn latest_features(bars: &[Bar]) -> Option<Vec<f64>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    feature_rows(&closes).pop().flatten()
}

/// One optional feature row per close, aligned to the input.
fn feature_rows(closes: &[f64]) -> Vec<Option<Vec<f64>>> {
    let n = closes.len();
    let rsi = align(Rsi::default().calculate(closes), n);
    let macd = align(Macd::default().calculate(closes), n);
    let bollinger = align(BollingerBands::default().calculate(closes), n);

    (0..n)
        .map(|i| {
            if i < 5 || closes[i - 1] <= 0.0 || closes[i - 5] <= 0.0 || closes[i] <= 0.0 {
                return None;
            }
            let rsi = rsi[i]?;
            let macd = macd[i]?;
            let bb = bollinger[i]?;
            Some(vec![
                closes[i] / closes[i - 1] - 1.0,
                closes[i] / closes[i - 5] - 1.0,
                rsi / 100.0,
                macd.histogram / closes[i],
                bb.percent_b,
            ])
        })
        .collect()
}

/// Indicator outputs end at the last input; pad the front with `None`.
fn align<T: Copy>(values: Vec<T>, n: usize) -> Vec<Option<T>> {
    let offset = n.saturating_sub(values.len());
    let mut out = vec![None; offset];
    out.extend(values.into_iter().take(n - offset).map(Some));
    out
}
