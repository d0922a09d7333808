//! Valuation fundamentals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Valuation snapshot for one trading date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fundamentals {
    pub symbol: String,
    pub date: Option<NaiveDate>,
    /// Price / earnings
    pub pe_ratio: Option<f64>,
    /// Price / book
    pub pb_ratio: Option<f64>,
    /// Dividend yield in percent
    pub dividend_yield: Option<f64>,
    pub eps: Option<f64>,
    /// Return on equity in percent
    pub roe: Option<f64>,
}

impl Fundamentals {
    /// Score valuation on 0-100; cheaper and higher-yielding scores higher.
    ///
    /// Each missing field contributes nothing, so an empty snapshot scores 50.
    pub fn valuation_score(&self) -> f64 {
        let mut score: f64 = 50.0;

        if let Some(pe) = self.pe_ratio {
            score += if pe <= 0.0 {
                -15.0
            } else if pe < 10.0 {
                15.0
            } else if pe < 15.0 {
                10.0
            } else if pe < 25.0 {
                0.0
            } else {
                -10.0
            };
        }

        if let Some(pb) = self.pb_ratio {
            score += if pb <= 0.0 {
                0.0
            } else if pb < 1.0 {
                10.0
            } else if pb < 2.0 {
                5.0
            } else if pb > 5.0 {
                -10.0
            } else {
                0.0
            };
        }

        if let Some(dy) = self.dividend_yield {
            score += if dy >= 5.0 {
                15.0
            } else if dy >= 3.0 {
                10.0
            } else if dy >= 1.0 {
                0.0
            } else {
                -5.0
            };
        }

        if let Some(roe) = self.roe {
            score += if roe >= 15.0 {
                10.0
            } else if roe < 0.0 {
                -10.0
            } else {
                0.0
            };
        }

        score.clamp(0.0, 100.0)
    }

    /// Fill any missing field from another snapshot of the same symbol.
    pub fn merge(mut self, other: &Fundamentals) -> Self {
        self.date = self.date.or(other.date);
        self.pe_ratio = self.pe_ratio.or(other.pe_ratio);
        self.pb_ratio = self.pb_ratio.or(other.pb_ratio);
        self.dividend_yield = self.dividend_yield.or(other.dividend_yield);
        self.eps = self.eps.or(other.eps);
        self.roe = self.roe.or(other.roe);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_is_neutral() {
        assert_eq!(Fundamentals::default().valuation_score(), 50.0);
    }

    #[test]
    fn test_cheap_high_yield_scores_high() {
        let f = Fundamentals {
            pe_ratio: Some(8.0),
            pb_ratio: Some(0.9),
            dividend_yield: Some(6.0),
            ..Default::default()
        };
        assert_eq!(f.valuation_score(), 90.0);
    }

    #[test]
    fn test_expensive_scores_low() {
        let f = Fundamentals {
            pe_ratio: Some(60.0),
            pb_ratio: Some(9.0),
            dividend_yield: Some(0.0),
            roe: Some(-3.0),
            ..Default::default()
        };
        assert_eq!(f.valuation_score(), 15.0);
    }

    #[test]
    fn test_merge_fills_gaps() {
        let a = Fundamentals {
            symbol: "2330".to_string(),
            pe_ratio: Some(20.0),
            ..Default::default()
        };
        let b = Fundamentals {
            pe_ratio: Some(99.0),
            dividend_yield: Some(2.0),
            ..Default::default()
        };
        let merged = a.merge(&b);
        assert_eq!(merged.pe_ratio, Some(20.0));
        assert_eq!(merged.dividend_yield, Some(2.0));
    }
}
