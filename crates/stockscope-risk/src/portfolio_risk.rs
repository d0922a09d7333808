//! Portfolio concentration and diversification scoring.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use stockscope_core::types::Holding;

/// Coarse risk bucket derived from the diversification score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: Decimal) -> Self {
        if score >= dec!(70) {
            RiskLevel::Low
        } else if score >= dec!(40) {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Concentration analysis of a set of holdings. Percentages are 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRisk {
    pub total_value: Decimal,
    pub holding_count: usize,
    pub sector_count: usize,
    pub sector_exposure: BTreeMap<String, Decimal>,
    pub max_single_exposure: Decimal,
    pub largest_holding: Option<String>,
    /// 0-100, higher is better diversified
    pub diversification_score: Decimal,
    pub risk_level: RiskLevel,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl PortfolioRisk {
    fn empty(warning: impl Into<String>) -> Self {
        Self {
            total_value: Decimal::ZERO,
            holding_count: 0,
            sector_count: 0,
            sector_exposure: BTreeMap::new(),
            max_single_exposure: Decimal::ZERO,
            largest_holding: None,
            diversification_score: Decimal::ZERO,
            risk_level: RiskLevel::High,
            warnings: vec![warning.into()],
            recommendations: Vec::new(),
        }
    }
}

/// Scores holdings by count, sector spread and largest position.
///
/// score = min(n * 10, 40) + min(sectors * 10, 30) + max(0, 30 - max_single_pct)
#[derive(Debug, Clone)]
pub struct PortfolioAnalyzer {
    max_single_exposure_pct: Decimal,
    max_sector_exposure_pct: Decimal,
    min_holdings: usize,
    max_holdings: usize,
}

impl Default for PortfolioAnalyzer {
    fn default() -> Self {
        Self {
            max_single_exposure_pct: dec!(30),
            max_sector_exposure_pct: dec!(40),
            min_holdings: 5,
            max_holdings: 20,
        }
    }
}

impl PortfolioAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warning thresholds for a single holding and a single sector (percent).
    pub fn with_exposure_limits(mut self, single_pct: Decimal, sector_pct: Decimal) -> Self {
        self.max_single_exposure_pct = single_pct;
        self.max_sector_exposure_pct = sector_pct;
        self
    }

    /// Holding counts outside this range produce recommendations.
    pub fn with_holding_range(mut self, min: usize, max: usize) -> Self {
        self.min_holdings = min;
        self.max_holdings = max;
        self
    }

    pub fn analyze(&self, holdings: &[Holding]) -> PortfolioRisk {
        if holdings.is_empty() {
            return PortfolioRisk::empty("Portfolio has no holdings");
        }

        let mut warnings = Vec::new();

        // Merge duplicate symbols; non-positive values carry no exposure
        let mut by_symbol: BTreeMap<&str, Decimal> = BTreeMap::new();
        let mut by_sector: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut skipped = 0usize;
        for holding in holdings {
            if holding.market_value <= Decimal::ZERO {
                skipped += 1;
                continue;
            }
            *by_symbol.entry(holding.symbol.as_str()).or_default() += holding.market_value;
            *by_sector
                .entry(holding.industry_or_default().to_string())
                .or_default() += holding.market_value;
        }

        let total_value: Decimal = by_symbol.values().copied().sum();
        if total_value <= Decimal::ZERO {
            return PortfolioRisk::empty("Portfolio total value is zero");
        }
        if skipped > 0 {
            warnings.push(format!(
                "Ignored {} holding(s) with non-positive market value",
                skipped
            ));
        }

        let pct = |value: Decimal| (value / total_value * dec!(100)).round_dp(2);

        let (largest_symbol, largest_value) = by_symbol
            .iter()
            .max_by(|a, b| a.1.cmp(b.1))
            .map(|(s, v)| (Some(s.to_string()), *v))
            .unwrap_or((None, Decimal::ZERO));
        let max_single_exposure = pct(largest_value);

        for (symbol, value) in &by_symbol {
            let exposure = pct(*value);
            if exposure > self.max_single_exposure_pct {
                warnings.push(format!(
                    "{} is {:.2}% of the portfolio (limit {}%)",
                    symbol, exposure, self.max_single_exposure_pct
                ));
            }
        }

        let sector_exposure: BTreeMap<String, Decimal> = by_sector
            .into_iter()
            .map(|(sector, value)| (sector, pct(value)))
            .collect();
        for (sector, exposure) in &sector_exposure {
            if *exposure > self.max_sector_exposure_pct {
                warnings.push(format!(
                    "Sector {} is {:.2}% of the portfolio (limit {}%)",
                    sector, exposure, self.max_sector_exposure_pct
                ));
            }
        }

        let holding_count = by_symbol.len();
        let sector_count = sector_exposure.len();

        let count_score = Decimal::from((holding_count * 10).min(40) as u64);
        let sector_score = Decimal::from((sector_count * 10).min(30) as u64);
        let single_score = (dec!(30) - max_single_exposure).max(Decimal::ZERO);
        let diversification_score = count_score + sector_score + single_score;

        let mut recommendations = Vec::new();
        if holding_count < self.min_holdings {
            recommendations.push(format!(
                "Consider diversifying: {} holding(s), at least {} recommended",
                holding_count, self.min_holdings
            ));
        }
        if holding_count > self.max_holdings {
            recommendations.push(format!(
                "Consider consolidating: {} holdings is hard to monitor (more than {})",
                holding_count, self.max_holdings
            ));
        }
        if sector_count < 3 {
            recommendations.push("Spread holdings across more sectors".to_string());
        }

        PortfolioRisk {
            total_value,
            holding_count,
            sector_count,
            sector_exposure,
            max_single_exposure,
            largest_holding: largest_symbol,
            diversification_score,
            risk_level: RiskLevel::from_score(diversification_score),
            warnings,
            recommendations,
        }
    }
}
