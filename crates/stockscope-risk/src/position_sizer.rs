//! Fractional Kelly position sizing.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Investor risk tolerance, mapped to a fraction of full Kelly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Conservative => "conservative",
            RiskTolerance::Moderate => "moderate",
            RiskTolerance::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown strings fall back to [`RiskTolerance::Moderate`].
impl FromStr for RiskTolerance {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "conservative" | "low" => RiskTolerance::Conservative,
            "aggressive" | "high" => RiskTolerance::Aggressive,
            _ => RiskTolerance::Moderate,
        })
    }
}

/// Result of a Kelly sizing calculation. Fractions are of total capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    /// Fractional Kelly, clamped to the recommended cap
    pub recommended_position: Decimal,
    /// Upper bound derived from full Kelly
    pub max_position: Decimal,
    /// Unscaled Kelly fraction (may be negative)
    pub kelly_fraction: Decimal,
    pub win_rate: Decimal,
    /// avg_win / avg_loss
    pub win_loss_ratio: Decimal,
    pub risk_tolerance: RiskTolerance,
}

impl PositionSize {
    fn zero(win_rate: Decimal, risk_tolerance: RiskTolerance) -> Self {
        Self {
            recommended_position: Decimal::ZERO,
            max_position: Decimal::ZERO,
            kelly_fraction: Decimal::ZERO,
            win_rate,
            win_loss_ratio: Decimal::ZERO,
            risk_tolerance,
        }
    }

    /// Capital to allocate for the recommended position.
    pub fn allocation(&self, capital: Decimal) -> Decimal {
        (capital * self.recommended_position).max(Decimal::ZERO)
    }

    /// Whole shares affordable with the recommended allocation.
    pub fn shares(&self, capital: Decimal, price: Decimal) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.allocation(capital) / price).floor()
    }
}

/// Kelly criterion position sizer.
///
/// kelly = (W * R - (1 - W)) / R with R = avg_win / avg_loss.
#[derive(Debug, Clone)]
pub struct KellyPositionSizer {
    conservative_fraction: Decimal,
    moderate_fraction: Decimal,
    aggressive_fraction: Decimal,
    recommended_cap: Decimal,
    max_position_factor: Decimal,
    max_position_cap: Decimal,
}

impl Default for KellyPositionSizer {
    fn default() -> Self {
        Self {
            conservative_fraction: dec!(0.25),
            moderate_fraction: dec!(0.5),
            aggressive_fraction: dec!(0.75),
            recommended_cap: dec!(0.25),
            max_position_factor: dec!(0.75),
            max_position_cap: dec!(0.30),
        }
    }
}

impl KellyPositionSizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Kelly fractions for conservative, moderate and aggressive.
    pub fn with_fractions(mut self, conservative: Decimal, moderate: Decimal, aggressive: Decimal) -> Self {
        self.conservative_fraction = conservative;
        self.moderate_fraction = moderate;
        self.aggressive_fraction = aggressive;
        self
    }

    pub fn with_recommended_cap(mut self, cap: Decimal) -> Self {
        self.recommended_cap = cap;
        self
    }

    /// Max position = clamp(kelly * factor, 0, cap).
    pub fn with_max_position(mut self, factor: Decimal, cap: Decimal) -> Self {
        self.max_position_factor = factor;
        self.max_position_cap = cap;
        self
    }

    pub fn fraction_for(&self, tolerance: RiskTolerance) -> Decimal {
        match tolerance {
            RiskTolerance::Conservative => self.conservative_fraction,
            RiskTolerance::Moderate => self.moderate_fraction,
            RiskTolerance::Aggressive => self.aggressive_fraction,
        }
    }

    /// Raw Kelly fraction. Zero when either average is non-positive.
    pub fn kelly_fraction(&self, win_rate: Decimal, avg_win: Decimal, avg_loss: Decimal) -> Decimal {
        if avg_win <= Decimal::ZERO || avg_loss <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let w = win_rate.clamp(Decimal::ZERO, Decimal::ONE);
        let r = avg_win / avg_loss;
        (w * r - (Decimal::ONE - w)) / r
    }

    /// Size a position from historical trade statistics.
    pub fn calculate(
        &self,
        win_rate: Decimal,
        avg_win: Decimal,
        avg_loss: Decimal,
        tolerance: RiskTolerance,
    ) -> PositionSize {
        let win_rate = win_rate.clamp(Decimal::ZERO, Decimal::ONE);
        if avg_win <= Decimal::ZERO || avg_loss <= Decimal::ZERO {
            return PositionSize::zero(win_rate, tolerance);
        }

        let kelly = self.kelly_fraction(win_rate, avg_win, avg_loss);
        let recommended = (kelly * self.fraction_for(tolerance))
            .clamp(Decimal::ZERO, self.recommended_cap);
        let max_position = (kelly * self.max_position_factor)
            .clamp(Decimal::ZERO, self.max_position_cap);

        PositionSize {
            recommended_position: recommended.round_dp(4),
            max_position: max_position.round_dp(4),
            kelly_fraction: kelly.round_dp(4),
            win_rate,
            win_loss_ratio: (avg_win / avg_loss).round_dp(4),
            risk_tolerance: tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelly_fraction() {
        let sizer = KellyPositionSizer::new();
        // W = 0.6, R = 2 -> (1.2 - 0.4) / 2 = 0.4
        let kelly = sizer.kelly_fraction(dec!(0.6), dec!(10), dec!(5));
        assert_eq!(kelly, dec!(0.4));

        let size = sizer.calculate(dec!(0.6), dec!(10), dec!(5), RiskTolerance::Moderate);
        assert_eq!(size.kelly_fraction, dec!(0.4));
        assert_eq!(size.recommended_position, dec!(0.2));
        assert_eq!(size.max_position, dec!(0.3));
        assert_eq!(size.win_loss_ratio, dec!(2));
    }

    #[test]
    fn test_degenerate_averages_zero() {
        let sizer = KellyPositionSizer::new();
        for w in [dec!(0), dec!(0.3), dec!(0.5), dec!(0.9), dec!(1)] {
            let no_loss = sizer.calculate(w, dec!(10), Decimal::ZERO, RiskTolerance::Aggressive);
            assert_eq!(no_loss.kelly_fraction, Decimal::ZERO);
            assert_eq!(no_loss.recommended_position, Decimal::ZERO);

            let no_win = sizer.calculate(w, Decimal::ZERO, dec!(5), RiskTolerance::Aggressive);
            assert_eq!(no_win.kelly_fraction, Decimal::ZERO);
            assert_eq!(no_win.max_position, Decimal::ZERO);
        }
    }

    #[test]
    fn test_recommended_monotonic_and_bounded() {
        let sizer = KellyPositionSizer::new();
        for tolerance in [
            RiskTolerance::Conservative,
            RiskTolerance::Moderate,
            RiskTolerance::Aggressive,
        ] {
            let mut previous = Decimal::ZERO;
            for step in 0..=20 {
                let w = Decimal::from(step) / dec!(20);
                let size = sizer.calculate(w, dec!(8), dec!(4), tolerance);
                assert!(size.recommended_position >= previous);
                assert!(size.recommended_position >= Decimal::ZERO);
                assert!(size.recommended_position <= dec!(0.25));
                assert!(size.max_position <= dec!(0.30));
                previous = size.recommended_position;
            }
        }
    }

    #[test]
    fn test_negative_edge_clamped() {
        let sizer = KellyPositionSizer::new();
        let size = sizer.calculate(dec!(0.2), dec!(5), dec!(5), RiskTolerance::Moderate);
        assert!(size.kelly_fraction < Decimal::ZERO);
        assert_eq!(size.recommended_position, Decimal::ZERO);
        assert_eq!(size.max_position, Decimal::ZERO);
    }

    #[test]
    fn test_win_rate_clamped() {
        let sizer = KellyPositionSizer::new();
        let size = sizer.calculate(dec!(1.5), dec!(10), dec!(5), RiskTolerance::Conservative);
        assert_eq!(size.win_rate, Decimal::ONE);
        assert_eq!(size.kelly_fraction, Decimal::ONE);
        assert_eq!(size.recommended_position, dec!(0.25));
    }

    #[test]
    fn test_tolerance_parsing() {
        assert_eq!("Conservative".parse::<RiskTolerance>().unwrap(), RiskTolerance::Conservative);
        assert_eq!(" aggressive ".parse::<RiskTolerance>().unwrap(), RiskTolerance::Aggressive);
        assert_eq!("yolo".parse::<RiskTolerance>().unwrap(), RiskTolerance::Moderate);
    }

    #[test]
    fn test_shares() {
        let sizer = KellyPositionSizer::new();
        let size = sizer.calculate(dec!(0.6), dec!(10), dec!(5), RiskTolerance::Moderate);
        // 20% of 100000 = 20000 at 300 = 66 shares
        assert_eq!(size.allocation(dec!(100000)), dec!(20000));
        assert_eq!(size.shares(dec!(100000), dec!(300)), dec!(66));
        assert_eq!(size.shares(dec!(100000), Decimal::ZERO), Decimal::ZERO);
    }
}
