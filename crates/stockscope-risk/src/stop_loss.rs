//! Stop-loss and profit target calculation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Which input determined the stop distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopLossBasis {
    /// ATR times the multiplier
    Atr,
    /// Price times daily volatility times the volatility multiplier
    Volatility,
    /// Fixed percentage of price
    Default,
}

/// A profit target at a multiple of the stop distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitTarget {
    /// Reward to risk multiple
    pub ratio: Decimal,
    /// Target price
    pub price: Decimal,
}

/// Stop-loss price, percentage and profit targets for a long entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLossTarget {
    pub entry_price: Decimal,
    pub stop_loss_price: Decimal,
    /// Stop distance as a fraction of entry (0.05 = 5%)
    pub stop_loss_pct: Decimal,
    pub basis: StopLossBasis,
    pub targets: Vec<ProfitTarget>,
    /// Reward to risk of the second target tier
    pub risk_reward_ratio: Decimal,
}

impl StopLossTarget {
    /// Zeroed result for unusable input.
    pub fn zeroed(entry_price: Decimal) -> Self {
        Self {
            entry_price,
            stop_loss_price: Decimal::ZERO,
            stop_loss_pct: Decimal::ZERO,
            basis: StopLossBasis::Default,
            targets: Vec::new(),
            risk_reward_ratio: Decimal::ZERO,
        }
    }

    /// Target price of the given tier (1-based).
    pub fn target(&self, tier: usize) -> Option<Decimal> {
        tier.checked_sub(1)
            .and_then(|i| self.targets.get(i))
            .map(|t| t.price)
    }

    /// Risk per share.
    pub fn risk_per_share(&self) -> Decimal {
        self.entry_price - self.stop_loss_price
    }
}

/// Stop-loss calculator.
#[derive(Debug, Clone)]
pub struct StopLossCalculator {
    atr_multiplier: Decimal,
    volatility_multiplier: Decimal,
    default_stop_pct: Decimal,
    min_stop_pct: Decimal,
    max_stop_pct: Decimal,
    reward_ratios: Vec<Decimal>,
}

impl Default for StopLossCalculator {
    fn default() -> Self {
        Self {
            atr_multiplier: dec!(2),
            volatility_multiplier: dec!(2),
            default_stop_pct: dec!(0.05),
            min_stop_pct: dec!(0.03),
            max_stop_pct: dec!(0.10),
            reward_ratios: vec![dec!(1.5), dec!(2), dec!(3)],
        }
    }
}

impl StopLossCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_atr_multiplier(mut self, multiplier: Decimal) -> Self {
        self.atr_multiplier = multiplier;
        self
    }

    pub fn with_volatility_multiplier(mut self, multiplier: Decimal) -> Self {
        self.volatility_multiplier = multiplier;
        self
    }

    pub fn with_default_stop_pct(mut self, pct: Decimal) -> Self {
        self.default_stop_pct = pct;
        self
    }

    /// Set the allowed stop percentage range. Bounds are swapped if reversed.
    pub fn with_stop_range(mut self, min: Decimal, max: Decimal) -> Self {
        self.min_stop_pct = min.min(max);
        self.max_stop_pct = max.max(min);
        self
    }

    pub fn with_reward_ratios(mut self, ratios: Vec<Decimal>) -> Self {
        self.reward_ratios = ratios;
        self
    }

    /// Calculate the stop and targets for a long entry at `price`.
    ///
    /// Non-positive ATR or volatility counts as unavailable.
    pub fn calculate(
        &self,
        price: Decimal,
        atr: Option<Decimal>,
        volatility: Option<Decimal>,
    ) -> StopLossTarget {
        if price <= Decimal::ZERO {
            return StopLossTarget::zeroed(price);
        }

        let (distance, basis) = match (
            atr.filter(|a| *a > Decimal::ZERO),
            volatility.filter(|v| *v > Decimal::ZERO),
        ) {
            (Some(atr), _) => (atr * self.atr_multiplier, StopLossBasis::Atr),
            (None, Some(vol)) => (
                price * vol * self.volatility_multiplier,
                StopLossBasis::Volatility,
            ),
            (None, None) => (price * self.default_stop_pct, StopLossBasis::Default),
        };

        let stop_loss_pct = (distance / price).clamp(self.min_stop_pct, self.max_stop_pct);
        let stop_loss_price = price * (Decimal::ONE - stop_loss_pct);
        let risk = price - stop_loss_price;

        let targets: Vec<ProfitTarget> = self
            .reward_ratios
            .iter()
            .map(|&ratio| ProfitTarget {
                ratio,
                price: (price + risk * ratio).round_dp(4),
            })
            .collect();

        // Second tier when present, otherwise the highest available
        let reference = targets.get(1).or_else(|| targets.last());
        let risk_reward_ratio = match reference {
            Some(t) if risk > Decimal::ZERO => ((t.price - price) / risk).round_dp(2),
            _ => Decimal::ZERO,
        };

        StopLossTarget {
            entry_price: price,
            stop_loss_price: stop_loss_price.round_dp(4),
            stop_loss_pct: stop_loss_pct.round_dp(4),
            basis,
            targets,
            risk_reward_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stop_targets() {
        let calc = StopLossCalculator::new();
        let result = calc.calculate(dec!(100), None, None);

        assert_eq!(result.basis, StopLossBasis::Default);
        assert_eq!(result.stop_loss_price, dec!(95));
        assert_eq!(result.stop_loss_pct, dec!(0.05));
        assert_eq!(result.target(1), Some(dec!(107.5)));
        assert_eq!(result.target(2), Some(dec!(110)));
        assert_eq!(result.target(3), Some(dec!(115)));
        assert_eq!(result.risk_reward_ratio, dec!(2));
    }

    #[test]
    fn test_atr_stop() {
        let calc = StopLossCalculator::new();
        // 2 * 2 = 4 below entry
        let result = calc.calculate(dec!(100), Some(dec!(2)), Some(dec!(0.5)));

        assert_eq!(result.basis, StopLossBasis::Atr);
        assert_eq!(result.stop_loss_price, dec!(96));
        assert_eq!(result.stop_loss_pct, dec!(0.04));
    }

    #[test]
    fn test_volatility_stop() {
        let calc = StopLossCalculator::new();
        // 100 * 0.02 * 2 = 4
        let result = calc.calculate(dec!(100), None, Some(dec!(0.02)));

        assert_eq!(result.basis, StopLossBasis::Volatility);
        assert_eq!(result.stop_loss_price, dec!(96));
    }

    #[test]
    fn test_stop_pct_clamped() {
        let calc = StopLossCalculator::new();

        let tiny = calc.calculate(dec!(100), Some(dec!(0.01)), None);
        assert_eq!(tiny.stop_loss_pct, dec!(0.03));

        let huge = calc.calculate(dec!(100), Some(dec!(50)), None);
        assert_eq!(huge.stop_loss_pct, dec!(0.10));
        assert_eq!(huge.stop_loss_price, dec!(90));

        for atr in [dec!(0.001), dec!(1), dec!(3), dec!(7), dec!(1000)] {
            let r = calc.calculate(dec!(250), Some(atr), None);
            assert!(r.stop_loss_pct >= dec!(0.03) && r.stop_loss_pct <= dec!(0.10));
        }
    }

    #[test]
    fn test_non_positive_atr_ignored() {
        let calc = StopLossCalculator::new();
        let result = calc.calculate(dec!(100), Some(Decimal::ZERO), None);
        assert_eq!(result.basis, StopLossBasis::Default);
    }

    #[test]
    fn test_non_positive_price_zeroed() {
        let calc = StopLossCalculator::new();
        let result = calc.calculate(Decimal::ZERO, Some(dec!(2)), None);

        assert_eq!(result.stop_loss_price, Decimal::ZERO);
        assert!(result.targets.is_empty());
        assert_eq!(result.risk_reward_ratio, Decimal::ZERO);
    }

    #[test]
    fn test_custom_ratios() {
        let calc = StopLossCalculator::new().with_reward_ratios(vec![dec!(1)]);
        let result = calc.calculate(dec!(100), None, None);

        assert_eq!(result.targets.len(), 1);
        assert_eq!(result.target(1), Some(dec!(105)));
        assert_eq!(result.target(0), None);
        assert_eq!(result.risk_reward_ratio, dec!(1));
    }
}
