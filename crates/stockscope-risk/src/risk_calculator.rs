//! Unified risk calculator.

use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use stockscope_core::traits::{Indicator, OhlcIndicator};
use stockscope_core::types::{Bar, Holding};
use stockscope_indicators::{Atr, HistoricalVolatility};
use tracing::debug;

use crate::{
    KellyPositionSizer, PortfolioAnalyzer, PortfolioRisk, PositionSize, RiskTolerance,
    StopLossCalculator, StopLossTarget,
};

/// Risk calculation constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Stop distance = ATR * multiplier
    pub atr_multiplier: Decimal,
    /// Stop distance = price * daily volatility * multiplier when ATR is missing
    pub volatility_multiplier: Decimal,
    /// Stop distance as a fraction of price when neither is available
    pub default_stop_pct: Decimal,
    pub min_stop_pct: Decimal,
    pub max_stop_pct: Decimal,
    /// Profit target multiples of the stop distance
    pub reward_ratios: Vec<Decimal>,
    /// History windows used by `stop_loss_from_bars`
    pub atr_period: usize,
    pub volatility_period: usize,
    /// Kelly fractions per risk tolerance
    pub conservative_fraction: Decimal,
    pub moderate_fraction: Decimal,
    pub aggressive_fraction: Decimal,
    pub recommended_position_cap: Decimal,
    pub max_position_kelly_factor: Decimal,
    pub max_position_cap: Decimal,
    /// Portfolio warning thresholds (percent)
    pub max_single_exposure_pct: Decimal,
    pub max_sector_exposure_pct: Decimal,
    pub min_holdings: usize,
    pub max_holdings: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            atr_multiplier: dec!(2),
            volatility_multiplier: dec!(2),
            default_stop_pct: dec!(0.05),
            min_stop_pct: dec!(0.03),
            max_stop_pct: dec!(0.10),
            reward_ratios: vec![dec!(1.5), dec!(2), dec!(3)],
            atr_period: 14,
            volatility_period: 20,
            conservative_fraction: dec!(0.25),
            moderate_fraction: dec!(0.5),
            aggressive_fraction: dec!(0.75),
            recommended_position_cap: dec!(0.25),
            max_position_kelly_factor: dec!(0.75),
            max_position_cap: dec!(0.30),
            max_single_exposure_pct: dec!(30),
            max_sector_exposure_pct: dec!(40),
            min_holdings: 5,
            max_holdings: 20,
        }
    }
}

/// Risk calculator combining stop-loss, Kelly sizing and portfolio scoring.
///
/// All operations are pure; unusable input yields neutral results.
#[derive(Debug, Clone)]
pub struct RiskCalculator {
    config: RiskConfig,
    stop_loss: StopLossCalculator,
    sizer: KellyPositionSizer,
    portfolio: PortfolioAnalyzer,
}

impl Default for RiskCalculator {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

impl RiskCalculator {
    pub fn new(config: RiskConfig) -> Self {
        let stop_loss = StopLossCalculator::new()
            .with_atr_multiplier(config.atr_multiplier)
            .with_volatility_multiplier(config.volatility_multiplier)
            .with_default_stop_pct(config.default_stop_pct)
            .with_stop_range(config.min_stop_pct, config.max_stop_pct)
            .with_reward_ratios(config.reward_ratios.clone());

        let sizer = KellyPositionSizer::new()
            .with_fractions(
                config.conservative_fraction,
                config.moderate_fraction,
                config.aggressive_fraction,
            )
            .with_recommended_cap(config.recommended_position_cap)
            .with_max_position(config.max_position_kelly_factor, config.max_position_cap);

        let portfolio = PortfolioAnalyzer::new()
            .with_exposure_limits(config.max_single_exposure_pct, config.max_sector_exposure_pct)
            .with_holding_range(config.min_holdings, config.max_holdings);

        Self {
            config,
            stop_loss,
            sizer,
            portfolio,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Stop-loss and targets for a long entry at `price`.
    ///
    /// `volatility` is daily return volatility as a fraction.
    pub fn stop_loss(
        &self,
        price: Decimal,
        atr: Option<Decimal>,
        volatility: Option<Decimal>,
    ) -> StopLossTarget {
        let target = self.stop_loss.calculate(price, atr, volatility);
        debug!(
            %price,
            stop = %target.stop_loss_price,
            pct = %target.stop_loss_pct,
            basis = ?target.basis,
            "Calculated stop-loss"
        );
        target
    }

    /// Stop-loss at the last close, with ATR and daily volatility from history.
    pub fn stop_loss_from_bars(&self, bars: &[Bar]) -> StopLossTarget {
        let Some(last) = bars.last() else {
            return StopLossTarget::zeroed(Decimal::ZERO);
        };

        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let atr = Atr::new(self.config.atr_period)
            .latest_ohlc(&highs, &lows, &closes)
            .and_then(Decimal::from_f64);
        let volatility = HistoricalVolatility::new(self.config.volatility_period.max(2))
            .latest(&closes)
            .and_then(Decimal::from_f64);
        let price = Decimal::from_f64(last.close).unwrap_or(Decimal::ZERO);

        self.stop_loss(price, atr, volatility)
    }

    /// Fractional Kelly sizing from trade statistics.
    pub fn position_size(
        &self,
        win_rate: Decimal,
        avg_win: Decimal,
        avg_loss: Decimal,
        tolerance: RiskTolerance,
    ) -> PositionSize {
        let size = self.sizer.calculate(win_rate, avg_win, avg_loss, tolerance);
        debug!(
            kelly = %size.kelly_fraction,
            recommended = %size.recommended_position,
            tolerance = %tolerance,
            "Calculated position size"
        );
        size
    }

    pub fn portfolio_risk(&self, holdings: &[Holding]) -> PortfolioRisk {
        self.portfolio.analyze(holdings)
    }
}
