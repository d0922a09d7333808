//! Risk calculations for position planning.
//!
//! Provides ATR-based stop-loss and profit targets, fractional Kelly position
//! sizing, and portfolio concentration scoring.

mod portfolio_risk;
mod position_sizer;
mod risk_calculator;
mod stop_loss;

pub use portfolio_risk::{PortfolioAnalyzer, PortfolioRisk, RiskLevel};
pub use position_sizer::{KellyPositionSizer, PositionSize, RiskTolerance};
pub use risk_calculator::{RiskCalculator, RiskConfig};
pub use stop_loss::{ProfitTarget, StopLossBasis, StopLossCalculator, StopLossTarget};
