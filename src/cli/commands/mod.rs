//! CLI command implementations.

pub mod analyze;
pub mod cross_validate;
pub mod institutional;
pub mod portfolio;
pub mod position_size;
pub mod quote;
pub mod stop_loss;
pub mod validate;

use rust_decimal::Decimal;

/// Fraction as a percentage string, `0.075` -> `7.50%`.
pub(crate) fn pct(fraction: Decimal) -> String {
    format!("{}%", (fraction * Decimal::ONE_HUNDRED).round_dp(2))
}
