//! Portfolio holdings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Industry tag used when a holding carries none.
pub const UNCLASSIFIED_INDUSTRY: &str = "Unclassified";

/// A single portfolio holding as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Current market value
    pub market_value: Decimal,
    #[serde(default)]
    pub industry: Option<String>,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, market_value: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            market_value,
            industry: None,
        }
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Industry tag, falling back to [`UNCLASSIFIED_INDUSTRY`] when blank.
    pub fn industry_or_default(&self) -> &str {
        match self.industry.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => UNCLASSIFIED_INDUSTRY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_industry_fallback() {
        assert_eq!(Holding::new("2330", dec!(1)).industry_or_default(), UNCLASSIFIED_INDUSTRY);
        assert_eq!(
            Holding::new("2330", dec!(1)).with_industry("  ").industry_or_default(),
            UNCLASSIFIED_INDUSTRY
        );
        assert_eq!(
            Holding::new("2330", dec!(1)).with_industry("Semiconductors").industry_or_default(),
            "Semiconductors"
        );
    }
}
