//! Market (listing venue) classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Venue a symbol trades on. Selects the provider chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// Taiwan Stock Exchange (listed)
    #[default]
    Twse,
    /// Taipei Exchange (OTC)
    Tpex,
    /// US exchanges
    Us,
}

impl Market {
    /// Guess the market from a symbol.
    ///
    /// `2330.TW` is listed, `6488.TWO` is OTC, bare numeric codes default to
    /// listed, anything else is treated as a US ticker.
    pub fn infer(symbol: &str) -> Self {
        let upper = symbol.trim().to_ascii_uppercase();
        if upper.ends_with(".TWO") {
            Market::Tpex
        } else if upper.ends_with(".TW") {
            Market::Twse
        } else if !upper.is_empty() && upper.chars().all(|c| c.is_ascii_digit()) {
            Market::Twse
        } else {
            Market::Us
        }
    }

    /// Strip exchange suffixes, leaving the bare code (`2330.TW` -> `2330`).
    pub fn bare_symbol(symbol: &str) -> String {
        let upper = symbol.trim().to_ascii_uppercase();
        upper
            .strip_suffix(".TWO")
            .or_else(|| upper.strip_suffix(".TW"))
            .unwrap_or(&upper)
            .to_string()
    }

    /// Symbol as the Yahoo chart API expects it.
    pub fn yahoo_symbol(&self, symbol: &str) -> String {
        let bare = Self::bare_symbol(symbol);
        match self {
            Market::Twse => format!("{}.TW", bare),
            Market::Tpex => format!("{}.TWO", bare),
            Market::Us => bare,
        }
    }

    pub fn is_taiwan(&self) -> bool {
        matches!(self, Market::Twse | Market::Tpex)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Market::Twse => "twse",
            Market::Tpex => "tpex",
            Market::Us => "us",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "twse" | "tw" | "listed" => Ok(Market::Twse),
            "tpex" | "two" | "otc" => Ok(Market::Tpex),
            "us" => Ok(Market::Us),
            _ => Err(format!("Unknown market: {}", s)),
        }
    }
}
