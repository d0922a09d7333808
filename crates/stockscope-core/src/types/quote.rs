//! Latest quote snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Market;

/// Point-in-time quote for a single stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub name: Option<String>,
    pub market: Market,
    /// Last traded price
    pub price: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    /// Previous session close
    pub prev_close: Option<f64>,
    /// Volume in shares
    pub volume: Option<f64>,
    pub timestamp: DateTime<Utc>,
    /// Provider that produced this quote
    pub source: String,
}

impl StockQuote {
    /// Absolute change versus the previous close.
    pub fn change(&self) -> Option<f64> {
        self.prev_close.map(|pc| self.price - pc)
    }

    /// Percentage change versus the previous close.
    pub fn change_percent(&self) -> Option<f64> {
        match self.prev_close {
            Some(pc) if pc != 0.0 => Some((self.price - pc) / pc * 100.0),
            _ => None,
        }
    }
}
