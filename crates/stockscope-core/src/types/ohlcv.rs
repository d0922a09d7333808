//! Daily price bars.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// One trading day. Prices are `f64` because they only feed indicators;
/// money amounts use `Decimal` elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Unix milliseconds at midnight UTC of the trading date.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Shares traded.
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn on_date(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        let timestamp = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self::new(timestamp, open, high, low, close, volume)
    }

    pub fn date(&self) -> NaiveDate {
        DateTime::from_timestamp_millis(self.timestamp)
            .unwrap_or_default()
            .date_naive()
    }

    /// Inclusive on both ends.
    pub fn in_range(&self, start: NaiveDate, end: NaiveDate) -> bool {
        (start..=end).contains(&self.date())
    }

    /// Positive finite prices with `high >= low`. Suspended days come back
    /// from the exchanges as zeros or dashes and fail this.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
            && self.high >= self.low
    }
}

/// Drop invalid bars, order oldest first and keep the first bar seen for any
/// repeated timestamp.
pub fn tidy_history(bars: impl IntoIterator<Item = Bar>) -> Vec<Bar> {
    let mut bars: Vec<Bar> = bars.into_iter().filter(Bar::is_valid).collect();
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    bars
}
