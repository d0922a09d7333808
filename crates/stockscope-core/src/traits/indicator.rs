//! Indicator traits.
//!
//! Every indicator is a pure function of a history slice ordered oldest
//! first. Output is one value per complete window, so the last element lines
//! up with the newest bar and too short a history gives an empty vector.

/// Indicator over a single series, usually closes.
pub trait Indicator: Send + Sync {
    type Output;

    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Bars needed before the first value appears.
    fn period(&self) -> usize;

    fn name(&self) -> &str;

    /// Value at the newest bar.
    fn latest(&self, data: &[f64]) -> Option<Self::Output> {
        self.calculate(data).pop()
    }
}

/// Indicator over a single series that yields a bundle per bar (MACD, bands).
pub trait MultiOutputIndicator: Send + Sync {
    type Outputs;

    fn calculate(&self, data: &[f64]) -> Vec<Self::Outputs>;

    fn period(&self) -> usize;

    fn name(&self) -> &str;

    fn latest(&self, data: &[f64]) -> Option<Self::Outputs> {
        self.calculate(data).pop()
    }
}

/// Indicator that reads the daily range as well as the close (ATR, KD).
pub trait OhlcIndicator: Send + Sync {
    type Output;

    /// Series may differ in length; only the common prefix is used.
    fn calculate_ohlc(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<Self::Output>;

    fn period(&self) -> usize;

    fn name(&self) -> &str;

    fn latest_ohlc(&self, high: &[f64], low: &[f64], close: &[f64]) -> Option<Self::Output> {
        self.calculate_ohlc(high, low, close).pop()
    }
}
