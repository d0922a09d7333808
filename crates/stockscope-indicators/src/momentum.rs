//! Momentum oscillators: RSI, MACD and the Taiwan-style KD.

use serde::{Deserialize, Serialize};
use stockscope_core::traits::{Indicator, MultiOutputIndicator, OhlcIndicator};

use crate::moving_average::{Ema, Smoothing};

/// Neutral starting point for K and D, and the RSV of a zero-range window.
const KD_NEUTRAL: f64 = 50.0;

/// Relative Strength Index on Wilder-smoothed gains and losses.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// 14 is the default; Taiwan charting tools also show 6 and 12.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    fn from_averages(gain: f64, loss: f64) -> f64 {
        match (gain == 0.0, loss == 0.0) {
            (true, true) => 50.0,
            (false, true) => 100.0,
            _ => 100.0 - 100.0 / (1.0 + gain / loss),
        }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }
        let (gains, losses): (Vec<f64>, Vec<f64>) = data
            .windows(2)
            .map(|pair| {
                let change = pair[1] - pair[0];
                (change.max(0.0), (-change).max(0.0))
            })
            .unzip();

        let avg_gain = Smoothing::Wilder.seeded_by_mean(self.period, &gains);
        let avg_loss = Smoothing::Wilder.seeded_by_mean(self.period, &losses);
        avg_gain
            .into_iter()
            .zip(avg_loss)
            .map(|(gain, loss)| Self::from_averages(gain, loss))
            .collect()
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    /// Fast EMA minus slow EMA (DIF).
    pub macd: f64,
    /// EMA of the MACD line (DEA).
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Macd {
    /// The usual 12/26/9 setup.
    pub fn new() -> Self {
        Self::with_periods(12, 26, 9)
    }

    pub fn with_periods(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast > 0 && slow > 0 && signal > 0);
        assert!(fast < slow, "Fast period must be less than slow period");
        Self { fast, slow, signal }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for Macd {
    type Outputs = MacdOutput;

    fn calculate(&self, data: &[f64]) -> Vec<MacdOutput> {
        if data.len() < self.period() {
            return vec![];
        }

        // Drop the head of the fast EMA so both lines start on the same bar.
        let fast = Ema::new(self.fast).calculate(data);
        let slow = Ema::new(self.slow).calculate(data);
        let dif: Vec<f64> = fast[self.slow - self.fast..]
            .iter()
            .zip(&slow)
            .map(|(f, s)| f - s)
            .collect();

        let dea = Ema::new(self.signal).calculate(&dif);
        dif[self.signal - 1..]
            .iter()
            .zip(dea)
            .map(|(&macd, signal)| MacdOutput {
                macd,
                signal,
                histogram: macd - signal,
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.slow + self.signal - 1
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KdOutput {
    pub k: f64,
    pub d: f64,
}

impl KdOutput {
    /// K above D while still under the oversold line.
    pub fn is_oversold_cross(&self, oversold: f64) -> bool {
        self.k > self.d && self.k < oversold
    }

    /// K below D while still over the overbought line.
    pub fn is_overbought_cross(&self, overbought: f64) -> bool {
        self.k < self.d && self.k > overbought
    }
}

/// KD stochastic as quoted by Taiwan brokers.
///
/// RSV is where the close sits in the window's high-low range (0-100).
/// K smooths RSV and D smooths K, each with weight 1/3 on the new value,
/// both seeded at 50.
#[derive(Debug, Clone)]
pub struct Kd {
    period: usize,
}

impl Kd {
    /// `period` is the RSV window; 9 is customary.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    fn rsv(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        high.windows(self.period)
            .zip(low.windows(self.period))
            .zip(&close[self.period - 1..])
            .map(|((highs, lows), &close)| {
                let top = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let bottom = lows.iter().copied().fold(f64::INFINITY, f64::min);
                if top > bottom {
                    (close - bottom) / (top - bottom) * 100.0
                } else {
                    KD_NEUTRAL
                }
            })
            .collect()
    }
}

impl Default for Kd {
    fn default() -> Self {
        Self::new(9)
    }
}

impl OhlcIndicator for Kd {
    type Output = KdOutput;

    fn calculate_ohlc(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<KdOutput> {
        let len = high.len().min(low.len()).min(close.len());
        if len < self.period {
            return vec![];
        }

        let smoothing = Smoothing::Fixed(1.0 / 3.0);
        let rsv = self.rsv(&high[..len], &low[..len], &close[..len]);
        let k = smoothing.from_seed(KD_NEUTRAL, self.period, &rsv);
        let d = smoothing.from_seed(KD_NEUTRAL, self.period, &k);
        k.into_iter().zip(d).map(|(k, d)| KdOutput { k, d }).collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "KD"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_stays_within_bounds_on_oscillating_closes() {
        let closes: Vec<f64> = (0..30).map(|i| 600.0 + (i as f64 * 0.5).sin() * 12.0).collect();
        let result = Rsi::new(14).calculate(&closes);
        assert_eq!(result.len(), 16);
        assert!(result.iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn rsi_extremes_and_flat() {
        let up: Vec<f64> = (1..=7).map(|i| i as f64).collect();
        let down: Vec<f64> = up.iter().rev().copied().collect();
        assert_eq!(Rsi::new(5).latest(&up), Some(100.0));
        assert_eq!(Rsi::new(5).latest(&down), Some(0.0));
        assert_eq!(Rsi::new(5).latest(&[10.0; 8]), Some(50.0));
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let last = Macd::new().latest(&closes).unwrap();
        assert!(last.macd > 0.0);
        assert!((last.histogram - (last.macd - last.signal)).abs() < 1e-12);
    }

    #[test]
    fn macd_needs_slow_plus_signal_bars() {
        let macd = Macd::with_periods(5, 10, 3);
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        assert_eq!(macd.calculate(&closes).len(), 1);
        assert!(macd.calculate(&closes[..11]).is_empty());
    }

    #[test]
    fn kd_climbs_when_closing_at_highs() {
        let high: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let low: Vec<f64> = (0..20).map(|i| 5.0 + i as f64).collect();

        let result = Kd::new(5).calculate_ohlc(&high, &low, &high);
        assert_eq!(result.len(), 16);
        let last = result[15];
        assert!(last.k > 95.0);
        assert!(last.k > last.d);
    }

    #[test]
    fn kd_first_value_moves_a_third_from_neutral() {
        let result = Kd::new(3).calculate_ohlc(&[1.0, 2.0, 3.0], &[0.0; 3], &[1.0, 2.0, 3.0]);
        assert_eq!(result.len(), 1);
        let expected_k = 50.0 + (100.0 - 50.0) / 3.0;
        assert!((result[0].k - expected_k).abs() < 1e-10);
        assert!((result[0].d - (50.0 + (expected_k - 50.0) / 3.0)).abs() < 1e-10);
    }

    #[test]
    fn kd_zero_range_is_neutral() {
        let result = Kd::new(3).calculate_ohlc(&[5.0; 4], &[5.0; 4], &[5.0; 4]);
        assert!(result.iter().all(|o| o.k == 50.0 && o.d == 50.0));
    }

    #[test]
    fn kd_cross_zones() {
        let out = KdOutput { k: 15.0, d: 10.0 };
        assert!(out.is_oversold_cross(20.0));
        assert!(!out.is_overbought_cross(80.0));
    }
}
