//! Volatility measures: ATR, Bollinger Bands and historical volatility.

use serde::{Deserialize, Serialize};
use stockscope_core::traits::{Indicator, MultiOutputIndicator, OhlcIndicator};

use crate::moving_average::Smoothing;
use crate::returns::{mean_simd, pct_returns, std_dev_simd};

/// Trading days per year used to annualise daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Average True Range with Wilder's smoothing.
///
/// This is the distance unit the stop-loss calculator works in.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Largest of today's range and the gaps from yesterday's close.
    fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
        (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs())
    }
}

impl Default for Atr {
    fn default() -> Self {
        Self::new(14)
    }
}

impl OhlcIndicator for Atr {
    type Output = f64;

    fn calculate_ohlc(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let len = high.len().min(low.len()).min(close.len());
        if len <= self.period {
            return vec![];
        }
        let ranges: Vec<f64> = (1..len)
            .map(|i| Self::true_range(high[i], low[i], close[i - 1]))
            .collect();
        Smoothing::Wilder.seeded_by_mean(self.period, &ranges)
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "ATR"
    }
}

impl Indicator for Atr {
    type Output = f64;

    /// Close-only approximation: each day's absolute close-to-close move
    /// stands in for the true range.
    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }
        let moves: Vec<f64> = data.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        Smoothing::Wilder.seeded_by_mean(self.period, &moves)
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "ATR"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    pub upper: f64,
    /// The moving average the bands are built around.
    pub middle: f64,
    pub lower: f64,
    /// Position of the close inside the bands: 0 at the lower band, 1 at the
    /// upper band, outside [0, 1] when the close breaks through.
    pub percent_b: f64,
}

/// Bollinger Bands: an SMA with bands `width` population standard
/// deviations either side.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    width: f64,
}

impl BollingerBands {
    /// 20 days, two deviations.
    pub fn new() -> Self {
        Self::with_params(20, 2.0)
    }

    pub fn with_params(period: usize, width: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(width > 0.0, "Band width must be positive");
        Self { period, width }
    }

    fn bands(&self, window: &[f64]) -> BollingerOutput {
        let middle = mean_simd(window);
        let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>()
            / window.len() as f64;
        let offset = self.width * variance.sqrt();
        let (upper, lower) = (middle + offset, middle - offset);

        let close = window[window.len() - 1];
        let percent_b = if upper > lower {
            (close - lower) / (upper - lower)
        } else {
            0.5
        };

        BollingerOutput {
            upper,
            middle,
            lower,
            percent_b,
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<BollingerOutput> {
        data.windows(self.period).map(|w| self.bands(w)).collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "Bollinger"
    }
}

/// Historical volatility: sample standard deviation of daily returns over a
/// rolling window, expressed as a fraction (0.02 = 2% per day).
#[derive(Debug, Clone)]
pub struct HistoricalVolatility {
    period: usize,
}

impl HistoricalVolatility {
    /// `period` is the number of returns per window.
    pub fn new(period: usize) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        Self { period }
    }

    pub fn annualize(daily: f64) -> f64 {
        daily * TRADING_DAYS_PER_YEAR.sqrt()
    }
}

impl Default for HistoricalVolatility {
    fn default() -> Self {
        Self::new(20)
    }
}

impl Indicator for HistoricalVolatility {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        pct_returns(data)
            .windows(self.period)
            .map(std_dev_simd)
            .collect()
    }

    fn period(&self) -> usize {
        self.period + 1
    }

    fn name(&self) -> &str {
        "HV"
    }
}
