//! Moving averages and the recursive smoothing shared by RSI, ATR and KD.

use stockscope_core::traits::Indicator;

/// Recursive smoothing rule: `next = prev + alpha * (value - prev)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Smoothing {
    /// `alpha = 2 / (n + 1)`, the charting-package EMA.
    Exponential,
    /// `alpha = 1 / n`, Wilder's RMA used by RSI and ATR.
    Wilder,
    /// Fixed weight on the newest value, as in the Taiwan KD (1/3).
    Fixed(f64),
}

impl Smoothing {
    pub fn alpha(self, period: usize) -> f64 {
        match self {
            Smoothing::Exponential => 2.0 / (period as f64 + 1.0),
            Smoothing::Wilder => 1.0 / period as f64,
            Smoothing::Fixed(alpha) => alpha,
        }
    }

    /// Smooth `values` starting from `seed`, one output per input.
    pub fn from_seed(self, seed: f64, period: usize, values: &[f64]) -> Vec<f64> {
        let alpha = self.alpha(period);
        values
            .iter()
            .scan(seed, |prev, &value| {
                *prev += alpha * (value - *prev);
                Some(*prev)
            })
            .collect()
    }

    /// Smooth `values` seeded with the mean of the first `period` of them.
    ///
    /// The first output lines up with `values[period - 1]`.
    pub fn seeded_by_mean(self, period: usize, values: &[f64]) -> Vec<f64> {
        if period == 0 || values.len() < period {
            return vec![];
        }
        let seed = mean(&values[..period]);
        let mut out = Vec::with_capacity(values.len() - period + 1);
        out.push(seed);
        out.extend(self.from_seed(seed, period, &values[period..]));
        out
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Simple moving average, e.g. the MA5/MA20/MA60 lines on a daily chart.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }
        let n = self.period as f64;
        let head: f64 = data[..self.period].iter().sum();

        std::iter::once(head / n)
            .chain(
                data.iter()
                    .zip(&data[self.period..])
                    .scan(head, move |sum, (old, new)| {
                        *sum += new - old;
                        Some(*sum / n)
                    }),
            )
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential moving average seeded with the SMA of its first window.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        Smoothing::Exponential.seeded_by_mean(self.period, data)
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}
