//! Composite technical analysis over a finite history window.

use serde::{Deserialize, Serialize};
use stockscope_core::error::IndicatorError;
use stockscope_core::traits::{Indicator, MultiOutputIndicator, OhlcIndicator};
use stockscope_core::types::Bar;

use crate::momentum::{Kd, KdOutput, Macd, MacdOutput, Rsi};
use crate::moving_average::Sma;
use crate::volatility::{Atr, BollingerBands, BollingerOutput, HistoricalVolatility};

/// Score at which the composite turns into a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Buy,
    Hold,
    Sell,
}

/// Moving-average alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

/// Indicator periods and score thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub kd_period: usize,
    pub ma_short: usize,
    pub ma_mid: usize,
    pub ma_long: usize,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
    pub atr_period: usize,
    pub volatility_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub kd_oversold: f64,
    pub kd_overbought: f64,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
}

impl AnalyzerConfig {
    /// Check periods and thresholds for consistency.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_signal", self.macd_signal),
            ("kd_period", self.kd_period),
            ("ma_short", self.ma_short),
            ("bollinger_period", self.bollinger_period),
            ("atr_period", self.atr_period),
            ("volatility_period", self.volatility_period),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(IndicatorError::InvalidParameter(format!("{} must be positive", name)));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(IndicatorError::InvalidParameter(
                "macd_fast must be less than macd_slow".to_string(),
            ));
        }
        if !(self.ma_short < self.ma_mid && self.ma_mid < self.ma_long) {
            return Err(IndicatorError::InvalidParameter(
                "moving averages must satisfy ma_short < ma_mid < ma_long".to_string(),
            ));
        }
        if !valid_band_width(self.bollinger_std) {
            return Err(IndicatorError::InvalidParameter(format!(
                "bollinger_std must be a positive number, got {}",
                self.bollinger_std
            )));
        }
        if self.sell_threshold >= self.buy_threshold {
            return Err(IndicatorError::InvalidParameter(
                "sell_threshold must be below buy_threshold".to_string(),
            ));
        }
        Ok(())
    }
}

fn valid_band_width(width: f64) -> bool {
    width.is_finite() && width > 0.0
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            kd_period: 9,
            ma_short: 5,
            ma_mid: 20,
            ma_long: 60,
            bollinger_period: 20,
            bollinger_std: 2.0,
            atr_period: 14,
            volatility_period: 20,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            kd_oversold: 20.0,
            kd_overbought: 80.0,
            buy_threshold: 65.0,
            sell_threshold: 35.0,
        }
    }
}

/// Snapshot of every indicator for the latest bar, plus the composite score.
///
/// Indicators without enough history are `None` and do not vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub price: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<MacdOutput>,
    pub kd: Option<KdOutput>,
    pub ma_short: Option<f64>,
    pub ma_mid: Option<f64>,
    pub ma_long: Option<f64>,
    pub bollinger: Option<BollingerOutput>,
    pub atr: Option<f64>,
    /// Daily return volatility (fraction)
    pub volatility: Option<f64>,
    pub annualized_volatility: Option<f64>,
    /// Composite score, 0-100
    pub score: f64,
    pub signal: Signal,
    pub trend: Trend,
    /// Human-readable votes that moved the score
    pub reasons: Vec<String>,
}

impl Default for TechnicalIndicators {
    fn default() -> Self {
        Self {
            price: None,
            rsi: None,
            macd: None,
            kd: None,
            ma_short: None,
            ma_mid: None,
            ma_long: None,
            bollinger: None,
            atr: None,
            volatility: None,
            annualized_volatility: None,
            score: 50.0,
            signal: Signal::Hold,
            trend: Trend::Sideways,
            reasons: Vec::new(),
        }
    }
}

/// Computes [`TechnicalIndicators`] from bars.
#[derive(Debug, Clone, Default)]
pub struct TechnicalAnalyzer {
    config: AnalyzerConfig,
}

impl TechnicalAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze bars ordered oldest to newest. Invalid bars are ignored.
    pub fn analyze(&self, bars: &[Bar]) -> TechnicalIndicators {
        let bars: Vec<&Bar> = bars.iter().filter(|b| b.is_valid()).collect();
        if bars.is_empty() {
            return TechnicalIndicators::default();
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let cfg = &self.config;

        let macd = if cfg.macd_fast > 0 && cfg.macd_fast < cfg.macd_slow && cfg.macd_signal > 0 {
            Macd::with_periods(cfg.macd_fast, cfg.macd_slow, cfg.macd_signal).latest(&closes)
        } else {
            None
        };
        let volatility = HistoricalVolatility::new(cfg.volatility_period.max(2)).latest(&closes);
        let bollinger = if valid_band_width(cfg.bollinger_std) {
            BollingerBands::with_params(cfg.bollinger_period.max(2), cfg.bollinger_std)
                .latest(&closes)
        } else {
            None
        };

        let mut indicators = TechnicalIndicators {
            price: closes.last().copied(),
            rsi: Rsi::new(cfg.rsi_period.max(1)).latest(&closes),
            macd,
            kd: Kd::new(cfg.kd_period.max(1)).latest_ohlc(&highs, &lows, &closes),
            ma_short: Sma::new(cfg.ma_short.max(1)).latest(&closes),
            ma_mid: Sma::new(cfg.ma_mid.max(1)).latest(&closes),
            ma_long: Sma::new(cfg.ma_long.max(1)).latest(&closes),
            bollinger,
            atr: Atr::new(cfg.atr_period.max(1)).latest_ohlc(&highs, &lows, &closes),
            volatility,
            annualized_volatility: volatility.map(HistoricalVolatility::annualize),
            ..TechnicalIndicators::default()
        };

        indicators.trend = self.trend(&indicators);
        self.score(&mut indicators);
        indicators
    }

    fn trend(&self, ind: &TechnicalIndicators) -> Trend {
        match (ind.ma_short, ind.ma_mid, ind.ma_long) {
            (Some(s), Some(m), Some(l)) if s > m && m > l => Trend::Uptrend,
            (Some(s), Some(m), Some(l)) if s < m && m < l => Trend::Downtrend,
            (Some(s), Some(m), None) if s > m => Trend::Uptrend,
            (Some(s), Some(m), None) if s < m => Trend::Downtrend,
            _ => Trend::Sideways,
        }
    }

    fn score(&self, ind: &mut TechnicalIndicators) {
        let cfg = &self.config;
        let mut score: f64 = 50.0;
        let mut reasons = Vec::new();

        if let Some(rsi) = ind.rsi {
            if rsi < cfg.rsi_oversold {
                score += 15.0;
                reasons.push(format!("RSI {:.1} oversold", rsi));
            } else if rsi > cfg.rsi_overbought {
                score -= 15.0;
                reasons.push(format!("RSI {:.1} overbought", rsi));
            } else if rsi > 50.0 {
                score += 5.0;
            } else if rsi < 50.0 {
                score -= 5.0;
            }
        }

        if let Some(macd) = ind.macd {
            if macd.histogram > 0.0 {
                score += 10.0;
                reasons.push("MACD above signal".to_string());
            } else if macd.histogram < 0.0 {
                score -= 10.0;
                reasons.push("MACD below signal".to_string());
            }
        }

        if let Some(kd) = ind.kd {
            if kd.is_oversold_cross(cfg.kd_oversold) {
                score += 10.0;
                reasons.push(format!("KD golden cross at {:.1}", kd.k));
            } else if kd.is_overbought_cross(cfg.kd_overbought) {
                score -= 10.0;
                reasons.push(format!("KD death cross at {:.1}", kd.k));
            } else if kd.k > kd.d {
                score += 5.0;
            } else if kd.k < kd.d {
                score -= 5.0;
            }
        }

        if let (Some(price), Some(ma)) = (ind.price, ind.ma_mid) {
            if price > ma {
                score += 5.0;
            } else if price < ma {
                score -= 5.0;
            }
        }

        match ind.trend {
            Trend::Uptrend => {
                score += 10.0;
                reasons.push("Moving averages aligned up".to_string());
            }
            Trend::Downtrend => {
                score -= 10.0;
                reasons.push("Moving averages aligned down".to_string());
            }
            Trend::Sideways => {}
        }

        if let Some(bb) = ind.bollinger {
            if bb.percent_b < 0.0 {
                score += 10.0;
                reasons.push("Price below lower Bollinger band".to_string());
            } else if bb.percent_b > 1.0 {
                score -= 10.0;
                reasons.push("Price above upper Bollinger band".to_string());
            }
        }

        ind.score = score.clamp(0.0, 100.0);
        ind.signal = if ind.score >= cfg.buy_threshold {
            Signal::Buy
        } else if ind.score <= cfg.sell_threshold {
            Signal::Sell
        } else {
            Signal::Hold
        };
        ind.reasons = reasons;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(i as i64 * 86_400_000, c, c * 1.01, c * 0.99, c, 1000.0))
            .collect()
    }

    #[test]
    fn test_empty_input_is_neutral() {
        let result = TechnicalAnalyzer::default().analyze(&[]);
        assert_eq!(result.score, 50.0);
        assert_eq!(result.signal, Signal::Hold);
        assert!(result.rsi.is_none());
    }

    #[test]
    fn test_short_window_only_fills_available() {
        let bars = bars_from_closes(&[10.0, 10.5, 10.2, 10.8, 11.0, 11.2]);
        let result = TechnicalAnalyzer::default().analyze(&bars);
        assert_eq!(result.price, Some(11.2));
        assert!(result.ma_short.is_some());
        assert!(result.ma_mid.is_none());
        assert!(result.macd.is_none());
        assert!(result.rsi.is_none());
    }

    #[test]
    fn test_steady_uptrend() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64).collect();
        let result = TechnicalAnalyzer::default().analyze(&bars_from_closes(&closes));

        assert_eq!(result.trend, Trend::Uptrend);
        assert!(result.macd.unwrap().macd > 0.0);
        assert!(result.rsi.unwrap() > 70.0);
        assert!((0.0..=100.0).contains(&result.score));
        assert!(result.atr.unwrap() > 0.0);
    }

    #[test]
    fn test_steady_trends_report_alignment() {
        let up: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.5).collect();
        let down: Vec<f64> = (0..120).map(|i| 200.0 - i as f64 * 0.5).collect();
        let analyzer = TechnicalAnalyzer::default();

        let up_result = analyzer.analyze(&bars_from_closes(&up));
        let down_result = analyzer.analyze(&bars_from_closes(&down));

        assert_eq!(up_result.trend, Trend::Uptrend);
        assert_eq!(down_result.trend, Trend::Downtrend);
        // RSI is contrarian and the MA alignment trend-following
        let has = |reasons: &[String], text: &str| reasons.iter().any(|r| r.contains(text));
        assert!(has(&up_result.reasons, "Moving averages aligned up"));
        assert!(has(&up_result.reasons, "overbought"));
        assert!(has(&down_result.reasons, "Moving averages aligned down"));
        assert!(has(&down_result.reasons, "oversold"));
        for result in [&up_result, &down_result] {
            assert!((0.0..=100.0).contains(&result.score));
        }
    }

    #[test]
    fn test_score_always_clamped() {
        let closes: Vec<f64> = (0..200).map(|i| 50.0 + (i as f64 * 0.3).sin() * 20.0).collect();
        let result = TechnicalAnalyzer::default().analyze(&bars_from_closes(&closes));
        assert!((0.0..=100.0).contains(&result.score));
    }

    #[test]
    fn test_config_validation() {
        assert!(AnalyzerConfig::default().validate().is_ok());

        let bad = AnalyzerConfig {
            macd_fast: 30,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let zero = AnalyzerConfig {
            rsi_period: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        // Still usable without panicking
        let bars = bars_from_closes(&[10.0; 40]);
        let result = TechnicalAnalyzer::new(zero).analyze(&bars);
        assert!((0.0..=100.0).contains(&result.score));
    }

    #[test]
    fn test_invalid_bollinger_width_rejected_and_skipped() {
        for width in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            let cfg = AnalyzerConfig {
                bollinger_std: width,
                ..Default::default()
            };
            assert!(cfg.validate().is_err());

            let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
            let result = TechnicalAnalyzer::new(cfg).analyze(&bars_from_closes(&closes));
            assert!(result.bollinger.is_none());
            assert!(result.rsi.is_some());
            assert!((0.0..=100.0).contains(&result.score));
        }
    }

    #[test]
    fn test_invalid_bars_ignored() {
        let mut bars = bars_from_closes(&[10.0, 11.0]);
        bars.push(Bar::new(0, 0.0, 0.0, 0.0, 0.0, 0.0));
        let result = TechnicalAnalyzer::default().analyze(&bars);
        assert_eq!(result.price, Some(11.0));
    }
}
