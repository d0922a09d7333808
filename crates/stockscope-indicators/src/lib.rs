//! Technical indicators and composite technical scoring.
//!
//! Everything here works on a finite daily history, oldest bar first:
//! MA/EMA lines, RSI, MACD, KD, ATR, Bollinger Bands and historical
//! volatility. [`TechnicalAnalyzer`] folds them into a 0-100 score.

pub mod analyzer;
pub mod momentum;
pub mod moving_average;
pub mod returns;
pub mod volatility;

pub use analyzer::{AnalyzerConfig, Signal, TechnicalAnalyzer, TechnicalIndicators, Trend};
pub use momentum::{Kd, KdOutput, Macd, MacdOutput, Rsi};
pub use moving_average::{Ema, Sma, Smoothing};
pub use volatility::{Atr, BollingerBands, BollingerOutput, HistoricalVolatility};
