//! Core data types.

mod fundamentals;
mod holding;
mod institutional;
mod market;
mod ohlcv;
mod quote;

pub use fundamentals::Fundamentals;
pub use holding::{Holding, UNCLASSIFIED_INDUSTRY};
pub use institutional::InstitutionalFlow;
pub use market::Market;
pub use ohlcv::{tidy_history, Bar};
pub use quote::StockQuote;
