//! Market data sources.
//!
//! Exchange and vendor clients implement
//! [`MarketDataProvider`](stockscope_core::traits::MarketDataProvider); the
//! [`MarketDataService`] chains them per market behind TTL caches. Every
//! upstream host gets its own [`HttpClient`] and therefore its own
//! [`RateLimiter`].

mod cache;
mod csv_source;
pub mod finmind;
mod http;
pub mod parse;
mod rate_limiter;
mod service;
pub mod tpex;
pub mod twse;
pub mod yahoo;

pub use cache::TtlCache;
pub use csv_source::CsvDataSource;
pub use finmind::FinMindClient;
pub use http::HttpClient;
pub use rate_limiter::RateLimiter;
pub use service::{CacheTtls, MarketDataService};
pub use tpex::TpexClient;
pub use twse::TwseClient;
pub use yahoo::YahooClient;

use std::path::Path;

use stockscope_core::error::DataError;
use stockscope_core::types::Bar;

/// Load daily bars from a CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>, DataError> {
    CsvDataSource::new(path)?.load_bars()
}
