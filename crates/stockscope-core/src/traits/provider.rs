//! Market data provider trait.

use crate::error::DataError;
use crate::types::{Bar, Fundamentals, InstitutionalFlow, Market, StockQuote};
use async_trait::async_trait;
use chrono::NaiveDate;

/// An upstream source of market data.
///
/// Providers implement only what their upstream offers; the default bodies
/// report [`DataError::Unsupported`] so a fallback chain can skip them.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider name used in logs and on returned quotes.
    fn name(&self) -> &str;

    /// Whether this provider covers the given market at all.
    fn supports(&self, market: Market) -> bool;

    /// Latest quote for a symbol.
    async fn quote(&self, _symbol: &str, _market: Market) -> Result<StockQuote, DataError> {
        Err(DataError::unsupported(self.name(), "quote"))
    }

    /// Daily bars in `[start, end]`, ordered oldest to newest.
    async fn history(
        &self,
        _symbol: &str,
        _market: Market,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        Err(DataError::unsupported(self.name(), "history"))
    }

    /// Institutional flow rows in `[start, end]`, ordered by date.
    async fn institutional_flow(
        &self,
        _symbol: &str,
        _market: Market,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<InstitutionalFlow>, DataError> {
        Err(DataError::unsupported(self.name(), "institutional flow"))
    }

    /// Latest valuation snapshot.
    async fn fundamentals(&self, _symbol: &str, _market: Market) -> Result<Fundamentals, DataError> {
        Err(DataError::unsupported(self.name(), "fundamentals"))
    }
}
