//! Provider fallback chains behind per-kind TTL caches.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate};
use stockscope_core::error::DataError;
use stockscope_core::traits::{Clock, MarketDataProvider};
use stockscope_core::types::{Bar, Fundamentals, InstitutionalFlow, Market, StockQuote};
use tracing::{debug, info, warn};

use crate::cache::TtlCache;

/// Time-to-live per cached data kind.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub quote: Duration,
    pub history: Duration,
    pub institutional: Duration,
    pub fundamentals: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            quote: Duration::from_secs(60),
            history: Duration::from_secs(3600),
            institutional: Duration::from_secs(3600),
            fundamentals: Duration::from_secs(86_400),
        }
    }
}

/// Market data facade.
///
/// Providers are tried in registration order, skipping those that do not
/// cover the symbol's market. Registering TWSE, TPEx, FinMind, Yahoo gives
/// the chains listed → TWSE, FinMind, Yahoo; OTC → TPEx, FinMind, Yahoo;
/// US → Yahoo. Only successes are cached. When every provider fails the
/// caller gets `None` or an empty vector.
pub struct MarketDataService {
    providers: Vec<Arc<dyn MarketDataProvider>>,
    quotes: TtlCache<StockQuote>,
    history: TtlCache<Vec<Bar>>,
    flows: TtlCache<Vec<InstitutionalFlow>>,
    fundamentals: TtlCache<Fundamentals>,
    clock: Arc<dyn Clock>,
}

impl MarketDataService {
    pub fn new(
        providers: Vec<Arc<dyn MarketDataProvider>>,
        ttls: CacheTtls,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            providers = ?providers.iter().map(|p| p.name().to_string()).collect::<Vec<_>>(),
            "Market data service ready"
        );
        Self {
            providers,
            quotes: TtlCache::new("quote", ttls.quote, clock.clone()),
            history: TtlCache::new("history", ttls.history, clock.clone()),
            flows: TtlCache::new("institutional", ttls.institutional, clock.clone()),
            fundamentals: TtlCache::new("fundamentals", ttls.fundamentals, clock.clone()),
            clock,
        }
    }

    /// Provider names tried for `market`, in order.
    pub fn chain(&self, market: Market) -> Vec<&str> {
        self.providers
            .iter()
            .filter(|p| p.supports(market))
            .map(|p| p.name())
            .collect()
    }

    fn today(&self) -> NaiveDate {
        // Taiwan exchanges close on Taipei dates
        (self.clock.now() + ChronoDuration::hours(8)).date_naive()
    }

    /// Run `call` down the chain for `market`, returning the first success.
    async fn first_success<T, F, Fut>(
        &self,
        kind: &'static str,
        symbol: &str,
        market: Market,
        call: F,
    ) -> Result<T, DataError>
    where
        F: Fn(Arc<dyn MarketDataProvider>) -> Fut,
        Fut: Future<Output = Result<T, DataError>>,
    {
        let mut last_error = DataError::NoDataAvailable;

        for provider in self.providers.iter().filter(|p| p.supports(market)) {
            match call(provider.clone()).await {
                Ok(value) => {
                    debug!(provider = provider.name(), kind, symbol, "Provider answered");
                    return Ok(value);
                }
                Err(e @ DataError::Unsupported { .. }) => {
                    debug!(provider = provider.name(), kind, symbol, "Skipping: {}", e);
                    last_error = e;
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        kind,
                        symbol,
                        error = %e,
                        "Provider failed, falling back"
                    );
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    /// Latest quote; market inferred from the symbol.
    pub async fn quote(&self, symbol: &str) -> Option<StockQuote> {
        self.quote_in(symbol, Market::infer(symbol)).await
    }

    pub async fn quote_in(&self, symbol: &str, market: Market) -> Option<StockQuote> {
        let key = format!("{}:{}", market, Market::bare_symbol(symbol));
        self.quotes
            .get_or_insert_with(&key, || {
                self.first_success("quote", symbol, market, |p| async move {
                    p.quote(symbol, market).await
                })
            })
            .await
            .map_err(|e| warn!(symbol, %market, error = %e, "No quote from any provider"))
            .ok()
    }

    /// Daily bars in `[start, end]`, oldest first.
    pub async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
        self.history_in(symbol, Market::infer(symbol), start, end).await
    }

    pub async fn history_in(
        &self,
        symbol: &str,
        market: Market,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<Bar> {
        if start > end {
            return Vec::new();
        }
        let key = format!("{}:{}:{}:{}", market, Market::bare_symbol(symbol), start, end);
        self.history
            .get_or_insert_with(&key, || {
                self.first_success("history", symbol, market, |p| async move {
                    p.history(symbol, market, start, end).await
                })
            })
            .await
            .map_err(|e| warn!(symbol, %market, error = %e, "No history from any provider"))
            .unwrap_or_default()
    }

    /// Bars covering the last `days` calendar days.
    pub async fn recent_history(&self, symbol: &str, days: u32) -> Vec<Bar> {
        let end = self.today();
        let start = end - ChronoDuration::days(i64::from(days));
        self.history(symbol, start, end).await
    }

    /// Institutional flows over the last `days` calendar days. Empty for
    /// markets without institutional data.
    pub async fn institutional_flow(&self, symbol: &str, days: u32) -> Vec<InstitutionalFlow> {
        let market = Market::infer(symbol);
        if !market.is_taiwan() {
            return Vec::new();
        }
        let end = self.today();
        let start = end - ChronoDuration::days(i64::from(days));
        let key = format!("{}:{}:{}:{}", market, Market::bare_symbol(symbol), start, end);

        let mut flows = self
            .flows
            .get_or_insert_with(&key, || {
                self.first_success("institutional", symbol, market, |p| async move {
                    p.institutional_flow(symbol, market, start, end).await
                })
            })
            .await
            .map_err(|e| warn!(symbol, error = %e, "No institutional flow from any provider"))
            .unwrap_or_default();
        flows.sort_by_key(|f| f.date);
        flows
    }

    /// Valuation snapshot. Later providers fill fields the first one left
    /// empty.
    pub async fn fundamentals(&self, symbol: &str) -> Option<Fundamentals> {
        let market = Market::infer(symbol);
        let key = format!("{}:{}", market, Market::bare_symbol(symbol));
        if let Some(cached) = self.fundamentals.get(&key) {
            return Some(cached);
        }

        let mut merged: Option<Fundamentals> = None;
        for provider in self.providers.iter().filter(|p| p.supports(market)) {
            match provider.fundamentals(symbol, market).await {
                Ok(snapshot) => {
                    let next = match merged.take() {
                        Some(current) => current.merge(&snapshot),
                        None => snapshot,
                    };
                    let complete = next.pe_ratio.is_some()
                        && next.pb_ratio.is_some()
                        && next.dividend_yield.is_some();
                    merged = Some(next);
                    if complete {
                        break;
                    }
                }
                Err(DataError::Unsupported { .. }) => {}
                Err(e) => warn!(
                    provider = provider.name(),
                    symbol,
                    error = %e,
                    "Fundamentals failed, falling back"
                ),
            }
        }

        if let Some(ref snapshot) = merged {
            self.fundamentals.insert(key, snapshot.clone());
        }
        merged
    }

    /// Drop expired entries from every cache. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.quotes.purge_expired()
            + self.history.purge_expired()
            + self.flows.purge_expired()
            + self.fundamentals.purge_expired()
    }

    pub fn clear_caches(&self) {
        self.quotes.clear();
        self.history.clear();
        self.flows.clear();
        self.fundamentals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stockscope_core::traits::ManualClock;

    struct MockProvider {
        name: &'static str,
        markets: Vec<Market>,
        fail: bool,
        price: f64,
        calls: AtomicUsize,
        fundamentals: Option<Fundamentals>,
    }

    impl MockProvider {
        fn new(name: &'static str, markets: &[Market], price: f64) -> Self {
            Self {
                name,
                markets: markets.to_vec(),
                fail: false,
                price,
                calls: AtomicUsize::new(0),
                fundamentals: None,
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn with_fundamentals(mut self, f: Fundamentals) -> Self {
            self.fundamentals = Some(f);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, market: Market) -> bool {
            self.markets.contains(&market)
        }

        async fn quote(&self, symbol: &str, market: Market) -> Result<StockQuote, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataError::Http("connection reset".to_string()));
            }
            Ok(StockQuote {
                symbol: Market::bare_symbol(symbol),
                name: None,
                market,
                price: self.price,
                open: None,
                high: None,
                low: None,
                prev_close: None,
                volume: None,
                timestamp: Utc::now(),
                source: self.name.to_string(),
            })
        }

        async fn history(
            &self,
            _symbol: &str,
            _market: Market,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<Bar>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataError::NoDataAvailable);
            }
            Ok(vec![Bar::on_date(start, 10.0, 11.0, 9.0, self.price, 1000.0)])
        }

        async fn fundamentals(&self, _symbol: &str, _market: Market) -> Result<Fundamentals, DataError> {
            self.fundamentals
                .clone()
                .ok_or_else(|| DataError::unsupported(self.name, "fundamentals"))
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 2, 2, 0, 0).unwrap()))
    }

    fn service(providers: Vec<Arc<MockProvider>>, clock: Arc<ManualClock>) -> MarketDataService {
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn MarketDataProvider>)
            .collect();
        MarketDataService::new(providers, CacheTtls::default(), clock)
    }

    #[tokio::test]
    async fn test_chains_follow_market() {
        let twse = Arc::new(MockProvider::new("twse", &[Market::Twse], 1.0));
        let tpex = Arc::new(MockProvider::new("tpex", &[Market::Tpex], 1.0));
        let finmind = Arc::new(MockProvider::new("finmind", &[Market::Twse, Market::Tpex], 1.0));
        let yahoo = Arc::new(MockProvider::new("yahoo", &[Market::Twse, Market::Tpex, Market::Us], 1.0));
        let svc = service(vec![twse, tpex, finmind, yahoo], clock());

        assert_eq!(svc.chain(Market::Twse), vec!["twse", "finmind", "yahoo"]);
        assert_eq!(svc.chain(Market::Tpex), vec!["tpex", "finmind", "yahoo"]);
        assert_eq!(svc.chain(Market::Us), vec!["yahoo"]);
    }

    #[tokio::test]
    async fn test_quote_falls_back() {
        let primary = Arc::new(MockProvider::new("twse", &[Market::Twse], 100.0).failing());
        let backup = Arc::new(MockProvider::new("finmind", &[Market::Twse], 101.0));
        let svc = service(vec![primary.clone(), backup.clone()], clock());

        let quote = svc.quote("2330").await.unwrap();
        assert_eq!(quote.source, "finmind");
        assert_eq!(quote.price, 101.0);
        assert_eq!(primary.calls(), 1);
        assert_eq!(backup.calls(), 1);
    }

    #[tokio::test]
    async fn test_quote_is_cached_until_ttl() {
        let clock = clock();
        let provider = Arc::new(MockProvider::new("twse", &[Market::Twse], 100.0));
        let svc = service(vec![provider.clone()], clock.clone());

        svc.quote("2330.TW").await.unwrap();
        svc.quote("2330").await.unwrap();
        assert_eq!(provider.calls(), 1);

        clock.advance(ChronoDuration::seconds(61));
        svc.quote("2330").await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_total_failure_is_empty() {
        let provider = Arc::new(MockProvider::new("twse", &[Market::Twse], 100.0).failing());
        let svc = service(vec![provider.clone()], clock());
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        assert!(svc.quote("2330").await.is_none());
        assert!(svc.history("2330", day, day).await.is_empty());

        // Failures are not cached
        svc.quote("2330").await;
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_no_provider_for_market() {
        let provider = Arc::new(MockProvider::new("twse", &[Market::Twse], 100.0));
        let svc = service(vec![provider.clone()], clock());

        assert!(svc.quote("AAPL").await.is_none());
        assert!(svc.institutional_flow("AAPL", 30).await.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_history_keyed_by_range() {
        let provider = Arc::new(MockProvider::new("twse", &[Market::Twse], 100.0));
        let svc = service(vec![provider.clone()], clock());
        let jan2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let jan3 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();

        assert_eq!(svc.history("2330", jan2, jan3).await.len(), 1);
        svc.history("2330", jan2, jan3).await;
        svc.history("2330", jan3, jan3).await;
        assert_eq!(provider.calls(), 2);

        assert!(svc.history("2330", jan3, jan2).await.is_empty());
    }

    #[tokio::test]
    async fn test_fundamentals_merge_across_providers() {
        let partial = Fundamentals {
            symbol: "2330".to_string(),
            pe_ratio: Some(15.0),
            ..Default::default()
        };
        let fuller = Fundamentals {
            symbol: "2330".to_string(),
            pe_ratio: Some(16.0),
            pb_ratio: Some(4.5),
            dividend_yield: Some(2.1),
            ..Default::default()
        };
        let first = Arc::new(MockProvider::new("twse", &[Market::Twse], 1.0).with_fundamentals(partial));
        let second = Arc::new(MockProvider::new("finmind", &[Market::Twse], 1.0).with_fundamentals(fuller));
        let svc = service(vec![first, second], clock());

        let f = svc.fundamentals("2330").await.unwrap();
        assert_eq!(f.pe_ratio, Some(15.0));
        assert_eq!(f.pb_ratio, Some(4.5));
        assert_eq!(f.dividend_yield, Some(2.1));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let clock = clock();
        let provider = Arc::new(MockProvider::new("twse", &[Market::Twse], 100.0));
        let svc = service(vec![provider], clock.clone());

        svc.quote("2330").await;
        svc.recent_history("2330", 30).await;
        clock.advance(ChronoDuration::seconds(120));

        // Only the quote has outlived its TTL
        assert_eq!(svc.purge_expired(), 1);
    }
}
