//! Yahoo Finance chart API, the last-resort source for every market.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde_json::Value;
use stockscope_core::error::DataError;
use stockscope_core::traits::MarketDataProvider;
use stockscope_core::types::{Bar, Market, StockQuote};

use crate::http::HttpClient;

pub const YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

fn chart_result(json: &Value) -> Result<&Value, DataError> {
    let chart = json
        .get("chart")
        .ok_or_else(|| DataError::ParseError("Missing chart object".to_string()))?;
    if let Some(description) = chart
        .get("error")
        .and_then(|e| e.get("description"))
        .and_then(|d| d.as_str())
    {
        return Err(DataError::SymbolNotFound(description.to_string()));
    }
    chart
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or(DataError::NoDataAvailable)
}

fn series<'a>(quote: &'a Value, key: &str) -> &'a [Value] {
    quote
        .get(key)
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Daily bars from a chart response. Null slots (halted days) are skipped.
pub fn parse_chart_bars(body: &str) -> Result<Vec<Bar>, DataError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| DataError::ParseError(e.to_string()))?;
    let result = chart_result(&json)?;

    let timestamps = series(result, "timestamp");
    let quote = result
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or(DataError::NoDataAvailable)?;
    let (opens, highs, lows, closes, volumes) = (
        series(quote, "open"),
        series(quote, "high"),
        series(quote, "low"),
        series(quote, "close"),
        series(quote, "volume"),
    );
    let at = |values: &[Value], i: usize| values.get(i).and_then(|v| v.as_f64());

    let bars = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let bar = Bar::new(
                ts.as_i64()? * 1000,
                at(opens, i)?,
                at(highs, i)?,
                at(lows, i)?,
                at(closes, i)?,
                at(volumes, i).unwrap_or(0.0),
            );
            bar.is_valid().then_some(bar)
        })
        .collect();
    Ok(bars)
}

/// Quote from a chart response's `meta` block, with the day's bar when present.
pub fn parse_chart_quote(body: &str, symbol: &str, market: Market) -> Result<StockQuote, DataError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| DataError::ParseError(e.to_string()))?;
    let meta = chart_result(&json)?
        .get("meta")
        .ok_or_else(|| DataError::ParseError("Missing chart meta".to_string()))?;
    let field = |key: &str| meta.get(key).and_then(|v| v.as_f64());

    let price = field("regularMarketPrice")
        .ok_or_else(|| DataError::ParseError(format!("No price for {}", symbol)))?;
    let timestamp = meta
        .get("regularMarketTime")
        .and_then(|v| v.as_i64())
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .unwrap_or_else(Utc::now);
    let name = meta
        .get("longName")
        .or_else(|| meta.get("shortName"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let last_bar = parse_chart_bars(body).ok().and_then(|bars| bars.last().copied());

    Ok(StockQuote {
        symbol: Market::bare_symbol(symbol),
        name,
        market,
        price,
        open: last_bar.map(|b| b.open),
        high: field("regularMarketDayHigh").or(last_bar.map(|b| b.high)),
        low: field("regularMarketDayLow").or(last_bar.map(|b| b.low)),
        prev_close: field("chartPreviousClose").or_else(|| field("previousClose")),
        volume: field("regularMarketVolume").or(last_bar.map(|b| b.volume)),
        timestamp,
        source: "yahoo".to_string(),
    })
}

/// Yahoo chart client.
pub struct YahooClient {
    http: HttpClient,
    base_url: String,
}

impl YahooClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn chart(
        &self,
        symbol: &str,
        market: Market,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String, DataError> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive
        let period2 = (end + Duration::days(1)).and_time(NaiveTime::MIN).and_utc().timestamp();
        let request = self
            .http
            .get(&format!(
                "{}/v8/finance/chart/{}",
                self.base_url,
                market.yahoo_symbol(symbol)
            ))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ]);
        self.http.send_text(request).await
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn supports(&self, _market: Market) -> bool {
        true
    }

    async fn quote(&self, symbol: &str, market: Market) -> Result<StockQuote, DataError> {
        let end = Utc::now().date_naive();
        let body = self.chart(symbol, market, end - Duration::days(7), end).await?;
        parse_chart_quote(&body, symbol, market)
    }

    async fn history(
        &self,
        symbol: &str,
        market: Market,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = parse_chart_bars(&self.chart(symbol, market, start, end).await?)?;
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(bars)
    }
}
