//! FinMind v4 dataset API.
//!
//! Every dataset shares one endpoint and envelope; rows are keyed by
//! `date` and carry dataset-specific columns. Requests need a bearer token.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use stockscope_core::error::DataError;
use stockscope_core::traits::MarketDataProvider;
use stockscope_core::types::{tidy_history, Bar, Fundamentals, InstitutionalFlow, Market, StockQuote};
use tracing::debug;

use crate::http::HttpClient;
use crate::parse::taipei_today;

pub const FINMIND_BASE_URL: &str = "https://api.finmindtrade.com/api/v4/data";

/// Days looked back when a dataset is asked for "the latest" row.
const LOOKBACK_DAYS: i64 = 14;

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Envelope<T> {
    #[serde(default)]
    msg: String,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceRow {
    pub date: String,
    pub stock_id: Option<String>,
    #[serde(default)]
    pub open: f64,
    #[serde(default, rename = "max")]
    pub high: f64,
    #[serde(default, rename = "min")]
    pub low: f64,
    #[serde(default)]
    pub close: f64,
    #[serde(default, rename = "Trading_Volume")]
    pub volume: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerRow {
    pub date: String,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default, rename = "PER")]
    pub per: Option<f64>,
    #[serde(default, rename = "PBR")]
    pub pbr: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstitutionalRow {
    pub date: String,
    pub name: String,
    #[serde(default)]
    pub buy: i64,
    #[serde(default)]
    pub sell: i64,
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, DataError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| DataError::ParseError(e.to_string()))?;
    match envelope.status {
        Some(200) | None => Ok(envelope.data),
        Some(status) => Err(DataError::Status {
            status,
            body: envelope.msg,
        }),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Bars from a `TaiwanStockPrice` response. Rows with a zero close (no trade)
/// are dropped.
pub fn parse_prices(body: &str) -> Result<Vec<Bar>, DataError> {
    let rows: Vec<PriceRow> = decode(body)?;
    Ok(tidy_history(rows.iter().filter_map(|r| {
        Some(Bar::on_date(parse_date(&r.date)?, r.open, r.high, r.low, r.close, r.volume))
    })))
}

/// Latest row of a `TaiwanStockPER` response.
pub fn parse_per(body: &str, code: &str) -> Result<Fundamentals, DataError> {
    let rows: Vec<PerRow> = decode(body)?;
    let latest = rows
        .iter()
        .filter_map(|r| parse_date(&r.date).map(|d| (d, r)))
        .max_by_key(|(d, _)| *d)
        .ok_or(DataError::NoDataAvailable)?;
    let positive = |v: Option<f64>| v.filter(|x| *x > 0.0);

    Ok(Fundamentals {
        symbol: code.to_string(),
        date: Some(latest.0),
        pe_ratio: positive(latest.1.per),
        pb_ratio: positive(latest.1.pbr),
        dividend_yield: latest.1.dividend_yield,
        ..Fundamentals::default()
    })
}

/// Daily institutional flows from a
/// `TaiwanStockInstitutionalInvestorsBuySell` response.
///
/// Foreign flow includes the foreign dealers' own book; dealer flow combines
/// proprietary and hedging desks.
pub fn parse_institutional(body: &str, code: &str) -> Result<Vec<InstitutionalFlow>, DataError> {
    let rows: Vec<InstitutionalRow> = decode(body)?;
    let mut by_date: BTreeMap<NaiveDate, InstitutionalFlow> = BTreeMap::new();

    for row in &rows {
        let Some(date) = parse_date(&row.date) else {
            continue;
        };
        let flow = by_date.entry(date).or_insert_with(|| InstitutionalFlow {
            symbol: code.to_string(),
            date,
            foreign_net: 0,
            trust_net: 0,
            dealer_net: 0,
        });
        let net = row.buy - row.sell;
        match row.name.as_str() {
            "Foreign_Investor" | "Foreign_Dealer_Self" => flow.foreign_net += net,
            "Investment_Trust" => flow.trust_net += net,
            "Dealer_self" | "Dealer_Hedging" | "Dealer" => flow.dealer_net += net,
            other => debug!(name = other, "Ignoring FinMind investor category"),
        }
    }

    Ok(by_date.into_values().collect())
}

/// FinMind client covering both Taiwan markets.
pub struct FinMindClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
    token_env: String,
}

impl FinMindClient {
    /// `token_env` names the variable the token was read from, for error messages.
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        token: Option<String>,
        token_env: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            token_env: token_env.into(),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    async fn dataset(
        &self,
        dataset: &str,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<String, DataError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| DataError::MissingToken(self.token_env.clone()))?;
        let request = self
            .http
            .get(&self.base_url)
            .bearer_auth(token)
            .query(&[
                ("dataset", dataset.to_string()),
                ("data_id", code.to_string()),
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
            ]);
        self.http.send_text(request).await
    }
}

#[async_trait]
impl MarketDataProvider for FinMindClient {
    fn name(&self) -> &str {
        "finmind"
    }

    fn supports(&self, market: Market) -> bool {
        market.is_taiwan()
    }

    async fn quote(&self, symbol: &str, market: Market) -> Result<StockQuote, DataError> {
        let code = Market::bare_symbol(symbol);
        let end = taipei_today();
        let start = end - Duration::days(LOOKBACK_DAYS);
        let bars = parse_prices(&self.dataset("TaiwanStockPrice", &code, start, end).await?)?;

        let (last, prev) = match bars.as_slice() {
            [] => return Err(DataError::NoDataAvailable),
            [only] => (only, None),
            [.., prev, last] => (last, Some(prev)),
        };
        Ok(StockQuote {
            symbol: code,
            name: None,
            market,
            price: last.close,
            open: Some(last.open),
            high: Some(last.high),
            low: Some(last.low),
            prev_close: prev.map(|p| p.close),
            volume: Some(last.volume),
            timestamp: last.date().and_time(NaiveTime::MIN).and_utc(),
            source: "finmind".to_string(),
        })
    }

    async fn history(
        &self,
        symbol: &str,
        _market: Market,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let code = Market::bare_symbol(symbol);
        let bars = parse_prices(&self.dataset("TaiwanStockPrice", &code, start, end).await?)?;
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(bars)
    }

    async fn institutional_flow(
        &self,
        symbol: &str,
        _market: Market,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<InstitutionalFlow>, DataError> {
        let code = Market::bare_symbol(symbol);
        let body = self
            .dataset("TaiwanStockInstitutionalInvestorsBuySell", &code, start, end)
            .await?;
        let flows = parse_institutional(&body, &code)?;
        if flows.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(flows)
    }

    async fn fundamentals(&self, symbol: &str, _market: Market) -> Result<Fundamentals, DataError> {
        let code = Market::bare_symbol(symbol);
        let end = taipei_today();
        let start = end - Duration::days(LOOKBACK_DAYS);
        parse_per(&self.dataset("TaiwanStockPER", &code, start, end).await?, &code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[test]
    fn test_parse_prices() {
        let body = r#"{"msg":"success","status":200,"data":[
            {"date":"2024-01-03","stock_id":"2330","Trading_Volume":35888090,"Trading_money":1,"open":584.0,"max":585.0,"min":576.0,"close":578.0,"spread":-15.0,"Trading_turnover":41778},
            {"date":"2024-01-02","stock_id":"2330","Trading_Volume":41245880,"Trading_money":1,"open":590.0,"max":593.0,"min":589.0,"close":593.0,"spread":0.0,"Trading_turnover":22445},
            {"date":"2024-01-04","stock_id":"2330","Trading_Volume":0,"open":0,"max":0,"min":0,"close":0}
        ]}"#;
        let bars = parse_prices(body).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].high, 593.0);
        assert_eq!(bars[1].volume, 35_888_090.0);
    }

    #[test]
    fn test_parse_institutional() {
        let body = r#"{"msg":"success","status":200,"data":[
            {"date":"2024-01-02","stock_id":"2330","buy":20000,"name":"Foreign_Investor","sell":5000},
            {"date":"2024-01-02","stock_id":"2330","buy":100,"name":"Foreign_Dealer_Self","sell":0},
            {"date":"2024-01-02","stock_id":"2330","buy":3000,"name":"Investment_Trust","sell":1000},
            {"date":"2024-01-02","stock_id":"2330","buy":0,"name":"Dealer_self","sell":300},
            {"date":"2024-01-02","stock_id":"2330","buy":0,"name":"Dealer_Hedging","sell":200},
            {"date":"2024-01-03","stock_id":"2330","buy":0,"name":"Foreign_Investor","sell":4000}
        ]}"#;
        let flows = parse_institutional(body, "2330").unwrap();

        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].foreign_net, 15_100);
        assert_eq!(flows[0].trust_net, 2_000);
        assert_eq!(flows[0].dealer_net, -500);
        assert_eq!(flows[0].total_net(), 16_600);
        assert_eq!(flows[1].foreign_net, -4_000);
    }

    #[test]
    fn test_parse_per_picks_latest() {
        let body = r#"{"msg":"success","status":200,"data":[
            {"date":"2024-01-02","stock_id":"2330","dividend_yield":2.1,"PER":15.5,"PBR":4.5},
            {"date":"2024-01-03","stock_id":"2330","dividend_yield":2.2,"PER":15.1,"PBR":4.4},
            {"date":"2023-12-29","stock_id":"2330","dividend_yield":2.0,"PER":16.0,"PBR":4.6}
        ]}"#;
        let f = parse_per(body, "2330").unwrap();
        assert_eq!(f.date, NaiveDate::from_ymd_opt(2024, 1, 3));
        assert_eq!(f.pe_ratio, Some(15.1));

        let loss_maker = r#"{"status":200,"data":[{"date":"2024-01-03","dividend_yield":0.0,"PER":0.0,"PBR":1.2}]}"#;
        assert_eq!(parse_per(loss_maker, "1101").unwrap().pe_ratio, None);
    }

    #[test]
    fn test_error_status() {
        let body = r#"{"msg":"Requests reach the upper limit.","status":402}"#;
        assert!(matches!(parse_prices(body), Err(DataError::Status { status: 402, .. })));
    }

    #[tokio::test]
    async fn test_missing_token() {
        let http = HttpClient::new(StdDuration::from_secs(1), StdDuration::ZERO, None).unwrap();
        let client = FinMindClient::new(http, FINMIND_BASE_URL, Some("  ".to_string()), "FINMIND_TOKEN");
        assert!(!client.has_token());

        let err = client.quote("2330", Market::Twse).await.unwrap_err();
        assert_eq!(err, DataError::MissingToken("FINMIND_TOKEN".to_string()));
    }
}
