//! Taiwan Stock Exchange open data.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use stockscope_core::error::DataError;
use stockscope_core::traits::MarketDataProvider;
use stockscope_core::types::{tidy_history, Bar, Fundamentals, InstitutionalFlow, Market, StockQuote};
use tracing::{debug, warn};

use crate::http::HttpClient;
use crate::parse::{
    cell_number, cell_text, compact_date, find_field, months_between, parse_number,
    parse_roc_date, recent_weekdays, taipei_today,
};

pub const TWSE_BASE_URL: &str = "https://www.twse.com.tw";
pub const TWSE_MIS_URL: &str = "https://mis.twse.com.tw";

/// Most recent trading days fetched for one institutional flow request.
const MAX_FLOW_DAYS: usize = 20;

/// Legacy report envelope shared by STOCK_DAY, T86 and BWIBBU_d.
#[derive(Debug, Deserialize)]
struct ReportResponse {
    stat: String,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

impl ReportResponse {
    fn parse(body: &str) -> Result<Self, DataError> {
        let report: ReportResponse =
            serde_json::from_str(body).map_err(|e| DataError::ParseError(e.to_string()))?;
        if !report.stat.eq_ignore_ascii_case("OK") {
            return Err(DataError::NoDataAvailable);
        }
        Ok(report)
    }

    fn row_for(&self, code: &str) -> Option<&Vec<Value>> {
        self.data
            .iter()
            .find(|row| row.first().map(|c| cell_text(c).trim() == code).unwrap_or(false))
    }
}

/// Daily bars from a STOCK_DAY monthly report.
pub fn parse_stock_day(body: &str) -> Result<Vec<Bar>, DataError> {
    let report = ReportResponse::parse(body)?;
    // 日期, 成交股數, 成交金額, 開盤價, 最高價, 最低價, 收盤價, 漲跌價差, 成交筆數
    let bars = report
        .data
        .iter()
        .filter_map(|row| {
            let date = parse_roc_date(&cell_text(row.first()?))?;
            Some(Bar::on_date(
                date,
                cell_number(row, 3)?,
                cell_number(row, 4)?,
                cell_number(row, 5)?,
                cell_number(row, 6)?,
                cell_number(row, 1).unwrap_or(0.0),
            ))
        })
        .collect();
    Ok(bars)
}

#[derive(Debug, Deserialize)]
struct MisResponse {
    #[serde(rename = "msgArray", default)]
    msg_array: Vec<MisQuote>,
}

#[derive(Debug, Deserialize)]
struct MisQuote {
    c: String,
    n: Option<String>,
    /// Last trade, "-" between trades
    z: Option<String>,
    o: Option<String>,
    h: Option<String>,
    l: Option<String>,
    /// Previous close
    y: Option<String>,
    /// Accumulated volume in lots of 1000 shares
    v: Option<String>,
    tlong: Option<String>,
}

/// Real-time quote from the MIS `getStockInfo.jsp` endpoint.
pub fn parse_mis_quote(body: &str, market: Market) -> Result<StockQuote, DataError> {
    let response: MisResponse =
        serde_json::from_str(body).map_err(|e| DataError::ParseError(e.to_string()))?;
    let raw = response
        .msg_array
        .into_iter()
        .next()
        .ok_or(DataError::NoDataAvailable)?;

    let num = |field: &Option<String>| field.as_deref().and_then(parse_number);
    let prev_close = num(&raw.y);
    let price = num(&raw.z)
        .or_else(|| num(&raw.o))
        .or(prev_close)
        .ok_or_else(|| DataError::ParseError(format!("No price for {}", raw.c)))?;

    let timestamp = raw
        .tlong
        .as_deref()
        .and_then(|t| t.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_else(Utc::now);

    Ok(StockQuote {
        symbol: raw.c,
        name: raw.n,
        market,
        price,
        open: num(&raw.o),
        high: num(&raw.h),
        low: num(&raw.l),
        prev_close,
        volume: num(&raw.v).map(|lots| lots * 1000.0),
        timestamp,
        source: "twse".to_string(),
    })
}

/// One symbol's row of a T86 institutional trading report.
pub fn parse_t86(body: &str, code: &str, date: NaiveDate) -> Result<Option<InstitutionalFlow>, DataError> {
    let report = ReportResponse::parse(body)?;
    let Some(row) = report.row_for(code) else {
        return Ok(None);
    };

    let fields = &report.fields;
    let value = |index: Option<usize>| index.and_then(|i| cell_number(row, i)).unwrap_or(0.0) as i64;

    let foreign = find_field(fields, |f| {
        f.starts_with("外陸資買賣超股數") || f.starts_with("外資買賣超股數")
    })
    .or(Some(4));
    let foreign_dealer = find_field(fields, |f| f.starts_with("外資自營商買賣超股數"));
    let trust = find_field(fields, |f| f.starts_with("投信買賣超股數")).or(Some(10));

    let dealer_net = match find_field(fields, |f| f == "自營商買賣超股數") {
        Some(i) => value(Some(i)),
        None => {
            let own = find_field(fields, |f| f.starts_with("自營商買賣超股數(自行買賣)"));
            let hedge = find_field(fields, |f| f.starts_with("自營商買賣超股數(避險)"));
            value(own) + value(hedge)
        }
    };

    Ok(Some(InstitutionalFlow {
        symbol: code.to_string(),
        date,
        foreign_net: value(foreign) + value(foreign_dealer),
        trust_net: value(trust),
        dealer_net,
    }))
}

/// One symbol's valuation row of a BWIBBU_d report.
pub fn parse_bwibbu(body: &str, code: &str, date: NaiveDate) -> Result<Option<Fundamentals>, DataError> {
    let report = ReportResponse::parse(body)?;
    let Some(row) = report.row_for(code) else {
        return Ok(None);
    };

    let fields = &report.fields;
    let column = |pred: fn(&str) -> bool, fallback: usize| {
        find_field(fields, pred).unwrap_or(fallback)
    };
    let yield_idx = column(|f| f.contains("殖利率"), 2);
    let pe_idx = column(|f| f.contains("本益比"), 4);
    let pb_idx = column(|f| f.contains("股價淨值比"), 5);

    Ok(Some(Fundamentals {
        symbol: code.to_string(),
        date: Some(date),
        pe_ratio: cell_number(row, pe_idx),
        pb_ratio: cell_number(row, pb_idx),
        dividend_yield: cell_number(row, yield_idx),
        ..Fundamentals::default()
    }))
}

/// TWSE open data client for listed stocks.
pub struct TwseClient {
    http: HttpClient,
    base_url: String,
    mis_url: String,
}

impl TwseClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>, mis_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mis_url: mis_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn report(&self, path: &str, query: &[(&str, String)]) -> Result<String, DataError> {
        let request = self
            .http
            .get(&format!("{}/{}", self.base_url, path))
            .query(&[("response", "json")])
            .query(query);
        self.http.send_text(request).await
    }

    async fn stock_day(&self, code: &str, month: NaiveDate) -> Result<Vec<Bar>, DataError> {
        let body = self
            .report(
                "exchangeReport/STOCK_DAY",
                &[("date", compact_date(month)), ("stockNo", code.to_string())],
            )
            .await?;
        parse_stock_day(&body)
    }
}

#[async_trait]
impl MarketDataProvider for TwseClient {
    fn name(&self) -> &str {
        "twse"
    }

    fn supports(&self, market: Market) -> bool {
        market == Market::Twse
    }

    async fn quote(&self, symbol: &str, market: Market) -> Result<StockQuote, DataError> {
        let code = Market::bare_symbol(symbol);
        let request = self
            .http
            .get(&format!("{}/stock/api/getStockInfo.jsp", self.mis_url))
            .query(&[
                ("ex_ch", format!("tse_{}.tw", code)),
                ("json", "1".to_string()),
                ("delay", "0".to_string()),
            ]);
        let body = self.http.send_text(request).await?;
        parse_mis_quote(&body, market)
    }

    async fn history(
        &self,
        symbol: &str,
        _market: Market,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let code = Market::bare_symbol(symbol);
        let mut bars = Vec::new();

        for month in months_between(start, end) {
            match self.stock_day(&code, month).await {
                Ok(month_bars) => bars.extend(month_bars),
                Err(DataError::NoDataAvailable) => {
                    debug!(symbol = %code, %month, "No STOCK_DAY data for month");
                }
                Err(e) => return Err(e),
            }
        }

        let bars = tidy_history(bars.into_iter().filter(|b| b.in_range(start, end)));
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
        let mut flows = Vec::new();

        for day in recent_weekdays(start, end, MAX_FLOW_DAYS) {
            let body = match self
                .report(
                    "fund/T86",
                    &[("date", compact_date(day)), ("selectType", "ALLBUT0999".to_string())],
                )
                .await
            {
                Ok(body) => body,
                Err(e) => {
                    warn!(symbol = %code, %day, error = %e, "T86 request failed");
                    continue;
                }
            };
            match parse_t86(&body, &code, day) {
                Ok(Some(flow)) => flows.push(flow),
                Ok(None) | Err(DataError::NoDataAvailable) => {}
                Err(e) => warn!(symbol = %code, %day, error = %e, "Unreadable T86 report"),
            }
        }

        if flows.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(flows)
    }

    async fn fundamentals(&self, symbol: &str, _market: Market) -> Result<Fundamentals, DataError> {
        let code = Market::bare_symbol(symbol);
        let today = taipei_today();

        // Walk back over weekends and holidays
        for offset in 0..7 {
            let day = today - Duration::days(offset);
            let body = self
                .report(
                    "exchangeReport/BWIBBU_d",
                    &[("date", compact_date(day)), ("selectType", "ALL".to_string())],
                )
                .await?;
            match parse_bwibbu(&body, &code, day) {
                Ok(Some(f)) => return Ok(f),
                Ok(None) => return Err(DataError::SymbolNotFound(code)),
                Err(DataError::NoDataAvailable) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(DataError::NoDataAvailable)
    }
}
