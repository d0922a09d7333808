//! Taipei Exchange (OTC) open data.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::Value;
use stockscope_core::error::DataError;
use stockscope_core::traits::MarketDataProvider;
use stockscope_core::types::{tidy_history, Bar, Market, StockQuote};
use tracing::debug;

use crate::http::HttpClient;
use crate::parse::{cell_number, cell_text, months_between, parse_number, parse_roc_date, roc_month};

pub const TPEX_BASE_URL: &str = "https://www.tpex.org.tw";

/// Row of the `tpex_mainboard_daily_close_quotes` open API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DailyCloseQuote {
    date: String,
    securities_company_code: String,
    company_name: Option<String>,
    close: Option<String>,
    change: Option<String>,
    open: Option<String>,
    high: Option<String>,
    low: Option<String>,
    trading_shares: Option<String>,
}

/// Quote for `code` from the full daily close quotes listing.
pub fn parse_daily_close_quotes(body: &str, code: &str) -> Result<StockQuote, DataError> {
    let rows: Vec<DailyCloseQuote> =
        serde_json::from_str(body).map_err(|e| DataError::ParseError(e.to_string()))?;
    let row = rows
        .into_iter()
        .find(|r| r.securities_company_code.trim() == code)
        .ok_or_else(|| DataError::SymbolNotFound(code.to_string()))?;

    let num = |field: &Option<String>| field.as_deref().and_then(parse_number);
    let price = num(&row.close)
        .ok_or_else(|| DataError::ParseError(format!("No close for {}", code)))?;
    let prev_close = num(&row.change).map(|change| price - change);
    let timestamp = parse_roc_date(&row.date)
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or_else(chrono::Utc::now);

    Ok(StockQuote {
        symbol: code.to_string(),
        name: row.company_name.map(|n| n.trim().to_string()),
        market: Market::Tpex,
        price,
        open: num(&row.open),
        high: num(&row.high),
        low: num(&row.low),
        prev_close,
        volume: num(&row.trading_shares),
        timestamp,
        source: "tpex".to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct TradingInfoResponse {
    #[serde(rename = "aaData", default)]
    aa_data: Vec<Vec<Value>>,
}

/// Daily bars from the monthly trading info report. Volume is reported in
/// thousands of shares.
pub fn parse_trading_info(body: &str) -> Result<Vec<Bar>, DataError> {
    let response: TradingInfoResponse =
        serde_json::from_str(body).map_err(|e| DataError::ParseError(e.to_string()))?;
    // 日期, 成交仟股, 成交仟元, 開盤, 最高, 最低, 收盤, 漲跌, 筆數
    Ok(response
        .aa_data
        .iter()
        .filter_map(|row| {
            let date = parse_roc_date(&cell_text(row.first()?))?;
            Some(Bar::on_date(
                date,
                cell_number(row, 3)?,
                cell_number(row, 4)?,
                cell_number(row, 5)?,
                cell_number(row, 6)?,
                cell_number(row, 1).unwrap_or(0.0) * 1000.0,
            ))
        })
        .collect())
}

/// TPEx client for OTC stocks.
pub struct TpexClient {
    http: HttpClient,
    base_url: String,
}

impl TpexClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for TpexClient {
    fn name(&self) -> &str {
        "tpex"
    }

    fn supports(&self, market: Market) -> bool {
        market == Market::Tpex
    }

    async fn quote(&self, symbol: &str, _market: Market) -> Result<StockQuote, DataError> {
        let code = Market::bare_symbol(symbol);
        let request = self.http.get(&format!(
            "{}/openapi/v1/tpex_mainboard_daily_close_quotes",
            self.base_url
        ));
        let body = self.http.send_text(request).await?;
        parse_daily_close_quotes(&body, &code)
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
            let request = self
                .http
                .get(&format!(
                    "{}/web/stock/aftertrading/daily_trading_info/st43_result.php",
                    self.base_url
                ))
                .query(&[("l", "zh-tw".to_string()), ("d", roc_month(month)), ("stkno", code.clone())]);
            let body = self.http.send_text(request).await?;
            let month_bars = parse_trading_info(&body)?;
            debug!(symbol = %code, %month, bars = month_bars.len(), "TPEx month loaded");
            bars.extend(month_bars);
        }

        let bars = tidy_history(bars.into_iter().filter(|b| b.in_range(start, end)));
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_daily_close_quotes() {
        let body = r#"[
            {"Date":"1130102","SecuritiesCompanyCode":"6488","CompanyName":"環球晶","Close":"560.00","Change":"-5.00","Open":"565.00","High":"568.00","Low":"558.00","Average":"561.2","TradingShares":"1,234,567"},
            {"Date":"1130102","SecuritiesCompanyCode":"8069","CompanyName":"元太","Close":"200.50","Change":"+1.50","Open":"199.00","High":"201.00","Low":"198.50","TradingShares":"3,000,000"}
        ]"#;

        let quote = parse_daily_close_quotes(body, "6488").unwrap();
        assert_eq!(quote.market, Market::Tpex);
        assert_eq!(quote.price, 560.0);
        assert_eq!(quote.prev_close, Some(565.0));
        assert_eq!(quote.volume, Some(1_234_567.0));
        assert_eq!(quote.timestamp.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        let other = parse_daily_close_quotes(body, "8069").unwrap();
        assert_eq!(other.prev_close, Some(199.0));

        assert_eq!(
            parse_daily_close_quotes(body, "0000").unwrap_err(),
            DataError::SymbolNotFound("0000".to_string())
        );
    }

    #[test]
    fn test_parse_trading_info() {
        let body = r#"{"stkNo":"6488","reportDate":"113/01","iTotalRecords":2,"aaData":[
            ["113/01/02","1,234","700,000","565.00","568.00","558.00","560.00","-5.00","2,100"],
            ["113/01/03","980","550,000","560.00","562.00","551.00","555.00","-5.00","1,800"]
        ]}"#;
        let bars = parse_trading_info(body).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].volume, 1_234_000.0);
        assert_eq!(bars[1].close, 555.0);
    }

    #[test]
    fn test_parse_trading_info_empty() {
        let bars = parse_trading_info(r#"{"aaData":[]}"#).unwrap();
        assert!(bars.is_empty());
    }
}
