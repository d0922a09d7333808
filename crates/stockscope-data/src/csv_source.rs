//! Offline CSV inputs: OHLCV history and portfolio holdings.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use stockscope_core::error::DataError;
use stockscope_core::types::{tidy_history, Bar, Holding};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct BarRecord {
    #[serde(alias = "Date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct HoldingRecord {
    #[serde(alias = "Symbol", alias = "code", alias = "stock_id")]
    symbol: String,
    #[serde(alias = "Name", default)]
    name: Option<String>,
    #[serde(alias = "value", alias = "Value", alias = "MarketValue")]
    market_value: String,
    #[serde(alias = "Industry", alias = "sector", alias = "Sector", default)]
    industry: Option<String>,
}

/// CSV file on disk.
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::ParseError(format!(
                "File not found: {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn reader(&self) -> Result<csv::Reader<std::fs::File>, DataError> {
        ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(e.to_string()))
    }

    /// Daily bars sorted oldest first. Invalid rows are dropped.
    pub fn load_bars(&self) -> Result<Vec<Bar>, DataError> {
        read_bars(self.reader()?)
    }

    /// Portfolio holdings. Blank industries stay `None`.
    pub fn load_holdings(&self) -> Result<Vec<Holding>, DataError> {
        read_holdings(self.reader()?)
    }
}

fn read_bars<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Bar>, DataError> {
    let mut bars = Vec::new();
    for result in reader.deserialize() {
        let record: BarRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        let bar = Bar::new(
            parse_timestamp(&record.date)?,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        );
        if bar.is_valid() {
            bars.push(bar);
        } else {
            debug!(date = %record.date, "Skipping invalid bar");
        }
    }

    let bars = tidy_history(bars);
    if bars.is_empty() {
        return Err(DataError::NoDataAvailable);
    }
    Ok(bars)
}

fn read_holdings<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Holding>, DataError> {
    let mut holdings = Vec::new();
    for result in reader.deserialize() {
        let record: HoldingRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        let cleaned: String = record.market_value.chars().filter(|c| *c != ',').collect();
        let market_value = Decimal::from_str(&cleaned).map_err(|e| {
            DataError::ParseError(format!("Bad market value for {}: {}", record.symbol, e))
        })?;
        if record.symbol.is_empty() {
            warn!("Skipping holding without a symbol");
            continue;
        }
        holdings.push(Holding {
            symbol: record.symbol,
            name: record.name.filter(|n| !n.is_empty()),
            market_value,
            industry: record.industry.filter(|i| !i.is_empty()),
        });
    }
    Ok(holdings)
}

/// Parse a date cell into epoch milliseconds.
fn parse_timestamp(raw: &str) -> Result<i64, DataError> {
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp_millis());
    }
    for format in FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, format) {
            return Ok(d.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis());
        }
    }

    // Unix seconds or milliseconds
    if let Ok(ts) = raw.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!("Could not parse date: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("2024-01-02").unwrap(), 1_704_153_600_000);
        assert_eq!(parse_timestamp("2024/01/02").unwrap(), 1_704_153_600_000);
        assert_eq!(parse_timestamp("20240102").unwrap(), 1_704_153_600_000);
        assert!(parse_timestamp("2024-01-15 10:30:00").is_ok());
        assert_eq!(parse_timestamp("1704153600").unwrap(), 1_704_153_600_000);
        assert_eq!(parse_timestamp("1704153600000").unwrap(), 1_704_153_600_000);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_read_bars_sorts_and_filters() {
        let data = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-03,584,585,576,578,35888090\n\
                    2024-01-02,590,593,589,593,41245880\n\
                    2024-01-04,0,0,0,0,0\n";
        let bars = read_bars(reader(data)).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 593.0);
        assert_eq!(bars[1].close, 578.0);
    }

    #[test]
    fn test_read_bars_empty() {
        let data = "date,open,high,low,close,volume\n";
        assert_eq!(read_bars(reader(data)).unwrap_err(), DataError::NoDataAvailable);
    }

    #[test]
    fn test_read_holdings() {
        let data = "symbol,name,market_value,industry\n\
                    2330,TSMC,\"500,000\",Semiconductors\n\
                    2603,,120000.50,\n";
        let holdings = read_holdings(reader(data)).unwrap();

        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].market_value, dec!(500000));
        assert_eq!(holdings[0].industry.as_deref(), Some("Semiconductors"));
        assert_eq!(holdings[1].market_value, dec!(120000.50));
        assert_eq!(holdings[1].name, None);
        assert_eq!(holdings[1].industry_or_default(), "Unclassified");
    }

    #[test]
    fn test_missing_file() {
        assert!(CsvDataSource::new("/nonexistent/bars.csv").is_err());
    }
}
