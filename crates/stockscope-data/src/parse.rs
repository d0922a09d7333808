//! Field parsing shared by the Taiwan exchange payloads.
//!
//! Exchange JSON carries numbers as strings with thousands separators,
//! placeholders such as `--` for "no trade", and dates in the ROC calendar
//! (year - 1911).

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde_json::Value;

const ROC_OFFSET: i32 = 1911;

/// Parse a number like `"1,234.50"`. Placeholders and blanks are `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '+')
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '-' || c == 'X' || c == 'x') {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer share count like `"-12,345"`.
pub fn parse_int(raw: &str) -> Option<i64> {
    parse_number(raw).map(|v| v.round() as i64)
}

/// Parse `"113/01/02"` or `"1130102"` into 2024-01-02.
pub fn parse_roc_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let (year, month, day) = if raw.contains('/') {
        let mut parts = raw.split('/');
        (parts.next()?, parts.next()?, parts.next()?)
    } else {
        if raw.len() < 7 || !raw.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let split = raw.len() - 4;
        (&raw[..split], &raw[split..split + 2], &raw[split + 2..])
    };
    let year: i32 = year.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(
        year + ROC_OFFSET,
        month.trim().parse().ok()?,
        day.trim().parse().ok()?,
    )
}

/// Text of a JSON table cell; numbers are rendered, null is empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Cell `index` of a row parsed as a number.
pub fn cell_number(row: &[Value], index: usize) -> Option<f64> {
    row.get(index).and_then(|v| parse_number(&cell_text(v)))
}

/// Position of the first column header matching `pred`.
pub fn find_field(fields: &[String], pred: impl Fn(&str) -> bool) -> Option<usize> {
    fields.iter().position(|f| pred(f.trim()))
}

/// Current calendar date in Taipei (UTC+8).
pub fn taipei_today() -> NaiveDate {
    (Utc::now() + Duration::hours(8)).date_naive()
}

/// Weekdays in `[start, end]`, most recent last, keeping at most `limit`.
pub fn recent_weekdays(start: NaiveDate, end: NaiveDate, limit: usize) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect();
    if days.len() > limit {
        days.drain(..days.len() - limit);
    }
    days
}

/// Format a date as `YYYYMMDD`, the query format of the exchange reports.
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Format a date's month as ROC `"113/01"`.
pub fn roc_month(date: NaiveDate) -> String {
    format!("{}/{:02}", date.year() - ROC_OFFSET, date.month())
}

/// First day of every month touching `[start, end]`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let Some(mut cursor) = start.with_day(1) else {
        return months;
    };
    while cursor <= end {
        months.push(cursor);
        cursor = match cursor.checked_add_months(chrono::Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    months
}
