//! Bybit v5 public market endpoints: URL construction and defensive parsing.
//!
//! Responses share the envelope `{ retCode, retMsg, result: { list }, time }`.
//! Numeric fields arrive as strings; anything that does not parse is dropped
//! or degraded rather than failing the whole response.

use crate::domain::{
    parse_decimal, Bar, FundingRate, OpenInterestSnapshot, OpenInterestWindow, TickerEntry,
};
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.bybit.com";

/// Maximum bars per kline page.
pub const KLINE_PAGE_LIMIT: usize = 1000;

/// 1-minute kline interval parameter.
pub const MINUTE_INTERVAL: &str = "1";

const CATEGORY: &str = "linear";

/// URL builder for the three read endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ticker listing, optionally narrowed to one symbol.
    pub fn tickers(&self, symbol: Option<&str>) -> String {
        match symbol {
            Some(sym) => format!(
                "{}/v5/market/tickers?category={CATEGORY}&symbol={sym}",
                self.base_url
            ),
            None => format!("{}/v5/market/tickers?category={CATEGORY}", self.base_url),
        }
    }

    /// Kline page covering `[start_ms, end_ms]`.
    pub fn kline(
        &self,
        symbol: &str,
        interval: &str,
        start_ms: i64,
        end_ms: i64,
        limit: usize,
    ) -> String {
        format!(
            "{}/v5/market/kline?category={CATEGORY}&symbol={symbol}&interval={interval}\
             &start={start_ms}&end={end_ms}&limit={limit}",
            self.base_url
        )
    }

    /// Open-interest history for a sampling window.
    pub fn open_interest(&self, symbol: &str, window: OpenInterestWindow) -> String {
        format!(
            "{}/v5/market/open-interest?category={CATEGORY}&symbol={symbol}\
             &intervalTime={}&limit={}",
            self.base_url,
            window.interval(),
            window.limit()
        )
    }
}

/// Extract `result.list`, or an empty vec if the shape is wrong.
pub fn result_list(body: &Value) -> Vec<Value> {
    body.get("result")
        .and_then(|r| r.get("list"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Render a scalar JSON value as text (strings verbatim, numbers formatted).
fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Read a numeric field that may be encoded as a string or a number.
pub fn field_f64(obj: &Value, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Read an integer field that may be encoded as a string or a number.
pub fn field_i64(obj: &Value, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// Parse kline rows. Rows without an integer timestamp are dropped.
pub fn parse_kline_rows(rows: &[Value]) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        let fields: Vec<String> = match row.as_array() {
            Some(cells) => cells.iter().map(scalar_text).collect(),
            None => {
                dropped += 1;
                continue;
            }
        };
        match Bar::from_row(&fields) {
            Some(bar) => bars.push(bar),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, kept = bars.len(), "dropped malformed kline rows");
    }
    bars
}

/// Parse ticker rows, keeping symbols ending in `quote_suffix`.
///
/// Unparseable turnover degrades to 0.0. Order is preserved; ranking is the
/// universe's job.
pub fn parse_tickers(rows: &[Value], quote_suffix: &str) -> Vec<TickerEntry> {
    rows.iter()
        .filter_map(|item| {
            let symbol = item.get("symbol").and_then(Value::as_str)?;
            if !symbol.ends_with(quote_suffix) {
                return None;
            }
            let turnover = item
                .get("turnover24h")
                .map(scalar_text)
                .map(|s| parse_decimal(&s))
                .filter(|v| v.is_finite())
                .unwrap_or(0.0);
            Some(TickerEntry {
                symbol: symbol.to_string(),
                turnover_24h: turnover,
            })
        })
        .collect()
}

/// Parse open-interest rows. Rows missing either field are dropped.
pub fn parse_open_interest(rows: &[Value]) -> Vec<OpenInterestSnapshot> {
    rows.iter()
        .filter_map(|row| {
            Some(OpenInterestSnapshot {
                timestamp: field_i64(row, "timestamp")?,
                open_interest: field_f64(row, "openInterest")?,
            })
        })
        .collect()
}

/// Parse the funding rate from a single-symbol ticker response.
///
/// The as-of timestamp is the item's `fundingRateTimestamp` when present,
/// otherwise the envelope's `time`. Returns `None` if the rate is missing or
/// malformed.
pub fn parse_funding(body: &Value) -> Option<FundingRate> {
    let list = result_list(body);
    let item = list.first()?;
    let rate = field_f64(item, "fundingRate")?;
    let timestamp = field_i64(item, "fundingRateTimestamp")
        .or_else(|| field_i64(body, "time"))
        .unwrap_or(0);
    Some(FundingRate { rate, timestamp })
}
