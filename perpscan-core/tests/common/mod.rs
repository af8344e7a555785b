//! In-process exchange double for integration tests. No network.

#![allow(dead_code)]

use perpscan_core::data::{Transport, TransportError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const MINUTE_MS: i64 = 60_000;

/// A fixed 15-minute-aligned anchor used across tests.
pub const ANCHOR_MS: i64 = 1_717_200_000_000;

/// Deterministic close for `symbol` at minute `t`.
pub fn close_at(symbol: &str, t: i64) -> f64 {
    let phase = symbol.len() as f64;
    100.0 + ((t / MINUTE_MS) as f64 * 0.37 + phase).sin() * 5.0
}

/// Answers tickers, kline and open-interest requests from generated data.
///
/// Kline history for a symbol starts at its configured listing time; earlier
/// ranges come back empty. Symbols listed in `failing` get HTTP 503 for
/// every kline request.
pub struct SyntheticExchange {
    pub tickers: Vec<(String, f64)>,
    pub listed_from: HashMap<String, i64>,
    pub failing: Vec<String>,
    calls: AtomicUsize,
    kline_calls: Mutex<HashMap<String, usize>>,
}

impl SyntheticExchange {
    pub fn new(tickers: &[(&str, f64)]) -> Self {
        Self {
            tickers: tickers
                .iter()
                .map(|(s, t)| (s.to_string(), *t))
                .collect(),
            listed_from: HashMap::new(),
            failing: Vec::new(),
            calls: AtomicUsize::new(0),
            kline_calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn listed_from(mut self, symbol: &str, ms: i64) -> Self {
        self.listed_from.insert(symbol.to_string(), ms);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.push(symbol.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn kline_calls(&self, symbol: &str) -> usize {
        self.kline_calls
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .unwrap_or(0)
    }

    fn klines(&self, q: &HashMap<String, String>) -> Result<Value, TransportError> {
        let symbol = q.get("symbol").cloned().unwrap_or_default();
        *self
            .kline_calls
            .lock()
            .unwrap()
            .entry(symbol.clone())
            .or_insert(0) += 1;
        if self.failing.contains(&symbol) {
            return Err(TransportError::Status { status: 503 });
        }

        let start: i64 = q["start"].parse().unwrap();
        let end: i64 = q["end"].parse().unwrap();
        let limit: usize = q["limit"].parse().unwrap();
        let listed = self.listed_from.get(&symbol).copied().unwrap_or(i64::MIN);

        let first = start.div_euclid(MINUTE_MS) * MINUTE_MS;
        let first = if first < start { first + MINUTE_MS } else { first };
        let mut rows = Vec::new();
        let mut t = end.div_euclid(MINUTE_MS) * MINUTE_MS;
        while t >= first && t >= listed && rows.len() < limit {
            let c = close_at(&symbol, t);
            let v = 10.0 + ((t / MINUTE_MS) % 13) as f64;
            rows.push(json!([
                t.to_string(),
                format!("{c}"),
                format!("{}", c + 1.0),
                format!("{}", c - 1.0),
                format!("{c}"),
                format!("{v}"),
                format!("{}", v * c),
            ]));
            t -= MINUTE_MS;
        }
        Ok(envelope(rows))
    }

    fn tickers(&self, q: &HashMap<String, String>) -> Value {
        match q.get("symbol") {
            Some(symbol) => envelope(vec![json!({
                "symbol": symbol,
                "fundingRate": "0.0001",
                "turnover24h": "1",
            })]),
            None => envelope(
                self.tickers
                    .iter()
                    .map(|(s, t)| json!({"symbol": s, "turnover24h": t.to_string()}))
                    .collect(),
            ),
        }
    }

    fn open_interest(&self, q: &HashMap<String, String>) -> Value {
        let limit: i64 = q["limit"].parse().unwrap();
        // Newest first, growing 1 per sample from 100.
        let rows = (0..limit)
            .map(|i| {
                json!({
                    "openInterest": format!("{}", 100 + limit - 1 - i),
                    "timestamp": (ANCHOR_MS - i * 3_600_000).to_string(),
                })
            })
            .collect();
        envelope(rows)
    }
}

impl Transport for SyntheticExchange {
    fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let q: HashMap<String, String> = query
            .split('&')
            .filter_map(|kv| kv.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if path.ends_with("/v5/market/kline") {
            self.klines(&q)
        } else if path.ends_with("/v5/market/tickers") {
            Ok(self.tickers(&q))
        } else if path.ends_with("/v5/market/open-interest") {
            Ok(self.open_interest(&q))
        } else {
            Err(TransportError::Status { status: 404 })
        }
    }
}

pub fn envelope(list: Vec<Value>) -> Value {
    json!({"retCode": 0, "retMsg": "OK", "result": {"list": list}, "time": ANCHOR_MS})
}
