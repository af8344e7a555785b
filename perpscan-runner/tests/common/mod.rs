//! Exchange double and helpers shared by runner integration tests.

#![allow(dead_code)]

use perpscan_core::data::{RetryPolicy, Transport, TransportError};
use perpscan_runner::notify::{Notifier, NotifyError};
use perpscan_runner::{ScanConfig, ScanOrchestrator};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const MINUTE_MS: i64 = 60_000;
pub const ANCHOR_MS: i64 = 1_717_200_000_000;

/// Serves tickers, klines and open interest from generated data.
pub struct FakeExchange {
    tickers: Vec<(String, f64)>,
    listed_from: HashMap<String, i64>,
    failing: Vec<String>,
    tickers_down: AtomicBool,
}

impl FakeExchange {
    pub fn new(tickers: &[(&str, f64)]) -> Self {
        Self {
            tickers: tickers.iter().map(|(s, t)| (s.to_string(), *t)).collect(),
            listed_from: HashMap::new(),
            failing: Vec::new(),
            tickers_down: AtomicBool::new(false),
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

    pub fn set_tickers_down(&self, down: bool) {
        self.tickers_down.store(down, Ordering::SeqCst);
    }

    fn klines(&self, q: &HashMap<String, String>) -> Result<Value, TransportError> {
        let symbol = q.get("symbol").cloned().unwrap_or_default();
        if self.failing.contains(&symbol) {
            return Err(TransportError::Status { status: 503 });
        }
        let start: i64 = q["start"].parse().unwrap();
        let end: i64 = q["end"].parse().unwrap();
        let limit: usize = q["limit"].parse().unwrap();
        let listed = self.listed_from.get(&symbol).copied().unwrap_or(i64::MIN);
        let phase = symbol.bytes().map(f64::from).sum::<f64>();

        let mut rows = Vec::new();
        let mut t = end.div_euclid(MINUTE_MS) * MINUTE_MS;
        while t >= start && t >= listed && rows.len() < limit {
            let minute = (t / MINUTE_MS) as f64;
            let close = 100.0 + (minute * 0.21 + phase).sin() * 3.0;
            let volume = 50.0 + (minute * 0.05).cos() * 20.0;
            rows.push(json!([
                t.to_string(),
                close.to_string(),
                (close + 0.5).to_string(),
                (close - 0.5).to_string(),
                close.to_string(),
                volume.to_string(),
                (volume * close).to_string(),
            ]));
            t -= MINUTE_MS;
        }
        Ok(envelope(rows))
    }
}

impl Transport for FakeExchange {
    fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let q: HashMap<String, String> = query
            .split('&')
            .filter_map(|kv| kv.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if path.ends_with("/kline") {
            self.klines(&q)
        } else if path.ends_with("/tickers") {
            match q.get("symbol") {
                Some(s) => Ok(envelope(vec![json!({"symbol": s, "fundingRate": "-0.00025"})])),
                None if self.tickers_down.load(Ordering::SeqCst) => {
                    Err(TransportError::Status { status: 502 })
                }
                None => Ok(envelope(
                    self.tickers
                        .iter()
                        .map(|(s, t)| json!({"symbol": s, "turnover24h": t.to_string()}))
                        .collect(),
                )),
            }
        } else if path.ends_with("/open-interest") {
            if q.get("intervalTime").map(String::as_str) == Some("1d") {
                return Ok(envelope(vec![
                    json!({"openInterest": "150", "timestamp": (ANCHOR_MS).to_string()}),
                    json!({"openInterest": "200", "timestamp": (ANCHOR_MS - 6 * 86_400_000).to_string()}),
                ]));
            }
            Ok(envelope(vec![
                json!({"openInterest": "120", "timestamp": (ANCHOR_MS).to_string()}),
                json!({"openInterest": "100", "timestamp": (ANCHOR_MS - 23 * 3_600_000).to_string()}),
            ]))
        } else {
            Err(TransportError::Status { status: 404 })
        }
    }
}

pub fn envelope(list: Vec<Value>) -> Value {
    json!({"retCode": 0, "retMsg": "OK", "result": {"list": list}, "time": ANCHOR_MS})
}

/// A small, fast configuration.
pub fn test_config(output_dir: &std::path::Path) -> ScanConfig {
    let mut config = ScanConfig::default();
    config.scan.windows = vec![5, 15];
    config.scan.concurrency = 4;
    config.fetch.target_bars = 1_000;
    config.fetch.max_attempts = 2;
    config.export.output_dir = output_dir.to_path_buf();
    config
}

pub fn orchestrator(exchange: Arc<FakeExchange>, config: &ScanConfig) -> ScanOrchestrator {
    ScanOrchestrator::with_retry_policy(exchange, config, RetryPolicy::immediate(2))
        .unwrap()
        .with_anchor(ANCHOR_MS)
}

/// Records every notification.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// Always fails.
pub struct BrokenNotifier;

impl Notifier for BrokenNotifier {
    fn notify(&self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Unsupported)
    }
}
