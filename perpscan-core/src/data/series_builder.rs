//! Kline series builder — walks backward through 1-minute kline pages.
//!
//! Pages are requested newest-to-oldest from a 15-minute-aligned anchor.
//! Each page is digested; the upstream sometimes replays the same page for
//! older ranges, so repeated digests count toward a stale-page limit instead
//! of looping forever.

use super::bybit::{parse_kline_rows, Endpoints, KLINE_PAGE_LIMIT, MINUTE_INTERVAL};
use super::fetcher::RateLimitedFetcher;
use crate::domain::{Bar, Series};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Minimum bars for a usable series: 21 blocks of 15 minutes.
pub const MIN_BARS: usize = 21 * 15;

/// Default target: 21 blocks of 240 minutes.
pub const DEFAULT_TARGET_BARS: usize = 21 * 240;

/// Consecutive stale pages tolerated before giving up.
pub const MAX_CONSECUTIVE_DUPLICATES: u32 = 3;

const MINUTE_MS: i64 = 60_000;
const ANCHOR_MS: i64 = 15 * MINUTE_MS;

/// Floor `now` to the previous 15-minute boundary, in ms.
pub fn anchor_end_time(now: DateTime<Utc>) -> i64 {
    let ms = now.timestamp_millis();
    ms - ms.rem_euclid(ANCHOR_MS)
}

/// BLAKE3 digest of a page's canonical JSON text.
pub fn page_digest(page: &[Value]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for row in page {
        hasher.update(row.to_string().as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize()
}

/// Assembles gap-tolerant, deduplicated 1-minute series.
#[derive(Clone)]
pub struct KlineSeriesBuilder {
    fetcher: RateLimitedFetcher,
    endpoints: Endpoints,
}

impl KlineSeriesBuilder {
    pub fn new(fetcher: RateLimitedFetcher, endpoints: Endpoints) -> Self {
        Self { fetcher, endpoints }
    }

    /// Build up to `target_count` bars ending at the current 15-minute anchor.
    pub fn build(&self, symbol: &str, target_count: usize) -> Series {
        self.build_until(symbol, target_count, anchor_end_time(Utc::now()))
    }

    /// Build up to `target_count` bars ending before `end_ms`.
    ///
    /// Returns an empty series when fewer than [`MIN_BARS`] bars could be
    /// gathered. Never fails: transport errors surface as empty pages.
    pub fn build_until(&self, symbol: &str, target_count: usize, end_ms: i64) -> Series {
        let page_span = KLINE_PAGE_LIMIT as i64 * MINUTE_MS;
        let mut cursor = end_ms;
        let mut seen: HashSet<blake3::Hash> = HashSet::new();
        let mut bars: BTreeMap<i64, Bar> = BTreeMap::new();
        let mut stale_pages = 0u32;
        let mut pages = 0usize;

        while bars.len() < target_count {
            let url = self.endpoints.kline(
                symbol,
                MINUTE_INTERVAL,
                cursor - page_span,
                cursor - 1,
                KLINE_PAGE_LIMIT,
            );
            let rows = self.fetcher.fetch_list(&url, symbol);
            cursor -= page_span;
            pages += 1;

            if rows.is_empty() {
                debug!(symbol = %symbol, pages, gathered = bars.len(), "empty kline page, stopping");
                break;
            }

            let added = if seen.insert(page_digest(&rows)) {
                let before = bars.len();
                for bar in parse_kline_rows(&rows) {
                    bars.entry(bar.open_time).or_insert(bar);
                }
                bars.len() - before
            } else {
                0
            };

            // A replayed page, or one that adds nothing new, is stale.
            if added == 0 {
                stale_pages += 1;
                if stale_pages >= MAX_CONSECUTIVE_DUPLICATES {
                    warn!(
                        symbol = %symbol,
                        gathered = bars.len(),
                        expected = target_count,
                        "repeated kline pages, stopping early"
                    );
                    break;
                }
            } else {
                stale_pages = 0;
            }
        }

        if bars.len() < MIN_BARS {
            warn!(
                symbol = %symbol,
                gathered = bars.len(),
                required = MIN_BARS,
                "not enough klines"
            );
            return Series::empty(symbol);
        }

        let all: Vec<Bar> = bars.into_values().collect();
        let skip = all.len().saturating_sub(target_count);
        debug!(symbol = %symbol, pages, bars = all.len() - skip, "kline series built");
        Series {
            symbol: symbol.to_string(),
            bars: all[skip..].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fetcher::RetryPolicy;
    use crate::data::testing::{envelope, ScriptedTransport};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    const END: i64 = 1_700_000_100_000 - 1_700_000_100_000 % ANCHOR_MS;

    /// `count` rows ending just before `end_ms`, newest first.
    fn page(end_ms: i64, count: usize) -> Value {
        let rows: Vec<Value> = (1..=count as i64)
            .map(|i| {
                let t = end_ms - i * MINUTE_MS;
                json!([t.to_string(), "1", "2", "0.5", "1.5", "10", "15"])
            })
            .collect();
        envelope(rows)
    }

    fn builder(responses: Vec<Value>) -> (KlineSeriesBuilder, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(
            responses.into_iter().map(Ok).collect(),
        ));
        let fetcher = RateLimitedFetcher::new(transport.clone(), RetryPolicy::immediate(1));
        (
            KlineSeriesBuilder::new(fetcher, Endpoints::default()),
            transport,
        )
    }

    #[test]
    fn anchor_floors_to_quarter_hour() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 10, 37, 12).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 6, 3, 10, 30, 0).unwrap();
        assert_eq!(anchor_end_time(now), expected.timestamp_millis());
    }

    #[test]
    fn digest_distinguishes_pages() {
        let a = vec![json!(["1", "2"])];
        let b = vec![json!(["1", "3"])];
        assert_eq!(page_digest(&a), page_digest(&a.clone()));
        assert_ne!(page_digest(&a), page_digest(&b));
    }

    #[test]
    fn walks_back_across_pages() {
        let span = KLINE_PAGE_LIMIT as i64 * MINUTE_MS;
        let (b, transport) = builder(vec![page(END, 1000), page(END - span, 1000)]);
        let series = b.build_until("BTCUSDT", 1500, END);

        assert_eq!(series.len(), 1500);
        assert_eq!(transport.calls(), 2);
        assert_eq!(series.last_open_time(), Some(END - MINUTE_MS));
        assert!(series
            .bars()
            .windows(2)
            .all(|w| w[1].open_time - w[0].open_time == MINUTE_MS));

        let urls = transport.urls();
        assert!(urls[0].contains(&format!("start={}&end={}", END - span, END - 1)));
        assert!(urls[1].contains(&format!("end={}", END - span - 1)));
    }

    #[test]
    fn repeated_page_stops_after_three_duplicates() {
        let p = page(END, 400);
        let (b, transport) = builder(vec![p.clone(), p.clone(), p.clone(), p.clone(), p]);
        let series = b.build_until("ETHUSDT", 5040, END);

        // One fresh page then three stale ones.
        assert_eq!(transport.calls(), 4);
        assert_eq!(series.len(), 400);
    }

    #[test]
    fn repeated_short_page_yields_empty_series() {
        let p = page(END, 200);
        let (b, transport) = builder(vec![p; 10]);
        let series = b.build_until("DOGEUSDT", 5040, END);

        assert_eq!(transport.calls(), 4);
        assert!(series.is_empty());
        assert_eq!(series.symbol, "DOGEUSDT");
    }

    #[test]
    fn too_few_bars_yields_empty_series() {
        let (b, _) = builder(vec![page(END, 100)]);
        let series = b.build_until("XRPUSDT", 5040, END);
        assert!(series.is_empty());
        assert_eq!(series.symbol, "XRPUSDT");
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let mut body = page(END, 400);
        if let Some(list) = body["result"]["list"].as_array_mut() {
            list.push(json!(["abc", "", "", "", "", "X"]));
        }
        let (b, _) = builder(vec![body]);
        assert_eq!(b.build_until("SOLUSDT", 5040, END).len(), 400);
    }
}
