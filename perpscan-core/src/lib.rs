//! perpscan core — market data acquisition and windowed indicators.
//!
//! - Domain types (bars, series, tickers, funding, open interest)
//! - Transport seam and rate-limited fetcher with bounded retry
//! - Backward-paging kline series builder with page deduplication
//! - Symbol universe, derivatives client, pass-scoped series cache
//! - Pure indicator functions over sorted bar slices

pub mod data;
pub mod domain;
pub mod indicators;
