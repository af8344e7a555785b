//! Scan orchestrator — fans per-symbol pipelines out over a private pool.
//!
//! One pass: clear the series cache, build the benchmark series, then for each
//! universe symbol build its series, compute indicator columns, fetch funding
//! and open interest, and assemble a row. Symbol failures are collected, never
//! propagated.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use perpscan_core::data::{
    DerivativesClient, Endpoints, HttpTransport, KlineSeriesBuilder, RateLimitedFetcher,
    RetryPolicy, SeriesCache, SymbolUniverse, Transport, TransportError,
};
use perpscan_core::domain::{OpenInterestWindow, Series, TickerEntry};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ScanConfig, ScanSettings};
use crate::export::ExportError;
use crate::row::{assemble_row, RowInputs, ScanRow};

/// Failure reason for a symbol whose series came back empty.
pub const INSUFFICIENT_KLINES: &str = "insufficient klines";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    #[error("failed to build worker pool: {0}")]
    Pool(String),
}

/// A symbol that produced no row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub symbol: String,
    pub reason: String,
}

/// Outcome of one pass. Rows follow universe rank.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub rows: Vec<ScanRow>,
    pub failures: Vec<ScanFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanReport {
    pub fn succeeded(&self) -> usize {
        self.rows.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// One-line human summary, used for notifications.
    pub fn summary(&self) -> String {
        format!(
            "{} symbols scanned, {} failed in {:.1}s",
            self.succeeded(),
            self.failed(),
            self.elapsed_secs()
        )
    }
}

pub struct ScanOrchestrator {
    fetcher: RateLimitedFetcher,
    endpoints: Endpoints,
    builder: KlineSeriesBuilder,
    derivatives: DerivativesClient,
    cache: SeriesCache,
    settings: ScanSettings,
    target_bars: usize,
    anchor_ms: Option<i64>,
    pool: rayon::ThreadPool,
}

impl ScanOrchestrator {
    /// Build an orchestrator over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>, config: &ScanConfig) -> Result<Self, ScanError> {
        Self::with_retry_policy(transport, config, config.retry_policy())
    }

    /// As [`ScanOrchestrator::new`], with explicit retry timing.
    pub fn with_retry_policy(
        transport: Arc<dyn Transport>,
        config: &ScanConfig,
        policy: RetryPolicy,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        let fetcher = RateLimitedFetcher::new(transport, policy);
        let endpoints = Endpoints::new(config.api.base_url.clone());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.scan.concurrency)
            .thread_name(|i| format!("perpscan-worker-{i}"))
            .build()
            .map_err(|e| ScanError::Pool(e.to_string()))?;

        Ok(Self {
            builder: KlineSeriesBuilder::new(fetcher.clone(), endpoints.clone()),
            derivatives: DerivativesClient::new(fetcher.clone(), endpoints.clone()),
            cache: SeriesCache::new(config.scan.cache_capacity),
            settings: config.scan.clone(),
            target_bars: config.fetch.target_bars,
            anchor_ms: None,
            fetcher,
            endpoints,
            pool,
        })
    }

    /// Build an orchestrator over HTTP, reading the API key from the environment.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let transport = HttpTransport::from_env(&config.api.api_key_env, config.timeout())?;
        Self::new(Arc::new(transport), config)
    }

    /// Pin the kline anchor instead of using the current time.
    pub fn with_anchor(mut self, end_ms: i64) -> Self {
        self.anchor_ms = Some(end_ms);
        self
    }

    /// A universe sharing this orchestrator's fetcher and endpoints.
    pub fn symbol_universe(&self) -> SymbolUniverse {
        SymbolUniverse::new(self.fetcher.clone(), self.endpoints.clone())
            .with_quote_suffix(self.settings.quote_suffix.clone())
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub fn derivatives(&self) -> &DerivativesClient {
        &self.derivatives
    }

    /// Series for `symbol`, served from the pass cache when present.
    pub fn series(&self, symbol: &str) -> Arc<Series> {
        self.cache.get_or_build(symbol, || match self.anchor_ms {
            Some(end_ms) => self.builder.build_until(symbol, self.target_bars, end_ms),
            None => self.builder.build(symbol, self.target_bars),
        })
    }

    fn process(&self, entry: &TickerEntry, benchmark: &Series) -> Result<ScanRow, ScanFailure> {
        let symbol = entry.symbol.as_str();
        let series = self.series(symbol);
        if series.is_empty() {
            return Err(ScanFailure {
                symbol: symbol.to_string(),
                reason: INSUFFICIENT_KLINES.to_string(),
            });
        }

        let funding = self.derivatives.funding_rate(symbol);
        let oi_changes: Vec<(OpenInterestWindow, f64)> = self
            .settings
            .oi_windows
            .iter()
            .map(|&window| {
                (
                    window,
                    self.derivatives.open_interest_change(symbol, window),
                )
            })
            .collect();

        let inputs = RowInputs {
            symbol,
            bars: series.bars(),
            benchmark: benchmark.bars(),
            turnover_24h: entry.turnover_24h,
            funding,
            oi_changes: &oi_changes,
        };
        let row = assemble_row(&inputs, &self.settings.windows, self.settings.percentiles);
        debug!(symbol = %symbol, bars = series.len(), "symbol processed");
        Ok(row)
    }

    /// Run one scan pass over `universe` (already ranked).
    pub fn run_pass(&self, universe: &[TickerEntry]) -> ScanReport {
        let started_at = Utc::now();
        let timer = Instant::now();
        self.cache.begin_pass();

        let benchmark = self.series(&self.settings.benchmark);
        if benchmark.is_empty() {
            warn!(
                benchmark = %self.settings.benchmark,
                "benchmark series unavailable, correlations will be 0"
            );
        }

        info!(
            symbols = universe.len(),
            threads = self.pool.current_num_threads(),
            "scan pass started"
        );

        // par_iter().collect() keeps input order, i.e. universe rank.
        let outcomes: Vec<Result<ScanRow, ScanFailure>> = self.pool.install(|| {
            universe
                .par_iter()
                .map(|entry| self.process(entry, &benchmark))
                .collect()
        });

        let mut rows = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(row) => rows.push(row),
                Err(failure) => failures.push(failure),
            }
        }

        info!(
            succeeded = rows.len(),
            failed = failures.len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "scan pass finished"
        );
        if !failures.is_empty() {
            let symbols: Vec<&str> = failures.iter().map(|f| f.symbol.as_str()).collect();
            warn!(failed = ?symbols, "symbols skipped");
        }

        ScanReport {
            rows,
            failures,
            started_at,
            finished_at: Utc::now(),
        }
    }
}
