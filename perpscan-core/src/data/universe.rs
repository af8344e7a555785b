//! Symbol universe — tradeable perpetuals ranked by 24h turnover.

use super::bybit::{parse_tickers, result_list, Endpoints};
use super::fetcher::RateLimitedFetcher;
use crate::domain::TickerEntry;
use tracing::{error, info};

/// Default quote-currency suffix for tradeable symbols.
pub const DEFAULT_QUOTE_SUFFIX: &str = "USDT";

/// Lists and ranks the symbols to scan.
#[derive(Clone)]
pub struct SymbolUniverse {
    fetcher: RateLimitedFetcher,
    endpoints: Endpoints,
    quote_suffix: String,
}

impl SymbolUniverse {
    pub fn new(fetcher: RateLimitedFetcher, endpoints: Endpoints) -> Self {
        Self {
            fetcher,
            endpoints,
            quote_suffix: DEFAULT_QUOTE_SUFFIX.to_string(),
        }
    }

    pub fn with_quote_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.quote_suffix = suffix.into();
        self
    }

    pub fn quote_suffix(&self) -> &str {
        &self.quote_suffix
    }

    /// All matching symbols, highest turnover first.
    ///
    /// Ties keep upstream order. A failed request logs an error and yields an
    /// empty list.
    pub fn list(&self) -> Vec<TickerEntry> {
        let url = self.endpoints.tickers(None);
        let body = match self.fetcher.fetch(&url, "tickers") {
            Some(body) => body,
            None => {
                error!("failed to fetch ticker universe");
                return Vec::new();
            }
        };

        let rows = result_list(&body);
        let mut entries = parse_tickers(&rows, &self.quote_suffix);
        rank_by_turnover(&mut entries);
        info!(
            total = rows.len(),
            tradeable = entries.len(),
            suffix = %self.quote_suffix,
            "ticker universe loaded"
        );
        entries
    }

    /// The `n` highest-turnover symbols. `None` returns the full list.
    pub fn top(&self, n: Option<usize>) -> Vec<TickerEntry> {
        let mut entries = self.list();
        if let Some(n) = n {
            entries.truncate(n);
        }
        entries
    }
}

/// Stable descending sort by turnover.
pub fn rank_by_turnover(entries: &mut [TickerEntry]) {
    entries.sort_by(|a, b| b.turnover_24h.total_cmp(&a.turnover_24h));
}
