//! Funding rate and open-interest fetches.

use super::bybit::{parse_funding, parse_open_interest, Endpoints};
use super::fetcher::RateLimitedFetcher;
use crate::domain::{FundingRate, OpenInterestSnapshot, OpenInterestWindow};
use crate::indicators;
use tracing::warn;

#[derive(Clone)]
pub struct DerivativesClient {
    fetcher: RateLimitedFetcher,
    endpoints: Endpoints,
}

impl DerivativesClient {
    pub fn new(fetcher: RateLimitedFetcher, endpoints: Endpoints) -> Self {
        Self { fetcher, endpoints }
    }

    /// Latest funding rate, or the `(0.0, 0)` sentinel.
    pub fn funding_rate(&self, symbol: &str) -> FundingRate {
        let url = self.endpoints.tickers(Some(symbol));
        match self.fetcher.fetch(&url, symbol).as_ref().and_then(parse_funding) {
            Some(rate) => rate,
            None => {
                warn!(symbol = %symbol, "funding rate unavailable");
                FundingRate::default()
            }
        }
    }

    /// Open-interest samples for `window`. Malformed rows are dropped.
    pub fn open_interest(
        &self,
        symbol: &str,
        window: OpenInterestWindow,
    ) -> Vec<OpenInterestSnapshot> {
        let url = self.endpoints.open_interest(symbol, window);
        let rows = self.fetcher.fetch_list(&url, symbol);
        let snapshots = parse_open_interest(&rows);
        if snapshots.len() < rows.len() {
            warn!(
                symbol = %symbol,
                dropped = rows.len() - snapshots.len(),
                "malformed open interest rows"
            );
        }
        snapshots
    }

    /// Percent change of open interest across `window`.
    pub fn open_interest_change(&self, symbol: &str, window: OpenInterestWindow) -> f64 {
        indicators::open_interest_change(&self.open_interest(symbol, window))
    }
}
