//! Rate-limited fetcher — bounded retry with jittered backoff.
//!
//! Exhausting retries is not an error for callers: the fetcher returns `None`
//! (or an empty list) and logs, so paging loops can treat it as end-of-data.

use super::bybit::result_list;
use super::transport::{Transport, TransportError};
use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Retry and backoff parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first request.
    pub max_attempts: u32,
    /// Lower bound of the randomized delay after a 429.
    pub rate_limit_delay_min: Duration,
    /// Upper bound of the randomized delay after a 429.
    pub rate_limit_delay_max: Duration,
    /// Fixed delay after any other failure.
    pub error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_delay_min: Duration::from_millis(1_000),
            rate_limit_delay_max: Duration::from_millis(2_500),
            error_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Same attempt bound, no sleeping. Used by tests and dry runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            rate_limit_delay_min: Duration::ZERO,
            rate_limit_delay_max: Duration::ZERO,
            error_delay: Duration::ZERO,
        }
    }

    /// Draw a delay uniformly from the rate-limit range.
    pub fn rate_limit_delay(&self) -> Duration {
        let lo = self.rate_limit_delay_min.as_secs_f64();
        let hi = self.rate_limit_delay_max.as_secs_f64().max(lo);
        if hi <= lo {
            return self.rate_limit_delay_min;
        }
        Duration::from_secs_f64(rand::thread_rng().gen_range(lo..=hi))
    }
}

/// Issues single GETs with the retry protocol.
#[derive(Clone)]
pub struct RateLimitedFetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RateLimitedFetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch the full response body, or `None` after exhausting retries.
    ///
    /// `symbol` is only used to label log lines.
    pub fn fetch(&self, url: &str, symbol: &str) -> Option<Value> {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            let delay = match self.transport.get_json(url) {
                Ok(body) => return Some(body),
                Err(TransportError::RateLimited) => {
                    let delay = self.policy.rate_limit_delay();
                    warn!(
                        symbol = %symbol,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "rate limit hit (429), retrying"
                    );
                    delay
                }
                Err(e) => {
                    warn!(symbol = %symbol, attempt, error = %e, "request error, retrying");
                    self.policy.error_delay
                }
            };

            if attempt < attempts && !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }

        error!(symbol = %symbol, attempts, "failed all retries, giving up");
        None
    }

    /// Fetch and unwrap the `result.list` array. Empty on failure.
    pub fn fetch_list(&self, url: &str, symbol: &str) -> Vec<Value> {
        self.fetch(url, symbol)
            .map(|body| result_list(&body))
            .unwrap_or_default()
    }
}
