//! Non-kline market records: universe tickers, funding, open interest.

use serde::{Deserialize, Serialize};

/// A tradeable symbol and its 24-hour traded notional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerEntry {
    pub symbol: String,
    pub turnover_24h: f64,
}

/// Latest funding rate with its as-of timestamp (ms).
///
/// `FundingRate::default()` is the `(0.0, 0)` sentinel used when the rate
/// could not be fetched or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FundingRate {
    pub rate: f64,
    pub timestamp: i64,
}

impl FundingRate {
    pub fn is_sentinel(&self) -> bool {
        self.rate == 0.0 && self.timestamp == 0
    }
}

/// One periodic open-interest sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestSnapshot {
    /// Sample time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub open_interest: f64,
}

/// Sampling policy for open-interest change.
///
/// Weekly and monthly changes are approximated from daily samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenInterestWindow {
    /// 24 hourly samples.
    Day,
    /// 7 daily samples.
    Week,
    /// 30 daily samples.
    Month,
}

impl OpenInterestWindow {
    /// Upstream `intervalTime` parameter.
    pub fn interval(&self) -> &'static str {
        match self {
            OpenInterestWindow::Day => "1h",
            OpenInterestWindow::Week | OpenInterestWindow::Month => "1d",
        }
    }

    /// Number of samples requested.
    pub fn limit(&self) -> u32 {
        match self {
            OpenInterestWindow::Day => 24,
            OpenInterestWindow::Week => 7,
            OpenInterestWindow::Month => 30,
        }
    }

    /// Column label suffix.
    pub fn label(&self) -> &'static str {
        match self {
            OpenInterestWindow::Day => "24h",
            OpenInterestWindow::Week => "1W",
            OpenInterestWindow::Month => "1M",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn funding_default_is_sentinel() {
        assert!(FundingRate::default().is_sentinel());
        assert!(!FundingRate {
            rate: 0.0001,
            timestamp: 1
        }
        .is_sentinel());
    }

    #[test]
    fn open_interest_table() {
        assert_eq!(OpenInterestWindow::Day.interval(), "1h");
        assert_eq!(OpenInterestWindow::Day.limit(), 24);
        assert_eq!(OpenInterestWindow::Week.interval(), "1d");
        assert_eq!(OpenInterestWindow::Week.limit(), 7);
        assert_eq!(OpenInterestWindow::Month.limit(), 30);
    }
}
