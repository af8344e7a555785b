//! Bar and Series — the fundamental market data units.

use serde::{Deserialize, Serialize};

/// One 1-minute OHLCV kline.
///
/// Prices and volume that failed to parse on the wire are stored as NaN
/// (a void value). Indicators check [`Bar::is_valid`] before using a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time, milliseconds since the Unix epoch (UTC).
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if every numeric field is finite.
    pub fn is_valid(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// Parse a wire row `[startTime, open, high, low, close, volume, ...]`.
    ///
    /// Returns `None` when the row is too short or the timestamp is not an
    /// integer. Non-numeric price or volume fields become NaN.
    pub fn from_row<S: AsRef<str>>(row: &[S]) -> Option<Self> {
        if row.len() < 6 {
            return None;
        }
        let open_time = row[0].as_ref().trim().parse::<i64>().ok()?;
        Some(Self {
            open_time,
            open: parse_decimal(row[1].as_ref()),
            high: parse_decimal(row[2].as_ref()),
            low: parse_decimal(row[3].as_ref()),
            close: parse_decimal(row[4].as_ref()),
            volume: parse_decimal(row[5].as_ref()),
        })
    }
}

/// Parse a decimal string, yielding NaN for anything that is not a number.
pub fn parse_decimal(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// An ascending, `open_time`-unique sequence of bars for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl Series {
    /// Build a series, sorting by `open_time` and dropping duplicate timestamps
    /// (the first occurrence wins).
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.open_time);
        bars.dedup_by_key(|b| b.open_time);
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Open time of the most recent bar.
    pub fn last_open_time(&self) -> Option<i64> {
        self.bars.last().map(|b| b.open_time)
    }
}
