//! High/low range over the trailing window.
//!
//! range = (max(high) - min(low)) / min(low) * 100

use super::pct_change;
use crate::domain::Bar;

pub fn volatility_range(bars: &[Bar], window: usize) -> f64 {
    if window == 0 || bars.len() < window {
        return 0.0;
    }
    let tail = &bars[bars.len() - window..];
    if tail.iter().any(|b| !b.high.is_finite() || !b.low.is_finite()) {
        return 0.0;
    }
    let max_high = tail.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let min_low = tail.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    pct_change(max_high, min_low)
}
