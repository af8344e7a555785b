//! Windowed indicators over a sorted 1-minute bar slice.
//!
//! Every function here is pure and total. Insufficient history, a zero
//! denominator, or any non-finite input yields `0.0` rather than an error, so
//! a scan row can always be assembled.
//!
//! Windows are expressed in minutes (= bars). Block-based indicators partition
//! the series positionally from its first bar; a trailing partial block is
//! discarded.

pub mod blocks;
pub mod correlation;
pub mod open_interest;
pub mod percentile;
pub mod price_change;
pub mod volatility;
pub mod volume;

pub use blocks::blocks;
pub use correlation::price_correlation;
pub use open_interest::open_interest_change;
pub use percentile::percentile_rank;
pub use price_change::{price_change_history, price_change_percent};
pub use volatility::volatility_range;
pub use volume::{block_volumes, volume_change, volume_change_history, BASELINE_BLOCKS};

/// `(new - base) / base * 100`, or `0.0` for a zero base or non-finite input.
pub fn pct_change(new: f64, base: f64) -> f64 {
    if !new.is_finite() || !base.is_finite() || base == 0.0 {
        return 0.0;
    }
    let change = (new - base) / base * 100.0;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}

/// Synthetic 1-minute bars from close prices.
///
/// open = previous close, high/low = ±1.0 around the body, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = 1_717_200_000_000i64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                open_time: base + i as i64 * 60_000,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Synthetic bars with constant prices and the given per-bar volumes.
#[cfg(test)]
pub fn make_volume_bars(volumes: &[f64]) -> Vec<crate::domain::Bar> {
    let mut bars = make_bars(&vec![100.0; volumes.len()]);
    for (bar, &v) in bars.iter_mut().zip(volumes) {
        bar.volume = v;
    }
    bars
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
