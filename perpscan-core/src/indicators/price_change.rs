//! Close-to-close price change.

use super::blocks::blocks;
use super::pct_change;
use crate::domain::Bar;

/// Percent change from the first to the last close of the trailing
/// `window + 1` bars.
pub fn price_change_percent(bars: &[Bar], window: usize) -> f64 {
    if window == 0 || bars.len() < window + 1 {
        return 0.0;
    }
    let first = bars[bars.len() - (window + 1)].close;
    let last = bars[bars.len() - 1].close;
    pct_change(last, first)
}

/// Block-over-block close change, oldest first.
///
/// Entry `i` compares the last close of block `i + 1` with the last close of
/// block `i`.
pub fn price_change_history(bars: &[Bar], window: usize) -> Vec<f64> {
    blocks(bars, window)
        .windows(2)
        .map(|pair| {
            let prev = pair[0][pair[0].len() - 1].close;
            let curr = pair[1][pair[1].len() - 1].close;
            pct_change(curr, prev)
        })
        .collect()
}
