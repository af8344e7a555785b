//! Volume anomaly: latest block volume vs. the mean of the preceding blocks.
//!
//! change = (V_latest - mean(V_prev20)) / mean(V_prev20) * 100
//! Requires BASELINE_BLOCKS + 1 full blocks.

use super::blocks::blocks;
use super::pct_change;
use crate::domain::Bar;

/// Number of prior blocks in the baseline average.
pub const BASELINE_BLOCKS: usize = 20;

/// Summed volume of each full block, oldest first.
///
/// `None` if any bar volume is non-finite.
pub fn block_volumes(bars: &[Bar], window: usize) -> Option<Vec<f64>> {
    let mut out = Vec::new();
    for block in blocks(bars, window) {
        let total: f64 = block.iter().map(|b| b.volume).sum();
        if !total.is_finite() {
            return None;
        }
        out.push(total);
    }
    Some(out)
}

fn change_vs_baseline(volumes: &[f64], idx: usize) -> f64 {
    let baseline = &volumes[idx - BASELINE_BLOCKS..idx];
    let mean = baseline.iter().sum::<f64>() / BASELINE_BLOCKS as f64;
    pct_change(volumes[idx], mean)
}

/// Volume change of the latest full block vs. the 20 before it.
pub fn volume_change(bars: &[Bar], window: usize) -> f64 {
    if window == 0 || bars.len() < (BASELINE_BLOCKS + 1) * window {
        return 0.0;
    }
    match block_volumes(bars, window) {
        Some(volumes) => change_vs_baseline(&volumes, volumes.len() - 1),
        None => 0.0,
    }
}

/// Volume change of every block that has a full baseline, oldest first.
///
/// The last element equals [`volume_change`]. Empty when there are fewer
/// than 21 blocks or any volume is non-finite.
pub fn volume_change_history(bars: &[Bar], window: usize) -> Vec<f64> {
    let volumes = match block_volumes(bars, window) {
        Some(v) => v,
        None => return Vec::new(),
    };
    (BASELINE_BLOCKS..volumes.len())
        .map(|idx| change_vs_baseline(&volumes, idx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_volume_bars, DEFAULT_EPSILON};

    #[test]
    fn insufficient_history_is_zero() {
        let bars = make_volume_bars(&vec![10.0; 21 * 5 - 1]);
        assert_eq!(volume_change(&bars, 5), 0.0);
    }

    #[test]
    fn flat_volume_is_zero() {
        let bars = make_volume_bars(&vec![7.0; 21 * 15]);
        assert_eq!(volume_change(&bars, 15), 0.0);
    }

    #[test]
    fn spike_in_latest_block() {
        let mut vols = vec![1.0; 20 * 5];
        vols.extend(vec![10.0; 5]);
        let bars = make_volume_bars(&vols);
        assert_approx(volume_change(&bars, 5), 900.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_baseline_is_zero() {
        let mut vols = vec![0.0; 20 * 5];
        vols.extend(vec![3.0; 5]);
        assert_eq!(volume_change(&make_volume_bars(&vols), 5), 0.0);
    }

    #[test]
    fn void_volume_is_zero() {
        let mut vols = vec![1.0; 21 * 5];
        vols[3] = f64::NAN;
        assert_eq!(volume_change(&make_volume_bars(&vols), 5), 0.0);
    }

    #[test]
    fn partial_tail_is_ignored() {
        let mut vols = vec![1.0; 20 * 5];
        vols.extend(vec![2.0; 5]);
        vols.extend(vec![100.0; 3]);
        assert_approx(volume_change(&make_volume_bars(&vols), 5), 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn history_ends_with_headline() {
        let vols: Vec<f64> = (0..30 * 5).map(|i| 1.0 + (i % 7) as f64).collect();
        let bars = make_volume_bars(&vols);
        let history = volume_change_history(&bars, 5);
        assert_eq!(history.len(), 10);
        assert_approx(
            *history.last().unwrap(),
            volume_change(&bars, 5),
            DEFAULT_EPSILON,
        );
    }
}
