//! Open-interest change across a sample window.

use super::pct_change;
use crate::domain::OpenInterestSnapshot;

/// `(last - first) / first * 100` after ordering samples by timestamp.
///
/// Fewer than two samples, a zero first sample, or a non-finite value
/// yields `0.0`.
pub fn open_interest_change(snapshots: &[OpenInterestSnapshot]) -> f64 {
    if snapshots.len() < 2 {
        return 0.0;
    }
    let mut sorted = snapshots.to_vec();
    sorted.sort_by_key(|s| s.timestamp);
    pct_change(
        sorted[sorted.len() - 1].open_interest,
        sorted[0].open_interest,
    )
}
