//! Percentile rank with average-rank tie handling.

/// Rank of `current` within `history ∪ {current}`, as a fraction in (0, 1].
///
/// Ties share the average of their ranks, then the rank is divided by the
/// number of values. Empty history, a non-finite `current`, or a non-finite
/// history value yields `0.0`.
pub fn percentile_rank(history: &[f64], current: f64) -> f64 {
    if history.is_empty() || !current.is_finite() || history.iter().any(|v| !v.is_finite()) {
        return 0.0;
    }

    let n = history.len() + 1;
    let less = history.iter().filter(|&&v| v < current).count();
    // Includes `current` itself.
    let equal = history.iter().filter(|&&v| v == current).count() + 1;

    let rank = less as f64 + (equal as f64 + 1.0) / 2.0;
    rank / n as f64
}
