//! Pearson correlation of minute returns against a benchmark.

use crate::domain::Bar;

/// Simple returns of the trailing `window + 1` closes.
///
/// `None` on insufficient history, a zero previous close, or a non-finite
/// value.
fn trailing_returns(bars: &[Bar], window: usize) -> Option<Vec<f64>> {
    if window == 0 || bars.len() < window + 1 {
        return None;
    }
    let tail = &bars[bars.len() - (window + 1)..];
    let mut returns = Vec::with_capacity(window);
    for pair in tail.windows(2) {
        let (prev, curr) = (pair[0].close, pair[1].close);
        if !prev.is_finite() || !curr.is_finite() || prev == 0.0 {
            return None;
        }
        returns.push((curr - prev) / prev);
    }
    Some(returns)
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Correlation of the last `window` minute returns of `a` and `b`.
///
/// Series are aligned by position from the end. Returns `0.0` if either side
/// lacks `window + 1` closes or has a constant return sequence.
pub fn price_correlation(a: &[Bar], b: &[Bar], window: usize) -> f64 {
    let (ra, rb) = match (trailing_returns(a, window), trailing_returns(b, window)) {
        (Some(ra), Some(rb)) => (ra, rb),
        _ => return 0.0,
    };
    if is_constant(&ra) || is_constant(&rb) {
        return 0.0;
    }

    let n = ra.len() as f64;
    let mean_a = ra.iter().sum::<f64>() / n;
    let mean_b = rb.iter().sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in ra.iter().zip(&rb) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    let r = cov / denom;
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
