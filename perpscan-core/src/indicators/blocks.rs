//! Positional block partitioning.

use crate::domain::Bar;

/// Split `bars` into consecutive blocks of exactly `size` bars, starting at
/// the first bar. A trailing partial block is dropped; `size == 0` yields none.
pub fn blocks(bars: &[Bar], size: usize) -> Vec<&[Bar]> {
    if size == 0 {
        return Vec::new();
    }
    bars.chunks_exact(size).collect()
}
