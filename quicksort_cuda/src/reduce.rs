//! Host half of the min/max range reduction.

use itertools::{Itertools, MinMaxResult};
use quicksort_gpu::config::{ELEMS_REDUCTION, THREADS_REDUCTION};

/// Grid size of the device reduction over `n` keys.
pub(crate) fn grid_size(n: usize) -> usize {
    (n - 1) / (THREADS_REDUCTION * ELEMS_REDUCTION) + 1
}

/// Whole reduction on the host, for arrays below the device threshold.
pub(crate) fn host_min_max(keys: &[u32]) -> (u32, u32) {
    match keys.iter().copied().minmax() {
        MinMaxResult::NoElements => (0, 0),
        MinMaxResult::OneElement(key) => (key, key),
        MinMaxResult::MinMax(min, max) => (min, max),
    }
}

/// Fold the per-block pairs the reduction kernel produced: minima first,
/// maxima behind them.
pub(crate) fn finish_on_host(pairs: &[u32]) -> (u32, u32) {
    let grid = pairs.len() / 2;
    let min = pairs[..grid].iter().copied().min().unwrap_or(u32::MAX);
    let max = pairs[grid..].iter().copied().max().unwrap_or(u32::MIN);
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_reduction_finds_both_extremes() {
        assert_eq!(host_min_max(&[3, 1, 4, 1, 5, 9, 2, 6]), (1, 9));
        assert_eq!(host_min_max(&[7]), (7, 7));
        assert_eq!(host_min_max(&[5, 5, 5]), (5, 5));
    }

    #[test]
    fn device_pairs_fold_across_blocks() {
        // Two blocks: mins [4, 2], maxs [9, 7].
        assert_eq!(finish_on_host(&[4, 2, 9, 7]), (2, 9));
    }

    #[test]
    fn one_block_per_chunk_of_threads_times_elems() {
        let chunk = THREADS_REDUCTION * ELEMS_REDUCTION;
        assert_eq!(grid_size(1), 1);
        assert_eq!(grid_size(chunk), 1);
        assert_eq!(grid_size(chunk + 1), 2);
    }
}
