use crate::config::{ELEMS_REDUCTION, THREADS_REDUCTION};
use crate::scan::min_max_reduce;
use cuda_std::{kernel, shared_array, thread};

/// Grid-wide min/max reduction over the keys. Every block folds a chunk of
/// `THREADS_REDUCTION * ELEMS_REDUCTION` keys through shared memory and
/// writes its pair into `out` as `out[block] = min`,
/// `out[grid_dim + block] = max`; the host finishes the remaining
/// `grid_dim` pairs serially.
#[kernel]
#[allow(improper_ctypes_definitions, clippy::missing_safety_doc)]
pub unsafe fn min_max_reduction(keys: &[u32], out: *mut u32) {
    let tid = thread::thread_idx_x() as usize;
    let bid = thread::block_idx_x() as usize;
    let grid = thread::grid_dim_x() as usize;
    let scratch = shared_array![u32; 2 * THREADS_REDUCTION];

    let chunk = THREADS_REDUCTION * ELEMS_REDUCTION;
    let from = bid * chunk;
    let to = core::cmp::min(from + chunk, keys.len());

    let mut min = u32::MAX;
    let mut max = u32::MIN;
    let mut i = from + tid;
    while i < to {
        let key = keys[i];
        if key < min {
            min = key;
        }
        if key > max {
            max = key;
        }
        i += THREADS_REDUCTION;
    }

    let (block_min, block_max) = min_max_reduce(scratch, tid, THREADS_REDUCTION, min, max);
    if tid == 0 {
        *out.add(bid) = block_min;
        *out.add(grid + bid) = block_max;
    }
}
