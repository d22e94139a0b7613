//! Block-wide reductions and scans over shared memory.
//!
//! Every helper must be called by all threads of the block with the same
//! `threads` value, and leaves a barrier behind so the caller may reuse the
//! scratch region immediately.

use cuda_std::thread;

/// Exclusive prefix sum of one counter per thread, Kogge-Stone over
/// `scratch` (`threads` words). Returns `(own exclusive offset, block total)`.
pub unsafe fn exclusive_scan(
    scratch: *mut u32,
    tid: usize,
    threads: usize,
    value: u32,
) -> (u32, u32) {
    *scratch.add(tid) = value;
    thread::sync_threads();

    let mut stride = 1;
    while stride < threads {
        let carry = if tid >= stride {
            *scratch.add(tid - stride)
        } else {
            0
        };
        thread::sync_threads();
        if tid >= stride {
            *scratch.add(tid) += carry;
        }
        thread::sync_threads();
        stride *= 2;
    }

    let inclusive = *scratch.add(tid);
    let total = *scratch.add(threads - 1);
    thread::sync_threads();
    (inclusive - value, total)
}

/// Block-wide min/max tree reduction. `scratch` holds `2 * threads` words,
/// minima in the lower half and maxima in the upper. Returns the block-wide
/// `(min, max)` to every thread.
pub unsafe fn min_max_reduce(
    scratch: *mut u32,
    tid: usize,
    threads: usize,
    min: u32,
    max: u32,
) -> (u32, u32) {
    let mins = scratch;
    let maxs = scratch.add(threads);
    *mins.add(tid) = min;
    *maxs.add(tid) = max;
    thread::sync_threads();

    let mut half = threads / 2;
    while half > 0 {
        if tid < half {
            let other = *mins.add(tid + half);
            if other < *mins.add(tid) {
                *mins.add(tid) = other;
            }
            let other = *maxs.add(tid + half);
            if other > *maxs.add(tid) {
                *maxs.add(tid) = other;
            }
        }
        thread::sync_threads();
        half /= 2;
    }

    let result = (*mins.add(0), *maxs.add(0));
    thread::sync_threads();
    result
}
