//! In-shared-memory bitonic base case of the local sort.
//!
//! A sub-range is padded to the next power of two with order-appropriate
//! sentinels, run through the full compare-exchange network, and written
//! back to its final position in the scratch buffers. Only the live prefix
//! is written back, so the sentinels never leave shared memory.

use crate::config::THRESHOLD_BITONIC_KV;
use cuda_std::thread;

#[inline]
fn sentinel(ascending: u32) -> u32 {
    if ascending != 0 {
        u32::MAX
    } else {
        u32::MIN
    }
}

/// Sort `length` keys starting at `start` of `input` into `out`.
/// `scratch` must hold at least `length.next_power_of_two()` words.
pub unsafe fn sort_block_keys(
    input: *const u32,
    out: *mut u32,
    start: usize,
    length: usize,
    ascending: u32,
    scratch: *mut u32,
    threads: usize,
) {
    let tid = thread::thread_idx_x() as usize;
    let padded = (length as u32).next_power_of_two() as usize;

    let mut i = tid;
    while i < padded {
        *scratch.add(i) = if i < length {
            *input.add(start + i)
        } else {
            sentinel(ascending)
        };
        i += threads;
    }
    thread::sync_threads();

    let mut size = 2;
    while size <= padded {
        let mut stride = size / 2;
        while stride > 0 {
            let mut i = tid;
            while i < padded {
                let partner = i ^ stride;
                if partner > i {
                    let up = ((i & size) == 0) == (ascending != 0);
                    let a = *scratch.add(i);
                    let b = *scratch.add(partner);
                    if (a > b) == up {
                        *scratch.add(i) = b;
                        *scratch.add(partner) = a;
                    }
                }
                i += threads;
            }
            thread::sync_threads();
            stride /= 2;
        }
        size *= 2;
    }

    let mut i = tid;
    while i < length {
        *out.add(start + i) = *scratch.add(i);
        i += threads;
    }
    thread::sync_threads();
}

/// Key-value variant: keys stage in `scratch[..THRESHOLD_BITONIC_KV]`,
/// values right behind them, and every exchange moves the pair.
pub unsafe fn sort_block_pairs(
    input_keys: *const u32,
    input_values: *const u32,
    out_keys: *mut u32,
    out_values: *mut u32,
    start: usize,
    length: usize,
    ascending: u32,
    scratch: *mut u32,
    threads: usize,
) {
    let tid = thread::thread_idx_x() as usize;
    let padded = (length as u32).next_power_of_two() as usize;
    let keys = scratch;
    let values = scratch.add(THRESHOLD_BITONIC_KV);

    let mut i = tid;
    while i < padded {
        if i < length {
            *keys.add(i) = *input_keys.add(start + i);
            *values.add(i) = *input_values.add(start + i);
        } else {
            *keys.add(i) = sentinel(ascending);
            *values.add(i) = 0;
        }
        i += threads;
    }
    thread::sync_threads();

    let mut size = 2;
    while size <= padded {
        let mut stride = size / 2;
        while stride > 0 {
            let mut i = tid;
            while i < padded {
                let partner = i ^ stride;
                if partner > i {
                    let up = ((i & size) == 0) == (ascending != 0);
                    let a = *keys.add(i);
                    let b = *keys.add(partner);
                    if (a > b) == up {
                        *keys.add(i) = b;
                        *keys.add(partner) = a;
                        let v = *values.add(i);
                        *values.add(i) = *values.add(partner);
                        *values.add(partner) = v;
                    }
                }
                i += threads;
            }
            thread::sync_threads();
            stride /= 2;
        }
        size *= 2;
    }

    let mut i = tid;
    while i < length {
        *out_keys.add(start + i) = *keys.add(i);
        *out_values.add(start + i) = *values.add(i);
        i += threads;
    }
    thread::sync_threads();
}
