//! Local sort stage: one thread block owns one sequence.
//!
//! The block partitions its sequence recursively through an explicit range
//! stack, ping-ponging between the primary and scratch arrays, and falls
//! through to the shared-memory bitonic network once a sub-range is small
//! enough. No global atomics are involved; every barrier is a plain block
//! barrier. Partition output that is already final (pivot runs and bitonic
//! results) always lands in the scratch arrays, so the whole array ends up
//! there once every block drains its stack.

use crate::bitonic;
use crate::config::{
    shared_len_local_ko, shared_len_local_kv, THREADS_LOCAL_KO, THREADS_LOCAL_KV,
    THRESHOLD_BITONIC_KO, THRESHOLD_BITONIC_KV,
};
use crate::scan::{exclusive_scan, min_max_reduce};
use crate::stack::RangeStack;
use crate::types::{flip_direction, pivot_midpoint, LocalSequence, DIRECTION_PRIMARY};
use cuda_std::{kernel, shared_array, thread};

#[inline]
unsafe fn sides(
    direction: u32,
    primary: *mut u32,
    scratch: *mut u32,
) -> (*const u32, *mut u32) {
    if direction == DIRECTION_PRIMARY {
        (primary as *const u32, scratch)
    } else {
        (scratch as *const u32, primary)
    }
}

#[inline]
fn goes_front(key: u32, pivot: u32, ascending: u32) -> bool {
    if ascending != 0 {
        key < pivot
    } else {
        key > pivot
    }
}

#[inline]
fn goes_back(key: u32, pivot: u32, ascending: u32) -> bool {
    if ascending != 0 {
        key > pivot
    } else {
        key < pivot
    }
}

#[kernel]
#[allow(improper_ctypes_definitions, clippy::missing_safety_doc)]
pub unsafe fn sort_local_ko(
    keys: *mut u32,
    keys_buf: *mut u32,
    seqs: &[LocalSequence],
    ascending: u32,
) {
    let tid = thread::thread_idx_x() as usize;
    let bid = thread::block_idx_x() as usize;
    let scratch = shared_array![u32; shared_len_local_ko()];

    let mut stack = RangeStack::new();
    stack.push(seqs[bid]);

    while let Some(range) = stack.pop() {
        if range.length == 0 {
            continue;
        }
        let start = range.start as usize;
        let length = range.length as usize;
        let (input, output) = sides(range.direction, keys, keys_buf);

        if length <= THRESHOLD_BITONIC_KO {
            bitonic::sort_block_keys(
                input,
                keys_buf,
                start,
                length,
                ascending,
                scratch,
                THREADS_LOCAL_KO,
            );
            continue;
        }

        // Pivot from the range's own key span.
        let mut range_min = u32::MAX;
        let mut range_max = u32::MIN;
        let mut i = start + tid;
        while i < start + length {
            let key = *input.add(i);
            if key < range_min {
                range_min = key;
            }
            if key > range_max {
                range_max = key;
            }
            i += THREADS_LOCAL_KO;
        }
        let (min_key, max_key) =
            min_max_reduce(scratch, tid, THREADS_LOCAL_KO, range_min, range_max);

        // A degenerate span is one long pivot run; it is final as-is.
        if min_key == max_key {
            let mut i = start + tid;
            while i < start + length {
                *keys_buf.add(i) = min_key;
                i += THREADS_LOCAL_KO;
            }
            thread::sync_threads();
            continue;
        }
        let pivot = pivot_midpoint(min_key, max_key);

        let mut cnt_low = 0u32;
        let mut cnt_high = 0u32;
        let mut i = start + tid;
        while i < start + length {
            let key = *input.add(i);
            if goes_front(key, pivot, ascending) {
                cnt_low += 1;
            } else if goes_back(key, pivot, ascending) {
                cnt_high += 1;
            }
            i += THREADS_LOCAL_KO;
        }

        let (low_rank, block_low) = exclusive_scan(scratch, tid, THREADS_LOCAL_KO, cnt_low);
        let (high_rank, block_high) = exclusive_scan(
            scratch.add(THREADS_LOCAL_KO),
            tid,
            THREADS_LOCAL_KO,
            cnt_high,
        );

        let mut low_next = low_rank;
        let mut high_next = high_rank;
        let mut i = start + tid;
        while i < start + length {
            let key = *input.add(i);
            if goes_front(key, pivot, ascending) {
                *output.add(start + low_next as usize) = key;
                low_next += 1;
            } else if goes_back(key, pivot, ascending) {
                *output.add(start + length - 1 - high_next as usize) = key;
                high_next += 1;
            }
            i += THREADS_LOCAL_KO;
        }
        // Every input read must land before the pivot run overwrites cells
        // of the side the range was read from.
        thread::sync_threads();

        // The pivot run between the partitions is final output.
        let mid_from = start + block_low as usize;
        let mid_to = start + length - block_high as usize;
        let mut i = mid_from + tid;
        while i < mid_to {
            *keys_buf.add(i) = pivot;
            i += THREADS_LOCAL_KO;
        }
        thread::sync_threads();

        let child_direction = flip_direction(range.direction);
        stack.push(LocalSequence {
            start: range.start,
            length: block_low,
            direction: child_direction,
        });
        stack.push(LocalSequence {
            start: range.start + range.length - block_high,
            length: block_high,
            direction: child_direction,
        });
    }
}

#[kernel]
#[allow(improper_ctypes_definitions, clippy::missing_safety_doc)]
pub unsafe fn sort_local_kv(
    keys: *mut u32,
    values: *mut u32,
    keys_buf: *mut u32,
    values_buf: *mut u32,
    seqs: &[LocalSequence],
    ascending: u32,
) {
    let tid = thread::thread_idx_x() as usize;
    let bid = thread::block_idx_x() as usize;
    let scratch = shared_array![u32; shared_len_local_kv()];

    let mut stack = RangeStack::new();
    stack.push(seqs[bid]);

    while let Some(range) = stack.pop() {
        if range.length == 0 {
            continue;
        }
        let start = range.start as usize;
        let length = range.length as usize;
        let (input, output) = sides(range.direction, keys, keys_buf);
        let (input_values, output_values) = sides(range.direction, values, values_buf);

        if length <= THRESHOLD_BITONIC_KV {
            bitonic::sort_block_pairs(
                input,
                input_values,
                keys_buf,
                values_buf,
                start,
                length,
                ascending,
                scratch,
                THREADS_LOCAL_KV,
            );
            continue;
        }

        let mut range_min = u32::MAX;
        let mut range_max = u32::MIN;
        let mut i = start + tid;
        while i < start + length {
            let key = *input.add(i);
            if key < range_min {
                range_min = key;
            }
            if key > range_max {
                range_max = key;
            }
            i += THREADS_LOCAL_KV;
        }
        let (min_key, max_key) =
            min_max_reduce(scratch, tid, THREADS_LOCAL_KV, range_min, range_max);

        if min_key == max_key {
            let mut i = start + tid;
            while i < start + length {
                *keys_buf.add(i) = min_key;
                *values_buf.add(i) = *input_values.add(i);
                i += THREADS_LOCAL_KV;
            }
            thread::sync_threads();
            continue;
        }
        let pivot = pivot_midpoint(min_key, max_key);

        let mut cnt_low = 0u32;
        let mut cnt_high = 0u32;
        let mut cnt_pivot = 0u32;
        let mut i = start + tid;
        while i < start + length {
            let key = *input.add(i);
            if goes_front(key, pivot, ascending) {
                cnt_low += 1;
            } else if goes_back(key, pivot, ascending) {
                cnt_high += 1;
            } else {
                cnt_pivot += 1;
            }
            i += THREADS_LOCAL_KV;
        }

        let (low_rank, block_low) = exclusive_scan(scratch, tid, THREADS_LOCAL_KV, cnt_low);
        let (high_rank, block_high) = exclusive_scan(
            scratch.add(THREADS_LOCAL_KV),
            tid,
            THREADS_LOCAL_KV,
            cnt_high,
        );
        let (pivot_rank, block_pivot) = exclusive_scan(scratch, tid, THREADS_LOCAL_KV, cnt_pivot);

        // The pivot total is already known here, so pivot pairs scatter to
        // their final slots through the output side, which is disjoint from
        // the side still being read.
        let mid_from = start + block_low as usize;
        let mut low_next = low_rank;
        let mut high_next = high_rank;
        let mut pivot_next = pivot_rank;
        let mut i = start + tid;
        while i < start + length {
            let key = *input.add(i);
            let value = *input_values.add(i);
            if goes_front(key, pivot, ascending) {
                *output.add(start + low_next as usize) = key;
                *output_values.add(start + low_next as usize) = value;
                low_next += 1;
            } else if goes_back(key, pivot, ascending) {
                let at = start + length - 1 - high_next as usize;
                *output.add(at) = key;
                *output_values.add(at) = value;
                high_next += 1;
            } else {
                *output.add(mid_from + pivot_next as usize) = pivot;
                *output_values.add(mid_from + pivot_next as usize) = value;
                pivot_next += 1;
            }
            i += THREADS_LOCAL_KV;
        }
        thread::sync_threads();

        // Pivot pairs are final; if this step scattered into the primary
        // side, mirror the run into the scratch arrays now that every input
        // read has landed.
        if range.direction != DIRECTION_PRIMARY {
            let mut i = mid_from + tid;
            while i < mid_from + block_pivot as usize {
                *keys_buf.add(i) = pivot;
                *values_buf.add(i) = *output_values.add(i);
                i += THREADS_LOCAL_KV;
            }
            thread::sync_threads();
        }

        let child_direction = flip_direction(range.direction);
        stack.push(LocalSequence {
            start: range.start,
            length: block_low,
            direction: child_direction,
        });
        stack.push(LocalSequence {
            start: range.start + range.length - block_high,
            length: block_high,
            direction: child_direction,
        });
    }
}
