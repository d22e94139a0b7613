//! Global partition stage: many thread blocks cooperate on one sequence.
//!
//! Each block looks up its sequence through the block-to-sequence index
//! vector, partitions its chunk around the sequence pivot, and scatters the
//! results into the sequence's output range with offsets reserved by atomic
//! adds on the sequence record. Pivot keys are final output the moment the
//! partition totals are known, so the last block to retire the sequence
//! writes them straight into the scratch buffers.
//!
//! `ascending` selects the scatter sides: for a descending sort the
//! above-pivot keys fill the front of the output range and the below-pivot
//! keys the back, which keeps the host dispatcher's "lower child first"
//! bookkeeping identical for both orders.

use crate::atomic;
use crate::config::{
    ELEMS_GLOBAL_KO, ELEMS_GLOBAL_KV, THREADS_GLOBAL_KO, THREADS_GLOBAL_KV,
};
use crate::scan::{exclusive_scan, min_max_reduce};
use crate::types::{DeviceGlobalSequence, DIRECTION_PRIMARY};
use core::ptr::addr_of_mut;
use core::sync::atomic::{fence, Ordering};
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
pub unsafe fn partition_global_ko(
    keys: *mut u32,
    keys_buf: *mut u32,
    seqs: *mut DeviceGlobalSequence,
    seq_indices: &[u32],
    ascending: u32,
) {
    let tid = thread::thread_idx_x() as usize;
    let bid = thread::block_idx_x() as usize;
    let scratch = shared_array![u32; 2 * THREADS_GLOBAL_KO];

    let seq = seqs.add(seq_indices[bid] as usize);
    let start = (*seq).start as usize;
    let length = (*seq).length as usize;
    let pivot = (*seq).pivot;
    let (input, output) = sides((*seq).direction, keys, keys_buf);

    let elems_per_block = THREADS_GLOBAL_KO * ELEMS_GLOBAL_KO;
    let chunk_from = start + (bid - (*seq).first_block as usize) * elems_per_block;
    let chunk_to = core::cmp::min(chunk_from + elems_per_block, start + length);

    // Count phase, plus the chunk key range for child refinement.
    let mut cnt_low = 0u32;
    let mut cnt_high = 0u32;
    let mut cnt_pivot = 0u32;
    let mut chunk_min = u32::MAX;
    let mut chunk_max = u32::MIN;
    let mut i = chunk_from + tid;
    while i < chunk_to {
        let key = *input.add(i);
        if key < chunk_min {
            chunk_min = key;
        }
        if key > chunk_max {
            chunk_max = key;
        }
        if goes_front(key, pivot, ascending) {
            cnt_low += 1;
        } else if goes_back(key, pivot, ascending) {
            cnt_high += 1;
        } else {
            cnt_pivot += 1;
        }
        i += THREADS_GLOBAL_KO;
    }

    let (block_min, block_max) =
        min_max_reduce(scratch, tid, THREADS_GLOBAL_KO, chunk_min, chunk_max);
    if tid == 0 {
        atomic::fetch_min(addr_of_mut!((*seq).min_seen), block_min);
        atomic::fetch_max(addr_of_mut!((*seq).max_seen), block_max);
    }

    // In-block offsets and block totals for the three partitions.
    let (low_rank, block_low) = exclusive_scan(scratch, tid, THREADS_GLOBAL_KO, cnt_low);
    let (high_rank, block_high) = exclusive_scan(
        scratch.add(THREADS_GLOBAL_KO),
        tid,
        THREADS_GLOBAL_KO,
        cnt_high,
    );
    let (_, block_pivot) = exclusive_scan(scratch, tid, THREADS_GLOBAL_KO, cnt_pivot);

    // Reserve phase: one atomic add per partition serializes the blocks of
    // this sequence; the pre-add values are this block's output bases.
    if tid == 0 {
        *scratch.add(0) = atomic::fetch_add(addr_of_mut!((*seq).offset_lower), block_low);
        *scratch.add(1) = atomic::fetch_add(addr_of_mut!((*seq).offset_greater), block_high);
        atomic::fetch_add(addr_of_mut!((*seq).offset_pivot), block_pivot);
    }
    thread::sync_threads();
    let mut low_next = *scratch.add(0) + low_rank;
    let mut high_next = *scratch.add(1) + high_rank;
    thread::sync_threads();

    // Scatter phase: restream the chunk; the front partition grows from
    // the start of the output range, the back partition from its end.
    let mut i = chunk_from + tid;
    while i < chunk_to {
        let key = *input.add(i);
        if goes_front(key, pivot, ascending) {
            *output.add(start + low_next as usize) = key;
            low_next += 1;
        } else if goes_back(key, pivot, ascending) {
            *output.add(start + length - 1 - high_next as usize) = key;
            high_next += 1;
        }
        i += THREADS_GLOBAL_KO;
    }

    fence(Ordering::SeqCst);
    thread::sync_threads();
    if tid == 0 {
        *scratch.add(0) = atomic::finish_block(addr_of_mut!((*seq).blocks_remaining)) as u32;
    }
    thread::sync_threads();
    let last_block = *scratch.add(0) != 0;

    // Last-block finalize: the reservation counters now hold the partition
    // totals. Publish them for the host and fill the pivot run of the
    // scratch buffer, its final resting place.
    if last_block {
        let total_low = atomic::load(addr_of_mut!((*seq).offset_lower));
        let total_high = atomic::load(addr_of_mut!((*seq).offset_greater));
        let total_pivot = atomic::load(addr_of_mut!((*seq).offset_pivot));
        if tid == 0 {
            (*seq).count_lower = total_low;
            (*seq).count_greater = total_high;
        }
        let mid_from = start + total_low as usize;
        let mid_to = mid_from + total_pivot as usize;
        let mut i = mid_from + tid;
        while i < mid_to {
            *keys_buf.add(i) = pivot;
            i += THREADS_GLOBAL_KO;
        }
        fence(Ordering::SeqCst);
    }
}

#[kernel]
#[allow(improper_ctypes_definitions, clippy::missing_safety_doc)]
pub unsafe fn partition_global_kv(
    keys: *mut u32,
    values: *mut u32,
    keys_buf: *mut u32,
    values_buf: *mut u32,
    values_pivot: *mut u32,
    seqs: *mut DeviceGlobalSequence,
    seq_indices: &[u32],
    ascending: u32,
) {
    let tid = thread::thread_idx_x() as usize;
    let bid = thread::block_idx_x() as usize;
    let scratch = shared_array![u32; 2 * THREADS_GLOBAL_KV];

    let seq = seqs.add(seq_indices[bid] as usize);
    let start = (*seq).start as usize;
    let length = (*seq).length as usize;
    let pivot = (*seq).pivot;
    let (input, output) = sides((*seq).direction, keys, keys_buf);
    let (input_values, output_values) = sides((*seq).direction, values, values_buf);

    let elems_per_block = THREADS_GLOBAL_KV * ELEMS_GLOBAL_KV;
    let chunk_from = start + (bid - (*seq).first_block as usize) * elems_per_block;
    let chunk_to = core::cmp::min(chunk_from + elems_per_block, start + length);

    let mut cnt_low = 0u32;
    let mut cnt_high = 0u32;
    let mut cnt_pivot = 0u32;
    let mut chunk_min = u32::MAX;
    let mut chunk_max = u32::MIN;
    let mut i = chunk_from + tid;
    while i < chunk_to {
        let key = *input.add(i);
        if key < chunk_min {
            chunk_min = key;
        }
        if key > chunk_max {
            chunk_max = key;
        }
        if goes_front(key, pivot, ascending) {
            cnt_low += 1;
        } else if goes_back(key, pivot, ascending) {
            cnt_high += 1;
        } else {
            cnt_pivot += 1;
        }
        i += THREADS_GLOBAL_KV;
    }

    let (block_min, block_max) =
        min_max_reduce(scratch, tid, THREADS_GLOBAL_KV, chunk_min, chunk_max);
    if tid == 0 {
        atomic::fetch_min(addr_of_mut!((*seq).min_seen), block_min);
        atomic::fetch_max(addr_of_mut!((*seq).max_seen), block_max);
    }

    let (low_rank, block_low) = exclusive_scan(scratch, tid, THREADS_GLOBAL_KV, cnt_low);
    let (high_rank, block_high) = exclusive_scan(
        scratch.add(THREADS_GLOBAL_KV),
        tid,
        THREADS_GLOBAL_KV,
        cnt_high,
    );
    let (pivot_rank, block_pivot) = exclusive_scan(scratch, tid, THREADS_GLOBAL_KV, cnt_pivot);

    if tid == 0 {
        *scratch.add(0) = atomic::fetch_add(addr_of_mut!((*seq).offset_lower), block_low);
        *scratch.add(1) = atomic::fetch_add(addr_of_mut!((*seq).offset_greater), block_high);
        *scratch.add(2) = atomic::fetch_add(addr_of_mut!((*seq).offset_pivot), block_pivot);
    }
    thread::sync_threads();
    let mut low_next = *scratch.add(0) + low_rank;
    let mut high_next = *scratch.add(1) + high_rank;
    let mut pivot_next = *scratch.add(2) + pivot_rank;
    thread::sync_threads();

    // Scatter phase. The final position of a pivot pair is unknown until
    // the whole sequence is counted, so pivot values stage in the side
    // buffer at their reserved slot and move during finalize.
    let mut i = chunk_from + tid;
    while i < chunk_to {
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
            *values_pivot.add(start + pivot_next as usize) = value;
            pivot_next += 1;
        }
        i += THREADS_GLOBAL_KV;
    }

    fence(Ordering::SeqCst);
    thread::sync_threads();
    if tid == 0 {
        *scratch.add(0) = atomic::finish_block(addr_of_mut!((*seq).blocks_remaining)) as u32;
    }
    thread::sync_threads();
    let last_block = *scratch.add(0) != 0;

    if last_block {
        let total_low = atomic::load(addr_of_mut!((*seq).offset_lower));
        let total_high = atomic::load(addr_of_mut!((*seq).offset_greater));
        let total_pivot = atomic::load(addr_of_mut!((*seq).offset_pivot));
        if tid == 0 {
            (*seq).count_lower = total_low;
            (*seq).count_greater = total_high;
        }
        let mid_from = start + total_low as usize;
        let mut i = tid;
        while i < total_pivot as usize {
            *keys_buf.add(mid_from + i) = pivot;
            *values_buf.add(mid_from + i) = *values_pivot.add(start + i);
            i += THREADS_GLOBAL_KV;
        }
        fence(Ordering::SeqCst);
    }
}
