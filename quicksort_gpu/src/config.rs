//! Compile-time tunables for the sort kernels.
//!
//! Block widths must be powers of two (the in-block reductions and scans
//! halve them), and each global partition threshold must cover at least one
//! thread block's worth of elements. The host validates these preconditions
//! before launching anything.

/// Array length above which the min/max reduction runs on the device.
pub const THRESHOLD_REDUCTION: usize = 1 << 13;
/// Block width of the min/max reduction kernel.
pub const THREADS_REDUCTION: usize = 128;
/// Elements scanned per thread in the min/max reduction kernel.
pub const ELEMS_REDUCTION: usize = 64;

/// Minimum sequence length routed to the global partition stage, key-only.
pub const THRESHOLD_GLOBAL_KO: usize = 1 << 13;
/// Minimum sequence length routed to the global partition stage, key-value.
pub const THRESHOLD_GLOBAL_KV: usize = 1 << 12;

/// Block width of the global partition kernel, key-only.
pub const THREADS_GLOBAL_KO: usize = 128;
/// Elements per thread in the global partition kernel, key-only.
pub const ELEMS_GLOBAL_KO: usize = 8;
/// Block width of the global partition kernel, key-value.
pub const THREADS_GLOBAL_KV: usize = 128;
/// Elements per thread in the global partition kernel, key-value.
pub const ELEMS_GLOBAL_KV: usize = 4;

/// Sub-range length at which the local stage falls through to bitonic sort.
pub const THRESHOLD_BITONIC_KO: usize = 1 << 10;
/// Bitonic fall-through threshold for key-value pairs.
pub const THRESHOLD_BITONIC_KV: usize = 1 << 9;

/// Block width of the local sort kernel, key-only.
pub const THREADS_LOCAL_KO: usize = 128;
/// Block width of the local sort kernel, key-value.
pub const THREADS_LOCAL_KV: usize = 128;

/// Capacity of the per-block recursion stack in the local kernel. The
/// midpoint pivot halves the key range every level, so a 32-bit key space
/// bounds the depth at 32; the stack grows by at most one entry per level.
pub const MAX_LOCAL_DEPTH: usize = 64;

pub const fn elems_per_block_global_ko() -> usize {
    THREADS_GLOBAL_KO * ELEMS_GLOBAL_KO
}

pub const fn elems_per_block_global_kv() -> usize {
    THREADS_GLOBAL_KV * ELEMS_GLOBAL_KV
}

const fn max(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

/// Shared memory words of the key-only local kernel. The scan region and
/// the bitonic staging region are live at different times, so one
/// allocation serves both.
pub const fn shared_len_local_ko() -> usize {
    max(2 * THREADS_LOCAL_KO, THRESHOLD_BITONIC_KO)
}

/// Shared memory words of the key-value local kernel; the bitonic region
/// holds keys and values side by side.
pub const fn shared_len_local_kv() -> usize {
    max(2 * THREADS_LOCAL_KV, 2 * THRESHOLD_BITONIC_KV)
}
