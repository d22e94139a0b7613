//! 32-bit atomic operations on sequence counters living in global memory.
//!
//! The counters are plain `u32` fields of [`crate::types::DeviceGlobalSequence`];
//! viewing them through `AtomicU32` is sound because the two types share
//! layout and every cross-block access goes through these wrappers.

use core::sync::atomic::{AtomicU32, Ordering};

#[inline]
unsafe fn as_atomic<'a>(counter: *mut u32) -> &'a AtomicU32 {
    &*(counter as *const AtomicU32)
}

/// Reserve `value` slots; returns the previous counter value.
#[inline]
pub unsafe fn fetch_add(counter: *mut u32, value: u32) -> u32 {
    as_atomic(counter).fetch_add(value, Ordering::Relaxed)
}

#[inline]
pub unsafe fn fetch_min(counter: *mut u32, value: u32) {
    as_atomic(counter).fetch_min(value, Ordering::Relaxed);
}

#[inline]
pub unsafe fn fetch_max(counter: *mut u32, value: u32) {
    as_atomic(counter).fetch_max(value, Ordering::Relaxed);
}

/// Signal that this block is done with its sequence. Returns true for the
/// single block that retires the sequence's last outstanding chunk.
#[inline]
pub unsafe fn finish_block(blocks_remaining: *mut u32) -> bool {
    as_atomic(blocks_remaining).fetch_sub(1, Ordering::AcqRel) == 1
}

/// Read a counter after the `finish_block` handoff; pairs with the release
/// half of the decrement so every block's reservation is visible.
#[inline]
pub unsafe fn load(counter: *const u32) -> u32 {
    as_atomic(counter as *mut u32).load(Ordering::Acquire)
}
