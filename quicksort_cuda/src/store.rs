//! Sequence metadata store for one sort call.
//!
//! Everything that crosses the host/device boundary every wave (the staged
//! device sequences, the block-to-sequence index vector, the local
//! sequences and the reduction results) lives in pinned memory; the
//! host-only sequence lists are plain vectors, double-buffered across
//! dispatcher passes.

use crate::error::SortError;
use crate::reduce;
use crate::sequence::HostGlobalSequence;
use cust::memory::{DeviceBuffer, LockedBuffer};
use quicksort_gpu::config;
use quicksort_gpu::types::{DeviceGlobalSequence, LocalSequence};

/// Worst-case number of live sequences the global stage can produce.
pub(crate) fn max_sequence_count(n: usize) -> usize {
    let min_threshold = config::THRESHOLD_GLOBAL_KO.min(config::THRESHOLD_GLOBAL_KV);
    2 * ((n - 1) / min_threshold + 1)
}

/// Worst-case number of thread blocks a single wave can require.
pub(crate) fn max_block_count(n: usize) -> usize {
    let max_threshold = config::THRESHOLD_GLOBAL_KO.max(config::THRESHOLD_GLOBAL_KV);
    let min_elems_per_block =
        config::elems_per_block_global_ko().min(config::elems_per_block_global_kv());
    max_sequence_count(n) * ((max_threshold - 1) / min_elems_per_block + 1)
}

pub(crate) struct SequenceStore {
    pub h_seq: Vec<HostGlobalSequence>,
    pub h_seq_next: Vec<HostGlobalSequence>,
    pub seq_staging: LockedBuffer<DeviceGlobalSequence>,
    pub block_indices: LockedBuffer<u32>,
    pub local_staging: LockedBuffer<LocalSequence>,
    pub minmax_staging: LockedBuffer<u32>,
    pub num_local: usize,
    pub d_seq: DeviceBuffer<DeviceGlobalSequence>,
    pub d_block_indices: DeviceBuffer<u32>,
    pub d_local: DeviceBuffer<LocalSequence>,
    pub d_minmax: DeviceBuffer<u32>,
}

impl SequenceStore {
    pub fn new(n: usize) -> Result<Self, SortError> {
        let max_seq = max_sequence_count(n);
        let max_blocks = max_block_count(n);

        let seq_staging = LockedBuffer::new(&DeviceGlobalSequence::default(), max_seq)
            .map_err(SortError::host_alloc("sequence staging"))?;
        let block_indices = LockedBuffer::new(&0u32, max_blocks)
            .map_err(SortError::host_alloc("block index vector"))?;
        let local_staging = LockedBuffer::new(&LocalSequence::default(), max_seq)
            .map_err(SortError::host_alloc("local sequence staging"))?;
        let minmax_staging = LockedBuffer::new(&0u32, 2 * reduce::grid_size(n))
            .map_err(SortError::host_alloc("min/max staging"))?;

        let d_seq = DeviceBuffer::from_slice(&seq_staging)
            .map_err(SortError::device_alloc("sequence metadata"))?;
        let d_block_indices = DeviceBuffer::from_slice(&block_indices)
            .map_err(SortError::device_alloc("block index vector"))?;
        let d_local = DeviceBuffer::from_slice(&local_staging)
            .map_err(SortError::device_alloc("local sequence metadata"))?;
        let d_minmax = DeviceBuffer::from_slice(&minmax_staging)
            .map_err(SortError::device_alloc("min/max results"))?;

        Ok(Self {
            h_seq: Vec::with_capacity(max_seq),
            h_seq_next: Vec::with_capacity(max_seq),
            seq_staging,
            block_indices,
            local_staging,
            minmax_staging,
            num_local: 0,
            d_seq,
            d_block_indices,
            d_local,
            d_minmax,
        })
    }

    pub fn local_capacity(&self) -> usize {
        self.local_staging.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_capacity_doubles_the_threshold_quotient() {
        let min_threshold = config::THRESHOLD_GLOBAL_KO.min(config::THRESHOLD_GLOBAL_KV);
        assert_eq!(max_sequence_count(1), 2);
        assert_eq!(max_sequence_count(min_threshold), 2);
        assert_eq!(max_sequence_count(min_threshold + 1), 4);
        assert_eq!(max_sequence_count(10 * min_threshold), 20);
    }

    #[test]
    fn block_capacity_covers_a_full_first_wave() {
        // The opening wave partitions one sequence spanning the whole array.
        let n = 1 << 22;
        let elems = config::elems_per_block_global_ko()
            .min(config::elems_per_block_global_kv());
        let first_wave_blocks = (n - 1) / elems + 1;
        assert!(max_block_count(n) >= first_wave_blocks);
    }
}
