//! Host controller for the GPU quicksort.
//!
//! The device offers no recursion and no task spawning, so the controller
//! trampolines: it launches a global partition wave over every live large
//! sequence, harvests the per-sequence partition counts, splits each
//! sequence into children, and repeats until every surviving sequence is
//! small enough for a single block to finish on its own in the local stage.
//! A single stream serializes every launch and copy; the first device
//! error aborts the call.

use crate::buffers::SortBuffers;
use crate::dispatch::dispatch_wave;
use crate::error::SortError;
use crate::reduce;
use crate::sequence::HostGlobalSequence;
use crate::store::SequenceStore;
use crate::tunables::Tunables;
use crate::SortOrder;
use cust::context::Context;
use cust::module::Module;
use cust::prelude::*;
use cust::stream::{Stream, StreamFlags};
use quicksort_gpu::config;
use quicksort_gpu::types::{LocalSequence, DIRECTION_PRIMARY};
use std::mem;
use tracing::{debug, info};

static PTX: &str = include_str!("../../resources/quicksort_gpu.ptx");

/// Which of the two device key arrays holds the sorted result.
enum FinalBuffer {
    Primary,
    Scratch,
}

/// A CUDA context plus the sort kernels, reusable across sort calls.
pub struct GpuQuicksort {
    module: Module,
    stream: Stream,
    _context: Context,
}

impl GpuQuicksort {
    /// Initialize the device, load the kernel module and create the stream
    /// all sort work serializes on.
    pub fn new() -> Result<Self, SortError> {
        let context = cust::quick_init().map_err(SortError::launch("device initialization"))?;
        let module =
            Module::from_ptx(PTX, &[]).map_err(SortError::launch("kernel module load"))?;
        let stream = Stream::new(StreamFlags::NON_BLOCKING, None)
            .map_err(SortError::launch("stream creation"))?;
        info!("GPU quicksort ready");
        Ok(Self {
            module,
            stream,
            _context: context,
        })
    }

    /// Sort `keys` on the device. On success the slice is ordered per
    /// `order`; on error its contents are unspecified.
    pub fn sort_keys(&self, keys: &mut [u32], order: SortOrder) -> Result<(), SortError> {
        Tunables::current().validate()?;
        check_length(keys.len())?;
        if keys.is_empty() {
            return Ok(());
        }
        let buffers = SortBuffers::key_only(keys)?;
        let mut store = SequenceStore::new(keys.len())?;
        match self.run(order, keys, &buffers, &mut store)? {
            FinalBuffer::Primary => Ok(()),
            FinalBuffer::Scratch => buffers
                .keys_buf()
                .copy_to(keys)
                .map_err(SortError::launch("key download")),
        }
    }

    /// Sort `keys` and carry `values` along with them. Pairing is
    /// preserved; the relative order of values under equal keys is not.
    pub fn sort_key_values(
        &self,
        keys: &mut [u32],
        values: &mut [u32],
        order: SortOrder,
    ) -> Result<(), SortError> {
        if keys.len() != values.len() {
            return Err(SortError::config(format!(
                "key and value arrays differ in length: {} vs {}",
                keys.len(),
                values.len()
            )));
        }
        Tunables::current().validate()?;
        check_length(keys.len())?;
        if keys.is_empty() {
            return Ok(());
        }
        let buffers = SortBuffers::key_value(keys, values)?;
        let mut store = SequenceStore::new(keys.len())?;
        match self.run(order, keys, &buffers, &mut store)? {
            FinalBuffer::Primary => Ok(()),
            FinalBuffer::Scratch => {
                buffers
                    .keys_buf()
                    .copy_to(keys)
                    .map_err(SortError::launch("key download"))?;
                if let SortBuffers::KeyValue { values_buf, .. } = &buffers {
                    values_buf
                        .copy_to(values)
                        .map_err(SortError::launch("value download"))?;
                }
                Ok(())
            }
        }
    }

    fn run(
        &self,
        order: SortOrder,
        host_keys: &[u32],
        buffers: &SortBuffers,
        store: &mut SequenceStore,
    ) -> Result<FinalBuffer, SortError> {
        let n = host_keys.len();
        let (min_key, max_key) = self.min_max(host_keys, buffers, store)?;
        if min_key == max_key {
            debug!(key = min_key, "null distribution, input already sorted");
            return Ok(FinalBuffer::Primary);
        }

        let threshold = buffers.partition_threshold();
        let seq_limit = (n - 1) / threshold + 1;
        let elems_per_block = buffers.elems_per_block();

        store.h_seq.clear();
        store.num_local = 0;
        if n > threshold {
            store
                .h_seq
                .push(HostGlobalSequence::initial(n as u32, min_key, max_key));
        }

        let mut locals = Vec::new();
        while !store.h_seq.is_empty() {
            let num_seq = store.h_seq.len();
            let mut total_blocks = 0;
            for (seq_idx, host_seq) in store.h_seq.iter().enumerate() {
                let blocks = (host_seq.length as usize - 1) / elems_per_block + 1;
                store.seq_staging[seq_idx] = host_seq.stage(total_blocks as u32, blocks as u32);
                for slot in &mut store.block_indices[total_blocks..total_blocks + blocks] {
                    *slot = seq_idx as u32;
                }
                total_blocks += blocks;
            }
            debug!(num_seq, total_blocks, "global partition wave");
            self.partition_wave(order, buffers, store, total_blocks)?;

            locals.clear();
            dispatch_wave(
                &store.h_seq,
                &store.seq_staging[..num_seq],
                order,
                threshold as u32,
                seq_limit,
                &mut store.h_seq_next,
                &mut locals,
            );
            mem::swap(&mut store.h_seq, &mut store.h_seq_next);

            // At the live-sequence ceiling every survivor finishes locally.
            if store.h_seq.len() >= seq_limit {
                debug!(live = store.h_seq.len(), "sequence limit reached, draining");
                for seq in mem::take(&mut store.h_seq) {
                    locals.push(seq.into_local());
                }
            }
            for local_seq in locals.drain(..) {
                self.push_local(order, buffers, store, local_seq)?;
            }
        }

        if n <= threshold {
            self.push_local(
                order,
                buffers,
                store,
                LocalSequence {
                    start: 0,
                    length: n as u32,
                    direction: DIRECTION_PRIMARY,
                },
            )?;
        }
        if store.num_local > 0 {
            self.local_stage(order, buffers, store)?;
        }
        Ok(FinalBuffer::Scratch)
    }

    /// Range reduction: device kernel above the threshold, plain host fold
    /// below it.
    fn min_max(
        &self,
        host_keys: &[u32],
        buffers: &SortBuffers,
        store: &mut SequenceStore,
    ) -> Result<(u32, u32), SortError> {
        let n = host_keys.len();
        if n <= config::THRESHOLD_REDUCTION {
            return Ok(reduce::host_min_max(host_keys));
        }

        let grid = reduce::grid_size(n);
        let function = self
            .module
            .get_function("min_max_reduction")
            .map_err(SortError::launch("reduction kernel lookup"))?;
        let stream = &self.stream;
        let keys = buffers.keys();
        unsafe {
            launch!(function<<<grid as u32, config::THREADS_REDUCTION as u32, 0, stream>>>(
                keys.as_device_ptr(),
                keys.len(),
                store.d_minmax.as_device_ptr()
            ))
        }
        .map_err(SortError::launch("reduction launch"))?;
        self.stream
            .synchronize()
            .map_err(SortError::launch("reduction"))?;

        store
            .d_minmax
            .copy_to(&mut store.minmax_staging[..])
            .map_err(SortError::launch("min/max download"))?;
        Ok(reduce::finish_on_host(&store.minmax_staging))
    }

    fn partition_wave(
        &self,
        order: SortOrder,
        buffers: &SortBuffers,
        store: &mut SequenceStore,
        total_blocks: usize,
    ) -> Result<(), SortError> {
        store
            .d_seq
            .copy_from(&store.seq_staging[..])
            .map_err(SortError::launch("sequence upload"))?;
        store
            .d_block_indices
            .copy_from(&store.block_indices[..])
            .map_err(SortError::launch("block index upload"))?;

        let stream = &self.stream;
        let seqs = store.d_seq.as_device_ptr();
        let indices = store.d_block_indices.as_device_ptr();
        match buffers {
            SortBuffers::KeyOnly { keys, keys_buf } => {
                let function = self
                    .module
                    .get_function("partition_global_ko")
                    .map_err(SortError::launch("partition kernel lookup"))?;
                unsafe {
                    launch!(function<<<total_blocks as u32, buffers.global_threads(), 0, stream>>>(
                        keys.as_device_ptr(),
                        keys_buf.as_device_ptr(),
                        seqs,
                        indices,
                        total_blocks,
                        order.device_flag()
                    ))
                }
                .map_err(SortError::launch("partition launch"))?;
            }
            SortBuffers::KeyValue {
                keys,
                keys_buf,
                values,
                values_buf,
                values_pivot,
            } => {
                let function = self
                    .module
                    .get_function("partition_global_kv")
                    .map_err(SortError::launch("partition kernel lookup"))?;
                unsafe {
                    launch!(function<<<total_blocks as u32, buffers.global_threads(), 0, stream>>>(
                        keys.as_device_ptr(),
                        values.as_device_ptr(),
                        keys_buf.as_device_ptr(),
                        values_buf.as_device_ptr(),
                        values_pivot.as_device_ptr(),
                        seqs,
                        indices,
                        total_blocks,
                        order.device_flag()
                    ))
                }
                .map_err(SortError::launch("partition launch"))?;
            }
        }
        self.stream
            .synchronize()
            .map_err(SortError::launch("partition wave"))?;

        store
            .d_seq
            .copy_to(&mut store.seq_staging[..])
            .map_err(SortError::launch("sequence download"))
    }

    /// Stage one sequence for the local kernel, flushing a full staging
    /// array with an early launch.
    fn push_local(
        &self,
        order: SortOrder,
        buffers: &SortBuffers,
        store: &mut SequenceStore,
        seq: LocalSequence,
    ) -> Result<(), SortError> {
        if store.num_local == store.local_capacity() {
            debug!(count = store.num_local, "local staging full, flushing");
            self.local_stage(order, buffers, store)?;
        }
        store.local_staging[store.num_local] = seq;
        store.num_local += 1;
        Ok(())
    }

    fn local_stage(
        &self,
        order: SortOrder,
        buffers: &SortBuffers,
        store: &mut SequenceStore,
    ) -> Result<(), SortError> {
        let count = store.num_local;
        store
            .d_local
            .copy_from(&store.local_staging[..])
            .map_err(SortError::launch("local sequence upload"))?;

        let stream = &self.stream;
        let seqs = store.d_local.as_device_ptr();
        match buffers {
            SortBuffers::KeyOnly { keys, keys_buf } => {
                let function = self
                    .module
                    .get_function("sort_local_ko")
                    .map_err(SortError::launch("local kernel lookup"))?;
                unsafe {
                    launch!(function<<<count as u32, buffers.local_threads(), 0, stream>>>(
                        keys.as_device_ptr(),
                        keys_buf.as_device_ptr(),
                        seqs,
                        count,
                        order.device_flag()
                    ))
                }
                .map_err(SortError::launch("local sort launch"))?;
            }
            SortBuffers::KeyValue {
                keys,
                keys_buf,
                values,
                values_buf,
                ..
            } => {
                let function = self
                    .module
                    .get_function("sort_local_kv")
                    .map_err(SortError::launch("local kernel lookup"))?;
                unsafe {
                    launch!(function<<<count as u32, buffers.local_threads(), 0, stream>>>(
                        keys.as_device_ptr(),
                        values.as_device_ptr(),
                        keys_buf.as_device_ptr(),
                        values_buf.as_device_ptr(),
                        seqs,
                        count,
                        order.device_flag()
                    ))
                }
                .map_err(SortError::launch("local sort launch"))?;
            }
        }
        self.stream
            .synchronize()
            .map_err(SortError::launch("local sort"))?;

        debug!(count, "local sort stage complete");
        store.num_local = 0;
        Ok(())
    }
}

fn check_length(n: usize) -> Result<(), SortError> {
    if n > u32::MAX as usize {
        return Err(SortError::config(format!(
            "array length {n} exceeds the 32-bit index range"
        )));
    }
    Ok(())
}
