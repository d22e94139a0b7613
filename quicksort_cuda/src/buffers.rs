//! Device key/value arrays for one sort call.
//!
//! The primary arrays hold the caller's data; the scratch arrays are the
//! other half of the ping-pong and the place where final output
//! accumulates. `values_pivot` stages the values of pivot keys in the
//! global stage until their resting position is known.

use crate::error::SortError;
use cust::memory::DeviceBuffer;
use cust::util::SliceExt;
use quicksort_gpu::config;

pub(crate) enum SortBuffers {
    KeyOnly {
        keys: DeviceBuffer<u32>,
        keys_buf: DeviceBuffer<u32>,
    },
    KeyValue {
        keys: DeviceBuffer<u32>,
        keys_buf: DeviceBuffer<u32>,
        values: DeviceBuffer<u32>,
        values_buf: DeviceBuffer<u32>,
        values_pivot: DeviceBuffer<u32>,
    },
}

/// Scratch allocation; contents are fully overwritten before first read.
fn scratch(len: usize, what: &'static str) -> Result<DeviceBuffer<u32>, SortError> {
    unsafe { DeviceBuffer::uninitialized(len) }.map_err(SortError::device_alloc(what))
}

impl SortBuffers {
    pub fn key_only(keys: &[u32]) -> Result<Self, SortError> {
        Ok(Self::KeyOnly {
            keys: keys
                .as_dbuf()
                .map_err(SortError::device_alloc("key array"))?,
            keys_buf: scratch(keys.len(), "key scratch array")?,
        })
    }

    pub fn key_value(keys: &[u32], values: &[u32]) -> Result<Self, SortError> {
        Ok(Self::KeyValue {
            keys: keys
                .as_dbuf()
                .map_err(SortError::device_alloc("key array"))?,
            keys_buf: scratch(keys.len(), "key scratch array")?,
            values: values
                .as_dbuf()
                .map_err(SortError::device_alloc("value array"))?,
            values_buf: scratch(values.len(), "value scratch array")?,
            values_pivot: scratch(values.len(), "pivot value staging")?,
        })
    }

    pub fn keys(&self) -> &DeviceBuffer<u32> {
        match self {
            Self::KeyOnly { keys, .. } | Self::KeyValue { keys, .. } => keys,
        }
    }

    pub fn keys_buf(&self) -> &DeviceBuffer<u32> {
        match self {
            Self::KeyOnly { keys_buf, .. } | Self::KeyValue { keys_buf, .. } => keys_buf,
        }
    }

    /// Minimum sequence length the global stage accepts in this mode.
    pub fn partition_threshold(&self) -> usize {
        match self {
            Self::KeyOnly { .. } => config::THRESHOLD_GLOBAL_KO,
            Self::KeyValue { .. } => config::THRESHOLD_GLOBAL_KV,
        }
    }

    /// Elements one thread block consumes per global partition wave.
    pub fn elems_per_block(&self) -> usize {
        match self {
            Self::KeyOnly { .. } => config::elems_per_block_global_ko(),
            Self::KeyValue { .. } => config::elems_per_block_global_kv(),
        }
    }

    pub fn global_threads(&self) -> u32 {
        match self {
            Self::KeyOnly { .. } => config::THREADS_GLOBAL_KO as u32,
            Self::KeyValue { .. } => config::THREADS_GLOBAL_KV as u32,
        }
    }

    pub fn local_threads(&self) -> u32 {
        match self {
            Self::KeyOnly { .. } => config::THREADS_LOCAL_KO as u32,
            Self::KeyValue { .. } => config::THREADS_LOCAL_KV as u32,
        }
    }
}
