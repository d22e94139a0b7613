//! Validation of the compile-time kernel tunables.
//!
//! The values themselves live in [`quicksort_gpu::config`]; this snapshot
//! exists so the precondition checks run once per sort call and so the
//! rejection paths stay testable with arbitrary values.

use crate::error::SortError;
use quicksort_gpu::config;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Tunables {
    pub reduction_threads: usize,
    pub reduction_elems: usize,
    pub global_threshold_ko: usize,
    pub global_threshold_kv: usize,
    pub global_threads_ko: usize,
    pub global_elems_ko: usize,
    pub global_threads_kv: usize,
    pub global_elems_kv: usize,
    pub bitonic_threshold_ko: usize,
    pub bitonic_threshold_kv: usize,
    pub local_threads_ko: usize,
    pub local_threads_kv: usize,
}

impl Tunables {
    pub fn current() -> Self {
        Self {
            reduction_threads: config::THREADS_REDUCTION,
            reduction_elems: config::ELEMS_REDUCTION,
            global_threshold_ko: config::THRESHOLD_GLOBAL_KO,
            global_threshold_kv: config::THRESHOLD_GLOBAL_KV,
            global_threads_ko: config::THREADS_GLOBAL_KO,
            global_elems_ko: config::ELEMS_GLOBAL_KO,
            global_threads_kv: config::THREADS_GLOBAL_KV,
            global_elems_kv: config::ELEMS_GLOBAL_KV,
            bitonic_threshold_ko: config::THRESHOLD_BITONIC_KO,
            bitonic_threshold_kv: config::THRESHOLD_BITONIC_KV,
            local_threads_ko: config::THREADS_LOCAL_KO,
            local_threads_kv: config::THREADS_LOCAL_KV,
        }
    }

    pub fn validate(&self) -> Result<(), SortError> {
        let block_widths = [
            ("reduction", self.reduction_threads),
            ("global key-only", self.global_threads_ko),
            ("global key-value", self.global_threads_kv),
            ("local key-only", self.local_threads_ko),
            ("local key-value", self.local_threads_kv),
        ];
        for (name, width) in block_widths {
            if width == 0 || !width.is_power_of_two() {
                return Err(SortError::config(format!(
                    "{name} block width {width} must be a power of two"
                )));
            }
        }

        if self.reduction_elems == 0 || self.global_elems_ko == 0 || self.global_elems_kv == 0 {
            return Err(SortError::config("per-thread element counts must be positive"));
        }

        if self.global_threshold_ko < self.global_threads_ko * self.global_elems_ko {
            return Err(SortError::config(format!(
                "key-only partition threshold {} is below one thread block's work",
                self.global_threshold_ko
            )));
        }
        if self.global_threshold_kv < self.global_threads_kv * self.global_elems_kv {
            return Err(SortError::config(format!(
                "key-value partition threshold {} is below one thread block's work",
                self.global_threshold_kv
            )));
        }

        for (name, threshold) in [
            ("key-only", self.bitonic_threshold_ko),
            ("key-value", self.bitonic_threshold_kv),
        ] {
            if threshold == 0 || !threshold.is_power_of_two() {
                return Err(SortError::config(format!(
                    "{name} bitonic threshold {threshold} must be a power of two"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_tunables_are_valid() {
        assert!(Tunables::current().validate().is_ok());
    }

    #[test]
    fn rejects_non_power_of_two_block_width() {
        let mut tunables = Tunables::current();
        tunables.local_threads_ko = 96;
        assert!(tunables.validate().is_err());
    }

    #[test]
    fn rejects_threshold_below_one_block_of_work() {
        let mut tunables = Tunables::current();
        tunables.global_threshold_ko = tunables.global_threads_ko * tunables.global_elems_ko - 1;
        let err = tunables.validate().unwrap_err();
        assert!(matches!(err, SortError::ConfigurationInvalid { .. }));
    }

    #[test]
    fn rejects_zero_elems_per_thread() {
        let mut tunables = Tunables::current();
        tunables.reduction_elems = 0;
        assert!(tunables.validate().is_err());
    }
}
