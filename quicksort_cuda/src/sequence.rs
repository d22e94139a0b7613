//! Host-side view of the sequences still owned by the global stage.

use crate::SortOrder;
use quicksort_gpu::types::{
    flip_direction, pivot_midpoint, DeviceGlobalSequence, LocalSequence, DIRECTION_PRIMARY,
};

/// One contiguous range of the array awaiting another global partition
/// pass. `direction` says which of the two key arrays currently holds the
/// range's data; it flips with every pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HostGlobalSequence {
    pub start: u32,
    pub length: u32,
    pub min_key: u32,
    pub max_key: u32,
    pub direction: u32,
}

/// Refined key bounds are present unless the record is untouched: every
/// block folds its chunk range in, so the only way to observe the staged
/// sentinels is for no block to have run.
fn refined(result: &DeviceGlobalSequence) -> bool {
    !(result.min_seen == u32::MAX && result.max_seen == u32::MIN)
}

impl HostGlobalSequence {
    pub fn initial(length: u32, min_key: u32, max_key: u32) -> Self {
        Self {
            start: 0,
            length,
            min_key,
            max_key,
            direction: DIRECTION_PRIMARY,
        }
    }

    /// Device record for the next wave, with this sequence's pivot chosen
    /// from its current key bounds.
    pub fn stage(&self, first_block: u32, block_count: u32) -> DeviceGlobalSequence {
        DeviceGlobalSequence::staged(
            self.start,
            self.length,
            self.direction,
            pivot_midpoint(self.min_key, self.max_key),
            first_block,
            block_count,
        )
    }

    /// Child covering the front of the partitioned output. Only meaningful
    /// when `result.count_lower > 0`. Ascending sorts put the below-pivot
    /// keys there; descending sorts the above-pivot keys.
    pub fn lower_child(&self, result: &DeviceGlobalSequence, order: SortOrder) -> Self {
        let (min_key, max_key) = match order {
            SortOrder::Ascending => (
                if refined(result) { result.min_seen } else { self.min_key },
                result.pivot - 1,
            ),
            SortOrder::Descending => (
                result.pivot + 1,
                if refined(result) { result.max_seen } else { self.max_key },
            ),
        };
        Self {
            start: self.start,
            length: result.count_lower,
            min_key,
            max_key,
            direction: flip_direction(self.direction),
        }
    }

    /// Child covering the back of the partitioned output; the mirror image
    /// of [`Self::lower_child`]. Only meaningful when
    /// `result.count_greater > 0`.
    pub fn greater_child(&self, result: &DeviceGlobalSequence, order: SortOrder) -> Self {
        let (min_key, max_key) = match order {
            SortOrder::Ascending => (
                result.pivot + 1,
                if refined(result) { result.max_seen } else { self.max_key },
            ),
            SortOrder::Descending => (
                if refined(result) { result.min_seen } else { self.min_key },
                result.pivot - 1,
            ),
        };
        Self {
            start: self.start + self.length - result.count_greater,
            length: result.count_greater,
            min_key,
            max_key,
            direction: flip_direction(self.direction),
        }
    }

    pub fn into_local(self) -> LocalSequence {
        LocalSequence {
            start: self.start,
            length: self.length,
            direction: self.direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quicksort_gpu::types::DIRECTION_SCRATCH;

    fn partitioned(parent: &HostGlobalSequence, lower: u32, greater: u32) -> DeviceGlobalSequence {
        let mut result = parent.stage(0, 4);
        result.count_lower = lower;
        result.count_greater = greater;
        result.min_seen = parent.min_key + 1;
        result.max_seen = parent.max_key - 1;
        result
    }

    #[test]
    fn initial_sequence_covers_the_whole_array() {
        let seq = HostGlobalSequence::initial(1000, 5, 90);
        assert_eq!((seq.start, seq.length), (0, 1000));
        assert_eq!(seq.direction, DIRECTION_PRIMARY);
    }

    #[test]
    fn staging_picks_the_midpoint_pivot() {
        let seq = HostGlobalSequence::initial(1000, 10, 20);
        let staged = seq.stage(3, 8);
        assert_eq!(staged.pivot, 15);
        assert_eq!((staged.first_block, staged.block_count), (3, 8));
    }

    #[test]
    fn ascending_children_split_the_key_range_around_the_pivot() {
        let parent = HostGlobalSequence::initial(1000, 0, 100);
        let result = partitioned(&parent, 400, 500);

        let lower = parent.lower_child(&result, SortOrder::Ascending);
        assert_eq!((lower.start, lower.length), (0, 400));
        assert_eq!((lower.min_key, lower.max_key), (1, 49));
        assert_eq!(lower.direction, DIRECTION_SCRATCH);

        let greater = parent.greater_child(&result, SortOrder::Ascending);
        assert_eq!((greater.start, greater.length), (500, 500));
        assert_eq!((greater.min_key, greater.max_key), (51, 99));
        assert_eq!(greater.direction, DIRECTION_SCRATCH);
    }

    #[test]
    fn descending_children_swap_the_key_bounds() {
        let parent = HostGlobalSequence::initial(1000, 0, 100);
        let result = partitioned(&parent, 400, 500);

        let lower = parent.lower_child(&result, SortOrder::Descending);
        assert_eq!((lower.min_key, lower.max_key), (51, 99));

        let greater = parent.greater_child(&result, SortOrder::Descending);
        assert_eq!((greater.min_key, greater.max_key), (1, 49));
    }

    #[test]
    fn unrefined_results_fall_back_to_parent_bounds() {
        let parent = HostGlobalSequence::initial(1000, 10, 100);
        let mut result = parent.stage(0, 4);
        result.count_lower = 400;
        result.count_greater = 500;

        let lower = parent.lower_child(&result, SortOrder::Ascending);
        assert_eq!(lower.min_key, 10);
        let greater = parent.greater_child(&result, SortOrder::Ascending);
        assert_eq!(greater.max_key, 100);
    }

    #[test]
    fn children_flip_back_on_the_second_level() {
        let parent = HostGlobalSequence::initial(1000, 0, 100);
        let result = partitioned(&parent, 600, 300);
        let child = parent.lower_child(&result, SortOrder::Ascending);
        let grand = child.lower_child(&partitioned(&child, 100, 200), SortOrder::Ascending);
        assert_eq!(grand.direction, DIRECTION_PRIMARY);
    }
}
