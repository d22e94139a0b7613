//! Wave dispatcher: splits every partitioned sequence into its children
//! and routes each child to the next global wave or to the local stage.

use crate::sequence::HostGlobalSequence;
use crate::SortOrder;
use quicksort_gpu::types::{flip_direction, DeviceGlobalSequence, LocalSequence};

/// Walk the wave's parents and their device results. Children longer than
/// `threshold` stay global while the projected live-sequence count is below
/// `seq_limit`; everything else with any elements drains to the local
/// stage. Empty children vanish.
pub(crate) fn dispatch_wave(
    parents: &[HostGlobalSequence],
    results: &[DeviceGlobalSequence],
    order: SortOrder,
    threshold: u32,
    seq_limit: usize,
    next: &mut Vec<HostGlobalSequence>,
    local: &mut Vec<LocalSequence>,
) {
    next.clear();
    for (parent, result) in parents.iter().zip(results) {
        if result.count_lower > threshold && next.len() < seq_limit {
            next.push(parent.lower_child(result, order));
        } else if result.count_lower > 0 {
            local.push(LocalSequence {
                start: parent.start,
                length: result.count_lower,
                direction: flip_direction(parent.direction),
            });
        }

        if result.count_greater > threshold && next.len() < seq_limit {
            next.push(parent.greater_child(result, order));
        } else if result.count_greater > 0 {
            local.push(LocalSequence {
                start: parent.start + parent.length - result.count_greater,
                length: result.count_greater,
                direction: flip_direction(parent.direction),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quicksort_gpu::types::DIRECTION_SCRATCH;

    const THRESHOLD: u32 = 1 << 13;

    fn parent(start: u32, length: u32) -> HostGlobalSequence {
        HostGlobalSequence {
            start,
            length,
            min_key: 0,
            max_key: 1 << 20,
            direction: 0,
        }
    }

    fn result_for(parent: &HostGlobalSequence, lower: u32, greater: u32) -> DeviceGlobalSequence {
        let mut result = parent.stage(0, 1);
        result.count_lower = lower;
        result.count_greater = greater;
        result.min_seen = 1;
        result.max_seen = 1 << 19;
        result
    }

    fn run(
        parents: &[HostGlobalSequence],
        results: &[DeviceGlobalSequence],
        seq_limit: usize,
    ) -> (Vec<HostGlobalSequence>, Vec<LocalSequence>) {
        let mut next = Vec::new();
        let mut local = Vec::new();
        dispatch_wave(
            parents,
            results,
            SortOrder::Ascending,
            THRESHOLD,
            seq_limit,
            &mut next,
            &mut local,
        );
        (next, local)
    }

    #[test]
    fn large_children_stay_global_small_ones_go_local() {
        let p = parent(0, 3 * THRESHOLD);
        let r = result_for(&p, 2 * THRESHOLD, 100);
        let (next, local) = run(&[p], &[r], 16);

        assert_eq!(next.len(), 1);
        assert_eq!((next[0].start, next[0].length), (0, 2 * THRESHOLD));
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].start, p.start + p.length - 100);
        assert_eq!(local[0].length, 100);
        assert_eq!(local[0].direction, DIRECTION_SCRATCH);
    }

    #[test]
    fn a_child_exactly_at_the_threshold_goes_local() {
        let p = parent(0, 3 * THRESHOLD);
        let r = result_for(&p, THRESHOLD, 2 * THRESHOLD);
        let (next, local) = run(&[p], &[r], 16);
        assert_eq!(next.len(), 1);
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].length, THRESHOLD);
    }

    #[test]
    fn empty_children_vanish() {
        let p = parent(0, 3 * THRESHOLD);
        let r = result_for(&p, 0, 0);
        let (next, local) = run(&[p], &[r], 16);
        assert!(next.is_empty());
        assert!(local.is_empty());
    }

    #[test]
    fn children_past_the_sequence_limit_drain_to_local() {
        let parents: Vec<_> = (0..3)
            .map(|i| parent(i * 4 * THRESHOLD, 4 * THRESHOLD))
            .collect();
        let results: Vec<_> = parents
            .iter()
            .map(|p| result_for(p, 2 * THRESHOLD - 1, 2 * THRESHOLD - 1))
            .collect();

        let (next, local) = run(&parents, &results, 3);
        assert_eq!(next.len(), 3);
        assert_eq!(local.len(), 3);
    }

    #[test]
    fn disjoint_children_cover_the_partitioned_regions() {
        let p = parent(128, 4 * THRESHOLD);
        let lower = 2 * THRESHOLD;
        let greater = 2 * THRESHOLD - 57;
        let r = result_for(&p, lower, greater);
        let (next, _) = run(&[p], &[r], 16);

        assert_eq!(next[0].start, 128);
        assert_eq!(next[1].start, 128 + 4 * THRESHOLD - greater);
        let pivot_run = p.length - lower - greater;
        assert_eq!(
            next[0].length + next[1].length + pivot_run,
            p.length
        );
    }
}
