//! End-to-end sort scenarios. Every test needs a CUDA device and skips
//! itself when none is available, so the suite still passes on GPU-less
//! machines.

use quicksort_cuda::{GpuQuicksort, SortOrder};
use rand::{Rng, SeedableRng};
use rand_hc::Hc128Rng;
use quicksort_gpu::config::{
    THRESHOLD_BITONIC_KO, THRESHOLD_GLOBAL_KO, THRESHOLD_GLOBAL_KV,
};

const SEED: &[u8; 32] = b"0Yhn2LqSPZxEcVd8uKoW4TgbRmA61wfj";

fn sorter() -> Option<GpuQuicksort> {
    match GpuQuicksort::new() {
        Ok(sorter) => Some(sorter),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

fn random_keys(count: usize, bound: u32, rng: &mut impl Rng) -> Vec<u32> {
    (0..count).map(|_| rng.gen_range(0..bound)).collect()
}

fn assert_sorted_permutation(input: &[u32], output: &[u32], order: SortOrder) {
    match order {
        SortOrder::Ascending => assert!(output.windows(2).all(|w| w[0] <= w[1])),
        SortOrder::Descending => assert!(output.windows(2).all(|w| w[0] >= w[1])),
    }
    let mut expected = input.to_vec();
    let mut observed = output.to_vec();
    expected.sort_unstable();
    observed.sort_unstable();
    assert_eq!(observed, expected, "output is not a permutation of the input");
}

#[test]
fn ascending_key_only_small() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut keys = vec![3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5];
    sorter.sort_keys(&mut keys, SortOrder::Ascending).unwrap();
    assert_eq!(keys, vec![1, 1, 2, 3, 3, 4, 5, 5, 5, 6, 9]);
}

#[test]
fn descending_null_distribution_returns_the_input() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut keys = vec![0, 0, 0, 0];
    sorter.sort_keys(&mut keys, SortOrder::Descending).unwrap();
    assert_eq!(keys, vec![0, 0, 0, 0]);
}

#[test]
fn null_distribution_beyond_the_reduction_threshold() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut keys = vec![42u32; THRESHOLD_GLOBAL_KO * 4];
    sorter.sort_keys(&mut keys, SortOrder::Ascending).unwrap();
    assert!(keys.iter().all(|&k| k == 42));
}

#[test]
fn single_element_is_untouched() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut keys = vec![7];
    sorter.sort_keys(&mut keys, SortOrder::Ascending).unwrap();
    assert_eq!(keys, vec![7]);
}

#[test]
fn empty_input_is_fine() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut keys: Vec<u32> = vec![];
    sorter.sort_keys(&mut keys, SortOrder::Ascending).unwrap();
    assert!(keys.is_empty());
}

#[test]
fn ascending_random_with_at_least_one_global_wave() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut rng = Hc128Rng::from_seed(*SEED);
    let input = random_keys(THRESHOLD_GLOBAL_KO + 1, 1 << 31, &mut rng);
    let mut keys = input.clone();
    sorter.sort_keys(&mut keys, SortOrder::Ascending).unwrap();
    assert_sorted_permutation(&input, &keys, SortOrder::Ascending);
}

#[test]
fn descending_exactly_at_the_bitonic_threshold() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut rng = Hc128Rng::from_seed(*SEED);
    let input = random_keys(THRESHOLD_BITONIC_KO, u32::MAX, &mut rng);
    let mut keys = input.clone();
    sorter.sort_keys(&mut keys, SortOrder::Descending).unwrap();
    assert_sorted_permutation(&input, &keys, SortOrder::Descending);
}

#[test]
fn large_random_ascending_and_descending() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut rng = Hc128Rng::from_seed(*SEED);
    for order in [SortOrder::Ascending, SortOrder::Descending] {
        let input = random_keys(1 << 20, u32::MAX, &mut rng);
        let mut keys = input.clone();
        sorter.sort_keys(&mut keys, order).unwrap();
        assert_sorted_permutation(&input, &keys, order);
    }
}

#[test]
fn heavy_duplicates_keep_the_multiset() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut rng = Hc128Rng::from_seed(*SEED);
    // Sixteen distinct key values force long pivot runs at every level.
    let input = random_keys(1 << 18, 16, &mut rng);
    let mut keys = input.clone();
    sorter.sort_keys(&mut keys, SortOrder::Ascending).unwrap();
    assert_sorted_permutation(&input, &keys, SortOrder::Ascending);
}

#[test]
fn sorting_a_sorted_array_is_idempotent() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut rng = Hc128Rng::from_seed(*SEED);
    let mut keys = random_keys(1 << 16, u32::MAX, &mut rng);
    sorter.sort_keys(&mut keys, SortOrder::Ascending).unwrap();
    let once = keys.clone();
    sorter.sort_keys(&mut keys, SortOrder::Ascending).unwrap();
    assert_eq!(keys, once);
}

#[test]
fn key_value_pairs_stay_paired() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut keys = vec![5, 2, 8, 2];
    let mut values = vec![10, 20, 30, 40];
    sorter
        .sort_key_values(&mut keys, &mut values, SortOrder::Ascending)
        .unwrap();
    assert_eq!(keys, vec![2, 2, 5, 8]);
    // The two keys equal to 2 may land in either order.
    let mut front: Vec<u32> = values[..2].to_vec();
    front.sort_unstable();
    assert_eq!(front, vec![20, 40]);
    assert_eq!(&values[2..], &[10, 30]);
}

#[test]
fn key_value_random_preserves_pairing() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut rng = Hc128Rng::from_seed(*SEED);
    let n = THRESHOLD_GLOBAL_KV * 3 + 17;
    let input_keys = random_keys(n, 1 << 16, &mut rng);
    // Value encodes its original index, so pairing survives duplicates.
    let input_values: Vec<u32> = (0..n as u32).collect();

    let mut keys = input_keys.clone();
    let mut values = input_values.clone();
    sorter
        .sort_key_values(&mut keys, &mut values, SortOrder::Ascending)
        .unwrap();

    assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    for (key, value) in keys.iter().zip(&values) {
        assert_eq!(input_keys[*value as usize], *key, "pair broken for value {value}");
    }
    let mut observed = values.clone();
    observed.sort_unstable();
    assert_eq!(observed, input_values);
}

#[test]
fn key_value_length_mismatch_is_rejected() {
    let sorter = match sorter() {
        Some(sorter) => sorter,
        None => return,
    };
    let mut keys = vec![1, 2, 3];
    let mut values = vec![1, 2];
    let err = sorter
        .sort_key_values(&mut keys, &mut values, SortOrder::Ascending)
        .unwrap_err();
    assert!(matches!(
        err,
        quicksort_cuda::SortError::ConfigurationInvalid { .. }
    ));
}
