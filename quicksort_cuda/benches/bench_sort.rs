use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use quicksort_cuda::{GpuQuicksort, SortOrder};
use rand::{Rng, SeedableRng};
use rand_hc::Hc128Rng;

const SEED: &[u8; 32] = b"0Yhn2LqSPZxEcVd8uKoW4TgbRmA61wfj";

fn random_keys(count: usize, rng: &mut impl Rng) -> Vec<u32> {
    (0..count).map(|_| rng.gen()).collect()
}

pub fn sort_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sort comparison");
    group.sample_size(10);
    group.sampling_mode(SamplingMode::Flat);

    let sorter = match GpuQuicksort::new() {
        Ok(sorter) => Some(sorter),
        Err(err) => {
            eprintln!("GPU not available, benchmarking CPU only: {err}");
            None
        }
    };

    for exponent in [16u32, 20, 24] {
        let count = 1usize << exponent;
        let mut rng = Hc128Rng::from_seed(*SEED);
        let keys = random_keys(count, &mut rng);

        group.bench_with_input(BenchmarkId::new("CpuUnstable", count), &count, |b, _| {
            b.iter(|| {
                let mut data = keys.clone();
                data.sort_unstable();
                data
            })
        });

        if let Some(ref sorter) = sorter {
            group.bench_with_input(BenchmarkId::new("GpuQuicksort", count), &count, |b, _| {
                b.iter(|| {
                    let mut data = keys.clone();
                    sorter.sort_keys(&mut data, SortOrder::Ascending).unwrap();
                    data
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, sort_comparison);
criterion_main!(benches);
