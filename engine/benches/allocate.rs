use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use prometheus_client::registry::Registry;
use rand::{rngs::StdRng, SeedableRng};
use tessera_engine::{Config, Mint, Season, SET_SIZE};

const N_MOSAICS: [u64; 2] = [1_000, 10_000];

fn benchmark_allocate_drain(c: &mut Criterion) {
    for n in N_MOSAICS {
        c.bench_function(&format!("{}/n={}", module_path!(), n), |b| {
            b.iter_batched(
                || {
                    let mut registry = Registry::default();
                    Mint::<StdRng, u64>::init(
                        &mut registry,
                        Config {
                            mosaics: (0..n).collect(),
                            entropy: StdRng::seed_from_u64(0),
                            season: Season::Spring,
                        },
                    )
                },
                |mut mint| {
                    // Drain the entire pool.
                    for salt in 0..n * SET_SIZE {
                        mint.allocate(salt).unwrap();
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_allocate_drain
}
criterion_main!(benches);
