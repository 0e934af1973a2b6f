use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use itemstore::builder::ItemStoreBuilder;
use itemstore::provider::{InMemoryProvider, ValueIdentity};
use itemstore::store::ItemStore;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const ITEMS: u64 = 10_000;

type Store = ItemStore<u64, InMemoryProvider<u64>, ValueIdentity>;

fn store(batch_size: i64, max_cache_size: i64) -> Store {
    ItemStoreBuilder::new(InMemoryProvider::new((0..ITEMS).collect()), ValueIdentity)
        .batch_size(batch_size)
        .max_cache_size(max_cache_size)
        .build()
}

fn bench_sequential_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_scan");
    for batch in [10i64, 50, 250] {
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            b.iter_batched(
                || store(batch, 4),
                |mut store| {
                    for index in 0..ITEMS as usize {
                        let _ = std::hint::black_box(store.get_item(index));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_random_access_tight_budget(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_access");
    for budget in [2i64, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(budget), &budget, |b, &budget| {
            b.iter_batched(
                || (store(50, budget), SmallRng::seed_from_u64(7)),
                |(mut store, mut rng)| {
                    for _ in 0..2_000 {
                        let index = rng.random_range(0..ITEMS as usize);
                        let _ = std::hint::black_box(store.get_item(index));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_overlay_heavy(c: &mut Criterion) {
    c.bench_function("overlay_heavy_access", |b| {
        b.iter_batched(
            || {
                let mut store = store(50, 16);
                let mut rng = SmallRng::seed_from_u64(11);
                for n in 0..200u64 {
                    store.add_item(ITEMS + n);
                    let size = store.size().unwrap_or(0);
                    if size > 0 {
                        let _ = store.remove_item(rng.random_range(0..size));
                    }
                }
                (store, rng)
            },
            |(mut store, mut rng)| {
                let size = store.size().unwrap_or(0);
                for _ in 0..2_000 {
                    let index = rng.random_range(0..size);
                    let _ = std::hint::black_box(store.get_item(index));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_item_ids(c: &mut Criterion) {
    c.bench_function("get_item_ids_cold", |b| {
        b.iter_batched(
            || store(100, 0),
            |mut store| std::hint::black_box(store.get_item_ids()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_sequential_scan,
    bench_random_access_tight_budget,
    bench_overlay_heavy,
    bench_item_ids
);
criterion_main!(benches);
