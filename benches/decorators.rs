use std::hint::black_box;
use std::sync::Arc;

use cachestack::builder::CacheBuilder;
use cachestack::policy::lru::LruCache;
use cachestack::policy::soft::SoftCache;
use cachestack::store::PerpetualCache;
use cachestack::traits::Cache;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Zipf};

const CAPACITY: u64 = 1024;
const UNIVERSE: u64 = 8192;

fn zipf_keys(count: usize) -> Vec<u64> {
    let mut rng = SmallRng::seed_from_u64(42);
    let zipf = Zipf::new(UNIVERSE as f64, 1.0).unwrap();
    (0..count)
        .map(|_| {
            let sample: f64 = zipf.sample(&mut rng);
            (sample as u64).saturating_sub(1).min(UNIVERSE - 1)
        })
        .collect()
}

fn uniform_keys(count: usize) -> Vec<u64> {
    let mut rng = SmallRng::seed_from_u64(7);
    (0..count).map(|_| rng.random_range(0..UNIVERSE)).collect()
}

fn bench_lru_put_get(c: &mut Criterion) {
    c.bench_function("lru_put_get", |b| {
        b.iter_batched(
            || {
                let cache = LruCache::with_capacity(
                    PerpetualCache::new("bench").unwrap(),
                    CAPACITY as usize,
                )
                .unwrap();
                for i in 0..CAPACITY {
                    cache.put(i, i).unwrap();
                }
                cache
            },
            |cache| {
                for i in 0..CAPACITY {
                    cache.put(black_box(i + 10_000), i).unwrap();
                    let _ = black_box(cache.get(&black_box(i)).unwrap());
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_lru_eviction_churn(c: &mut Criterion) {
    let keys = uniform_keys(4096);
    c.bench_function("lru_eviction_churn", |b| {
        b.iter_batched(
            || {
                LruCache::with_capacity(PerpetualCache::new("bench").unwrap(), CAPACITY as usize)
                    .unwrap()
            },
            |cache| {
                for &key in &keys {
                    cache.put(black_box(key), key).unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_soft_hot_reads(c: &mut Criterion) {
    let keys = zipf_keys(4096);
    c.bench_function("soft_hot_reads", |b| {
        b.iter_batched(
            || {
                let cache = SoftCache::new(PerpetualCache::new("bench").unwrap());
                for i in 0..UNIVERSE {
                    cache.put(i, Arc::new(i)).unwrap();
                }
                cache
            },
            |cache| {
                for key in &keys {
                    let _ = black_box(cache.get(key).unwrap());
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_soft_reclaim_drain(c: &mut Criterion) {
    c.bench_function("soft_reclaim_drain", |b| {
        b.iter_batched(
            || {
                let cache = SoftCache::new(PerpetualCache::new("bench").unwrap());
                for i in 0..CAPACITY {
                    cache.put(i, Arc::new(i)).unwrap();
                }
                cache
            },
            |cache| {
                cache.reclaimer().reclaim_all();
                black_box(cache.len().unwrap())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_stack_zipf_workload(c: &mut Criterion) {
    let keys = zipf_keys(8192);
    c.bench_function("stack_zipf_workload", |b| {
        b.iter_batched(
            || {
                CacheBuilder::new("bench")
                    .lru(CAPACITY as usize)
                    .soft(256)
                    .build::<u64, u64>()
            },
            |cache| {
                let mut hits = 0u64;
                for &key in &keys {
                    if cache.get(&key).unwrap().is_some() {
                        hits += 1;
                    } else {
                        cache.put(key, Arc::new(key)).unwrap();
                    }
                }
                black_box(hits)
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_lru_put_get,
    bench_lru_eviction_churn,
    bench_soft_hot_reads,
    bench_soft_reclaim_drain,
    bench_stack_zipf_workload
);
criterion_main!(benches);
