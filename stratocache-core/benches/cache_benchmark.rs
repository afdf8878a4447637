use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::thread;
use std::time::Duration;
use stratocache_core::{Cache, CacheConfig, EvictionPolicy};

fn new_cache(policy: EvictionPolicy, maximum_size: u64) -> Cache<u64, u64> {
    Cache::new(
        CacheConfig::builder()
            .maximum_size(maximum_size)
            .eviction_policy(policy)
            .build()
            .expect("valid benchmark config"),
    )
}

fn policies() -> Vec<(&'static str, EvictionPolicy)> {
    vec![
        ("LRU", EvictionPolicy::LRU),
        ("MRU", EvictionPolicy::MRU),
        ("LFU", EvictionPolicy::LFU),
        ("FIFO", EvictionPolicy::FIFO),
        ("FILO", EvictionPolicy::FILO),
        ("Weight", EvictionPolicy::Weight),
        ("Idle", EvictionPolicy::IdleTime(Duration::ZERO)),
    ]
}

fn bench_put_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("put_sequential");

    for size in [10u64, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("LRU", size), &size, |b, &size| {
            b.iter(|| {
                let cache = new_cache(EvictionPolicy::LRU, size);
                for i in 0..size {
                    cache.put(i, black_box(i));
                }
            });
        });
    }

    group.finish();
}

fn bench_get_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hits");

    for size in [10u64, 100, 1000] {
        let cache = new_cache(EvictionPolicy::LRU, size);
        for i in 0..size {
            cache.put(i, i);
        }
        group.bench_with_input(BenchmarkId::new("LRU", size), &size, |b, &size| {
            b.iter(|| {
                for i in 0..size {
                    black_box(cache.get(&i));
                }
            });
        });
    }

    group.finish();
}

// every put past the bound scans the store for a candidate
fn bench_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction");

    for (name, policy) in policies() {
        group.bench_function(BenchmarkId::new(name, 100), |b| {
            let cache = new_cache(policy.clone(), 100);
            let mut next = 0u64;
            b.iter(|| {
                cache.put(next, black_box(next));
                next += 1;
            });
        });
    }

    group.finish();
}

fn bench_concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_mixed");

    for threads in [2usize, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("LFU", threads),
            &threads,
            |b, &threads| {
                let cache = new_cache(EvictionPolicy::LFU, 1000);
                b.iter(|| {
                    let handles: Vec<_> = (0..threads as u64)
                        .map(|t| {
                            let cache = cache.clone();
                            thread::spawn(move || {
                                for i in 0..200u64 {
                                    let key = (t * 200 + i) % 1500;
                                    if i % 4 == 0 {
                                        cache.put(key, i);
                                    } else {
                                        black_box(cache.get(&key));
                                    }
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_put_sequential,
    bench_get_hits,
    bench_eviction,
    bench_concurrent_mixed
);
criterion_main!(benches);
