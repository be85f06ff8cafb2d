//! Benchmarks comparing the four pool designs against inline execution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quadpool::{
    CoarseLocalPool, Config, DirectPool, SharedQueuePool, SpinLocalPool, StealingPool, Task,
    ThreadPool,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const THREADS: usize = 4;

fn config() -> Config {
    Config::builder().num_threads(THREADS).build().unwrap()
}

fn make_pool(name: &str) -> Box<dyn ThreadPool> {
    let config = config();
    match name {
        "direct" => Box::new(DirectPool::new(&config).unwrap()),
        "shared" => Box::new(SharedQueuePool::new(&config).unwrap()),
        "coarse" => Box::new(CoarseLocalPool::new(&config).unwrap()),
        "spin" => Box::new(SpinLocalPool::new(&config).unwrap()),
        "stealing" => Box::new(StealingPool::new(&config).unwrap()),
        _ => unreachable!(),
    }
}

const POOLS: [&str; 5] = ["direct", "shared", "coarse", "spin", "stealing"];

fn spin_work(iterations: u64) -> u64 {
    let mut acc = 0u64;
    for i in 0..iterations {
        acc = acc.wrapping_mul(31).wrapping_add(black_box(i));
    }
    acc
}

/// Many cheap tasks: measures per-submission overhead and queue contention.
fn bench_uniform_micro_tasks(c: &mut Criterion) {
    let mut group = c.benchmark_group("uniform_micro_tasks");

    for name in POOLS {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| {
                // the polling pools shut down in wait_until_finished, so
                // every iteration gets a fresh pool for comparability
                let pool = make_pool(name);
                let sink = Arc::new(AtomicU64::new(0));
                for _ in 0..1_000 {
                    let sink = sink.clone();
                    pool.submit(Task::new(move || {
                        sink.fetch_add(spin_work(100), Ordering::Relaxed);
                    }));
                }
                pool.wait_until_finished();
                black_box(sink.load(Ordering::Relaxed))
            })
        });
    }

    group.finish();
}

/// Skewed task costs aligned with the round-robin pattern: every N-th task
/// is heavy, so the static balancers pile all the weight on one worker.
fn bench_skewed_tasks(c: &mut Criterion) {
    let mut group = c.benchmark_group("skewed_tasks");
    group.sample_size(10);

    for name in POOLS {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| {
                let pool = make_pool(name);
                let sink = Arc::new(AtomicU64::new(0));
                for i in 0..(40 * THREADS) {
                    let iterations = if i % THREADS == 0 { 200_000 } else { 5_000 };
                    let sink = sink.clone();
                    pool.submit(Task::new(move || {
                        sink.fetch_add(spin_work(iterations), Ordering::Relaxed);
                    }));
                }
                pool.wait_until_finished();
                black_box(sink.load(Ordering::Relaxed))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_uniform_micro_tasks, bench_skewed_tasks);
criterion_main!(benches);
