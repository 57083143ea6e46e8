//! Benchmarks for the SPSC and MPMC queues.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use duplex_queue::{spsc, MpmcQueue};

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");

    group.bench_function("push_pop", |b| {
        let (mut tx, mut rx) = spsc::channel::<u64>();
        b.iter(|| {
            tx.push(black_box(42));
            black_box(rx.pop());
        });
    });

    group.bench_function("push_pop_batch_64", |b| {
        let (mut tx, mut rx) = spsc::channel::<u64>();
        b.iter(|| {
            for i in 0..64 {
                tx.push(black_box(i));
            }
            for _ in 0..64 {
                black_box(rx.pop());
            }
        });
    });

    group.finish();
}

fn bench_mpmc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc");

    group.bench_function("try_push_try_pop", |b| {
        let queue = MpmcQueue::<u64>::with_capacity(1024);
        b.iter(|| {
            let _ = queue.try_push(black_box(42));
            black_box(queue.try_pop());
        });
    });

    group.bench_function("try_push_try_pop_batch_64", |b| {
        let queue = MpmcQueue::<u64>::with_capacity(1024);
        b.iter(|| {
            for i in 0..64 {
                let _ = queue.try_push(black_box(i));
            }
            for _ in 0..64 {
                black_box(queue.try_pop());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_spsc, bench_mpmc);
criterion_main!(benches);
