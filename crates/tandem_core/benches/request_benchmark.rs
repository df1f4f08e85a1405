//! # Request Path Benchmark
//!
//! ARCHITECT'S CHALLENGE: Prove a property write costs no allocation once the
//! pool is warm.
//!
//! This benchmark measures:
//! 1. Bare pool get/recycle cycle
//! 2. Full set → queue → apply → recycle round trip
//! 3. Batched drains at several queue depths

#![allow(missing_docs)]

use std::sync::{Arc, Weak};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tandem_core::{
    dispatch_to, request_channel, CorrelationId, Destination, DispatchOutcome, ExecutorConfig,
    Operation, PoolConfig, Property, PropertyBinding, RequestExecutor, RequestLink,
    RequestObject, RequestPool, Vec3,
};

struct Sprite {
    alpha: Property<f32>,
    position: Property<Vec3>,
}

impl Destination for Sprite {
    fn dispatch(&self, request: &RequestObject) -> DispatchOutcome {
        dispatch_to(request, &[&self.alpha, &self.position])
    }
}

fn setup(preload: usize) -> (Arc<RequestPool>, Arc<Sprite>, RequestExecutor) {
    let pool = Arc::new(RequestPool::new(PoolConfig { preload }));
    pool.start();
    let (sender, receiver) = request_channel();
    let link = RequestLink::new(Arc::clone(&pool), sender);
    let sprite = Arc::new_cyclic(|weak: &Weak<Sprite>| {
        let owner: Weak<dyn Destination> = weak.clone();
        let binding = PropertyBinding::new(owner, link);
        Sprite {
            alpha: Property::new("alpha", CorrelationId::new(1), &binding, 1.0),
            position: Property::new("position", CorrelationId::new(2), &binding, Vec3::ZERO),
        }
    });
    let executor = RequestExecutor::new(Arc::clone(&pool), receiver, ExecutorConfig::default());
    (pool, sprite, executor)
}

/// Benchmark the pool alone
fn bench_pool_cycle(c: &mut Criterion) {
    let pool = RequestPool::new(PoolConfig::default());
    pool.start();

    c.bench_function("pool_get_recycle", |b| {
        b.iter(|| {
            let request = pool.get(black_box(Operation::Update)).unwrap();
            pool.recycle(request).unwrap();
        });
    });
}

/// Benchmark one write travelling to the execution side
fn bench_round_trip(c: &mut Criterion) {
    let (_pool, sprite, executor) = setup(4);

    c.bench_function("set_apply_recycle", |b| {
        b.iter(|| {
            sprite.alpha.set(black_box(0.5)).unwrap();
            executor.drain().unwrap();
        });
    });
}

/// Benchmark draining a full frame's worth of writes
fn bench_drain_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_batch");

    for depth in [16_usize, 256, 4096] {
        let (_pool, sprite, executor) = setup(depth);
        group.throughput(Throughput::Elements(depth as u64));

        group.bench_with_input(BenchmarkId::new("writes", depth), &depth, |b, &depth| {
            b.iter(|| {
                for i in 0..depth {
                    let step = i as f32;
                    sprite.position.set(Vec3::new(step, step, 0.0)).unwrap();
                }
                black_box(executor.drain().unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pool_cycle, bench_round_trip, bench_drain_batch);
criterion_main!(benches);
