//! Benchmarks the cost of constructing, initializing and awaiting deferred instances, compared
//! to doing the same work with a plain task and a oneshot channel.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::cell::Cell;
use std::hint;
use std::rc::Rc;

use criterion::{Criterion, criterion_group, criterion_main};
use deferred::{AsyncInit, Deferred};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::join_all;
use futures::task::LocalSpawnExt;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[derive(Debug)]
struct Counter {
    value: Cell<u64>,
}

impl AsyncInit for Counter {
    type Args = u64;
    type Error = ();

    fn init(self: Rc<Self>, start: u64) -> impl Future<Output = Result<(), ()>> + 'static {
        async move {
            self.value.set(start);
            Ok(())
        }
    }
}

fn counter() -> Counter {
    Counter {
        value: Cell::new(0),
    }
}

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("deferred_resolve");

    group.bench_function("oneshot_task", |b| {
        b.iter(|| {
            let mut pool = LocalPool::new();
            let (tx, rx) = oneshot::channel();

            pool.spawner()
                .spawn_local(async move {
                    drop(tx.send(hint::black_box(42_u64)));
                })
                .unwrap();

            hint::black_box(pool.run_until(rx).unwrap());
        });
    });

    group.bench_function("construct_and_await", |b| {
        b.iter(|| {
            let mut pool = LocalPool::new();
            let instance = Deferred::new(&pool.spawner(), counter(), hint::black_box(42));

            let resolved = pool.run_until(instance).unwrap();
            hint::black_box(resolved.value.get());
        });
    });

    group.bench_function("await_resolved_100_times", |b| {
        let mut pool = LocalPool::new();
        let instance = Deferred::new(&pool.spawner(), counter(), 42);
        pool.run_until_stalled();

        b.iter(|| {
            pool.run_until(async {
                for _ in 0..100 {
                    let resolved = (&instance).await.unwrap();
                    hint::black_box(resolved.value.get());
                }
            });
        });
    });

    group.bench_function("join_all_100", |b| {
        b.iter(|| {
            let mut pool = LocalPool::new();
            let spawner = pool.spawner();

            let instances = (0..100)
                .map(|start| Deferred::new(&spawner, counter(), start))
                .collect::<Vec<_>>();

            hint::black_box(pool.run_until(join_all(instances)));
        });
    });

    group.finish();
}
