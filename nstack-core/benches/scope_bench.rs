//! Benchmarks for scope creation and service resolution
//!
//! Compares shallow vs deep chains and value vs factory registrations.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use nstack_core::Context;

trait Logger: Send + Sync {
    fn level(&self) -> u8;
}

struct Console;

impl Logger for Console {
    fn level(&self) -> u8 {
        1
    }
}

/// Run `body` under `depth` additional empty scopes
fn nested<F, R>(depth: usize, body: F) -> R
where
    F: FnOnce() -> R,
{
    if depth == 0 {
        body()
    } else {
        Context::create(|| nested(depth - 1, body))
    }
}

fn bench_scope_create(c: &mut Criterion) {
    c.bench_function("scope_create", |b| {
        b.iter(|| {
            let depth = Context::create(|| Context::current().map(|ctx| ctx.depth()));
            black_box(depth)
        })
    });
}

fn bench_register(c: &mut Criterion) {
    c.bench_function("scope_create_register", |b| {
        b.iter(|| {
            Context::create(|| {
                Context::register::<dyn Logger>(Arc::new(Console)).unwrap();
            })
        })
    });
}

fn bench_resolve(c: &mut Criterion) {
    Context::create(|| {
        Context::register::<dyn Logger>(Arc::new(Console)).unwrap();

        c.bench_function("resolve_local", |b| {
            b.iter(|| {
                let logger = Context::resolve::<dyn Logger>().unwrap();
                black_box(logger.level())
            })
        });
    });
}

// =============================================================================
// Chain depth and registration kind
// =============================================================================

fn bench_resolve_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_depth");

    for depth in [1usize, 8, 64] {
        Context::create(|| {
            Context::register::<dyn Logger>(Arc::new(Console)).unwrap();
            nested(depth, || {
                group.bench_with_input(BenchmarkId::new("value", depth), &depth, |b, _| {
                    b.iter(|| {
                        let logger = Context::resolve::<dyn Logger>().unwrap();
                        black_box(logger.level())
                    })
                });
            });
        });
    }

    group.finish();
}

fn bench_value_vs_factory(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration_kind");

    group.bench_function(BenchmarkId::new("value", "resolve"), |b| {
        Context::create(|| {
            Context::register::<dyn Logger>(Arc::new(Console)).unwrap();
            b.iter(|| black_box(Context::resolve::<dyn Logger>().unwrap()))
        })
    });

    group.bench_function(BenchmarkId::new("factory", "resolve"), |b| {
        Context::create(|| {
            Context::register_factory::<dyn Logger, _>(|| Arc::new(Console)).unwrap();
            b.iter(|| black_box(Context::resolve::<dyn Logger>().unwrap()))
        })
    });

    group.finish();
}

fn bench_save_and_run(c: &mut Criterion) {
    Context::create(|| {
        Context::register::<dyn Logger>(Arc::new(Console)).unwrap();

        c.bench_function("save_run_same_thread", |b| {
            b.iter(|| {
                let job = Context::save(|| Context::resolve::<dyn Logger>().unwrap().level())
                    .unwrap();
                black_box(job.run())
            })
        });
    });
}

criterion_group!(
    benches,
    bench_scope_create,
    bench_register,
    bench_resolve,
    bench_resolve_depth,
    bench_value_vs_factory,
    bench_save_and_run
);

criterion_main!(benches);
