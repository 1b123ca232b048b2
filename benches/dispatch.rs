//! Dispatch benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use topichub::{Provider, Target};

fn provider_with(handlers: usize) -> Provider {
    let provider = Provider::new();
    for i in 0..handlers {
        provider.subscribe(
            "bench",
            Target::function(move |args: &[Value]| {
                let n = args.first().and_then(Value::as_i64).unwrap_or(0);
                Ok(json!(n + i as i64))
            }),
        );
    }
    provider
}

/// Benchmark fan-out with varying subscriber counts
fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish");

    for handlers in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::new("handlers", handlers), &handlers, |b, &n| {
            let provider = provider_with(n);
            let args = [json!(1)];
            b.iter(|| black_box(provider.publish("bench", &args).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark the filter pipeline
fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for handlers in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::new("handlers", handlers), &handlers, |b, &n| {
            let provider = provider_with(n);
            b.iter(|| black_box(provider.filter("bench", json!(0), &[]).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark re-subscribing an existing target
fn bench_subscribe_duplicate(c: &mut Criterion) {
    let provider = provider_with(50);
    let target = Target::function(|_| Ok(Value::Null));
    provider.subscribe("bench", target.clone());

    c.bench_function("subscribe_duplicate", |b| {
        b.iter(|| black_box(provider.subscribe("bench", target.clone())));
    });
}

criterion_group!(benches, bench_publish, bench_filter, bench_subscribe_duplicate);
criterion_main!(benches);
