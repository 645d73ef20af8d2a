//! Benchmarks for topology validation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deployflow::config::StackConfig;
use deployflow::stack::DeliveryStack;
use deployflow::testing::wide_pipeline;

fn validation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for width in [1, 16, 256] {
        let pipeline = wide_pipeline(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &pipeline, |b, pipeline| {
            b.iter(|| black_box(pipeline.validate()))
        });
    }
    group.finish();

    let pipeline = wide_pipeline(64);
    c.bench_function("fingerprint_64", |b| b.iter(|| black_box(pipeline.fingerprint())));

    let config = StackConfig::default();
    c.bench_function("assemble_default_stack", |b| {
        b.iter(|| black_box(DeliveryStack::assemble(&config)))
    });
}

criterion_group!(benches, validation_benchmark);
criterion_main!(benches);
