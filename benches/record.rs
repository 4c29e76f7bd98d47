use criterion::BenchmarkId;
use criterion::Throughput;
use criterion::{criterion_group, criterion_main, Criterion};
use histogram::{Histogram, StorageKind};

fn record_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("Histogram/record_value");

    for precision in 1..=5 {
        let mut histogram = Histogram::new(1, (1 << 53) - 1, precision).unwrap();
        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::new("min/precision", precision), |b| {
            b.iter(|| histogram.record_value(1))
        });
        group.bench_function(BenchmarkId::new("max/precision", precision), |b| {
            b.iter(|| histogram.record_value((1 << 53) - 1))
        });
    }
}

fn record_value_packed(c: &mut Criterion) {
    let mut group = c.benchmark_group("Histogram/record_value/packed");

    let mut dense = Histogram::new(1, (1 << 53) - 1, 3).unwrap();
    group.bench_function("dense", |b| b.iter(|| dense.record_value(12_345)));

    let mut packed = Histogram::builder()
        .lowest_discernible_value(1)
        .highest_trackable_value((1 << 53) - 1)
        .significant_figures(3)
        .storage(StorageKind::Packed)
        .build()
        .unwrap();
    group.bench_function("packed", |b| b.iter(|| packed.record_value(12_345)));
}

fn add(c: &mut Criterion) {
    let mut group = c.benchmark_group("Histogram/add");

    for precision in 1..=5 {
        let mut alpha = Histogram::new(1, (1 << 53) - 1, precision).unwrap();
        let mut bravo = Histogram::new(1, (1 << 53) - 1, precision).unwrap();
        for value in 0..1000u64 {
            bravo.record_value(value * 37 + 1).unwrap();
        }
        group.bench_function(BenchmarkId::new("precision", precision), |b| b.iter(|| alpha.add(&bravo)));
    }
}

criterion_group!(benches, record_value, record_value_packed, add);
criterion_main!(benches);
