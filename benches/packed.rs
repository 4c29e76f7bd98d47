use criterion::BenchmarkId;
use criterion::Throughput;
use criterion::{criterion_group, criterion_main, Criterion};
use histogram::{Histogram, StorageKind};

fn packed_histogram(highest_trackable_value: u64, significant_figures: u8) -> Histogram {
    Histogram::builder()
        .lowest_discernible_value(1)
        .highest_trackable_value(highest_trackable_value)
        .significant_figures(significant_figures)
        .storage(StorageKind::Packed)
        .build()
        .unwrap()
}

fn get(c: &mut Criterion) {
    let mut group = c.benchmark_group("Packed/get");

    for precision in 1..=5 {
        let mut histogram = packed_histogram((1 << 53) - 1, precision);
        histogram.record_value(12_345).unwrap();
        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::new("sparse/precision", precision), |b| {
            b.iter(|| histogram.count_at_or_below(12_345))
        });
    }
}

fn add(c: &mut Criterion) {
    let mut group = c.benchmark_group("Packed/add");

    for precision in 1..=5 {
        let mut histogram = packed_histogram((1 << 53) - 1, precision);
        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::new("precision", precision), |b| {
            b.iter(|| histogram.record_value(12_345))
        });
    }
}

fn set(c: &mut Criterion) {
    let mut group = c.benchmark_group("Packed/set");

    for precision in 1..=5 {
        let mut histogram = packed_histogram((1 << 53) - 1, precision);
        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::new("precision", precision), |b| {
            b.iter(|| histogram.record_value_with_count(12_345, 10))
        });
    }
}

fn spread(c: &mut Criterion) {
    let mut group = c.benchmark_group("Packed/spread");

    // Sparse writes across a wide range, exercising the trie's lazy node
    // allocation rather than repeatedly hitting a single already-populated
    // cell.
    group.bench_function("10k_distinct_values", |b| {
        b.iter_batched(
            || packed_histogram((1 << 53) - 1, 3),
            |mut histogram| {
                for i in 0..10_000u64 {
                    histogram.record_value(i * 9973 + 1).unwrap();
                }
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, get, add, set, spread);
criterion_main!(benches);
