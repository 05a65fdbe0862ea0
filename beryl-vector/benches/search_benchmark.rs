use beryl_vector::{HnswConfig, HnswIndex, Metric};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// Deterministic pseudo-random vectors, good enough for benchmarking
fn make_vectors(count: usize, dimension: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|i| {
            (0..dimension)
                .map(|j| {
                    let x = (i * dimension + j) as f32;
                    (x * 0.61803398).sin()
                })
                .collect()
        })
        .collect()
}

fn build_index(vectors: &[Vec<f32>], dimension: usize) -> HnswIndex {
    let mut index = HnswIndex::new(dimension, Metric::L2, HnswConfig::default())
        .expect("Failed to create index");
    for (id, vector) in vectors.iter().enumerate() {
        index.add(id as u64, vector).expect("Insert failed");
    }
    index
}

/// Benchmark: index construction at various sizes
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    let dimension = 64;

    for size in [100, 1_000, 5_000] {
        let vectors = make_vectors(size, dimension);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("build", size), &size, |b, _| {
            b.iter(|| build_index(black_box(&vectors), dimension));
        });
    }

    group.finish();
}

/// Benchmark: search latency across ef_search settings
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let dimension = 64;
    let vectors = make_vectors(5_000, dimension);
    let index = build_index(&vectors, dimension);
    let query = make_vectors(1, dimension).pop().unwrap();

    for ef_search in [10, 50, 200] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("top10", ef_search),
            &ef_search,
            |b, &ef| {
                b.iter(|| {
                    index
                        .search(black_box(&query), 10, ef)
                        .expect("Search failed")
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_search);
criterion_main!(benches);
