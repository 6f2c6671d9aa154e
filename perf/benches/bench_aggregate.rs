use basalt_index::DateIndex;
use basalt_perf::{fixture, fixture_registry};
use basalt_scan::{MIN_CHUNK_BYTES, aggregate_range};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

const ROWS: usize = 200_000;
const SLUGS: usize = 64;

fn bench_hot_loop(c: &mut Criterion) {
    let dates = DateIndex::build();
    let registry = fixture_registry(&dates, SLUGS);
    let bytes = fixture(ROWS, SLUGS);

    let path = std::env::temp_dir().join(format!("basalt_bench_agg_{}", std::process::id()));
    std::fs::write(&path, &bytes).unwrap();
    let size = bytes.len() as u64;

    let mut group = c.benchmark_group("aggregate_range");
    group.throughput(Throughput::Bytes(size));

    group.bench_function("chunk_4mib", |b| {
        b.iter(|| {
            black_box(
                aggregate_range(&path, 0, size, &registry, &dates, 4 << 20).unwrap(),
            )
        });
    });

    // Chunk size is a throughput knob only; benching the floor shows the
    // seek-back overhead of many small refills.
    group.bench_function("chunk_floor", |b| {
        b.iter(|| {
            black_box(
                aggregate_range(&path, 0, size, &registry, &dates, MIN_CHUNK_BYTES).unwrap(),
            )
        });
    });

    group.finish();
    let _ = std::fs::remove_file(&path);
}

criterion_group!(benches, bench_hot_loop);
criterion_main!(benches);
