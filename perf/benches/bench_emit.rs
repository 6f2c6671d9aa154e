use basalt_index::DateIndex;
use basalt_perf::{Rng, fixture_registry};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

const SLUGS: usize = 256;

fn bench_emit(c: &mut Criterion) {
    let dates = DateIndex::build();
    let registry = fixture_registry(&dates, SLUGS);

    // Roughly one day in four populated, counts spread over several digit
    // widths, close to what real traffic looks like.
    let mut counts = vec![0u32; registry.matrix_len()];
    let mut rng = Rng::new(0xE317_0001);
    for cell in counts.iter_mut() {
        if rng.next() % 4 == 0 {
            *cell = (rng.next() % 100_000) as u32;
        }
    }

    let populated = counts.iter().filter(|&&c| c != 0).count();
    let mut group = c.benchmark_group("emit");
    group.throughput(Throughput::Elements(populated as u64));

    group.bench_function("full_document", |b| {
        let mut out = Vec::with_capacity(32 << 20);
        b.iter(|| {
            out.clear();
            basalt_emit::emit(black_box(&counts), &registry, &dates, &mut out).unwrap();
            black_box(out.len())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_emit);
criterion_main!(benches);
