use criterion::{Criterion, black_box, criterion_group, criterion_main};
use dbsync_core::{ConnectString, MappingRule, PathMapper};
use dbsync_fs::NormalizedPath;

fn mapper_with_rules(count: usize) -> PathMapper {
    let rules = (0..count).map(|i| {
        MappingRule::new(
            NormalizedPath::new(format!("\\\\srv\\data\\area{}", i)),
            NormalizedPath::new(format!("C:\\dbs-locales\\area{}", i)),
        )
    });
    PathMapper::new(rules).unwrap()
}

fn resolve_benchmark(c: &mut Criterion) {
    let mapper = mapper_with_rules(50);
    let hit = NormalizedPath::new("\\\\SRV\\Data\\area42\\2024\\brass.mdb");
    let miss = NormalizedPath::new("\\\\other\\share\\ventas.mdb");

    c.bench_function("PathMapper::resolve (hit, 50 rules)", |b| {
        b.iter(|| mapper.resolve(black_box(&hit)))
    });
    c.bench_function("PathMapper::resolve (miss, 50 rules)", |b| {
        b.iter(|| mapper.resolve(black_box(&miss)))
    });
}

fn connect_rewrite_benchmark(c: &mut Criterion) {
    let connect = ConnectString::new(";DATABASE=\\\\srv\\data\\brass.mdb;PWD=secret");

    c.bench_function("ConnectString::with_database", |b| {
        b.iter(|| black_box(&connect).with_database(black_box("C:\\dbs-locales\\brass.mdb")))
    });
}

criterion_group!(benches, resolve_benchmark, connect_rewrite_benchmark);
criterion_main!(benches);
