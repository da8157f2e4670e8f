use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use model_registry_persistence::backends::sqlite::render_predicate;
use model_registry_persistence::filter::{FilterCompiler, FilterParser};
use model_registry_persistence::kinds::{MODEL_ARTIFACT, MODEL_VERSION, REGISTERED_MODEL};

const FILTERS: &[(&str, &str)] = &[
    ("column", "name = 'fraud-detector'"),
    ("custom", "catalog.source = 'kf-model-catalog'"),
    (
        "mixed",
        "(owner = 'alice' OR owner = 'bob') AND epochs >= 10 AND description ILIKE '%fraud%'",
    ),
    (
        "wide",
        "a = 1 OR b = 2 OR c = 3 OR d = 4 OR e = 5 OR f = 6 OR g = 7 OR h = 8 OR i = 9 OR j = 10",
    ),
];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_parse");
    for (label, filter) in FILTERS {
        group.bench_with_input(BenchmarkId::from_parameter(label), filter, |b, filter| {
            b.iter(|| FilterParser::parse(black_box(filter)))
        });
    }
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_compile");
    for (kind, info) in [
        ("registered_model", &REGISTERED_MODEL.info),
        ("model_version", &MODEL_VERSION.info),
        ("model_artifact", &MODEL_ARTIFACT.info),
    ] {
        let compiler = FilterCompiler::new(&info.fields);
        for (label, filter) in FILTERS {
            group.bench_with_input(
                BenchmarkId::new(kind, label),
                filter,
                |b, filter| {
                    b.iter(|| {
                        let predicate = compiler.compile_str(black_box(filter));
                        predicate.map(|p| p.map(|p| render_predicate(&p)))
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_compile);
criterion_main!(benches);
