use criterion::{black_box, criterion_group, criterion_main, Criterion};
use channelboard::prelude::*;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn bench_generate_arrangements(c: &mut Criterion) {
    let core = LayoutCore::default();
    let request = LayoutRequest::load_file(&fixture_path("blinky_request.json")).expect("fixture");

    c.bench_function("generate_arrangements", |b| {
        b.iter(|| core.generate_arrangements(black_box(&request)));
    });
}

fn bench_detect_connections(c: &mut Criterion) {
    let core = LayoutCore::default();
    let request = LayoutRequest::load_file(&fixture_path("blinky_request.json")).expect("fixture");

    c.bench_function("detect_connections", |b| {
        b.iter(|| core.detect_connections(black_box(&request.components), black_box(&[])));
    });
}

fn bench_check_design(c: &mut Criterion) {
    let core = LayoutCore::default();
    let request = LayoutRequest::load_file(&fixture_path("blinky_request.json")).expect("fixture");
    let arrangements = core.generate_arrangements(&request).expect("arrangements");
    let mut design = Design::new(request.board.clone());
    if let Some(best) = arrangements.first() {
        core.accept(&mut design, best, &core.request_connections(&request));
    }
    let rules = DrcRules::recommended();

    c.bench_function("check_design", |b| {
        b.iter(|| core.check_design(black_box(&design), black_box(&rules)));
    });
}

criterion_group!(
    benches,
    bench_generate_arrangements,
    bench_detect_connections,
    bench_check_design
);
criterion_main!(benches);
