//! Criterion microbenches for det_20 parsing and normalization.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use armitage::bdd100k::{from_det20_str, normalize, Box2d, RawLabel, RawSample};

// Include test fixtures at compile time (no file I/O during benchmark)
const DET20_FIXTURE: &str = include_str!("../tests/fixtures/det_20_sample.json");

/// A synthetic split shaped like det_val: many frames, ~20 boxes each.
fn synthetic_split(samples: usize, labels_per_sample: usize) -> Vec<RawSample> {
    (0..samples)
        .map(|i| {
            let mut sample = RawSample::new(format!("{i:08x}-00000000.jpg"))
                .with_attribute("weather", "clear")
                .with_attribute("timeofday", "daytime")
                .with_attribute("scene", "city street");
            for j in 0..labels_per_sample {
                let x = (j * 40) as f64;
                sample = sample.with_label(
                    RawLabel::new(j.to_string(), "car", Box2d::new(x, 300.0, x + 35.0, 340.0))
                        .with_attribute("occluded", j % 3 == 0)
                        .with_attribute("truncated", false)
                        .with_attribute("trafficLightColor", "NA"),
                );
            }
            sample
        })
        .collect()
}

fn bench_det20_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("det20_parse");
    group.throughput(Throughput::Bytes(DET20_FIXTURE.len() as u64));

    group.bench_function("from_det20_str", |b| {
        b.iter(|| {
            let raw = from_det20_str(black_box(DET20_FIXTURE)).unwrap();
            black_box(raw)
        })
    });

    group.finish();
}

/// Benchmark normalization.
///
/// The synthetic split is built once, outside the timed region.
fn bench_normalize(c: &mut Criterion) {
    let raw = synthetic_split(1_000, 20);

    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Elements(raw.len() as u64));

    group.bench_function("normalize_1k_samples", |b| {
        b.iter(|| {
            let normalized = normalize(black_box(&raw), "/data/images/100k/val").unwrap();
            black_box(normalized)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_det20_parse, bench_normalize);
criterion_main!(benches);
