//! Criterion microbenches for label parsing, rendering, and conversion.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use std::path::Path;

use yoloprep::convert::{convert_text, ConversionMode};
use yoloprep::geometry::{self, CxCyWh, RotatedBox};
use yoloprep::label::{parse_labels, render_labels, LabelFormat};

fn detect_fixture(rows: usize) -> String {
    (0..rows)
        .map(|i| {
            let t = (i % 97) as f64 / 97.0;
            format!(
                "{} {:.6} {:.6} {:.6} {:.6}\n",
                i % 80,
                0.1 + 0.8 * t,
                0.9 - 0.8 * t,
                0.05 + 0.1 * t,
                0.05 + 0.2 * (1.0 - t)
            )
        })
        .collect()
}

fn obb_fixture(rows: usize) -> String {
    (0..rows)
        .map(|i| {
            let t = (i % 89) as f64 / 89.0;
            let (x, y) = (0.2 + 0.5 * t, 0.3 + 0.4 * t);
            format!(
                "{} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}\n",
                i % 15,
                x,
                y - 0.1,
                x + 0.1,
                y,
                x,
                y + 0.1,
                x - 0.1,
                y
            )
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let detect = detect_fixture(1_000);
    let obb = obb_fixture(1_000);
    let mut group = c.benchmark_group("label_parse");

    group.throughput(Throughput::Bytes(detect.len() as u64));
    group.bench_function("detect_1k_rows", |b| {
        b.iter(|| {
            let records =
                parse_labels(black_box(&detect), LabelFormat::Detect, Path::new("bench.txt"))
                    .unwrap();
            black_box(records)
        })
    });

    group.throughput(Throughput::Bytes(obb.len() as u64));
    group.bench_function("obb_1k_rows", |b| {
        b.iter(|| {
            let records =
                parse_labels(black_box(&obb), LabelFormat::Obb, Path::new("bench.txt")).unwrap();
            black_box(records)
        })
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let records = parse_labels(&obb_fixture(1_000), LabelFormat::Obb, Path::new("bench.txt"))
        .expect("fixture parses");
    let mut group = c.benchmark_group("label_render");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("obb_1k_rows", |b| {
        b.iter(|| black_box(render_labels(black_box(&records))))
    });

    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let detect = detect_fixture(1_000);
    let obb = obb_fixture(1_000);
    let mut group = c.benchmark_group("convert_text");
    group.throughput(Throughput::Elements(1_000));

    group.bench_function("detect2obb", |b| {
        b.iter(|| {
            let out = convert_text(
                black_box(&detect),
                ConversionMode::DetectToObb,
                0.0,
                Path::new("bench.txt"),
            )
            .unwrap();
            black_box(out)
        })
    });

    group.bench_function("obb2detect", |b| {
        b.iter(|| {
            let out = convert_text(
                black_box(&obb),
                ConversionMode::ObbToDetect,
                0.0,
                Path::new("bench.txt"),
            )
            .unwrap();
            black_box(out)
        })
    });

    group.finish();
}

fn bench_geometry(c: &mut Criterion) {
    let b = CxCyWh::new(0.5, 0.5, 0.2, 0.4);
    let r = RotatedBox::new(0.5, 0.5, 0.3, 0.1, 0.7);
    let mut group = c.benchmark_group("geometry");

    group.bench_function("detect_to_obb", |bench| {
        bench.iter(|| black_box(geometry::detect_to_obb(black_box(b), 0.0)))
    });
    group.bench_function("rotated_to_obb", |bench| {
        bench.iter(|| black_box(geometry::rotated_to_obb(black_box(r))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_render,
    bench_convert,
    bench_geometry
);
criterion_main!(benches);
