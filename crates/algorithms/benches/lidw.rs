//! Benchmarks for LIDW interpolation and leave-one-out validation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use covmap_algorithms::interpolation::{interpolate_indicator, LidwParams};
use covmap_algorithms::validation::validate_leave_one_out;
use covmap_core::{AreaType, Boundary, GeoTransform, Raster, SampleLocation};
use geo::{coord, Rect};

fn create_samples(n: usize) -> Vec<SampleLocation> {
    // Deterministic scatter over [0, 10] x [0, 10]
    (0..n)
        .map(|i| {
            let x = ((i * 7919) % 1000) as f64 / 100.0 + 0.005;
            let y = ((i * 104_729) % 1000) as f64 / 100.0 + 0.005;
            let value = ((i * 31) % 100) as f64 / 100.0;
            SampleLocation::new(i as i64, x, y, value, AreaType::Rural)
        })
        .collect()
}

fn create_population(size: usize) -> Raster<f64> {
    let mut pop = Raster::filled(size, size, 1.0);
    let cell = 10.0 / size as f64;
    pop.set_transform(GeoTransform::new(0.0, 10.0, cell, -cell));
    for row in 0..size {
        for col in 0..size {
            if (row * 13 + col * 7) % 5 == 0 {
                pop.set(row, col, 0.0).unwrap();
            }
        }
    }
    pop
}

fn country() -> Boundary {
    Boundary::from_polygon(Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 }).to_polygon()).unwrap()
}

fn bench_interpolate(c: &mut Criterion) {
    let mut group = c.benchmark_group("lidw_interpolate");
    let samples = create_samples(200);
    let country = country();

    for size in [128, 256, 512].iter() {
        let pop = create_population(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| interpolate_indicator(black_box(&samples), &country, &pop, LidwParams::default()).unwrap())
        });
    }

    group.finish();
}

fn bench_leave_one_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("leave_one_out");
    let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 });

    for n in [50, 100, 200].iter() {
        let samples = create_samples(*n);

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, _| {
            b.iter(|| validate_leave_one_out(black_box(&samples), bounds).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_interpolate, bench_leave_one_out);
criterion_main!(benches);
