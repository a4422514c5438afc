use ava_map::feature::Feature;
use ava_map::map::MapRenderer;
use ava_map::selection::area::geodesic_area;
use ava_map::selection::camera::plan;
use ava_map::selection::{resolve, AreaCache};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geo::{coord, LineString, MultiPolygon, Polygon};

/// Ragged ring with `n` vertices around (lon, lat)
fn blob(lon: f64, lat: f64, radius: f64, n: usize) -> MultiPolygon<f64> {
    let ring: LineString<f64> = (0..n)
        .map(|i| {
            let t = i as f64 / n as f64 * std::f64::consts::TAU;
            let r = radius * (1.0 + 0.2 * (7.0 * t).sin());
            coord! { x: lon + r * t.cos(), y: lat + r * t.sin() }
        })
        .collect();
    MultiPolygon::new(vec![Polygon::new(ring, vec![])])
}

/// Nested regions in the shape of the Columbia Valley sub-appellations
fn nested_features() -> Vec<Feature> {
    (0..12)
        .map(|i| {
            let radius = 2.0 / (i + 1) as f64;
            Feature::new(format!("ava_{i}"), format!("AVA {i}"), blob(-119.5, 46.3, radius, 400))
        })
        .collect()
}

fn bench_area(c: &mut Criterion) {
    let geometry = blob(-119.5, 46.3, 1.0, 2000);
    c.bench_function("geodesic_area_2000", |b| b.iter(|| geodesic_area(black_box(&geometry))));
}

fn bench_resolve(c: &mut Criterion) {
    let renderer = MapRenderer::new(nested_features());
    let mut areas = AreaCache::new();
    areas.warm(renderer.features());

    c.bench_function("hit_test_and_resolve", |b| {
        b.iter(|| {
            let hits = renderer.hit_test(black_box(-119.5), black_box(46.3));
            resolve(hits, &mut areas).map(|f| f.id.clone())
        })
    });
}

fn bench_plan(c: &mut Criterion) {
    c.bench_function("plan_framing", |b| b.iter(|| plan(black_box(1.2e9))));
}

criterion_group!(benches, bench_area, bench_resolve, bench_plan);
criterion_main!(benches);
