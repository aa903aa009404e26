//! # Geo Client Benchmarks
//!
//! | Area | Operation | Expectation |
//! |------|-----------|-------------|
//! | Codec | cell → topic, topic → token | sub-microsecond per leaf |
//! | Diff | current vs desired covering | negligible at `max_cells` sizes |
//! | Selection | longest prefix over a catalog | linear in catalog size |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geo_client::{
    cell_to_topic, diff_subscriptions, select_gateway, topic_to_cell, topic_to_token,
    wildcard_topic, CellGeometry, CellId, GatewayRecord, S2Geometry,
};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

fn random_leaf(rng: &mut StdRng) -> CellId {
    let face = rng.gen_range(0..6u8);
    let digits: Vec<u8> = (0..30).map(|_| rng.gen_range(0..4u8)).collect();
    CellId::from_face_digits(face, &digits).unwrap_or_default()
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let mut rng = StdRng::seed_from_u64(1);
    let leaves: Vec<CellId> = (0..256).map(|_| random_leaf(&mut rng)).collect();
    let topics: Vec<String> = leaves.iter().map(|c| cell_to_topic(*c)).collect();

    group.throughput(Throughput::Elements(leaves.len() as u64));
    group.bench_function("cell_to_topic", |b| {
        b.iter(|| {
            for cell in &leaves {
                black_box(cell_to_topic(black_box(*cell)));
            }
        })
    });
    group.bench_function("topic_to_token", |b| {
        b.iter(|| {
            for topic in &topics {
                black_box(topic_to_token(black_box(topic)).ok());
            }
        })
    });
    group.bench_function("topic_to_cell", |b| {
        b.iter(|| {
            for topic in &topics {
                black_box(topic_to_cell(black_box(topic)).ok());
            }
        })
    });
    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");
    let geometry = S2Geometry::new();

    for max_cells in [4usize, 8, 16, 32] {
        let current: Vec<String> = geometry
            .cover(1.0, 1.0, 1.0, 20, max_cells)
            .into_iter()
            .map(wildcard_topic)
            .collect();
        let desired: Vec<String> = geometry
            .cover(1.005, 1.005, 1.0, 20, max_cells)
            .into_iter()
            .map(wildcard_topic)
            .collect();

        group.bench_with_input(
            BenchmarkId::new("diff_subscriptions", max_cells),
            &(current, desired),
            |b, (current, desired)| {
                b.iter(|| black_box(diff_subscriptions(black_box(current), black_box(desired))))
            },
        );
    }
    group.finish();
}

fn bench_cover(c: &mut Criterion) {
    let geometry = S2Geometry::new();
    c.bench_function("s2_cover_1km", |b| {
        b.iter(|| black_box(geometry.cover(black_box(35.68), black_box(139.76), 1.0, 20, 4)))
    });
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    let mut rng = StdRng::seed_from_u64(2);
    let current = cell_to_topic(random_leaf(&mut rng));

    for size in [16usize, 256, 4096] {
        let catalog: Vec<GatewayRecord> = (0..size)
            .map(|i| {
                let region = cell_to_topic(random_leaf(&mut rng));
                let depth = 2 + i % 12;
                let prefix: String = region.split('/').take(depth).collect::<Vec<_>>().join("/");
                GatewayRecord::new(prefix, format!("gw-{i}"), 1884)
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("select_gateway", size), &catalog, |b, catalog| {
            b.iter(|| black_box(select_gateway(catalog, black_box(&current), |n| n / 2)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_codec, bench_diff, bench_cover, bench_selection);
criterion_main!(benches);
