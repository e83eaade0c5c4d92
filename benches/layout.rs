use bubble_swarm::config::{ChartConfig, XDomain};
use bubble_swarm::layout::{Encoding, compute_layout};
use bubble_swarm::render::render_svg;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

#[derive(Clone)]
struct Row {
    key: String,
    size: f64,
    share: f64,
    group: String,
}

fn synthetic_rows(count: usize, groups: usize) -> Vec<Row> {
    // fixed LCG so every run benches the same dataset
    let mut state: u64 = 42;
    let mut next = || {
        state = (state.wrapping_mul(6364136223846793005)).wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..count)
        .map(|idx| Row {
            key: format!("K{idx:04}"),
            size: 1e3 + next() * 1e9,
            share: next() * 0.7,
            group: format!("group-{}", idx % groups),
        })
        .collect()
}

fn encoding() -> Encoding<'static, Row> {
    Encoding {
        key: Box::new(|row: &Row| row.key.clone()),
        label: Box::new(|row: &Row| row.key.clone()),
        radius: Box::new(|row: &Row| Some(row.size)),
        x: Box::new(|row: &Row| Some(row.share)),
        group: Box::new(|row: &Row| Some(row.group.clone())),
    }
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let chart = ChartConfig {
        max_radius: 20.0,
        x_domain: XDomain::Extent,
        ..ChartConfig::default()
    };
    let config = chart.layout_config();
    let encoding = encoding();
    for count in [25usize, 100, 200] {
        let rows = synthetic_rows(count, 7);
        group.bench_with_input(BenchmarkId::from_parameter(count), &rows, |b, rows| {
            b.iter(|| {
                let layout = compute_layout(black_box(rows), &encoding, &config)
                    .expect("layout failed");
                black_box(layout.bubbles.len());
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let chart = ChartConfig {
        max_radius: 20.0,
        ..ChartConfig::default()
    };
    let config = chart.layout_config();
    for count in [25usize, 200] {
        let rows = synthetic_rows(count, 7);
        let layout = compute_layout(&rows, &encoding(), &config).expect("layout failed");
        group.bench_with_input(BenchmarkId::from_parameter(count), &layout, |b, layout| {
            b.iter(|| {
                let svg = render_svg(black_box(layout), &chart);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layout, bench_render);
criterion_main!(benches);
