// Benchmark for trajectory planning throughput
// Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use plotter_rs::{plan, PlannerConfig, Vec2d};
use std::hint::black_box;

fn spiral(n: usize) -> Vec<Vec2d> {
    (0..n)
        .map(|i| {
            let t = i as f64 * 0.05;
            let r = 0.1 + t * 0.02;
            Vec2d::new(r * t.cos(), r * t.sin())
        })
        .collect()
}

fn zigzag(n: usize) -> Vec<Vec2d> {
    (0..n)
        .map(|i| Vec2d::new(i as f64 * 0.02, if i % 2 == 0 { 0.0 } else { 0.5 }))
        .collect()
}

fn bench_plan_spiral(c: &mut Criterion) {
    let points = spiral(2_000);
    let config = PlannerConfig::default();
    c.bench_function("plan 2k-point spiral", |b| {
        b.iter(|| {
            let plan = plan(black_box(&points), &config).unwrap();
            assert!(plan.total_time > 0.0);
        });
    });
}

fn bench_plan_zigzag(c: &mut Criterion) {
    let points = zigzag(1_000);
    let config = PlannerConfig::default();
    c.bench_function("plan 1k-point zigzag", |b| {
        b.iter(|| plan(black_box(&points), &config).unwrap());
    });
}

criterion_group!(benches, bench_plan_spiral, bench_plan_zigzag);
criterion_main!(benches);
