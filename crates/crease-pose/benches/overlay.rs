//! Benchmarks for the overlay engine

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use crease_pose::{
    default_readouts, joint_angle, measure_all, CadenceConfig, OverlayCadence, Point2, Skeleton,
};

fn bench_cadence_tick(c: &mut Criterion) {
    let mut cadence = OverlayCadence::new(CadenceConfig::seeded(7));
    cadence.start();
    let period = cadence.config().period;

    c.bench_function("overlay_cadence_tick", |b| {
        b.iter(|| black_box(cadence.advance(black_box(period))))
    });
}

fn bench_joint_angle(c: &mut Criterion) {
    let a = Point2::new(42.0, 35.0);
    let j = Point2::new(35.0, 50.0);
    let d = Point2::new(30.0, 65.0);

    c.bench_function("joint_angle", |b| {
        b.iter(|| black_box(joint_angle(black_box(a), black_box(j), black_box(d))))
    });
}

fn bench_readouts(c: &mut Criterion) {
    let specs = default_readouts();
    let skeleton = Skeleton::seed();

    c.bench_function("measure_default_readouts", |b| {
        b.iter(|| black_box(measure_all(&specs, black_box(&skeleton))))
    });
}

fn bench_large_advance(c: &mut Criterion) {
    c.bench_function("overlay_cadence_one_second", |b| {
        b.iter(|| {
            let mut cadence = OverlayCadence::new(CadenceConfig::seeded(7));
            cadence.start();
            black_box(cadence.advance(Duration::from_secs(1)))
        })
    });
}

criterion_group!(
    benches,
    bench_cadence_tick,
    bench_joint_angle,
    bench_readouts,
    bench_large_advance
);
criterion_main!(benches);
