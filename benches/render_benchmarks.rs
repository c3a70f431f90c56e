//! 粒子场性能基准测试
//!
//! 测试稳态 tick、uniform 计算和点云生成的开销

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use particle_backdrop::config::FieldConfig;
use particle_backdrop::render::backend::TrackingSurface;
use particle_backdrop::render::particles::{ParticleField, PointCloud};
use particle_backdrop::render::Viewport;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_tick");

    for point_count in [1_000u32, 5_000, 50_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(point_count),
            point_count,
            |b, &count| {
                let surface = TrackingSurface::new();
                let field = FieldConfig {
                    point_count: count,
                    seed: Some(1),
                    ..Default::default()
                };
                let mut handle = ParticleField::mount_with(
                    &surface,
                    Viewport::new(1920, 1080).unwrap(),
                    &field,
                    &Default::default(),
                )
                .unwrap();

                b.iter(|| ParticleField::tick(black_box(&mut handle)).unwrap());

                ParticleField::dispose(&mut handle).unwrap();
            },
        );
    }

    group.finish();
}

fn bench_uniforms(c: &mut Criterion) {
    let surface = TrackingSurface::new();
    let mut handle = ParticleField::mount(&surface, Viewport::new(1920, 1080).unwrap()).unwrap();

    c.bench_function("field_uniforms", |b| {
        b.iter(|| black_box(handle.uniforms()));
    });

    ParticleField::dispose(&mut handle).unwrap();
}

fn bench_point_cloud(c: &mut Criterion) {
    c.bench_function("point_cloud_generate_5000", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| PointCloud::generate(black_box(5000), 5.0, &mut rng));
    });
}

criterion_group!(benches, bench_tick, bench_uniforms, bench_point_cloud);
criterion_main!(benches);
