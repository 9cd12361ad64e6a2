use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use voxcell_runtime::{EngineConfig, World};

fn build_world(edge: i32, density: f32) -> World {
    let mut world = World::new(edge, edge, edge, EngineConfig::default()).expect("world construction");
    world.initialize(42, density).expect("world initialization");
    world
}

fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_advance");

    for &edge in &[8i32, 16i32, 32i32] {
        group.throughput(Throughput::Elements((edge as u64).pow(3)));
        group.bench_with_input(BenchmarkId::new("density_0.3", edge), &edge, |b, &edge| {
            b.iter_batched(
                || build_world(edge, 0.3),
                |world| {
                    world.advance().expect("advance");
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_state_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_state_hash");
    for &edge in &[8i32, 16i32] {
        let world = build_world(edge, 0.3);
        group.bench_with_input(BenchmarkId::new("density_0.3", edge), &world, |b, world| {
            b.iter(|| world.state_hash());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_advance, bench_state_hash);
criterion_main!(benches);
