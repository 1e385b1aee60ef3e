//! Scalability benchmarks for the swarm simulation
//!
//! Measures full ticks and spatial index rebuilds at growing particle counts.
//!
//! Run with: cargo bench --bench scalability

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use swarm_conquest::game::constants::physics::DT;
use swarm_conquest::game::spatial::SpatialIndex;
use swarm_conquest::game::systems::ai::AiController;
use swarm_conquest::util::vec2::Vec2;
use swarm_conquest::{SimConfig, Simulation};

const PLAYERS: usize = 4;

/// Create a match with `per_player` particles for each of four AI players
fn create_simulation(per_player: usize) -> Simulation {
    let config = SimConfig {
        player_count: PLAYERS,
        particles_per_player: per_player,
        ..Default::default()
    };
    let mut sim = match Simulation::with_generated_obstacles(config) {
        Ok(sim) => sim,
        Err(e) => panic!("bench config rejected: {e}"),
    };
    for id in 0..PLAYERS {
        let controller = if id % 2 == 0 {
            AiController::Aggressive
        } else {
            AiController::CenterOfMass
        };
        if let Err(e) = sim.register_controller(id, controller) {
            panic!("bench controller rejected: {e}");
        }
    }
    // Let the swarms start moving and meet
    for _ in 0..120 {
        sim.advance(DT);
    }
    sim
}

/// Benchmark a full simulation tick at various particle counts
fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance");
    group.sample_size(30);

    for per_player in [100, 250, 500, 1000, 2500] {
        let mut sim = create_simulation(per_player);
        let total = per_player * PLAYERS;

        group.throughput(Throughput::Elements(total as u64));
        group.bench_with_input(BenchmarkId::new("tick", total), &total, |b, _| {
            b.iter(|| {
                sim.advance(black_box(DT));
            });
        });
    }

    group.finish();
}

/// Benchmark spatial index rebuild and neighbor queries
fn bench_spatial_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_index");
    group.sample_size(50);

    for count in [1000, 4000, 10000] {
        let mut rng = StdRng::seed_from_u64(7);
        let positions: Vec<Vec2> = (0..count)
            .map(|_| Vec2::new(rng.gen_range(0.0..1200.0), rng.gen_range(0.0..800.0)))
            .collect();
        let mut index = SpatialIndex::new(16.0);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("rebuild", count), &count, |b, _| {
            b.iter(|| {
                index.rebuild(positions.iter().copied().enumerate());
                black_box(index.len());
            });
        });

        index.rebuild(positions.iter().copied().enumerate());
        group.bench_with_input(BenchmarkId::new("query_all", count), &count, |b, _| {
            b.iter(|| {
                let mut seen = 0usize;
                for &position in &positions {
                    seen += index.query_nearby(position).count();
                }
                black_box(seen)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_advance, bench_spatial_index);
criterion_main!(benches);
