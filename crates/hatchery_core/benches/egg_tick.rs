//! Egg tick benchmarks for hatchery_core.
//!
//! Run with: `cargo bench -p hatchery_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hatchery_core::config::EggConfig;
use hatchery_core::habitat;
use hatchery_core::math::BlockPos;
use hatchery_test_utils::fixtures::{test_registry, EggPair, ScoredWorld};

/// Authoritative and replica ticks, idle and mid-transition.
pub fn egg_tick_benchmark(c: &mut Criterion) {
    c.bench_function("pair_tick_idle", |b| {
        let mut pair = EggPair::new(ScoredWorld::default(), EggConfig::default(), 1, i32::MAX);
        b.iter(|| black_box(pair.tick()));
    });

    c.bench_function("pair_tick_transition_burst", |b| {
        let config = EggConfig {
            transition_time: 10_000,
            ..EggConfig::default()
        };
        let mut pair = EggPair::new(ScoredWorld::default(), config, 1, i32::MAX);
        pair.begin_transition("ice", 10_000);
        // Mid-burst: about half the particles
        for _ in 0..5_000 {
            pair.tick();
        }
        b.iter(|| black_box(pair.tick()));
    });
}

/// Habitat scoring across the fixture registry.
pub fn habitat_benchmark(c: &mut Criterion) {
    let registry = test_registry();
    let world = ScoredWorld::with_scores(&[("fire", 3), ("ice", 7), ("water", 5), ("end", 1)]);

    c.bench_function("habitat_evaluate", |b| {
        b.iter(|| {
            black_box(habitat::evaluate(
                &registry,
                &world,
                black_box(BlockPos::new(4, 64, -2)),
                2,
            ))
        });
    });
}

criterion_group!(benches, egg_tick_benchmark, habitat_benchmark);
criterion_main!(benches);
