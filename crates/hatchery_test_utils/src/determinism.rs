//! Determinism testing utilities.
//!
//! Provides a harness for verifying that egg simulations produce
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! An authoritative egg and its replicas must agree on every synced value
//! and a rerun with the same seed must reproduce the same hatch. Sources
//! of non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`hatchery_core::math::Fixed`] throughout the tick.
//!
//! - **HashMap iteration order**: Habitat scoring walks the registry in
//!   registration order, never a hash map.
//!
//! - **System randomness**: Every roll takes an explicit seeded RNG.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Timer and scoring determinism
//! 2. **Property tests**: Random hatch times and seeds still reproduce
//! 3. **Integration tests**: Full authoritative/replica runs are reproducible
//! 4. **Parallel tests**: Running N pairs in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use hatchery_core::prelude::*;

use crate::fixtures::EggPair;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Egg simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use hatchery_core::config::EggConfig;
/// use hatchery_test_utils::determinism::verify_determinism;
/// use hatchery_test_utils::fixtures::{EggPair, ScoredWorld};
///
/// let result = verify_determinism(
///     3,
///     500,
///     || EggPair::new(ScoredWorld::default(), EggConfig::default(), 7, 400),
///     |pair| {
///         pair.tick();
///     },
///     EggPair::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run an egg pair twice with identical setup and compare final hashes.
pub fn verify_pair_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> EggPair,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |pair| {
            pair.tick();
        },
        EggPair::state_hash,
    )
    .is_deterministic
}

/// Run N egg pairs on scoped threads and collect final hashes.
pub fn run_parallel_pairs_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> DeterminismResult
where
    F: Fn() -> EggPair + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut pair = setup_fn();
                    for _ in 0..num_ticks {
                        pair.tick();
                    }
                    pair.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match throughout, `Some(tick)` if they diverge at
/// that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> EggPair,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.tick();
        b.tick();

        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that saving, rendering to RON, parsing and loading preserves
/// the authoritative egg's persisted state.
pub fn verify_record_round_trip<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> EggPair,
{
    let mut pair = setup_fn();
    for _ in 0..num_ticks {
        pair.tick();
    }

    let record = pair.authority.save();
    let Ok(text) = record.to_ron() else {
        return false;
    };
    let Ok(parsed) = EggRecord::from_ron("round_trip", &text) else {
        return false;
    };

    let restored = EggEntity::load(pair.authority.id(), &parsed, &pair.registry, &pair.config);
    restored.save() == record && restored.transition() == pair.authority.transition()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for egg testing.
pub mod strategies {
    use hatchery_core::math::Fixed;
    use proptest::prelude::*;

    /// Hatch times short enough to run to completion in a test.
    pub fn arb_hatch_time() -> impl Strategy<Value = i32> {
        1i32..3000i32
    }

    /// RNG seeds.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Damage amounts from 0 to 10 with full fractional precision.
    pub fn arb_damage() -> impl Strategy<Value = Fixed> {
        (0i64..(10i64 << 32)).prop_map(Fixed::from_bits)
    }

    /// Transition durations.
    pub fn arb_transition_time() -> impl Strategy<Value = u32> {
        1u32..400u32
    }

    /// One of the fixture breeds.
    pub fn arb_breed_name() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("fire"), Just("ice"), Just("water"), Just("end")]
    }

    /// Habitat scores for the four fixture breeds.
    pub fn arb_scores() -> impl Strategy<Value = Vec<(&'static str, u32)>> {
        (0u32..10, 0u32..10, 0u32..10, 0u32..10).prop_map(|(f, i, w, e)| {
            vec![("fire", f), ("ice", i), ("water", w), ("end", e)]
        })
    }
}
