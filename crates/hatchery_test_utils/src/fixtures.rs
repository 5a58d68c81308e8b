//! Test fixtures and helpers.
//!
//! A small breed registry, a world stub with scripted habitat scores, and
//! [`EggPair`], an authoritative egg wired to a replica through the real
//! wire codec.

use std::collections::BTreeMap;

use fixed::types::I32F32;
use hatchery_core::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Breeds used across tests, in registry order. `fire` is the default.
pub const TEST_BREEDS_RON: &str = r#"[
    BreedData(
        id: "fire",
        primary_color: (204, 65, 20),
        secondary_color: (255, 190, 0),
        habitats: [NearbyBlocks(blocks: ["lava", "fire"])],
    ),
    BreedData(
        id: "ice",
        primary_color: (200, 235, 255),
        secondary_color: (120, 160, 255),
        habitats: [
            NearbyBlocks(blocks: ["ice", "snow"]),
            Biome(biomes: ["frozen_peaks"], points: 2),
        ],
    ),
    BreedData(
        id: "water",
        primary_color: (40, 90, 220),
        secondary_color: (20, 180, 200),
        habitats: [NearbyBlocks(blocks: ["water"])],
    ),
    BreedData(
        id: "end",
        primary_color: (20, 0, 30),
        secondary_color: (200, 100, 255),
        particle: Portal,
        habitats: [Biome(biomes: ["the_end"], points: 5)],
    ),
]"#;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Registry built from [`TEST_BREEDS_RON`].
///
/// # Panics
///
/// Panics if the embedded RON is malformed.
#[must_use]
pub fn test_registry() -> BreedRegistry {
    BreedRegistry::from_ron("test_breeds", TEST_BREEDS_RON).expect("test breeds must parse")
}

/// Parse a breed id known to be valid.
///
/// # Panics
///
/// Panics on malformed ids.
#[must_use]
pub fn breed_id(raw: &str) -> BreedId {
    BreedId::parse(raw).expect("valid breed id")
}

/// World stub with scripted per-breed habitat scores.
#[derive(Debug, Clone, Default)]
pub struct ScoredWorld {
    /// Points per breed id; missing breeds score zero.
    pub scores: BTreeMap<String, u32>,
    /// Solid floor height, if any.
    pub floor: Option<I32F32>,
    /// Entities reported as overlapping the egg.
    pub neighbors: Vec<EntityId>,
}

impl ScoredWorld {
    /// World with the given scores and a floor at y = 0.
    #[must_use]
    pub fn with_scores(scores: &[(&str, u32)]) -> Self {
        Self {
            scores: scores
                .iter()
                .map(|(id, points)| ((*id).to_string(), *points))
                .collect(),
            floor: Some(I32F32::ZERO),
            neighbors: Vec::new(),
        }
    }
}

impl EggWorld for ScoredWorld {
    fn habitat_points(&self, breed: &Breed, _pos: BlockPos) -> u32 {
        self.scores.get(breed.id.as_str()).copied().unwrap_or(0)
    }

    fn clip_motion(&self, bounds: &Aabb, motion: Vec3Fixed) -> Vec3Fixed {
        let mut clipped = motion;
        if let Some(floor) = self.floor {
            if bounds.min.y + motion.y < floor {
                clipped.y = floor - bounds.min.y;
            }
        }
        clipped
    }

    fn overlapping_non_players(&self, _bounds: &Aabb) -> Vec<EntityId> {
        self.neighbors.clone()
    }
}

/// An authoritative egg and its replica joined by an encoded message
/// stream.
#[derive(Debug, Clone)]
pub struct EggPair {
    /// Breed lookup.
    pub registry: BreedRegistry,
    /// World stub.
    pub world: ScoredWorld,
    /// Tuning.
    pub config: EggConfig,
    /// The egg that decides.
    pub authority: EggEntity,
    /// The egg that follows.
    pub replica: EggEntity,
    /// Hatchling produced by the authoritative side.
    pub hatched: Option<JuvenileSpawn>,
    /// Sounds the replica played, in order.
    pub sounds: Vec<SoundCue>,
    /// Particles the replica emitted.
    pub particles: usize,
    /// Wiggles the authoritative side broadcast.
    pub wiggles: u32,
    /// Ticks run.
    pub ticks: u64,
    authority_rng: StdRng,
    replica_rng: StdRng,
    outbox: SyncOutbox,
}

impl EggPair {
    /// Pair of eggs at the origin with the given hatch time.
    #[must_use]
    pub fn new(world: ScoredWorld, config: EggConfig, seed: u64, hatch_time: i32) -> Self {
        let registry = test_registry();
        let mut authority = EggEntity::new(1, &registry, &config, Vec3Fixed::ZERO);
        authority.set_hatch_time(hatch_time);
        let mut replica = EggEntity::new(1, &registry, &config, Vec3Fixed::ZERO);
        for field in authority.synced_fields() {
            replica.apply_field(&field, &registry, &config);
        }

        Self {
            registry,
            world,
            config,
            authority,
            replica,
            hatched: None,
            sounds: Vec::new(),
            particles: 0,
            wiggles: 0,
            ticks: 0,
            authority_rng: StdRng::seed_from_u64(seed),
            replica_rng: StdRng::seed_from_u64(seed ^ 0x5EED),
            outbox: SyncOutbox::new(),
        }
    }

    /// Start a transition on the authoritative side.
    pub fn begin_transition(&mut self, target: &str, duration: u32) {
        self.authority
            .begin_transition(breed_id(target), duration, &mut self.outbox);
    }

    /// Advance both sides one tick, then deliver everything the
    /// authoritative side published.
    ///
    /// # Panics
    ///
    /// Panics if a message fails the wire round trip.
    pub fn tick(&mut self) -> AuthorityTick {
        let ctx = TickContext::new(&self.registry, &self.world, &self.config);
        let tick = self
            .authority
            .advance_authoritative(&ctx, &mut self.authority_rng, &mut self.outbox);
        if tick.hatched.is_some() {
            self.hatched.clone_from(&tick.hatched);
        }
        if tick.wiggled {
            self.wiggles += 1;
        }

        let replica_tick = self.replica.advance_replica(&ctx, &mut self.replica_rng);
        self.particles += replica_tick.particles.len();
        self.ticks += 1;

        self.deliver();
        tick
    }

    /// Deliver pending messages without ticking.
    ///
    /// # Panics
    ///
    /// Panics if a message fails the wire round trip.
    pub fn deliver(&mut self) {
        for message in self.outbox.drain() {
            let bytes = message.encode().expect("encode sync message");
            let decoded = SyncMessage::decode(&bytes).expect("decode sync message");
            if let Some(sound) = self.replica.apply(&decoded, &self.registry, &self.config) {
                self.sounds.push(sound);
            }
        }
    }

    /// Run until the authoritative egg hatches or `max_ticks` pass.
    pub fn run_until_hatched(&mut self, max_ticks: u64) -> Option<JuvenileSpawn> {
        for _ in 0..max_ticks {
            if self.authority.is_removed() {
                break;
            }
            self.tick();
        }
        self.hatched.clone()
    }

    /// Combined hash of both sides.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        crate::determinism::compute_hash(&(
            self.authority.state_hash(),
            self.replica.state_hash(),
            self.ticks,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_and_default() {
        let reg = test_registry();
        let ids: Vec<_> = reg.iter().map(|b| b.id.to_string()).collect();
        assert_eq!(ids, vec!["fire", "ice", "water", "end"]);
        assert_eq!(reg.default_breed().id, breed_id("fire"));
        assert_eq!(reg.read("end").particle, ParticleStyle::Portal);
    }

    #[test]
    fn test_scored_world_floor() {
        let world = ScoredWorld::with_scores(&[]);
        let bounds = Aabb::standing_at(Vec3Fixed::from_ints(0, 1, 0), fixed(1), fixed(1));
        let motion = Vec3Fixed::new(fixed(0), fixed(-3), fixed(0));
        assert_eq!(world.clip_motion(&bounds, motion).y, fixed(-1));
    }

    #[test]
    fn test_pair_replica_sees_initial_breed() {
        let mut pair = EggPair::new(ScoredWorld::default(), EggConfig::default(), 1, 100);
        pair.tick();
        assert_eq!(pair.replica.breed(), pair.authority.breed());
        assert_eq!(pair.particles, 1);
    }
}
