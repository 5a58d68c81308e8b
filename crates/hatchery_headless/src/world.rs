//! In-memory nest world for headless runs.
//!
//! Flat ground, a sparse block map, one biome and one light level. Breeds
//! score locations with their own data-driven habitat rules.

use std::collections::HashMap;

use hatchery_core::breeds::Breed;
use hatchery_core::math::{Aabb, BlockPos, Fixed, Vec3Fixed};
use hatchery_core::world::{EggWorld, EntityId, HabitatQuery};

use crate::scenario::{Scenario, Terrain};

/// Ids handed to creatures start here so they never clash with eggs.
pub const CREATURE_ID_BASE: EntityId = 1_000;

/// A creature standing in the nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creature {
    /// Entity id.
    pub id: EntityId,
    /// Collision box.
    pub bounds: Aabb,
    /// Players are never pushed.
    pub player: bool,
}

/// Block grid with flat terrain.
#[derive(Debug, Clone)]
pub struct GridWorld {
    terrain: Terrain,
    blocks: HashMap<BlockPos, String>,
    creatures: Vec<Creature>,
}

impl GridWorld {
    /// Empty world over `terrain`.
    #[must_use]
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            blocks: HashMap::new(),
            creatures: Vec::new(),
        }
    }

    /// Build the world a scenario describes.
    #[must_use]
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let mut world = Self::new(scenario.terrain.clone());
        for fill in &scenario.blocks {
            for pos in fill.positions() {
                world.set_block(pos, &fill.block);
            }
        }

        // Creatures are a bit narrower than a block and nearly two tall
        let width = Fixed::from_num(0.6);
        let height = Fixed::from_num(1.8);
        for (i, placement) in scenario.creatures.iter().enumerate() {
            let (x, y, z) = placement.position;
            let feet = Vec3Fixed::new(
                Fixed::from_num(x) + Fixed::from_bits(1 << 31),
                Fixed::from_num(y),
                Fixed::from_num(z) + Fixed::from_bits(1 << 31),
            );
            world.creatures.push(Creature {
                id: CREATURE_ID_BASE + i as EntityId,
                bounds: Aabb::standing_at(feet, width, height),
                player: placement.player,
            });
        }
        world
    }

    /// Place a block, overwriting whatever was there.
    pub fn set_block(&mut self, pos: BlockPos, block: &str) {
        self.blocks.insert(pos, block.to_string());
    }

    /// Creatures in the nest.
    #[must_use]
    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    fn ground(&self) -> Fixed {
        Fixed::from_num(self.terrain.ground_level)
    }
}

impl HabitatQuery for GridWorld {
    fn block_at(&self, pos: BlockPos) -> Option<&str> {
        if let Some(block) = self.blocks.get(&pos) {
            return Some(block.as_str());
        }
        (pos.y < self.terrain.ground_level).then_some(self.terrain.ground_block.as_str())
    }

    fn biome_at(&self, _pos: BlockPos) -> &str {
        &self.terrain.biome
    }

    fn light_at(&self, _pos: BlockPos) -> u8 {
        self.terrain.light
    }
}

impl EggWorld for GridWorld {
    fn habitat_points(&self, breed: &Breed, pos: BlockPos) -> u32 {
        breed.habitat_points(self, pos)
    }

    fn clip_motion(&self, bounds: &Aabb, motion: Vec3Fixed) -> Vec3Fixed {
        let ground = self.ground();
        let mut clipped = motion;
        if bounds.min.y >= ground && bounds.min.y + motion.y < ground {
            clipped.y = ground - bounds.min.y;
        }
        clipped
    }

    fn overlapping_non_players(&self, bounds: &Aabb) -> Vec<EntityId> {
        self.creatures
            .iter()
            .filter(|c| !c.player && c.bounds.intersects(bounds))
            .map(|c| c.id)
            .collect()
    }
}
