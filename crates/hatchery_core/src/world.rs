//! Collaborator traits for the world an egg lives in.
//!
//! The core never owns terrain, other entities or block data. The host
//! (or the headless runner) implements these traits and passes itself in
//! on every tick.

use crate::breeds::Breed;
use crate::math::{Aabb, BlockPos, Vec3Fixed};

/// Unique identifier for entities.
pub type EntityId = u64;

/// Block, biome and light lookups used by data-driven habitat rules.
pub trait HabitatQuery {
    /// Block id at `pos`, or `None` for air.
    fn block_at(&self, pos: BlockPos) -> Option<&str>;

    /// Biome id at `pos`.
    fn biome_at(&self, pos: BlockPos) -> &str;

    /// Light level (0-15) at `pos`.
    fn light_at(&self, pos: BlockPos) -> u8;
}

/// World services an egg calls into while ticking.
pub trait EggWorld {
    /// Habitat points `breed` scores at `pos`.
    fn habitat_points(&self, breed: &Breed, pos: BlockPos) -> u32;

    /// Clip `motion` of a box against terrain, returning the motion that
    /// can actually be applied.
    fn clip_motion(&self, bounds: &Aabb, motion: Vec3Fixed) -> Vec3Fixed {
        let _ = bounds;
        motion
    }

    /// Non-player entities overlapping `bounds` that the egg pushes aside.
    fn overlapping_non_players(&self, bounds: &Aabb) -> Vec<EntityId> {
        let _ = bounds;
        Vec::new()
    }
}
