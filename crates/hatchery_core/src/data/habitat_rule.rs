//! Habitat rules: per-breed location scoring.

use serde::{Deserialize, Serialize};

use crate::math::BlockPos;
use crate::world::HabitatQuery;

/// Default search radius for [`HabitatRule::NearbyBlocks`].
const fn default_radius() -> i32 {
    1
}

/// Default points per matching block.
const fn default_points_per_block() -> u32 {
    1
}

/// One scoring rule of a breed's habitat.
///
/// A breed's habitat points at a location are the sum over its rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HabitatRule {
    /// Points for every matching block in the surrounding cube.
    NearbyBlocks {
        /// Block ids that count.
        blocks: Vec<String>,
        /// Cube radius around the egg's block.
        #[serde(default = "default_radius")]
        radius: i32,
        /// Points awarded per matching block.
        #[serde(default = "default_points_per_block")]
        points_per_block: u32,
    },

    /// Flat points when the biome matches.
    Biome {
        /// Biome ids that count.
        biomes: Vec<String>,
        /// Points awarded on a match.
        points: u32,
    },

    /// Flat points for being below (or at/above) a height.
    Height {
        /// `true` scores below `height`, `false` scores at or above it.
        below: bool,
        /// Threshold y level.
        height: i32,
        /// Points awarded on a match.
        points: u32,
    },

    /// Flat points for being darker (or at least as bright) than a level.
    Light {
        /// `true` scores below `light`, `false` scores at or above it.
        below: bool,
        /// Threshold light level (0-15).
        light: u8,
        /// Points awarded on a match.
        points: u32,
    },
}

impl HabitatRule {
    /// Points this rule awards at `pos`.
    pub fn points<Q: HabitatQuery + ?Sized>(&self, world: &Q, pos: BlockPos) -> u32 {
        match self {
            Self::NearbyBlocks {
                blocks,
                radius,
                points_per_block,
            } => {
                let matches = pos
                    .cube(*radius)
                    .filter(|p| {
                        world
                            .block_at(*p)
                            .is_some_and(|block| blocks.iter().any(|b| b == block))
                    })
                    .count() as u32;
                matches.saturating_mul(*points_per_block)
            }
            Self::Biome { biomes, points } => {
                let biome = world.biome_at(pos);
                if biomes.iter().any(|b| b == biome) {
                    *points
                } else {
                    0
                }
            }
            Self::Height {
                below,
                height,
                points,
            } => {
                if (pos.y < *height) == *below {
                    *points
                } else {
                    0
                }
            }
            Self::Light {
                below,
                light,
                points,
            } => {
                if (world.light_at(pos) < *light) == *below {
                    *points
                } else {
                    0
                }
            }
        }
    }
}
