//! Breed data structures for data-driven breed definitions.

use serde::{Deserialize, Serialize};

use super::habitat_rule::HabitatRule;

/// How an egg of this breed sheds particles while incubating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParticleStyle {
    /// Colored dust, mostly in the primary color.
    #[default]
    Dust,
    /// Swirling portal motes with random velocity, no color.
    Portal,
}

/// Data-driven breed definition.
///
/// # Example RON
///
/// ```ron
/// BreedData(
///     id: "ice",
///     primary_color: (255, 255, 255),
///     secondary_color: (0, 242, 255),
///     habitats: [
///         NearbyBlocks(blocks: ["snow", "ice"], radius: 1, points_per_block: 1),
///         Biome(biomes: ["frozen_peaks"], points: 4),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedData {
    /// Unique identifier, optionally namespaced (`"dragonmounts:ice"`).
    pub id: String,

    /// Primary color RGB values (0-255).
    pub primary_color: [u8; 3],

    /// Secondary color RGB values (0-255).
    pub secondary_color: [u8; 3],

    /// Egg particle style.
    #[serde(default)]
    pub particle: ParticleStyle,

    /// Rules whose points are summed to score a location.
    #[serde(default)]
    pub habitats: Vec<HabitatRule>,
}
