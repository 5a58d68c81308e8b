//! Scenario loading and configuration.
//!
//! Scenarios define the nest for a headless run: flat terrain with a few
//! placed blocks, the eggs, bystanders the eggs can push, and scheduled
//! damage.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "Lava Pocket",
//!     description: "A fire egg beside a lava pool",
//!     max_ticks: 13000,
//!     terrain: Terrain(ground_level: 64, ground_block: "stone", biome: "plains", light: 15),
//!     blocks: [BlockFill(block: "lava", from: (-1, 63, -1), to: (1, 63, 1))],
//!     eggs: [EggPlacement(breed: "ice", position: (0, 64, 0))],
//! )
//! ```
//!
//! Damage amounts are fixed-point raw bits (`4294967296` is 1.0).

use std::path::Path;

use hatchery_core::math::{fixed_serde, BlockPos, Fixed};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found and no built-in scenario has that name.
    #[error("Scenario not found: {0}")]
    NotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed but inconsistent.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// Flat ground shared by the whole nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrain {
    /// Y of the ground surface; every block below it is `ground_block`.
    pub ground_level: i32,
    /// Block id of the ground.
    pub ground_block: String,
    /// Biome id everywhere.
    pub biome: String,
    /// Light level (0-15) everywhere.
    pub light: u8,
}

impl Default for Terrain {
    fn default() -> Self {
        Self {
            ground_level: 64,
            ground_block: "stone".to_string(),
            biome: "plains".to_string(),
            light: 15,
        }
    }
}

/// A box of one block type, inclusive on both corners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFill {
    /// Block id.
    pub block: String,
    /// First corner.
    pub from: (i32, i32, i32),
    /// Opposite corner.
    pub to: (i32, i32, i32),
}

impl BlockFill {
    /// Every block position covered.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> {
        let (x0, x1) = ordered(self.from.0, self.to.0);
        let (y0, y1) = ordered(self.from.1, self.to.1);
        let (z0, z1) = ordered(self.from.2, self.to.2);
        (x0..=x1).flat_map(move |x| {
            (y0..=y1).flat_map(move |y| (z0..=z1).map(move |z| BlockPos::new(x, y, z)))
        })
    }
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// An egg placed at scenario start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EggPlacement {
    /// Starting breed id.
    pub breed: String,
    /// Block the egg stands in.
    pub position: (i32, i32, i32),
    /// Ticks until hatch; `None` uses the configured default.
    #[serde(default)]
    pub hatch_time: Option<i32>,
    /// Display name passed on to the hatchling.
    #[serde(default)]
    pub name: Option<String>,
}

/// A creature standing in the nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreaturePlacement {
    /// Block the creature stands in.
    pub position: (i32, i32, i32),
    /// Players are never pushed.
    #[serde(default)]
    pub player: bool,
}

/// Who deals scheduled damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageKind {
    /// A player (harvests the egg).
    Player,
    /// A non-player creature.
    Creature,
    /// Falls, fire and the like.
    Environment,
}

/// Damage applied to an egg at a given tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDamage {
    /// Tick at which it lands (1-based).
    pub tick: u64,
    /// Index into `eggs`.
    pub egg: usize,
    /// Damage source.
    pub source: DamageKind,
    /// Damage amount.
    #[serde(with = "fixed_serde")]
    pub amount: Fixed,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Tick limit for a run.
    pub max_ticks: u64,
    /// Breed fresh and unresolvable eggs fall back to; `None` uses the
    /// first breed loaded.
    #[serde(default)]
    pub default_breed: Option<String>,
    /// Ground, biome and light.
    #[serde(default)]
    pub terrain: Terrain,
    /// Placed blocks, later fills overwrite earlier ones.
    #[serde(default)]
    pub blocks: Vec<BlockFill>,
    /// Eggs.
    pub eggs: Vec<EggPlacement>,
    /// Bystanders.
    #[serde(default)]
    pub creatures: Vec<CreaturePlacement>,
    /// Scheduled damage.
    #[serde(default)]
    pub damage: Vec<ScheduledDamage>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::mixed_nest()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::NotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a file if `name` is an existing path, else a built-in by name.
    pub fn resolve(name: &str) -> Result<Self, ScenarioError> {
        if Path::new(name).exists() {
            return Self::load(name);
        }
        Self::builtin(name).ok_or_else(|| ScenarioError::NotFound(name.to_string()))
    }

    /// Built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "mixed_nest" => Some(Self::mixed_nest()),
            "quick_hatch" => Some(Self::quick_hatch()),
            _ => None,
        }
    }

    /// Check egg references in scheduled damage.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.eggs.is_empty() {
            return Err(ScenarioError::Invalid("no eggs placed".to_string()));
        }
        if let Some(bad) = self.damage.iter().find(|d| d.egg >= self.eggs.len()) {
            return Err(ScenarioError::Invalid(format!(
                "damage at tick {} targets egg {} of {}",
                bad.tick,
                bad.egg,
                self.eggs.len()
            )));
        }
        Ok(())
    }

    /// Three fire eggs: one on snow, one by water, one left alone.
    #[must_use]
    pub fn mixed_nest() -> Self {
        Self {
            name: "Mixed Nest".to_string(),
            description: "Fire eggs laid on snow, beside water and on bare stone".to_string(),
            max_ticks: 13_000,
            default_breed: Some("fire".to_string()),
            terrain: Terrain::default(),
            blocks: vec![
                BlockFill {
                    block: "snow".to_string(),
                    from: (-12, 63, -2),
                    to: (-8, 63, 2),
                },
                BlockFill {
                    block: "water".to_string(),
                    from: (8, 63, -2),
                    to: (12, 63, 2),
                },
            ],
            eggs: vec![
                EggPlacement {
                    breed: "fire".to_string(),
                    position: (-10, 64, 0),
                    hatch_time: None,
                    name: None,
                },
                EggPlacement {
                    breed: "fire".to_string(),
                    position: (10, 64, 0),
                    hatch_time: None,
                    name: Some("Tide".to_string()),
                },
                EggPlacement {
                    breed: "fire".to_string(),
                    position: (0, 64, 0),
                    hatch_time: None,
                    name: None,
                },
            ],
            creatures: vec![CreaturePlacement {
                position: (0, 64, 0),
                player: false,
            }],
            damage: Vec::new(),
        }
    }

    /// One short-lived egg dropped from a height, for smoke tests.
    #[must_use]
    pub fn quick_hatch() -> Self {
        Self {
            name: "Quick Hatch".to_string(),
            description: "A single egg falling onto stone and hatching fast".to_string(),
            max_ticks: 1_000,
            default_breed: None,
            terrain: Terrain::default(),
            blocks: Vec::new(),
            eggs: vec![EggPlacement {
                breed: "fire".to_string(),
                position: (0, 70, 0),
                hatch_time: Some(600),
                name: None,
            }],
            creatures: Vec::new(),
            damage: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_validate() {
        for name in ["mixed_nest", "quick_hatch"] {
            let scenario = Scenario::builtin(name).unwrap();
            assert!(scenario.validate().is_ok(), "{name}");
        }
        assert!(Scenario::builtin("nope").is_none());
    }

    #[test]
    fn test_parse_minimal_scenario() {
        let scenario = Scenario::from_ron_str(
            r#"Scenario(
                name: "Tiny",
                max_ticks: 10,
                eggs: [EggPlacement(breed: "ice", position: (0, 64, 0))],
                damage: [ScheduledDamage(tick: 5, egg: 0, source: Creature, amount: 21474836480)],
            )"#,
        )
        .unwrap();
        assert_eq!(scenario.terrain, Terrain::default());
        assert_eq!(scenario.eggs[0].hatch_time, None);
        assert_eq!(scenario.damage[0].amount, Fixed::from_num(5));
    }

    #[test]
    fn test_damage_must_target_existing_egg() {
        let result = Scenario::from_ron_str(
            r#"Scenario(
                name: "Bad",
                max_ticks: 10,
                eggs: [EggPlacement(breed: "ice", position: (0, 64, 0))],
                damage: [ScheduledDamage(tick: 5, egg: 3, source: Player, amount: 0)],
            )"#,
        );
        assert!(matches!(result, Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_fill_covers_inclusive_box() {
        let fill = BlockFill {
            block: "lava".to_string(),
            from: (1, 0, 1),
            to: (-1, 0, -1),
        };
        assert_eq!(fill.positions().count(), 9);
    }

    #[test]
    fn test_shipped_scenarios_parse() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
        for file in ["frozen_lake.ron", "lava_pocket.ron", "harvest.ron"] {
            let scenario = Scenario::load(dir.join(file)).unwrap();
            assert!(!scenario.eggs.is_empty(), "{file}");
        }

        let harvest = Scenario::load(dir.join("harvest.ron")).unwrap();
        assert_eq!(harvest.eggs[0].hatch_time, Some(3000));
        assert_eq!(harvest.damage[1].amount, Fixed::from_num(4));
        assert!(harvest.damage[2].amount > Fixed::from_num(4));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        assert!(matches!(
            Scenario::resolve("does/not/exist.ron"),
            Err(ScenarioError::NotFound(_))
        ));
    }
}
