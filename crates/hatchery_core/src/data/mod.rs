//! Data structures for breed configuration.
//!
//! Pure data types deserialized from RON files. This module contains no
//! IO; file loading is handled by `hatchery_headless`.

mod breed_data;
mod habitat_rule;

pub use breed_data::{BreedData, ParticleStyle};
pub use habitat_rule::HabitatRule;
