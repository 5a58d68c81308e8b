//! Item form of an egg.

use serde::{Deserialize, Serialize};

use crate::breeds::BreedId;

/// A harvested egg: breed and remaining hatch time, ready to be placed
/// again with [`EggEntity::from_item`](crate::egg::EggEntity::from_item).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EggItem {
    /// Breed of the egg.
    pub breed: BreedId,
    /// Ticks left until hatch when it was harvested.
    pub hatch_time: i32,
}

impl EggItem {
    /// Create an item.
    #[must_use]
    pub const fn new(breed: BreedId, hatch_time: i32) -> Self {
        Self { breed, hatch_time }
    }
}
