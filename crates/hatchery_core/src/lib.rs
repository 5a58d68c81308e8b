//! # Hatchery Core
//!
//! Deterministic lifecycle logic for dragon eggs.
//!
//! This crate contains **only** the egg's rules:
//! - No rendering or audio (feedback is returned as data)
//! - No IO beyond parsing text handed to it
//! - No ambient randomness (every roll takes an explicit RNG)
//! - No floating-point math in the tick (uses fixed-point)
//!
//! This separation enables:
//! - Authoritative/replica pairs fed from one message stream
//! - Headless simulation and batch runs
//! - Determinism testing by state hash
//!
//! ## Crate Structure
//!
//! - [`egg`] - The egg controller and its tick results
//! - [`transition`] - Breed transition countdown
//! - [`habitat`] - Habitat scoring
//! - [`breeds`] - Breed identifiers and the registry
//! - [`sync`] - Synced fields, events and the publishing seam
//! - [`record`] - Saved egg form
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod breeds;
pub mod config;
pub mod data;
pub mod egg;
pub mod error;
pub mod feedback;
pub mod habitat;
pub mod item;
pub mod math;
pub mod record;
pub mod sync;
pub mod transition;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::breeds::{Breed, BreedId, BreedRegistry};
    pub use crate::config::EggConfig;
    pub use crate::data::{BreedData, HabitatRule, ParticleStyle};
    pub use crate::egg::{
        AuthorityTick, DamageOutcome, DamageSource, EggEntity, JuvenileSpawn, ReplicaTick,
        TickContext, Wiggle,
    };
    pub use crate::error::{HatcheryError, Result};
    pub use crate::feedback::{Particle, ParticleKind, SoundCue};
    pub use crate::item::EggItem;
    pub use crate::math::{Aabb, BlockPos, Fixed, Vec3Fixed};
    pub use crate::record::EggRecord;
    pub use crate::sync::{EggEvent, FieldSync, Replicator, SyncMessage, SyncOutbox, SyncedField};
    pub use crate::transition::{TransitionState, TransitionTimer};
    pub use crate::world::{EggWorld, EntityId, HabitatQuery};
}
