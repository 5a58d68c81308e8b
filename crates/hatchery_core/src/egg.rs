//! Egg lifecycle controller.
//!
//! An [`EggEntity`] is ticked once per simulation step on each side of a
//! replicated pair:
//!
//! - [`EggEntity::advance_authoritative`] owns every timing decision:
//!   habitat checks, transition commits, wiggle rolls and the hatch.
//! - [`EggEntity::advance_replica`] only produces cosmetic feedback from
//!   the values it has been sent.
//!
//! The authoritative side publishes through a [`Replicator`]; replicas
//! feed the resulting messages into [`EggEntity::apply`].
//!
//! # Tick order
//!
//! 1. Age and physics (gravity, clipped movement, drag)
//! 2. Transition timer
//! 3. Authoritative only: habitat check, hatch countdown, wiggle roll
//! 4. Replica only: transition burst, wiggle interpolation, idle particle
//!
//! # Example
//!
//! ```
//! use hatchery_core::prelude::*;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! struct Flat;
//! impl EggWorld for Flat {
//!     fn habitat_points(&self, _breed: &Breed, _pos: BlockPos) -> u32 {
//!         0
//!     }
//! }
//!
//! let registry = BreedRegistry::from_ron(
//!     "inline",
//!     r#"[BreedData(id: "fire", primary_color: (204, 65, 20), secondary_color: (255, 190, 0))]"#,
//! )
//! .unwrap();
//! let config = EggConfig::default();
//! let ctx = TickContext::new(&registry, &Flat, &config);
//! let mut rng = StdRng::seed_from_u64(1);
//! let mut outbox = SyncOutbox::new();
//!
//! let mut egg = EggEntity::new(1, &registry, &config, Vec3Fixed::ZERO);
//! egg.set_hatch_time(3);
//! egg.set_no_gravity(true);
//!
//! egg.advance_authoritative(&ctx, &mut rng, &mut outbox);
//! egg.advance_authoritative(&ctx, &mut rng, &mut outbox);
//! let tick = egg.advance_authoritative(&ctx, &mut rng, &mut outbox);
//! assert!(tick.hatched.is_some());
//! assert!(egg.is_removed());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::breeds::{Breed, BreedId, BreedRegistry};
use crate::config::EggConfig;
use crate::feedback::{hatching_particle, Particle, SoundCue};
use crate::habitat;
use crate::item::EggItem;
use crate::math::{Aabb, Fixed, Vec3Fixed};
use crate::record::EggRecord;
use crate::sync::{EggEvent, FieldSync, Replicator, SyncMessage, SyncedField};
use crate::transition::TransitionTimer;
use crate::world::{EggWorld, EntityId};

/// Height above the egg at which idle particles appear.
const IDLE_PARTICLE_LIFT: Fixed = Fixed::ONE;

/// Height above the egg at which transition particles appear (0.5).
const TRANSITION_PARTICLE_LIFT: Fixed = Fixed::from_bits(1 << 31);

/// Shared read-only inputs for one tick.
#[derive(Debug)]
pub struct TickContext<'a, W: ?Sized> {
    /// Breed lookup table.
    pub registry: &'a BreedRegistry,
    /// World collaborator.
    pub world: &'a W,
    /// Lifecycle tuning.
    pub config: &'a EggConfig,
}

impl<'a, W: EggWorld + ?Sized> TickContext<'a, W> {
    /// Bundle the shared inputs.
    #[must_use]
    pub const fn new(registry: &'a BreedRegistry, world: &'a W, config: &'a EggConfig) -> Self {
        Self {
            registry,
            world,
            config,
        }
    }
}

/// Replica-side wiggle animation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wiggle {
    value: Fixed,
    wiggling: bool,
}

impl Wiggle {
    /// Interpolated amount in `[0, 1]`.
    #[must_use]
    pub const fn value(&self) -> Fixed {
        self.value
    }

    /// Whether the wiggle is still rising.
    #[must_use]
    pub const fn is_wiggling(&self) -> bool {
        self.wiggling
    }

    fn advance(&mut self, step: Fixed) {
        let next = if self.wiggling {
            self.value + step
        } else {
            self.value - step
        };
        self.value = next.clamp(Fixed::ZERO, Fixed::ONE);
        if self.value == Fixed::ONE {
            self.wiggling = false;
        }
    }

    /// Start a wiggle if fully at rest.
    fn start(&mut self) -> bool {
        if self.wiggling || self.value > Fixed::ZERO {
            return false;
        }
        self.wiggling = true;
        true
    }
}

/// What damaged the egg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSource {
    /// A player-controlled entity.
    Player(EntityId),
    /// Any other entity.
    Entity(EntityId),
    /// Falling, fire, explosions and the like.
    Environment,
}

impl DamageSource {
    /// Whether a player dealt the damage.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self, Self::Player(_))
    }
}

/// Result of damaging an egg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DamageOutcome {
    /// A player picked the egg up; drop this item.
    Harvested(EggItem),
    /// The egg broke; nothing drops.
    Destroyed,
    /// Not handled here; the host applies its default handling.
    PassThrough(Fixed),
    /// The egg was already gone.
    Ignored,
}

/// A hatchling the host should spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JuvenileSpawn {
    /// Breed of the hatchling.
    pub breed: BreedId,
    /// Where the egg was.
    pub position: Vec3Fixed,
    /// The egg's display name, if any.
    pub custom_name: Option<String>,
}

/// Authoritative-side results of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityTick {
    /// Non-player entities the egg is pushing aside.
    pub pushed: Vec<EntityId>,
    /// A transition started by this tick's habitat check.
    pub began_transition: Option<BreedId>,
    /// A transition committed this tick.
    pub committed_breed: Option<BreedId>,
    /// Whether a wiggle was broadcast.
    pub wiggled: bool,
    /// The hatchling, when the egg hatched this tick.
    pub hatched: Option<JuvenileSpawn>,
}

/// Replica-side results of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicaTick {
    /// Particles to spawn.
    pub particles: Vec<Particle>,
}

/// A dragon egg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EggEntity {
    id: EntityId,
    breed: BreedId,
    hatch_time: i32,
    transition: TransitionTimer,
    wiggle: Wiggle,
    position: Vec3Fixed,
    velocity: Vec3Fixed,
    no_gravity: bool,
    custom_name: Option<String>,
    age: u64,
    removed: bool,
}

impl EggEntity {
    /// A fresh egg of the default breed.
    #[must_use]
    pub fn new(
        id: EntityId,
        registry: &BreedRegistry,
        config: &EggConfig,
        position: Vec3Fixed,
    ) -> Self {
        Self {
            id,
            breed: registry.default_breed().id.clone(),
            hatch_time: config.default_hatch_time,
            transition: TransitionTimer::new(),
            wiggle: Wiggle::default(),
            position,
            velocity: Vec3Fixed::ZERO,
            no_gravity: false,
            custom_name: None,
            age: 0,
            removed: false,
        }
    }

    /// Place an egg from its item form.
    ///
    /// Unknown breeds fall back to the registry default.
    #[must_use]
    pub fn from_item(
        id: EntityId,
        item: &EggItem,
        registry: &BreedRegistry,
        config: &EggConfig,
        position: Vec3Fixed,
    ) -> Self {
        let mut egg = Self::new(id, registry, config, position);
        egg.breed = registry.read(item.breed.as_str()).id.clone();
        egg.hatch_time = item.hatch_time;
        egg
    }

    /// Restore an egg from its saved record.
    ///
    /// An unknown breed falls back to the default; a missing or unknown
    /// transition target leaves the transition idle.
    #[must_use]
    pub fn load(
        id: EntityId,
        record: &EggRecord,
        registry: &BreedRegistry,
        config: &EggConfig,
    ) -> Self {
        let mut egg = Self::new(id, registry, config, record.pos);
        egg.breed = registry.read(&record.breed).id.clone();
        egg.hatch_time = record.hatch_time.unwrap_or(config.default_hatch_time);
        egg.velocity = record.motion;
        egg.no_gravity = record.no_gravity;
        egg.custom_name.clone_from(&record.custom_name);

        if let Some(target) = record
            .transition_breed
            .as_deref()
            .and_then(|raw| registry.resolve(raw))
        {
            let ticks = u32::try_from(record.transition_time.unwrap_or(0)).unwrap_or(0);
            egg.transition.begin_local(target.id.clone(), ticks);
        }

        egg
    }

    /// Snapshot for saving.
    #[must_use]
    pub fn save(&self) -> EggRecord {
        let running = self.transition.target().map(|target| {
            (
                target.to_string(),
                i32::try_from(self.transition.ticks_remaining()).unwrap_or(i32::MAX),
            )
        });

        EggRecord {
            hatch_time: Some(self.hatch_time),
            breed: self.breed.to_string(),
            transition_breed: running.as_ref().map(|(target, _)| target.clone()),
            transition_time: running.map(|(_, ticks)| ticks),
            pos: self.position,
            motion: self.velocity,
            custom_name: self.custom_name.clone(),
            no_gravity: self.no_gravity,
        }
    }

    /// Current values of every synced field, sent when a replica is created.
    #[must_use]
    pub fn synced_fields(&self) -> Vec<SyncedField> {
        vec![
            SyncedField::Breed(self.breed.to_string()),
            SyncedField::TransitionBreed(
                self.transition
                    .target()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ),
        ]
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Current breed.
    #[must_use]
    pub fn breed(&self) -> &BreedId {
        &self.breed
    }

    /// Ticks until hatch.
    #[must_use]
    pub const fn hatch_time(&self) -> i32 {
        self.hatch_time
    }

    /// Breed transition timer.
    #[must_use]
    pub fn transition(&self) -> &TransitionTimer {
        &self.transition
    }

    /// Wiggle animation state.
    #[must_use]
    pub const fn wiggle(&self) -> Wiggle {
        self.wiggle
    }

    /// Position of the egg's base.
    #[must_use]
    pub const fn position(&self) -> Vec3Fixed {
        self.position
    }

    /// Velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec3Fixed {
        self.velocity
    }

    /// Display name.
    #[must_use]
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    /// Ticks lived.
    #[must_use]
    pub const fn age(&self) -> u64 {
        self.age
    }

    /// Whether the egg hatched, broke or was harvested.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.removed
    }

    /// Set the ticks until hatch.
    pub fn set_hatch_time(&mut self, ticks: i32) {
        self.hatch_time = ticks;
    }

    /// Set the display name.
    pub fn set_custom_name(&mut self, name: Option<String>) {
        self.custom_name = name;
    }

    /// Enable or disable gravity.
    pub fn set_no_gravity(&mut self, no_gravity: bool) {
        self.no_gravity = no_gravity;
    }

    /// Set the velocity.
    pub fn set_velocity(&mut self, velocity: Vec3Fixed) {
        self.velocity = velocity;
    }

    /// Change the breed and publish it.
    pub fn set_breed<S: FieldSync + ?Sized>(&mut self, breed: BreedId, sync: &mut S) {
        sync.write_field(SyncedField::Breed(breed.to_string()));
        self.breed = breed;
    }

    /// Start a transition toward `target` and publish it.
    pub fn begin_transition<S: FieldSync + ?Sized>(
        &mut self,
        target: BreedId,
        duration: u32,
        sync: &mut S,
    ) {
        self.transition.begin(target, duration, sync);
    }

    /// Bounding box at the current position.
    #[must_use]
    pub fn bounds(&self, config: &EggConfig) -> Aabb {
        Aabb::standing_at(self.position, config.width, config.height)
    }

    /// Authoritative tick.
    pub fn advance_authoritative<W, R, S>(
        &mut self,
        ctx: &TickContext<'_, W>,
        rng: &mut R,
        sync: &mut S,
    ) -> AuthorityTick
    where
        W: EggWorld + ?Sized,
        R: Rng + ?Sized,
        S: Replicator + ?Sized,
    {
        let mut tick = AuthorityTick::default();
        if self.removed {
            return tick;
        }

        let config = ctx.config;
        self.age += 1;
        self.apply_physics(ctx);
        tick.pushed = ctx.world.overlapping_non_players(&self.bounds(config));

        if let Some(target) = self.transition.advance_authoritative(sync) {
            self.set_breed(target.clone(), sync);
            tick.committed_breed = Some(target);
        }

        let transition_time = i64::from(config.transition_time);
        if i64::from(self.hatch_time) > transition_time
            && !self.transition.is_running()
            && self.age % config.habitat_update_interval == 0
        {
            tick.began_transition = self.update_habitat(ctx, sync);
        }

        self.hatch_time = self.hatch_time.saturating_sub(1);
        if self.hatch_time <= 0 {
            tick.hatched = Some(self.hatch(sync));
            return tick;
        }

        if self.hatch_time < config.wiggle_threshold() {
            let roll = config.min_wiggle_roll.max(self.hatch_time);
            if rng.gen_range(0..roll) == 0 {
                sync.broadcast(EggEvent::Wiggle);
                tick.wiggled = true;
            }
        }

        tick
    }

    /// Replica tick.
    pub fn advance_replica<W, R>(&mut self, ctx: &TickContext<'_, W>, rng: &mut R) -> ReplicaTick
    where
        W: EggWorld + ?Sized,
        R: Rng + ?Sized,
    {
        let mut tick = ReplicaTick::default();
        if self.removed {
            return tick;
        }

        let config = ctx.config;
        self.age += 1;
        self.apply_physics(ctx);

        if let Some(feedback) = self.transition.advance_replica(config.transition_time) {
            if let Some(target) = ctx.registry.get(&feedback.target) {
                for _ in 0..feedback.particles {
                    tick.particles.push(hatching_particle(
                        target,
                        self.position,
                        TRANSITION_PARTICLE_LIFT,
                        rng,
                    ));
                }
            }
        }

        self.wiggle.advance(config.wiggle_step);

        let breed = self.resolve_breed(ctx.registry);
        tick.particles
            .push(hatching_particle(breed, self.position, IDLE_PARTICLE_LIFT, rng));

        tick
    }

    /// Re-evaluate the habitat and start a transition if another breed
    /// wins. Returns the new target.
    pub fn update_habitat<W, S>(
        &mut self,
        ctx: &TickContext<'_, W>,
        sync: &mut S,
    ) -> Option<BreedId>
    where
        W: EggWorld + ?Sized,
        S: FieldSync + ?Sized,
    {
        let winner = habitat::evaluate(
            ctx.registry,
            ctx.world,
            self.position.block_pos(),
            ctx.config.min_habitat_points,
        )?;

        if winner.id == self.breed {
            return None;
        }

        tracing::debug!(
            egg = self.id,
            from = %self.breed,
            to = %winner.id,
            "Habitat favours another breed"
        );
        self.transition
            .begin(winner.id.clone(), ctx.config.transition_time, sync);
        Some(winner.id.clone())
    }

    /// Apply one replicated message. Returns a sound to play, if any.
    pub fn apply(
        &mut self,
        message: &SyncMessage,
        registry: &BreedRegistry,
        config: &EggConfig,
    ) -> Option<SoundCue> {
        match message {
            SyncMessage::Field(field) => {
                self.apply_field(field, registry, config);
                None
            }
            SyncMessage::Event(event) => self.handle_event(*event),
        }
    }

    /// React to a synced field value. Every delivery is handled, including
    /// re-sends of an unchanged value.
    pub fn apply_field(
        &mut self,
        field: &SyncedField,
        registry: &BreedRegistry,
        config: &EggConfig,
    ) {
        match field {
            SyncedField::Breed(raw) => {
                self.breed = registry.read(raw).id.clone();
            }
            SyncedField::TransitionBreed(raw) => match registry.resolve(raw) {
                Some(target) => self
                    .transition
                    .begin_local(target.id.clone(), config.transition_time),
                None => self.transition.abort(),
            },
        }
    }

    /// Replica reaction to a broadcast event.
    pub fn handle_event(&mut self, event: EggEvent) -> Option<SoundCue> {
        if self.removed {
            return None;
        }
        match event {
            EggEvent::Hatch => {
                self.removed = true;
                Some(SoundCue::Hatch)
            }
            EggEvent::Wiggle => self.wiggle.start().then_some(SoundCue::Crack),
        }
    }

    /// Damage the egg (authoritative).
    ///
    /// Players harvest the egg into an item. Anything else breaks it only
    /// above the fatal threshold.
    pub fn hurt(
        &mut self,
        source: DamageSource,
        amount: Fixed,
        config: &EggConfig,
    ) -> DamageOutcome {
        if self.removed {
            return DamageOutcome::Ignored;
        }

        if source.is_player() {
            self.removed = true;
            let item = EggItem::new(self.breed.clone(), self.hatch_time);
            tracing::debug!(
                egg = self.id,
                breed = %item.breed,
                hatch_time = item.hatch_time,
                "Egg harvested"
            );
            return DamageOutcome::Harvested(item);
        }

        if amount > config.fatal_damage {
            self.removed = true;
            tracing::debug!(egg = self.id, amount = %amount, "Egg destroyed");
            return DamageOutcome::Destroyed;
        }

        DamageOutcome::PassThrough(amount)
    }

    /// Hash of the full egg state, for desync detection.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.id.hash(&mut hasher);
        self.breed.hash(&mut hasher);
        self.hatch_time.hash(&mut hasher);
        self.transition.hash(&mut hasher);
        self.wiggle.hash(&mut hasher);
        self.position.hash(&mut hasher);
        self.velocity.hash(&mut hasher);
        self.no_gravity.hash(&mut hasher);
        self.custom_name.hash(&mut hasher);
        self.age.hash(&mut hasher);
        self.removed.hash(&mut hasher);
        hasher.finish()
    }

    fn resolve_breed<'r>(&self, registry: &'r BreedRegistry) -> &'r Breed {
        registry
            .get(&self.breed)
            .unwrap_or_else(|| registry.default_breed())
    }

    fn hatch<S: Replicator + ?Sized>(&mut self, sync: &mut S) -> JuvenileSpawn {
        sync.broadcast(EggEvent::Hatch);
        self.removed = true;
        tracing::debug!(egg = self.id, breed = %self.breed, age = self.age, "Egg hatched");
        JuvenileSpawn {
            breed: self.breed.clone(),
            position: self.position,
            custom_name: self.custom_name.clone(),
        }
    }

    fn apply_physics<W: EggWorld + ?Sized>(&mut self, ctx: &TickContext<'_, W>) {
        let config = ctx.config;
        if !self.no_gravity {
            self.velocity.y -= config.gravity;
        }

        let wanted = self.velocity;
        let motion = ctx.world.clip_motion(&self.bounds(config), wanted);
        if motion.x != wanted.x {
            self.velocity.x = Fixed::ZERO;
        }
        if motion.y != wanted.y {
            self.velocity.y = Fixed::ZERO;
        }
        if motion.z != wanted.z {
            self.velocity.z = Fixed::ZERO;
        }

        self.position = self.position + motion;
        self.velocity = self.velocity.scale(Vec3Fixed::new(
            config.horizontal_drag,
            config.vertical_drag,
            config.horizontal_drag,
        ));
    }
}
