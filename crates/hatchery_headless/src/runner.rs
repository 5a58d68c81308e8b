//! Headless nest simulation.
//!
//! Every scenario egg exists twice: an authoritative copy that makes all
//! timing decisions and a replica that only hears about them through
//! encoded [`SyncMessage`]s, the way a remote client would.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use hatchery_core::breeds::BreedRegistry;
use hatchery_core::config::EggConfig;
use hatchery_core::egg::{DamageOutcome, DamageSource, EggEntity, TickContext};
use hatchery_core::error::HatcheryError;
use hatchery_core::item::EggItem;
use hatchery_core::math::{Fixed, Vec3Fixed};
use hatchery_core::sync::{SyncMessage, SyncOutbox};
use hatchery_core::world::EntityId;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::metrics::{HarvestRecord, RunReport};
use crate::scenario::{DamageKind, Scenario, ScheduledDamage};
use crate::world::GridWorld;

/// Id of the player dealing scheduled player damage.
const SCENARIO_PLAYER: EntityId = 999;

/// Errors that stop a run.
#[derive(Error, Debug)]
pub enum RunError {
    /// A scenario egg names a breed the registry does not know.
    #[error("Scenario egg {index} names unknown breed '{breed}'")]
    UnknownBreed {
        /// Egg index.
        index: usize,
        /// Raw breed id.
        breed: String,
    },
    /// A message failed the wire round trip.
    #[error("Replication failed: {0}")]
    Replication(#[from] HatcheryError),
}

#[derive(Debug, Clone)]
struct EggSlot {
    authority: EggEntity,
    replica: EggEntity,
    outbox: SyncOutbox,
    despawned: bool,
}

/// A running nest.
#[derive(Debug, Clone)]
pub struct Nest<'a> {
    scenario: String,
    registry: &'a BreedRegistry,
    config: &'a EggConfig,
    world: GridWorld,
    eggs: Vec<EggSlot>,
    damage: Vec<ScheduledDamage>,
    authority_rng: StdRng,
    replica_rng: StdRng,
    tick: u64,
    report: RunReport,
}

impl<'a> Nest<'a> {
    /// Lay out a scenario.
    pub fn new(
        scenario: &Scenario,
        registry: &'a BreedRegistry,
        config: &'a EggConfig,
        seed: u64,
    ) -> Result<Self, RunError> {
        let mut eggs = Vec::with_capacity(scenario.eggs.len());
        for (index, placement) in scenario.eggs.iter().enumerate() {
            let breed = registry
                .require(&placement.breed)
                .map_err(|_| RunError::UnknownBreed {
                    index,
                    breed: placement.breed.clone(),
                })?;
            let item = EggItem::new(
                breed.id.clone(),
                placement.hatch_time.unwrap_or(config.default_hatch_time),
            );

            let (x, y, z) = placement.position;
            let half = Fixed::from_bits(1 << 31);
            let position = Vec3Fixed::new(
                Fixed::from_num(x) + half,
                Fixed::from_num(y),
                Fixed::from_num(z) + half,
            );

            let id = index as EntityId + 1;
            let mut authority = EggEntity::from_item(id, &item, registry, config, position);
            authority.set_custom_name(placement.name.clone());

            let mut replica = EggEntity::new(id, registry, config, position);
            for field in authority.synced_fields() {
                replica.apply_field(&field, registry, config);
            }

            eggs.push(EggSlot {
                authority,
                replica,
                outbox: SyncOutbox::new(),
                despawned: false,
            });
        }

        let mut damage = scenario.damage.clone();
        damage.sort_by_key(|d| d.tick);

        tracing::debug!(
            scenario = %scenario.name,
            eggs = eggs.len(),
            seed,
            "Nest laid out"
        );

        Ok(Self {
            scenario: scenario.name.clone(),
            registry,
            config,
            world: GridWorld::from_scenario(scenario),
            eggs,
            damage,
            authority_rng: StdRng::seed_from_u64(seed),
            replica_rng: StdRng::seed_from_u64(seed.rotate_left(32)),
            tick: 0,
            report: RunReport::new(scenario.name.clone(), seed),
        })
    }

    /// Current tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether any egg is still in the nest.
    #[must_use]
    pub fn has_live_eggs(&self) -> bool {
        self.eggs.iter().any(|slot| !slot.despawned)
    }

    /// Authoritative egg by scenario index.
    #[must_use]
    pub fn authority(&self, index: usize) -> Option<&EggEntity> {
        self.eggs.get(index).map(|slot| &slot.authority)
    }

    /// Replica egg by scenario index.
    #[must_use]
    pub fn replica(&self, index: usize) -> Option<&EggEntity> {
        self.eggs.get(index).map(|slot| &slot.replica)
    }

    /// Metrics so far.
    #[must_use]
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Advance every egg one tick.
    pub fn step(&mut self) -> Result<(), RunError> {
        self.tick += 1;
        self.apply_scheduled_damage();

        let ctx = TickContext::new(self.registry, &self.world, self.config);
        for (index, slot) in self.eggs.iter_mut().enumerate() {
            if slot.despawned {
                continue;
            }

            let result =
                slot.authority
                    .advance_authoritative(&ctx, &mut self.authority_rng, &mut slot.outbox);
            self.report.record_authority(index, self.tick, &result);

            let feedback = slot.replica.advance_replica(&ctx, &mut self.replica_rng);
            self.report.particles += feedback.particles.len() as u64;

            // Messages land after the replica's own tick, as they would
            // for a remote client.
            for message in slot.outbox.drain() {
                let bytes = message.encode()?;
                let decoded = SyncMessage::decode(&bytes)?;
                if let Some(sound) = slot.replica.apply(&decoded, self.registry, self.config) {
                    self.report.record_sound(sound);
                }
            }

            if slot.authority.is_removed() {
                slot.despawned = true;
                continue;
            }
            if slot.replica.breed() != slot.authority.breed()
                || slot.replica.transition().target() != slot.authority.transition().target()
            {
                self.report.replica_divergences += 1;
            }
        }

        Ok(())
    }

    /// Run until every egg is gone or `max_ticks` pass.
    pub fn run(mut self, max_ticks: u64) -> Result<RunReport, RunError> {
        while self.tick < max_ticks && self.has_live_eggs() {
            self.step()?;
        }

        self.report.ticks = self.tick;
        self.report.final_state_hash = self.state_hash();
        tracing::info!(
            scenario = %self.scenario,
            ticks = self.tick,
            hatches = self.report.hatches.len(),
            "Run finished"
        );
        Ok(self.report)
    }

    /// Hash of every egg on both sides.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        for slot in &self.eggs {
            slot.authority.state_hash().hash(&mut hasher);
            slot.replica.state_hash().hash(&mut hasher);
            slot.despawned.hash(&mut hasher);
        }
        hasher.finish()
    }

    fn apply_scheduled_damage(&mut self) {
        let due = self.damage.partition_point(|d| d.tick <= self.tick);
        for damage in self.damage.drain(..due) {
            let Some(slot) = self.eggs.get_mut(damage.egg) else {
                continue;
            };
            if slot.despawned {
                continue;
            }

            let source = match damage.source {
                DamageKind::Player => DamageSource::Player(SCENARIO_PLAYER),
                DamageKind::Creature => DamageSource::Entity(SCENARIO_PLAYER + 1),
                DamageKind::Environment => DamageSource::Environment,
            };

            match slot.authority.hurt(source, damage.amount, self.config) {
                DamageOutcome::Harvested(item) => {
                    self.report.harvested.push(HarvestRecord {
                        egg: damage.egg,
                        tick: self.tick,
                        item,
                    });
                    slot.despawned = true;
                }
                DamageOutcome::Destroyed => {
                    self.report.destroyed.push(damage.egg);
                    slot.despawned = true;
                }
                DamageOutcome::PassThrough(amount) => {
                    tracing::trace!(egg = damage.egg, %amount, "Damage passed through");
                }
                DamageOutcome::Ignored => {}
            }
        }
    }
}

/// Lay out and run a scenario in one call.
pub fn run_scenario(
    scenario: &Scenario,
    registry: &BreedRegistry,
    config: &EggConfig,
    seed: u64,
) -> Result<RunReport, RunError> {
    Nest::new(scenario, registry, config, seed)?.run(scenario.max_ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::EggPlacement;
    use hatchery_test_utils::fixtures::test_registry;

    fn single_egg(hatch_time: i32) -> Scenario {
        Scenario {
            eggs: vec![EggPlacement {
                breed: "fire".to_string(),
                position: (0, 64, 0),
                hatch_time: Some(hatch_time),
                name: Some("Ash".to_string()),
            }],
            max_ticks: 5_000,
            ..Scenario::quick_hatch()
        }
    }

    #[test]
    fn test_quick_hatch_runs_to_completion() {
        let registry = test_registry();
        let config = EggConfig::default();
        let report = run_scenario(&Scenario::quick_hatch(), &registry, &config, 7).unwrap();

        assert_eq!(report.hatches.len(), 1);
        assert_eq!(report.hatches[0].tick, 600);
        assert_eq!(report.ticks, 600);
        assert_eq!(report.replica_divergences, 0);
    }

    #[test]
    fn test_egg_lands_on_ground() {
        let registry = test_registry();
        let config = EggConfig::default();
        let mut nest = Nest::new(&Scenario::quick_hatch(), &registry, &config, 1).unwrap();
        for _ in 0..200 {
            nest.step().unwrap();
        }
        assert_eq!(nest.authority(0).unwrap().position().y, Fixed::from_num(64));
        assert_eq!(nest.replica(0).unwrap().position(), nest.authority(0).unwrap().position());
    }

    #[test]
    fn test_same_seed_same_hash() {
        let registry = test_registry();
        let config = EggConfig::default();
        let scenario = Scenario::mixed_nest();
        let a = Nest::new(&scenario, &registry, &config, 3).unwrap().run(3_000).unwrap();
        let b = Nest::new(&scenario, &registry, &config, 3).unwrap().run(3_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mixed_nest_changes_breeds() {
        let registry = test_registry();
        let config = EggConfig::default();
        let report = run_scenario(&Scenario::mixed_nest(), &registry, &config, 11).unwrap();

        let mut hatched: Vec<_> = report
            .hatches
            .iter()
            .map(|h| (h.egg, h.breed.as_str(), h.name.as_deref()))
            .collect();
        hatched.sort_unstable();
        assert_eq!(
            hatched,
            vec![
                (0, "ice", None),
                (1, "water", Some("Tide")),
                (2, "fire", None),
            ]
        );
        assert!(report.pushes > 0);
        assert_eq!(report.replica_divergences, 0);
    }

    #[test]
    fn test_scheduled_player_damage_harvests() {
        let registry = test_registry();
        let config = EggConfig::default();
        let mut scenario = single_egg(3_000);
        scenario.damage.push(ScheduledDamage {
            tick: 10,
            egg: 0,
            source: DamageKind::Player,
            amount: Fixed::ONE,
        });

        let report = run_scenario(&scenario, &registry, &config, 5).unwrap();
        assert_eq!(report.ticks, 10);
        assert!(report.hatches.is_empty());
        assert_eq!(report.harvested.len(), 1);
        assert_eq!(report.harvested[0].item.hatch_time, 3_000 - 9);
    }

    #[test]
    fn test_weak_hits_do_not_break_egg() {
        let registry = test_registry();
        let config = EggConfig::default();
        let mut scenario = single_egg(100);
        scenario.damage.push(ScheduledDamage {
            tick: 10,
            egg: 0,
            source: DamageKind::Creature,
            amount: Fixed::from_num(4),
        });
        scenario.damage.push(ScheduledDamage {
            tick: 20,
            egg: 0,
            source: DamageKind::Environment,
            amount: Fixed::from_num(4.01),
        });

        let report = run_scenario(&scenario, &registry, &config, 5).unwrap();
        assert_eq!(report.destroyed, vec![0]);
        assert_eq!(report.ticks, 20);
    }

    #[test]
    fn test_codec_errors_become_run_errors() {
        let decode_failure = || -> Result<SyncMessage, RunError> {
            Ok(SyncMessage::decode(&[0xff, 0xff, 0xff, 0xff])?)
        };
        assert!(matches!(
            decode_failure(),
            Err(RunError::Replication(HatcheryError::Serialization(_)))
        ));
    }

    #[test]
    fn test_unknown_scenario_breed() {
        let registry = test_registry();
        let config = EggConfig::default();
        let mut scenario = single_egg(100);
        scenario.eggs[0].breed = "storm".to_string();
        assert!(matches!(
            Nest::new(&scenario, &registry, &config, 0),
            Err(RunError::UnknownBreed { index: 0, .. })
        ));
    }
}
