//! Run metrics collection.
//!
//! Everything a headless run observed, in a JSON-friendly shape.

use std::collections::BTreeMap;

use hatchery_core::egg::AuthorityTick;
use hatchery_core::feedback::SoundCue;
use hatchery_core::item::EggItem;
use serde::{Deserialize, Serialize};

/// A hatch observed on the authoritative side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HatchRecord {
    /// Index of the egg in the scenario.
    pub egg: usize,
    /// Tick it hatched.
    pub tick: u64,
    /// Breed of the hatchling.
    pub breed: String,
    /// Hatchling name, if any.
    pub name: Option<String>,
}

/// A breed transition started or committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Index of the egg in the scenario.
    pub egg: usize,
    /// Tick of the change.
    pub tick: u64,
    /// Target breed.
    pub target: String,
    /// `false` when started, `true` when committed.
    pub committed: bool,
}

/// An egg harvested by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRecord {
    /// Index of the egg in the scenario.
    pub egg: usize,
    /// Tick of the harvest.
    pub tick: u64,
    /// The dropped item.
    pub item: EggItem,
}

/// Complete metrics for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario name.
    pub scenario: String,
    /// Seed used.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Hatches in order.
    pub hatches: Vec<HatchRecord>,
    /// Transition starts and commits in order.
    pub transitions: Vec<TransitionRecord>,
    /// Harvested eggs.
    pub harvested: Vec<HarvestRecord>,
    /// Indices of eggs destroyed by damage.
    pub destroyed: Vec<usize>,
    /// Wiggle events broadcast.
    pub wiggles: u32,
    /// Crack sounds played by replicas.
    pub cracks: u32,
    /// Particles emitted by replicas.
    pub particles: u64,
    /// Egg-ticks in which some creature was pushed.
    pub pushes: u64,
    /// Ticks in which a replica's breed or transition target disagreed
    /// with its authority after delivery.
    pub replica_divergences: u32,
    /// Final state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl RunReport {
    /// Empty report for a run.
    #[must_use]
    pub fn new(scenario: impl Into<String>, seed: u64) -> Self {
        Self {
            scenario: scenario.into(),
            seed,
            ..Default::default()
        }
    }

    /// Record the authoritative side of one egg tick.
    pub fn record_authority(&mut self, egg: usize, tick: u64, result: &AuthorityTick) {
        if !result.pushed.is_empty() {
            self.pushes += 1;
        }
        if let Some(target) = &result.committed_breed {
            self.transitions.push(TransitionRecord {
                egg,
                tick,
                target: target.to_string(),
                committed: true,
            });
        }
        if let Some(target) = &result.began_transition {
            self.transitions.push(TransitionRecord {
                egg,
                tick,
                target: target.to_string(),
                committed: false,
            });
        }
        if result.wiggled {
            self.wiggles += 1;
        }
        if let Some(spawn) = &result.hatched {
            self.hatches.push(HatchRecord {
                egg,
                tick,
                breed: spawn.breed.to_string(),
                name: spawn.custom_name.clone(),
            });
        }
    }

    /// Record a sound a replica played.
    pub fn record_sound(&mut self, sound: SoundCue) {
        if sound == SoundCue::Crack {
            self.cracks += 1;
        }
    }
}

/// Aggregate over many runs of one scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs that completed.
    pub runs: u32,
    /// Hatchlings per breed.
    pub hatched_by_breed: BTreeMap<String, u32>,
    /// Committed transitions per target breed.
    pub transitions_by_breed: BTreeMap<String, u32>,
    /// Eggs harvested.
    pub harvested: u32,
    /// Eggs destroyed.
    pub destroyed: u32,
    /// Mean hatch tick across all hatches.
    pub mean_hatch_tick: f64,
    /// Mean wiggles per run.
    pub mean_wiggles: f64,
    /// Runs with any replica divergence.
    pub divergent_runs: u32,
}

impl BatchSummary {
    /// Summarize a set of run reports.
    #[must_use]
    pub fn from_reports(reports: &[RunReport]) -> Self {
        let mut summary = Self {
            runs: reports.len() as u32,
            ..Default::default()
        };

        let mut hatch_ticks = 0u64;
        let mut hatch_count = 0u64;
        let mut wiggles = 0u64;

        for report in reports {
            for hatch in &report.hatches {
                *summary
                    .hatched_by_breed
                    .entry(hatch.breed.clone())
                    .or_insert(0) += 1;
                hatch_ticks += hatch.tick;
                hatch_count += 1;
            }
            for transition in report.transitions.iter().filter(|t| t.committed) {
                *summary
                    .transitions_by_breed
                    .entry(transition.target.clone())
                    .or_insert(0) += 1;
            }
            summary.harvested += report.harvested.len() as u32;
            summary.destroyed += report.destroyed.len() as u32;
            wiggles += u64::from(report.wiggles);
            if report.replica_divergences > 0 {
                summary.divergent_runs += 1;
            }
        }

        if hatch_count > 0 {
            summary.mean_hatch_tick = hatch_ticks as f64 / hatch_count as f64;
        }
        if !reports.is_empty() {
            summary.mean_wiggles = wiggles as f64 / reports.len() as f64;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hatchery_core::breeds::BreedId;
    use hatchery_core::egg::JuvenileSpawn;
    use hatchery_core::math::Vec3Fixed;

    fn hatch(breed: &str) -> AuthorityTick {
        AuthorityTick {
            hatched: Some(JuvenileSpawn {
                breed: BreedId::parse(breed).unwrap(),
                position: Vec3Fixed::ZERO,
                custom_name: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_record_authority_collects_events() {
        let mut report = RunReport::new("test", 1);
        report.record_authority(
            0,
            5,
            &AuthorityTick {
                pushed: vec![1000],
                began_transition: BreedId::parse("ice"),
                wiggled: true,
                ..Default::default()
            },
        );
        report.record_authority(0, 9, &hatch("ice"));
        report.record_sound(SoundCue::Crack);
        report.record_sound(SoundCue::Hatch);

        assert_eq!(report.pushes, 1);
        assert_eq!(report.wiggles, 1);
        assert_eq!(report.cracks, 1);
        assert_eq!(report.transitions.len(), 1);
        assert!(!report.transitions[0].committed);
        assert_eq!(report.hatches[0].tick, 9);
    }

    #[test]
    fn test_summary_aggregates() {
        let mut a = RunReport::new("test", 1);
        a.record_authority(0, 100, &hatch("fire"));
        let mut b = RunReport::new("test", 2);
        b.record_authority(0, 300, &hatch("fire"));
        b.record_authority(1, 200, &hatch("ice"));
        b.replica_divergences = 2;

        let summary = BatchSummary::from_reports(&[a, b]);
        assert_eq!(summary.runs, 2);
        assert_eq!(summary.hatched_by_breed.get("fire"), Some(&2));
        assert_eq!(summary.hatched_by_breed.get("ice"), Some(&1));
        assert!((summary.mean_hatch_tick - 200.0).abs() < f64::EPSILON);
        assert_eq!(summary.divergent_runs, 1);
    }
}
