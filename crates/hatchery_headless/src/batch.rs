//! Batch nest runner.
//!
//! Runs one scenario over many seeds in parallel using rayon, and checks
//! that repeated runs of one seed agree.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use hatchery_core::breeds::BreedRegistry;
use hatchery_core::config::EggConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, RunReport};
use crate::runner::run_scenario;
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario name or path, for the record
    pub scenario: String,
    /// Number of runs
    pub run_count: u32,
    /// Worker threads (0 = use rayon default)
    pub parallel_runs: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Seed of the first run; later runs count up from it
    pub seed_start: u64,
    /// Tick limit per run (0 = the scenario's own limit)
    pub max_ticks: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "mixed_nest".to_string(),
            run_count: 100,
            parallel_runs: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_ticks: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: &str, run_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            run_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual run reports, in seed order
    pub runs: Vec<RunReport>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Run index
    pub run_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Run a batch of seeds
pub fn run_batch(
    config: BatchConfig,
    scenario: &Scenario,
    registry: &BreedRegistry,
    egg_config: &EggConfig,
) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        "Starting batch run: {} runs of '{}'",
        config.run_count, scenario.name
    );

    let mut scenario = scenario.clone();
    if config.max_ticks > 0 {
        scenario.max_ticks = config.max_ticks;
    }

    let run_all = || -> Vec<Result<RunReport, BatchError>> {
        (0..config.run_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                match run_scenario(&scenario, registry, egg_config, seed) {
                    Ok(report) => {
                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        if done % 10 == 0 {
                            debug!("Progress: {}/{}", done, config.run_count);
                        }
                        Ok(report)
                    }
                    Err(e) => {
                        warn!("Run {} failed: {}", i, e);
                        Err(BatchError {
                            run_index: i,
                            seed,
                            message: e.to_string(),
                        })
                    }
                }
            })
            .collect()
    };

    let results = if config.parallel_runs > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_runs as usize)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                warn!("Failed to build thread pool: {}, using global pool", e);
                run_all()
            }
        }
    } else {
        run_all()
    };

    let (runs, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let runs: Vec<RunReport> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_reports(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} runs in {:.1}s",
        runs.len(),
        duration_seconds
    );

    BatchResults {
        config,
        runs,
        summary,
        duration_seconds,
        errors,
    }
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    /// Whether every run matched.
    pub deterministic: bool,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// Replica divergences summed over runs.
    pub replica_divergences: u32,
}

/// Run one seed `runs` times and compare final state hashes.
pub fn verify_determinism(
    scenario: &Scenario,
    registry: &BreedRegistry,
    egg_config: &EggConfig,
    seed: u64,
    runs: u32,
) -> Result<VerifyOutcome, crate::runner::RunError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    let mut replica_divergences = 0;
    for _ in 0..runs {
        let report = run_scenario(scenario, registry, egg_config, seed)?;
        hashes.push(report.final_state_hash);
        replica_divergences += report.replica_divergences;
    }

    Ok(VerifyOutcome {
        deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        replica_divergences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hatchery_test_utils::fixtures::test_registry;

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("custom", 50)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345);

        assert_eq!(config.scenario, "custom");
        assert_eq!(config.run_count, 50);
        assert_eq!(config.seed_start, 12345);
    }

    #[test]
    fn test_run_batch_small() {
        let registry = test_registry();
        let results = run_batch(
            BatchConfig::new("quick_hatch", 8),
            &Scenario::quick_hatch(),
            &registry,
            &EggConfig::default(),
        );

        assert_eq!(results.runs.len(), 8);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.hatched_by_breed.get("fire"), Some(&8));
        let seeds: Vec<_> = results.runs.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, (0..8).collect::<Vec<u64>>());
    }

    #[test]
    fn test_batch_respects_tick_override() {
        let registry = test_registry();
        let config = BatchConfig {
            max_ticks: 50,
            parallel_runs: 2,
            ..BatchConfig::new("quick_hatch", 3)
        };
        let results = run_batch(config, &Scenario::quick_hatch(), &registry, &EggConfig::default());
        assert!(results.runs.iter().all(|r| r.ticks == 50 && r.hatches.is_empty()));
    }

    #[test]
    fn test_verify_determinism() {
        let registry = test_registry();
        let outcome = verify_determinism(
            &Scenario::quick_hatch(),
            &registry,
            &EggConfig::default(),
            12345,
            3,
        )
        .unwrap();
        assert!(outcome.deterministic);
        assert_eq!(outcome.hashes.len(), 3);
        assert_eq!(outcome.replica_divergences, 0);
    }

    #[test]
    fn test_batch_results_save_load() {
        let registry = test_registry();
        let results = run_batch(
            BatchConfig::new("quick_hatch", 2),
            &Scenario::quick_hatch(),
            &registry,
            &EggConfig::default(),
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.runs, results.runs);
        assert_eq!(loaded.config.scenario, "quick_hatch");
    }
}
