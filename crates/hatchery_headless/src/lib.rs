//! Headless nest runner for determinism checks and batch runs.
//!
//! Lays out a scenario of dragon eggs on flat terrain and runs each egg as
//! an authoritative/replica pair joined by the encoded sync stream. This
//! enables:
//!
//! - **Determinism checks**: the same seed must reproduce the same final
//!   state hash
//! - **Replica checks**: replicas must track their authority's breed and
//!   transition target tick for tick
//! - **Batch runs**: many seeds in parallel, summarized as JSON
//!
//! # Output
//!
//! - **stdout**: Reports (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Run a built-in scenario
//! cargo run -p hatchery_headless -- run --scenario mixed_nest --seed 7
//!
//! # Verify determinism
//! cargo run -p hatchery_headless -- verify --scenario scenarios/frozen_lake.ron --runs 5
//! ```

pub mod batch;
pub mod breed_loader;
pub mod metrics;
pub mod runner;
pub mod scenario;
pub mod world;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, VerifyOutcome};
pub use breed_loader::{default_breed_data_dir, load_config, load_registry, BreedLoadError};
pub use metrics::{BatchSummary, RunReport};
pub use runner::{run_scenario, Nest, RunError};
pub use scenario::{Scenario, ScenarioError};
pub use world::GridWorld;
