//! Headless dragon egg nest runner.
//!
//! Runs scenarios without a host engine, reporting JSON on stdout.
//! Designed for CI determinism checks and batch tuning of egg data.
//!
//! # Usage
//!
//! ```bash
//! # Run one scenario and print its report
//! cargo run -p hatchery_headless -- run --scenario mixed_nest --seed 7
//!
//! # Run a batch of seeds in parallel
//! cargo run -p hatchery_headless -- batch --scenario mixed_nest --count 200 --output results/
//!
//! # Verify the same seed always produces the same state
//! cargo run -p hatchery_headless -- verify --scenario quick_hatch --runs 5
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hatchery_core::breeds::BreedRegistry;
use hatchery_core::config::EggConfig;
use hatchery_headless::{
    default_breed_data_dir, load_config, load_registry, run_batch, run_scenario,
    verify_determinism, BatchConfig, Scenario,
};

#[derive(Parser)]
#[command(name = "hatchery_headless")]
#[command(about = "Headless dragon egg nest runner for determinism checks and batch runs")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Data shared by every subcommand.
#[derive(Args)]
struct DataArgs {
    /// Built-in scenario name or path to a scenario RON file
    #[arg(short, long, default_value = "mixed_nest")]
    scenario: String,

    /// Directory of breed RON files
    #[arg(long)]
    breeds: Option<PathBuf>,

    /// Egg config RON file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scenario and print its report
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Override the scenario's tick limit
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Run a batch of seeds for tuning
    Batch {
        #[command(flatten)]
        data: DataArgs,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel runs (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        #[command(flatten)]
        data: DataArgs,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for reports)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Commands::Run { data, seed, ticks } => cmd_run(&data, seed, ticks),
        Commands::Batch {
            data,
            count,
            parallel,
            output,
            seed,
        } => cmd_batch(&data, count, parallel, output, seed),
        Commands::Verify { data, seed, runs } => cmd_verify(&data, seed, runs),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

type CmdResult = Result<ExitCode, Box<dyn std::error::Error>>;

/// Load scenario, breeds and config.
fn load_data(
    data: &DataArgs,
) -> Result<(Scenario, BreedRegistry, EggConfig), Box<dyn std::error::Error>> {
    let scenario = Scenario::resolve(&data.scenario)?;

    let breed_dir = match &data.breeds {
        Some(dir) => dir.clone(),
        None => default_breed_data_dir().ok_or("no breed data directory found; pass --breeds")?,
    };
    let registry = load_registry(&breed_dir, scenario.default_breed.as_deref())?;
    let config = load_config(data.config.as_deref())?;

    tracing::info!(
        scenario = %scenario.name,
        breeds = registry.len(),
        "Data loaded"
    );
    Ok((scenario, registry, config))
}

/// Run one scenario
fn cmd_run(data: &DataArgs, seed: u64, ticks: Option<u64>) -> CmdResult {
    let (mut scenario, registry, config) = load_data(data)?;
    if let Some(ticks) = ticks {
        scenario.max_ticks = ticks;
    }

    let report = run_scenario(&scenario, &registry, &config, seed)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.replica_divergences > 0 {
        tracing::warn!(
            divergences = report.replica_divergences,
            "Replicas disagreed with their authority"
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Run a batch of seeds
fn cmd_batch(data: &DataArgs, count: u32, parallel: u32, output: PathBuf, seed: u64) -> CmdResult {
    let (scenario, registry, config) = load_data(data)?;

    let batch_config = BatchConfig {
        parallel_runs: parallel,
        ..BatchConfig::new(&data.scenario, count)
            .with_output(output.clone())
            .with_seed(seed)
    };

    let results = run_batch(batch_config, &scenario, &registry, &config);
    let path = output.join(results_file_name(&scenario.name, seed));
    results.save(&path)?;
    tracing::info!("Results written to {}", path.display());

    println!("{}", serde_json::to_string_pretty(&results.summary)?);

    if results.errors.is_empty() && results.summary.divergent_runs == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Verify determinism
fn cmd_verify(data: &DataArgs, seed: u64, runs: u32) -> CmdResult {
    let (scenario, registry, config) = load_data(data)?;

    let outcome = verify_determinism(&scenario, &registry, &config, seed, runs)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if outcome.deterministic && outcome.replica_divergences == 0 {
        tracing::info!("Deterministic across {} runs", runs);
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!("Determinism check failed");
        Ok(ExitCode::FAILURE)
    }
}

fn results_file_name(scenario: &str, seed: u64) -> PathBuf {
    let slug: String = scenario
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    PathBuf::from(format!("batch_{slug}_{seed}.json"))
}
