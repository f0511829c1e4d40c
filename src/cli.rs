//! Command line interface for Chargedrift

use bevy::log::{Level, LogPlugin};
use clap::Parser;
use std::fmt;

use crate::config::{FieldSolver, SimulationConfig};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")");

/// CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// Configuration file could not be loaded
    ConfigLoad(String),
    /// Configuration is inconsistent after applying overrides
    InvalidConfig(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::ConfigLoad(msg) => write!(f, "Failed to load configuration: {msg}"),
            CliError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Chargedrift - charged particle trajectories with space charge
#[derive(Parser, Debug, Default)]
#[command(version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Number of time steps (overrides config file)
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub steps: Option<usize>,

    /// Time step length in seconds (overrides config file)
    #[arg(long, value_name = "SECONDS")]
    pub dt: Option<f64>,

    /// Number of parallel workers, 0 for all cores
    #[arg(short = 'w', long, value_name = "COUNT")]
    pub workers: Option<usize>,

    /// Random seed for ion generation and stochastic modifiers
    #[arg(short = 's', long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Space charge solver
    #[arg(long, value_name = "SOLVER")]
    pub solver: Option<FieldSolver>,

    /// Barnes-Hut opening angle
    #[arg(long, value_name = "THETA")]
    pub theta: Option<f64>,

    /// Scale of the space charge field, 0 disables space charge
    #[arg(long, value_name = "FACTOR")]
    pub space_charge_factor: Option<f64>,

    /// Stop the run after this many seconds of wall time
    #[arg(long, value_name = "SECONDS")]
    pub max_wall_time: Option<f64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Write the effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub save_config: Option<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Loads configuration from file or defaults, then applies command-line overrides
pub fn load_and_apply_config(args: &Args) -> Result<SimulationConfig, CliError> {
    let mut config = if let Some(config_path) = &args.config {
        println!("Loading configuration from: {config_path}");
        SimulationConfig::load(config_path).map_err(|err| CliError::ConfigLoad(err.to_string()))?
    } else {
        SimulationConfig::load_from_user_config()
    };

    if let Some(steps) = args.steps {
        println!("Overriding time steps to: {steps}");
        config.integration.time_steps = steps;
    }

    if let Some(dt) = args.dt {
        println!("Overriding time step length to: {dt:e} s");
        config.integration.dt = dt;
    }

    if let Some(workers) = args.workers {
        println!("Using {workers} workers");
        config.integration.worker_count = workers;
    }

    if let Some(seed) = args.seed {
        println!("Using random seed: {seed}");
        config.integration.seed = Some(seed);
    }

    if let Some(solver) = args.solver {
        println!("Using space charge solver: {solver:?}");
        config.space_charge.solver = solver;
    }

    if let Some(theta) = args.theta {
        println!("Overriding opening angle to: {theta}");
        config.space_charge.octree_theta = theta;
    }

    if let Some(factor) = args.space_charge_factor {
        println!("Overriding space charge factor to: {factor}");
        config.space_charge.factor = factor;
    }

    config
        .validate()
        .map_err(|err| CliError::InvalidConfig(err.to_string()))?;

    Ok(config)
}

/// Log subscriber settings; `verbose` enables debug output
pub fn log_plugin(verbose: bool) -> LogPlugin {
    LogPlugin {
        level: if verbose { Level::DEBUG } else { Level::INFO },
        filter: "bevy_tasks=warn".to_string(),
        ..Default::default()
    }
}
