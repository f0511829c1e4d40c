//! Chargedrift library
//!
//! Charged particle trajectory simulation: a Barnes-Hut space charge
//! solver, a parallel velocity Verlet integrator with pluggable physics
//! hooks and start / splat bookkeeping.

pub mod cli;
pub mod config;
pub mod error;
pub mod physics;
pub mod prelude;
pub mod simulation;
pub mod tracking;

// Re-export commonly used items
pub use config::SimulationConfig;
pub use error::{SimulationError, SimulationResult};
pub use physics::{
    integrators,
    math::{Scalar, Vector},
};
pub use prelude::*;
