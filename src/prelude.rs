//! Chargedrift prelude module
//!
//! Re-exports the types most callers need to set up and run a simulation.

pub use crate::config::{FieldSolver, SimulationConfig};
pub use crate::error::{SimulationError, SimulationResult};
pub use crate::physics::aabb3d::Aabb3d;
pub use crate::physics::ensemble::ParticleEnsemble;
pub use crate::physics::field::{
    FieldEvaluator, FullSumFieldEvaluator, SpatialChargeIndex, create_field_evaluator,
};
pub use crate::physics::force::{ElectrostaticForce, ForceLaw};
pub use crate::physics::integrators::{
    ActionContext, RunControl, RunState, StepEvent, StepIntegrator,
};
pub use crate::physics::math::{Scalar, Vector};
pub use crate::physics::modifiers::{
    HardSphereCollisions, ModifierChain, NoModifier, PhysicsModifier,
};
pub use crate::physics::particle::{Particle, ParticleId};
pub use crate::physics::random::{RandomSource, RandomStreamPool};
pub use crate::tracking::{ParticleStartSplatTracker, ParticleState};
