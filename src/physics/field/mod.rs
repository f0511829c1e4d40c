//! Space charge field evaluation
//!
//! A field evaluator is built once per step from the committed particle
//! state and is then queried read-only, from many workers at once, for the
//! electric field acting on each particle.

pub mod full_sum;
pub mod octree;

use crate::config::{FieldSolver, SpaceChargeConfig};
use crate::error::SimulationResult;
use crate::physics::math::Vector;
use crate::physics::particle::{Particle, ParticleId};

pub use full_sum::FullSumFieldEvaluator;
pub use octree::{OctreeStats, SpatialChargeIndex};

/// Capability shared by every space charge solver
pub trait FieldEvaluator: Send + Sync {
    /// Rebuild from the active particles of `particles`, discarding the previous state
    fn build(&mut self, particles: &[Particle]);

    /// Electric field at `point`, ignoring the contribution of `exclude`
    fn field_at(&self, point: Vector, exclude: Option<ParticleId>) -> Vector;

    /// Field acting on `particle` from all other particles
    fn field_on(&self, particle: &Particle) -> Vector {
        self.field_at(particle.position, Some(particle.id))
    }

    /// Number of charges the evaluator was built from
    fn source_count(&self) -> usize;

    fn name(&self) -> &str;
}

pub fn create_field_evaluator(
    config: &SpaceChargeConfig,
) -> SimulationResult<Box<dyn FieldEvaluator>> {
    match config.solver {
        FieldSolver::Octree => Ok(Box::new(
            SpatialChargeIndex::new(config.octree_theta, config.octree_leaf_capacity)?
                .with_min_region_size(config.octree_min_region_size)?,
        )),
        FieldSolver::FullSum => Ok(Box::new(FullSumFieldEvaluator::new())),
    }
}
