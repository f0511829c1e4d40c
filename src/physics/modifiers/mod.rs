//! Pluggable physics hooks run inside every integration step
//!
//! The integrator calls the hook methods in a fixed order for each active
//! particle: `update_particle_parameters`, `modify_acceleration` and
//! `modify_velocity` from the parallel phase, then `modify_position` from the
//! sequential phase. All methods default to no-ops, so a modifier only
//! overrides what it needs.

pub mod hard_sphere;

use crate::physics::math::{Scalar, Vector};
use crate::physics::particle::Particle;
use crate::physics::random::RandomSource;

pub use hard_sphere::HardSphereCollisions;

pub trait PhysicsModifier: Send + Sync {
    /// Called once per step before any particle is processed
    fn update_step_parameters(&mut self, _step: u64, _time: Scalar) {}

    fn update_particle_parameters(&self, _particle: &mut Particle) {}

    fn modify_acceleration(
        &self,
        _acceleration: &mut Vector,
        _particle: &mut Particle,
        _dt: Scalar,
        _rng: &mut dyn RandomSource,
    ) {
    }

    fn modify_velocity(&self, _particle: &mut Particle, _dt: Scalar, _rng: &mut dyn RandomSource) {}

    fn modify_position(
        &self,
        _staged_position: &mut Vector,
        _particle: &mut Particle,
        _dt: Scalar,
        _rng: &mut dyn RandomSource,
    ) {
    }

    fn name(&self) -> &str;
}

/// Modifier that leaves every particle untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModifier;

impl PhysicsModifier for NoModifier {
    fn name(&self) -> &str {
        "none"
    }
}

/// Runs several modifiers in insertion order
#[derive(Default)]
pub struct ModifierChain {
    modifiers: Vec<Box<dyn PhysicsModifier>>,
}

impl ModifierChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, modifier: impl PhysicsModifier + 'static) -> Self {
        self.modifiers.push(Box::new(modifier));
        self
    }

    pub fn push(&mut self, modifier: Box<dyn PhysicsModifier>) {
        self.modifiers.push(modifier);
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

impl PhysicsModifier for ModifierChain {
    fn update_step_parameters(&mut self, step: u64, time: Scalar) {
        for modifier in &mut self.modifiers {
            modifier.update_step_parameters(step, time);
        }
    }

    fn update_particle_parameters(&self, particle: &mut Particle) {
        for modifier in &self.modifiers {
            modifier.update_particle_parameters(particle);
        }
    }

    fn modify_acceleration(
        &self,
        acceleration: &mut Vector,
        particle: &mut Particle,
        dt: Scalar,
        rng: &mut dyn RandomSource,
    ) {
        for modifier in &self.modifiers {
            modifier.modify_acceleration(acceleration, particle, dt, rng);
        }
    }

    fn modify_velocity(&self, particle: &mut Particle, dt: Scalar, rng: &mut dyn RandomSource) {
        for modifier in &self.modifiers {
            modifier.modify_velocity(particle, dt, rng);
        }
    }

    fn modify_position(
        &self,
        staged_position: &mut Vector,
        particle: &mut Particle,
        dt: Scalar,
        rng: &mut dyn RandomSource,
    ) {
        for modifier in &self.modifiers {
            modifier.modify_position(staged_position, particle, dt, rng);
        }
    }

    fn name(&self) -> &str {
        "chain"
    }
}

impl std::fmt::Debug for ModifierChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.modifiers.iter().map(|modifier| modifier.name()))
            .finish()
    }
}
