//! Force laws turning fields into particle accelerations

use crate::physics::aabb3d::Aabb3d;
use crate::physics::field::FieldEvaluator;
use crate::physics::math::{Scalar, Vector};
use crate::physics::particle::Particle;

/// Acceleration of a particle at its current position.
///
/// Called concurrently from the parallel phase of a step, once per active
/// particle. A particle the law is not defined for (outside the simulation
/// domain, say) is deactivated here instead of failing the run.
pub trait ForceLaw: Send + Sync {
    fn acceleration(
        &self,
        particle: &mut Particle,
        field: &dyn FieldEvaluator,
        time: Scalar,
        step: u64,
    ) -> Vector;
}

impl<F> ForceLaw for F
where
    F: Fn(&mut Particle, &dyn FieldEvaluator, Scalar, u64) -> Vector + Send + Sync,
{
    fn acceleration(
        &self,
        particle: &mut Particle,
        field: &dyn FieldEvaluator,
        time: Scalar,
        step: u64,
    ) -> Vector {
        self(particle, field, time, step)
    }
}

/// Uniform external field plus scaled space charge, inside a box shaped domain
#[derive(Debug, Clone, PartialEq)]
pub struct ElectrostaticForce {
    pub uniform_field: Vector,
    pub space_charge_factor: Scalar,
    pub domain: Option<Aabb3d>,
}

impl ElectrostaticForce {
    pub fn new(uniform_field: Vector, space_charge_factor: Scalar) -> Self {
        Self {
            uniform_field,
            space_charge_factor,
            domain: None,
        }
    }

    /// Particles leaving `domain` are deactivated
    pub fn with_domain(mut self, domain: Aabb3d) -> Self {
        self.domain = Some(domain);
        self
    }
}

impl ForceLaw for ElectrostaticForce {
    fn acceleration(
        &self,
        particle: &mut Particle,
        field: &dyn FieldEvaluator,
        _time: Scalar,
        _step: u64,
    ) -> Vector {
        if self
            .domain
            .is_some_and(|domain| !domain.contains(particle.position))
        {
            particle.deactivate();
            return Vector::ZERO;
        }

        let mut total_field = self.uniform_field;
        if self.space_charge_factor != 0.0 {
            total_field += field.field_on(particle) * self.space_charge_factor;
        }

        total_field * (particle.charge / particle.mass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::field::FullSumFieldEvaluator;
    use crate::physics::particle::ParticleId;

    #[test]
    fn test_uniform_field_acceleration() {
        let force = ElectrostaticForce::new(Vector::new(10.0, 0.0, 0.0), 0.0);
        let mut particle = Particle::new(Vector::ZERO, Vector::ZERO, 2.0, 3.0);
        let field = FullSumFieldEvaluator::new();

        let acceleration = force.acceleration(&mut particle, &field, 0.0, 0);
        assert_eq!(acceleration, Vector::new(15.0, 0.0, 0.0));
    }

    #[test]
    fn test_leaving_domain_deactivates() {
        let force =
            ElectrostaticForce::new(Vector::X, 1.0).with_domain(Aabb3d::cube(Vector::ZERO, 2.0));
        let mut particle = Particle::new(Vector::new(1.5, 0.0, 0.0), Vector::ZERO, 1.0, 1.0);
        let field = FullSumFieldEvaluator::new();

        let acceleration = force.acceleration(&mut particle, &field, 0.0, 0);
        assert_eq!(acceleration, Vector::ZERO);
        assert!(!particle.is_active());
    }

    #[test]
    fn test_space_charge_is_scaled() {
        let mut particles = vec![
            Particle::new(Vector::ZERO, Vector::ZERO, 1.0, 1e-9),
            Particle::new(Vector::new(1.0, 0.0, 0.0), Vector::ZERO, 1.0, 1e-9),
        ];
        particles[1].id = ParticleId(1);
        let mut field = FullSumFieldEvaluator::new();
        field.build(&particles);

        let full = ElectrostaticForce::new(Vector::ZERO, 1.0)
            .acceleration(&mut particles[0], &field, 0.0, 0);
        let half = ElectrostaticForce::new(Vector::ZERO, 0.5)
            .acceleration(&mut particles[0], &field, 0.0, 0);

        assert!(full.x < 0.0);
        assert!((half - full * 0.5).length() < 1e-12 * full.length());
    }

    #[test]
    fn test_closures_are_force_laws() {
        let gravity = |_: &mut Particle, _: &dyn FieldEvaluator, _: Scalar, _: u64| {
            Vector::new(0.0, 0.0, -9.81)
        };
        let mut particle = Particle::new(Vector::ZERO, Vector::ZERO, 1.0, 0.0);
        let field = FullSumFieldEvaluator::new();

        assert_eq!(gravity.acceleration(&mut particle, &field, 0.0, 0).z, -9.81);
    }
}
