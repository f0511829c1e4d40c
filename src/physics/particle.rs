//! Charged point particle state

use crate::physics::math::{AMU_TO_KG, ELEMENTARY_CHARGE, Scalar, Vector};
use std::fmt;

/// Stable handle of a particle: its insertion index in the ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleId(pub usize);

impl ParticleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A charged point particle.
///
/// Particles are never removed while a run is in progress. A particle that
/// leaves the simulation domain or is consumed by a modifier is deactivated
/// in place and skipped from then on.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Assigned by [`ParticleEnsemble::insert`](crate::physics::ensemble::ParticleEnsemble::insert)
    pub id: ParticleId,
    pub position: Vector,
    pub velocity: Vector,
    /// Mass in kg
    pub mass: Scalar,
    /// Charge in C
    pub charge: Scalar,
    pub active: bool,
    pub time_of_birth: Scalar,
    /// Collision diameter in m
    pub diameter: Scalar,
    /// Global index assigned by the start / splat tracker
    pub global_index: Option<usize>,
}

impl Particle {
    pub fn new(position: Vector, velocity: Vector, mass: Scalar, charge: Scalar) -> Self {
        Self {
            id: ParticleId(0),
            position,
            velocity,
            mass,
            charge,
            active: true,
            time_of_birth: 0.0,
            diameter: 0.0,
            global_index: None,
        }
    }

    /// Ion at rest with charge given in elementary charges and mass in amu
    pub fn ion(position: Vector, charge_elementary: Scalar, mass_amu: Scalar) -> Self {
        Self::new(
            position,
            Vector::ZERO,
            mass_amu * AMU_TO_KG,
            charge_elementary * ELEMENTARY_CHARGE,
        )
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_time_of_birth(mut self, time_of_birth: Scalar) -> Self {
        self.time_of_birth = time_of_birth;
        self
    }

    pub fn with_diameter(mut self, diameter: Scalar) -> Self {
        self.diameter = diameter;
        self
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    #[inline]
    pub fn mass_amu(&self) -> Scalar {
        self.mass / AMU_TO_KG
    }

    #[inline]
    pub fn charge_elementary(&self) -> Scalar {
        self.charge / ELEMENTARY_CHARGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ion_unit_conversion() {
        let ion = Particle::ion(Vector::ZERO, 2.0, 100.0);

        assert!((ion.mass_amu() - 100.0).abs() < 1e-9);
        assert!((ion.charge_elementary() - 2.0).abs() < 1e-12);
        assert!(ion.is_active());
        assert_eq!(ion.velocity, Vector::ZERO);
    }

    #[test]
    fn test_builders() {
        let particle = Particle::new(Vector::ONE, Vector::ZERO, 1.0, 1.0)
            .with_velocity(Vector::X)
            .with_time_of_birth(0.5)
            .with_diameter(3e-10);

        assert_eq!(particle.velocity, Vector::X);
        assert_eq!(particle.time_of_birth, 0.5);
        assert_eq!(particle.diameter, 3e-10);
        assert_eq!(particle.global_index, None);
    }

    #[test]
    fn test_deactivate() {
        let mut particle = Particle::new(Vector::ZERO, Vector::ZERO, 1.0, 1.0);
        particle.deactivate();
        assert!(!particle.is_active());
    }
}
