//! Velocity Verlet integration method

use crate::physics::math::{Scalar, Vector};

/// Velocity Verlet update rules, split so that every position can be staged
/// before any particle moves:
/// 1. Stage position: x(t+dt) = x(t) + v(t)*dt + 0.5*a_prev*dt²
/// 2. Update velocity: v(t+dt) = v(t) + 0.5*(a_prev + a_new)*dt
///
/// With `a_new` taken at the staged position this is the classic second
/// order scheme. [`StepIntegrator`](super::StepIntegrator) evaluates `a_new`
/// on the field snapshot of the committed positions instead, which is exact
/// for constant forces and first order otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityVerlet;

impl VelocityVerlet {
    #[inline]
    pub fn stage_position(
        position: Vector,
        velocity: Vector,
        previous_acceleration: Vector,
        dt: Scalar,
    ) -> Vector {
        position + velocity * dt + previous_acceleration * (0.5 * dt * dt)
    }

    #[inline]
    pub fn advance_velocity(
        velocity: Vector,
        previous_acceleration: Vector,
        acceleration: Vector,
        dt: Scalar,
    ) -> Vector {
        velocity + (previous_acceleration + acceleration) * (0.5 * dt)
    }
}
