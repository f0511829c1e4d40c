use crate::physics::random::RandomSource;

/// Scalar type for physics calculations (f64 for precision)
pub type Scalar = f64;

/// 3D vector type for positions, velocities, fields and accelerations
pub type Vector = bevy::math::DVec3;

/// Coulomb constant 1 / (4 pi epsilon_0) in N m^2 / C^2
pub const COULOMB_CONSTANT: Scalar = 8.987_551_792_3e9;

/// Elementary charge in C
pub const ELEMENTARY_CHARGE: Scalar = 1.602_176_634e-19;

/// Unified atomic mass unit in kg
pub const AMU_TO_KG: Scalar = 1.660_539_066_60e-27;

/// Boltzmann constant in J / K
pub const BOLTZMANN_CONSTANT: Scalar = 1.380_649e-23;

pub const ANGSTROM: Scalar = 1e-10;

/// Electric field at `point` caused by a point charge `charge` sitting at `source`.
///
/// Returns zero when the two points coincide instead of diverging.
#[inline]
pub fn coulomb_field(point: Vector, source: Vector, charge: Scalar) -> Vector {
    let separation = point - source;
    let distance_squared = separation.length_squared();

    if distance_squared == 0.0 {
        return Vector::ZERO;
    }

    let distance = distance_squared.sqrt();
    separation * (COULOMB_CONSTANT * charge / (distance_squared * distance))
}

/// Uniformly distributed direction on the unit sphere
pub fn random_unit_vector(rng: &mut dyn RandomSource) -> Vector {
    let theta = rng.uniform() * 2.0 * std::f64::consts::PI;
    let phi = libm::acos(rng.uniform() * 2.0 - 1.0);

    Vector::new(
        libm::sin(phi) * libm::cos(theta),
        libm::sin(phi) * libm::sin(theta),
        libm::cos(phi),
    )
}
