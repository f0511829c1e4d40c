//! Elastic hard sphere collisions with a thermal background gas

use super::PhysicsModifier;
use crate::config::BackgroundGasConfig;
use crate::error::{SimulationError, SimulationResult};
use crate::physics::math::{
    AMU_TO_KG, ANGSTROM, BOLTZMANN_CONSTANT, Scalar, Vector, random_unit_vector,
};
use crate::physics::particle::Particle;
use crate::physics::random::RandomSource;
use bevy::log::warn;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};

/// Background gas collision model.
///
/// A particle moving at speed `|v|` through gas of number density `n`
/// collides within one step with probability `n * sigma * |v| * dt`, where
/// `sigma` is the hard sphere cross section of particle and gas molecule.
/// Probabilities above one are clamped and reported once per modifier.
#[derive(Debug)]
pub struct HardSphereCollisions {
    gas_number_density: Scalar,
    gas_mass: Scalar,
    gas_diameter: Scalar,
    /// Standard deviation of each gas velocity component
    gas_thermal_speed: Scalar,
    clamp_reported: AtomicBool,
}

impl HardSphereCollisions {
    pub fn new(
        pressure_pa: Scalar,
        temperature_k: Scalar,
        gas_mass_amu: Scalar,
        gas_diameter_angstrom: Scalar,
    ) -> SimulationResult<Self> {
        let valid = pressure_pa >= 0.0
            && temperature_k > 0.0
            && gas_mass_amu > 0.0
            && gas_diameter_angstrom > 0.0;
        if !valid {
            return Err(SimulationError::InvalidConfiguration(format!(
                "background gas needs p >= 0, T > 0, m > 0 and d > 0 (got p = {pressure_pa}, \
                 T = {temperature_k}, m = {gas_mass_amu}, d = {gas_diameter_angstrom})"
            )));
        }

        let gas_mass = gas_mass_amu * AMU_TO_KG;
        Ok(Self {
            gas_number_density: pressure_pa / (BOLTZMANN_CONSTANT * temperature_k),
            gas_mass,
            gas_diameter: gas_diameter_angstrom * ANGSTROM,
            gas_thermal_speed: (BOLTZMANN_CONSTANT * temperature_k / gas_mass).sqrt(),
            clamp_reported: AtomicBool::new(false),
        })
    }

    pub fn from_config(config: &BackgroundGasConfig) -> SimulationResult<Self> {
        Self::new(
            config.pressure_pa,
            config.temperature_k,
            config.gas_mass_amu,
            config.gas_diameter_angstrom,
        )
    }

    pub fn gas_number_density(&self) -> Scalar {
        self.gas_number_density
    }

    pub fn cross_section(&self, particle_diameter: Scalar) -> Scalar {
        let radius_sum = 0.5 * (particle_diameter + self.gas_diameter);
        PI * radius_sum * radius_sum
    }

    /// Collision probability within `dt`, clamped to [0, 1]
    pub fn collision_probability(&self, particle: &Particle, dt: Scalar) -> Scalar {
        let probability = self.gas_number_density
            * self.cross_section(particle.diameter)
            * particle.velocity.length()
            * dt;

        if probability > 1.0 {
            if !self.clamp_reported.swap(true, Ordering::Relaxed) {
                warn!(
                    "Collision probability {probability:.3} per step exceeds 1 and is clamped; \
                     the time step is too long for the gas mean free path"
                );
            }
            1.0
        } else {
            probability
        }
    }

    pub fn clamp_reported(&self) -> bool {
        self.clamp_reported.load(Ordering::Relaxed)
    }

    /// Post-collision particle velocity for an elastic collision with a gas
    /// molecule moving at `gas_velocity`, scattered into `direction` in the
    /// centre of mass frame
    pub fn scatter(
        &self,
        velocity: Vector,
        mass: Scalar,
        gas_velocity: Vector,
        direction: Vector,
    ) -> Vector {
        let total_mass = mass + self.gas_mass;
        let center_of_mass_velocity = (velocity * mass + gas_velocity * self.gas_mass) / total_mass;
        let relative_speed = (velocity - gas_velocity).length();

        center_of_mass_velocity + direction * (relative_speed * self.gas_mass / total_mass)
    }

    fn sample_gas_velocity(&self, rng: &mut dyn RandomSource) -> Vector {
        Vector::new(rng.normal(), rng.normal(), rng.normal()) * self.gas_thermal_speed
    }
}

impl PhysicsModifier for HardSphereCollisions {
    fn modify_velocity(&self, particle: &mut Particle, dt: Scalar, rng: &mut dyn RandomSource) {
        let probability = self.collision_probability(particle, dt);
        if probability <= 0.0 || rng.uniform() >= probability {
            return;
        }

        let gas_velocity = self.sample_gas_velocity(rng);
        let direction = random_unit_vector(rng);
        particle.velocity = self.scatter(particle.velocity, particle.mass, gas_velocity, direction);
    }

    fn name(&self) -> &str {
        "hard_sphere"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::random::{RandomStreamPool, SequenceSource};

    fn ion(velocity: Vector) -> Particle {
        Particle::ion(Vector::ZERO, 1.0, 100.0)
            .with_velocity(velocity)
            .with_diameter(5.0 * ANGSTROM)
    }

    #[test]
    fn test_resting_particle_never_collides() {
        let model = HardSphereCollisions::new(100.0, 298.0, 28.0, 3.7).unwrap();
        let mut particle = ion(Vector::ZERO);
        let mut rng = SequenceSource::new();

        assert_eq!(model.collision_probability(&particle, 1e-6), 0.0);
        model.modify_velocity(&mut particle, 1e-6, &mut rng);
        assert_eq!(particle.velocity, Vector::ZERO);
    }

    #[test]
    fn test_probability_scales_with_pressure() {
        let low = HardSphereCollisions::new(1.0, 298.0, 28.0, 3.7).unwrap();
        let high = HardSphereCollisions::new(2.0, 298.0, 28.0, 3.7).unwrap();
        let particle = ion(Vector::new(100.0, 0.0, 0.0));

        let p_low = low.collision_probability(&particle, 1e-9);
        let p_high = high.collision_probability(&particle, 1e-9);
        assert!(p_low > 0.0 && p_low < 1.0);
        assert!((p_high / p_low - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_probability_is_clamped_and_reported() {
        let model = HardSphereCollisions::new(1e5, 298.0, 28.0, 3.7).unwrap();
        let particle = ion(Vector::new(1000.0, 0.0, 0.0));

        assert!(!model.clamp_reported());
        assert_eq!(model.collision_probability(&particle, 1e-3), 1.0);
        assert!(model.clamp_reported());
    }

    #[test]
    fn test_scatter_conserves_momentum_and_energy() {
        let model = HardSphereCollisions::new(1.0, 298.0, 28.0, 3.7).unwrap();
        let mass = 100.0 * AMU_TO_KG;
        let velocity = Vector::new(300.0, -50.0, 20.0);
        let gas_velocity = Vector::new(-200.0, 400.0, 10.0);
        let mut pool = RandomStreamPool::seeded(1, 3);

        for _ in 0..100 {
            let direction = random_unit_vector(pool.stream_for_worker(0));
            let after = model.scatter(velocity, mass, gas_velocity, direction);

            // The gas molecule takes the remaining momentum
            let gas_after =
                (velocity * mass + gas_velocity * model.gas_mass - after * mass) / model.gas_mass;

            let energy_before =
                mass * velocity.length_squared() + model.gas_mass * gas_velocity.length_squared();
            let energy_after =
                mass * after.length_squared() + model.gas_mass * gas_after.length_squared();
            assert!((energy_after - energy_before).abs() <= 1e-9 * energy_before);
        }
    }

    #[test]
    fn test_certain_collision_changes_velocity() {
        let model = HardSphereCollisions::new(1e5, 298.0, 28.0, 3.7).unwrap();
        let mut particle = ion(Vector::new(500.0, 0.0, 0.0));
        let mut rng = SequenceSource::new();

        model.modify_velocity(&mut particle, 1e-3, &mut rng);
        assert_ne!(particle.velocity, Vector::new(500.0, 0.0, 0.0));
        assert!(particle.velocity.is_finite());
    }

    #[test]
    fn test_invalid_gas_is_rejected() {
        assert!(HardSphereCollisions::new(-1.0, 298.0, 28.0, 3.7).is_err());
        assert!(HardSphereCollisions::new(1.0, 0.0, 28.0, 3.7).is_err());
        assert!(HardSphereCollisions::new(1.0, 298.0, Scalar::NAN, 3.7).is_err());
        assert!(HardSphereCollisions::from_config(&BackgroundGasConfig::default()).is_ok());
    }
}
