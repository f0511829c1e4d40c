//! Factory functions for building ion ensembles from configuration

use crate::config::{IonGroupConfig, SimulationConfig, StartZoneConfig};
use crate::physics::ensemble::ParticleEnsemble;
use crate::physics::math::{ANGSTROM, Scalar, Vector};
use crate::physics::particle::Particle;
use crate::physics::random::RandomSource;

/// Uniformly distributed position inside the start zone box
pub fn random_position(rng: &mut dyn RandomSource, start_zone: &StartZoneConfig) -> Vector {
    let offset = Vector::new(rng.uniform(), rng.uniform(), rng.uniform()) - Vector::splat(0.5);
    start_zone.center() + offset * start_zone.size()
}

pub fn random_time_of_birth(rng: &mut dyn RandomSource, group: &IonGroupConfig) -> Scalar {
    if group.time_of_birth_range > 0.0 {
        rng.uniform() * group.time_of_birth_range
    } else {
        0.0
    }
}

/// Creates one ion of `group` at rest somewhere in the start zone
pub fn create_ion(
    rng: &mut dyn RandomSource,
    group: &IonGroupConfig,
    start_zone: &StartZoneConfig,
) -> Particle {
    let position = random_position(rng, start_zone);
    let time_of_birth = random_time_of_birth(rng, group);

    Particle::ion(position, group.charge_elementary, group.mass_amu)
        .with_time_of_birth(time_of_birth)
        .with_diameter(group.diameter_angstrom * ANGSTROM)
}

/// All ions of all configured groups, group by group
pub fn create_ion_cloud(rng: &mut dyn RandomSource, config: &SimulationConfig) -> ParticleEnsemble {
    let mut ensemble = ParticleEnsemble::new();
    for group in &config.ions {
        for _ in 0..group.count {
            ensemble.insert(create_ion(rng, group, &config.start_zone));
        }
    }
    ensemble
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::random::RandomStreamPool;

    #[test]
    fn test_positions_stay_in_start_zone() {
        let start_zone = StartZoneConfig {
            center: [1.0, 2.0, 3.0],
            size: [0.2, 0.4, 0.0],
        };
        let mut pool = RandomStreamPool::seeded(1, 17);

        for _ in 0..1000 {
            let position = random_position(pool.stream_for_worker(0), &start_zone);
            assert!((position.x - 1.0).abs() <= 0.1);
            assert!((position.y - 2.0).abs() <= 0.2);
            assert_eq!(position.z, 3.0);
        }
    }

    #[test]
    fn test_cloud_follows_groups() {
        let config = SimulationConfig {
            ions: vec![
                IonGroupConfig {
                    count: 3,
                    mass_amu: 50.0,
                    charge_elementary: 1.0,
                    ..Default::default()
                },
                IonGroupConfig {
                    count: 2,
                    mass_amu: 200.0,
                    charge_elementary: 2.0,
                    time_of_birth_range: 1e-6,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let mut pool = RandomStreamPool::seeded(1, 5);

        let ensemble = create_ion_cloud(pool.stream_for_worker(0), &config);

        assert_eq!(ensemble.len(), 5);
        let masses: Vec<Scalar> = ensemble.iter().map(|p| p.mass_amu().round()).collect();
        assert_eq!(masses, vec![50.0, 50.0, 50.0, 200.0, 200.0]);
        assert!(ensemble.iter().take(3).all(|p| p.time_of_birth == 0.0));
        assert!(ensemble.iter().skip(3).all(|p| (0.0..1e-6).contains(&p.time_of_birth)));
        assert!((ensemble.iter().next().unwrap().diameter - 5e-10).abs() < 1e-20);
    }
}
