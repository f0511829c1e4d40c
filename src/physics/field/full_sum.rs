use super::FieldEvaluator;
use crate::physics::math::{Vector, coulomb_field};
use crate::physics::particle::{Particle, ParticleId};

#[derive(Debug, Clone, Copy)]
struct Source {
    id: ParticleId,
    position: Vector,
    charge: f64,
}

/// Exact pairwise Coulomb sum over every active particle.
///
/// O(n) per query and O(n^2) per step. Serves as the reference the octree
/// is checked against and is the better choice for small ensembles.
#[derive(Debug, Default, Clone)]
pub struct FullSumFieldEvaluator {
    sources: Vec<Source>,
}

impl FullSumFieldEvaluator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FieldEvaluator for FullSumFieldEvaluator {
    fn build(&mut self, particles: &[Particle]) {
        self.sources.clear();
        self.sources.extend(
            particles
                .iter()
                .filter(|particle| particle.is_active() && particle.position.is_finite())
                .map(|particle| Source {
                    id: particle.id,
                    position: particle.position,
                    charge: particle.charge,
                }),
        );
    }

    fn field_at(&self, point: Vector, exclude: Option<ParticleId>) -> Vector {
        self.sources
            .iter()
            .filter(|source| Some(source.id) != exclude)
            .map(|source| coulomb_field(point, source.position, source.charge))
            .sum()
    }

    fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn name(&self) -> &str {
        "full_sum"
    }
}
