//! The live particle set and its per-particle integration scratch state

use crate::physics::math::Vector;
use crate::physics::particle::{Particle, ParticleId};

/// Integration state kept alongside every particle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepScratch {
    /// Acceleration evaluated in the previous step
    pub previous_acceleration: Vector,
    /// Candidate position of the step in progress
    pub staged_position: Vector,
    /// Whether `previous_acceleration` holds a real evaluation yet
    pub acceleration_seeded: bool,
    /// Particle is waiting for its time of birth
    pub pending_birth: bool,
}

/// Ordered collection of particles with stable indices.
///
/// Particles and their scratch entries live in two parallel vectors that
/// always have the same length, so an index valid for one is valid for
/// the other. Nothing is ever removed or reordered.
#[derive(Debug, Clone, Default)]
pub struct ParticleEnsemble {
    particles: Vec<Particle>,
    scratch: Vec<StepScratch>,
}

impl ParticleEnsemble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_particles(particles: impl IntoIterator<Item = Particle>) -> Self {
        let mut ensemble = Self::new();
        for particle in particles {
            ensemble.insert(particle);
        }
        ensemble
    }

    /// Append a particle and allocate its scratch state; returns its handle.
    ///
    /// An active particle is parked until the integrator bears it at its
    /// time of birth. One inserted inactive is never born.
    pub fn insert(&mut self, mut particle: Particle) -> ParticleId {
        let id = ParticleId(self.particles.len());
        let pending_birth = particle.is_active();
        particle.id = id;
        particle.active = false;

        self.particles.push(particle);
        self.scratch.push(StepScratch {
            pending_birth,
            ..Default::default()
        });

        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_active()).count()
    }

    /// Particles still waiting for their time of birth
    pub fn pending_count(&self) -> usize {
        self.scratch.iter().filter(|s| s.pending_birth).count()
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id.index())
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id.index())
    }

    pub fn scratch(&self, id: ParticleId) -> Option<&StepScratch> {
        self.scratch.get(id.index())
    }

    /// Retire a particle in place; returns false for an unknown handle
    pub fn deactivate(&mut self, id: ParticleId) -> bool {
        match self.particles.get_mut(id.index()) {
            Some(particle) => {
                particle.deactivate();
                self.scratch[id.index()].pending_birth = false;
                true
            }
            None => false,
        }
    }

    /// Particles in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Both parallel vectors, mutably, for the step loops
    pub(crate) fn split_mut(&mut self) -> (&mut [Particle], &mut [StepScratch]) {
        (&mut self.particles, &mut self.scratch)
    }
}

impl<'a> IntoIterator for &'a ParticleEnsemble {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}
