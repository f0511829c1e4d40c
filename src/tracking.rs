//! Bookkeeping of where and when particles start and splat
//!
//! Particles may be retired and new ones injected at any time, so start and
//! splat events are recorded independently of the ensemble. Entries are kept
//! in a flat table indexed by [`ParticleId`].

use crate::error::{SimulationError, SimulationResult};
use crate::physics::math::{Scalar, Vector};
use crate::physics::particle::{Particle, ParticleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ParticleState {
    Started = 1,
    Splatted = 2,
    Restarted = 3,
    SplattedAndRestarted = 4,
}

impl ParticleState {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerEntry {
    pub global_index: usize,
    pub state: ParticleState,
    pub start_time: Scalar,
    pub splat_time: Scalar,
    pub start_location: Vector,
    pub splat_location: Vector,
}

#[derive(Debug, Default, Clone)]
pub struct ParticleStartSplatTracker {
    entries: Vec<Option<TrackerEntry>>,
    /// Closed records of particles that were restarted
    restarted: Vec<TrackerEntry>,
    sorted: Vec<TrackerEntry>,
    next_global_index: usize,
}

impl ParticleStartSplatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, id: ParticleId) -> &mut Option<TrackerEntry> {
        if self.entries.len() <= id.index() {
            self.entries.resize(id.index() + 1, None);
        }
        &mut self.entries[id.index()]
    }

    fn new_entry(&mut self, location: Vector, time: Scalar) -> TrackerEntry {
        let entry = TrackerEntry {
            global_index: self.next_global_index,
            state: ParticleState::Started,
            start_time: time,
            splat_time: 0.0,
            start_location: location,
            splat_location: Vector::ZERO,
        };
        self.next_global_index += 1;
        entry
    }

    /// Register the start of `particle` and assign its global index
    pub fn particle_start(
        &mut self,
        particle: &mut Particle,
        time: Scalar,
    ) -> SimulationResult<()> {
        if self.entries.get(particle.id.index()).is_some_and(Option::is_some) {
            return Err(SimulationError::AlreadyStarted(particle.id));
        }

        let entry = self.new_entry(particle.position, time);
        particle.global_index = Some(entry.global_index);
        *self.slot_mut(particle.id) = Some(entry);
        Ok(())
    }

    /// Close the current record of `particle` at `old_position` and open a
    /// new one at `new_position` under a fresh global index
    pub fn particle_restart(
        &mut self,
        particle: &mut Particle,
        old_position: Vector,
        new_position: Vector,
        time: Scalar,
    ) -> SimulationResult<()> {
        let Some(mut closed) = self
            .entries
            .get_mut(particle.id.index())
            .and_then(Option::take)
        else {
            return Err(SimulationError::NotRegistered(particle.id));
        };

        closed.state = match closed.state {
            ParticleState::Splatted | ParticleState::SplattedAndRestarted => {
                ParticleState::SplattedAndRestarted
            }
            ParticleState::Started | ParticleState::Restarted => ParticleState::Restarted,
        };
        closed.splat_time = time;
        closed.splat_location = old_position;
        self.restarted.push(closed);

        let entry = self.new_entry(new_position, time);
        particle.global_index = Some(entry.global_index);
        *self.slot_mut(particle.id) = Some(entry);
        Ok(())
    }

    pub fn particle_splat(&mut self, particle: &Particle, time: Scalar) -> SimulationResult<()> {
        let entry = self
            .entries
            .get_mut(particle.id.index())
            .and_then(Option::as_mut)
            .ok_or(SimulationError::NotRegistered(particle.id))?;

        entry.splat_location = particle.position;
        entry.splat_time = time;
        entry.state = ParticleState::Splatted;
        Ok(())
    }

    pub fn get(&self, particle: &Particle) -> SimulationResult<&TrackerEntry> {
        self.entries
            .get(particle.id.index())
            .and_then(Option::as_ref)
            .ok_or(SimulationError::NotRegistered(particle.id))
    }

    /// Number of records, open and closed
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count() + self.restarted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot every record ordered by global index for the accessors below
    pub fn sort_start_splat_data(&mut self) {
        self.sorted = self
            .entries
            .iter()
            .flatten()
            .chain(self.restarted.iter())
            .cloned()
            .collect();
        self.sorted.sort_by_key(|entry| entry.global_index);
    }

    pub fn start_splat_data(&self) -> &[TrackerEntry] {
        &self.sorted
    }

    pub fn splat_states(&self) -> Vec<i32> {
        self.sorted.iter().map(|entry| entry.state.code()).collect()
    }

    pub fn start_times(&self) -> Vec<Scalar> {
        self.sorted.iter().map(|entry| entry.start_time).collect()
    }

    pub fn splat_times(&self) -> Vec<Scalar> {
        self.sorted.iter().map(|entry| entry.splat_time).collect()
    }

    pub fn start_locations(&self) -> Vec<Vector> {
        self.sorted.iter().map(|entry| entry.start_location).collect()
    }

    pub fn splat_locations(&self) -> Vec<Vector> {
        self.sorted.iter().map(|entry| entry.splat_location).collect()
    }
}
