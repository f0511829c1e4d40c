//! Parallel velocity Verlet integrator with pluggable physics hooks

use super::{RunControl, RunState, VelocityVerlet};
use crate::error::{SimulationError, SimulationResult};
use crate::physics::ensemble::{ParticleEnsemble, StepScratch};
use crate::physics::field::FieldEvaluator;
use crate::physics::force::ForceLaw;
use crate::physics::math::{Scalar, Vector};
use crate::physics::modifiers::{NoModifier, PhysicsModifier};
use crate::physics::particle::{Particle, ParticleId};
use crate::physics::random::{RandomSource, RandomStreamPool};
use bevy::log::{debug, info};
use bevy::tasks::{TaskPool, TaskPoolBuilder};
use std::sync::Arc;

/// What the per-step callback sees after a step was committed
pub struct StepEvent<'e> {
    pub control: &'e Arc<RunControl>,
    pub particles: &'e ParticleEnsemble,
    pub field: &'e dyn FieldEvaluator,
    pub time: Scalar,
    pub step: u64,
    pub is_last_step: bool,
}

/// Per-particle context handed to the other-actions callback
pub struct ActionContext<'c> {
    pub id: ParticleId,
    pub time: Scalar,
    pub step: u64,
    spawned: &'c mut Vec<Particle>,
}

impl ActionContext<'_> {
    /// Queue a new particle; it joins the ensemble once the step is committed
    pub fn spawn(&mut self, particle: Particle) {
        self.spawned.push(particle);
    }
}

type PostStepFn<'a> = Box<dyn FnMut(&StepEvent<'_>) + 'a>;
type OtherActionsFn<'a> = Box<dyn FnMut(&mut Vector, &mut Particle, &mut ActionContext<'_>) + 'a>;
type StartMonitorFn<'a> = Box<dyn FnMut(&mut Particle, Scalar) + 'a>;

/// Read-only inputs shared by every worker of the parallel phase
struct ParallelPhase<'p> {
    force_law: &'p dyn ForceLaw,
    field: &'p dyn FieldEvaluator,
    modifier: &'p dyn PhysicsModifier,
    time: Scalar,
    step: u64,
    dt: Scalar,
}

impl ParallelPhase<'_> {
    /// Stage new positions and advance velocities of one contiguous chunk
    fn integrate_chunk(
        &self,
        particles: &mut [Particle],
        scratch: &mut [StepScratch],
        rng: &mut dyn RandomSource,
    ) {
        for (particle, scratch) in particles.iter_mut().zip(scratch.iter_mut()) {
            if !particle.is_active() {
                continue;
            }

            self.modifier.update_particle_parameters(particle);

            let mut acceleration = self
                .force_law
                .acceleration(particle, self.field, self.time, self.step);
            if !particle.is_active() {
                continue;
            }
            self.modifier
                .modify_acceleration(&mut acceleration, particle, self.dt, rng);

            if !scratch.acceleration_seeded {
                scratch.previous_acceleration = acceleration;
                scratch.acceleration_seeded = true;
            }

            scratch.staged_position = VelocityVerlet::stage_position(
                particle.position,
                particle.velocity,
                scratch.previous_acceleration,
                self.dt,
            );
            particle.velocity = VelocityVerlet::advance_velocity(
                particle.velocity,
                scratch.previous_acceleration,
                acceleration,
                self.dt,
            );
            scratch.previous_acceleration = acceleration;

            self.modifier.modify_velocity(particle, self.dt, rng);
        }
    }
}

/// Advances a [`ParticleEnsemble`] through time.
///
/// Every step runs in two phases. The parallel phase evaluates forces
/// against the field snapshot of the previous step, stages new positions and
/// updates velocities; workers own disjoint contiguous chunks of the ensemble
/// and worker `w` always draws from random stream `w`. The sequential phase
/// then applies position hooks and other actions and commits the staged
/// positions in index order. The field evaluator is rebuilt only after every
/// position was committed.
pub struct StepIntegrator<'a> {
    particles: ParticleEnsemble,
    field_evaluator: Box<dyn FieldEvaluator + 'a>,
    force_law: Box<dyn ForceLaw + 'a>,
    modifier: Box<dyn PhysicsModifier + 'a>,
    random_streams: RandomStreamPool,
    task_pool: Option<TaskPool>,
    post_step: Option<PostStepFn<'a>>,
    other_actions: Option<OtherActionsFn<'a>>,
    start_monitor: Option<StartMonitorFn<'a>>,
    control: Arc<RunControl>,
    spawned: Vec<Particle>,
    time: Scalar,
    step: u64,
}

impl<'a> StepIntegrator<'a> {
    /// One parallel worker is used per stream in `random_streams`
    pub fn new(
        particles: ParticleEnsemble,
        field_evaluator: Box<dyn FieldEvaluator + 'a>,
        force_law: impl ForceLaw + 'a,
        random_streams: RandomStreamPool,
    ) -> Self {
        let workers = random_streams.worker_count();
        let task_pool = (workers > 1).then(|| {
            TaskPoolBuilder::new()
                .num_threads(workers)
                .thread_name("chargedrift worker".to_string())
                .build()
        });

        Self {
            particles,
            field_evaluator,
            force_law: Box::new(force_law),
            modifier: Box::new(NoModifier),
            random_streams,
            task_pool,
            post_step: None,
            other_actions: None,
            start_monitor: None,
            control: RunControl::new(),
            spawned: Vec::new(),
            time: 0.0,
            step: 0,
        }
    }

    pub fn with_modifier(mut self, modifier: impl PhysicsModifier + 'a) -> Self {
        self.modifier = Box::new(modifier);
        self
    }

    pub fn with_boxed_modifier(mut self, modifier: Box<dyn PhysicsModifier + 'a>) -> Self {
        self.modifier = modifier;
        self
    }

    /// Called once before the first step of a run, after every step and
    /// once more when the run ends
    pub fn with_post_step(mut self, callback: impl FnMut(&StepEvent<'_>) + 'a) -> Self {
        self.post_step = Some(Box::new(callback));
        self
    }

    /// Called for every active particle in the sequential phase, before its
    /// staged position is committed
    pub fn with_other_actions(
        mut self,
        callback: impl FnMut(&mut Vector, &mut Particle, &mut ActionContext<'_>) + 'a,
    ) -> Self {
        self.other_actions = Some(Box::new(callback));
        self
    }

    /// Called exactly once per particle, when it becomes active
    pub fn with_start_monitor(mut self, callback: impl FnMut(&mut Particle, Scalar) + 'a) -> Self {
        self.start_monitor = Some(Box::new(callback));
        self
    }

    pub fn time(&self) -> Scalar {
        self.time
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn run_state(&self) -> RunState {
        self.control.state()
    }

    /// Handle for requesting termination from another thread, such as a watchdog
    pub fn termination_handle(&self) -> Arc<RunControl> {
        Arc::clone(&self.control)
    }

    pub fn request_termination(&self) -> bool {
        self.control.request_termination()
    }

    pub fn particles(&self) -> &ParticleEnsemble {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleEnsemble {
        &mut self.particles
    }

    pub fn field_evaluator(&self) -> &dyn FieldEvaluator {
        self.field_evaluator.as_ref()
    }

    pub fn worker_count(&self) -> usize {
        self.random_streams.worker_count()
    }

    /// Add a particle; it becomes active at its time of birth
    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        self.particles.insert(particle)
    }

    /// Integrate `time_steps` steps of length `dt`, or fewer if termination
    /// is requested
    pub fn run(&mut self, time_steps: u64, dt: Scalar) -> SimulationResult<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "time step must be finite and positive, got {dt}"
            )));
        }

        self.control.set(RunState::Running);
        info!(
            "Starting run of {} steps (dt = {:e} s) at t = {:e} s with {} particles, \
             {} solver and {} workers",
            time_steps,
            dt,
            self.time,
            self.particles.len(),
            self.field_evaluator.name(),
            self.worker_count()
        );

        self.bear_particles();
        self.field_evaluator.build(self.particles.as_slice());
        self.notify(false);

        let mut completed = 0;
        while completed < time_steps {
            if self.control.termination_requested() {
                debug!("Termination requested at step {}", self.step);
                break;
            }
            self.run_single_step(dt);
            completed += 1;
        }

        self.notify(true);
        self.control.set(RunState::Stopped);
        info!(
            "Run finished after {} steps at t = {:e} s, {} of {} particles active",
            completed,
            self.time,
            self.particles.active_count(),
            self.particles.len()
        );

        Ok(())
    }

    /// Advance by exactly one step
    pub fn run_single_step(&mut self, dt: Scalar) {
        if self.bear_particles() > 0 {
            self.field_evaluator.build(self.particles.as_slice());
        }
        self.modifier.update_step_parameters(self.step, self.time);

        self.parallel_phase(dt);
        self.sequential_phase(dt);

        for particle in self.spawned.drain(..) {
            self.particles.insert(particle);
        }

        self.time += dt;
        self.step += 1;
        self.field_evaluator.build(self.particles.as_slice());
        self.notify(false);
    }

    fn parallel_phase(&mut self, dt: Scalar) {
        let phase = ParallelPhase {
            force_law: self.force_law.as_ref(),
            field: self.field_evaluator.as_ref(),
            modifier: self.modifier.as_ref(),
            time: self.time,
            step: self.step,
            dt,
        };
        let (particles, scratch) = self.particles.split_mut();

        match &self.task_pool {
            Some(task_pool) => {
                let chunk_size = particles
                    .len()
                    .div_ceil(self.random_streams.worker_count())
                    .max(1);
                let phase = &phase;

                task_pool.scope(|scope| {
                    let chunks = particles
                        .chunks_mut(chunk_size)
                        .zip(scratch.chunks_mut(chunk_size))
                        .zip(self.random_streams.streams_mut());

                    for ((particles, scratch), rng) in chunks {
                        scope.spawn(async move { phase.integrate_chunk(particles, scratch, rng) });
                    }
                });
            }
            None => {
                phase.integrate_chunk(particles, scratch, self.random_streams.stream_for_worker(0));
            }
        }
    }

    fn sequential_phase(&mut self, dt: Scalar) {
        let (particles, scratch) = self.particles.split_mut();
        let rng = self.random_streams.stream_for_worker(0);

        for (index, (particle, scratch)) in
            particles.iter_mut().zip(scratch.iter_mut()).enumerate()
        {
            if !particle.is_active() {
                continue;
            }

            let mut staged_position = scratch.staged_position;
            self.modifier
                .modify_position(&mut staged_position, particle, dt, rng);

            if let Some(other_actions) = self.other_actions.as_mut() {
                let mut context = ActionContext {
                    id: ParticleId(index),
                    time: self.time,
                    step: self.step,
                    spawned: &mut self.spawned,
                };
                other_actions(&mut staged_position, particle, &mut context);
            }

            particle.position = staged_position;
        }
    }

    /// Activate every pending particle whose time of birth has come
    fn bear_particles(&mut self) -> usize {
        let time = self.time;
        let (particles, scratch) = self.particles.split_mut();
        let mut born = 0;

        for (particle, scratch) in particles.iter_mut().zip(scratch.iter_mut()) {
            if scratch.pending_birth && particle.time_of_birth <= time {
                scratch.pending_birth = false;
                particle.active = true;
                born += 1;

                if let Some(start_monitor) = self.start_monitor.as_mut() {
                    start_monitor(particle, time);
                }
            }
        }

        born
    }

    fn notify(&mut self, is_last_step: bool) {
        if let Some(post_step) = self.post_step.as_mut() {
            post_step(&StepEvent {
                control: &self.control,
                particles: &self.particles,
                field: self.field_evaluator.as_ref(),
                time: self.time,
                step: self.step,
                is_last_step,
            });
        }
    }
}
