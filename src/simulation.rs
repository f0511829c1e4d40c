//! Runs a complete ion cloud simulation from a [`SimulationConfig`]

use crate::config::SimulationConfig;
use crate::error::SimulationResult;
use crate::physics::aabb3d::Aabb3d;
use crate::physics::field::create_field_evaluator;
use crate::physics::force::ElectrostaticForce;
use crate::physics::integrators::{RunControl, StepIntegrator};
use crate::physics::ions::create_ion_cloud;
use crate::physics::math::{Scalar, Vector};
use crate::physics::modifiers::{HardSphereCollisions, NoModifier, PhysicsModifier};
use crate::physics::random::RandomStreamPool;
use crate::tracking::{ParticleStartSplatTracker, ParticleState};
use bevy::log::{info, warn};
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub steps: u64,
    pub time: Scalar,
    pub particle_count: usize,
    pub active_count: usize,
    pub splat_count: usize,
    pub mean_splat_time: Option<Scalar>,
}

/// Stop `control` after `limit` of wall time unless the run ended before
fn spawn_watchdog(control: Arc<RunControl>, limit: Duration) {
    std::thread::spawn(move || {
        std::thread::sleep(limit);
        if control.request_termination() {
            warn!("Wall time limit of {:.1} s reached, terminating", limit.as_secs_f64());
        }
    });
}

pub fn run_simulation(
    config: &SimulationConfig,
    max_wall_time: Option<Duration>,
) -> SimulationResult<SimulationSummary> {
    config.validate()?;

    let workers = config.integration.effective_worker_count();
    let mut random_streams = RandomStreamPool::from_optional_seed(workers, config.integration.seed);
    let particles = create_ion_cloud(random_streams.stream_for_worker(0), config);

    let domain = Aabb3d::cube(Vector::ZERO, 2.0 * config.field.domain_half_extent);
    let force_law =
        ElectrostaticForce::new(config.field.uniform_field(), config.space_charge.factor)
            .with_domain(domain);
    let modifier: Box<dyn PhysicsModifier> = match &config.background_gas {
        Some(gas) => Box::new(HardSphereCollisions::from_config(gas)?),
        None => Box::new(NoModifier),
    };

    let tracker = RefCell::new(ParticleStartSplatTracker::new());
    let report_interval = config.integration.report_interval as u64;

    let mut integrator = StepIntegrator::new(
        particles,
        create_field_evaluator(&config.space_charge)?,
        force_law,
        random_streams,
    )
    .with_boxed_modifier(modifier)
    .with_start_monitor(|particle, time| {
        if let Err(err) = tracker.borrow_mut().particle_start(particle, time) {
            warn!("{err}");
        }
    })
    .with_other_actions(|staged_position, particle, context| {
        if !domain.contains(*staged_position) {
            particle.position = *staged_position;
            if let Err(err) = tracker.borrow_mut().particle_splat(particle, context.time) {
                warn!("{err}");
            }
            particle.deactivate();
        }
    })
    .with_post_step(|event| {
        let active = event.particles.active_count();
        if report_interval > 0 && event.step % report_interval == 0 && !event.is_last_step {
            info!(
                "step {:>6}  t = {:.4e} s  active {:>6} / {}",
                event.step,
                event.time,
                active,
                event.particles.len()
            );
        }
        let finished = active == 0 && event.particles.pending_count() == 0;
        if event.step > 0 && finished && event.control.request_termination() {
            info!("All particles splatted at step {}", event.step);
        }
    });

    if let Some(limit) = max_wall_time {
        spawn_watchdog(integrator.termination_handle(), limit);
    }

    integrator.run(config.integration.time_steps as u64, config.integration.dt)?;

    let steps = integrator.step();
    let time = integrator.time();
    let particle_count = integrator.particles().len();
    let active_count = integrator.particles().active_count();
    drop(integrator);

    let mut tracker = tracker.into_inner();
    tracker.sort_start_splat_data();
    let splat_times: Vec<Scalar> = tracker
        .start_splat_data()
        .iter()
        .filter(|entry| entry.state == ParticleState::Splatted)
        .map(|entry| entry.splat_time)
        .collect();

    let summary = SimulationSummary {
        steps,
        time,
        particle_count,
        active_count,
        splat_count: splat_times.len(),
        mean_splat_time: (!splat_times.is_empty())
            .then(|| splat_times.iter().sum::<Scalar>() / splat_times.len() as Scalar),
    };

    info!(
        "{} of {} particles splatted, mean splat time {}",
        summary.splat_count,
        summary.particle_count,
        summary
            .mean_splat_time
            .map_or_else(|| "n/a".to_string(), |t| format!("{t:.4e} s"))
    );

    Ok(summary)
}
