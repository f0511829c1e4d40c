//! Integration tests for reproducibility of seeded runs

use chargedrift::physics::ions::create_ion_cloud;
use chargedrift::prelude::*;
use std::cell::{Cell, RefCell};

const SEED: u64 = 42;
const DT: Scalar = 1e-8;

fn ion_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.ions[0].count = 64;
    config
}

/// Ions drifting through a gas with space charge, collisions and four workers
fn stochastic_integrator<'a>(seed: u64) -> StepIntegrator<'a> {
    let mut streams = RandomStreamPool::seeded(4, seed);
    let particles = create_ion_cloud(streams.stream_for_worker(0), &ion_config());

    StepIntegrator::new(
        particles,
        Box::new(SpatialChargeIndex::new(0.5, 4).unwrap()),
        ElectrostaticForce::new(Vector::new(1e3, 0.0, 0.0), 1.0),
        streams,
    )
    .with_modifier(HardSphereCollisions::new(1000.0, 298.0, 28.0, 3.7).unwrap())
}

fn snapshot(integrator: &StepIntegrator<'_>) -> Vec<Particle> {
    integrator.particles().as_slice().to_vec()
}

#[test]
fn test_same_seed_reproduces_trajectories() {
    let mut first = stochastic_integrator(SEED);
    let mut second = stochastic_integrator(SEED);

    first.run(200, DT).unwrap();
    second.run(200, DT).unwrap();

    assert_eq!(snapshot(&first), snapshot(&second));
}

#[test]
fn test_different_seeds_diverge() {
    let mut first = stochastic_integrator(SEED);
    let mut second = stochastic_integrator(SEED + 1);

    first.run(50, DT).unwrap();
    second.run(50, DT).unwrap();

    assert_ne!(snapshot(&first), snapshot(&second));
}

#[test]
fn test_split_runs_match_single_run() {
    let mut single = stochastic_integrator(SEED);
    single.run(120, DT).unwrap();

    let mut split = stochastic_integrator(SEED);
    split.run(70, DT).unwrap();
    split.run(50, DT).unwrap();

    assert_eq!(single.step(), split.step());
    assert_eq!(single.time(), split.time());
    assert_eq!(snapshot(&single), snapshot(&split));
}

#[test]
fn test_termination_request_stops_after_current_step() {
    let stop_at = 7;
    let events = RefCell::new(Vec::new());

    let mut integrator = stochastic_integrator(SEED).with_post_step(|event| {
        events.borrow_mut().push((event.step, event.is_last_step));
        if event.step == stop_at {
            assert!(event.control.request_termination());
        }
    });

    integrator.run(100, DT).unwrap();
    assert_eq!(integrator.step(), stop_at);
    assert_eq!(integrator.run_state(), RunState::Stopped);
    drop(integrator);

    let events = events.into_inner();
    assert_eq!(events.len(), stop_at as usize + 2);
    assert_eq!(events.last(), Some(&(stop_at, true)));
    assert_eq!(events.iter().filter(|(_, last)| *last).count(), 1);
}

#[test]
fn test_termination_before_run_is_ignored() {
    let mut integrator = stochastic_integrator(SEED);
    assert!(!integrator.request_termination());

    integrator.run(5, DT).unwrap();
    assert_eq!(integrator.step(), 5);
}

#[test]
fn test_inserted_particles_do_not_perturb_others() {
    let push =
        |_: &mut Particle, _: &dyn FieldEvaluator, _: Scalar, _: u64| Vector::new(2.0, 0.0, -1.0);
    let particles = || {
        ParticleEnsemble::with_particles(
            (0..9).map(|i| Particle::new(Vector::new(0.0, i as Scalar, 0.0), Vector::X, 1.0, 0.0)),
        )
    };

    let mut undisturbed = StepIntegrator::new(
        particles(),
        Box::new(FullSumFieldEvaluator::new()),
        push,
        RandomStreamPool::seeded(2, SEED),
    );
    undisturbed.run(20, 0.01).unwrap();

    let inserted = Cell::new(false);
    let mut disturbed = StepIntegrator::new(
        particles(),
        Box::new(FullSumFieldEvaluator::new()),
        push,
        RandomStreamPool::seeded(2, SEED),
    )
    .with_other_actions(|_, particle, context| {
        if context.step == 10 && !inserted.get() {
            inserted.set(true);
            context.spawn(Particle::new(particle.position, Vector::ZERO, 1.0, 0.0));
        }
    });
    disturbed.run(20, 0.01).unwrap();

    assert_eq!(disturbed.particles().len(), 10);
    assert_eq!(
        &disturbed.particles().as_slice()[..9],
        undisturbed.particles().as_slice()
    );

    // Integrated for steps 11 to 19 only
    let newcomer = disturbed.particles().get(ParticleId(9)).unwrap();
    assert!((newcomer.velocity - Vector::new(2.0, 0.0, -1.0) * 0.09).length() < 1e-12);
}

#[test]
fn test_worker_count_does_not_change_deterministic_physics() {
    let run = |workers: usize| {
        let particles = (0..50).map(|i| {
            let angle = i as Scalar * 0.37;
            Particle::new(
                Vector::new(angle.cos(), angle.sin(), 0.1 * i as Scalar) * 1e-3,
                Vector::ZERO,
                1e-25,
                if i % 3 == 0 { -1.6e-19 } else { 1.6e-19 },
            )
        });
        let mut integrator = StepIntegrator::new(
            ParticleEnsemble::with_particles(particles),
            Box::new(SpatialChargeIndex::new(0.5, 2).unwrap()),
            ElectrostaticForce::new(Vector::new(0.0, 0.0, 10.0), 1.0),
            RandomStreamPool::seeded(workers, SEED),
        );
        integrator.run(30, 1e-9).unwrap();
        snapshot(&integrator)
    };

    assert_eq!(run(1), run(3));
    assert_eq!(run(1), run(8));
}
