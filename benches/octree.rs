use chargedrift::config::SpaceChargeConfig;
use chargedrift::physics::ensemble::ParticleEnsemble;
use chargedrift::physics::field::{FieldEvaluator, FullSumFieldEvaluator, SpatialChargeIndex};
use chargedrift::physics::force::ElectrostaticForce;
use chargedrift::physics::integrators::StepIntegrator;
use chargedrift::physics::math::{Scalar, Vector};
use chargedrift::physics::particle::{Particle, ParticleId};
use chargedrift::physics::random::RandomStreamPool;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts;
use std::hint::black_box;

/// Singly charged ions spread uniformly through a sphere of `radius`
fn generate_ion_sphere(count: usize, seed: u64, radius: Scalar) -> Vec<Particle> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..count)
        .map(|index| {
            let theta = rng.random_range(0.0..=2.0 * consts::PI);
            let phi = libm::acos(rng.random_range(-1.0..=1.0));
            let r = radius * libm::cbrt(rng.random_range(0.0..1.0));

            let position = Vector::new(
                r * libm::sin(phi) * libm::cos(theta),
                r * libm::sin(phi) * libm::sin(theta),
                r * libm::cos(phi),
            );
            let mut ion = Particle::ion(position, 1.0, rng.random_range(20.0..200.0));
            ion.id = ParticleId(index);
            ion
        })
        .collect()
}

fn default_octree() -> SpatialChargeIndex {
    let config = SpaceChargeConfig::default();
    SpatialChargeIndex::new(config.octree_theta, config.octree_leaf_capacity)
        .and_then(|octree| octree.with_min_region_size(config.octree_min_region_size))
        .expect("default octree settings are valid")
}

// =============================================================================
// Construction Performance Benchmarks
// =============================================================================

fn bench_construction_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction_scaling");

    for &count in &[10, 100, 1_000, 10_000, 100_000] {
        let particles = generate_ion_sphere(count, 42, 1e-3);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("ions", count), &count, |b, _| {
            b.iter(|| {
                let mut octree = default_octree();
                octree.build(black_box(&particles));
                black_box(octree);
            });
        });
    }

    group.finish();
}

fn bench_leaf_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("leaf_capacity");

    let count = 10_000;
    let particles = generate_ion_sphere(count, 42, 1e-3);

    for &capacity in &[1, 4, 10, 20, 50] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("capacity", capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let mut octree =
                    SpatialChargeIndex::new(0.5, capacity).expect("valid octree settings");
                octree.build(black_box(&particles));
                for particle in particles.iter().step_by(100) {
                    black_box(octree.field_on(particle));
                }
            });
        });
    }

    group.finish();
}

// =============================================================================
// Field Evaluation Benchmarks
// =============================================================================

fn bench_field_query_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_query_scaling");

    for &count in &[10, 100, 1_000, 10_000] {
        let particles = generate_ion_sphere(count, 42, 1e-3);
        let mut octree = default_octree();
        octree.build(&particles);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("ions", count), &count, |b, _| {
            let probe = &particles[count / 2];
            b.iter(|| black_box(octree.field_on(black_box(probe))));
        });
    }

    group.finish();
}

fn bench_octree_vs_full_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("octree_vs_full_sum");

    for &count in &[100, 500, 2_000] {
        let particles = generate_ion_sphere(count, 7, 1e-3);
        let solvers: [(&str, Box<dyn FieldEvaluator>); 2] = [
            ("octree", Box::new(default_octree())),
            ("full_sum", Box::new(FullSumFieldEvaluator::new())),
        ];

        for (name, mut solver) in solvers {
            group.throughput(Throughput::Elements(count as u64));
            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, _| {
                b.iter(|| {
                    solver.build(black_box(&particles));
                    let total: Vector = particles.iter().map(|p| solver.field_on(p)).sum();
                    black_box(total);
                });
            });
        }
    }

    group.finish();
}

fn bench_theta_tradeoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("theta_tradeoff");

    let count = 5_000;
    let particles = generate_ion_sphere(count, 42, 1e-3);

    for &theta in &[0.1, 0.3, 0.5, 0.8, 1.0] {
        let mut octree = SpatialChargeIndex::new(theta, 4).expect("valid octree settings");
        octree.build(&particles);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::new("theta", (theta * 100.0) as u32),
            &theta,
            |b, _| {
                b.iter(|| {
                    let total: Vector =
                        particles.iter().map(|p| octree.field_on(black_box(p))).sum();
                    black_box(total);
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// Full Step Benchmarks
// =============================================================================

fn bench_integrator_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrator_step");

    let count = 2_000;
    for &workers in &[1, 2, 4, 8] {
        let particles = generate_ion_sphere(count, 42, 1e-3);
        let mut integrator = StepIntegrator::new(
            ParticleEnsemble::with_particles(particles),
            Box::new(default_octree()),
            ElectrostaticForce::new(Vector::new(100.0, 0.0, 0.0), 1.0),
            RandomStreamPool::seeded(workers, 42),
        );

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, _| {
            b.iter(|| integrator.run_single_step(black_box(1e-9)));
        });
    }

    group.finish();
}

criterion_group!(construction, bench_construction_scaling, bench_leaf_capacity);

criterion_group!(
    evaluation,
    bench_field_query_scaling,
    bench_octree_vs_full_sum,
    bench_theta_tradeoff
);

criterion_group!(stepping, bench_integrator_step);

criterion_main!(construction, evaluation, stepping);
