use std::hint::black_box;

use bevy_symbios_ocean::config::{BakeConfig, OceanConfig, SolverKind};
use bevy_symbios_ocean::field::FrequencyField;
use bevy_symbios_ocean::fourier::{FourierSolver, Solver};
use bevy_symbios_ocean::simulation::OceanSimulation;
use bevy_symbios_ocean::spectrum::SpectrumGrid;
use criterion::{Criterion, criterion_group, criterion_main};

fn bench_solvers(c: &mut Criterion) {
    for size in [16, 32] {
        let config = OceanConfig {
            grid_size: size,
            ..OceanConfig::default()
        };
        let freq = FrequencyField::build(&SpectrumGrid::from_seed(&config), 3.0);
        for kind in [SolverKind::Fft, SolverKind::BruteForce] {
            let solver = Solver::new(kind, size);
            c.bench_function(&format!("{kind:?}_{size}").to_lowercase(), |b| {
                b.iter(|| solver.transform(black_box(&freq.height)))
            });
        }
    }
}

fn bench_evaluate(c: &mut Criterion) {
    let sim = OceanSimulation::new(OceanConfig {
        grid_size: 64,
        ..OceanConfig::default()
    })
    .expect("valid config");
    c.bench_function("evaluate_64", |b| b.iter(|| sim.evaluate(black_box(12.5))));
}

fn bench_bake(c: &mut Criterion) {
    let sim = OceanSimulation::new(OceanConfig::default()).expect("valid config");
    let config = BakeConfig {
        frame_count: 16,
        uv_correction: true,
        ..BakeConfig::default()
    };
    c.bench_function("bake_32x16", |b| {
        b.iter(|| sim.bake(black_box(&config)).expect("bake"))
    });
}

criterion_group!(benches, bench_solvers, bench_evaluate, bench_bake);
criterion_main!(benches);
