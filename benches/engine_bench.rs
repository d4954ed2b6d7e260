//! Criterion benchmarks for the genetic algorithm engine.
//!
//! Uses a synthetic sphere problem to measure pure engine overhead
//! independent of any domain, across population sizes and evaluation
//! strategies.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use evokit::{GaConfig, GaEngine, GaMode, SharedRng};

fn sphere_engine(config: GaConfig) -> GaEngine<Vec<f64>, f64> {
    let mut engine = GaEngine::new(config);
    engine.init_genes = Some(Box::new(|genes: &mut Vec<f64>, rng: &SharedRng| {
        *genes = (0..5).map(|_| 10.0 - 20.0 * rng.rand01()).collect();
    }));
    engine.eval_solution = Some(Box::new(|genes: &Vec<f64>, middle: &mut f64| {
        *middle = genes.iter().map(|x| x * x).sum();
        true
    }));
    engine.calculate_so_total_fitness = Some(Box::new(|ch| ch.middle));
    engine.mutate = Some(Box::new(|genes: &Vec<f64>, rng: &SharedRng, shrink: f64| {
        genes
            .iter()
            .map(|x| (x + 0.5 * (rng.rand01() - rng.rand01()) * shrink).clamp(-10.0, 10.0))
            .collect()
    }));
    engine.crossover = Some(Box::new(|a: &Vec<f64>, b: &Vec<f64>, rng: &SharedRng| {
        a.iter()
            .zip(b)
            .map(|(&xa, &xb)| {
                let r = rng.rand01();
                r * xa + (1.0 - r) * xb
            })
            .collect()
    }));
    engine.so_report_generation = Some(Box::new(|_, _, _| {}));
    engine
}

fn bench_sphere_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("sphere_solve");
    for population in [20, 50, 100] {
        group.bench_with_input(
            BenchmarkId::from_parameter(population),
            &population,
            |b, &population| {
                b.iter(|| {
                    let config = GaConfig::default()
                        .with_mode(GaMode::Soga)
                        .with_population(population)
                        .with_elite_count(population / 10)
                        .with_generation_max(20)
                        .with_multi_threading(false)
                        .with_stall_best(1e-6, 100_000)
                        .with_stall_average(1e-4, 100_000)
                        .with_seed(42);
                    let mut engine = sphere_engine(config);
                    black_box(engine.solve().unwrap())
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_sphere_solve);
criterion_main!(benches);
