//! Domain-agnostic genetic algorithm engine.
//!
//! Supports three optimization regimes over caller-defined solution
//! representations:
//!
//! - **Single-objective** ([`GaMode::Soga`]): minimize a scalar fitness.
//! - **Interactive** ([`GaMode::Iga`]): single-objective, but fitness
//!   depends on the whole current generation (e.g. pairwise comparisons
//!   supplied by an external process), so candidate evaluation runs
//!   sequentially against the evolving population.
//! - **Many-objective** ([`GaMode::NsgaIii`]): Pareto optimization with
//!   reference-vector-guided (NSGA-III) selection over two or more
//!   objectives.
//!
//! The engine is generic over two opaque caller types: the gene vector
//! (the decision variable, never inspected) and a middle-cost scratch value
//! (intermediate per-candidate evaluation state). The caller installs
//! initialization, evaluation, mutation, crossover, fitness and reporting
//! callbacks on a [`GaEngine`]; the engine owns the population, the
//! generational loop, ranking and selection, the reference-vector
//! machinery, the stop rules, and the evaluation thread pools.
//!
//! # Architecture
//!
//! Evaluation callbacks may reject candidates by returning `false`; the
//! variation driver redraws until acceptance. Candidate production runs
//! sequentially, on statically partitioned worker chunks, or on a dynamic
//! pool balancing heterogeneous evaluation cost. All workers share one
//! mutex-guarded random generator, so only sequential runs with a fixed
//! seed are reproducible.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic
//!   Algorithm: NSGA-II"
//! - Deb & Jain (2014), "An Evolutionary Many-Objective Optimization
//!   Algorithm Using Reference-Point-Based Nondominated Sorting"
//! - Das & Dennis (1998), "Normal-Boundary Intersection"

mod chromosome;
mod config;
mod engine;
mod error;
mod nsga3;
mod parallel;
mod selection;
mod timing;

pub mod matrix;
pub mod pareto;
pub mod random;
pub mod reference;

pub use chromosome::{Chromosome, Generation, GenerationSummary, StopReason};
pub use config::{GaConfig, GaMode};
pub use engine::{
    default_shrink_scale, CrossoverFn, EvalSolutionFn, EvalSolutionIgaFn, GaEngine, IgaFitnessFn,
    InitGenesFn, MoObjectivesFn, MoReportFn, MutateFn, ObjectiveReductionFn, RefreshFn,
    ShrinkScheduleFn, SoFitnessFn, SoReportFn,
};
pub use error::GaError;
pub use matrix::Matrix;
pub use random::SharedRng;
pub use timing::Chronometer;
