//! Population data model.
//!
//! A [`Chromosome`] is a candidate solution plus its evaluation state; a
//! [`Generation`] is one population together with the ranking artifacts the
//! selection machinery needs. The engine is generic over two opaque caller
//! types: the gene vector `G` (never inspected, only cloned and handed to
//! callbacks) and the middle cost `M` (scratch produced by evaluation and
//! consumed by fitness finalization).

use std::fmt;

/// A candidate solution together with its evaluation state.
///
/// `total_cost` is meaningful only after single-objective (or interactive)
/// fitness finalization; `objectives` only after many-objective
/// finalization. Before that point both hold placeholder values and must
/// not be read.
#[derive(Debug, Clone)]
pub struct Chromosome<G, M> {
    /// The decision variable, owned by the caller's representation.
    pub genes: G,
    /// Intermediate evaluation results, not yet aggregated into a fitness.
    pub middle: M,
    /// Scalar fitness for single-objective and interactive modes.
    pub total_cost: f64,
    /// Objective vector for many-objective mode.
    pub objectives: Vec<f64>,
}

impl<G, M> Chromosome<G, M> {
    pub fn new(genes: G, middle: M) -> Self {
        Self {
            genes,
            middle,
            total_cost: 0.0,
            objectives: Vec::new(),
        }
    }
}

/// One population plus the ranking artifacts computed for it.
///
/// Exactly one of `sorted_indices` (single-objective, ascending by
/// `total_cost`) and `fronts` (many-objective, front 0 Pareto-optimal) is
/// populated, depending on the problem mode.
#[derive(Debug, Clone)]
pub struct Generation<G, M> {
    pub chromosomes: Vec<Chromosome<G, M>>,
    /// Lowest `total_cost` in the population (single-objective).
    pub best_total_cost: f64,
    /// Mean `total_cost` over the population (single-objective).
    pub average_cost: f64,
    /// Index of the chromosome holding `best_total_cost`, if finalized.
    pub best_chromosome_index: Option<usize>,
    /// Chromosome indices ordered by ascending `total_cost`.
    pub sorted_indices: Vec<usize>,
    /// Pareto fronts; `fronts[0]` is the non-dominated subset.
    pub fronts: Vec<Vec<usize>>,
    /// Monotonic cumulative selection chances; the entry at the population
    /// size minus one is exactly 1.
    pub selection_chance_cumulative: Vec<f64>,
    /// Wall-clock seconds spent producing this generation.
    pub exe_time: f64,
}

impl<G, M> Default for Generation<G, M> {
    fn default() -> Self {
        Self {
            chromosomes: Vec::new(),
            best_total_cost: f64::INFINITY,
            average_cost: 0.0,
            best_chromosome_index: None,
            sorted_indices: Vec::new(),
            fronts: Vec::new(),
            selection_chance_cumulative: Vec::new(),
            exe_time: 0.0,
        }
    }
}

/// The two scalars retained per past generation for stall detection.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSummary {
    pub best_total_cost: f64,
    pub average_cost: f64,
}

impl<G, M> From<&Generation<G, M>> for GenerationSummary {
    fn from(generation: &Generation<G, M>) -> Self {
        Self {
            best_total_cost: generation.best_total_cost,
            average_cost: generation.average_cost,
        }
    }
}

/// Why the generational loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No stop condition holds; the loop continues.
    Undefined,
    /// The generation cap was reached.
    MaxGenerations,
    /// The population average stalled for too many generations.
    StallAverage,
    /// The best cost stalled for too many generations.
    StallBest,
    /// The caller raised the cooperative stop flag.
    UserRequest,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Undefined => "no stop condition met",
            StopReason::MaxGenerations => "maximum generation reached",
            StopReason::StallAverage => "average stalled",
            StopReason::StallBest => "best stalled",
            StopReason::UserRequest => "user request",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_default() {
        let g: Generation<Vec<f64>, f64> = Generation::default();
        assert!(g.chromosomes.is_empty());
        assert!(g.best_total_cost.is_infinite());
        assert_eq!(g.average_cost, 0.0);
        assert!(g.best_chromosome_index.is_none());
    }

    #[test]
    fn test_summary_captures_stats() {
        let mut g: Generation<Vec<f64>, f64> = Generation::default();
        g.best_total_cost = 1.5;
        g.average_cost = 3.0;
        let summary = GenerationSummary::from(&g);
        assert_eq!(summary.best_total_cost, 1.5);
        assert_eq!(summary.average_cost, 3.0);
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::StallBest.to_string(), "best stalled");
        assert_eq!(StopReason::UserRequest.to_string(), "user request");
    }
}
