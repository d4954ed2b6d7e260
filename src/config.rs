//! Engine configuration.
//!
//! [`GaConfig`] holds all numeric and threading parameters that control the
//! generational loop. Callback installation lives on the engine itself; the
//! mode/callback consistency checks run when a solve starts.

use crate::error::GaError;

/// The optimization regime the engine runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaMode {
    /// Single-objective minimization of a scalar fitness.
    Soga,
    /// Interactive single-objective: fitness depends on the whole current
    /// generation and evaluation consumes it, so variation is sequential.
    Iga,
    /// Many-objective Pareto optimization with reference-vector niching.
    NsgaIii,
}

impl GaMode {
    /// Whether this mode ranks by scalar `total_cost`.
    pub fn is_single_objective(self) -> bool {
        match self {
            GaMode::Soga | GaMode::Iga => true,
            GaMode::NsgaIii => false,
        }
    }

    /// Whether evaluation consumes the evolving new generation.
    pub fn is_interactive(self) -> bool {
        self == GaMode::Iga
    }
}

/// Parameters of the evolutionary loop.
///
/// # Defaults
///
/// ```
/// use evokit::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population, 50);
/// assert_eq!(config.elite_count, 5);
/// assert_eq!(config.generation_max, 100);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use evokit::{GaConfig, GaMode};
///
/// let config = GaConfig::default()
///     .with_mode(GaMode::Soga)
///     .with_population(200)
///     .with_crossover_fraction(0.8)
///     .with_mutation_rate(0.2)
///     .with_seed(42);
/// ```
#[derive(Debug, Clone)]
pub struct GaConfig {
    /// The optimization regime.
    pub mode: GaMode,

    /// Number of chromosomes in every completed generation.
    pub population: usize,

    /// Number of top-ranked chromosomes carried unchanged into the next
    /// generation.
    pub elite_count: usize,

    /// Fraction of the population produced by variation each generation,
    /// in `(0, 1]`. The child count is `round(population · fraction)`.
    pub crossover_fraction: f64,

    /// Probability that a freshly crossed-over child is mutated, in `[0, 1]`.
    pub mutation_rate: f64,

    /// Generation cap.
    pub generation_max: usize,

    /// Best-cost improvement below this tolerance counts as a stall.
    pub tol_stall_best: f64,

    /// Consecutive best-cost stalls that trigger termination.
    pub best_stall_max: usize,

    /// Average-cost improvement below this tolerance counts as a stall.
    pub tol_stall_average: f64,

    /// Consecutive average-cost stalls that trigger termination.
    pub average_stall_max: usize,

    /// Whether to evaluate candidates on a thread pool at all.
    pub multi_threading: bool,

    /// Chooses the dynamic mailbox pool over static chunk partitioning.
    pub dynamic_threading: bool,

    /// Worker count. Defaults to the hardware concurrency, or 8 when the
    /// platform does not report one.
    pub n_threads: usize,

    /// Microseconds the dynamic pool sleeps between dispatch polls.
    pub idle_delay_us: u64,

    /// Das–Dennis division count for NSGA-III reference vectors. Zero picks
    /// the smallest count whose lattice exceeds the population size.
    pub reference_vector_divisions: usize,

    /// Disables reference-vector niching; the last front is then filled by
    /// uniform random draws.
    pub enable_reference_vectors: bool,

    /// Seed for the shared generator. `None` seeds from entropy. Runs are
    /// reproducible only when threading is disabled.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            mode: GaMode::Soga,
            population: 50,
            elite_count: 5,
            crossover_fraction: 0.7,
            mutation_rate: 0.1,
            generation_max: 100,
            tol_stall_best: 1e-6,
            best_stall_max: 10,
            tol_stall_average: 1e-4,
            average_stall_max: 10,
            multi_threading: true,
            dynamic_threading: true,
            n_threads: default_thread_count(),
            idle_delay_us: 1000,
            reference_vector_divisions: 0,
            enable_reference_vectors: true,
            seed: None,
        }
    }
}

fn default_thread_count() -> usize {
    std::thread::available_parallelism().map_or(8, usize::from)
}

impl GaConfig {
    pub fn with_mode(mut self, mode: GaMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    pub fn with_elite_count(mut self, elite_count: usize) -> Self {
        self.elite_count = elite_count;
        self
    }

    pub fn with_crossover_fraction(mut self, fraction: f64) -> Self {
        self.crossover_fraction = fraction;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_generation_max(mut self, generation_max: usize) -> Self {
        self.generation_max = generation_max;
        self
    }

    pub fn with_stall_best(mut self, tolerance: f64, max_count: usize) -> Self {
        self.tol_stall_best = tolerance;
        self.best_stall_max = max_count;
        self
    }

    pub fn with_stall_average(mut self, tolerance: f64, max_count: usize) -> Self {
        self.tol_stall_average = tolerance;
        self.average_stall_max = max_count;
        self
    }

    pub fn with_multi_threading(mut self, enabled: bool) -> Self {
        self.multi_threading = enabled;
        self
    }

    pub fn with_dynamic_threading(mut self, enabled: bool) -> Self {
        self.dynamic_threading = enabled;
        self
    }

    pub fn with_n_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }

    pub fn with_idle_delay_us(mut self, idle_delay_us: u64) -> Self {
        self.idle_delay_us = idle_delay_us;
        self
    }

    pub fn with_reference_vector_divisions(mut self, divisions: usize) -> Self {
        self.reference_vector_divisions = divisions;
        self
    }

    pub fn with_enable_reference_vectors(mut self, enabled: bool) -> Self {
        self.enable_reference_vectors = enabled;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of children produced by variation each generation.
    pub fn variation_count(&self) -> usize {
        (self.population as f64 * self.crossover_fraction).round() as usize
    }

    /// Validates the numeric parameters.
    ///
    /// Callback/mode consistency is checked separately by the engine when a
    /// solve starts.
    pub fn validate(&self) -> Result<(), GaError> {
        if self.population < 1 {
            return Err(GaError::Config("population is below 1".into()));
        }
        if self.elite_count > self.population {
            return Err(GaError::Config(
                "elite_count exceeds the population size".into(),
            ));
        }
        if !(self.crossover_fraction > 0.0 && self.crossover_fraction <= 1.0) {
            return Err(GaError::Config(
                "crossover_fraction must lie in (0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(GaError::Config("mutation_rate must lie in [0, 1]".into()));
        }
        if self.n_threads < 1 {
            return Err(GaError::Config("number of threads is below 1".into()));
        }
        if self.mode.is_interactive()
            && self.elite_count + self.variation_count() != self.population
        {
            return Err(GaError::Config(
                "in interactive mode the elite count plus the variation child \
                 count must equal the population size"
                    .into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GaConfig::default();
        assert_eq!(config.mode, GaMode::Soga);
        assert_eq!(config.population, 50);
        assert_eq!(config.elite_count, 5);
        assert!((config.crossover_fraction - 0.7).abs() < 1e-12);
        assert!((config.mutation_rate - 0.1).abs() < 1e-12);
        assert_eq!(config.generation_max, 100);
        assert_eq!(config.best_stall_max, 10);
        assert_eq!(config.average_stall_max, 10);
        assert!(config.multi_threading);
        assert!(config.dynamic_threading);
        assert!(config.n_threads >= 1);
        assert_eq!(config.idle_delay_us, 1000);
        assert_eq!(config.reference_vector_divisions, 0);
        assert!(config.enable_reference_vectors);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GaConfig::default()
            .with_mode(GaMode::NsgaIii)
            .with_population(200)
            .with_elite_count(10)
            .with_crossover_fraction(0.8)
            .with_mutation_rate(0.05)
            .with_generation_max(1000)
            .with_stall_best(1e-8, 20)
            .with_stall_average(1e-5, 30)
            .with_multi_threading(false)
            .with_n_threads(4)
            .with_reference_vector_divisions(6)
            .with_seed(42);

        assert_eq!(config.mode, GaMode::NsgaIii);
        assert_eq!(config.population, 200);
        assert_eq!(config.elite_count, 10);
        assert!((config.crossover_fraction - 0.8).abs() < 1e-12);
        assert_eq!(config.generation_max, 1000);
        assert_eq!(config.best_stall_max, 20);
        assert_eq!(config.average_stall_max, 30);
        assert!(!config.multi_threading);
        assert_eq!(config.n_threads, 4);
        assert_eq!(config.reference_vector_divisions, 6);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_mode_predicates() {
        assert!(GaMode::Soga.is_single_objective());
        assert!(GaMode::Iga.is_single_objective());
        assert!(!GaMode::NsgaIii.is_single_objective());
        assert!(GaMode::Iga.is_interactive());
        assert!(!GaMode::Soga.is_interactive());
    }

    #[test]
    fn test_variation_count_rounds() {
        let config = GaConfig::default()
            .with_population(50)
            .with_crossover_fraction(0.7);
        assert_eq!(config.variation_count(), 35);
    }

    #[test]
    fn test_validate_ok() {
        assert!(GaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_population_too_small() {
        let config = GaConfig::default().with_population(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_elite_exceeds_population() {
        let config = GaConfig::default().with_population(4).with_elite_count(5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_crossover_fraction_range() {
        assert!(GaConfig::default()
            .with_crossover_fraction(0.0)
            .validate()
            .is_err());
        assert!(GaConfig::default()
            .with_crossover_fraction(1.2)
            .validate()
            .is_err());
        assert!(GaConfig::default()
            .with_population(10)
            .with_crossover_fraction(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_mutation_rate_range() {
        assert!(GaConfig::default()
            .with_mutation_rate(-0.1)
            .validate()
            .is_err());
        assert!(GaConfig::default()
            .with_mutation_rate(1.1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_zero_threads() {
        let config = GaConfig::default().with_n_threads(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_interactive_arithmetic() {
        // 10 elites + round(20 * 0.5) children == population: accepted.
        let ok = GaConfig::default()
            .with_mode(GaMode::Iga)
            .with_population(20)
            .with_elite_count(10)
            .with_crossover_fraction(0.5);
        assert!(ok.validate().is_ok());

        let bad = GaConfig::default()
            .with_mode(GaMode::Iga)
            .with_population(20)
            .with_elite_count(5)
            .with_crossover_fraction(0.5);
        assert!(bad.validate().is_err());
    }
}
