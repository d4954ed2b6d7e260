//! The generational evolutionary loop.
//!
//! [`GaEngine`] owns the population, the ranking and selection machinery,
//! the evaluation drivers, and the stop state machine. The caller supplies
//! behavior through boxed callbacks: gene initialization, evaluation,
//! variation operators, fitness finalization, and per-generation reporting.
//! Which callbacks must (and must not) be installed depends on the problem
//! mode and is checked when a solve starts.
//!
//! Per generation the engine runs: transfer → variation → objective
//! finalization → ranking → selection → ranking → statistics → report.
//! Generation zero replaces transfer and variation with population
//! initialization.

use crate::chromosome::{Chromosome, Generation, GenerationSummary, StopReason};
use crate::config::{GaConfig, GaMode};
use crate::error::GaError;
use crate::matrix::Matrix;
use crate::nsga3::{self, Nsga3State};
use crate::parallel::{self, SlotAction};
use crate::random::SharedRng;
use crate::reference;
use crate::selection;
use crate::timing::Chronometer;
use crate::pareto;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fills a freshly default-constructed gene vector with a random solution.
pub type InitGenesFn<G> = Box<dyn Fn(&mut G, &SharedRng) + Send + Sync>;
/// Evaluates genes into middle costs; `false` rejects the candidate.
pub type EvalSolutionFn<G, M> = Box<dyn Fn(&G, &mut M) -> bool + Send + Sync>;
/// Interactive evaluation: also sees the evolving new generation.
pub type EvalSolutionIgaFn<G, M> =
    Box<dyn Fn(&G, &mut M, &Generation<G, M>) -> bool + Send + Sync>;
/// Produces a mutated copy of the genes; the scalar shrinks step sizes as
/// generations progress.
pub type MutateFn<G> = Box<dyn Fn(&G, &SharedRng, f64) -> G + Send + Sync>;
/// Recombines two parents into child genes.
pub type CrossoverFn<G> = Box<dyn Fn(&G, &G, &SharedRng) -> G + Send + Sync>;
/// Aggregates middle costs into the scalar fitness (single-objective).
pub type SoFitnessFn<G, M> = Box<dyn Fn(&Chromosome<G, M>) -> f64 + Send + Sync>;
/// Assigns `total_cost` across a whole generation (interactive mode).
pub type IgaFitnessFn<G, M> = Box<dyn Fn(&mut Generation<G, M>) + Send + Sync>;
/// Produces the objective vector of a chromosome (many-objective).
pub type MoObjectivesFn<G, M> = Box<dyn Fn(&mut Chromosome<G, M>) -> Vec<f64> + Send + Sync>;
/// Optional dimensionality reduction applied before normalization.
pub type ObjectiveReductionFn = Box<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>;
/// Per-generation report with the best genes (single-objective modes).
pub type SoReportFn<G, M> = Box<dyn Fn(i32, &Generation<G, M>, &G) + Send + Sync>;
/// Per-generation report with the Pareto-front indices (many-objective).
pub type MoReportFn<G, M> = Box<dyn Fn(i32, &Generation<G, M>, &[usize]) + Send + Sync>;
/// Maps the generation step to the mutation shrink scale.
pub type ShrinkScheduleFn = Box<dyn Fn(i32, &SharedRng) -> f64 + Send + Sync>;
/// Pumped by the dynamic dispatcher while it waits for a free worker.
pub type RefreshFn = Box<dyn Fn() + Send + Sync>;

const CB_CHECKED: &str = "callback presence checked in check_settings";

/// Default mutation shrink schedule.
///
/// Unit scale for the first five generations, then `1/√(step − 4)`;
/// squared with probability 0.4, otherwise reset to 1 with probability 0.1
/// on a fresh draw.
pub fn default_shrink_scale(generation_step: i32, rng: &SharedRng) -> f64 {
    let mut scale = if generation_step <= 5 {
        1.0
    } else {
        1.0 / f64::from(generation_step - 5 + 1).sqrt()
    };
    if rng.rand01() < 0.4 {
        scale *= scale;
    } else if rng.rand01() < 0.1 {
        scale = 1.0;
    }
    scale
}

/// The genetic algorithm engine, generic over the caller's gene vector `G`
/// and middle-cost scratch type `M`.
///
/// # Example
///
/// ```
/// use evokit::{GaConfig, GaEngine, GaMode, SharedRng};
///
/// // Minimize x² over a scalar gene.
/// let config = GaConfig::default()
///     .with_mode(GaMode::Soga)
///     .with_population(20)
///     .with_elite_count(2)
///     .with_generation_max(10)
///     .with_multi_threading(false)
///     .with_seed(42);
/// let mut engine: GaEngine<f64, f64> = GaEngine::new(config);
///
/// engine.init_genes = Some(Box::new(|x, rng| *x = 10.0 - 20.0 * rng.rand01()));
/// engine.eval_solution = Some(Box::new(|x, cost| {
///     *cost = x * x;
///     true
/// }));
/// engine.calculate_so_total_fitness = Some(Box::new(|ch| ch.middle));
/// engine.mutate = Some(Box::new(|x, rng, shrink| x + (rng.rand01() - 0.5) * shrink));
/// engine.crossover = Some(Box::new(|a, b, rng| {
///     let r = rng.rand01();
///     r * a + (1.0 - r) * b
/// }));
/// engine.so_report_generation = Some(Box::new(|_, _, _| {}));
///
/// let stop = engine.solve().unwrap();
/// assert!(engine.last_generation.best_total_cost < 10.0);
/// println!("stopped: {stop}");
/// ```
pub struct GaEngine<G, M> {
    /// Numeric and threading parameters.
    pub config: GaConfig,

    pub init_genes: Option<InitGenesFn<G>>,
    pub eval_solution: Option<EvalSolutionFn<G, M>>,
    pub eval_solution_iga: Option<EvalSolutionIgaFn<G, M>>,
    pub mutate: Option<MutateFn<G>>,
    pub crossover: Option<CrossoverFn<G>>,
    pub calculate_so_total_fitness: Option<SoFitnessFn<G, M>>,
    pub calculate_iga_total_fitness: Option<IgaFitnessFn<G, M>>,
    pub calculate_mo_objectives: Option<MoObjectivesFn<G, M>>,
    pub distribution_objective_reductions: Option<ObjectiveReductionFn>,
    pub so_report_generation: Option<SoReportFn<G, M>>,
    pub mo_report_generation: Option<MoReportFn<G, M>>,
    pub custom_refresh: Option<RefreshFn>,
    /// Mutation shrink schedule; defaults to [`default_shrink_scale`].
    pub shrink_schedule: ShrinkScheduleFn,

    /// Seed gene vectors evaluated into generation zero before random fill.
    pub user_initial_solutions: Vec<G>,

    /// The most recently completed (or, after cancellation, abandoned)
    /// generation.
    pub last_generation: Generation<G, M>,
    /// Best and average cost per completed generation.
    pub history: Vec<GenerationSummary>,

    rng: SharedRng,
    cancel: Arc<AtomicBool>,
    generation_step: i32,
    best_stall_count: usize,
    average_stall_count: usize,
    n_robj: usize,
    divisions: usize,
    nsga: Nsga3State,
    total_attempts: u64,
}

impl<G, M> GaEngine<G, M>
where
    G: Clone + Default + Send + Sync,
    M: Clone + Default + Send + Sync,
{
    pub fn new(config: GaConfig) -> Self {
        let rng = SharedRng::new(config.seed);
        Self {
            config,
            init_genes: None,
            eval_solution: None,
            eval_solution_iga: None,
            mutate: None,
            crossover: None,
            calculate_so_total_fitness: None,
            calculate_iga_total_fitness: None,
            calculate_mo_objectives: None,
            distribution_objective_reductions: None,
            so_report_generation: None,
            mo_report_generation: None,
            custom_refresh: None,
            shrink_schedule: Box::new(default_shrink_scale),
            user_initial_solutions: Vec::new(),
            last_generation: Generation::default(),
            history: Vec::new(),
            rng,
            cancel: Arc::new(AtomicBool::new(false)),
            generation_step: -1,
            best_stall_count: 0,
            average_stall_count: 0,
            n_robj: 0,
            divisions: 0,
            nsga: Nsga3State::default(),
            total_attempts: 0,
        }
    }

    /// The shared random service handed to callbacks.
    pub fn rng(&self) -> &SharedRng {
        &self.rng
    }

    /// A clone of the cooperative stop flag, usable from other threads.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Raises the cooperative stop flag. The current generation is
    /// abandoned between phases and the solve returns
    /// [`StopReason::UserRequest`].
    pub fn request_stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Whether the cooperative stop flag is raised.
    pub fn stop_requested(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// −1 before initialization, 0 at generation zero, then incremented.
    pub fn generation_step(&self) -> i32 {
        self.generation_step
    }

    /// Cumulative evaluation attempts over the current solve, including
    /// rejected candidates.
    pub fn evaluation_attempts(&self) -> u64 {
        self.total_attempts
    }

    /// The Das–Dennis lattice, once generated (many-objective runs only).
    pub fn reference_vectors(&self) -> &Matrix<f64> {
        &self.nsga.reference_vectors
    }

    /// The effective division count after auto-sizing.
    pub fn reference_vector_divisions(&self) -> usize {
        self.divisions
    }

    /// The running componentwise minimum of the reduced objectives.
    pub fn ideal_objectives(&self) -> &[f64] {
        &self.nsga.ideal_objectives
    }

    /// Runs the full loop: initialization, then generations until a stop
    /// condition holds.
    pub fn solve(&mut self) -> Result<StopReason, GaError> {
        self.solve_init()?;
        let mut stop = StopReason::Undefined;
        while stop == StopReason::Undefined {
            stop = self.solve_next_generation()?;
        }
        log::info!("stop criteria: {stop}");
        Ok(stop)
    }

    /// Validates the configuration and produces generation zero.
    pub fn solve_init(&mut self) -> Result<(), GaError> {
        self.check_settings()?;
        self.average_stall_count = 0;
        self.best_stall_count = 0;
        self.generation_step = -1;
        self.total_attempts = 0;
        self.history.clear();
        self.divisions = self.config.reference_vector_divisions;

        log::info!(
            "ga started: population={} elite_count={} crossover_fraction={} mutation_rate={}",
            self.config.population,
            self.config.elite_count,
            self.config.crossover_fraction,
            self.config.mutation_rate
        );

        let mut timer = Chronometer::new();
        timer.tic();

        let mut generation0 = Generation::default();
        let attempts = self.init_population(&mut generation0);
        self.total_attempts += attempts;
        log::debug!(
            "initial population of {} created with {} attempts",
            self.config.population,
            attempts
        );

        self.generation_step = 0;
        self.finalize_objectives(&mut generation0);

        if !self.config.mode.is_single_objective() && !self.stop_requested() {
            self.calculate_n_robj(&generation0)?;
            if self.divisions == 0 {
                self.divisions = reference::auto_divisions(self.n_robj, self.config.population);
                log::debug!("reference vector divisions auto-selected: {}", self.divisions);
            }
        }

        self.rank_population(&mut generation0);
        self.finalize_generation(&mut generation0);
        if !self.config.mode.is_single_objective() && !self.stop_requested() {
            self.update_ideal_objectives(&generation0, true);
            self.nsga.extreme_objectives.clear();
            self.nsga.scalarized_objectives_min.clear();
        }
        generation0.exe_time = timer.toc()?;

        if !self.stop_requested() {
            self.history.push(GenerationSummary::from(&generation0));
            self.report_generation(&generation0);
        }
        self.last_generation = generation0;
        Ok(())
    }

    /// Produces one generation and reports whether the loop should stop.
    pub fn solve_next_generation(&mut self) -> Result<StopReason, GaError> {
        let mut timer = Chronometer::new();
        timer.tic();
        self.generation_step += 1;

        let mut new_generation = Generation::default();
        self.transfer(&mut new_generation);
        let attempts = self.crossover_and_mutation(&mut new_generation);
        self.total_attempts += attempts;

        self.finalize_objectives(&mut new_generation);
        self.rank_population(&mut new_generation);
        let mut selected = self.select_population(&new_generation)?;
        self.rank_population(&mut selected);
        self.finalize_generation(&mut selected);
        selected.exe_time = timer.toc()?;

        if !self.stop_requested() {
            self.history.push(GenerationSummary::from(&selected));
            self.report_generation(&selected);
        }
        self.last_generation = selected;

        Ok(self.stop_criteria())
    }

    /// Verifies the callback/mode matrix and the numeric configuration.
    fn check_settings(&self) -> Result<(), GaError> {
        let config_err = |message: &str| Err(GaError::Config(message.into()));

        if self.config.mode.is_interactive() {
            if self.calculate_iga_total_fitness.is_none() {
                return config_err("calculate_iga_total_fitness is unset in interactive mode");
            }
            if self.calculate_so_total_fitness.is_some() {
                return config_err("calculate_so_total_fitness is set in interactive mode");
            }
            if self.calculate_mo_objectives.is_some() {
                return config_err("calculate_mo_objectives is set in interactive mode");
            }
            if self.distribution_objective_reductions.is_some() {
                return config_err(
                    "distribution_objective_reductions is set in interactive mode",
                );
            }
            if self.eval_solution_iga.is_none() {
                return config_err("eval_solution_iga is unset in interactive mode");
            }
            if self.eval_solution.is_some() {
                return config_err(
                    "eval_solution is set in interactive mode (use eval_solution_iga)",
                );
            }
        } else {
            if self.calculate_iga_total_fitness.is_some() {
                return config_err("calculate_iga_total_fitness is set in non-interactive mode");
            }
            if self.eval_solution_iga.is_some() {
                return config_err("eval_solution_iga is set in non-interactive mode");
            }
            if self.eval_solution.is_none() {
                return config_err("eval_solution is unset");
            }
            if self.config.mode.is_single_objective() {
                if self.calculate_so_total_fitness.is_none() {
                    return config_err(
                        "calculate_so_total_fitness is unset in single-objective mode",
                    );
                }
                if self.calculate_mo_objectives.is_some() {
                    return config_err("calculate_mo_objectives is set in single-objective mode");
                }
                if self.distribution_objective_reductions.is_some() {
                    return config_err(
                        "distribution_objective_reductions is set in single-objective mode",
                    );
                }
            } else {
                if self.calculate_so_total_fitness.is_some() {
                    return config_err("calculate_so_total_fitness is set in many-objective mode");
                }
                if self.calculate_mo_objectives.is_none() {
                    return config_err("calculate_mo_objectives is unset in many-objective mode");
                }
            }
        }

        if self.init_genes.is_none() {
            return config_err("init_genes is unset");
        }
        if self.mutate.is_none() {
            return config_err("mutate is unset");
        }
        if self.crossover.is_none() {
            return config_err("crossover is unset");
        }

        if self.config.mode.is_single_objective() {
            if self.so_report_generation.is_none() {
                return config_err("so_report_generation is unset in a single-objective mode");
            }
            if self.mo_report_generation.is_some() {
                return config_err("mo_report_generation is set in a single-objective mode");
            }
        } else {
            if self.so_report_generation.is_some() {
                return config_err("so_report_generation is set in many-objective mode");
            }
            if self.mo_report_generation.is_none() {
                return config_err("mo_report_generation is unset in many-objective mode");
            }
        }

        self.config.validate()
    }

    // ------------------------------------------------------------------
    // Population construction
    // ------------------------------------------------------------------

    /// Builds generation zero: user seeds first, random fill after.
    fn init_population(&self, generation0: &mut Generation<G, M>) -> u64 {
        let population = self.config.population;
        generation0.chromosomes.reserve(population);

        for genes in &self.user_initial_solutions {
            if generation0.chromosomes.len() >= population {
                break;
            }
            let mut middle = M::default();
            let accepted = if self.config.mode.is_interactive() {
                let eval = self.eval_solution_iga.as_ref().expect(CB_CHECKED);
                eval(genes, &mut middle, generation0)
            } else {
                let eval = self.eval_solution.as_ref().expect(CB_CHECKED);
                eval(genes, &mut middle)
            };
            if accepted {
                generation0
                    .chromosomes
                    .push(Chromosome::new(genes.clone(), middle));
            } else {
                log::debug!("user initial solution rejected by evaluation");
            }
        }

        let n_add = population.saturating_sub(generation0.chromosomes.len());
        if self.config.mode.is_interactive() {
            return self.init_population_iga(generation0, n_add);
        }

        let action = |attempts: &mut u64| self.create_random_chromosome(attempts);
        let (slots, attempts) = self.run_slot_action(n_add, &action);
        generation0.chromosomes.extend(slots.into_iter().flatten());
        attempts
    }

    /// Interactive initialization is sequential: evaluation consumes the
    /// generation built so far.
    fn init_population_iga(&self, generation0: &mut Generation<G, M>, n_add: usize) -> u64 {
        let mut attempts = 0;
        for _ in 0..n_add {
            if self.stop_requested() {
                break;
            }
            loop {
                let mut genes = G::default();
                (self.init_genes.as_ref().expect(CB_CHECKED))(&mut genes, &self.rng);
                let mut middle = M::default();
                attempts += 1;
                let eval = self.eval_solution_iga.as_ref().expect(CB_CHECKED);
                if eval(&genes, &mut middle, generation0) {
                    generation0.chromosomes.push(Chromosome::new(genes, middle));
                    break;
                }
            }
        }
        attempts
    }

    /// Draws random gene vectors until one passes evaluation. Every try is
    /// counted as an attempt.
    fn create_random_chromosome(&self, attempts: &mut u64) -> Chromosome<G, M> {
        loop {
            let mut genes = G::default();
            (self.init_genes.as_ref().expect(CB_CHECKED))(&mut genes, &self.rng);
            let mut middle = M::default();
            *attempts += 1;
            let eval = self.eval_solution.as_ref().expect(CB_CHECKED);
            if eval(&genes, &mut middle) {
                return Chromosome::new(genes, middle);
            }
        }
    }

    /// Copies the previous generation into the new one: all chromosomes in
    /// the non-interactive modes, elites only in interactive mode (where
    /// evaluation is expensive by definition).
    fn transfer(&self, new_generation: &mut Generation<G, M>) {
        if self.stop_requested() {
            return;
        }
        if self.config.mode.is_interactive() {
            for i in 0..self.config.elite_count {
                let index = self.last_generation.sorted_indices[i];
                new_generation
                    .chromosomes
                    .push(self.last_generation.chromosomes[index].clone());
            }
        } else {
            new_generation
                .chromosomes
                .extend(self.last_generation.chromosomes.iter().cloned());
        }
    }

    /// Produces the variation children for this generation.
    fn crossover_and_mutation(&self, new_generation: &mut Generation<G, M>) -> u64 {
        if self.stop_requested() || self.generation_step <= 0 {
            return 0;
        }
        let n_add = self.config.variation_count();

        let attempts = if self.config.mode.is_interactive() {
            self.variation_iga(new_generation, n_add)
        } else {
            let action = |attempts: &mut u64| self.create_offspring(attempts);
            let (slots, attempts) = self.run_slot_action(n_add, &action);
            new_generation.chromosomes.extend(slots.into_iter().flatten());
            attempts
        };
        log::debug!(
            "variation produced {} children with {} rejected candidates",
            n_add,
            attempts
        );
        attempts
    }

    fn variation_iga(&self, new_generation: &mut Generation<G, M>, n_add: usize) -> u64 {
        let mut attempts = 0;
        for _ in 0..n_add {
            if self.stop_requested() {
                break;
            }
            loop {
                let genes = self.recombine_parents();
                let mut middle = M::default();
                let eval = self.eval_solution_iga.as_ref().expect(CB_CHECKED);
                if eval(&genes, &mut middle, new_generation) {
                    new_generation.chromosomes.push(Chromosome::new(genes, middle));
                    break;
                }
                attempts += 1;
            }
        }
        attempts
    }

    /// Crossover and mutation followed by evaluation; rejected candidates
    /// redraw fresh parents and count as attempts.
    fn create_offspring(&self, attempts: &mut u64) -> Chromosome<G, M> {
        loop {
            let genes = self.recombine_parents();
            let mut middle = M::default();
            let eval = self.eval_solution.as_ref().expect(CB_CHECKED);
            if eval(&genes, &mut middle) {
                return Chromosome::new(genes, middle);
            }
            *attempts += 1;
        }
    }

    /// Samples two distinct parents and applies crossover and (with the
    /// configured probability) mutation.
    fn recombine_parents(&self) -> G {
        let (p1, p2) = loop {
            let a = selection::select_parent(&self.last_generation, &self.rng);
            let b = selection::select_parent(&self.last_generation, &self.rng);
            if a != b {
                break (a, b);
            }
        };
        let parents = &self.last_generation.chromosomes;
        let crossover = self.crossover.as_ref().expect(CB_CHECKED);
        let mut genes = crossover(&parents[p1].genes, &parents[p2].genes, &self.rng);
        if self.rng.rand01() <= self.config.mutation_rate {
            let scale = (self.shrink_schedule)(self.generation_step, &self.rng);
            let mutate = self.mutate.as_ref().expect(CB_CHECKED);
            genes = mutate(&genes, &self.rng, scale);
        }
        genes
    }

    /// Dispatches a slot action to the configured evaluation strategy.
    fn run_slot_action(
        &self,
        n_add: usize,
        action: &SlotAction<'_, G, M>,
    ) -> (Vec<Option<Chromosome<G, M>>>, u64) {
        if !self.config.multi_threading || self.config.n_threads == 1 {
            parallel::run_sequential(n_add, &self.cancel, action)
        } else if self.config.dynamic_threading {
            let refresh = self
                .custom_refresh
                .as_deref()
                .map(|f| f as &(dyn Fn() + Sync));
            parallel::run_dynamic(
                n_add,
                self.config.n_threads,
                Duration::from_micros(self.config.idle_delay_us),
                &self.cancel,
                refresh,
                action,
            )
        } else {
            parallel::run_static(n_add, self.config.n_threads, &self.cancel, action)
        }
    }

    // ------------------------------------------------------------------
    // Fitness finalization and ranking
    // ------------------------------------------------------------------

    fn finalize_objectives(&self, generation: &mut Generation<G, M>) {
        if self.stop_requested() {
            return;
        }
        match self.config.mode {
            GaMode::Soga => {
                let fitness = self.calculate_so_total_fitness.as_ref().expect(CB_CHECKED);
                for chromosome in &mut generation.chromosomes {
                    let cost = fitness(chromosome);
                    chromosome.total_cost = cost;
                }
            }
            GaMode::Iga => {
                let fitness = self.calculate_iga_total_fitness.as_ref().expect(CB_CHECKED);
                fitness(generation);
            }
            GaMode::NsgaIii => {
                let objectives = self.calculate_mo_objectives.as_ref().expect(CB_CHECKED);
                for chromosome in &mut generation.chromosomes {
                    let values = objectives(chromosome);
                    chromosome.objectives = values;
                }
            }
        }
    }

    fn rank_population(&self, generation: &mut Generation<G, M>) {
        if self.stop_requested() {
            return;
        }
        if self.config.mode.is_single_objective() {
            selection::rank_population_so(generation, self.config.population);
        } else {
            self.rank_population_mo(generation);
        }
    }

    fn rank_population_mo(&self, generation: &mut Generation<G, M>) {
        let objectives: Vec<Vec<f64>> = generation
            .chromosomes
            .iter()
            .map(|c| c.objectives.clone())
            .collect();
        generation.fronts = pareto::non_dominated_fronts(&objectives);
        let mut ranks = vec![0usize; objectives.len()];
        for (front_index, front) in generation.fronts.iter().enumerate() {
            for &i in front {
                ranks[i] = front_index;
            }
        }
        selection::generate_selection_chance(generation, &ranks, self.config.population);
    }

    /// Single-objective population statistics. Ties on the minimum keep the
    /// last index encountered.
    fn finalize_generation(&self, generation: &mut Generation<G, M>) {
        if self.stop_requested() || !self.config.mode.is_single_objective() {
            return;
        }
        if generation.chromosomes.is_empty() {
            return;
        }
        let mut best = generation.chromosomes[0].total_cost;
        let mut best_index = 0;
        let mut sum = 0.0;
        for (i, chromosome) in generation.chromosomes.iter().enumerate() {
            sum += chromosome.total_cost;
            if chromosome.total_cost <= best {
                best = chromosome.total_cost;
                best_index = i;
            }
        }
        generation.best_total_cost = best;
        generation.best_chromosome_index = Some(best_index);
        generation.average_cost = sum / generation.chromosomes.len() as f64;
    }

    fn report_generation(&self, generation: &Generation<G, M>) {
        if self.config.mode.is_single_objective() {
            let best_index = generation
                .best_chromosome_index
                .expect("statistics finalized before reporting");
            let report = self.so_report_generation.as_ref().expect(CB_CHECKED);
            report(
                self.generation_step,
                generation,
                &generation.chromosomes[best_index].genes,
            );
        } else {
            let report = self.mo_report_generation.as_ref().expect(CB_CHECKED);
            report(self.generation_step, generation, &generation.fronts[0]);
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    fn select_population(
        &mut self,
        merged: &Generation<G, M>,
    ) -> Result<Generation<G, M>, GaError> {
        if self.stop_requested() {
            return Ok(Generation::default());
        }
        if self.config.mode.is_single_objective() {
            Ok(self.select_population_so(merged))
        } else {
            self.select_population_mo(merged)
        }
    }

    /// Elite transfer plus blocked rank-based sampling: the top elites move
    /// over unchanged, the remaining slots are drawn without replacement
    /// from the merged population.
    fn select_population_so(&self, merged: &Generation<G, M>) -> Generation<G, M> {
        let mut selected = Generation::default();
        let mut blocked = Vec::with_capacity(self.config.population);

        for i in 0..self.config.elite_count {
            let index = merged.sorted_indices[i];
            selected
                .chromosomes
                .push(merged.chromosomes[index].clone());
            blocked.push(index);
        }
        log::debug!("transferred {} elites", self.config.elite_count);

        for _ in 0..self.config.population - self.config.elite_count {
            let index = loop {
                let candidate = selection::select_parent(merged, &self.rng);
                if !blocked.contains(&candidate) {
                    break candidate;
                }
            };
            selected
                .chromosomes
                .push(merged.chromosomes[index].clone());
            blocked.push(index);
        }
        selected
    }

    fn reduced_objectives(&self, chromosome: &Chromosome<G, M>) -> Vec<f64> {
        match &self.distribution_objective_reductions {
            Some(reduce) => reduce(&chromosome.objectives),
            None => chromosome.objectives.clone(),
        }
    }

    /// Tightens the running ideal point; `reset` bootstraps it from the
    /// first chromosome. The ideal is never re-bootstrapped mid-run, which
    /// keeps it componentwise non-increasing across generations.
    fn update_ideal_objectives(&mut self, generation: &Generation<G, M>, reset: bool) {
        if self.stop_requested() {
            return;
        }
        if reset {
            self.nsga.ideal_objectives = self.reduced_objectives(&generation.chromosomes[0]);
        }
        let n = self.nsga.ideal_objectives.len();
        for chromosome in &generation.chromosomes {
            let reduced = self.reduced_objectives(chromosome);
            for i in 0..n {
                if reduced[i] < self.nsga.ideal_objectives[i] {
                    self.nsga.ideal_objectives[i] = reduced[i];
                }
            }
        }
    }

    /// NSGA-III environmental selection: normalize, associate, then fill by
    /// fronts with reference-vector niching.
    fn select_population_mo(
        &mut self,
        merged: &Generation<G, M>,
    ) -> Result<Generation<G, M>, GaError> {
        self.update_ideal_objectives(merged, false);
        if self.n_robj == 0 {
            return Err(GaError::Invariant(
                "number of reduced objectives is zero".into(),
            ));
        }
        let population = self.config.population;
        let n_chromosomes = merged.chromosomes.len();

        // Translate reduced objectives to the ideal point.
        let mut zb = Matrix::new(n_chromosomes, self.n_robj);
        for i in 0..n_chromosomes {
            let reduced = self.reduced_objectives(&merged.chromosomes[i]);
            if reduced.len() != self.n_robj {
                return Err(GaError::Invariant(
                    "reduced objective vector length changed mid-run".into(),
                ));
            }
            for j in 0..self.n_robj {
                zb[(i, j)] = reduced[j] - self.nsga.ideal_objectives[j];
            }
        }

        self.nsga.scalarize(&zb);
        let intercepts = nsga3::hyperplane_intercepts(&self.nsga.extreme_objectives);

        let mut norm = Matrix::new(n_chromosomes, self.n_robj);
        for i in 0..n_chromosomes {
            for j in 0..self.n_robj {
                norm[(i, j)] = zb[(i, j)] / intercepts[j];
            }
        }

        if n_chromosomes == population {
            return Ok(merged.clone());
        }

        if self.nsga.reference_vectors.is_empty() {
            self.nsga.reference_vectors = reference::das_dennis(self.n_robj, self.divisions);
        }
        let (associated, distances) = nsga3::associate(&norm, &self.nsga.reference_vectors);
        let mut niche_count = vec![0usize; self.nsga.reference_vectors.n_rows()];

        // Whole fronts that still fit are taken en bloc; the chromosomes
        // placed this way seed the niche counts.
        let mut selected = Generation::default();
        let mut front_index = 0;
        while front_index < merged.fronts.len()
            && selected.chromosomes.len() + merged.fronts[front_index].len() <= population
        {
            for &i in &merged.fronts[front_index] {
                selected.chromosomes.push(merged.chromosomes[i].clone());
                niche_count[associated[i]] += 1;
            }
            front_index += 1;
        }

        let mut last_front = merged.fronts[front_index].clone();
        let mut to_add: Vec<usize> = Vec::new();
        while selected.chromosomes.len() + to_add.len() < population {
            if !self.config.enable_reference_vectors {
                let size = last_front.len();
                let mut pick = (self.rng.rand01() * size as f64).floor() as usize;
                if pick >= size {
                    pick = 0;
                }
                to_add.push(last_front[pick]);
                last_front.remove(pick);
                continue;
            }

            let min_niche_index = niche_count
                .iter()
                .enumerate()
                .min_by_key(|&(_, &count)| count)
                .map(|(index, _)| index)
                .expect("reference vectors exist");

            let neighbors: Vec<usize> = last_front
                .iter()
                .copied()
                .filter(|&i| associated[i] == min_niche_index)
                .collect();
            if neighbors.is_empty() {
                // Exclude this niche from further consideration.
                niche_count[min_niche_index] = 10 * merged.chromosomes.len();
                continue;
            }

            let chosen = if niche_count[min_niche_index] == 0 {
                let mut best = neighbors[0];
                let mut best_distance = distances[(best, min_niche_index)];
                for &i in &neighbors[1..] {
                    if distances[(i, min_niche_index)] < best_distance {
                        best = i;
                        best_distance = distances[(i, min_niche_index)];
                    }
                }
                best
            } else {
                let size = neighbors.len();
                let mut pick = (self.rng.rand01() * size as f64).floor() as usize;
                if pick >= size {
                    pick = 0;
                }
                neighbors[pick]
            };

            to_add.push(chosen);
            last_front.retain(|&i| i != chosen);
            niche_count[min_niche_index] += 1;
        }

        for &i in &to_add {
            selected.chromosomes.push(merged.chromosomes[i].clone());
        }
        Ok(selected)
    }

    fn calculate_n_robj(&mut self, generation: &Generation<G, M>) -> Result<(), GaError> {
        let first = generation
            .chromosomes
            .first()
            .ok_or_else(|| GaError::Invariant("first generation is empty".into()))?;
        self.n_robj = self.reduced_objectives(first).len();
        if self.n_robj == 0 {
            return Err(GaError::Invariant(
                "number of reduced objectives is zero".into(),
            ));
        }
        if self.n_robj == 1 {
            return Err(GaError::Config(
                "objective vector has length 1 in a many-objective optimization".into(),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stop state machine
    // ------------------------------------------------------------------

    fn stop_criteria(&mut self) -> StopReason {
        let cancelled = self.stop_requested();
        if self.generation_step < 2 && !cancelled {
            return StopReason::Undefined;
        }

        if self.config.mode.is_single_objective() && self.history.len() >= 2 {
            let previous = &self.history[self.history.len() - 2];
            let current = &self.history[self.history.len() - 1];
            if (previous.best_total_cost - current.best_total_cost).abs()
                < self.config.tol_stall_best
            {
                self.best_stall_count += 1;
            } else {
                self.best_stall_count = 0;
            }
            if (previous.average_cost - current.average_cost).abs()
                < self.config.tol_stall_average
            {
                self.average_stall_count += 1;
            } else {
                self.average_stall_count = 0;
            }
        }

        if self.generation_step >= self.config.generation_max as i32 {
            return StopReason::MaxGenerations;
        }
        if self.average_stall_count >= self.config.average_stall_max {
            return StopReason::StallAverage;
        }
        if self.best_stall_count >= self.config.best_stall_max {
            return StopReason::StallBest;
        }
        if cancelled {
            return StopReason::UserRequest;
        }
        StopReason::Undefined
    }
}
