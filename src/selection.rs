//! Rank-based stochastic parent selection.
//!
//! Both regimes map chromosomes to ranks — position in the ascending cost
//! sort for single-objective runs, Pareto front index for many-objective
//! runs — and convert ranks into a cumulative chance table with weight
//! `1/√(rank + 1)`. Better ranks are favored without ever excluding the
//! tail of the population.

use crate::chromosome::Generation;
use crate::random::SharedRng;

/// Builds the cumulative selection chance table from a rank vector.
///
/// The table is normalized by its entry at index `population − 1`, so for a
/// completed generation of exactly `population` chromosomes the final entry
/// is 1. On a merged parent+offspring generation the entries past that
/// index exceed 1, which confines sampling to the first `population` slots.
pub(crate) fn generate_selection_chance<G, M>(
    generation: &mut Generation<G, M>,
    ranks: &[usize],
    population: usize,
) {
    let n = generation.chromosomes.len();
    debug_assert_eq!(ranks.len(), n);
    debug_assert!(population >= 1 && population <= n);

    generation.selection_chance_cumulative.clear();
    generation.selection_chance_cumulative.reserve(n);
    let mut cumulative = 0.0;
    for &rank in ranks {
        cumulative += 1.0 / ((rank + 1) as f64).sqrt();
        generation.selection_chance_cumulative.push(cumulative);
    }
    let norm = generation.selection_chance_cumulative[population - 1];
    for chance in &mut generation.selection_chance_cumulative {
        *chance /= norm;
    }
}

/// Samples one parent index from the cumulative chance table.
///
/// Draws `r` uniformly from `[0, 1)` and returns the smallest index whose
/// cumulative chance reaches `r`, or the last index as a floating-point
/// fallback.
pub(crate) fn select_parent<G, M>(generation: &Generation<G, M>, rng: &SharedRng) -> usize {
    let r = rng.rand01();
    let chances = &generation.selection_chance_cumulative;
    chances
        .iter()
        .position(|&chance| chance >= r)
        .unwrap_or(chances.len() - 1)
}

/// Ranks a single-objective generation.
///
/// Fills `sorted_indices` with a permutation ordered by ascending
/// `total_cost` and rebuilds the selection chance table from the resulting
/// positions. Ties may land in either order; sampling re-randomizes anyway.
pub(crate) fn rank_population_so<G, M>(generation: &mut Generation<G, M>, population: usize) {
    let n = generation.chromosomes.len();
    generation.sorted_indices.clear();
    generation.sorted_indices.extend(0..n);
    let costs: Vec<f64> = generation.chromosomes.iter().map(|c| c.total_cost).collect();
    generation
        .sorted_indices
        .sort_unstable_by(|&a, &b| costs[a].total_cmp(&costs[b]));

    let mut ranks = vec![0usize; n];
    for (position, &index) in generation.sorted_indices.iter().enumerate() {
        ranks[index] = position;
    }
    generate_selection_chance(generation, &ranks, population);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::Chromosome;

    fn generation_with_costs(costs: &[f64]) -> Generation<f64, f64> {
        let mut generation = Generation::default();
        for &cost in costs {
            let mut chromosome = Chromosome::new(0.0, 0.0);
            chromosome.total_cost = cost;
            generation.chromosomes.push(chromosome);
        }
        generation
    }

    #[test]
    fn test_sorted_indices_ascending_permutation() {
        let mut generation = generation_with_costs(&[3.0, 1.0, 2.0, 0.5]);
        rank_population_so(&mut generation, 4);
        assert_eq!(generation.sorted_indices, vec![3, 1, 2, 0]);

        let mut seen = generation.sorted_indices.clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_chance_table_strictly_increasing_ends_at_one() {
        let mut generation = generation_with_costs(&[5.0, 2.0, 9.0, 1.0, 4.0]);
        rank_population_so(&mut generation, 5);
        let chances = &generation.selection_chance_cumulative;
        assert_eq!(chances.len(), 5);
        for pair in chances.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        assert!((chances[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_merged_generation_normalizes_at_population_entry() {
        // Six chromosomes ranked, population of four: the fourth entry is 1
        // and the tail exceeds it, keeping draws inside the first four slots.
        let mut generation = generation_with_costs(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        rank_population_so(&mut generation, 4);
        let chances = &generation.selection_chance_cumulative;
        assert!((chances[3] - 1.0).abs() < 1e-12);
        assert!(chances[4] > 1.0);
        assert!(chances[5] > chances[4]);
    }

    #[test]
    fn test_select_parent_stays_in_population_window() {
        let mut generation = generation_with_costs(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        rank_population_so(&mut generation, 4);
        let rng = SharedRng::new(Some(11));
        for _ in 0..2000 {
            assert!(select_parent(&generation, &rng) < 4);
        }
    }

    #[test]
    fn test_select_parent_favors_better_ranks() {
        let mut generation = generation_with_costs(&[10.0, 1.0, 5.0, 7.0]);
        rank_population_so(&mut generation, 4);
        let rng = SharedRng::new(Some(5));
        let mut counts = [0u32; 4];
        let draws = 20_000;
        for _ in 0..draws {
            counts[select_parent(&generation, &rng)] += 1;
        }
        // Index 1 holds the best cost and therefore rank 0.
        assert!(counts[1] > counts[0]);
        assert!(counts[1] > counts[3]);
        // Nobody is excluded.
        assert!(counts.iter().all(|&c| c > 0));
    }
}
