//! Pareto dominance and non-dominated sorting.
//!
//! Domain-agnostic building blocks for many-objective ranking. All
//! objectives are **minimized**: lower values are better.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic
//!   Algorithm: NSGA-II"
//! - Deb & Jain (2014), "An Evolutionary Many-Objective Optimization
//!   Algorithm Using Reference-Point-Based Nondominated Sorting"

/// Pareto dominance test (minimization).
///
/// `a` dominates `b` iff no component of `a` exceeds the matching component
/// of `b` and at least one is strictly smaller. Componentwise-equal vectors
/// do not dominate each other.
///
/// # Panics
///
/// Panics if the vectors differ in length.
///
/// # Example
///
/// ```
/// use evokit::pareto::dominates;
///
/// assert!(dominates(&[1.0, 2.0], &[2.0, 3.0]));
/// assert!(!dominates(&[1.0, 3.0], &[2.0, 2.0]));
/// assert!(!dominates(&[2.0, 2.0], &[2.0, 2.0]));
/// ```
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    assert_eq!(a.len(), b.len(), "objective vector length mismatch");
    if a.iter().zip(b).any(|(&va, &vb)| va > vb) {
        return false;
    }
    a.iter().zip(b).any(|(&va, &vb)| va < vb)
}

/// Partitions a population into Pareto fronts.
///
/// Returns front index lists: `fronts[0]` holds the indices of the
/// non-dominated solutions, `fronts[1]` the solutions dominated only by
/// front 0, and so on. Concatenated, the fronts are a permutation of
/// `0..objectives.len()`.
///
/// # Panics
///
/// Panics if `objectives` is empty or the inner vectors differ in length.
///
/// # Example
///
/// ```
/// use evokit::pareto::non_dominated_fronts;
///
/// let objectives = vec![
///     vec![1.0, 5.0],
///     vec![3.0, 3.0],
///     vec![5.0, 1.0],
///     vec![4.0, 4.0], // dominated by (3, 3)
/// ];
/// let fronts = non_dominated_fronts(&objectives);
/// assert_eq!(fronts[0], vec![0, 1, 2]);
/// assert_eq!(fronts[1], vec![3]);
/// ```
pub fn non_dominated_fronts(objectives: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let n = objectives.len();
    assert!(n > 0, "objectives must not be empty");

    let mut domination_set: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut dominated_count = vec![0usize; n];
    let mut front = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&objectives[i], &objectives[j]) {
                domination_set[i].push(j);
                dominated_count[j] += 1;
            }
            if dominates(&objectives[j], &objectives[i]) {
                domination_set[j].push(i);
                dominated_count[i] += 1;
            }
        }
        if dominated_count[i] == 0 {
            front.push(i);
        }
    }

    let mut fronts = vec![front];
    loop {
        let current = fronts.last().expect("fronts never empty");
        let mut next = Vec::new();
        for &i in current {
            for &j in &domination_set[i] {
                dominated_count[j] -= 1;
                if dominated_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        fronts.push(next);
    }
    fronts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominates_basic() {
        assert!(dominates(&[1.0, 1.0], &[2.0, 2.0]));
        assert!(dominates(&[1.0, 2.0], &[1.0, 3.0]));
        assert!(!dominates(&[2.0, 2.0], &[1.0, 1.0]));
    }

    #[test]
    fn test_equal_vectors_do_not_dominate() {
        let a = [2.0, 2.0, 2.0];
        assert!(!dominates(&a, &a));
    }

    #[test]
    fn test_incomparable_vectors() {
        assert!(!dominates(&[1.0, 3.0], &[3.0, 1.0]));
        assert!(!dominates(&[3.0, 1.0], &[1.0, 3.0]));
    }

    #[test]
    #[should_panic(expected = "objective vector length mismatch")]
    fn test_length_mismatch_panics() {
        dominates(&[1.0], &[1.0, 2.0]);
    }

    #[test]
    fn test_single_solution() {
        let fronts = non_dominated_fronts(&[vec![1.0, 2.0]]);
        assert_eq!(fronts, vec![vec![0]]);
    }

    #[test]
    fn test_two_non_dominated() {
        let fronts = non_dominated_fronts(&[vec![1.0, 3.0], vec![3.0, 1.0]]);
        assert_eq!(fronts.len(), 1);
        assert_eq!(fronts[0], vec![0, 1]);
    }

    #[test]
    fn test_chain_of_dominance() {
        let fronts = non_dominated_fronts(&[
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
        ]);
        assert_eq!(fronts, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_mixed_fronts() {
        let fronts = non_dominated_fronts(&[
            vec![1.0, 5.0],
            vec![3.0, 3.0],
            vec![5.0, 1.0],
            vec![4.0, 4.0], // dominated by (3, 3)
            vec![6.0, 6.0], // dominated by (4, 4) as well
        ]);
        assert_eq!(fronts[0], vec![0, 1, 2]);
        assert_eq!(fronts[1], vec![3]);
        assert_eq!(fronts[2], vec![4]);
    }

    #[test]
    fn test_all_equal_share_front_zero() {
        let fronts = non_dominated_fronts(&vec![vec![2.0, 2.0]; 4]);
        assert_eq!(fronts.len(), 1);
        assert_eq!(fronts[0].len(), 4);
    }

    #[test]
    fn test_three_objectives_cyclic_tradeoff() {
        let fronts = non_dominated_fronts(&[
            vec![1.0, 5.0, 3.0],
            vec![3.0, 1.0, 5.0],
            vec![5.0, 3.0, 1.0],
            vec![4.0, 4.0, 4.0], // incomparable with each of the above
        ]);
        assert_eq!(fronts.len(), 1);
        assert_eq!(fronts[0].len(), 4);
    }

    #[test]
    fn test_fronts_are_a_permutation() {
        let objectives: Vec<Vec<f64>> = (0..12)
            .map(|i| {
                let x = f64::from(i) / 11.0;
                vec![x, (1.0 - x) + if i % 3 == 0 { 0.5 } else { 0.0 }]
            })
            .collect();
        let fronts = non_dominated_fronts(&objectives);
        let mut seen: Vec<usize> = fronts.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..12).collect::<Vec<_>>());
    }
}
