//! Das–Dennis reference vector generation.
//!
//! NSGA-III spreads selection pressure uniformly over the objective space
//! by associating chromosomes with a lattice of points on the unit simplex.
//! The lattice for `dept` objectives and `d` divisions contains every
//! non-negative integer vector of length `dept` summing to `d`, scaled by
//! `1/d`, giving `C(dept + d − 1, d)` rows.
//!
//! # References
//!
//! - Das & Dennis (1998), "Normal-Boundary Intersection"
//! - Deb & Jain (2014), NSGA-III

use crate::matrix::Matrix;

/// Binomial coefficient `C(n, r)` with symmetric reduction.
///
/// Returns 0 when `r > n`.
///
/// # Example
///
/// ```
/// use evokit::reference::combination_count;
///
/// assert_eq!(combination_count(6, 4), 15);
/// ```
pub fn combination_count(n: usize, r: usize) -> usize {
    if r > n {
        return 0;
    }
    let r = r.min(n - r);
    if r == 0 {
        return 1;
    }
    let mut ncr = n as u128;
    for i in 2..=r {
        ncr *= (n - i + 1) as u128;
        ncr /= i as u128;
    }
    ncr as usize
}

/// Number of simplex-lattice points for `n_objectives` and `n_divisions`.
pub fn reference_vector_count(n_objectives: usize, n_divisions: usize) -> usize {
    combination_count(n_objectives + n_divisions - 1, n_divisions)
}

/// Smallest division count `d ≥ 2` whose lattice exceeds the population.
pub(crate) fn auto_divisions(n_objectives: usize, population: usize) -> usize {
    let mut divisions = 2;
    while reference_vector_count(n_objectives, divisions) <= population {
        divisions += 1;
    }
    divisions
}

/// Enumerates the integer lattice: all vectors of length `dept` with
/// non-negative components summing to `divisions`. The first coordinate
/// varies slowest, ascending from 0.
fn integer_lattice(dept: usize, divisions: usize) -> Vec<Vec<f64>> {
    assert!(dept >= 1, "reference vector depth must be at least 1");
    if dept == 1 {
        return vec![vec![divisions as f64]];
    }
    let mut result = Vec::new();
    for i in 0..=divisions {
        for tail in integer_lattice(dept - 1, divisions - i) {
            let mut vector = Vec::with_capacity(dept);
            vector.push(i as f64);
            vector.extend(tail);
            result.push(vector);
        }
    }
    result
}

/// Generates the scaled Das–Dennis lattice as a row-major matrix.
///
/// Each row has components in `[0, 1]` summing to 1.
///
/// # Panics
///
/// Panics if `dept < 1` or `divisions < 1`.
///
/// # Example
///
/// ```
/// use evokit::reference::{das_dennis, reference_vector_count};
///
/// let lattice = das_dennis(3, 4);
/// assert_eq!(lattice.n_rows(), reference_vector_count(3, 4));
/// assert_eq!(lattice.n_cols(), 3);
/// ```
pub fn das_dennis(dept: usize, divisions: usize) -> Matrix<f64> {
    assert!(divisions >= 1, "division count must be at least 1");
    let mut lattice = Matrix::from(integer_lattice(dept, divisions));
    for i in 0..lattice.n_rows() {
        for j in 0..lattice.n_cols() {
            lattice[(i, j)] /= divisions as f64;
        }
    }
    lattice
}
