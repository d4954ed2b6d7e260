//! NSGA-III normalization machinery.
//!
//! Selection in the many-objective regime works on objectives translated to
//! the running ideal point and scaled by adaptive hyperplane intercepts:
//!
//! 1. track the componentwise minimum of the (optionally reduced)
//!    objectives seen so far;
//! 2. per objective axis, keep the historically best achievement-scalarized
//!    chromosome as an extreme point;
//! 3. solve the hyperplane through the extreme points for its axis
//!    intercepts;
//! 4. divide the translated objectives by the intercepts and associate each
//!    chromosome with the nearest unit reference vector.
//!
//! # References
//!
//! - Deb & Jain (2014), "An Evolutionary Many-Objective Optimization
//!   Algorithm Using Reference-Point-Based Nondominated Sorting"

use crate::matrix::Matrix;

/// Euclidean norm.
pub(crate) fn norm2(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Adaptive normalization state carried across generations.
#[derive(Debug, Clone, Default)]
pub(crate) struct Nsga3State {
    /// Componentwise minimum of the reduced objectives seen so far.
    pub ideal_objectives: Vec<f64>,
    /// One row per objective axis: the translated objectives of the
    /// historically best scalarization for that axis.
    pub extreme_objectives: Matrix<f64>,
    /// Historical minima of the per-axis achievement scalarizations.
    pub scalarized_objectives_min: Vec<f64>,
    /// Lazily generated Das–Dennis lattice.
    pub reference_vectors: Matrix<f64>,
}

impl Nsga3State {
    /// Updates the per-axis extreme points from the translated objectives
    /// `zb` (rows: chromosomes, cols: reduced objectives).
    ///
    /// Axis `i` uses weights of 1e-10 everywhere except 1 on component `i`;
    /// the chromosome minimizing `max_k zb[x, k] / w[k]` becomes the new
    /// extreme for that axis whenever it beats the historical minimum.
    pub fn scalarize(&mut self, zb: &Matrix<f64>) {
        let n_objectives = zb.n_cols();
        if self.scalarized_objectives_min.is_empty() {
            self.extreme_objectives.resize(n_objectives, n_objectives);
            self.scalarized_objectives_min = vec![f64::INFINITY; n_objectives];
        }

        for i in 0..n_objectives {
            let mut weights = vec![1e-10; n_objectives];
            weights[i] = 1.0;

            let mut min_scalarized = f64::INFINITY;
            let mut min_index = 0;
            for row in 0..zb.n_rows() {
                let mut scalarized = f64::NEG_INFINITY;
                for (k, &w) in weights.iter().enumerate() {
                    scalarized = scalarized.max(zb[(row, k)] / w);
                }
                if scalarized < min_scalarized {
                    min_scalarized = scalarized;
                    min_index = row;
                }
            }

            if min_scalarized < self.scalarized_objectives_min[i] {
                self.scalarized_objectives_min[i] = min_scalarized;
                let row = zb.row(min_index);
                self.extreme_objectives.set_row(i, &row);
            }
        }
    }
}

/// Solves `Aᵀ x = 1` for the extreme-point matrix `A` and returns the
/// hyperplane intercepts `1 / x[i]`.
///
/// Uses Doolittle LU decomposition without pivoting. A degenerate extreme
/// set (singular matrix, or intercepts that come out non-finite or
/// non-positive) falls back to the componentwise maximum of the extreme
/// rows, floored at 1e-12.
pub(crate) fn hyperplane_intercepts(extreme_objectives: &Matrix<f64>) -> Vec<f64> {
    assert_eq!(
        extreme_objectives.n_rows(),
        extreme_objectives.n_cols(),
        "extreme objective matrix must be square"
    );
    let n = extreme_objectives.n_rows();
    let mut lower = Matrix::new(n, n);
    let mut upper = Matrix::new(n, n);

    for i in 0..n {
        for k in i..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += lower[(i, j)] * upper[(j, k)];
            }
            upper[(i, k)] = extreme_objectives[(k, i)] - sum;
        }
        for k in i..n {
            if i == k {
                lower[(i, i)] = 1.0;
            } else {
                let mut sum = 0.0;
                for j in 0..i {
                    sum += lower[(k, j)] * upper[(j, i)];
                }
                lower[(k, i)] = (extreme_objectives[(i, k)] - sum) / upper[(i, i)];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = 0.0;
        for k in 0..i {
            sum += lower[(i, k)] * y[k];
        }
        y[i] = (1.0 - sum) / lower[(i, i)];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for k in (i + 1)..n {
            sum += upper[(i, k)] * x[k];
        }
        x[i] = (y[i] - sum) / upper[(i, i)];
    }

    let intercepts: Vec<f64> = x.iter().map(|&xi| 1.0 / xi).collect();
    if intercepts.iter().all(|&v| v.is_finite() && v > 1e-12) {
        return intercepts;
    }

    // Degenerate extreme set: fall back to per-axis maxima.
    (0..n)
        .map(|j| {
            extreme_objectives
                .col(j)
                .into_iter()
                .fold(1e-12_f64, f64::max)
        })
        .collect()
}

/// Associates each normalized chromosome with its closest reference vector.
///
/// Returns, per chromosome, the index of the reference vector minimizing
/// the perpendicular distance from the chromosome's normalized objectives
/// to the reference ray, and the full chromosome × reference distance
/// matrix for the niching loop.
pub(crate) fn associate(
    norm_objectives: &Matrix<f64>,
    reference_vectors: &Matrix<f64>,
) -> (Vec<usize>, Matrix<f64>) {
    let n_chromosomes = norm_objectives.n_rows();
    let n_references = reference_vectors.n_rows();
    assert_eq!(
        norm_objectives.n_cols(),
        reference_vectors.n_cols(),
        "objective/reference dimension mismatch"
    );

    // Unit reference directions, computed once.
    let units: Vec<Vec<f64>> = (0..n_references)
        .map(|j| {
            let row = reference_vectors.row(j);
            let norm = norm2(&row);
            row.into_iter().map(|v| v / norm).collect()
        })
        .collect();

    let mut distances = Matrix::new(n_chromosomes, n_references);
    let mut associated = vec![0usize; n_chromosomes];

    for i in 0..n_chromosomes {
        let objectives = norm_objectives.row(i);
        let mut min_distance = f64::INFINITY;
        let mut min_index = 0;
        for (j, unit) in units.iter().enumerate() {
            let projection: f64 = unit
                .iter()
                .zip(&objectives)
                .map(|(&w, &o)| w * o)
                .sum();
            let distance = unit
                .iter()
                .zip(&objectives)
                .map(|(&w, &o)| {
                    let residual = o - projection * w;
                    residual * residual
                })
                .sum::<f64>()
                .sqrt();
            distances[(i, j)] = distance;
            if distance < min_distance {
                min_distance = distance;
                min_index = j;
            }
        }
        associated[i] = min_index;
    }

    (associated, distances)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm2() {
        assert_eq!(norm2(&[3.0, 4.0]), 5.0);
        assert_eq!(norm2(&[]), 0.0);
    }

    #[test]
    fn test_intercepts_diagonal() {
        let extreme = Matrix::from(vec![vec![2.0, 0.0], vec![0.0, 4.0]]);
        let intercepts = hyperplane_intercepts(&extreme);
        assert!((intercepts[0] - 2.0).abs() < 1e-12);
        assert!((intercepts[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_intercepts_general() {
        // A = [[4, 2], [1, 5]]: Aᵀx = 1 gives x = (2/9, 1/9).
        let extreme = Matrix::from(vec![vec![4.0, 2.0], vec![1.0, 5.0]]);
        let intercepts = hyperplane_intercepts(&extreme);
        assert!((intercepts[0] - 4.5).abs() < 1e-9);
        assert!((intercepts[1] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_intercepts_singular_falls_back_to_axis_maxima() {
        let extreme = Matrix::from(vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        let intercepts = hyperplane_intercepts(&extreme);
        assert_eq!(intercepts, vec![1.0, 1.0]);
    }

    #[test]
    fn test_scalarize_picks_axis_extremes() {
        // Row 0 hugs the first axis, row 2 the second.
        let zb = Matrix::from(vec![
            vec![5.0, 0.1],
            vec![3.0, 3.0],
            vec![0.1, 4.0],
        ]);
        let mut state = Nsga3State::default();
        state.scalarize(&zb);

        assert_eq!(state.extreme_objectives.row(0), vec![5.0, 0.1]);
        assert_eq!(state.extreme_objectives.row(1), vec![0.1, 4.0]);
    }

    #[test]
    fn test_scalarize_keeps_historical_minimum() {
        let mut state = Nsga3State::default();
        state.scalarize(&Matrix::from(vec![vec![5.0, 0.1], vec![0.1, 4.0]]));
        let before = state.scalarized_objectives_min.clone();

        // A strictly worse batch must not displace the stored extremes.
        state.scalarize(&Matrix::from(vec![vec![9.0, 6.0], vec![6.0, 9.0]]));
        assert_eq!(state.scalarized_objectives_min, before);
        assert_eq!(state.extreme_objectives.row(0), vec![5.0, 0.1]);
    }

    #[test]
    fn test_associate_nearest_reference() {
        let norm = Matrix::from(vec![
            vec![1.0, 0.05], // close to the (1, 0) ray
            vec![0.05, 1.0], // close to the (0, 1) ray
            vec![0.5, 0.5],  // on the diagonal ray
        ]);
        let references = Matrix::from(vec![
            vec![1.0, 0.0],
            vec![0.5, 0.5],
            vec![0.0, 1.0],
        ]);
        let (associated, distances) = associate(&norm, &references);
        assert_eq!(associated, vec![0, 2, 1]);
        assert!(distances[(2, 1)] < 1e-12);
        assert_eq!(distances.n_rows(), 3);
        assert_eq!(distances.n_cols(), 3);
    }

    #[test]
    fn test_associate_distance_is_perpendicular() {
        // Point (1, 1) against the (1, 0) ray: projection leaves (0, 1).
        let norm = Matrix::from(vec![vec![1.0, 1.0]]);
        let references = Matrix::from(vec![vec![2.0, 0.0]]);
        let (_, distances) = associate(&norm, &references);
        assert!((distances[(0, 0)] - 1.0).abs() < 1e-12);
    }
}
