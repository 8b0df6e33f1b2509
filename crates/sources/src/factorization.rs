//! Latent factor estimation by truncated SVD.
//!
//! The utility matrix is approximated by its top-k singular triplets and
//! the product `U_k Σ_k V_kᵀ` is used as the predicted affinity for every
//! (user, movie) cell, observed or not.
//!
//! ## Rank
//! `k = min(max_rank, min(rows, cols) - 1)`. When that is below 1 (one
//! user, or one movie) there is nothing to factorize and the estimator
//! returns an empty table.
//!
//! ## Algorithm
//! Randomized range finder followed by an exact SVD of the small projected
//! matrix:
//! 1. Draw a `cols x (k + oversamples)` test matrix from a seeded RNG
//! 2. `Q = orth(A Ω)`, refined with QR-normalized power iterations
//! 3. `B = Qᵀ A`, exact SVD `B = Ũ Σ Vᵀ`
//! 4. `U = Q Ũ`, keep the k largest singular values
//!
//! The seed makes two runs over the same matrix produce bit-identical
//! tables.

use crate::matrix::{PredictedScoreTable, UtilityMatrix};
use anyhow::{Result, anyhow, bail};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Truncated factors of a matrix, largest singular value first
#[derive(Debug, Clone)]
pub struct Factors {
    /// rows x k
    pub user_factors: DMatrix<f64>,
    /// k
    pub singular_values: DVector<f64>,
    /// k x cols
    pub item_factors: DMatrix<f64>,
}

impl Factors {
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    /// `U Σ Vᵀ`
    pub fn reconstruct(&self) -> DMatrix<f64> {
        let weighted = &self.user_factors * DMatrix::from_diagonal(&self.singular_values);
        weighted * &self.item_factors
    }
}

/// Factorizes a utility matrix into a predicted score table
#[derive(Debug, Clone)]
pub struct LatentFactorEstimator {
    /// Upper bound on the number of latent factors
    max_rank: usize,

    /// RNG seed for the randomized range finder
    seed: u64,

    /// Extra sketch columns beyond the target rank
    oversamples: usize,

    /// Power iterations used to sharpen the range estimate
    power_iterations: usize,
}

impl LatentFactorEstimator {
    pub fn new() -> Self {
        Self {
            max_rank: 20,
            seed: 42,
            oversamples: 10,
            power_iterations: 5,
        }
    }

    /// Configure the maximum rank (default: 20)
    pub fn with_max_rank(mut self, max_rank: usize) -> Self {
        self.max_rank = max_rank;
        self
    }

    /// Configure the RNG seed (default: 42)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Configure oversampling (default: 10)
    pub fn with_oversamples(mut self, oversamples: usize) -> Self {
        self.oversamples = oversamples;
        self
    }

    /// Configure power iterations (default: 5)
    pub fn with_power_iterations(mut self, iterations: usize) -> Self {
        self.power_iterations = iterations;
        self
    }

    /// The rank that would be used for a `rows x cols` matrix, or `None`
    /// if the matrix is too small to factorize
    pub fn target_rank(&self, rows: usize, cols: usize) -> Option<usize> {
        let max_components = rows.min(cols).checked_sub(1)?;
        let rank = max_components.min(self.max_rank);
        (rank >= 1).then_some(rank)
    }

    /// Predict a score for every cell of `matrix`.
    ///
    /// Returns an empty table when the matrix is empty or has fewer than two
    /// users or two movies.
    #[instrument(skip(self, matrix), fields(rows = matrix.shape().0, cols = matrix.shape().1))]
    pub fn estimate(&self, matrix: &UtilityMatrix) -> Result<PredictedScoreTable> {
        if matrix.is_empty() {
            warn!("Utility matrix is empty, skipping factorization");
            return Ok(PredictedScoreTable::empty());
        }

        let (rows, cols) = matrix.shape();
        let Some(rank) = self.target_rank(rows, cols) else {
            warn!(
                "Utility matrix {}x{} has too few dimensions, skipping factorization",
                rows, cols
            );
            return Ok(PredictedScoreTable::empty());
        };

        let start = Instant::now();
        let factors = self.factorize(matrix.values(), rank)?;
        let reconstructed = factors.reconstruct();
        if reconstructed.iter().any(|v| !v.is_finite()) {
            bail!("Reconstruction produced non-finite scores");
        }

        debug!(
            "Factorized {}x{} matrix at rank {} in {:.2?}",
            rows,
            cols,
            rank,
            start.elapsed()
        );
        matrix.with_values(reconstructed)
    }

    /// Randomized truncated SVD of `a` at the given rank
    pub fn factorize(&self, a: &DMatrix<f64>, rank: usize) -> Result<Factors> {
        let (rows, cols) = a.shape();
        if rank == 0 || rank > rows.min(cols) {
            bail!("Rank {} is out of range for a {}x{} matrix", rank, rows, cols);
        }
        let sketch = (rank + self.oversamples).min(rows.min(cols));

        let mut rng = StdRng::seed_from_u64(self.seed);
        let omega = DMatrix::<f64>::from_fn(cols, sketch, |_, _| rng.random_range(-1.0..1.0));

        let mut q = (a * omega).qr().q();
        for _ in 0..self.power_iterations {
            let z = (a.transpose() * &q).qr().q();
            q = (a * z).qr().q();
        }

        let projected = q.transpose() * a;
        let svd = projected.svd(true, true);
        let u_small = svd.u.ok_or_else(|| anyhow!("SVD failed to compute U"))?;
        let v_t = svd.v_t.ok_or_else(|| anyhow!("SVD failed to compute V^T"))?;
        let sigma = svd.singular_values;
        if sigma.len() < rank {
            bail!(
                "Projected SVD produced {} singular values, need {}",
                sigma.len(),
                rank
            );
        }

        // Largest first; index breaks ties so the order is stable
        let mut order: Vec<usize> = (0..sigma.len()).collect();
        order.sort_by(|&i, &j| sigma[j].total_cmp(&sigma[i]).then(i.cmp(&j)));
        order.truncate(rank);

        let u = q * u_small;
        Ok(Factors {
            user_factors: u.select_columns(order.iter()),
            singular_values: DVector::from_iterator(rank, order.iter().map(|&i| sigma[i])),
            item_factors: v_t.select_rows(order.iter()),
        })
    }
}

impl Default for LatentFactorEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::build_utility_matrix;
    use crate::scoring::score_interactions;
    use data_loader::{Interaction, WatchStatus};

    fn labelled(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> UtilityMatrix {
        UtilityMatrix::from_parts(
            (1..=rows as u32).collect(),
            (100..100 + cols as u32).collect(),
            DMatrix::from_fn(rows, cols, |i, j| f(i, j)),
        )
        .unwrap()
    }

    #[test]
    fn test_target_rank() {
        let estimator = LatentFactorEstimator::new();
        assert_eq!(estimator.target_rank(0, 0), None);
        assert_eq!(estimator.target_rank(1, 50), None);
        assert_eq!(estimator.target_rank(50, 1), None);
        assert_eq!(estimator.target_rank(2, 2), Some(1));
        assert_eq!(estimator.target_rank(5, 8), Some(4));
        assert_eq!(estimator.target_rank(100, 300), Some(20));
        assert_eq!(estimator.with_max_rank(3).target_rank(100, 300), Some(3));
    }

    #[test]
    fn test_rank_stays_below_smaller_dimension() {
        let estimator = LatentFactorEstimator::new();
        for rows in 0..30 {
            for cols in 0..30 {
                if let Some(rank) = estimator.target_rank(rows, cols) {
                    assert!(rank < rows.min(cols));
                    assert!(rank >= 1);
                } else {
                    assert!(rows < 2 || cols < 2);
                }
            }
        }
    }

    #[test]
    fn test_empty_matrix_gives_empty_table() {
        let table = LatentFactorEstimator::new()
            .estimate(&UtilityMatrix::empty())
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_single_user_gives_empty_table() {
        let matrix = build_utility_matrix(&score_interactions(&[
            Interaction::new(1, 10, WatchStatus::Watched, Some(5.0)),
            Interaction::new(1, 11, WatchStatus::Watching, None),
        ]));
        assert_eq!(matrix.shape(), (1, 2));

        let table = LatentFactorEstimator::new().estimate(&matrix).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_worked_example_is_dense() {
        let matrix = build_utility_matrix(&score_interactions(&[
            Interaction::new(1, 10, WatchStatus::Watched, Some(5.0)),
            Interaction::new(1, 11, WatchStatus::PlanToWatch, None),
            Interaction::new(2, 10, WatchStatus::Watching, Some(3.0)),
        ]));

        let table = LatentFactorEstimator::new().estimate(&matrix).unwrap();
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.users(), matrix.users());
        assert_eq!(table.movies(), matrix.movies());
        assert!(table.get(2, 11).is_some());
    }

    #[test]
    fn test_low_rank_matrix_is_recovered() {
        // Rank 1: outer product of two vectors
        let matrix = labelled(6, 5, |i, j| (i as f64 + 1.0) * (j as f64 + 2.0));
        let table = LatentFactorEstimator::new().estimate(&matrix).unwrap();

        for (a, b) in matrix.values().iter().zip(table.values().iter()) {
            assert!((a - b).abs() < 1e-8, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_truncation_keeps_dominant_structure() {
        // Rank 2 signal with rank limited to 1: the reconstruction is the
        // best rank-1 fit, so its error is bounded by the smaller component
        let matrix = labelled(8, 6, |i, j| {
            10.0 * (i as f64 + 1.0) + 0.01 * ((i * j) % 3) as f64 + j as f64
        });
        let table = LatentFactorEstimator::new()
            .with_max_rank(1)
            .estimate(&matrix)
            .unwrap();

        let error = (matrix.values() - table.values()).norm();
        assert!(error < 0.1 * matrix.values().norm());
    }

    #[test]
    fn test_all_zero_matrix_predicts_zero() {
        let matrix = labelled(4, 4, |_, _| 0.0);
        let table = LatentFactorEstimator::new().estimate(&matrix).unwrap();

        assert_eq!(table.shape(), (4, 4));
        assert!(table.values().iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let matrix = labelled(12, 9, |i, j| ((i * 7 + j * 3) % 5) as f64);
        let estimator = LatentFactorEstimator::new().with_max_rank(4);

        let first = estimator.estimate(&matrix).unwrap();
        let second = estimator.estimate(&matrix).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_factors_are_ordered_by_singular_value() {
        let matrix = labelled(10, 10, |i, j| ((i + 1) * (j + 3) % 7) as f64);
        let factors = LatentFactorEstimator::new()
            .factorize(matrix.values(), 5)
            .unwrap();

        assert_eq!(factors.rank(), 5);
        assert_eq!(factors.user_factors.shape(), (10, 5));
        assert_eq!(factors.item_factors.shape(), (5, 10));
        for pair in factors.singular_values.as_slice().windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_factorize_rejects_bad_rank() {
        let a = DMatrix::from_element(3, 3, 1.0);
        assert!(LatentFactorEstimator::new().factorize(&a, 0).is_err());
        assert!(LatentFactorEstimator::new().factorize(&a, 4).is_err());
    }
}
