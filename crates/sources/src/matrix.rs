//! Dense user x movie matrices.
//!
//! Both the utility matrix (observed affinity, mean of duplicate rows,
//! zeros imputed) and the predicted score table (its low-rank
//! reconstruction) share one labelled layout: sorted user ids down the
//! rows, sorted movie ids across the columns.

use crate::scoring::ScoredInteraction;
use anyhow::{Result, ensure};
use data_loader::{MovieId, UserId};
use nalgebra::DMatrix;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// A dense matrix labelled with user ids (rows) and movie ids (columns)
#[derive(Debug, Clone, PartialEq)]
pub struct UserItemMatrix {
    users: Vec<UserId>,
    movies: Vec<MovieId>,
    user_index: HashMap<UserId, usize>,
    movie_index: HashMap<MovieId, usize>,
    values: DMatrix<f64>,
}

/// Observed utility, one cell per (user, movie) pair
pub type UtilityMatrix = UserItemMatrix;

/// Predicted affinity over the same domain as the utility matrix it came
/// from. Empty means "no model", never "everything scores zero".
pub type PredictedScoreTable = UserItemMatrix;

impl UserItemMatrix {
    /// A matrix with no rows and no columns
    pub fn empty() -> Self {
        Self::labelled(Vec::new(), Vec::new(), DMatrix::zeros(0, 0))
    }

    /// Label a dense matrix. Fails if `users` and `movies` don't match its
    /// shape.
    pub fn from_parts(
        users: Vec<UserId>,
        movies: Vec<MovieId>,
        values: DMatrix<f64>,
    ) -> Result<Self> {
        ensure!(
            values.shape() == (users.len(), movies.len()),
            "{}x{} values do not match {} users x {} movies",
            values.nrows(),
            values.ncols(),
            users.len(),
            movies.len()
        );
        Ok(Self::labelled(users, movies, values))
    }

    /// Same labels, new values. Used to attach a reconstruction to the
    /// index of the matrix it was computed from.
    pub fn with_values(&self, values: DMatrix<f64>) -> Result<Self> {
        Self::from_parts(self.users.clone(), self.movies.clone(), values)
    }

    /// Callers guarantee the labels match the shape
    fn labelled(users: Vec<UserId>, movies: Vec<MovieId>, values: DMatrix<f64>) -> Self {
        let user_index = users.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let movie_index = movies.iter().enumerate().map(|(i, &m)| (m, i)).collect();
        Self {
            users,
            movies,
            user_index,
            movie_index,
            values,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() || self.movies.is_empty()
    }

    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn movies(&self) -> &[MovieId] {
        &self.movies
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.user_index.contains_key(&user_id)
    }

    /// Cell value, `None` only if the user or movie is outside the index
    pub fn get(&self, user_id: UserId, movie_id: MovieId) -> Option<f64> {
        let row = *self.user_index.get(&user_id)?;
        let col = *self.movie_index.get(&movie_id)?;
        Some(self.values[(row, col)])
    }

    /// Every (movie, value) pair in a user's row, in movie id order
    pub fn user_row(&self, user_id: UserId) -> Option<impl Iterator<Item = (MovieId, f64)> + '_> {
        let row = *self.user_index.get(&user_id)?;
        Some(
            self.movies
                .iter()
                .enumerate()
                .map(move |(col, &movie_id)| (movie_id, self.values[(row, col)])),
        )
    }
}

impl Default for UserItemMatrix {
    fn default() -> Self {
        Self::empty()
    }
}

/// Build the utility matrix from scored interactions.
///
/// Duplicate (user, movie) rows are averaged, not summed. Every pair that
/// was never observed is present as 0.0.
pub fn build_utility_matrix(interactions: &[ScoredInteraction]) -> UtilityMatrix {
    if interactions.is_empty() {
        return UtilityMatrix::empty();
    }

    // BTree keeps both the labels and the summation order deterministic
    let mut sums: BTreeMap<(UserId, MovieId), (f64, u32)> = BTreeMap::new();
    let mut users = BTreeSet::new();
    let mut movies = BTreeSet::new();
    for interaction in interactions {
        let entry = sums
            .entry((interaction.user_id, interaction.movie_id))
            .or_insert((0.0, 0));
        entry.0 += interaction.score;
        entry.1 += 1;
        users.insert(interaction.user_id);
        movies.insert(interaction.movie_id);
    }

    let users: Vec<UserId> = users.into_iter().collect();
    let movies: Vec<MovieId> = movies.into_iter().collect();
    let mut matrix = UtilityMatrix::labelled(
        users.clone(),
        movies.clone(),
        DMatrix::zeros(users.len(), movies.len()),
    );

    for ((user_id, movie_id), (sum, count)) in sums {
        let row = matrix.user_index[&user_id];
        let col = matrix.movie_index[&movie_id];
        matrix.values[(row, col)] = sum / f64::from(count);
    }

    debug!(
        "Built utility matrix: {} users x {} movies from {} rows",
        matrix.users.len(),
        matrix.movies.len(),
        interactions.len()
    );
    matrix
}
