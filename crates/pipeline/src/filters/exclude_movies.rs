//! Filter to drop an explicit set of movies, and duplicates.
//!
//! The hybrid merge uses it to keep popularity filler from repeating
//! anything already chosen as personalized.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::MovieId;
use sources::{Candidate, UserContext};
use std::collections::HashSet;

/// Removes candidates whose movie is in `excluded`, and any repeat of a
/// movie earlier in the list.
pub struct ExcludeMoviesFilter {
    excluded: HashSet<MovieId>,
}

impl ExcludeMoviesFilter {
    pub fn new(excluded: impl IntoIterator<Item = MovieId>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
        }
    }
}

impl Filter for ExcludeMoviesFilter {
    fn name(&self) -> &str {
        "ExcludeMoviesFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        _context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let mut seen: HashSet<MovieId> = HashSet::with_capacity(candidates.len());
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| {
                !self.excluded.contains(&candidate.movie_id) && seen.insert(candidate.movie_id)
            })
            .collect();
        Ok(filtered)
    }
}
