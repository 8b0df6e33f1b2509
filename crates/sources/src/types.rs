//! Shared types passed between candidate sources and the filter pipeline.

use data_loader::{MovieId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Reconstructed score from the latent factor model
    LatentFactor,
    /// Aggregate engagement across all users
    Popularity,
    /// Catalog padding (most recently added) when engagement runs out
    Catalog,
}

/// A movie that might end up in a recommendation list
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub movie_id: MovieId,
    pub source: CandidateSource,
    /// Score assigned by the producing source; only comparable within a source
    pub base_score: f64,
}

impl Candidate {
    pub fn new(movie_id: MovieId, source: CandidateSource, base_score: f64) -> Self {
        Self {
            movie_id,
            source,
            base_score,
        }
    }
}

/// Everything we know about a user at request time
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: UserId,
    /// Every movie the user has a watchlist row for, whatever the status
    pub interacted_movies: HashSet<MovieId>,
    /// Number of interaction rows (duplicates included)
    pub interaction_count: usize,
    /// Mean interaction score across those rows, 0.0 when there are none
    pub avg_score: f64,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            interacted_movies: HashSet::new(),
            interaction_count: 0,
            avg_score: 0.0,
        }
    }

    pub fn has_interacted(&self, movie_id: MovieId) -> bool {
        self.interacted_movies.contains(&movie_id)
    }

    /// True when the user has no history at all
    pub fn is_cold(&self) -> bool {
        self.interaction_count == 0
    }
}
