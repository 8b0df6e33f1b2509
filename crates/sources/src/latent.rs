//! Latent Factor Source - Personalized Candidates
//!
//! Reads a user's row out of the predicted score table and turns it into
//! ranked candidates, skipping anything the user already has on their
//! watchlist.

use crate::matrix::PredictedScoreTable;
use crate::types::{Candidate, CandidateSource, UserContext};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Personalized candidates from a precomputed predicted score table
#[derive(Debug, Clone)]
pub struct LatentFactorSource {
    /// Shared, read-only table from the last refresh
    table: Arc<PredictedScoreTable>,
}

impl LatentFactorSource {
    pub fn new(table: Arc<PredictedScoreTable>) -> Self {
        Self { table }
    }

    /// False when factorization was skipped or the user was not part of it
    pub fn covers(&self, user_id: data_loader::UserId) -> bool {
        !self.table.is_empty() && self.table.contains_user(user_id)
    }

    /// Top `limit` unseen movies for the user by predicted score.
    ///
    /// Ties go to the lower movie id. Empty when the user is not covered.
    #[instrument(skip(self, user_context), fields(user_id = user_context.user_id))]
    pub fn get_candidates(&self, user_context: &UserContext, limit: usize) -> Vec<Candidate> {
        let Some(row) = self.table.user_row(user_context.user_id) else {
            debug!("User not in predicted score table");
            return Vec::new();
        };

        let mut candidates: Vec<Candidate> = row
            .filter(|(movie_id, _)| !user_context.has_interacted(*movie_id))
            .map(|(movie_id, score)| Candidate::new(movie_id, CandidateSource::LatentFactor, score))
            .collect();

        candidates.sort_by(|a, b| {
            b.base_score
                .total_cmp(&a.base_score)
                .then(a.movie_id.cmp(&b.movie_id))
        });
        candidates.truncate(limit);

        debug!("Generated {} latent factor candidates", candidates.len());
        candidates
    }
}
