//! Interaction scoring.
//!
//! Turns a raw watchlist row into a single implicit-utility number:
//!
//! ```text
//! score = status_weight + rating
//! ```
//!
//! with `plan_to_watch = 1`, `watching = 2`, `watched = 3`, anything else 0,
//! and a missing rating counting as 0. Scoring never fails.

use data_loader::{Interaction, MovieId, UserId, WatchStatus};
use rayon::prelude::*;

/// An interaction row with its derived scores attached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredInteraction {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub status: WatchStatus,
    pub rating: Option<f32>,
    pub status_score: f64,
    pub score: f64,
}

/// Score a single interaction row
pub fn score_interaction(interaction: &Interaction) -> ScoredInteraction {
    let status_score = interaction.status.weight();
    // Ratings are bounded at load time; clamp anyway so score stays >= 0
    let rating = interaction
        .rating
        .filter(|r| r.is_finite())
        .map(|r| f64::from(r).max(0.0))
        .unwrap_or(0.0);

    ScoredInteraction {
        user_id: interaction.user_id,
        movie_id: interaction.movie_id,
        status: interaction.status,
        rating: interaction.rating,
        status_score,
        score: status_score + rating,
    }
}

/// Score every row, preserving input order
pub fn score_interactions(interactions: &[Interaction]) -> Vec<ScoredInteraction> {
    interactions.par_iter().map(score_interaction).collect()
}
