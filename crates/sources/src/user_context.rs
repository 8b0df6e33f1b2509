//! Helpers to build UserContext from scored interactions
//!
//! Request handling needs one thing per user over and over: the set of
//! movies they already touched. [`InteractionIndex`] groups that once per
//! refresh so each request is a hash lookup.

use crate::scoring::ScoredInteraction;
use crate::types::UserContext;
use data_loader::{MovieId, UserId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
struct UserHistory {
    movies: HashSet<MovieId>,
    rows: usize,
    total_score: f64,
}

/// Scored interactions grouped by user
#[derive(Debug, Clone, Default)]
pub struct InteractionIndex {
    by_user: HashMap<UserId, UserHistory>,
}

impl InteractionIndex {
    pub fn new(interactions: &[ScoredInteraction]) -> Self {
        let mut by_user: HashMap<UserId, UserHistory> = HashMap::new();
        for interaction in interactions {
            let history = by_user.entry(interaction.user_id).or_default();
            history.movies.insert(interaction.movie_id);
            history.rows += 1;
            history.total_score += interaction.score;
        }
        Self { by_user }
    }

    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    pub fn interacted_movies(&self, user_id: UserId) -> Option<&HashSet<MovieId>> {
        self.by_user.get(&user_id).map(|h| &h.movies)
    }
}

/// Build a UserContext for a user.
///
/// A user we have never seen gets an empty context; that is the cold-start
/// case, not an error.
pub fn build_user_context(index: &InteractionIndex, user_id: UserId) -> UserContext {
    let mut context = UserContext::new(user_id);

    let Some(history) = index.by_user.get(&user_id) else {
        return context;
    };

    context.interacted_movies = history.movies.clone();
    context.interaction_count = history.rows;
    if history.rows > 0 {
        context.avg_score = history.total_score / history.rows as f64;
    }
    context
}
