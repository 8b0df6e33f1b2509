//! # Hybrid Selector
//!
//! Decides, per request, between pure popularity and a personalized list
//! topped up with popular movies:
//!
//! 1. **Cold start**: no predicted scores for this user (model skipped or
//!    user unknown) → top-N popularity, tagged `popularity_fallback`.
//! 2. **Personalized**: the user's unseen movies by predicted score,
//!    limited to the policy's quota (`Quota(q)` → `min(q, N)`,
//!    `FullPersonalized` → N).
//! 3. **Fill**: popular movies the user has not interacted with and that
//!    are not already picked, in popularity order, until N.
//! 4. Tagged `hybrid_personalized` if at least one personalized movie made
//!    it in, otherwise `popularity_fallback`.
//!
//! Outside cold start the result never contains a movie the user has
//! interacted with, so it can come back shorter than N when the whole
//! catalog is already on their watchlist.

use crate::filter_pipeline::FilterPipeline;
use crate::filters::{AlreadyInteractedFilter, ExcludeMoviesFilter};
use anyhow::Result;
use data_loader::{MovieId, UserId};
use serde::{Deserialize, Serialize};
use sources::{Candidate, LatentFactorSource, PopularitySource, UserContext};
use tracing::{debug, instrument};

/// Personalized slots under the default policy
pub const DEFAULT_QUOTA: usize = 5;

/// How many personalized movies go in before popularity fills the rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// At most this many personalized movies, popularity for the rest
    Quota(usize),
    /// Personalized movies for every slot they can fill
    FullPersonalized,
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::Quota(DEFAULT_QUOTA)
    }
}

impl MergePolicy {
    /// Personalized slots for a request of `count`
    pub fn personalized_slots(self, count: usize) -> usize {
        match self {
            MergePolicy::Quota(quota) => quota.min(count),
            MergePolicy::FullPersonalized => count,
        }
    }
}

/// Provenance tag of a recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    PopularityFallback,
    HybridPersonalized,
}

impl RecommendationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationKind::PopularityFallback => "popularity_fallback",
            RecommendationKind::HybridPersonalized => "hybrid_personalized",
        }
    }
}

/// What a recommend request returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub user_id: UserId,
    pub recommendations: Vec<MovieId>,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
}

impl RecommendationResult {
    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// Merges personalized and popular candidates into one list
#[derive(Debug, Clone)]
pub struct HybridSelector {
    policy: MergePolicy,

    /// Minimum number of popular movies pulled when filling
    popular_pool_size: usize,
}

impl HybridSelector {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            popular_pool_size: 20,
        }
    }

    /// Configure the minimum filler pool (default: 20)
    pub fn with_popular_pool_size(mut self, size: usize) -> Self {
        self.popular_pool_size = size;
        self
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Build the recommendation list for one user
    #[instrument(skip(self, context, latent, popularity), fields(user_id = context.user_id))]
    pub fn select(
        &self,
        context: &UserContext,
        count: usize,
        latent: &LatentFactorSource,
        popularity: &PopularitySource,
    ) -> Result<RecommendationResult> {
        let user_id = context.user_id;

        if !latent.covers(user_id) {
            debug!("Cold start, serving popularity");
            return Ok(RecommendationResult {
                user_id,
                recommendations: popularity.top(count),
                kind: RecommendationKind::PopularityFallback,
            });
        }

        let personalized =
            latent.get_candidates(context, self.policy.personalized_slots(count));
        let mut recommendations: Vec<MovieId> =
            personalized.iter().map(|c| c.movie_id).collect();

        if recommendations.len() < count {
            let fill = self.fill(context, count, &recommendations, popularity)?;
            let needed = count - recommendations.len();
            recommendations.extend(fill.into_iter().take(needed).map(|c| c.movie_id));
        }

        let kind = if personalized.is_empty() {
            RecommendationKind::PopularityFallback
        } else {
            RecommendationKind::HybridPersonalized
        };
        debug!(
            "Selected {} personalized + {} popular ({})",
            personalized.len(),
            recommendations.len() - personalized.len(),
            kind.as_str()
        );

        Ok(RecommendationResult {
            user_id,
            recommendations,
            kind,
        })
    }

    /// Popular movies that are neither interacted with nor already chosen,
    /// in popularity order
    fn fill(
        &self,
        context: &UserContext,
        count: usize,
        chosen: &[MovieId],
        popularity: &PopularitySource,
    ) -> Result<Vec<Candidate>> {
        // Large enough that filtering can't starve the fill while unseen
        // movies remain
        let pool_size = self
            .popular_pool_size
            .max(count + context.interacted_movies.len() + chosen.len());
        let pool = popularity.get_candidates(pool_size);

        FilterPipeline::new()
            .add_filter(AlreadyInteractedFilter)
            .add_filter(ExcludeMoviesFilter::new(chosen.iter().copied()))
            .apply(pool, context)
    }
}

impl Default for HybridSelector {
    fn default() -> Self {
        Self::new(MergePolicy::default())
    }
}
