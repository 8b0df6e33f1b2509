//! # Recommendation Engine
//!
//! Owns the cached model state and serves requests from it:
//! 1. `refresh` fetches interactions and catalog ids from the store
//! 2. Scores them and builds the utility matrix
//! 3. Factorizes it into a predicted score table
//! 4. Ranks movies by popularity
//! 5. Publishes all of it as one immutable snapshot
//!
//! Requests (`recommend`, `popular`) clone the current snapshot's `Arc` and
//! never block a refresh for longer than the pointer swap. A refresh that
//! fails leaves the previous snapshot in place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use anyhow::Context;
use tracing::{error, info, instrument, warn};

use data_loader::{InteractionStore, MovieId, UserId};
use pipeline::{HybridSelector, RecommendationResult};
use sources::{
    InteractionIndex, LatentFactorSource, PopularitySource, PredictedScoreTable,
    ScoredInteraction, UserContext, UtilityMatrix, build_user_context, build_utility_matrix,
    score_interactions,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Everything one refresh computed. Never mutated once published.
#[derive(Debug)]
pub struct EngineSnapshot {
    /// 0 for the empty snapshot before the first refresh
    pub version: u64,
    pub interactions: Vec<ScoredInteraction>,
    pub utility: UtilityMatrix,
    pub predicted: Arc<PredictedScoreTable>,
    /// Factorization rank, `None` when factorization was skipped
    pub rank: Option<usize>,
    pub popularity: PopularitySource,
    pub interaction_index: InteractionIndex,
}

impl EngineSnapshot {
    /// A snapshot with no data: every request takes the cold start path
    pub fn empty() -> Self {
        Self {
            version: 0,
            interactions: Vec::new(),
            utility: UtilityMatrix::empty(),
            predicted: Arc::new(PredictedScoreTable::empty()),
            rank: None,
            popularity: PopularitySource::default(),
            interaction_index: InteractionIndex::default(),
        }
    }

    pub fn latent(&self) -> LatentFactorSource {
        LatentFactorSource::new(Arc::clone(&self.predicted))
    }

    pub fn user_context(&self, user_id: UserId) -> UserContext {
        build_user_context(&self.interaction_index, user_id)
    }

    /// Scored interaction rows for one user, in load order
    pub fn user_history(&self, user_id: UserId) -> Vec<ScoredInteraction> {
        self.interactions
            .iter()
            .filter(|i| i.user_id == user_id)
            .copied()
            .collect()
    }
}

/// The hybrid recommender behind a swappable snapshot
pub struct RecommendationEngine {
    store: Arc<dyn InteractionStore>,
    config: EngineConfig,
    selector: HybridSelector,
    snapshot: RwLock<Arc<EngineSnapshot>>,
    versions: AtomicU64,
}

impl RecommendationEngine {
    /// Create an engine with an empty snapshot. Call `refresh` before
    /// serving anything but cold start results.
    pub fn new(store: Arc<dyn InteractionStore>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            selector: config.selector(),
            config,
            snapshot: RwLock::new(Arc::new(EngineSnapshot::empty())),
            versions: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recompute everything from the store and publish it.
    ///
    /// On error nothing is published and the previous snapshot keeps
    /// serving.
    #[instrument(skip(self))]
    pub fn refresh(&self) -> Result<()> {
        let start_time = Instant::now();

        let snapshot = match self.build_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(
                    "Refresh failed, keeping snapshot v{}: {}",
                    self.snapshot().version,
                    e
                );
                return Err(e);
            }
        };

        let summary = format!(
            "{} interactions, utility matrix {}x{}, rank {}",
            snapshot.interactions.len(),
            snapshot.utility.shape().0,
            snapshot.utility.shape().1,
            snapshot
                .rank
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
        let version = snapshot.version;
        self.publish(snapshot);

        info!(
            "Published snapshot v{} ({}) in {:.2?}",
            version,
            summary,
            start_time.elapsed()
        );
        Ok(())
    }

    fn build_snapshot(&self) -> Result<EngineSnapshot> {
        let raw = self.store.fetch_interactions()?;
        let catalog_limit = self.config.catalog_limit.unwrap_or(usize::MAX);
        let catalog: Vec<MovieId> = self.store.fetch_catalog_ids(catalog_limit)?;
        if raw.is_empty() {
            warn!("Store returned no interactions, every user is cold");
        }

        let interactions = score_interactions(&raw);
        let utility = build_utility_matrix(&interactions);

        let estimator = self.config.estimator();
        let predicted = estimator
            .estimate(&utility)
            .map_err(|e| EngineError::Factorization(format!("{e:#}")))?;
        let rank = if predicted.is_empty() {
            None
        } else {
            let (rows, cols) = utility.shape();
            estimator.target_rank(rows, cols)
        };

        let popularity = PopularitySource::new(&interactions, catalog);
        let interaction_index = InteractionIndex::new(&interactions);

        Ok(EngineSnapshot {
            version: self.versions.fetch_add(1, Ordering::Relaxed) + 1,
            interactions,
            utility,
            predicted: Arc::new(predicted),
            rank,
            popularity,
            interaction_index,
        })
    }

    /// Swap in `snapshot` unless a newer one was published meanwhile
    fn publish(&self, snapshot: EngineSnapshot) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if snapshot.version > guard.version {
            *guard = Arc::new(snapshot);
        }
    }

    /// Recommend up to `count` movies for a user.
    ///
    /// Reads the current snapshot only; an unknown user gets popularity.
    #[instrument(skip(self))]
    pub fn recommend(&self, user_id: UserId, count: usize) -> anyhow::Result<RecommendationResult> {
        let snapshot = self.snapshot();
        let context = snapshot.user_context(user_id);

        self.selector
            .select(&context, count, &snapshot.latent(), &snapshot.popularity)
            .with_context(|| format!("Failed to build recommendations for user {user_id}"))
    }

    /// Top `count` movies by popularity, padded from the catalog
    pub fn popular(&self, count: usize) -> Vec<MovieId> {
        self.snapshot().popularity.top(count)
    }
}
