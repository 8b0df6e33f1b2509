//! Core domain types for watchlist interactions and the movie catalog.
//!
//! An interaction is one watchlist row: a user, a movie, how far along the
//! user is with it, and an optional rating. The catalog is the list of
//! movies known to the system, ordered by when they were added.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

// =============================================================================
// Interaction-related Types
// =============================================================================

/// Where a user is with a movie on their watchlist.
///
/// Anything the store hands us that is not one of the three known labels
/// becomes `Unknown`; a bad status never fails a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    PlanToWatch,
    Watching,
    Watched,
    Unknown,
}

impl WatchStatus {
    /// Ordinal engagement weight used by the interaction scorer
    pub fn weight(self) -> f64 {
        match self {
            WatchStatus::PlanToWatch => 1.0,
            WatchStatus::Watching => 2.0,
            WatchStatus::Watched => 3.0,
            WatchStatus::Unknown => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WatchStatus::PlanToWatch => "plan_to_watch",
            WatchStatus::Watching => "watching",
            WatchStatus::Watched => "watched",
            WatchStatus::Unknown => "unknown",
        }
    }
}

impl From<&str> for WatchStatus {
    fn from(label: &str) -> Self {
        match label.trim() {
            "plan_to_watch" => WatchStatus::PlanToWatch,
            "watching" => WatchStatus::Watching,
            "watched" => WatchStatus::Watched,
            _ => WatchStatus::Unknown,
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single watchlist row as it comes out of storage.
///
/// Rows are not deduplicated: the same (user, movie) pair can show up more
/// than once, e.g. after repeated edits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub status: WatchStatus,
    /// Explicit rating, if the user gave one (0.0 - 10.0)
    pub rating: Option<f32>,
}

impl Interaction {
    pub fn new(
        user_id: UserId,
        movie_id: MovieId,
        status: WatchStatus,
        rating: Option<f32>,
    ) -> Self {
        Self {
            user_id,
            movie_id,
            status,
            rating,
        }
    }
}

// =============================================================================
// Movie-related Types
// =============================================================================

/// A movie in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Heat (1995)")
    pub year: Option<u16>,
    /// Unix timestamp when the movie was added to the catalog
    pub added_at: i64,
}

// =============================================================================
// DataIndex - In-Memory Store
// =============================================================================

/// Holds every interaction row and the catalog, with a couple of lookups
/// on top.
///
/// Interactions are kept in load order; nothing downstream may assume they
/// are sorted.
#[derive(Debug)]
pub struct DataIndex {
    pub(crate) interactions: Vec<Interaction>,
    pub(crate) movies: HashMap<MovieId, Movie>,

    /// Interactions grouped by user
    pub(crate) user_interactions: HashMap<UserId, Vec<Interaction>>,

    /// Movie ids, most recently added first
    pub(crate) catalog_order: Vec<MovieId>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            interactions: Vec::new(),
            movies: HashMap::new(),
            user_interactions: HashMap::new(),
            catalog_order: Vec::new(),
        }
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// All interaction rows, in load order
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Get all interactions recorded for a user
    ///
    /// Returns an empty slice if the user has none
    pub fn get_user_interactions(&self, user_id: UserId) -> &[Interaction] {
        self.user_interactions
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Movie ids in catalog order (most recently added first)
    pub fn catalog_ids(&self) -> &[MovieId] {
        &self.catalog_order
    }

    /// Insert a movie and keep the catalog order up to date
    pub fn insert_movie(&mut self, movie: Movie) {
        self.movies.insert(movie.id, movie);
        self.rebuild_catalog_order();
    }

    /// Insert an interaction row and update the per-user index
    pub fn insert_interaction(&mut self, interaction: Interaction) {
        self.user_interactions
            .entry(interaction.user_id)
            .or_default()
            .push(interaction);
        self.interactions.push(interaction);
    }

    /// Get counts for debugging/validation: (users, movies, interactions)
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.user_interactions.len(),
            self.movies.len(),
            self.interactions.len(),
        )
    }
}

impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
