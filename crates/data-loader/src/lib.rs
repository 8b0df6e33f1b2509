//! # Data Loader Crate
//!
//! Loads the watchlist export (interactions + movie catalog) and serves it
//! to the recommendation engine through the [`InteractionStore`] trait.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Interaction, WatchStatus, Movie, DataIndex)
//! - **parser**: Parse .dat files into Rust structs
//! - **index**: Build the DataIndex from parsed rows
//! - **store**: The read interface the engine depends on
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{DataIndex, InteractionStore};
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data/cinetrack"))?;
//! let interactions = index.fetch_interactions()?;
//! let newest = index.fetch_catalog_ids(50)?;
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use store::{DirectoryStore, InteractionStore};
pub use types::{DataIndex, Interaction, Movie, MovieId, UserId, WatchStatus};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_index_creation() {
        let index = DataIndex::new();
        let (users, movies, interactions) = index.counts();

        assert_eq!(users, 0);
        assert_eq!(movies, 0);
        assert_eq!(interactions, 0);
    }

    #[test]
    fn test_insert_movie() {
        let mut index = DataIndex::new();

        index.insert_movie(Movie {
            id: 1,
            title: "Heat (1995)".to_string(),
            year: Some(1995),
            added_at: 1_700_000_000,
        });

        let retrieved = index.get_movie(1).unwrap();
        assert_eq!(retrieved.id, 1);
        assert_eq!(retrieved.year, Some(1995));
        assert_eq!(index.catalog_ids(), &[1]);
    }

    #[test]
    fn test_insert_interaction() {
        let mut index = DataIndex::new();

        index.insert_interaction(Interaction::new(1, 10, WatchStatus::Watched, Some(5.0)));

        let rows = index.get_user_interactions(1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rating, Some(5.0));
        assert_eq!(index.interactions().len(), 1);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(WatchStatus::from("watched"), WatchStatus::Watched);
        assert_eq!(WatchStatus::from("plan_to_watch"), WatchStatus::PlanToWatch);
        assert_eq!(WatchStatus::from("dropped"), WatchStatus::Unknown);
        assert_eq!(WatchStatus::from(""), WatchStatus::Unknown);
        assert_eq!(WatchStatus::Watching.weight(), 2.0);
        assert_eq!(WatchStatus::Unknown.weight(), 0.0);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&WatchStatus::PlanToWatch).unwrap();
        assert_eq!(json, "\"plan_to_watch\"");
    }

    #[test]
    fn test_empty_queries() {
        let index = DataIndex::new();

        assert!(index.get_movie(999).is_none());
        assert!(index.get_user_interactions(999).is_empty());
        assert!(index.catalog_ids().is_empty());
    }
}
