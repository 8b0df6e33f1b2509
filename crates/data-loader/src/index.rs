//! DataIndex building from the export files.
//!
//! Parsing of the two files runs in parallel, then the per-user index and
//! the catalog order are built once over the parsed rows.

use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::{info, warn};

impl DataIndex {
    /// Load interactions and the movie catalog from a directory
    ///
    /// Expects `interactions.dat` and `movies.dat` inside `data_dir`.
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading watchlist export from {:?}", data_dir);

        let interactions_path = data_dir.join("interactions.dat");
        let movies_path = data_dir.join("movies.dat");

        let (interactions, movies) = rayon::join(
            || parser::parse_interactions(&interactions_path),
            || parser::parse_movies(&movies_path),
        );
        let interactions = interactions?;
        let movies = movies?;

        info!(
            "Loaded {} interactions and {} movies",
            interactions.len(),
            movies.len()
        );

        let index = Self::from_parts(movies, interactions);
        index.warn_on_unknown_movies();
        Ok(index)
    }

    /// Build an index from already-parsed rows
    pub fn from_parts(movies: Vec<Movie>, interactions: Vec<Interaction>) -> Self {
        let mut index = DataIndex::new();
        for movie in movies {
            index.movies.insert(movie.id, movie);
        }
        index.rebuild_catalog_order();

        for interaction in interactions {
            index.insert_interaction(interaction);
        }
        index
    }

    /// Recompute the catalog order: newest first, ties by descending id
    pub(crate) fn rebuild_catalog_order(&mut self) {
        let mut order: Vec<(i64, MovieId)> = self
            .movies
            .values()
            .map(|movie| (movie.added_at, movie.id))
            .collect();
        order.sort_unstable_by(|a, b| b.cmp(a));
        self.catalog_order = order.into_iter().map(|(_, id)| id).collect();
    }

    /// Interactions may reference movies that were since removed from the
    /// catalog. That is not fatal, but worth knowing about.
    fn warn_on_unknown_movies(&self) {
        let unknown = self
            .interactions
            .iter()
            .filter(|i| !self.movies.contains_key(&i.movie_id))
            .count();
        if unknown > 0 {
            warn!(
                "{} interactions reference movies missing from the catalog",
                unknown
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, added_at: i64) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            year: None,
            added_at,
        }
    }

    #[test]
    fn test_catalog_order_newest_first() {
        let index = DataIndex::from_parts(
            vec![movie(1, 100), movie(2, 300), movie(3, 200), movie(4, 300)],
            vec![],
        );

        // 2 and 4 share a timestamp, higher id wins the tie
        assert_eq!(index.catalog_ids(), &[4, 2, 3, 1]);
    }

    #[test]
    fn test_from_parts_groups_by_user() {
        let index = DataIndex::from_parts(
            vec![movie(10, 1)],
            vec![
                Interaction::new(1, 10, WatchStatus::Watched, Some(5.0)),
                Interaction::new(2, 10, WatchStatus::Watching, None),
                Interaction::new(1, 10, WatchStatus::Watched, Some(4.0)),
            ],
        );

        assert_eq!(index.get_user_interactions(1).len(), 2);
        assert_eq!(index.get_user_interactions(2).len(), 1);
        assert!(index.get_user_interactions(3).is_empty());
        assert_eq!(index.counts(), (2, 1, 3));
    }

    #[test]
    fn test_load_missing_directory() {
        let result = DataIndex::load_from_files(Path::new("/definitely/not/a/dataset"));
        assert!(result.is_err());
    }
}
