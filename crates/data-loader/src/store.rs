//! The storage interface the recommendation engine reads from.
//!
//! The engine only ever needs two things from storage: every interaction
//! row, and a stable ordering of catalog ids to pad popularity lists with.

use crate::error::Result;
use crate::parser;
use crate::types::{DataIndex, Interaction, MovieId};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read side of the interaction/catalog store.
///
/// `Send + Sync` so a single store can sit behind an `Arc` shared by the
/// refresh loop and request handlers.
pub trait InteractionStore: Send + Sync {
    /// Every interaction row. May be empty, not sorted.
    fn fetch_interactions(&self) -> Result<Vec<Interaction>>;

    /// Up to `limit` catalog ids, most recently added first
    fn fetch_catalog_ids(&self, limit: usize) -> Result<Vec<MovieId>>;
}

impl InteractionStore for DataIndex {
    fn fetch_interactions(&self) -> Result<Vec<Interaction>> {
        Ok(self.interactions.clone())
    }

    fn fetch_catalog_ids(&self, limit: usize) -> Result<Vec<MovieId>> {
        Ok(self.catalog_order.iter().take(limit).copied().collect())
    }
}

/// Store backed by the export directory.
///
/// Every fetch parses the files again, so a refresh sees whatever was
/// written since the previous one. Use a loaded [`DataIndex`] when the data
/// is static.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    data_dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl InteractionStore for DirectoryStore {
    fn fetch_interactions(&self) -> Result<Vec<Interaction>> {
        let interactions = parser::parse_interactions(&self.data_dir.join("interactions.dat"))?;
        debug!("Fetched {} interactions from {:?}", interactions.len(), self.data_dir);
        Ok(interactions)
    }

    fn fetch_catalog_ids(&self, limit: usize) -> Result<Vec<MovieId>> {
        let movies = parser::parse_movies(&self.data_dir.join("movies.dat"))?;
        DataIndex::from_parts(movies, Vec::new()).fetch_catalog_ids(limit)
    }
}
