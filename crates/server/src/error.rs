//! Error types for the recommendation engine

use data_loader::DataLoadError;
use thiserror::Error;

/// Failures surfaced by [`RecommendationEngine`](crate::RecommendationEngine).
///
/// Missing data is not in here: empty interactions or an empty catalog
/// degrade to shorter results, they never fail.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The store could not be read
    #[error("storage failure: {0}")]
    StorageFailure(#[from] DataLoadError),

    /// The utility matrix could not be factorized
    #[error("factorization failed: {0}")]
    Factorization(String),

    /// Invalid or unreadable configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Convenience type alias for engine results
pub type Result<T> = std::result::Result<T, EngineError>;
