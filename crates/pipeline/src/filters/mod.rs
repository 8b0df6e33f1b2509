//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod already_interacted;
pub mod exclude_movies;

// Re-export for convenience
pub use already_interacted::AlreadyInteractedFilter;
pub use exclude_movies::ExcludeMoviesFilter;
