//! Filtering and hybrid merging of movie candidates.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - HybridSelector, which turns personalized and popularity candidates
//!   into the final recommendation list
//!
//! ## Architecture
//! A request flows through:
//! 1. Cold start check against the predicted score table
//! 2. Personalized candidates up to the merge policy's quota
//! 3. Popularity filler, run through `AlreadyInteractedFilter` and
//!    `ExcludeMoviesFilter` so nothing seen or already picked comes back
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{HybridSelector, MergePolicy};
//!
//! let selector = HybridSelector::new(MergePolicy::Quota(5));
//! let result = selector.select(&context, 10, &latent, &popularity)?;
//! println!("{} -> {:?}", result.kind.as_str(), result.recommendations);
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod hybrid;
pub mod traits;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use hybrid::{HybridSelector, MergePolicy, RecommendationKind, RecommendationResult};
pub use traits::Filter;
