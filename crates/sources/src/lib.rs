//! # Sources Crate
//!
//! The numeric side of the recommender: scoring raw watchlist rows,
//! building the utility matrix, factorizing it, and generating candidates.
//!
//! ## Components
//!
//! ### Interaction scoring
//! `score = status_weight + rating` per row, never failing.
//!
//! ### Utility matrix / latent factors
//! Dense user x movie matrix (mean of duplicates, zeros imputed), reduced
//! with a seeded truncated SVD into a predicted score for every cell.
//!
//! ### Latent Factor Source (personalized)
//! A user's predicted row, minus what they already interacted with.
//!
//! ### Popularity Source (global)
//! `interaction_count * avg_score` per movie, padded from the catalog.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{build_utility_matrix, score_interactions, LatentFactorEstimator};
//! use sources::{LatentFactorSource, PopularitySource};
//! use std::sync::Arc;
//!
//! let scored = score_interactions(&interactions);
//! let matrix = build_utility_matrix(&scored);
//! let table = Arc::new(LatentFactorEstimator::new().estimate(&matrix)?);
//!
//! let latent = LatentFactorSource::new(table);
//! let popular = PopularitySource::new(&scored, catalog_ids);
//! ```

pub mod factorization;
pub mod latent;
pub mod matrix;
pub mod popularity;
pub mod scoring;
pub mod types;
pub mod user_context;

// Re-export commonly used types
pub use factorization::{Factors, LatentFactorEstimator};
pub use latent::LatentFactorSource;
pub use matrix::{PredictedScoreTable, UserItemMatrix, UtilityMatrix, build_utility_matrix};
pub use popularity::{PopularitySource, PopularityStats};
pub use scoring::{ScoredInteraction, score_interaction, score_interactions};
pub use types::{Candidate, CandidateSource, UserContext};
pub use user_context::{InteractionIndex, build_user_context};
