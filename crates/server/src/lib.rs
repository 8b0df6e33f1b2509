//! Server crate for the ReelRecs recommendation engine.
//!
//! This crate contains the engine that owns the cached model snapshot and
//! answers `recommend` / `popular` from it, plus its configuration and
//! error types.

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::{EngineSnapshot, RecommendationEngine};
pub use error::EngineError;
