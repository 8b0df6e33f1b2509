//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::traits::Filter;
use anyhow::{Context, Result};
use sources::{Candidate, UserContext};
use tracing::debug;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(AlreadyInteractedFilter)
///     .add_filter(ExcludeMoviesFilter::new(chosen_ids));
///
/// let filtered = pipeline.apply(candidates, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the end of the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Number of filters in the pipeline
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter in insertion order, feeding each the output of the
    /// previous one. The first failing filter aborts the run.
    pub fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        self.filters
            .iter()
            .try_fold(candidates, |current, filter| {
                let before = current.len();
                let kept = filter
                    .apply(current, context)
                    .with_context(|| format!("{} failed", filter.name()))?;
                debug!(
                    filter = filter.name(),
                    user_id = context.user_id,
                    "kept {} of {} candidates",
                    kept.len(),
                    before
                );
                Ok::<_, anyhow::Error>(kept)
            })
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}
