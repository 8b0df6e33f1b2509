//! Engine configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it wants
//! to change:
//!
//! ```json
//! { "merge_policy": { "quota": 3 }, "max_rank": 10 }
//! ```

use crate::error::{EngineError, Result};
use pipeline::{HybridSelector, MergePolicy};
use serde::{Deserialize, Serialize};
use sources::LatentFactorEstimator;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound on the factorization rank
    pub max_rank: usize,
    pub seed: u64,
    pub oversamples: usize,
    pub power_iterations: usize,

    pub merge_policy: MergePolicy,

    /// Recommendation count when the caller does not give one
    pub default_count: usize,

    /// Minimum popularity pool pulled when filling
    pub popular_pool_size: usize,

    /// Catalog ids fetched for padding; `None` fetches the whole catalog
    pub catalog_limit: Option<usize>,

    pub refresh_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rank: 20,
            seed: 42,
            oversamples: 10,
            power_iterations: 5,
            merge_policy: MergePolicy::default(),
            default_count: 10,
            popular_pool_size: 20,
            catalog_limit: None,
            refresh_interval_secs: 300,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rank == 0 {
            return Err(EngineError::Config("max_rank must be at least 1".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(EngineError::Config(
                "refresh_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    pub fn with_max_rank(mut self, max_rank: usize) -> Self {
        self.max_rank = max_rank;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_catalog_limit(mut self, limit: Option<usize>) -> Self {
        self.catalog_limit = limit;
        self
    }

    pub fn with_default_count(mut self, count: usize) -> Self {
        self.default_count = count;
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub(crate) fn estimator(&self) -> LatentFactorEstimator {
        LatentFactorEstimator::new()
            .with_max_rank(self.max_rank)
            .with_seed(self.seed)
            .with_oversamples(self.oversamples)
            .with_power_iterations(self.power_iterations)
    }

    pub(crate) fn selector(&self) -> HybridSelector {
        HybridSelector::new(self.merge_policy).with_popular_pool_size(self.popular_pool_size)
    }
}
