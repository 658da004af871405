//! Analysis configuration with builder pattern.
//!
//! [`AnalysisConfig`] collects the knobs shared by the effectiveness drivers.
//! It uses the `bon` crate for builder generation with validation at build time,
//! and derives serde traits so an analysis run can be described in JSON.
//!
//! # Example
//!
//! ```
//! use rankeval::AnalysisConfig;
//!
//! // All defaults: step 10, 100 bins, automatic thread count
//! let config = AnalysisConfig::builder().build().unwrap();
//!
//! let config = AnalysisConfig::builder()
//!     .step(50)
//!     .bins(20)
//!     .n_threads(1)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.step, 50);
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("step must be at least 1")]
    InvalidStep,

    #[error("bins must be at least 1")]
    InvalidBins,
}

/// Configuration shared by the analysis drivers.
///
/// - `step`: spacing of tree-count checkpoints for
///   [`tree_wise_performance`](crate::analysis::tree_wise_performance)
/// - `bins`: number of equal-width bins on `[0, 1]` for
///   [`query_wise_performance`](crate::analysis::query_wise_performance)
/// - `n_threads`: `0` = all cores, `1` = sequential, `n` = exactly `n` threads
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Tree-count step between checkpoints. Default: 10.
    #[builder(default = 10)]
    pub step: usize,

    /// Number of score bins. Default: 100.
    #[builder(default = 100)]
    pub bins: usize,

    /// Thread count. Default: 0 (auto).
    #[builder(default = 0)]
    pub n_threads: usize,
}

impl<S: analysis_config_builder::IsComplete> AnalysisConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `step == 0` or `bins == 0`.
    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl AnalysisConfig {
    /// Validate the configuration.
    ///
    /// Configs obtained through serde skip the builder, so the drivers call
    /// this again before doing any work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step == 0 {
            return Err(ConfigError::InvalidStep);
        }
        if self.bins == 0 {
            return Err(ConfigError::InvalidBins);
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            step: 10,
            bins: 100,
            n_threads: 0,
        }
    }
}
