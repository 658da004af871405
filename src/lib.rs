//! rankeval: effectiveness analysis of tree-ensemble ranking models.
//!
//! Scores labelled ranking datasets with additive tree ensembles and compares
//! models across datasets and metrics.
//!
//! # Key Types
//!
//! - [`Dataset`] / [`DatasetView`] - Query-grouped instances with relevance labels
//! - [`Ensemble`] - Weighted regression trees ([`repr`])
//! - [`Scorer`] - Per-instance predictions, optionally with per-tree breakdown
//! - [`Metric`] - Per-query ranking metrics ([`metrics`])
//! - [`PerformanceTensor`] - Labelled output of the analysis drivers
//! - [`AnalysisConfig`] - Configuration builder
//!
//! # Analyses
//!
//! - [`model_performance`]: one aggregate score per dataset, model and metric
//! - [`tree_wise_performance`]: the same, using only the first `k` trees
//! - [`query_wise_performance`]: cumulative distribution of per-query scores
//! - [`feature_importance`]: how much of the predictions each feature drives
//!
//! The library logs through `tracing` and installs no subscriber.

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod inference;
pub mod metrics;
pub mod repr;
pub mod testing;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Configuration
pub use config::{AnalysisConfig, ConfigError};

// Data and models
pub use data::{Dataset, DatasetError, DatasetView};
pub use repr::{Ensemble, Tree, TreeBuilder, TreeView};

// Scoring and metrics
pub use inference::{Predictions, Scorer};
pub use metrics::{Metric, MetricScore};

// Analyses
pub use analysis::{
    feature_importance, model_performance, query_wise_performance, tree_wise_performance,
    FeatureImportance, PerformanceTensor,
};

// Errors
pub use error::{EvalError, TraversalError};

// Shared utilities
pub use utils::{run_with_threads, Parallelism};
