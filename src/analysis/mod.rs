//! Model analyses.
//!
//! - [`effectiveness`]: aggregate, tree-wise and query-wise performance of
//!   several models on several datasets
//! - [`feature`]: attribution of predictions to the features tested by splits
//! - [`tensor`]: the labelled [`PerformanceTensor`] the effectiveness drivers
//!   return

pub mod effectiveness;
pub mod feature;
pub mod tensor;

pub use effectiveness::{
    cumulative_distribution, model_performance, query_wise_performance, tree_steps,
    tree_wise_performance,
};
pub use feature::{feature_importance, feature_importance_tree, FeatureImportance};
pub use tensor::{Axis, Coord, PerformanceTensor};
