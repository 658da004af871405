//! Error types shared by scoring, attribution and the analysis drivers.
//!
//! Every failure here is a deterministic function of the inputs: nothing is
//! retried, and undefined tensor cells (see [`crate::analysis::PerformanceTensor`])
//! are never reported through these types.

use crate::config::ConfigError;
use crate::data::DatasetError;
use crate::repr::{NodeId, TreeValidationError};

/// A traversal that could not reach a leaf.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraversalError {
    #[error("node {node} is out of bounds (tree has {n_nodes} nodes)")]
    NodeOutOfBounds { node: NodeId, n_nodes: usize },

    #[error("node {node} tests feature {feature}, but samples have {n_features} features")]
    FeatureOutOfBounds {
        node: NodeId,
        feature: u32,
        n_features: usize,
    },

    #[error("no leaf reached after {steps} steps (cyclic tree?)")]
    NoLeafReached { steps: usize },
}

/// Errors produced by the evaluation engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("malformed model: tree {tree}: {reason}")]
    MalformedModel {
        tree: usize,
        #[source]
        reason: TraversalError,
    },

    #[error("invalid tree {tree}: {source}")]
    InvalidTree {
        tree: usize,
        #[source]
        source: TreeValidationError,
    },

    #[error("tree {tree} splits on feature {feature}, but the dataset has {n_features} features")]
    DimensionMismatch {
        tree: usize,
        feature: u32,
        n_features: usize,
    },

    #[error("ensemble has {n_trees} trees but {n_weights} weights")]
    WeightsLenMismatch { n_trees: usize, n_weights: usize },

    #[error("{buffer} buffer has length {actual}, expected {expected}")]
    BufferLenMismatch {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("tree index {tree} out of range (ensemble has {n_trees} trees)")]
    TreeOutOfRange { tree: usize, n_trees: usize },

    #[error("duplicate label {label:?} on axis '{axis}'")]
    DuplicateLabel { axis: &'static str, label: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
