//! Weighted tree ensemble.

use crate::data::DatasetView;
use crate::error::EvalError;
use crate::inference::{Predictions, Scorer};

use super::Tree;

/// Ordered collection of trees with one scalar weight per tree.
///
/// The prediction for an instance is `Σ_t weight[t] * leaf_t(instance)`.
/// Tree order is stable and defines the order used by tree-wise analysis.
///
/// # Example
///
/// ```
/// use rankeval::repr::Ensemble;
///
/// let stump = rankeval::tree! {
///     0 => split(0, 0.5) -> 1, 2,
///     1 => leaf(0.0),
///     2 => leaf(1.0),
/// };
/// let ensemble = Ensemble::from_trees("stump", vec![stump], vec![0.1]).unwrap();
/// assert_eq!(ensemble.n_trees(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    name: String,
    trees: Vec<Tree>,
    weights: Vec<f64>,
}

impl Ensemble {
    /// Create an empty ensemble.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trees: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Create an ensemble from trees and their weights.
    ///
    /// Every tree is validated.
    ///
    /// # Errors
    ///
    /// [`EvalError::WeightsLenMismatch`] if the lengths differ,
    /// [`EvalError::InvalidTree`] for the first structurally invalid tree.
    pub fn from_trees(
        name: impl Into<String>,
        trees: Vec<Tree>,
        weights: Vec<f64>,
    ) -> Result<Self, EvalError> {
        if trees.len() != weights.len() {
            return Err(EvalError::WeightsLenMismatch {
                n_trees: trees.len(),
                n_weights: weights.len(),
            });
        }
        let ensemble = Self {
            name: name.into(),
            trees,
            weights,
        };
        ensemble.validate()?;
        Ok(ensemble)
    }

    /// Append a tree. No validation is done here.
    pub fn push_tree(&mut self, tree: Tree, weight: f64) {
        self.trees.push(tree);
        self.weights.push(weight);
    }

    /// Label used for this model in performance tensors.
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    #[inline]
    pub fn weight(&self, idx: usize) -> f64 {
        self.weights[idx]
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Iterate over `(tree, weight)` pairs in ensemble order.
    pub fn trees_with_weights(&self) -> impl Iterator<Item = (&Tree, f64)> + '_ {
        self.trees.iter().zip(self.weights.iter().copied())
    }

    /// Validate every tree.
    pub fn validate(&self) -> Result<(), EvalError> {
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|source| EvalError::InvalidTree {
                    tree: tree_idx,
                    source,
                })?;
        }
        Ok(())
    }

    /// Largest feature index tested by any split of any tree.
    pub fn max_feature_index(&self) -> Option<u32> {
        self.trees.iter().filter_map(Tree::max_feature_index).max()
    }

    /// Check that every split tests a feature below `n_features`.
    ///
    /// # Errors
    ///
    /// [`EvalError::DimensionMismatch`] naming the first offending tree.
    pub fn check_features(&self, n_features: usize) -> Result<(), EvalError> {
        self.check_leading_features(self.n_trees(), n_features)
    }

    /// Like [`check_features`](Self::check_features), restricted to the first
    /// `n_trees` trees.
    pub fn check_leading_features(&self, n_trees: usize, n_features: usize) -> Result<(), EvalError> {
        for (tree_idx, tree) in self.trees.iter().take(n_trees).enumerate() {
            if let Some(feature) = tree.max_feature_index() {
                if feature as usize >= n_features {
                    return Err(EvalError::DimensionMismatch {
                        tree: tree_idx,
                        feature,
                        n_features,
                    });
                }
            }
        }
        Ok(())
    }

    /// Score `dataset` sequentially. See [`Scorer::score`].
    pub fn score(&self, dataset: &dyn DatasetView, detailed: bool) -> Result<Predictions, EvalError> {
        Scorer::new(self).score(dataset, detailed)
    }
}
