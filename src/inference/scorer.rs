//! Block-based ensemble scorer.
//!
//! Instances are processed in blocks: every tree of the ensemble is applied
//! to a block before moving on, which keeps tree nodes hot in cache. Blocks
//! are independent and may run on rayon workers.

use std::ops::Range;

use ndarray::{s, Array1, Array2, ArrayView1};

use crate::data::DatasetView;
use crate::error::EvalError;
use crate::repr::{Ensemble, TreeView};
use crate::utils::Parallelism;

use super::Predictions;

/// Default number of instances per block.
pub const DEFAULT_BLOCK_SIZE: usize = 64;

/// Scores datasets with a borrowed [`Ensemble`].
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use rankeval::data::Dataset;
/// use rankeval::inference::Scorer;
/// use rankeval::repr::Ensemble;
///
/// let tree = rankeval::tree! {
///     0 => split(0, 0.5) -> 1, 2,
///     1 => leaf(0.0),
///     2 => leaf(1.0),
/// };
/// let ensemble = Ensemble::from_trees("m", vec![tree], vec![2.0]).unwrap();
/// let dataset = Dataset::new("d", array![[0.2f32], [0.8]], array![0.0, 1.0], vec![1, 1]).unwrap();
///
/// let preds = Scorer::new(&ensemble).score(&dataset, true).unwrap();
/// assert_eq!(preds.y_pred, array![0.0, 2.0]);
/// assert_eq!(preds.partial.unwrap(), array![[0.0], [1.0]]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'e> {
    ensemble: &'e Ensemble,
    parallelism: Parallelism,
    block_size: usize,
}

/// Scores for one block of instances.
struct BlockScores {
    y_pred: Vec<f64>,
    /// Row-major `[block_len, width]`.
    partial: Vec<f64>,
}

impl<'e> Scorer<'e> {
    pub fn new(ensemble: &'e Ensemble) -> Self {
        Self {
            ensemble,
            parallelism: Parallelism::Sequential,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Allow blocks to be scored in parallel.
    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set the number of instances per block (at least 1).
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    #[inline]
    pub fn ensemble(&self) -> &'e Ensemble {
        self.ensemble
    }

    /// Score every instance of `dataset` with the whole ensemble.
    ///
    /// With `detailed`, the returned [`Predictions`] also carry the
    /// `[n_instances, n_trees]` matrix of unweighted leaf outputs.
    ///
    /// # Errors
    ///
    /// - [`EvalError::DimensionMismatch`] if a split tests a feature the
    ///   dataset does not have
    /// - [`EvalError::MalformedModel`] if a traversal fails to reach a leaf
    pub fn score<D>(&self, dataset: &D, detailed: bool) -> Result<Predictions, EvalError>
    where
        D: DatasetView + ?Sized,
    {
        self.score_trees(dataset, self.ensemble.n_trees(), detailed)
    }

    /// Score with the first `n_trees` trees only.
    ///
    /// Equivalent to scoring with an ensemble truncated to its first
    /// `n_trees` trees and weights.
    pub fn score_trees<D>(
        &self,
        dataset: &D,
        n_trees: usize,
        detailed: bool,
    ) -> Result<Predictions, EvalError>
    where
        D: DatasetView + ?Sized,
    {
        let (y_pred, partial) = self.run(dataset, n_trees, detailed)?;
        Ok(Predictions {
            y_pred,
            partial: detailed.then_some(partial),
        })
    }

    /// Unweighted leaf output of every tree for every instance,
    /// `[n_instances, n_trees]`.
    pub fn partial_scores<D>(&self, dataset: &D) -> Result<Array2<f64>, EvalError>
    where
        D: DatasetView + ?Sized,
    {
        let (_, partial) = self.run(dataset, self.ensemble.n_trees(), true)?;
        Ok(partial)
    }

    /// Returns the final scores and the partial matrix, which has zero
    /// columns unless `detailed`.
    fn run<D>(
        &self,
        dataset: &D,
        n_trees: usize,
        detailed: bool,
    ) -> Result<(Array1<f64>, Array2<f64>), EvalError>
    where
        D: DatasetView + ?Sized,
    {
        let total = self.ensemble.n_trees();
        if n_trees > total {
            return Err(EvalError::TreeOutOfRange {
                tree: n_trees,
                n_trees: total,
            });
        }
        self.ensemble.check_leading_features(n_trees, dataset.n_features())?;

        let n_instances = dataset.n_instances();
        tracing::debug!(
            model = self.ensemble.name(),
            dataset = dataset.name(),
            n_instances,
            n_trees,
            detailed,
            "scoring"
        );

        let width = if detailed { n_trees } else { 0 };
        let block_size = self.block_size;
        let blocks: Vec<Range<usize>> = (0..n_instances)
            .step_by(block_size)
            .map(|start| start..(start + block_size).min(n_instances))
            .collect();

        let scored = self.parallelism.maybe_par_map(blocks.clone(), |rows| {
            self.score_block(dataset, rows, n_trees, width)
        });

        let mut y_pred = Array1::<f64>::zeros(n_instances);
        let mut partial = Array2::<f64>::zeros((n_instances, width));

        for (rows, block) in blocks.into_iter().zip(scored) {
            let block = block?;
            y_pred
                .slice_mut(s![rows.clone()])
                .assign(&ArrayView1::from(&block.y_pred[..]));

            if width > 0 {
                for (row, values) in rows.zip(block.partial.chunks_exact(width)) {
                    partial.row_mut(row).assign(&ArrayView1::from(values));
                }
            }
        }

        Ok((y_pred, partial))
    }

    /// Apply the first `n_trees` trees to `rows`. Leaf outputs are recorded
    /// when `width` (the partial row stride) is non-zero.
    fn score_block<D>(
        &self,
        dataset: &D,
        rows: Range<usize>,
        n_trees: usize,
        width: usize,
    ) -> Result<BlockScores, EvalError>
    where
        D: DatasetView + ?Sized,
    {
        let samples: Vec<ArrayView1<'_, f32>> = rows.map(|row| dataset.sample(row)).collect();
        let mut y_pred = vec![0.0; samples.len()];
        let mut partial = vec![0.0; samples.len() * width];

        for (tree_idx, (tree, weight)) in self.ensemble.trees_with_weights().take(n_trees).enumerate() {
            for (offset, sample) in samples.iter().enumerate() {
                let leaf = tree
                    .traverse_to_leaf(sample)
                    .map_err(|reason| EvalError::MalformedModel {
                        tree: tree_idx,
                        reason,
                    })?;
                let value = tree.leaf_value(leaf);
                if width > 0 {
                    partial[offset * width + tree_idx] = value;
                }
                y_pred[offset] += weight * value;
            }
        }

        Ok(BlockScores { y_pred, partial })
    }
}
