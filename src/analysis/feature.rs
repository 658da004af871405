//! Per-feature attribution of prediction mass.
//!
//! Every node of a tree carries an expected output `E(n)`: the leaf value
//! for leaves, the (cover-weighted) mean of the children for splits; see
//! [`Tree::expected_values`](crate::repr::Tree::expected_values). When an
//! instance moves from split `n` to child `c`, the split changes its
//! expected output by `E(c) - E(n)`. That change is charged to the feature
//! tested at `n`:
//!
//! ```text
//! importance[feature(n)] += |weight_t * (E(c) - E(n))| / n_instances
//! ```
//!
//! Along a path the changes telescope, so `E(root) + Σ changes` is the
//! reached leaf value. The attribution pass rebuilds each tree's output this
//! way, and the rebuilt outputs must sum (weighted) to the scorer's
//! predictions.
//!
//! `counts[f]` is the number of distinct split nodes testing `f` that at
//! least one instance passed through.

use ndarray::{Array1, ArrayViewMut1};

use crate::data::DatasetView;
use crate::error::EvalError;
use crate::repr::{Ensemble, TreeView};

/// Result of [`feature_importance`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    /// Accumulated absolute contribution per feature.
    pub importance: Array1<f64>,
    /// Visited split nodes per feature.
    pub counts: Array1<u32>,
    /// Predictions rebuilt by the attribution pass.
    pub y_pred: Array1<f64>,
}

impl FeatureImportance {
    pub fn n_features(&self) -> usize {
        self.importance.len()
    }

    /// Importance scaled to sum to 1 (all zeros if nothing was attributed).
    pub fn normalized(&self) -> Array1<f64> {
        let total = self.importance.sum();
        if total > 0.0 {
            &self.importance / total
        } else {
            Array1::zeros(self.importance.len())
        }
    }

    /// The `k` most important features as `(feature, importance)`, highest
    /// first. Ties are broken by feature index.
    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self.importance.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }
}

/// Attribute the ensemble's predictions on `dataset` to features.
///
/// # Errors
///
/// - [`EvalError::DimensionMismatch`] if a split tests a feature the dataset
///   does not have
/// - [`EvalError::InvalidTree`] if a tree is not a well-formed tree
pub fn feature_importance<D>(ensemble: &Ensemble, dataset: &D) -> Result<FeatureImportance, EvalError>
where
    D: DatasetView + ?Sized,
{
    let n_features = dataset.n_features();
    ensemble.check_features(n_features)?;

    let mut y_pred = Array1::<f64>::zeros(dataset.n_instances());
    let mut importance = Array1::<f64>::zeros(n_features);
    let mut counts = Array1::<u32>::zeros(n_features);

    for tree_idx in 0..ensemble.n_trees() {
        feature_importance_tree(
            ensemble,
            dataset,
            tree_idx,
            y_pred.view_mut(),
            importance.view_mut(),
            counts.view_mut(),
        )?;
    }

    tracing::debug!(
        model = ensemble.name(),
        dataset = dataset.name(),
        visited_splits = counts.sum(),
        "feature importance computed"
    );

    Ok(FeatureImportance {
        importance,
        counts,
        y_pred,
    })
}

/// Attribute a single tree.
///
/// Adds the tree's weighted output into `y_pred` and its attribution into
/// `importance` and `counts`. Returns the tree's unweighted output for every
/// instance, which matches column `tree_idx` of the scorer's partial matrix.
///
/// # Errors
///
/// - [`EvalError::TreeOutOfRange`] if `tree_idx` is not a tree of `ensemble`
/// - [`EvalError::BufferLenMismatch`] unless `y_pred` has one entry per
///   instance and `importance` and `counts` one per feature
/// - [`EvalError::DimensionMismatch`] if the tree tests a missing feature
pub fn feature_importance_tree<D>(
    ensemble: &Ensemble,
    dataset: &D,
    tree_idx: usize,
    mut y_pred: ArrayViewMut1<'_, f64>,
    mut importance: ArrayViewMut1<'_, f64>,
    mut counts: ArrayViewMut1<'_, u32>,
) -> Result<Array1<f64>, EvalError>
where
    D: DatasetView + ?Sized,
{
    let n_trees = ensemble.n_trees();
    if tree_idx >= n_trees {
        return Err(EvalError::TreeOutOfRange {
            tree: tree_idx,
            n_trees,
        });
    }

    let n_instances = dataset.n_instances();
    let n_features = dataset.n_features();
    for (buffer, expected, actual) in [
        ("y_pred", n_instances, y_pred.len()),
        ("importance", n_features, importance.len()),
        ("counts", n_features, counts.len()),
    ] {
        if actual != expected {
            return Err(EvalError::BufferLenMismatch {
                buffer,
                expected,
                actual,
            });
        }
    }

    let tree = ensemble.tree(tree_idx);
    let weight = ensemble.weight(tree_idx);
    if let Some(feature) = tree.max_feature_index() {
        if feature as usize >= n_features {
            return Err(EvalError::DimensionMismatch {
                tree: tree_idx,
                feature,
                n_features,
            });
        }
    }

    let expected = tree
        .expected_values()
        .map_err(|source| EvalError::InvalidTree {
            tree: tree_idx,
            source,
        })?;

    let scale = if n_instances > 0 {
        1.0 / n_instances as f64
    } else {
        0.0
    };
    let mut visited = vec![false; tree.n_nodes()];
    let mut contribution = Array1::<f64>::zeros(n_instances);

    for i in 0..n_instances {
        let sample = dataset.sample(i);
        let mut value = expected[0];
        tree.traverse_with(&sample, |node, child| {
            let delta = expected[child as usize] - expected[node as usize];
            value += delta;
            importance[tree.split_index(node) as usize] += (weight * delta).abs() * scale;
            visited[node as usize] = true;
        })
        .map_err(|reason| EvalError::MalformedModel {
            tree: tree_idx,
            reason,
        })?;

        contribution[i] = value;
        y_pred[i] += weight * value;
    }

    for (node, _) in visited.iter().enumerate().filter(|&(_, &v)| v) {
        counts[tree.split_index(node as u32) as usize] += 1;
    }

    Ok(contribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn stump_on_feature_7() -> Ensemble {
        let tree = crate::tree! {
            0 => split(7, 0.5) -> 1, 2,
            1 => leaf(0.0),
            2 => leaf(1.0),
        };
        Ensemble::from_trees("stump", vec![tree], vec![1.0]).unwrap()
    }

    fn two_instances() -> Dataset {
        let mut features = Array2::<f32>::zeros((2, 8));
        features[[0, 7]] = 0.2;
        features[[1, 7]] = 0.8;
        Dataset::new("d", features, array![0.0, 1.0], vec![1, 1]).unwrap()
    }

    #[test]
    fn single_split_example() {
        let fi = feature_importance(&stump_on_feature_7(), &two_instances()).unwrap();

        assert_eq!(fi.y_pred, array![0.0, 1.0]);
        assert_eq!(fi.counts[7], 1);
        assert_eq!(fi.counts.sum(), 1);
        assert_abs_diff_eq!(fi.importance[7], 0.5);
        assert_eq!(fi.importance.iter().filter(|&&v| v > 0.0).count(), 1);
    }

    #[test]
    fn unvisited_branch_is_not_counted() {
        let tree = crate::tree! {
            0 => split(0, 0.5) -> 1, 2,
            1 => leaf(1.0),
            2 => split(1, 0.5) -> 3, 4,
            3 => leaf(2.0),
            4 => leaf(3.0),
        };
        let ensemble = Ensemble::from_trees("m", vec![tree], vec![2.0]).unwrap();
        // Both instances go left at the root, so node 2 is never reached.
        let ds = Dataset::new("d", array![[0.1f32, 0.9], [0.2, 0.1]], array![0.0, 0.0], vec![1, 1]).unwrap();

        let fi = feature_importance(&ensemble, &ds).unwrap();
        assert_eq!(fi.counts, array![1u32, 0]);
        assert_eq!(fi.importance[1], 0.0);
        // E(root) = (1 + 2.5) / 2 = 1.75; delta to left leaf = -0.75
        assert_abs_diff_eq!(fi.importance[0], 2.0 * 0.75);
        assert_eq!(fi.y_pred, array![2.0, 2.0]);
    }

    #[test]
    fn covers_change_attribution_but_not_predictions() {
        let tree = crate::tree! {
            0 => split(0, 0.5) -> 1, 2,
            1 => leaf(0.0),
            2 => leaf(1.0),
        };
        let covered = tree.clone().with_covers(vec![10.0, 9.0, 1.0]);
        let ds = Dataset::new("d", array![[0.0f32], [1.0]], array![0.0, 1.0], vec![1, 1]).unwrap();

        let plain = feature_importance(&Ensemble::from_trees("a", vec![tree], vec![1.0]).unwrap(), &ds).unwrap();
        let weighted = feature_importance(&Ensemble::from_trees("b", vec![covered], vec![1.0]).unwrap(), &ds).unwrap();

        assert_abs_diff_eq!(weighted.y_pred[0], plain.y_pred[0], epsilon = 1e-12);
        assert_abs_diff_eq!(weighted.y_pred[1], plain.y_pred[1], epsilon = 1e-12);
        assert_abs_diff_eq!(plain.importance[0], 0.5);
        // E(root) = 0.1: |0 - 0.1| / 2 + |1 - 0.1| / 2
        assert_abs_diff_eq!(weighted.importance[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn tree_out_of_range() {
        let ensemble = stump_on_feature_7();
        let ds = two_instances();
        let mut y_pred = Array1::zeros(2);
        let mut importance = Array1::zeros(8);
        let mut counts = Array1::zeros(8);
        let err = feature_importance_tree(
            &ensemble,
            &ds,
            1,
            y_pred.view_mut(),
            importance.view_mut(),
            counts.view_mut(),
        )
        .unwrap_err();
        assert_eq!(err, EvalError::TreeOutOfRange { tree: 1, n_trees: 1 });
    }

    #[test]
    fn short_buffers_are_rejected() {
        let ensemble = stump_on_feature_7();
        let ds = two_instances();
        let cases = [
            ("y_pred", 1, 8, 8, 2, 1),
            ("importance", 2, 7, 8, 8, 7),
            ("counts", 2, 8, 3, 8, 3),
        ];
        for (buffer, n_pred, n_importance, n_counts, expected, actual) in cases {
            let mut y_pred = Array1::zeros(n_pred);
            let mut importance = Array1::zeros(n_importance);
            let mut counts = Array1::zeros(n_counts);
            let err = feature_importance_tree(
                &ensemble,
                &ds,
                0,
                y_pred.view_mut(),
                importance.view_mut(),
                counts.view_mut(),
            )
            .unwrap_err();
            assert_eq!(
                err,
                EvalError::BufferLenMismatch {
                    buffer,
                    expected,
                    actual
                }
            );
        }
    }

    #[test]
    fn normalized_and_top_k() {
        let fi = FeatureImportance {
            importance: array![0.0, 3.0, 1.0, 3.0],
            counts: array![0, 2, 1, 1],
            y_pred: Array1::zeros(0),
        };
        assert_eq!(fi.normalized(), array![0.0, 3.0 / 7.0, 1.0 / 7.0, 3.0 / 7.0]);
        assert_eq!(fi.top_k(2), vec![(1, 3.0), (3, 3.0)]);
        assert_eq!(fi.top_k(10).len(), 4);

        let empty = FeatureImportance {
            importance: Array1::zeros(2),
            counts: Array1::zeros(2),
            y_pred: Array1::zeros(0),
        };
        assert_eq!(empty.normalized(), array![0.0, 0.0]);
    }
}
