//! Scorer output.

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Result of scoring a dataset with an ensemble.
///
/// `partial` is only present for detailed scoring. It has shape
/// `[n_instances, n_trees]` and holds each tree's *unweighted* leaf output,
/// so `y_pred[i] == Σ_t weight[t] * partial[[i, t]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    pub y_pred: Array1<f64>,
    pub partial: Option<Array2<f64>>,
}

impl Predictions {
    #[inline]
    pub fn n_instances(&self) -> usize {
        self.y_pred.len()
    }

    /// Number of trees in the breakdown, `None` if scoring was not detailed.
    pub fn n_trees(&self) -> Option<usize> {
        self.partial.as_ref().map(|p| p.ncols())
    }

    #[inline]
    pub fn is_detailed(&self) -> bool {
        self.partial.is_some()
    }

    /// Unweighted output of tree `tree` for every instance.
    pub fn partial_column(&self, tree: usize) -> Option<ArrayView1<'_, f64>> {
        self.partial
            .as_ref()
            .filter(|p| tree < p.ncols())
            .map(|p| p.index_axis(Axis(1), tree))
    }
}
