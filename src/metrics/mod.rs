//! Ranking-quality metrics.
//!
//! A [`Metric`] maps a dataset and its predicted scores to one score per
//! query group plus an aggregate (the mean over queries). The analysis
//! drivers treat metrics as black boxes; the implementations here are the
//! usual learning-to-rank references.
//!
//! # Available Metrics
//!
//! - [`Ndcg`]: Normalized Discounted Cumulative Gain (exponential gain)
//! - [`Precision`]: fraction of relevant documents in the top `k`
//! - [`ReciprocalRank`]: `1 / rank` of the first relevant document
//!
//! Within a query, documents are ranked by descending score; ties keep
//! dataset order.

mod ranking;

pub use ranking::{Ndcg, Precision, ReciprocalRank};

use ndarray::{s, Array1, ArrayView1};

use crate::data::DatasetView;

// =============================================================================
// MetricScore
// =============================================================================

/// Output of [`Metric::eval`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricScore {
    /// Mean of `per_query`, `NaN` for a dataset without queries.
    pub aggregate: f64,
    /// One score per query group, in dataset order.
    pub per_query: Array1<f64>,
}

// =============================================================================
// Metric Trait
// =============================================================================

/// A per-query ranking metric.
///
/// Implementors provide [`eval_query`](Self::eval_query); [`eval`](Self::eval)
/// slices the dataset into its query groups and averages.
pub trait Metric: Send + Sync {
    /// Name used as the metric's label in performance tensors.
    fn name(&self) -> String;

    /// Score a single query given its labels and predicted scores.
    fn eval_query(&self, labels: ArrayView1<'_, f32>, scores: ArrayView1<'_, f64>) -> f64;

    /// Score every query of `dataset` against `y_pred`.
    fn eval(&self, dataset: &dyn DatasetView, y_pred: ArrayView1<'_, f64>) -> MetricScore {
        let labels = dataset.labels();
        let per_query: Array1<f64> = dataset
            .query_offsets()
            .windows(2)
            .map(|w| {
                let (start, end) = (w[0], w[1]);
                self.eval_query(labels.slice(s![start..end]), y_pred.slice(s![start..end]))
            })
            .collect();
        let aggregate = per_query.mean().unwrap_or(f64::NAN);

        MetricScore {
            aggregate,
            per_query,
        }
    }
}

/// Document order by descending score. The sort is stable.
pub fn rank_by_score(scores: ArrayView1<'_, f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}
