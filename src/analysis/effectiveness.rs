//! Effectiveness analyses over datasets × models × metrics.
//!
//! Each driver scores every (dataset, model) pair once, evaluates every
//! metric on the result and returns a [`PerformanceTensor`]. Pairs are
//! independent: with more than one thread they run on a rayon pool, each
//! producing its own block of cells, and the tensor is filled only after
//! every pair has finished.

use std::collections::BTreeSet;

use ndarray::{Array1, ArrayView1};
use tracing::{debug, info, instrument};

use crate::config::AnalysisConfig;
use crate::data::DatasetView;
use crate::error::EvalError;
use crate::inference::Scorer;
use crate::metrics::Metric;
use crate::repr::Ensemble;
use crate::utils::{run_with_threads, Parallelism};

use super::tensor::{Axis, Coord, PerformanceTensor, AXIS_BIN, AXIS_DATASET, AXIS_K, AXIS_METRIC, AXIS_MODEL};

// =============================================================================
// Axes and work units
// =============================================================================

fn dataset_axis<D: DatasetView>(datasets: &[D]) -> Result<Axis, EvalError> {
    Axis::new(
        AXIS_DATASET,
        datasets.iter().map(|d| Coord::from(d.name())).collect(),
    )
}

fn model_axis(models: &[Ensemble]) -> Result<Axis, EvalError> {
    Axis::new(AXIS_MODEL, models.iter().map(|m| Coord::from(m.name())).collect())
}

fn metric_axis(metrics: &[&dyn Metric]) -> Result<Axis, EvalError> {
    Axis::new(AXIS_METRIC, metrics.iter().map(|m| Coord::Name(m.name())).collect())
}

/// Run `unit` for every (dataset, model) pair and collect the results in
/// dataset-major order. The first error wins.
fn for_each_pair<D, T, F>(
    datasets: &[D],
    models: &[Ensemble],
    n_threads: usize,
    unit: F,
) -> Result<Vec<((usize, usize), T)>, EvalError>
where
    D: DatasetView,
    T: Send,
    F: Fn(&D, &Ensemble, Parallelism) -> Result<T, EvalError> + Sync + Send,
{
    let pairs: Vec<(usize, usize)> = (0..datasets.len())
        .flat_map(|d| (0..models.len()).map(move |m| (d, m)))
        .collect();

    let results = run_with_threads(n_threads, |parallelism| {
        parallelism.maybe_par_map(pairs.clone(), |(d, m)| {
            debug!(
                dataset = datasets[d].name(),
                model = models[m].name(),
                "evaluating pair"
            );
            unit(&datasets[d], &models[m], parallelism)
        })
    });

    pairs
        .into_iter()
        .zip(results)
        .map(|(pair, result)| result.map(|cells| (pair, cells)))
        .collect()
}

// =============================================================================
// Aggregate performance
// =============================================================================

/// Aggregate score of every metric for every (dataset, model) pair.
///
/// Axes: `[dataset, model, metric]`. Every cell is populated.
#[instrument(skip_all, fields(n_datasets = datasets.len(), n_models = models.len(), n_metrics = metrics.len()))]
pub fn model_performance<D: DatasetView>(
    datasets: &[D],
    models: &[Ensemble],
    metrics: &[&dyn Metric],
    config: &AnalysisConfig,
) -> Result<PerformanceTensor, EvalError> {
    config.validate()?;
    let axes = vec![dataset_axis(datasets)?, model_axis(models)?, metric_axis(metrics)?];
    let mut tensor = PerformanceTensor::new("model_performance", axes, 0.0);

    let blocks = for_each_pair(datasets, models, config.n_threads, |dataset, model, parallelism| {
        let preds = Scorer::new(model)
            .with_parallelism(parallelism)
            .score(dataset, false)?;
        Ok(evaluate_metrics(metrics, dataset, preds.y_pred.view()))
    })?;

    for ((d, m), scores) in blocks {
        for (k, score) in scores.into_iter().enumerate() {
            tensor.set(&[d, m, k], score);
        }
    }

    info!(cells = tensor.values().len(), "model performance computed");
    Ok(tensor)
}

fn evaluate_metrics<D: DatasetView>(metrics: &[&dyn Metric], dataset: &D, y_pred: ArrayView1<'_, f64>) -> Vec<f64> {
    metrics
        .iter()
        .map(|metric| metric.eval(dataset, y_pred).aggregate)
        .collect()
}

// =============================================================================
// Tree-wise performance
// =============================================================================

/// Tree-count checkpoints for a model of `n_trees` trees (0-indexed).
///
/// `step - 1, 2 * step - 1, ...`, followed by `n_trees - 1` unless it is
/// already the last checkpoint.
///
/// ```
/// use rankeval::analysis::tree_steps;
///
/// assert_eq!(tree_steps(35, 10), vec![9, 19, 29, 34]);
/// assert_eq!(tree_steps(30, 10), vec![9, 19, 29]);
/// assert_eq!(tree_steps(4, 10), vec![3]);
/// ```
pub fn tree_steps(n_trees: usize, step: usize) -> Vec<usize> {
    if n_trees == 0 {
        return Vec::new();
    }
    let step = step.max(1);
    let mut steps: Vec<usize> = (step - 1..n_trees).step_by(step).collect();
    if steps.last() != Some(&(n_trees - 1)) {
        steps.push(n_trees - 1);
    }
    steps
}

/// Aggregate metric scores using only the first `k` trees of each model.
///
/// Axes: `[dataset, model, k, metric]`. The `k` coordinates are
/// [`Coord::Trees`] counts: the sorted union of every model's own
/// [`tree_steps`]. A model fills exactly its own checkpoints, so its full
/// size is always present; every other cell of its row stays `NaN`.
///
/// Each model is scored once in detailed mode. The running prediction at a
/// checkpoint is the weighted prefix sum of the partial matrix, so no tree
/// is traversed twice.
#[instrument(skip_all, fields(n_datasets = datasets.len(), n_models = models.len(), n_metrics = metrics.len(), step = config.step))]
pub fn tree_wise_performance<D: DatasetView>(
    datasets: &[D],
    models: &[Ensemble],
    metrics: &[&dyn Metric],
    config: &AnalysisConfig,
) -> Result<PerformanceTensor, EvalError> {
    config.validate()?;
    let checkpoints: Vec<usize> = models
        .iter()
        .flat_map(|model| tree_steps(model.n_trees(), config.step))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let axes = vec![
        dataset_axis(datasets)?,
        model_axis(models)?,
        Axis::new(AXIS_K, checkpoints.iter().map(|&c| Coord::Trees(c + 1)).collect())?,
        metric_axis(metrics)?,
    ];
    let mut tensor = PerformanceTensor::new("tree_wise_performance", axes, f64::NAN);

    let blocks = for_each_pair(datasets, models, config.n_threads, |dataset, model, parallelism| {
        let partial = Scorer::new(model)
            .with_parallelism(parallelism)
            .partial_scores(dataset)?;

        // Own checkpoints are a sorted subset of the axis.
        let own: BTreeSet<usize> = tree_steps(model.n_trees(), config.step).into_iter().collect();
        let mut running = Array1::<f64>::zeros(dataset.n_instances());
        let mut next_tree = 0;
        let mut rows = Vec::with_capacity(own.len());
        for (k, &checkpoint) in checkpoints.iter().enumerate() {
            if !own.contains(&checkpoint) {
                continue;
            }
            for tree in next_tree..=checkpoint {
                running.scaled_add(model.weight(tree), &partial.column(tree));
            }
            next_tree = checkpoint + 1;
            rows.push((k, evaluate_metrics(metrics, dataset, running.view())));
        }
        Ok(rows)
    })?;

    for ((d, m), rows) in blocks {
        for (k, scores) in rows {
            for (metric, score) in scores.into_iter().enumerate() {
                tensor.set(&[d, m, k, metric], score);
            }
        }
    }

    info!(
        checkpoints = checkpoints.len(),
        defined = tensor.n_defined(),
        "tree-wise performance computed"
    );
    Ok(tensor)
}

// =============================================================================
// Query-wise performance
// =============================================================================

/// Cumulative distribution of per-query scores over `bins` equal-width bins
/// on `[0, 1]`.
///
/// Entry `b` is the fraction of queries scoring at most `(b + 1) / bins`.
/// Scores outside `[0, 1]` (and `NaN`) fall in no bin but still count as
/// queries. With no queries every entry is `NaN`.
pub fn cumulative_distribution(scores: ArrayView1<'_, f64>, bins: usize) -> Vec<f64> {
    if bins == 0 {
        return Vec::new();
    }
    let mut counts = vec![0usize; bins];
    for &score in scores.iter() {
        if !(0.0..=1.0).contains(&score) {
            continue;
        }
        counts[bin_of(score, bins)] += 1;
    }

    let n_queries = scores.len() as f64;
    let mut seen = 0usize;
    counts
        .into_iter()
        .map(|count| {
            seen += count;
            seen as f64 / n_queries
        })
        .collect()
}

/// Index of the first bin whose right edge `(b + 1) / bins` is at least
/// `score`, for `score` in `[0, 1]`.
///
/// `score * bins` can round across an integer, so the estimate is corrected
/// against the same edges the bin axis is labelled with.
fn bin_of(score: f64, bins: usize) -> usize {
    let edge = |b: usize| (b + 1) as f64 / bins as f64;
    let mut bin = ((score * bins as f64).ceil() as usize).saturating_sub(1).min(bins - 1);
    while bin > 0 && score <= edge(bin - 1) {
        bin -= 1;
    }
    while bin < bins - 1 && score > edge(bin) {
        bin += 1;
    }
    bin
}

/// Cumulative distribution of each metric's per-query scores.
///
/// Axes: `[dataset, model, metric, bin]`; bin coordinates are the right
/// edges [`Coord::Edge`]`((b + 1) / bins)`.
#[instrument(skip_all, fields(n_datasets = datasets.len(), n_models = models.len(), n_metrics = metrics.len(), bins = config.bins))]
pub fn query_wise_performance<D: DatasetView>(
    datasets: &[D],
    models: &[Ensemble],
    metrics: &[&dyn Metric],
    config: &AnalysisConfig,
) -> Result<PerformanceTensor, EvalError> {
    config.validate()?;
    let bins = config.bins;
    let edges: Vec<Coord> = (0..bins)
        .map(|b| Coord::Edge((b + 1) as f64 / bins as f64))
        .collect();

    let axes = vec![
        dataset_axis(datasets)?,
        model_axis(models)?,
        metric_axis(metrics)?,
        Axis::new(AXIS_BIN, edges)?,
    ];
    let mut tensor = PerformanceTensor::new("query_wise_performance", axes, f64::NAN);

    let blocks = for_each_pair(datasets, models, config.n_threads, |dataset, model, parallelism| {
        let preds = Scorer::new(model)
            .with_parallelism(parallelism)
            .score(dataset, false)?;
        Ok(metrics
            .iter()
            .map(|metric| {
                let per_query = metric.eval(dataset, preds.y_pred.view()).per_query;
                cumulative_distribution(per_query.view(), bins)
            })
            .collect::<Vec<_>>())
    })?;

    for ((d, m), curves) in blocks {
        for (k, curve) in curves.into_iter().enumerate() {
            for (b, value) in curve.into_iter().enumerate() {
                tensor.set(&[d, m, k, b], value);
            }
        }
    }

    info!(bins, "query-wise performance computed");
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rstest::rstest;

    #[rstest]
    #[case(35, 10, vec![9, 19, 29, 34])]
    #[case(30, 10, vec![9, 19, 29])]
    #[case(9, 10, vec![8])]
    #[case(10, 10, vec![9])]
    #[case(3, 1, vec![0, 1, 2])]
    #[case(0, 10, vec![])]
    fn checkpoints(#[case] n_trees: usize, #[case] step: usize, #[case] expected: Vec<usize>) {
        assert_eq!(tree_steps(n_trees, step), expected);
    }

    #[test]
    fn cumulative_distribution_edges() {
        let scores = array![0.0, 0.25, 0.5, 1.0];
        let cdf = cumulative_distribution(scores.view(), 4);
        assert_eq!(cdf, vec![0.5, 0.75, 0.75, 1.0]);
    }

    #[rstest]
    #[case(0.3, 2)]
    #[case(0.5, 4)]
    #[case(0.7, 6)]
    #[case(0.1, 0)]
    #[case(0.0, 0)]
    #[case(1.0, 9)]
    #[case(0.35, 3)]
    fn score_on_an_edge_counts_at_that_edge(#[case] score: f64, #[case] first_bin: usize) {
        let cdf = cumulative_distribution(array![score].view(), 10);
        for (b, &value) in cdf.iter().enumerate() {
            let expected = if b >= first_bin { 1.0 } else { 0.0 };
            assert_eq!(value, expected, "score {score}, bin {b}");
        }
    }

    #[test]
    fn cumulative_distribution_ignores_out_of_range() {
        let scores = array![0.1, f64::NAN, 1.5, 0.9];
        let cdf = cumulative_distribution(scores.view(), 2);
        assert_abs_diff_eq!(cdf[0], 0.25);
        assert_abs_diff_eq!(cdf[1], 0.5);
    }

    #[test]
    fn cumulative_distribution_without_queries() {
        let cdf = cumulative_distribution(Array1::<f64>::zeros(0).view(), 3);
        assert_eq!(cdf.len(), 3);
        assert!(cdf.iter().all(|v| v.is_nan()));
    }
}
