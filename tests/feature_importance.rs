//! Feature attribution invariants.

use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};
use proptest::prelude::*;

use rankeval::testing::{random_dataset, random_ensemble};
use rankeval::{feature_importance, Dataset, DatasetView, Ensemble, EvalError, TreeView};

/// Number of distinct split nodes reached by at least one instance.
fn visited_splits(model: &Ensemble, dataset: &Dataset) -> u32 {
    let mut total = 0;
    for tree in model.trees() {
        let mut seen = vec![false; tree.n_nodes()];
        for i in 0..dataset.n_instances() {
            tree.traverse_with(&dataset.sample(i), |node, _| seen[node as usize] = true)
                .unwrap();
        }
        total += seen.iter().filter(|&&s| s).count() as u32;
    }
    total
}

#[test]
fn single_split_on_feature_seven() {
    let tree = rankeval::tree! {
        0 => split(7, 0.5) -> 1, 2,
        1 => leaf(0.0),
        2 => leaf(1.0),
    };
    let model = Ensemble::from_trees("m", vec![tree], vec![1.0]).unwrap();
    let mut features = Array2::<f32>::zeros((2, 8));
    features[[0, 7]] = 0.3;
    features[[1, 7]] = 0.6;
    let dataset = Dataset::new("d", features, array![0.0, 1.0], vec![0, 0]).unwrap();

    let fi = feature_importance(&model, &dataset).unwrap();

    assert_eq!(fi.n_features(), 8);
    assert_eq!(fi.y_pred, array![0.0, 1.0]);
    assert_eq!(fi.counts, array![0u32, 0, 0, 0, 0, 0, 0, 1]);
    assert_abs_diff_eq!(fi.importance[7], 0.5);
    assert_eq!(fi.top_k(1), vec![(7, 0.5)]);
}

#[test]
fn counts_match_visited_splits() {
    let dataset = random_dataset("d", 6, 7, 5, 40);
    let model = random_ensemble("m", 10, 4, 5, 41);

    let fi = feature_importance(&model, &dataset).unwrap();
    assert_eq!(fi.counts.sum(), visited_splits(&model, &dataset));
}

#[test]
fn empty_model_attributes_nothing() {
    let dataset = random_dataset("d", 2, 3, 4, 0);
    let fi = feature_importance(&Ensemble::new("empty"), &dataset).unwrap();

    assert_eq!(fi.importance, array![0.0, 0.0, 0.0, 0.0]);
    assert_eq!(fi.counts.sum(), 0);
    assert!(fi.y_pred.iter().all(|&v| v == 0.0));
}

#[test]
fn missing_feature_is_a_dimension_mismatch() {
    let dataset = random_dataset("d", 2, 3, 2, 0);
    let model = random_ensemble("m", 1, 0, 0, 0);
    assert!(feature_importance(&model, &dataset).is_ok());

    let tree = rankeval::tree! {
        0 => split(4, 0.5) -> 1, 2,
        1 => leaf(0.0),
        2 => leaf(1.0),
    };
    let model = Ensemble::from_trees("m", vec![tree], vec![1.0]).unwrap();
    assert_eq!(
        feature_importance(&model, &dataset).unwrap_err(),
        EvalError::DimensionMismatch {
            tree: 0,
            feature: 4,
            n_features: 2
        }
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn importance_is_non_negative_and_needs_a_visit(
        seed in any::<u64>(),
        n_trees in 1usize..12,
        depth in 1usize..5,
        n_features in 1usize..10,
    ) {
        let dataset = random_dataset("d", 3, 8, n_features, seed);
        let model = random_ensemble("m", n_trees, depth, n_features, seed.rotate_left(17));
        let fi = feature_importance(&model, &dataset).unwrap();

        for (f, (&imp, &count)) in fi.importance.iter().zip(fi.counts.iter()).enumerate() {
            prop_assert!(imp >= 0.0, "feature {f}: {imp}");
            if count == 0 {
                prop_assert_eq!(imp, 0.0);
            }
        }
        let normalized = fi.normalized();
        if fi.importance.sum() > 0.0 {
            prop_assert!((normalized.sum() - 1.0).abs() < 1e-9);
        }
    }
}
