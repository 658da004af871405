use ndarray::{Array1, Array2};
use rand::prelude::*;

use crate::data::Dataset;
use crate::repr::{Ensemble, NodeId, Tree, TreeBuilder};

/// Generate random dense features in row-major order.
///
/// Values are uniform in `[min, max]`.
pub fn random_dense_f32(rows: usize, cols: usize, seed: u64, min: f32, max: f32) -> Vec<f32> {
    assert!(max >= min);
    let mut rng = StdRng::seed_from_u64(seed);
    let width = max - min;
    (0..rows * cols)
        .map(|_| min + rng.r#gen::<f32>() * width)
        .collect()
}

/// A ranking dataset of `n_queries` groups with `docs_per_query` documents
/// each.
///
/// Features are uniform in `[0, 1]`, labels are integer grades in `0..=4`.
pub fn random_dataset(
    name: &str,
    n_queries: usize,
    docs_per_query: usize,
    n_features: usize,
    seed: u64,
) -> Dataset {
    let rows = n_queries * docs_per_query;
    let data = random_dense_f32(rows, n_features, seed, 0.0, 1.0);
    let features = Array2::from_shape_fn((rows, n_features), |(r, c)| data[r * n_features + c]);

    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let labels: Array1<f32> = (0..rows).map(|_| rng.gen_range(0..=4u8) as f32).collect();
    let query_ids: Vec<u64> = (0..rows).map(|r| (r / docs_per_query.max(1)) as u64).collect();

    Dataset::new(name, features, labels, query_ids).expect("generated query ids are contiguous")
}

/// A complete binary tree of the given depth.
///
/// Splits test features in `0..n_features` at thresholds in `[0, 1]`;
/// leaf values are uniform in `[-1, 1]`. With `with_covers`, leaves get
/// random covers and every split the sum of its children's.
pub fn random_tree<R: Rng>(rng: &mut R, depth: usize, n_features: usize, with_covers: bool) -> Tree {
    assert!(depth == 0 || n_features > 0, "splits need at least one feature");

    let n_nodes = (1usize << (depth + 1)) - 1;
    let mut builder = TreeBuilder::with_capacity(n_nodes);
    let mut splits: Vec<(NodeId, NodeId, NodeId)> = Vec::new();
    let mut frontier = vec![builder.init_root()];

    for _ in 0..depth {
        let mut next = Vec::with_capacity(frontier.len() * 2);
        for node in frontier {
            let feature = rng.gen_range(0..n_features as u32);
            let threshold = rng.r#gen::<f32>();
            let (left, right) = builder.apply_split(node, feature, threshold);
            splits.push((node, left, right));
            next.push(left);
            next.push(right);
        }
        frontier = next;
    }

    let mut covers = vec![0.0; n_nodes];
    for &leaf in &frontier {
        builder.set_leaf(leaf, rng.r#gen::<f64>() * 2.0 - 1.0);
        covers[leaf as usize] = rng.gen_range(1..100u32) as f64;
    }

    if with_covers {
        // Children always have larger ids than their parent.
        for &(node, left, right) in splits.iter().rev() {
            covers[node as usize] = covers[left as usize] + covers[right as usize];
        }
        for (node, &cover) in covers.iter().enumerate() {
            builder.set_cover(node as NodeId, cover);
        }
    }

    builder.build()
}

/// An ensemble of `n_trees` random trees of the given depth with weights in
/// `[0.1, 1]`. Every other tree carries covers.
pub fn random_ensemble(name: &str, n_trees: usize, depth: usize, n_features: usize, seed: u64) -> Ensemble {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ensemble = Ensemble::new(name);
    for t in 0..n_trees {
        let tree = random_tree(&mut rng, depth, n_features, t % 2 == 1);
        let weight = 0.1 + 0.9 * rng.r#gen::<f64>();
        ensemble.push_tree(tree, weight);
    }
    ensemble
}
