//! Canonical tree representation (SoA) and read-only tree interface.
//!
//! This module provides:
//! - [`Tree`]: Immutable SoA tree storage for efficient traversal
//! - [`TreeView`]: Read-only trait for unified tree access
//! - [`TreeValidationError`]: Structural validation errors
//!
//! For tree construction, see [`super::TreeBuilder`].

use crate::data::SampleAccessor;
use crate::error::TraversalError;

use super::NodeId;

// ============================================================================
// TreeView Trait
// ============================================================================

/// Read-only view of a regression tree.
///
/// Split rule: a sample goes left when `value <= threshold`, right otherwise.
///
/// Accessors take node ids that the caller has already bounds-checked; the
/// traversal methods do that checking themselves and never panic on a
/// malformed tree.
pub trait TreeView {
    /// Number of nodes in the tree.
    fn n_nodes(&self) -> usize;

    /// Check if a node is a leaf.
    fn is_leaf(&self, node: NodeId) -> bool;

    /// Feature tested by a split node.
    fn split_index(&self, node: NodeId) -> u32;

    /// Threshold of a split node.
    fn split_threshold(&self, node: NodeId) -> f32;

    fn left_child(&self, node: NodeId) -> NodeId;

    fn right_child(&self, node: NodeId) -> NodeId;

    /// Output of a leaf node.
    fn leaf_value(&self, node: NodeId) -> f64;

    /// Child taken by a feature value at a split node.
    #[inline]
    fn next_node(&self, node: NodeId, fvalue: f32) -> NodeId {
        if fvalue <= self.split_threshold(node) {
            self.left_child(node)
        } else {
            self.right_child(node)
        }
    }

    /// Traverse from the root to the leaf reached by `sample`.
    #[inline]
    fn traverse_to_leaf<S: SampleAccessor + ?Sized>(&self, sample: &S) -> Result<NodeId, TraversalError> {
        self.traverse_with(sample, |_, _| {})
    }

    /// Traverse from the root, calling `visit(node, child)` for every split
    /// node on the path together with the child that was taken.
    ///
    /// A well-formed path visits at most `n_nodes - 1` split nodes; anything
    /// longer is reported as [`TraversalError::NoLeafReached`].
    fn traverse_with<S, F>(&self, sample: &S, mut visit: F) -> Result<NodeId, TraversalError>
    where
        S: SampleAccessor + ?Sized,
        F: FnMut(NodeId, NodeId),
    {
        let n_nodes = self.n_nodes();
        let n_features = sample.n_features();
        let mut node: NodeId = 0;

        for _ in 0..n_nodes {
            if node as usize >= n_nodes {
                return Err(TraversalError::NodeOutOfBounds { node, n_nodes });
            }
            if self.is_leaf(node) {
                return Ok(node);
            }

            let feature = self.split_index(node);
            if feature as usize >= n_features {
                return Err(TraversalError::FeatureOutOfBounds {
                    node,
                    feature,
                    n_features,
                });
            }

            let child = self.next_node(node, sample.feature(feature as usize));
            visit(node, child);
            node = child;
        }

        if n_nodes == 0 {
            return Err(TraversalError::NodeOutOfBounds { node, n_nodes });
        }
        Err(TraversalError::NoLeafReached { steps: n_nodes })
    }
}

// ============================================================================
// TreeValidationError
// ============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    #[error("tree has no nodes")]
    EmptyTree,

    #[error("node {node}: {side} child {child} out of bounds ({n_nodes} nodes)")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },

    #[error("node {node} references itself as a child")]
    SelfLoop { node: NodeId },

    #[error("node {node} reached by more than one path")]
    DuplicateVisit { node: NodeId },

    #[error("cycle detected at node {node}")]
    CycleDetected { node: NodeId },

    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },
}

// ============================================================================
// Tree
// ============================================================================

/// Structure-of-Arrays tree storage.
///
/// Nodes live in flat arrays indexed by [`NodeId`]; node 0 is the root.
/// `covers` optionally records how many training samples reached each node.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    split_indices: Box<[u32]>,
    split_thresholds: Box<[f32]>,
    left_children: Box<[NodeId]>,
    right_children: Box<[NodeId]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f64]>,
    covers: Option<Box<[f64]>>,
}

impl Tree {
    /// Create a tree from parallel arrays, one entry per node.
    ///
    /// No structural check is made here; call [`validate`](Self::validate)
    /// (or build the tree through [`Ensemble::from_trees`](super::Ensemble::from_trees)).
    pub fn new(
        split_indices: Vec<u32>,
        split_thresholds: Vec<f32>,
        left_children: Vec<NodeId>,
        right_children: Vec<NodeId>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<f64>,
    ) -> Self {
        let n_nodes = is_leaf.len();
        debug_assert_eq!(n_nodes, split_indices.len());
        debug_assert_eq!(n_nodes, split_thresholds.len());
        debug_assert_eq!(n_nodes, left_children.len());
        debug_assert_eq!(n_nodes, right_children.len());
        debug_assert_eq!(n_nodes, leaf_values.len());

        Self {
            split_indices: split_indices.into_boxed_slice(),
            split_thresholds: split_thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
            covers: None,
        }
    }

    /// Attach per-node covers (builder pattern).
    pub fn with_covers(mut self, covers: Vec<f64>) -> Self {
        debug_assert_eq!(covers.len(), self.n_nodes());
        self.covers = Some(covers.into_boxed_slice());
        self
    }

    pub fn covers(&self) -> Option<&[f64]> {
        self.covers.as_deref()
    }

    /// Number of split (internal) nodes.
    pub fn n_splits(&self) -> usize {
        self.is_leaf.iter().filter(|&&leaf| !leaf).count()
    }

    /// Largest feature index tested by any split, or `None` for a single leaf.
    pub fn max_feature_index(&self) -> Option<u32> {
        self.split_indices
            .iter()
            .zip(self.is_leaf.iter())
            .filter(|&(_, &leaf)| !leaf)
            .map(|(&f, _)| f)
            .max()
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate that the nodes form a tree rooted at 0.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        self.preorder().map(|_| ())
    }

    /// Node ids in pre-order (parents before children), validating the
    /// structure along the way.
    fn preorder(&self) -> Result<Vec<NodeId>, TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut order = Vec::with_capacity(n_nodes);
        let mut stack: Vec<(NodeId, bool)> = vec![(0, false)];

        while let Some((node, done)) = stack.pop() {
            let idx = node as usize;
            if done {
                color[idx] = 2;
                continue;
            }

            match color[idx] {
                0 => {}
                1 => return Err(TreeValidationError::CycleDetected { node }),
                _ => return Err(TreeValidationError::DuplicateVisit { node }),
            }
            color[idx] = 1;
            order.push(node);
            stack.push((node, true));

            if self.is_leaf(node) {
                continue;
            }

            for (side, child) in [("right", self.right_child(node)), ("left", self.left_child(node))] {
                if child == node {
                    return Err(TreeValidationError::SelfLoop { node });
                }
                if child as usize >= n_nodes {
                    return Err(TreeValidationError::ChildOutOfBounds {
                        node,
                        side,
                        child,
                        n_nodes,
                    });
                }
                stack.push((child, false));
            }
        }

        if let Some(node) = color.iter().position(|&c| c == 0) {
            return Err(TreeValidationError::UnreachableNode { node: node as NodeId });
        }

        Ok(order)
    }

    // =========================================================================
    // Node expectations
    // =========================================================================

    /// Expected output of every node.
    ///
    /// A leaf's expectation is its value; a split node's is the mean of its
    /// children's expectations, weighted by their covers when the tree has
    /// covers with a positive sum, uniformly otherwise. Following a path from
    /// the root, the expectation moves from `E(root)` to the reached leaf
    /// value, one split at a time.
    pub fn expected_values(&self) -> Result<Vec<f64>, TreeValidationError> {
        let order = self.preorder()?;
        let mut expected = vec![0.0; self.n_nodes()];

        for &node in order.iter().rev() {
            let idx = node as usize;
            if self.is_leaf(node) {
                expected[idx] = self.leaf_value(node);
                continue;
            }

            let left = self.left_child(node) as usize;
            let right = self.right_child(node) as usize;
            let (wl, wr) = match self.covers.as_deref() {
                Some(c) if c[left] + c[right] > 0.0 => (c[left], c[right]),
                _ => (1.0, 1.0),
            };
            expected[idx] = (wl * expected[left] + wr * expected[right]) / (wl + wr);
        }

        Ok(expected)
    }
}

// =============================================================================
// TreeView for Tree
// =============================================================================

impl TreeView for Tree {
    #[inline]
    fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    #[inline]
    fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    #[inline]
    fn split_threshold(&self, node: NodeId) -> f32 {
        self.split_thresholds[node as usize]
    }

    #[inline]
    fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    #[inline]
    fn leaf_value(&self, node: NodeId) -> f64 {
        self.leaf_values[node as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cyclic_tree() -> Tree {
        // 0 -> (1, 2), 1 -> (0, 2): node 1 points back at the root.
        Tree::new(
            vec![0, 0, 0],
            vec![0.5, 0.5, 0.0],
            vec![1, 0, 0],
            vec![2, 2, 0],
            vec![false, false, true],
            vec![0.0, 0.0, 1.0],
        )
    }

    #[test]
    fn traverse_uses_less_or_equal() {
        let tree = crate::tree! {
            0 => split(0, 0.5) -> 1, 2,
            1 => leaf(1.0),
            2 => leaf(2.0),
        };

        assert_eq!(tree.traverse_to_leaf(&[0.3f32][..]), Ok(1));
        assert_eq!(tree.traverse_to_leaf(&[0.5f32][..]), Ok(1));
        assert_eq!(tree.traverse_to_leaf(&[0.7f32][..]), Ok(2));
    }

    #[test]
    fn traverse_with_reports_path() {
        let tree = crate::tree! {
            0 => split(0, 0.5) -> 1, 2,
            1 => leaf(1.0),
            2 => split(1, 0.3) -> 3, 4,
            3 => leaf(2.0),
            4 => leaf(3.0),
        };

        let mut path = Vec::new();
        let leaf = tree
            .traverse_with(&[0.9f32, 0.1][..], |node, child| path.push((node, child)))
            .unwrap();
        assert_eq!(leaf, 3);
        assert_eq!(path, vec![(0, 2), (2, 3)]);
    }

    #[test]
    fn traverse_detects_cycle() {
        let tree = cyclic_tree();
        // 0.1 <= 0.5 -> left to 1, then left back to 0, forever.
        assert_eq!(
            tree.traverse_to_leaf(&[0.1f32][..]),
            Err(TraversalError::NoLeafReached { steps: 3 })
        );
        assert_eq!(tree.validate(), Err(TreeValidationError::CycleDetected { node: 0 }));
    }

    #[test]
    fn traverse_detects_dangling_child() {
        let tree = Tree::new(
            vec![0, 0, 0],
            vec![0.5, 0.0, 0.0],
            vec![1, 0, 0],
            vec![7, 0, 0],
            vec![false, true, true],
            vec![0.0, 1.0, 2.0],
        );
        assert_eq!(
            tree.traverse_to_leaf(&[0.9f32][..]),
            Err(TraversalError::NodeOutOfBounds { node: 7, n_nodes: 3 })
        );
        assert!(matches!(
            tree.validate(),
            Err(TreeValidationError::ChildOutOfBounds { side: "right", child: 7, .. })
        ));
    }

    #[test]
    fn traverse_detects_missing_feature() {
        let tree = crate::tree! {
            0 => split(4, 0.5) -> 1, 2,
            1 => leaf(1.0),
            2 => leaf(2.0),
        };
        assert_eq!(
            tree.traverse_to_leaf(&[0.1f32, 0.2][..]),
            Err(TraversalError::FeatureOutOfBounds {
                node: 0,
                feature: 4,
                n_features: 2
            })
        );
    }

    #[test]
    fn validate_rejects_unreachable_and_empty() {
        let tree = Tree::new(
            vec![0, 0],
            vec![0.0, 0.0],
            vec![0, 0],
            vec![0, 0],
            vec![true, true],
            vec![1.0, 2.0],
        );
        assert_eq!(tree.validate(), Err(TreeValidationError::UnreachableNode { node: 1 }));

        let empty = Tree::new(vec![], vec![], vec![], vec![], vec![], vec![]);
        assert_eq!(empty.validate(), Err(TreeValidationError::EmptyTree));
        assert!(matches!(
            empty.traverse_to_leaf(&[0.0f32][..]),
            Err(TraversalError::NodeOutOfBounds { n_nodes: 0, .. })
        ));
    }

    #[test]
    fn expected_values_uniform_and_cover_weighted() {
        let tree = crate::tree! {
            0 => split(0, 0.5) -> 1, 2,
            1 => leaf(1.0),
            2 => split(1, 0.3) -> 3, 4,
            3 => leaf(2.0),
            4 => leaf(4.0),
        };
        let e = tree.expected_values().unwrap();
        assert_abs_diff_eq!(e[2], 3.0);
        assert_abs_diff_eq!(e[0], 2.0);

        let tree = tree.with_covers(vec![100.0, 40.0, 60.0, 45.0, 15.0]);
        let e = tree.expected_values().unwrap();
        assert_abs_diff_eq!(e[2], 2.5);
        assert_abs_diff_eq!(e[0], 0.4 * 1.0 + 0.6 * 2.5);
    }

    #[test]
    fn split_statistics() {
        let tree = crate::tree! {
            0 => split(3, 0.5) -> 1, 2,
            1 => split(9, 0.1) -> 3, 4,
            2 => leaf(0.0),
            3 => leaf(1.0),
            4 => leaf(2.0),
        };
        assert_eq!(tree.n_splits(), 2);
        assert_eq!(tree.max_feature_index(), Some(9));

        let stump = crate::tree! { 0 => leaf(3.0) };
        assert_eq!(stump.n_splits(), 0);
        assert_eq!(stump.max_feature_index(), None);
    }
}
