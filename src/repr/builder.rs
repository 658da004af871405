//! Incremental tree construction.

use super::{NodeId, Tree};

/// Builder for [`Tree`].
///
/// Nodes can be grown from the root with [`apply_split`](Self::apply_split),
/// or laid out with explicit ids via [`set_split`](Self::set_split) and
/// [`set_leaf`](Self::set_leaf), as model loaders do. Unset node slots are
/// leaves with value `0.0`.
///
/// # Example
///
/// ```
/// use rankeval::repr::{TreeBuilder, TreeView};
///
/// let mut builder = TreeBuilder::new();
/// let root = builder.init_root();
/// let (left, right) = builder.apply_split(root, 7, 0.5);
/// builder.set_leaf(left, 0.0);
/// builder.set_leaf(right, 1.0);
/// let tree = builder.build();
///
/// assert_eq!(tree.n_nodes(), 3);
/// assert_eq!(tree.split_index(root), 7);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    split_indices: Vec<u32>,
    split_thresholds: Vec<f32>,
    left_children: Vec<NodeId>,
    right_children: Vec<NodeId>,
    is_leaf: Vec<bool>,
    leaf_values: Vec<f64>,
    covers: Vec<f64>,
    has_covers: bool,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n_nodes: usize) -> Self {
        Self {
            split_indices: Vec::with_capacity(n_nodes),
            split_thresholds: Vec::with_capacity(n_nodes),
            left_children: Vec::with_capacity(n_nodes),
            right_children: Vec::with_capacity(n_nodes),
            is_leaf: Vec::with_capacity(n_nodes),
            leaf_values: Vec::with_capacity(n_nodes),
            covers: Vec::with_capacity(n_nodes),
            has_covers: false,
        }
    }

    /// Number of node slots allocated so far.
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    /// Allocate the root (if needed) and return its id.
    pub fn init_root(&mut self) -> NodeId {
        self.ensure_node(0);
        0
    }

    /// Turn `node` into a split and allocate two fresh leaf children.
    ///
    /// Returns `(left, right)`.
    pub fn apply_split(&mut self, node: NodeId, feature: u32, threshold: f32) -> (NodeId, NodeId) {
        self.ensure_node(node);
        let left = self.n_nodes() as NodeId;
        let right = left + 1;
        self.set_split(node, feature, threshold, left, right);
        (left, right)
    }

    /// Make `node` a split on `feature` with explicit child ids.
    pub fn set_split(
        &mut self,
        node: NodeId,
        feature: u32,
        threshold: f32,
        left: NodeId,
        right: NodeId,
    ) {
        self.ensure_node(node.max(left).max(right));
        let idx = node as usize;
        self.split_indices[idx] = feature;
        self.split_thresholds[idx] = threshold;
        self.left_children[idx] = left;
        self.right_children[idx] = right;
        self.is_leaf[idx] = false;
        self.leaf_values[idx] = 0.0;
    }

    /// Make `node` a leaf with the given output.
    pub fn set_leaf(&mut self, node: NodeId, value: f64) {
        self.ensure_node(node);
        let idx = node as usize;
        self.is_leaf[idx] = true;
        self.leaf_values[idx] = value;
        self.left_children[idx] = 0;
        self.right_children[idx] = 0;
    }

    /// Record how many samples reached `node` during training.
    pub fn set_cover(&mut self, node: NodeId, cover: f64) {
        self.ensure_node(node);
        self.covers[node as usize] = cover;
        self.has_covers = true;
    }

    fn ensure_node(&mut self, node: NodeId) {
        let len = node as usize + 1;
        if len <= self.n_nodes() {
            return;
        }
        self.split_indices.resize(len, 0);
        self.split_thresholds.resize(len, 0.0);
        self.left_children.resize(len, 0);
        self.right_children.resize(len, 0);
        self.is_leaf.resize(len, true);
        self.leaf_values.resize(len, 0.0);
        self.covers.resize(len, 0.0);
    }

    /// Freeze into an immutable [`Tree`].
    pub fn build(self) -> Tree {
        let tree = Tree::new(
            self.split_indices,
            self.split_thresholds,
            self.left_children,
            self.right_children,
            self.is_leaf,
            self.leaf_values,
        );
        if self.has_covers {
            tree.with_covers(self.covers)
        } else {
            tree
        }
    }
}

/// Build a [`Tree`] from a node listing.
///
/// ```
/// use rankeval::repr::TreeView;
///
/// let tree = rankeval::tree! {
///     0 => split(7, 0.5) -> 1, 2,
///     1 => leaf(0.0),
///     2 => leaf(1.0),
/// };
/// assert_eq!(tree.n_nodes(), 3);
/// ```
#[macro_export]
macro_rules! tree {
    (@node $builder:ident, $id:literal, split ( $feature:expr, $threshold:expr ) -> $left:literal, $right:literal) => {
        $builder.set_split($id, $feature, $threshold, $left, $right);
    };
    (@node $builder:ident, $id:literal, leaf ( $value:expr )) => {
        $builder.set_leaf($id, $value);
    };
    ($($id:literal => $kind:ident ( $($arg:expr),* ) $(-> $left:literal, $right:literal)?),+ $(,)?) => {{
        let mut builder = $crate::repr::TreeBuilder::new();
        $( $crate::tree!(@node builder, $id, $kind ( $($arg),* ) $(-> $left, $right)?); )+
        builder.build()
    }};
}
