//! Tree-ensemble representation.
//!
//! An [`Ensemble`] is an ordered list of regression [`Tree`]s, each with a
//! scalar weight. Trees are arenas of nodes indexed by [`NodeId`], so
//! traversal is a loop over flat arrays and malformed structures (cycles,
//! dangling children) are cheap to detect.

/// Node identifier: an index into a tree's node arrays. The root is 0.
pub type NodeId = u32;

mod builder;
mod ensemble;
mod tree;

pub use builder::TreeBuilder;
pub use ensemble::Ensemble;
pub use tree::{Tree, TreeValidationError, TreeView};
