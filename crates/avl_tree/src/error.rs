use thiserror::Error;

/// A structural defect found by [`BinarySearchTree::check_structure`] or
/// [`AvlTreeMap::check_invariants`].
///
/// Node positions are reported as arena indices.
///
/// [`BinarySearchTree::check_structure`]: crate::BinarySearchTree::check_structure
/// [`AvlTreeMap::check_invariants`]: crate::AvlTreeMap::check_invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("node {node}: parent link is {found}, expected {expected}")]
    BrokenLink {
        node: u32,
        expected: u32,
        found: u32,
    },
    #[error("node {node}: key is not greater than its in-order predecessor")]
    OutOfOrder { node: u32 },
    #[error("reached {reachable} nodes from the root but len is {len}")]
    CountMismatch { reachable: usize, len: usize },
    #[error("node {node}: stored height {stored}, recomputed {expected}")]
    HeightMismatch { node: u32, stored: i8, expected: i8 },
    #[error("node {node}: balance factor {balance} is outside [-1, 1]")]
    Unbalanced { node: u32, balance: i32 },
}
