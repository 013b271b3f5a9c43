//! AVL tree map over an arena-backed binary search tree.
//!
//! [`BinarySearchTree`] supplies the unbalanced primitives: descent, find,
//! predecessor/successor, a position-exchanging node swap and splicing.
//! [`AvlTreeMap`] keeps a height per node on top of it and rotates after
//! every insert and remove so that sibling subtrees never differ in height
//! by more than one.

mod error;
mod node;

pub mod impls;

use std::collections::BTreeMap;

/// Ordered map interface.
///
/// - Keys are unique.
/// - `insert` overwrites the existing value and returns the old one.
/// - `remove` of an absent key is a no-op returning `None`.
/// - `lower_bound` returns the smallest `(k, v)` with `k >= key`.
pub trait OrderedMap {
    type Key: Ord;
    type Value;

    fn new() -> Self;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&mut self, key: &Self::Key) -> Option<&Self::Value>;

    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value>;

    fn lower_bound(&mut self, key: &Self::Key) -> Option<(&Self::Key, &Self::Value)>;
}

/// Baseline for benches and the reference the tests compare against.
impl<K: Ord, V> OrderedMap for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn new() -> Self {
        BTreeMap::new()
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn get(&mut self, key: &Self::Key) -> Option<&Self::Value> {
        BTreeMap::get(self, key)
    }

    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value> {
        BTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value> {
        BTreeMap::remove(self, key)
    }

    fn lower_bound(&mut self, key: &Self::Key) -> Option<(&Self::Key, &Self::Value)> {
        self.range(key..).next()
    }
}

pub use error::InvariantError;
pub use impls::{AvlTreeMap, BinarySearchTree, Iter};
