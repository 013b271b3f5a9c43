use std::fmt::{self, Debug};

use log::{error, trace};

use super::bst::{BinarySearchTree, Inserted, Iter};
use crate::OrderedMap;
use crate::error::InvariantError;
use crate::node::NIL;

/// Height-balanced ordered map.
///
/// Every node stores its subtree height; the balance factor is recomputed
/// from the children when needed. After each insert or remove the heights on
/// the path to the root are refreshed and rotations restore
/// `|height(left) - height(right)| <= 1` everywhere.
pub struct AvlTreeMap<K: Ord, V> {
    tree: BinarySearchTree<K, V>,
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    pub fn new() -> Self {
        Self {
            tree: BinarySearchTree::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: BinarySearchTree::with_capacity(capacity),
        }
    }

    fn height_of(&self, id: u32) -> i8 {
        if id == NIL {
            -1
        } else {
            self.tree.node(id).height
        }
    }

    fn balance_factor(&self, id: u32) -> i32 {
        if id == NIL {
            return 0;
        }
        let node = self.tree.node(id);
        i32::from(self.height_of(node.left)) - i32::from(self.height_of(node.right))
    }

    /// Stores the height implied by the children and returns the balance factor.
    fn recalc(&mut self, id: u32) -> i32 {
        let node = self.tree.node(id);
        let hl = self.height_of(node.left);
        let hr = self.height_of(node.right);
        self.tree.node_mut(id).height = 1 + hl.max(hr);
        i32::from(hl) - i32::from(hr)
    }

    /// Refreshes `id` and rotates if it is out of balance. Returns whether a
    /// rotation happened.
    fn rebalance(&mut self, id: u32) -> bool {
        let bf = self.recalc(id);
        if bf > 1 {
            let left = self.tree.node(id).left;
            if self.balance_factor(left) < 0 {
                self.rotate_left(left);
            }
            self.rotate_right(id);
            return true;
        }
        if bf < -1 {
            let right = self.tree.node(id).right;
            if self.balance_factor(right) > 0 {
                self.rotate_right(right);
            }
            self.rotate_left(id);
            return true;
        }
        false
    }

    fn rotate_left(&mut self, id: u32) {
        let pivot = self.tree.node(id).right;
        if pivot == NIL {
            error!("left rotation at node {id} without a right child");
            debug_assert!(pivot != NIL, "rotate_left needs right");
            return;
        }

        let parent = self.tree.node(id).parent;
        let inner = self.tree.node(pivot).left;
        self.tree.node_mut(id).right = inner;
        if inner != NIL {
            self.tree.node_mut(inner).parent = id;
        }
        self.tree.node_mut(pivot).parent = parent;
        self.tree.replace_child(parent, id, pivot);
        self.tree.node_mut(pivot).left = id;
        self.tree.node_mut(id).parent = pivot;

        // `id` is now below `pivot`, so it goes first.
        self.recalc(id);
        self.recalc(pivot);
        trace!("rotated left at node {id}, new subtree root {pivot}");
    }

    fn rotate_right(&mut self, id: u32) {
        let pivot = self.tree.node(id).left;
        if pivot == NIL {
            error!("right rotation at node {id} without a left child");
            debug_assert!(pivot != NIL, "rotate_right needs left");
            return;
        }

        let parent = self.tree.node(id).parent;
        let inner = self.tree.node(pivot).right;
        self.tree.node_mut(id).left = inner;
        if inner != NIL {
            self.tree.node_mut(inner).parent = id;
        }
        self.tree.node_mut(pivot).parent = parent;
        self.tree.replace_child(parent, id, pivot);
        self.tree.node_mut(pivot).right = id;
        self.tree.node_mut(id).parent = pivot;

        self.recalc(id);
        self.recalc(pivot);
        trace!("rotated right at node {id}, new subtree root {pivot}");
    }

    /// Swaps tree positions, then the heights, which belong to the position.
    fn node_swap(&mut self, a: u32, b: u32) {
        self.tree.node_swap(a, b);
        let ha = self.tree.node(a).height;
        let hb = self.tree.node(b).height;
        self.tree.node_mut(a).height = hb;
        self.tree.node_mut(b).height = ha;
    }

    /// Inserts `key`, or overwrites its value and returns the old one.
    ///
    /// A new leaf can unbalance at most one ancestor, and one single or
    /// double rotation there restores the previous subtree height, so the
    /// upward walk stops after the first rotation.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut cur = match self.tree.insert_leaf(key, value) {
            Inserted::Replaced(old) => return Some(old),
            Inserted::New(id) => id,
        };
        while cur != NIL {
            if self.rebalance(cur) {
                trace!("insert rebalanced at node {cur}");
                break;
            }
            cur = self.tree.node(cur).parent;
        }
        None
    }

    /// Removes `key` and returns its value. Absent keys are a no-op.
    ///
    /// A node with two children first trades places with its in-order
    /// predecessor. Removal can shorten a subtree past a rotation point, so
    /// the walk always continues to the root.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.tree.internal_find(key);
        if id == NIL {
            return None;
        }
        if self.tree.node(id).has_two_children() {
            let pred = self.tree.predecessor(id);
            self.node_swap(id, pred);
        }

        let (removed, mut cur) = self.tree.splice_out(id);
        while cur != NIL {
            if self.rebalance(cur) {
                trace!("remove rebalanced at node {cur}");
            }
            cur = self.tree.node(cur).parent;
        }
        Some(removed.value)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.tree.get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.contains_key(key)
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first_key_value()
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last_key_value()
    }

    pub fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
        self.tree.lower_bound(key)
    }

    /// Height of the root, read from its stored field; `-1` when empty.
    pub fn height(&self) -> i32 {
        i32::from(self.height_of(self.tree.root()))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.tree.keys()
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.tree.values()
    }

    /// Checks the search-tree structure, then recomputes every height from
    /// the leaves up and compares it with the stored one.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.tree.check_structure()?;

        let mut heights = vec![-1_i8; self.tree.len()];
        for &id in self.tree.preorder().iter().rev() {
            let node = self.tree.node(id);
            let child = |c: u32| if c == NIL { -1 } else { heights[c as usize] };
            let hl = child(node.left);
            let hr = child(node.right);
            let expected = hl.max(hr).saturating_add(1);
            if node.height != expected {
                return Err(InvariantError::HeightMismatch {
                    node: id,
                    stored: node.height,
                    expected,
                });
            }
            let balance = i32::from(hl) - i32::from(hr);
            if balance.abs() > 1 {
                return Err(InvariantError::Unbalanced { node: id, balance });
            }
            heights[id as usize] = expected;
        }
        Ok(())
    }
}

impl<K: Ord, V> Default for AvlTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Debug, V: Debug> Debug for AvlTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a AvlTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> OrderedMap for AvlTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn new() -> Self {
        AvlTreeMap::new()
    }

    fn len(&self) -> usize {
        AvlTreeMap::len(self)
    }

    fn get(&mut self, key: &Self::Key) -> Option<&Self::Value> {
        AvlTreeMap::get(self, key)
    }

    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value> {
        AvlTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value> {
        AvlTreeMap::remove(self, key)
    }

    fn lower_bound(&mut self, key: &Self::Key) -> Option<(&Self::Key, &Self::Value)> {
        AvlTreeMap::lower_bound(self, key)
    }
}
