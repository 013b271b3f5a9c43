use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::iter::FusedIterator;

use crate::OrderedMap;
use crate::error::InvariantError;
use crate::node::{NIL, Node};

/// Unbalanced binary search tree over a dense node arena.
///
/// Links are `u32` arena indices. Removing a node moves the last arena slot
/// into the hole, so `nodes.len()` is always the number of live entries.
/// [`AvlTreeMap`](crate::AvlTreeMap) is built on top of these primitives.
///
/// Holds at most `u32::MAX` entries; index `u32::MAX` is the `NIL` sentinel.
pub struct BinarySearchTree<K: Ord, V> {
    nodes: Vec<Node<K, V>>,
    root: u32,
}

pub(crate) enum Inserted<V> {
    /// Key was already present; holds the previous value.
    Replaced(V),
    /// Index of the freshly attached leaf.
    New(u32),
}

impl<K: Ord, V> BinarySearchTree<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NIL,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: NIL,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = NIL;
    }

    pub(crate) fn root(&self) -> u32 {
        self.root
    }

    pub(crate) fn node(&self, id: u32) -> &Node<K, V> {
        &self.nodes[id as usize]
    }

    pub(crate) fn node_mut(&mut self, id: u32) -> &mut Node<K, V> {
        &mut self.nodes[id as usize]
    }

    fn links(&self, id: u32) -> (u32, u32, u32) {
        let node = self.node(id);
        (node.parent, node.left, node.right)
    }

    /// Points the link that referenced `old` under `parent` at `new`.
    /// A `NIL` parent means `old` was the root.
    pub(crate) fn replace_child(&mut self, parent: u32, old: u32, new: u32) {
        if parent == NIL {
            self.root = new;
            return;
        }
        let node = self.node_mut(parent);
        if node.left == old {
            node.left = new;
        } else {
            debug_assert_eq!(node.right, old);
            node.right = new;
        }
    }

    pub(crate) fn internal_find(&self, key: &K) -> u32 {
        let mut cur = self.root;
        while cur != NIL {
            let node = self.node(cur);
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.left,
                Ordering::Greater => cur = node.right,
                Ordering::Equal => return cur,
            }
        }
        NIL
    }

    /// Overwrites the value of an existing key, or hangs a new leaf off the
    /// node where the descent fell off the tree.
    pub(crate) fn insert_leaf(&mut self, key: K, value: V) -> Inserted<V> {
        let mut parent = NIL;
        let mut go_left = false;
        let mut cur = self.root;
        while cur != NIL {
            parent = cur;
            let node = &mut self.nodes[cur as usize];
            match key.cmp(&node.key) {
                Ordering::Less => {
                    go_left = true;
                    cur = node.left;
                }
                Ordering::Greater => {
                    go_left = false;
                    cur = node.right;
                }
                Ordering::Equal => {
                    return Inserted::Replaced(std::mem::replace(&mut node.value, value));
                }
            }
        }

        assert!(
            self.nodes.len() < NIL as usize,
            "tree is full at {} entries",
            self.nodes.len()
        );
        let id = self.nodes.len() as u32;
        self.nodes.push(Node::new(key, value, parent));
        if parent == NIL {
            self.root = id;
        } else if go_left {
            self.node_mut(parent).left = id;
        } else {
            self.node_mut(parent).right = id;
        }
        Inserted::New(id)
    }

    fn min_from(&self, mut id: u32) -> u32 {
        while self.node(id).left != NIL {
            id = self.node(id).left;
        }
        id
    }

    fn max_from(&self, mut id: u32) -> u32 {
        while self.node(id).right != NIL {
            id = self.node(id).right;
        }
        id
    }

    pub(crate) fn predecessor(&self, id: u32) -> u32 {
        let left = self.node(id).left;
        if left != NIL {
            return self.max_from(left);
        }
        let mut child = id;
        let mut parent = self.node(id).parent;
        while parent != NIL && self.node(parent).left == child {
            child = parent;
            parent = self.node(parent).parent;
        }
        parent
    }

    pub(crate) fn successor(&self, id: u32) -> u32 {
        let right = self.node(id).right;
        if right != NIL {
            return self.min_from(right);
        }
        let mut child = id;
        let mut parent = self.node(id).parent;
        while parent != NIL && self.node(parent).right == child {
            child = parent;
            parent = self.node(parent).parent;
        }
        parent
    }

    /// Exchanges the tree positions of `a` and `b`. Each node keeps its key,
    /// value and height; only parent/child links and the root move.
    pub(crate) fn node_swap(&mut self, a: u32, b: u32) {
        if a == b {
            return;
        }
        let swap_id = |x: u32| {
            if x == a {
                b
            } else if x == b {
                a
            } else {
                x
            }
        };

        let (pa, la, ra) = self.links(a);
        let (pb, lb, rb) = self.links(b);

        // A shared neighbour (siblings' parent) must be rewritten only once.
        let mut neighbours = [pa, la, ra, pb, lb, rb];
        neighbours.sort_unstable();
        for (i, &n) in neighbours.iter().enumerate() {
            if n == NIL || n == a || n == b || (i > 0 && neighbours[i - 1] == n) {
                continue;
            }
            let node = self.node_mut(n);
            node.parent = swap_id(node.parent);
            node.left = swap_id(node.left);
            node.right = swap_id(node.right);
        }

        let node = self.node_mut(a);
        node.parent = swap_id(pb);
        node.left = swap_id(lb);
        node.right = swap_id(rb);

        let node = self.node_mut(b);
        node.parent = swap_id(pa);
        node.left = swap_id(la);
        node.right = swap_id(ra);

        self.root = swap_id(self.root);
    }

    /// Unlinks a node with at most one child and frees its arena slot.
    ///
    /// Returns the removed node and the index of its former parent, already
    /// adjusted for the slot compaction (`NIL` if it was the root).
    pub(crate) fn splice_out(&mut self, id: u32) -> (Node<K, V>, u32) {
        let (parent, _, _) = self.links(id);
        let child = self.node(id).sole_child();
        if child != NIL {
            self.node_mut(child).parent = parent;
        }
        self.replace_child(parent, id, child);

        let last = (self.nodes.len() - 1) as u32;
        if id != last {
            // `last` moves into slot `id`.
            let (lp, ll, lr) = self.links(last);
            self.replace_child(lp, last, id);
            if ll != NIL {
                self.node_mut(ll).parent = id;
            }
            if lr != NIL {
                self.node_mut(lr).parent = id;
            }
        }
        let removed = self.nodes.swap_remove(id as usize);
        let parent = if parent == last { id } else { parent };
        (removed, parent)
    }

    /// Node ids in pre-order: every parent precedes its children.
    pub(crate) fn preorder(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        if self.root != NIL {
            stack.push(self.root);
        }
        while let Some(id) = stack.pop() {
            out.push(id);
            let node = self.node(id);
            if node.right != NIL {
                stack.push(node.right);
            }
            if node.left != NIL {
                stack.push(node.left);
            }
        }
        out
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.insert_leaf(key, value) {
            Inserted::Replaced(old) => Some(old),
            Inserted::New(_) => None,
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.internal_find(key);
        if id == NIL {
            return None;
        }
        if self.node(id).has_two_children() {
            let pred = self.predecessor(id);
            self.node_swap(id, pred);
        }
        let (removed, _) = self.splice_out(id);
        Some(removed.value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match self.internal_find(key) {
            NIL => None,
            id => Some(&self.node(id).value),
        }
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.internal_find(key) {
            NIL => None,
            id => Some(&mut self.node_mut(id).value),
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.internal_find(key) != NIL
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        if self.root == NIL {
            return None;
        }
        let node = self.node(self.min_from(self.root));
        Some((&node.key, &node.value))
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        if self.root == NIL {
            return None;
        }
        let node = self.node(self.max_from(self.root));
        Some((&node.key, &node.value))
    }

    /// Smallest entry whose key is `>= key`.
    pub fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
        let mut cur = self.root;
        let mut candidate = NIL;
        while cur != NIL {
            let node = self.node(cur);
            match key.cmp(&node.key) {
                Ordering::Less | Ordering::Equal => {
                    candidate = cur;
                    cur = node.left;
                }
                Ordering::Greater => cur = node.right,
            }
        }
        match candidate {
            NIL => None,
            id => {
                let node = self.node(id);
                Some((&node.key, &node.value))
            }
        }
    }

    /// Number of edges on the longest root-to-leaf path; `-1` when empty.
    pub fn height(&self) -> i32 {
        let mut best = -1;
        let mut stack = Vec::new();
        if self.root != NIL {
            stack.push((self.root, 0));
        }
        while let Some((id, depth)) = stack.pop() {
            best = best.max(depth);
            let node = self.node(id);
            for child in [node.left, node.right] {
                if child != NIL {
                    stack.push((child, depth + 1));
                }
            }
        }
        best
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        let (front, back) = if self.root == NIL {
            (NIL, NIL)
        } else {
            (self.min_from(self.root), self.max_from(self.root))
        };
        Iter {
            tree: self,
            front,
            back,
            remaining: self.nodes.len(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.iter().map(|(_, v)| v)
    }

    /// Verifies parent back-links, the reachable node count and strict
    /// in-order key order.
    pub fn check_structure(&self) -> Result<(), InvariantError> {
        let len = self.nodes.len();
        if self.root != NIL && self.node(self.root).parent != NIL {
            return Err(InvariantError::BrokenLink {
                node: self.root,
                expected: NIL,
                found: self.node(self.root).parent,
            });
        }

        let mut reachable = 0;
        let mut stack = Vec::new();
        if self.root != NIL {
            stack.push(self.root);
        }
        while let Some(id) = stack.pop() {
            reachable += 1;
            if reachable > len {
                break;
            }
            let node = self.node(id);
            for child in [node.left, node.right] {
                if child == NIL {
                    continue;
                }
                let found = self.node(child).parent;
                if found != id {
                    return Err(InvariantError::BrokenLink {
                        node: child,
                        expected: id,
                        found,
                    });
                }
                stack.push(child);
            }
        }
        if reachable != len {
            return Err(InvariantError::CountMismatch { reachable, len });
        }

        let mut prev: Option<&K> = None;
        let mut cur = if self.root == NIL {
            NIL
        } else {
            self.min_from(self.root)
        };
        while cur != NIL {
            let key = &self.node(cur).key;
            if prev.is_some_and(|p| p >= key) {
                return Err(InvariantError::OutOfOrder { node: cur });
            }
            prev = Some(key);
            cur = self.successor(cur);
        }
        Ok(())
    }
}

impl<K: Ord, V> Default for BinarySearchTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Debug, V: Debug> Debug for BinarySearchTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a BinarySearchTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> OrderedMap for BinarySearchTree<K, V> {
    type Key = K;
    type Value = V;

    fn new() -> Self {
        BinarySearchTree::new()
    }

    fn len(&self) -> usize {
        BinarySearchTree::len(self)
    }

    fn get(&mut self, key: &Self::Key) -> Option<&Self::Value> {
        BinarySearchTree::get(self, key)
    }

    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value> {
        BinarySearchTree::insert(self, key, value)
    }

    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value> {
        BinarySearchTree::remove(self, key)
    }

    fn lower_bound(&mut self, key: &Self::Key) -> Option<(&Self::Key, &Self::Value)> {
        BinarySearchTree::lower_bound(self, key)
    }
}

/// In-order iterator following successor links.
pub struct Iter<'a, K: Ord, V> {
    tree: &'a BinarySearchTree<K, V>,
    front: u32,
    back: u32,
    remaining: usize,
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.tree.node(self.front);
        self.remaining -= 1;
        self.front = self.tree.successor(self.front);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Ord, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.tree.node(self.back);
        self.remaining -= 1;
        self.back = self.tree.predecessor(self.back);
        Some((&node.key, &node.value))
    }
}

impl<K: Ord, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K: Ord, V> FusedIterator for Iter<'_, K, V> {}
