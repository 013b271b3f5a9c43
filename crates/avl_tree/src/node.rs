/// Sentinel index for a missing parent or child.
pub(crate) const NIL: u32 = u32::MAX;

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) parent: u32, // NIL for root
    pub(crate) left: u32,
    pub(crate) right: u32,
    /// Subtree height. A leaf is 0 and a missing child counts as -1.
    pub(crate) height: i8,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(key: K, value: V, parent: u32) -> Self {
        Self {
            key,
            value,
            parent,
            left: NIL,
            right: NIL,
            height: 0,
        }
    }

    pub(crate) fn has_two_children(&self) -> bool {
        self.left != NIL && self.right != NIL
    }

    /// The only child of a node with at most one child, or `NIL`.
    pub(crate) fn sole_child(&self) -> u32 {
        debug_assert!(!self.has_two_children());
        if self.left != NIL {
            self.left
        } else {
            self.right
        }
    }
}
