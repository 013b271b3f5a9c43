pub mod avl;
pub mod bst;

pub use avl::AvlTreeMap;
pub use bst::{BinarySearchTree, Iter};
