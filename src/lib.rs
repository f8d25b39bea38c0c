//! A generic AVL tree: a Binary Search Tree that keeps itself balanced.
//!
//! ## Binary Search Tree
//!
//! A Binary Search Tree is a data structure supporting operations to insert, find, and delete
//! stored values. Every node stores a value and up to two child nodes. Values that compare less
//! than or equal to a node's value are inserted into its left subtree and larger values into its
//! right subtree, so visiting the left subtree, then the node, then the right subtree yields the
//! values in order. Searching takes `O(height)` where `height` is the longest path from the root
//! to a leaf.
//!
//! ## AVL trees
//!
//! An AVL tree additionally keeps, for every node, the heights of its two subtrees within one of
//! each other. Each node stores a balance factor, `height(right) - height(left)`, which must stay
//! in `-1..=1`. Inserts and deletes adjust the factors of the ancestors of the changed position
//! and rotate nodes where a factor reaches `-2` or `2`. This bounds the height to `O(lg N)` where
//! `N` is the number of values in the tree.
//!
//! # Examples
//!
//! ```
//! use avl::AvlTree;
//!
//! let mut tree: AvlTree<i32> = AvlTree::new();
//! for x in 1..=7 {
//!     tree.insert(x)?;
//! }
//!
//! // Inserting in ascending order still gives a perfectly balanced tree.
//! assert_eq!(tree.height(), 3);
//! assert_eq!(tree.in_order(), vec![&1, &2, &3, &4, &5, &6, &7]);
//! # Ok::<(), avl::AvlError>(())
//! ```

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

mod dump;
mod error;
mod node;
mod tree;

pub use error::AvlError;
pub use tree::AvlTree;
