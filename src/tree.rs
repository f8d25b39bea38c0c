//! A mutable AVL tree whose nodes keep pointers to their parents. After an insert or delete the
//! tree walks from the changed position back towards the root, updating balance factors and
//! rotating where a subtree became too tall on one side.
//!
//! # Examples
//!
//! ```
//! use avl::AvlTree;
//!
//! let mut tree: AvlTree<i32> = AvlTree::new();
//!
//! // Nothing in here yet.
//! assert_eq!(tree.contains(&1), Ok(false));
//!
//! tree.insert(1)?;
//! assert_eq!(tree.contains(&1), Ok(true));
//!
//! // Duplicates are kept.
//! tree.insert(1)?;
//! assert_eq!(tree.len(), 2);
//!
//! // Deleting returns the removed value.
//! assert_eq!(tree.delete(&1), Ok(Some(1)));
//! assert_eq!(tree.delete(&1), Ok(Some(1)));
//! assert_eq!(tree.delete(&1), Ok(None));
//! assert!(tree.is_empty());
//! # Ok::<(), avl::AvlError>(())
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use tracing::trace;

use crate::dump::LevelOrder;
use crate::error::AvlError;
use crate::node::{Link, Node, Side};

/// A self-balancing Binary Search Tree (specifically, an AVL tree) of values. Equal values may be
/// inserted more than once; each copy is its own node.
pub struct AvlTree<T> {
    pub(crate) root: Link<T>,
    len: usize,
    _owns: PhantomData<Box<Node<T>>>,
}

impl<T> Default for AvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for AvlTree<T> {
    fn drop(&mut self) {
        let mut stack: Vec<NonNull<Node<T>>> = self.root.take().into_iter().collect();
        while let Some(node) = stack.pop() {
            // SAFETY: Every node was allocated by `Node::new_leaked` and is reachable from the
            // root exactly once, so it's freed exactly once.
            let node = unsafe { Box::from_raw(node.as_ptr()) };
            stack.extend(node.left());
            stack.extend(node.right());
        }
    }
}

impl<T> Clone for AvlTree<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        // SAFETY: `self.root` is either empty or a live node that we only read from.
        let root = self.root.map(|root| unsafe { clone_subtree(root, None) });
        Self {
            root,
            len: self.len,
            _owns: PhantomData,
        }
    }
}

/// Deep copies the subtree rooted at `node`, hanging the copy under `parent`.
///
/// # Safety
///
/// `node` must be a live node.
unsafe fn clone_subtree<T: Clone>(node: NonNull<Node<T>>, parent: Link<T>) -> NonNull<Node<T>> {
    let source = unsafe { node.as_ref() };
    let copy = Node::new_leaked(source.value.clone());
    unsafe {
        let copy_mut = &mut *copy.as_ptr();
        copy_mut.set_parent(parent);
        copy_mut.set_balance_factor(source.balance_factor());
    }
    for side in [Side::Left, Side::Right] {
        if let Some(child) = source.child(side) {
            let child_copy = unsafe { clone_subtree(child, Some(copy)) };
            unsafe { Node::attach(copy, Some(child_copy), side) };
        }
    }
    copy
}

impl<T> fmt::Debug for AvlTree<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvlTree")
            .field("len", &self.len)
            .field("root", &self.root_node())
            .finish()
    }
}

impl<T> AvlTree<T> {
    /// Generates a new, empty `AvlTree`.
    pub const fn new() -> Self {
        Self {
            root: None,
            len: 0,
            _owns: PhantomData,
        }
    }

    /// Returns `true` if the tree holds no values.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns how many values are in the tree, counting duplicates.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of levels in the tree. An empty tree has height 0 and a lone root has
    /// height 1.
    pub fn height(&self) -> usize {
        fn subtree_height<T>(link: Link<T>) -> usize {
            link.map_or(0, |node| {
                // SAFETY: Reachable nodes are live while the tree is borrowed.
                let node = unsafe { node.as_ref() };
                subtree_height(node.left()).max(subtree_height(node.right())) + 1
            })
        }

        subtree_height(self.root)
    }

    /// Returns references to every value in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl::AvlTree;
    ///
    /// let mut tree: AvlTree<i32> = AvlTree::new();
    /// for x in [3, 1, 2, 1] {
    ///     tree.insert(x)?;
    /// }
    ///
    /// assert_eq!(tree.in_order(), vec![&1, &1, &2, &3]);
    /// # Ok::<(), avl::AvlError>(())
    /// ```
    pub fn in_order(&self) -> Vec<&T> {
        let mut values = Vec::with_capacity(self.len);
        let mut stack = Vec::new();
        let mut cur = self.root;

        loop {
            while let Some(node) = cur {
                stack.push(node);
                // SAFETY: Reachable nodes are live while the tree is borrowed.
                cur = unsafe { node.as_ref() }.left();
            }
            let Some(node) = stack.pop() else {
                return values;
            };
            // SAFETY: As above. The reference can't outlive `&self`.
            let node = unsafe { node.as_ref() };
            values.push(&node.value);
            cur = node.right();
        }
    }

    /// Renders the tree level by level, each node followed by its balance factor in parentheses
    /// and each empty child slot as ` -.- `. This is only meant for eyeballing the tree's shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl::AvlTree;
    ///
    /// let mut tree: AvlTree<i32> = AvlTree::new();
    /// for x in [10, 20, 30] {
    ///     tree.insert(x)?;
    /// }
    ///
    /// assert_eq!(
    ///     tree.debug_dump(),
    ///     "20 (0) \n10 (0) 30 (0) \n -.-   -.-   -.-   -.-  \n"
    /// );
    /// # Ok::<(), avl::AvlError>(())
    /// ```
    pub fn debug_dump(&self) -> String
    where
        T: fmt::Display,
    {
        LevelOrder(self).to_string()
    }

    /// Potentially finds a value equal to `value` in the tree. If no node holds an equal value,
    /// `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// [`AvlError::InvalidArgument`] if `value` is `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl::{AvlError, AvlTree};
    ///
    /// let mut tree: AvlTree<i32> = AvlTree::new();
    /// tree.insert(1)?;
    ///
    /// assert_eq!(tree.find(&1), Ok(Some(&1)));
    /// assert_eq!(tree.find(&42), Ok(None));
    /// assert!(matches!(tree.find(None), Err(AvlError::InvalidArgument(_))));
    /// # Ok::<(), avl::AvlError>(())
    /// ```
    pub fn find<'q>(&self, value: impl Into<Option<&'q T>>) -> Result<Option<&T>, AvlError>
    where
        T: Ord + 'q,
    {
        let found = self.find_node(value.into())?;
        // SAFETY: The node is reachable from the root and the reference is bound to `&self`.
        Ok(found.map(|node| unsafe { &node.as_ref().value }))
    }

    /// Returns whether a value equal to `value` is in the tree.
    ///
    /// # Errors
    ///
    /// [`AvlError::InvalidArgument`] if `value` is `None`.
    pub fn contains<'q>(&self, value: impl Into<Option<&'q T>>) -> Result<bool, AvlError>
    where
        T: Ord + 'q,
    {
        Ok(self.find_node(value.into())?.is_some())
    }

    /// Inserts `value` into the tree. A value equal to ones already present is stored as well and
    /// ends up before them in order.
    ///
    /// # Errors
    ///
    /// [`AvlError::InvalidArgument`] if `value` is `None`. The tree isn't modified.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl::{AvlError, AvlTree};
    ///
    /// let mut tree: AvlTree<i32> = AvlTree::new();
    ///
    /// tree.insert(1)?;
    /// tree.insert(Some(2))?;
    /// assert_eq!(tree.len(), 2);
    ///
    /// assert!(matches!(tree.insert(None), Err(AvlError::InvalidArgument(_))));
    /// assert_eq!(tree.len(), 2);
    /// # Ok::<(), avl::AvlError>(())
    /// ```
    pub fn insert(&mut self, value: impl Into<Option<T>>) -> Result<(), AvlError>
    where
        T: Ord,
    {
        let value = value
            .into()
            .ok_or(AvlError::InvalidArgument("cannot insert an absent value"))?;
        let leaf = Node::new_leaked(value);

        let Some(mut parent) = self.root else {
            self.root = Some(leaf);
            self.len = 1;
            return Ok(());
        };

        // SAFETY: `parent` always points at a node reachable from the root and `leaf` is ours.
        // References created here end before any pointer is written through.
        unsafe {
            loop {
                let side = match leaf.as_ref().value.cmp(&parent.as_ref().value) {
                    Ordering::Less | Ordering::Equal => Side::Left,
                    Ordering::Greater => Side::Right,
                };
                match parent.as_ref().child(side) {
                    Some(next) => parent = next,
                    None => break,
                }
            }

            let side = match Node::attach_by_value(parent, Some(leaf)) {
                Ok(side) => side,
                Err(e) => {
                    drop(Box::from_raw(leaf.as_ptr()));
                    return Err(e);
                }
            };
            self.len += 1;
            self.rebalance_after_insert(parent, side);
        }

        Ok(())
    }

    /// Deletes one node holding a value equal to `value` and returns the value it held. If the
    /// tree has no such value, nothing happens and `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// [`AvlError::InvalidArgument`] if `value` is `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl::AvlTree;
    ///
    /// let mut tree: AvlTree<i32> = AvlTree::new();
    /// tree.insert(1)?;
    ///
    /// assert_eq!(tree.delete(&1), Ok(Some(1)));
    /// assert_eq!(tree.delete(&1), Ok(None));
    /// # Ok::<(), avl::AvlError>(())
    /// ```
    pub fn delete<'q>(&mut self, value: impl Into<Option<&'q T>>) -> Result<Option<T>, AvlError>
    where
        T: Ord + 'q,
    {
        let Some(node) = self.find_node(value.into())? else {
            trace!(len = self.len, "value not present, nothing deleted");
            return Ok(None);
        };

        // SAFETY: `node` was just found in this tree.
        let removed = unsafe { self.unlink(node) };
        self.len -= 1;

        Ok(Some(removed))
    }

    /// Asserts every structural invariant of the tree: parent pointers agree with child
    /// pointers, stored balance factors match real subtree heights and stay within -1..=1, values
    /// are in order and `len` matches the number of nodes.
    ///
    /// ## Panics
    ///
    /// When any invariant is broken.
    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        T: Ord + fmt::Debug,
    {
        /// Returns the height of the subtree and adds its node count to `count`.
        fn check<T>(node: NonNull<Node<T>>, parent: Link<T>, count: &mut usize) -> isize {
            // SAFETY: Reachable nodes are live while the tree is borrowed.
            let n = unsafe { node.as_ref() };
            assert_eq!(n.parent(), parent, "parent pointer doesn't match the tree structure");
            *count += 1;

            let left = n.left().map_or(0, |l| check(l, Some(node), count));
            let right = n.right().map_or(0, |r| check(r, Some(node), count));

            assert_eq!(
                isize::from(n.balance_factor()),
                right - left,
                "stored balance factor doesn't match subtree heights"
            );
            assert!(
                (-1..=1).contains(&n.balance_factor()),
                "node is out of balance"
            );

            left.max(right) + 1
        }

        let mut count = 0;
        if let Some(root) = self.root {
            check(root, None, &mut count);
        }
        assert_eq!(count, self.len, "`len` doesn't match the number of nodes");

        let values = self.in_order();
        assert!(
            values.windows(2).all(|pair| pair[0] <= pair[1]),
            "values out of order: {values:?}"
        );
    }

    fn root_node(&self) -> Option<&Node<T>> {
        // SAFETY: If the root is not `None` then it is a valid `Node` owned by `self`.
        self.root.map(|root| unsafe { &*root.as_ptr() })
    }

    fn find_node(&self, value: Option<&T>) -> Result<Link<T>, AvlError>
    where
        T: Ord,
    {
        let value = value.ok_or(AvlError::InvalidArgument("cannot search for an absent value"))?;
        let mut cur = self.root;

        while let Some(node) = cur {
            // SAFETY: Reachable nodes are live while the tree is borrowed.
            let n = unsafe { node.as_ref() };
            cur = match value.cmp(&n.value) {
                Ordering::Less => n.left(),
                Ordering::Equal => return Ok(Some(node)),
                Ordering::Greater => n.right(),
            };
        }

        Ok(None)
    }

    /// Removes `node`'s value from the tree, freeing one node and rebalancing.
    ///
    /// A node with two children keeps its place: it takes its in-order successor's value and the
    /// successor's node is spliced out instead.
    ///
    /// # Safety
    ///
    /// `node` must be a node of this tree.
    unsafe fn unlink(&mut self, node: NonNull<Node<T>>) -> T {
        unsafe {
            let (left, right, parent) = {
                let n = node.as_ref();
                (n.left(), n.right(), n.parent())
            };

            if let (Some(_), Some(right)) = (left, right) {
                let mut successor_parent = node;
                let mut successor = right;
                let mut side = Side::Right;
                while let Some(next) = successor.as_ref().left() {
                    successor_parent = successor;
                    successor = next;
                    side = Side::Left;
                }

                // The successor has no left child so its right child (if any) takes its slot. When
                // the successor was `node`'s own right child, the walk starts at `node` itself.
                Node::attach(successor_parent, successor.as_ref().right(), side);
                let successor = Box::from_raw(successor.as_ptr());
                let removed = mem::replace(&mut (*node.as_ptr()).value, successor.value);

                self.rebalance_after_removal(successor_parent, side);
                return removed;
            }

            let child = left.or(right);
            match parent {
                Some(parent) => {
                    let side = parent.as_ref().side_of(node);
                    Node::attach(parent, child, side);
                    let removed = Box::from_raw(node.as_ptr()).value;
                    self.rebalance_after_removal(parent, side);
                    removed
                }
                None => {
                    if let Some(child) = child {
                        (*child.as_ptr()).set_parent(None);
                    }
                    self.root = child;
                    Box::from_raw(node.as_ptr()).value
                }
            }
        }
    }

    /// Walks up from `parent`, whose `side` subtree just grew by one level.
    ///
    /// # Safety
    ///
    /// `parent` must be a node of this tree.
    unsafe fn rebalance_after_insert(&mut self, mut parent: NonNull<Node<T>>, mut side: Side) {
        unsafe {
            loop {
                let factor = {
                    let p = &mut *parent.as_ptr();
                    match side {
                        Side::Left => p.decrement_factor(),
                        Side::Right => p.increment_factor(),
                    }
                    p.balance_factor()
                };

                match factor {
                    // The shorter side caught up so the subtree's height didn't change.
                    0 => return,
                    -1 | 1 => match parent.as_ref().parent() {
                        Some(grandparent) => {
                            side = grandparent.as_ref().side_of(parent);
                            parent = grandparent;
                        }
                        None => return,
                    },
                    _ => {
                        // A rotation after an insert always restores the subtree's old height.
                        self.rotate(parent);
                        return;
                    }
                }
            }
        }
    }

    /// Walks up from `parent`, whose `side` subtree just shrank by one level.
    ///
    /// Unlike inserting, the subtree got shorter exactly when the factor lands on 0, so that's when
    /// the walk keeps going.
    ///
    /// # Safety
    ///
    /// `parent` must be a node of this tree.
    unsafe fn rebalance_after_removal(&mut self, mut parent: NonNull<Node<T>>, mut side: Side) {
        unsafe {
            loop {
                let factor = {
                    let p = &mut *parent.as_ptr();
                    match side {
                        Side::Left => p.increment_factor(),
                        Side::Right => p.decrement_factor(),
                    }
                    p.balance_factor()
                };

                let top = match factor {
                    -1 | 1 => return,
                    0 => parent,
                    _ => {
                        let top = self.rotate(parent);
                        // A rotation around a child with factor 0 leaves the height unchanged.
                        if top.as_ref().balance_factor() != 0 {
                            return;
                        }
                        top
                    }
                };

                match top.as_ref().parent() {
                    Some(grandparent) => {
                        side = grandparent.as_ref().side_of(top);
                        parent = grandparent;
                    }
                    None => return,
                }
            }
        }
    }

    /// Rebalances the subtree rooted at `a`, whose balance factor is -2 or 2, and returns the node
    /// now in `a`'s place.
    ///
    /// ## Panics
    ///
    /// When `a` is missing the child (or grandchild) it needs to rotate around, which would mean
    /// its balance factor is wrong.
    ///
    /// # Safety
    ///
    /// `a` must be a node of this tree.
    unsafe fn rotate(&mut self, a: NonNull<Node<T>>) -> NonNull<Node<T>> {
        unsafe {
            let (heavy, parent) = {
                let a = a.as_ref();
                debug_assert_eq!(a.balance_factor().abs(), 2);
                let heavy = if a.balance_factor() < 0 {
                    Side::Left
                } else {
                    Side::Right
                };
                (heavy, a.parent())
            };
            let b = a
                .as_ref()
                .child(heavy)
                .expect("A node out of balance has a child on its heavy side");

            let top = if b.as_ref().balance_factor() * heavy.sign() >= 0 {
                let kind = match heavy {
                    Side::Left => "left-left",
                    Side::Right => "right-right",
                };
                trace!(kind, child_factor = b.as_ref().balance_factor(), "rotating");
                Self::rotate_single(a, b, heavy)
            } else {
                let pivot = b
                    .as_ref()
                    .child(!heavy)
                    .expect("A child leaning away from its parent has a child on that side");
                let kind = match heavy {
                    Side::Left => "left-right",
                    Side::Right => "right-left",
                };
                trace!(kind, pivot_factor = pivot.as_ref().balance_factor(), "rotating");
                Self::rotate_cross(a, b, pivot, heavy)
            };

            self.replace_child_or_set_root(parent, a, top);

            if cfg!(debug_assertions) {
                let top = top.as_ref();
                assert!((-1..=1).contains(&top.balance_factor()));
                for child in [top.left(), top.right()].into_iter().flatten() {
                    assert!((-1..=1).contains(&child.as_ref().balance_factor()));
                }
            }

            top
        }
    }

    /// Lifts `b`, the `heavy` child of `a`, into `a`'s place.
    ///
    /// # Diagram
    ///
    /// For `heavy == Side::Left` (the right side mirrors it):
    ///
    /// ```text
    ///       a                b
    ///      / \              / \
    ///     b   z  rotate -> x   a
    ///    / \                  / \
    ///   x   y                y   z
    /// ```
    ///
    /// `a`'s old parent isn't updated; see [`AvlTree::replace_child_or_set_root`].
    unsafe fn rotate_single(a: NonNull<Node<T>>, b: NonNull<Node<T>>, heavy: Side) -> NonNull<Node<T>> {
        unsafe {
            let across = b.as_ref().child(!heavy);
            Node::attach(a, across, heavy);
            Node::attach(b, Some(a), !heavy);

            let sign = heavy.sign();
            if b.as_ref().balance_factor() == sign {
                (*a.as_ptr()).set_balance_factor(0);
                (*b.as_ptr()).set_balance_factor(0);
            } else {
                // Only happens while deleting: `b` was perfectly balanced.
                (*a.as_ptr()).set_balance_factor(sign);
                (*b.as_ptr()).set_balance_factor(-sign);
            }
        }

        b
    }

    /// Lifts `pivot`, the grandchild of `outer` through `inner` (its `heavy` child), into
    /// `outer`'s place.
    ///
    /// # Diagram
    ///
    /// For `heavy == Side::Left` (the right side mirrors it):
    ///
    /// ```text
    ///        outer                  pivot
    ///        /   \                 /     \
    ///     inner   z   rotate ->  inner   outer
    ///     /   \                  /  \    /  \
    ///    w   pivot              w    x  y    z
    ///        /  \
    ///       x    y
    /// ```
    ///
    /// `outer`'s old parent isn't updated; see [`AvlTree::replace_child_or_set_root`].
    unsafe fn rotate_cross(
        outer: NonNull<Node<T>>,
        inner: NonNull<Node<T>>,
        pivot: NonNull<Node<T>>,
        heavy: Side,
    ) -> NonNull<Node<T>> {
        unsafe {
            let (toward_heavy, away_from_heavy, pivot_factor) = {
                let p = pivot.as_ref();
                (p.child(heavy), p.child(!heavy), p.balance_factor())
            };

            Node::attach(inner, toward_heavy, !heavy);
            Node::attach(outer, away_from_heavy, heavy);
            Node::attach(pivot, Some(inner), heavy);
            Node::attach(pivot, Some(outer), !heavy);

            let (left, right) = match heavy {
                Side::Left => (inner, outer),
                Side::Right => (outer, inner),
            };
            (*left.as_ptr()).set_balance_factor(if pivot_factor == 1 { -1 } else { 0 });
            (*right.as_ptr()).set_balance_factor(if pivot_factor == -1 { 1 } else { 0 });
            (*pivot.as_ptr()).set_balance_factor(0);
        }

        pivot
    }

    /// Points whatever pointed at `old` (its parent's child slot, or the root) at `new` instead.
    ///
    /// # Safety
    ///
    /// `parent` must be `old`'s parent from before `old` was moved, and must still hold `old` in
    /// one of its slots.
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old: NonNull<Node<T>>,
        new: NonNull<Node<T>>,
    ) {
        unsafe {
            match parent {
                Some(parent) => {
                    let side = parent.as_ref().side_of(old);
                    Node::attach(parent, Some(new), side);
                }
                None => {
                    (*new.as_ptr()).set_parent(None);
                    self.root = Some(new);
                }
            }
        }
    }
}
