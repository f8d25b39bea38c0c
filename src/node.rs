//! The building block of an [`AvlTree`][crate::AvlTree].
//!
//! A `Node` owns its two children and keeps a non-owning pointer back to its parent. Nodes are
//! allocated with `Box::new` and then leaked into `NonNull` pointers; the tree is responsible for
//! turning them back into `Box`es exactly once when they're removed or the tree is dropped.
//!
//! Functions that rewire pointers take the node as a `NonNull<Node<T>>` instead of `&mut self`.
//! Parent pointers written this way stay derived from the original allocation rather than from a
//! short-lived reborrow.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Not;
use std::ptr::NonNull;

use crate::error::AvlError;

/// A possibly empty pointer to a node.
pub(crate) type Link<T> = Option<NonNull<Node<T>>>;

/// Which child slot of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Not for Side {
    type Output = Side;

    fn not(self) -> Self::Output {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl Side {
    /// The balance factor a node leans towards when this side is the taller one.
    pub(crate) fn sign(self) -> i8 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }
}

pub(crate) struct Node<T> {
    pub(crate) value: T,
    left: Link<T>,
    right: Link<T>,
    parent: Link<T>,
    /// `height(right) - height(left)`. Outside of a rebalancing walk this is always -1, 0 or 1.
    balance_factor: i8,
}

impl<T> fmt::Debug for Node<T>
where
    T: fmt::Debug,
{
    // TODO stack based Debug
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: Children are live for as long as their parent is.
        let (left, right) = unsafe {
            (
                self.left.as_ref().map(|n| n.as_ref()),
                self.right.as_ref().map(|n| n.as_ref()),
            )
        };
        f.debug_struct("Node")
            .field("value", &self.value)
            .field("balance_factor", &self.balance_factor)
            .field("left", &left)
            .field("right", &right)
            .finish()
    }
}

impl<T> Node<T> {
    /// Allocates a fresh, unattached leaf and leaks it. The caller takes over ownership.
    pub(crate) fn new_leaked(value: T) -> NonNull<Self> {
        NonNull::from(Box::leak(Box::new(Node {
            value,
            left: None,
            right: None,
            parent: None,
            balance_factor: 0,
        })))
    }

    pub(crate) fn child(&self, side: Side) -> Link<T> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn left(&self) -> Link<T> {
        self.left
    }

    pub(crate) fn right(&self) -> Link<T> {
        self.right
    }

    pub(crate) fn parent(&self) -> Link<T> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Link<T>) {
        self.parent = parent;
    }

    pub(crate) fn balance_factor(&self) -> i8 {
        self.balance_factor
    }

    pub(crate) fn set_balance_factor(&mut self, balance_factor: i8) {
        self.balance_factor = balance_factor;
    }

    pub(crate) fn increment_factor(&mut self) {
        self.balance_factor += 1;
    }

    pub(crate) fn decrement_factor(&mut self) {
        self.balance_factor -= 1;
    }

    /// Which slot of `self` holds `child`.
    ///
    /// `child` must be one of `self`'s children.
    pub(crate) fn side_of(&self, child: NonNull<Self>) -> Side {
        if self.left == Some(child) {
            Side::Left
        } else {
            debug_assert_eq!(self.right, Some(child), "`child` must be a child of `self`");
            Side::Right
        }
    }

    /// Puts `child` in the `side` slot of `this`, replacing (but not freeing) whatever was there.
    /// If `child` is a node, its parent pointer is set to `this`. Passing `None` clears the slot.
    ///
    /// # Safety
    ///
    /// `this` and `child` must be live nodes of the same tree and no references to either may be
    /// alive during the call.
    pub(crate) unsafe fn attach(this: NonNull<Self>, child: Link<T>, side: Side) {
        unsafe {
            match side {
                Side::Left => (*this.as_ptr()).left = child,
                Side::Right => (*this.as_ptr()).right = child,
            }
            if let Some(child) = child {
                (*child.as_ptr()).parent = Some(this);
            }
        }
    }

    /// Like [`Node::attach`] but picks the slot by comparing values: equal or smaller values go
    /// left, larger values go right. Returns the side `child` was attached on.
    ///
    /// # Safety
    ///
    /// Same as [`Node::attach`].
    pub(crate) unsafe fn attach_by_value(this: NonNull<Self>, child: Link<T>) -> Result<Side, AvlError>
    where
        T: Ord,
    {
        let child = child.ok_or(AvlError::InvalidArgument(
            "cannot infer the side of an absent child",
        ))?;

        // SAFETY: Both nodes are live per this function's contract and the references end before
        // `attach` writes through the pointers.
        let side = unsafe {
            match child.as_ref().value.cmp(&this.as_ref().value) {
                Ordering::Less | Ordering::Equal => Side::Left,
                Ordering::Greater => Side::Right,
            }
        };
        unsafe { Self::attach(this, Some(child), side) };

        Ok(side)
    }
}
