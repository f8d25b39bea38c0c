//! Level-order rendering of a tree, used by [`AvlTree::debug_dump`].
//!
//! This is a debugging aid. The output is meant for humans and isn't parseable.

use std::collections::VecDeque;
use std::fmt;

use crate::node::Link;
use crate::AvlTree;

/// What an empty child slot renders as.
const PLACEHOLDER: &str = " -.-  ";

/// Renders the tree breadth first. Every present node prints as `<value> (<balance factor>) ` and
/// queues both of its child slots; an empty slot prints [`PLACEHOLDER`] and queues nothing. A line
/// break follows the `n`th entry whenever `n + 1` is a power of two, so lines only line up with
/// levels while the tree is perfect.
pub(crate) struct LevelOrder<'a, T>(pub(crate) &'a AvlTree<T>);

impl<T> fmt::Display for LevelOrder<'_, T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut queue: VecDeque<Link<T>> = VecDeque::from([self.0.root]);
        let mut rendered = 0usize;

        while let Some(slot) = queue.pop_front() {
            rendered += 1;
            match slot {
                Some(node) => {
                    // SAFETY: Every node reachable from the root is live while we borrow the tree.
                    let node = unsafe { node.as_ref() };
                    write!(f, "{} ({}) ", node.value, node.balance_factor())?;
                    queue.push_back(node.left());
                    queue.push_back(node.right());
                }
                None => f.write_str(PLACEHOLDER)?,
            }

            if rendered & (rendered + 1) == 0 {
                f.write_str("\n")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::AvlTree;

    fn tree_of(values: &[i32]) -> AvlTree<i32> {
        let mut tree = AvlTree::new();
        for &value in values {
            tree.insert(value).unwrap();
        }
        tree
    }

    #[test]
    fn empty_tree() {
        assert_eq!(AvlTree::<i32>::new().debug_dump(), " -.-  \n");
    }

    #[test]
    fn single_node() {
        assert_eq!(tree_of(&[7]).debug_dump(), "7 (0) \n -.-   -.-  \n");
    }

    #[test]
    fn full_levels() {
        assert_eq!(
            tree_of(&[10, 20, 30]).debug_dump(),
            "20 (0) \n10 (0) 30 (0) \n -.-   -.-   -.-   -.-  \n"
        );
    }

    #[test]
    fn shows_balance_factors() {
        // 2 is the root with only a right child.
        assert_eq!(
            tree_of(&[2, 3]).debug_dump(),
            "2 (1) \n -.-  3 (0) \n -.-   -.-  "
        );
    }
}
