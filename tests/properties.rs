use std::collections::BTreeMap;

use avl::{AvlError, AvlTree};
use quickcheck::{quickcheck, Arbitrary, Gen};

/// Something to do to the tree in a property test.
#[derive(Copy, Clone, Debug)]
enum Op {
    Insert(i8),
    Delete(i8),
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        if bool::arbitrary(g) {
            Op::Insert(i8::arbitrary(g))
        } else {
            Op::Delete(i8::arbitrary(g))
        }
    }
}

fn tree_of(values: impl IntoIterator<Item = i32>) -> AvlTree<i32> {
    let mut tree = AvlTree::new();
    for value in values {
        tree.insert(value).unwrap();
    }
    tree
}

#[test]
fn inserting_in_order_rotates_right_right() {
    let tree = tree_of([10, 20, 30]);

    tree.assert_invariants();
    assert_eq!(tree.height(), 2);
    assert_eq!(
        tree.debug_dump(),
        "20 (0) \n10 (0) 30 (0) \n -.-   -.-   -.-   -.-  \n"
    );
}

#[test]
fn inserting_zig_zag_rotates_left_right() {
    let tree = tree_of([30, 10, 20]);

    tree.assert_invariants();
    assert_eq!(
        tree.debug_dump(),
        "20 (0) \n10 (0) 30 (0) \n -.-   -.-   -.-   -.-  \n"
    );
}

#[test]
fn ascending_run_is_perfectly_balanced() {
    let tree = tree_of(1..=7);

    tree.assert_invariants();
    assert_eq!(tree.height(), 3);
    assert!(tree
        .debug_dump()
        .starts_with("4 (0) \n2 (0) 6 (0) \n1 (0) 3 (0) 5 (0) 7 (0) \n"));
}

#[test]
fn deleting_down_to_empty() {
    let mut tree = tree_of([1, 2]);

    assert_eq!(tree.delete(&1), Ok(Some(1)));
    tree.assert_invariants();
    assert_eq!(tree.debug_dump(), "2 (0) \n -.-   -.-  \n");

    assert_eq!(tree.delete(&2), Ok(Some(2)));
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.debug_dump(), " -.-  \n");
}

#[test]
fn every_deletion_order_from_a_perfect_tree() {
    // Each value of a perfect 7 node tree as the first, second and third deletion exercises the
    // walk stopping at every level as well as reaching the root.
    let values = [4, 2, 6, 1, 3, 5, 7];
    for &first in &values {
        for &second in &values {
            for &third in &values {
                if first == second || second == third || first == third {
                    continue;
                }

                let mut tree = tree_of(values);
                for value in [first, second, third] {
                    assert_eq!(tree.delete(&value), Ok(Some(value)));
                    tree.assert_invariants();
                }
                assert_eq!(tree.len(), 4);
            }
        }
    }
}

#[test]
fn absent_arguments_are_errors() {
    let mut tree = tree_of([1]);

    assert!(matches!(tree.insert(None), Err(AvlError::InvalidArgument(_))));
    assert!(matches!(tree.contains(None), Err(AvlError::InvalidArgument(_))));
    assert!(matches!(tree.delete(None), Err(AvlError::InvalidArgument(_))));
    assert_eq!(tree.len(), 1);
}

#[test]
fn works_with_owned_values() {
    let mut tree: AvlTree<String> = AvlTree::new();
    for word in ["pear", "apple", "fig", "kiwi", "apple"] {
        tree.insert(word.to_string()).unwrap();
    }
    tree.assert_invariants();

    assert_eq!(tree.contains(&"fig".to_string()), Ok(true));
    assert_eq!(tree.delete(&"apple".to_string()), Ok(Some("apple".to_string())));
    assert_eq!(tree.contains(&"apple".to_string()), Ok(true));
    assert_eq!(tree.in_order(), vec!["apple", "fig", "kiwi", "pear"]);
}

quickcheck! {
    fn invariants_hold_after_every_operation(ops: Vec<Op>) -> bool {
        let mut tree: AvlTree<i8> = AvlTree::new();
        let mut counts: BTreeMap<i8, usize> = BTreeMap::new();
        let mut expected_len = 0;

        for op in ops {
            match op {
                Op::Insert(x) => {
                    tree.insert(x).unwrap();
                    *counts.entry(x).or_default() += 1;
                    expected_len += 1;
                }
                Op::Delete(x) => {
                    let present = counts.get(&x).copied().unwrap_or(0) > 0;
                    let deleted = tree.delete(&x).unwrap();
                    if deleted != present.then_some(x) {
                        return false;
                    }
                    if present {
                        *counts.get_mut(&x).unwrap() -= 1;
                        expected_len -= 1;
                    }
                }
            }
            tree.assert_invariants();
            if tree.len() != expected_len {
                return false;
            }
        }

        let expected: Vec<i8> = counts
            .iter()
            .flat_map(|(&x, &n)| std::iter::repeat(x).take(n))
            .collect();
        tree.in_order().into_iter().copied().eq(expected)
    }

    fn insert_then_contains(xs: Vec<i16>, x: i16) -> bool {
        let mut tree: AvlTree<i16> = AvlTree::new();
        for y in xs {
            tree.insert(y).unwrap();
        }
        tree.insert(x).unwrap();
        tree.contains(&x) == Ok(true)
    }

    fn delete_all_copies_then_not_contained(xs: Vec<i8>, x: i8) -> bool {
        let mut tree: AvlTree<i8> = AvlTree::new();
        for &y in &xs {
            tree.insert(y).unwrap();
        }
        while tree.delete(&x).unwrap().is_some() {}
        tree.contains(&x) == Ok(false) && tree.len() == xs.iter().filter(|&&y| y != x).count()
    }

    fn deleting_absent_value_changes_nothing(xs: Vec<i8>) -> bool {
        let mut tree: AvlTree<i16> = AvlTree::new();
        for &y in &xs {
            tree.insert(i16::from(y)).unwrap();
        }
        let before = tree.debug_dump();
        // Out of `i8` range, so never present.
        tree.delete(&1000) == Ok(None) && tree.len() == xs.len() && tree.debug_dump() == before
    }
}
