use proptest::prelude::*;
use similar_asserts::assert_eq;
use test_log::test;

use super::*;

fn chained() -> PqTree<usize> {
    let mut tree = PqTree::new(0..6);
    tree.reduce(&[1, 2]).unwrap();
    tree.reduce(&[2, 3]).unwrap();
    tree.reduce(&[3, 4]).unwrap();
    tree
}

#[test]
fn overlapping_pairs_build_a_q_node() {
    let tree = chained();
    assert_eq!(tree.frontier(), vec![0, 5, 1, 2, 3, 4]);
    insta::assert_snapshot!(tree.debug_draw(), @r"
    P
    ├── leaf 0
    ├── leaf 5
    └── Q
        ├── leaf 1
        ├── leaf 2
        ├── leaf 3
        └── leaf 4
    ");
}

#[test]
fn a_failed_reduction_changes_nothing() {
    let mut tree = chained();
    let before = tree.debug_draw();
    assert!(matches!(
        tree.reduce(&[1, 4]),
        Err(PqTreeError::Irreducible(_))
    ));
    assert_eq!(tree.debug_draw(), before);

    let range = tree.reduce(&[3, 2, 1]).unwrap();
    let PertinentRoot::Range { start, end, .. } = range else {
        panic!("expected a range, got {range:?}");
    };
    assert_eq!((start, end), (0, 3));
}

#[test]
fn a_single_leaf_is_its_own_root() {
    let mut tree = PqTree::new(0..4);
    let root = tree.reduce(&[2]).unwrap();
    let PertinentRoot::Full(id) = root else {
        panic!("expected a full node, got {root:?}");
    };
    assert_eq!(tree.node(id).kind, PqKind::Leaf(2));
}

#[test]
fn replacing_a_range_keeps_its_neighbours() {
    let mut tree = PqTree::new(0..4);
    tree.reduce(&[1, 2]).unwrap();
    let range = tree.reduce(&[2, 3]).unwrap();
    assert!(matches!(range, PertinentRoot::Range { .. }));

    tree.replace_pertinent(range, &[10, 11]).unwrap();
    assert_eq!(tree.frontier(), vec![0, 1, 10, 11]);
    assert_eq!(tree.len(), 4);
    assert!(!tree.contains(&2));
    assert!(!tree.contains(&3));
}

#[test]
fn replacing_a_full_node() {
    let mut tree = PqTree::new(0..4);
    let group = tree.reduce(&[1, 2]).unwrap();
    tree.replace_pertinent(group, &[7]).unwrap();
    assert_eq!(tree.frontier(), vec![0, 7, 3]);

    let all = tree.reduce(&[0, 7, 3]).unwrap();
    assert_eq!(all, PertinentRoot::Full(tree.root().unwrap()));
    tree.replace_pertinent(all, &[]).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.root(), None);
    assert_eq!(tree.debug_draw(), "(empty)");
}

#[test]
fn removed_leaves_collapse_their_parents() {
    let mut tree = PqTree::new(0..3);
    tree.remove_leaves(&[1]).unwrap();
    assert_eq!(tree.frontier(), vec![0, 2]);
    tree.remove_leaves(&[0]).unwrap();
    assert_eq!(tree.debug_draw(), "leaf 2");
    assert_eq!(tree.remove_leaves(&[0]), Err(PqTreeError::UnknownLeaf(0)));
}

#[test]
fn errors() {
    let mut tree = PqTree::new(0..3);
    assert_eq!(tree.reduce(&[]), Err(PqTreeError::EmptyPertinentSet));
    assert_eq!(tree.reduce(&[0, 9]), Err(PqTreeError::UnknownLeaf(1)));
    let root = tree.reduce(&[0, 1]).unwrap();
    assert_eq!(
        tree.replace_pertinent(root, &[5, 2]),
        Err(PqTreeError::DuplicateLeaf(1))
    );
    assert_eq!(
        tree.replace_pertinent(root, &[5, 5]),
        Err(PqTreeError::DuplicateLeaf(1))
    );
}

proptest! {
    #[test]
    fn intervals_of_one_order_always_reduce(
        (order, cuts) in (3usize..12).prop_flat_map(|n| (
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            proptest::collection::vec((0..n, 0..n), 1..8),
        ))
    ) {
        let mut tree = PqTree::new(0..order.len());
        let mut intervals = Vec::new();
        for (a, b) in cuts {
            let interval = &order[a.min(b)..=a.max(b)];
            prop_assert!(tree.reduce(interval).is_ok());
            intervals.push(interval.to_vec());
        }
        let frontier = tree.frontier();
        prop_assert_eq!(frontier.len(), order.len());
        for interval in intervals {
            let mut positions: Vec<_> = interval
                .iter()
                .map(|k| frontier.iter().position(|f| f == k).unwrap())
                .collect();
            positions.sort_unstable();
            prop_assert_eq!(positions[positions.len() - 1] - positions[0] + 1, positions.len());
        }
    }
}
