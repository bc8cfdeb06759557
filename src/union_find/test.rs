use super::*;

#[test]
fn test_basic_union_find() {
    let mut uf = UnionFind::new(5);
    assert_eq!(uf.n_sets(), 5);
    assert!(!uf.same(0, 1));

    assert!(uf.union(0, 1));
    assert!(uf.same(0, 1));
    assert!(!uf.union(1, 0));
    assert_eq!(uf.n_sets(), 4);
}

#[test]
fn test_path_compression() {
    let mut uf = UnionFind::new(4);

    // Create a chain: 3->2->1->0
    uf.union(0, 1);
    uf.union(1, 2);
    uf.union(2, 3);

    let root = uf.find(3);
    assert_eq!(uf.find(2), root);
    assert_eq!(uf.find(1), root);
    assert_eq!(uf.n_sets(), 1);
    for i in 0..4 {
        let node = uf.nodes[i].get();
        assert!(node == UFNode::Child(root) || ParentPointer(i) == root);
    }
}
