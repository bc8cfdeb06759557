use proptest::prelude::*;
use similar_asserts::assert_eq;

use super::*;
use crate::half_edge::{builder::HedgeGraphBuilder, test_graphs::TestGraph};

fn triangle() -> HedgeGraph<(), ()> {
    let mut builder: HedgeGraphBuilder<(), ()> = HedgeGraphBuilder::new();
    let a = builder.add_node(());
    let b = builder.add_node(());
    let c = builder.add_node(());
    builder.add_edge(a, b, ());
    builder.add_edge(b, c, ());
    builder.add_edge(c, a, ());
    builder.build()
}

fn rotations<E, V>(graph: &HedgeGraph<E, V>) -> Vec<(NodeIndex, Vec<Hedge>)> {
    graph
        .iter_node_ids()
        .map(|n| (n, graph.rotation(n)))
        .collect()
}

#[test]
fn triangle_dot() {
    let graph = triangle();
    insta::assert_snapshot!(graph.dot(), @r#"
    graph {
      0; // [e0 e2]
      1; // [e0 e1]
      2; // [e1 e2]
      0 -- 1 [label="e0"];
      1 -- 2 [label="e1"];
      2 -- 0 [label="e2"];
    }
    "#);
}

#[test]
fn split_keeps_the_source_side_and_rehomes_the_sink() {
    let mut graph = triangle();
    let pair = graph.hedge_pair(EdgeIndex(0));
    let (x, e) = graph.split_edge(EdgeIndex(0), (), ()).unwrap();
    let new_pair = graph.hedge_pair(e);

    assert_eq!(graph.n_nodes(), 4);
    assert_eq!(graph.n_edges(), 4);
    assert_eq!(graph.endpoints(EdgeIndex(0)), (NodeIndex(0), x));
    assert_eq!(graph.endpoints(e), (x, NodeIndex(1)));
    assert_eq!(graph.rotation(x), vec![pair.sink, new_pair.source]);
    assert_eq!(graph.rotation(NodeIndex(1))[0], new_pair.sink);
    assert_eq!(graph.face_next(pair.source), new_pair.source);
}

#[test]
fn unsplit_restores_the_rotations() {
    let mut graph = triangle();
    let before = rotations(&graph);
    let (x, e) = graph.split_edge(EdgeIndex(1), (), ()).unwrap();

    let unsplit = graph.unsplit(x).unwrap();
    assert_eq!(
        unsplit,
        Unsplit {
            kept: EdgeIndex(1),
            removed: e
        }
    );
    assert_eq!(rotations(&graph), before);
    assert!(!graph.is_live_node(x));
    assert!(!graph.is_live_edge(e));
    assert_eq!(graph.n_edges(), 3);
}

#[test]
fn unsplit_keeps_the_incoming_edge() {
    let mut builder: HedgeGraphBuilder<(), ()> = HedgeGraphBuilder::new();
    let a = builder.add_node(());
    let b = builder.add_node(());
    let c = builder.add_node(());
    let outgoing = builder.add_edge(b, c, ());
    let incoming = builder.add_edge(a, b, ());
    let mut graph = builder.build();
    assert_eq!(graph.anchor(b), Some(graph.hedge_pair(outgoing).source));

    assert_eq!(
        graph.unsplit(b).unwrap(),
        Unsplit {
            kept: incoming,
            removed: outgoing
        }
    );
    assert_eq!(graph.endpoints(incoming), (a, c));
}

#[test]
fn removed_edges_can_be_revived() {
    let mut graph = triangle();
    let before = rotations(&graph);
    let pair = graph.hedge_pair(EdgeIndex(2));
    let (source, sink) = (graph.rot_next(pair.source), graph.rot_next(pair.sink));
    graph.remove_edge(EdgeIndex(2)).unwrap();

    graph
        .revive_edge_at(EdgeIndex(2), Corner::Before(source), Corner::Before(sink), ())
        .unwrap();
    assert_eq!(rotations(&graph), before);
    assert_eq!(graph.n_edges(), 3);
    assert_eq!(graph.edge_bound(), 3);
    assert_eq!(graph.endpoints(EdgeIndex(2)), (NodeIndex(2), NodeIndex(0)));

    for edge in [EdgeIndex(2), EdgeIndex(7)] {
        assert_eq!(
            graph.revive_edge_at(edge, Corner::Before(source), Corner::Before(sink), ()),
            Err(HedgeGraphError::LiveEdge(edge))
        );
    }
}

#[test]
fn removal_leaves_tombstones() {
    let mut graph = triangle();
    graph.remove_edge(EdgeIndex(2)).unwrap();
    assert_eq!(graph.degree(NodeIndex(0)), 1);
    assert_eq!(graph.n_edges(), 2);
    assert_eq!(
        graph.remove_edge(EdgeIndex(2)),
        Err(HedgeGraphError::DeadEdge(EdgeIndex(2)))
    );
    assert_eq!(
        graph.remove_node(NodeIndex(0)),
        Err(HedgeGraphError::WrongDegree {
            node: NodeIndex(0),
            degree: 1,
            expected: 0
        })
    );

    graph.remove_edge(EdgeIndex(0)).unwrap();
    graph.remove_node(NodeIndex(0)).unwrap();
    assert_eq!(graph.n_nodes(), 2);
    assert_eq!(
        graph.iter_node_ids().collect::<Vec<_>>(),
        vec![NodeIndex(1), NodeIndex(2)]
    );
    assert_eq!(graph.iter_edge_ids().collect::<Vec<_>>(), vec![EdgeIndex(1)]);
    assert!(graph
        .add_edge(NodeIndex(0), NodeIndex(1), ())
        .is_err());
}

#[test]
fn corners_place_hedges_before_their_target() {
    let mut graph = triangle();
    let d = graph.add_node(());
    let h = graph.hedge_pair(EdgeIndex(2)).sink;
    let e = graph
        .add_edge_at(Corner::Before(h), Corner::Node(d), ())
        .unwrap();
    let new_source = graph.hedge_pair(e).source;

    assert_eq!(graph.rotation(NodeIndex(0)), vec![Hedge(0), new_source, h]);
    assert_eq!(graph.rotation(d), vec![graph.hedge_pair(e).sink]);
    assert_eq!(graph.neighbors(NodeIndex(0)).collect::<Vec<_>>(), vec![
        NodeIndex(1),
        d,
        NodeIndex(2)
    ]);
}

#[test]
fn set_rotation_checks_the_hedges() {
    let mut graph = TestGraph::Complete(4).graph();
    let mut rotation = graph.rotation(NodeIndex(0));
    rotation.reverse();
    graph.set_rotation(NodeIndex(0), &rotation).unwrap();
    assert_eq!(graph.rotation(NodeIndex(0)), rotation);

    rotation.pop();
    assert_eq!(
        graph.set_rotation(NodeIndex(0), &rotation),
        Err(HedgeGraphError::RotationMismatch(NodeIndex(0)))
    );
    let foreign = graph.rotation(NodeIndex(1));
    assert_eq!(
        graph.set_rotation(NodeIndex(0), &foreign),
        Err(HedgeGraphError::RotationMismatch(NodeIndex(0)))
    );
}

#[test]
fn self_loops_are_representable_but_found() {
    let mut graph = triangle();
    assert_eq!(graph.find_self_loop(), None);
    let e = graph.add_edge(NodeIndex(1), NodeIndex(1), ()).unwrap();
    assert!(graph.is_self_loop(e));
    assert_eq!(graph.find_self_loop(), Some(e));
    assert_eq!(graph.degree(NodeIndex(1)), 4);
}

#[test]
fn map_data_keeps_the_structure() {
    let graph = TestGraph::Petersen.graph();
    let mapped = graph.map_data_ref(|n, _| n.0 * 10, |e, _| e.0);
    assert_eq!(rotations(&graph), rotations(&mapped));
    assert_eq!(mapped[NodeIndex(3)], 30);
    assert_eq!(mapped[EdgeIndex(7)], 7);
}

proptest! {
    #[test]
    fn splits_undo_in_reverse(picks in proptest::collection::vec(0usize..64, 1..12)) {
        let mut graph = TestGraph::Complete(4).graph();
        let before = rotations(&graph);
        let mut created = Vec::new();
        for pick in picks {
            let edges: Vec<_> = graph.iter_edge_ids().collect();
            let edge = edges[pick % edges.len()];
            let (x, _) = graph.split_edge(edge, (), ()).unwrap();
            created.push(x);
        }
        for h in graph.iter_hedges() {
            prop_assert_eq!(graph.rot_prev(graph.rot_next(h)), h);
            prop_assert_eq!(graph.face_prev(graph.face_next(h)), h);
        }
        for x in created.into_iter().rev() {
            graph.unsplit(x).unwrap();
        }
        prop_assert_eq!(rotations(&graph), before);
        prop_assert_eq!(graph.n_edges(), 6);
    }
}
