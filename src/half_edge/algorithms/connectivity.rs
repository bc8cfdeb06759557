use std::collections::VecDeque;

use ahash::AHashSet;
use bitvec::vec::BitVec;

use crate::half_edge::{HedgeGraph, NodeIndex};

/// Assignment of every live node to a connected component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Components {
    /// Component of each node slot; `None` for removed nodes.
    pub of_node: Vec<Option<usize>>,
    /// Nodes of each component, in discovery order.
    pub members: Vec<Vec<NodeIndex>>,
}

impl Components {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn same(&self, a: NodeIndex, b: NodeIndex) -> bool {
        matches!((self.of_node[a.0], self.of_node[b.0]), (Some(x), Some(y)) if x == y)
    }
}

impl<E, V> HedgeGraph<E, V> {
    pub fn connected_components(&self) -> Components {
        let mut of_node = vec![None; self.node_bound()];
        let mut members = Vec::new();
        let mut queue = VecDeque::new();

        for root in self.iter_node_ids() {
            if of_node[root.0].is_some() {
                continue;
            }
            let id = members.len();
            let mut component = vec![root];
            of_node[root.0] = Some(id);
            queue.push_back(root);
            while let Some(v) = queue.pop_front() {
                for w in self.neighbors(v) {
                    if of_node[w.0].is_none() {
                        of_node[w.0] = Some(id);
                        component.push(w);
                        queue.push_back(w);
                    }
                }
            }
            members.push(component);
        }

        Components { of_node, members }
    }

    pub fn count_connected_components(&self) -> usize {
        self.connected_components().len()
    }

    pub fn is_connected(&self) -> bool {
        self.count_connected_components() <= 1
    }

    /// Whether every node other than `excluded` can reach every other one avoiding it.
    pub(crate) fn is_connected_without(&self, excluded: NodeIndex) -> bool {
        let Some(root) = self.iter_node_ids().find(|n| *n != excluded) else {
            return true;
        };
        let mut seen: BitVec = BitVec::repeat(false, self.node_bound());
        seen.set(excluded.0, true);
        seen.set(root.0, true);
        let mut reached = 1;
        let mut stack = vec![root];
        while let Some(v) = stack.pop() {
            for w in self.neighbors(v) {
                if !seen.replace(w.0, true) {
                    reached += 1;
                    stack.push(w);
                }
            }
        }
        reached + 1 == self.n_nodes()
    }

    /// No self-loops and no parallel edges.
    pub fn is_simple(&self) -> bool {
        let mut seen = AHashSet::new();
        for e in self.iter_edge_ids() {
            let (s, t) = self.endpoints(e);
            if s == t || !seen.insert((s.min(t), s.max(t))) {
                return false;
            }
        }
        true
    }

    /// Whether the graph stays connected after deleting any two nodes.
    ///
    /// A triconnected graph has at least four nodes. Runs one block decomposition per
    /// node: `G` is triconnected iff `G - a` is biconnected for every node `a`.
    pub fn is_triconnected(&self) -> bool {
        if self.n_nodes() < 4 || !self.is_connected() {
            return false;
        }
        self.iter_node_ids().all(|a| {
            self.is_connected_without(a) && self.biconnected_components_without(Some(a)).is_biconnected()
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::half_edge::{builder::HedgeGraphBuilder, test_graphs::TestGraph, NodeIndex};

    #[test]
    fn components_of_a_disjoint_union() {
        let mut builder: HedgeGraphBuilder<(), ()> = HedgeGraphBuilder::new();
        let nodes: Vec<_> = (0..5).map(|_| builder.add_node(())).collect();
        builder.add_edge(nodes[0], nodes[1], ());
        builder.add_edge(nodes[2], nodes[3], ());
        let graph = builder.build();

        let components = graph.connected_components();
        assert_eq!(components.len(), 3);
        assert!(components.same(NodeIndex(0), NodeIndex(1)));
        assert!(!components.same(NodeIndex(1), NodeIndex(2)));
        assert_eq!(components.members[2], vec![NodeIndex(4)]);
    }

    #[test]
    fn triconnectivity_of_the_catalogue() {
        assert!(TestGraph::Complete(4).graph().is_triconnected());
        assert!(TestGraph::Petersen.graph().is_triconnected());
        assert!(TestGraph::Wheel(5).graph().is_triconnected());
        assert!(TestGraph::Prism(4).graph().is_triconnected());
        assert!(!TestGraph::Cycle(6).graph().is_triconnected());
        assert!(!TestGraph::Grid(3, 3).graph().is_triconnected());
        assert!(!TestGraph::Complete(3).graph().is_triconnected());
    }

    #[test]
    fn simplicity() {
        assert!(TestGraph::Petersen.graph().is_simple());
        let mut graph = TestGraph::Cycle(3).graph();
        graph.add_edge(NodeIndex(0), NodeIndex(1), ()).unwrap();
        assert!(!graph.is_simple());
    }
}
