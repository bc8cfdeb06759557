use ahash::AHashSet;
use bitvec::vec::BitVec;

use crate::half_edge::{
    involution::{EdgeIndex, Hedge},
    HedgeGraph, NodeIndex,
};

/// Blocks (maximal biconnected subgraphs) and cut vertices of a graph.
#[derive(Clone, Debug)]
pub struct BlockDecomposition {
    /// Edges of every block, in the order the DFS closed them.
    pub blocks: Vec<Vec<EdgeIndex>>,
    pub cut_vertices: BitVec,
}

impl BlockDecomposition {
    /// One block and no cut vertex. Edgeless graphs are not biconnected.
    pub fn is_biconnected(&self) -> bool {
        self.blocks.len() == 1 && self.cut_vertices.not_any()
    }

    pub fn is_cut_vertex(&self, node: NodeIndex) -> bool {
        self.cut_vertices.get(node.0).is_some_and(|b| *b)
    }

    /// The distinct nodes of a block, in first-seen order.
    pub fn block_nodes<E, V>(&self, graph: &HedgeGraph<E, V>, block: usize) -> Vec<NodeIndex> {
        let mut seen = AHashSet::new();
        let mut nodes = Vec::new();
        for &e in &self.blocks[block] {
            let (s, t) = graph.endpoints(e);
            for n in [s, t] {
                if seen.insert(n) {
                    nodes.push(n);
                }
            }
        }
        nodes
    }
}

struct Frame {
    node: NodeIndex,
    via: Option<EdgeIndex>,
    crown: Vec<Hedge>,
    pos: usize,
}

impl<E, V> HedgeGraph<E, V> {
    /// Hopcroft–Tarjan block decomposition with an explicit stack.
    ///
    /// Isolated nodes belong to no block. Self-loops are skipped.
    pub fn biconnected_components(&self) -> BlockDecomposition {
        self.biconnected_components_without(None)
    }

    pub(crate) fn biconnected_components_without(
        &self,
        excluded: Option<NodeIndex>,
    ) -> BlockDecomposition {
        const UNSEEN: usize = usize::MAX;
        let bound = self.node_bound();
        let mut disc = vec![UNSEEN; bound];
        let mut low = vec![UNSEEN; bound];
        let mut cut_vertices: BitVec = BitVec::repeat(false, bound);
        let mut blocks = Vec::new();
        let mut edge_stack: Vec<EdgeIndex> = Vec::new();
        let mut time = 0;

        if let Some(x) = excluded {
            disc[x.0] = 0;
        }

        for root in self.iter_node_ids() {
            if disc[root.0] != UNSEEN || Some(root) == excluded {
                continue;
            }
            disc[root.0] = time;
            low[root.0] = time;
            time += 1;
            let mut root_children = 0;
            let mut stack = vec![Frame {
                node: root,
                via: None,
                crown: self.iter_crown(root).collect(),
                pos: 0,
            }];

            while let Some(frame) = stack.last_mut() {
                let v = frame.node;
                if frame.pos < frame.crown.len() {
                    let h = frame.crown[frame.pos];
                    frame.pos += 1;
                    let e = self.edge_id(h);
                    let w = self.opposite(h);
                    if Some(e) == frame.via || w == v || Some(w) == excluded {
                        continue;
                    }
                    if disc[w.0] == UNSEEN {
                        edge_stack.push(e);
                        disc[w.0] = time;
                        low[w.0] = time;
                        time += 1;
                        if v == root {
                            root_children += 1;
                        }
                        stack.push(Frame {
                            node: w,
                            via: Some(e),
                            crown: self.iter_crown(w).collect(),
                            pos: 0,
                        });
                    } else if disc[w.0] < disc[v.0] {
                        edge_stack.push(e);
                        low[v.0] = low[v.0].min(disc[w.0]);
                    }
                    continue;
                }

                let Some(done) = stack.pop() else { break };
                let Some(parent) = stack.last() else { break };
                let p = parent.node;
                low[p.0] = low[p.0].min(low[done.node.0]);
                if low[done.node.0] >= disc[p.0] {
                    if p != root {
                        cut_vertices.set(p.0, true);
                    }
                    let mut block = Vec::new();
                    while let Some(e) = edge_stack.pop() {
                        block.push(e);
                        if Some(e) == done.via {
                            break;
                        }
                    }
                    blocks.push(block);
                }
            }
            if root_children > 1 {
                cut_vertices.set(root.0, true);
            }
        }

        BlockDecomposition {
            blocks,
            cut_vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::half_edge::{builder::HedgeGraphBuilder, test_graphs::TestGraph, NodeIndex};

    #[test]
    fn two_triangles_sharing_a_vertex() {
        let mut builder: HedgeGraphBuilder<(), ()> = HedgeGraphBuilder::new();
        let n: Vec<_> = (0..5).map(|_| builder.add_node(())).collect();
        for (a, b) in [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)] {
            builder.add_edge(n[a], n[b], ());
        }
        let graph = builder.build();

        let blocks = graph.biconnected_components();
        assert_eq!(blocks.blocks.len(), 2);
        assert!(blocks.blocks.iter().all(|b| b.len() == 3));
        assert!(blocks.is_cut_vertex(NodeIndex(2)));
        assert_eq!(blocks.cut_vertices.count_ones(), 1);
        assert!(!blocks.is_biconnected());
    }

    #[test]
    fn bridges_are_blocks_and_parallel_edges_are_cycles() {
        let mut graph = TestGraph::Path(4).graph();
        let blocks = graph.biconnected_components();
        assert_eq!(blocks.blocks.len(), 3);
        assert_eq!(blocks.cut_vertices.count_ones(), 2);

        graph.add_edge(NodeIndex(0), NodeIndex(1), ()).unwrap();
        let blocks = graph.biconnected_components();
        assert_eq!(blocks.blocks.len(), 3);
        assert!(blocks.blocks.iter().any(|b| b.len() == 2));
    }

    #[test]
    fn catalogue_blocks_cover_every_edge() {
        for test_graph in [
            TestGraph::Petersen,
            TestGraph::Complete(5),
            TestGraph::Grid(3, 4),
            TestGraph::Wheel(6),
        ] {
            let graph = test_graph.graph();
            let blocks = graph.biconnected_components();
            assert!(blocks.is_biconnected(), "{test_graph}");
            assert_eq!(blocks.blocks[0].len(), graph.n_edges(), "{test_graph}");
            assert_eq!(blocks.block_nodes(&graph, 0).len(), graph.n_nodes());
        }
    }
}
