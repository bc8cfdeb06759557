//! The planarized graph with its provenance.
//!
//! A [`PlanarRepresentation`] starts as a copy of the original graph (same node and edge
//! indices) with the deleted edges removed and a planar rotation system. Reinserting an
//! original edge subdivides the representation edges it crosses, so every original edge
//! ends up as a chain of representation edges, oriented from its source to its sink,
//! joined at degree-four crossing nodes.

use indexmap::IndexSet;
use tracing::trace;

use super::{check_loopless, Embedder, PlanarizationError, Precondition};
use crate::half_edge::{
    embedding::CombinatorialEmbedding, involution::EdgeIndex, Corner, HedgeGraph, NodeIndex,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RepNode {
    Original(NodeIndex),
    /// Where the chains of two original edges cross.
    Crossing { crossed: [EdgeIndex; 2] },
}

impl RepNode {
    pub fn is_crossing(&self) -> bool {
        matches!(self, RepNode::Crossing { .. })
    }
}

/// A piece of the chain of `original`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RepEdge {
    pub original: EdgeIndex,
}

#[derive(Debug)]
pub struct PlanarRepresentation<'g, E, V> {
    original: &'g HedgeGraph<E, V>,
    graph: HedgeGraph<RepEdge, RepNode>,
    embedding: CombinatorialEmbedding,
    chains: Vec<Vec<EdgeIndex>>,
}

impl<E, V> Clone for PlanarRepresentation<'_, E, V> {
    fn clone(&self) -> Self {
        PlanarRepresentation {
            original: self.original,
            graph: self.graph.clone(),
            embedding: self.embedding.clone(),
            chains: self.chains.clone(),
        }
    }
}

impl<'g, E, V> PlanarRepresentation<'g, E, V> {
    /// Copies `original` without the `deleted` edges and embeds the rest with `embedder`.
    pub fn new<M: Embedder>(
        original: &'g HedgeGraph<E, V>,
        deleted: &IndexSet<EdgeIndex>,
        embedder: &M,
    ) -> Result<Self, PlanarizationError> {
        check_loopless(original)?;
        let mut graph = original.map_data_ref(
            |n, _| RepNode::Original(n),
            |e, _| RepEdge { original: e },
        );
        for &e in deleted {
            if !original.is_live_edge(e) {
                return Err(Precondition::UnknownEdge(e).into());
            }
            graph.remove_edge(e)?;
        }
        embedder.embed(&mut graph)?;
        let embedding = CombinatorialEmbedding::from_rotation(&graph);

        let chains = (0..original.edge_bound())
            .map(|i| {
                let e = EdgeIndex(i);
                if graph.is_live_edge(e) {
                    vec![e]
                } else {
                    Vec::new()
                }
            })
            .collect();

        Ok(PlanarRepresentation {
            original,
            graph,
            embedding,
            chains,
        })
    }

    pub fn original(&self) -> &'g HedgeGraph<E, V> {
        self.original
    }

    pub fn graph(&self) -> &HedgeGraph<RepEdge, RepNode> {
        &self.graph
    }

    pub fn embedding(&self) -> &CombinatorialEmbedding {
        &self.embedding
    }

    /// The original node behind a representation node; `None` for crossings.
    pub fn original_node(&self, node: NodeIndex) -> Option<NodeIndex> {
        match self.graph[node] {
            RepNode::Original(n) => Some(n),
            RepNode::Crossing { .. } => None,
        }
    }

    /// The representation node of an original node. Both share their index.
    pub fn rep_node(&self, node: NodeIndex) -> Result<NodeIndex, PlanarizationError> {
        if self.original.is_live_node(node) {
            Ok(node)
        } else {
            Err(Precondition::UnknownNode(node).into())
        }
    }

    pub fn original_edge(&self, edge: EdgeIndex) -> EdgeIndex {
        self.graph[edge].original
    }

    /// Representation edges of `original`, from its source to its sink. Empty while the
    /// edge is not part of the representation.
    pub fn chain(&self, original: EdgeIndex) -> &[EdgeIndex] {
        self.chains
            .get(original.0)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains_edge(&self, original: EdgeIndex) -> bool {
        !self.chain(original).is_empty()
    }

    /// Original edges currently in the representation.
    pub fn edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.chains
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_empty())
            .map(|(i, _)| EdgeIndex(i))
    }

    pub fn crossing_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .iter_nodes()
            .filter(|(_, data)| data.is_crossing())
            .map(|(n, _)| n)
    }

    pub fn number_of_crossings(&self) -> usize {
        self.crossing_nodes().count()
    }

    /// The original edges crossed by `original`, in chain order.
    pub fn crossed_by(&self, original: EdgeIndex) -> Vec<EdgeIndex> {
        let chain = self.chain(original);
        chain
            .iter()
            .skip(1)
            .filter_map(|&e| {
                let (x, _) = self.graph.endpoints(e);
                match self.graph[x] {
                    RepNode::Crossing { crossed } => {
                        crossed.into_iter().find(|c| *c != original)
                    }
                    RepNode::Original(_) => None,
                }
            })
            .collect()
    }

    /// Splits `rep_edge` for the chain of `inserting`, which crosses it there.
    ///
    /// The new crossing node is returned; the crossed chain grows by one edge.
    pub fn expand_crossing(
        &mut self,
        inserting: EdgeIndex,
        rep_edge: EdgeIndex,
    ) -> Result<NodeIndex, PlanarizationError> {
        self.graph.check_edge(rep_edge)?;
        let crossed = self.original_edge(rep_edge);
        let (x, tail) = self.embedding.split_edge(
            &mut self.graph,
            rep_edge,
            RepNode::Crossing {
                crossed: [crossed, inserting],
            },
            RepEdge { original: crossed },
        )?;
        let chain = &mut self.chains[crossed.0];
        let at = chain
            .iter()
            .position(|e| *e == rep_edge)
            .map_or(chain.len(), |p| p + 1);
        chain.insert(at, tail);
        trace!(%crossed, %inserting, node = %x, "expanded crossing");
        Ok(x)
    }

    /// Appends a representation edge between two corners to the chain of `original`.
    ///
    /// The first segment of a chain takes over the slot of `original`.
    pub(crate) fn push_segment(
        &mut self,
        original: EdgeIndex,
        source: Corner,
        sink: Corner,
    ) -> Result<EdgeIndex, PlanarizationError> {
        let data = RepEdge { original };
        let e = if self.chains[original.0].is_empty() && !self.graph.is_live_edge(original) {
            self.embedding
                .reinsert_edge(&mut self.graph, original, source, sink, data)?;
            original
        } else {
            self.embedding
                .insert_edge(&mut self.graph, source, sink, data)?
        };
        self.chains[original.0].push(e);
        Ok(e)
    }

    /// Takes `original` out of the representation and dissolves every crossing on it.
    ///
    /// Returns the number of crossings removed.
    pub fn remove_edge_path(&mut self, original: EdgeIndex) -> Result<usize, PlanarizationError> {
        let chain = std::mem::take(
            self.chains
                .get_mut(original.0)
                .ok_or(Precondition::UnknownEdge(original))?,
        );
        let mut crossings = Vec::with_capacity(chain.len().saturating_sub(1));
        for (i, &e) in chain.iter().enumerate() {
            if i > 0 {
                crossings.push(self.graph.endpoints(e).0);
            }
            self.embedding.remove_edge(&mut self.graph, e)?;
        }
        for &x in &crossings {
            let unsplit = self.embedding.unsplit(&mut self.graph, x)?;
            let other = self.original_edge(unsplit.kept);
            self.chains[other.0].retain(|e| *e != unsplit.removed);
        }
        Ok(crossings.len())
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;
    use crate::{
        half_edge::test_graphs::TestGraph,
        planarity::PathAdditionEmbedder,
    };

    #[test]
    fn a_planar_graph_is_copied_with_its_indices() {
        let graph = TestGraph::Grid(3, 3).graph();
        let rep = PlanarRepresentation::new(&graph, &IndexSet::new(), &PathAdditionEmbedder)
            .unwrap();
        assert_eq!(rep.graph().n_nodes(), 9);
        assert_eq!(rep.number_of_crossings(), 0);
        for e in graph.iter_edge_ids() {
            assert_eq!(rep.chain(e), &[e]);
            assert_eq!(rep.graph().endpoints(e), graph.endpoints(e));
        }
        assert_eq!(rep.original_node(NodeIndex(4)), Some(NodeIndex(4)));
        rep.embedding().genus_check(rep.graph()).unwrap();
    }

    #[test]
    fn crossings_are_chained_and_dissolved() {
        let graph = TestGraph::Cycle(4).graph();
        let mut rep =
            PlanarRepresentation::new(&graph, &IndexSet::new(), &PathAdditionEmbedder).unwrap();
        let (nodes, edges) = (rep.graph().n_nodes(), rep.graph().n_edges());

        // pretend an edge with id 0 runs across edge 2 twice
        let x = rep.expand_crossing(EdgeIndex(0), EdgeIndex(2)).unwrap();
        let tail = rep.chain(EdgeIndex(2))[1];
        let y = rep.expand_crossing(EdgeIndex(0), tail).unwrap();
        assert_eq!(rep.number_of_crossings(), 2);
        assert_eq!(rep.chain(EdgeIndex(2)).len(), 3);
        assert_eq!(rep.original_node(x), None);

        let chain = rep.chain(EdgeIndex(2)).to_vec();
        let (s, t) = graph.endpoints(EdgeIndex(2));
        assert_eq!(rep.graph().endpoints(chain[0]), (s, x));
        assert_eq!(rep.graph().endpoints(chain[1]), (x, y));
        assert_eq!(rep.graph().endpoints(chain[2]), (y, t));
        rep.embedding().check(rep.graph()).unwrap();

        // dissolving needs the crossing nodes back at degree two
        for n in [x, y] {
            let unsplit = rep.embedding.unsplit(&mut rep.graph, n).unwrap();
            rep.chains[2].retain(|e| *e != unsplit.removed);
        }
        assert_eq!(rep.chain(EdgeIndex(2)), &[EdgeIndex(2)]);
        assert_eq!((rep.graph().n_nodes(), rep.graph().n_edges()), (nodes, edges));
        assert_eq!(rep.graph().endpoints(EdgeIndex(2)), (s, t));
    }

    #[test]
    fn removing_a_path_restores_the_counts() {
        let graph = TestGraph::Cycle(4).graph();
        let mut rep =
            PlanarRepresentation::new(&graph, &IndexSet::new(), &PathAdditionEmbedder).unwrap();
        let before = (rep.graph().n_nodes(), rep.graph().n_edges());

        let x = rep.expand_crossing(EdgeIndex(1), EdgeIndex(3)).unwrap();
        let chain = rep.chain(EdgeIndex(3)).to_vec();
        // route a fake second copy of edge 1 through x: both faces of edge 3 meet there
        let faces: Vec<_> = rep
            .embedding()
            .corners(rep.graph(), x)
            .map(|(_, f)| f)
            .collect();
        assert_eq!(faces.len(), 2);
        rep.chains[1].clear();
        let (u, v) = graph.endpoints(EdgeIndex(1));
        let corner = |rep: &PlanarRepresentation<'_, (), ()>, n: NodeIndex, f| {
            Corner::Before(rep.embedding().corner(rep.graph(), n, f).unwrap())
        };
        let face_u = rep
            .embedding()
            .corners(rep.graph(), u)
            .map(|(_, f)| f)
            .find(|f| faces.contains(f))
            .unwrap();
        let face_v = faces.iter().copied().find(|f| *f != face_u).unwrap();
        let (a, b) = (corner(&rep, u, face_u), corner(&rep, x, face_u));
        rep.push_segment(EdgeIndex(1), a, b).unwrap();
        let (a, b) = (corner(&rep, x, face_v), corner(&rep, v, face_v));
        rep.push_segment(EdgeIndex(1), a, b).unwrap();
        rep.embedding().check(rep.graph()).unwrap();
        rep.embedding().genus_check(rep.graph()).unwrap();
        assert_eq!(rep.crossed_by(EdgeIndex(1)), vec![EdgeIndex(3)]);
        assert_eq!(rep.crossed_by(EdgeIndex(3)), vec![EdgeIndex(1)]);
        assert_eq!(chain.len(), 2);

        assert_eq!(rep.remove_edge_path(EdgeIndex(1)).unwrap(), 1);
        assert_eq!(rep.number_of_crossings(), 0);
        assert_eq!(rep.chain(EdgeIndex(3)), &[EdgeIndex(3)]);
        assert!(!rep.contains_edge(EdgeIndex(1)));
        assert_eq!((rep.graph().n_nodes(), rep.graph().n_edges()), before);
        rep.embedding().check(rep.graph()).unwrap();
    }
}
