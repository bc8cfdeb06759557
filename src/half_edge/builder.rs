use super::{involution::EdgeIndex, Corner, HedgeGraph, NodeIndex};

#[derive(Clone, Debug)]
struct EdgeBuilder<E> {
    source: NodeIndex,
    sink: NodeIndex,
    data: E,
}

/// Collects nodes and edges and builds a [`HedgeGraph`] in one go.
///
/// Rotations follow insertion order: the hedges around a node appear in the order their
/// edges were added.
#[derive(Clone, Debug)]
pub struct HedgeGraphBuilder<E, V> {
    nodes: Vec<V>,
    edges: Vec<EdgeBuilder<E>>,
}

impl<E, V> HedgeGraphBuilder<E, V> {
    pub fn new() -> Self {
        HedgeGraphBuilder {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn build(self) -> HedgeGraph<E, V> {
        self.into()
    }

    pub fn add_node(&mut self, data: V) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(data);
        NodeIndex(index)
    }

    /// Adds an edge between two nodes already added to the builder.
    ///
    /// # Panics
    ///
    /// If either endpoint was not returned by [`HedgeGraphBuilder::add_node`].
    pub fn add_edge(&mut self, source: NodeIndex, sink: NodeIndex, data: E) -> EdgeIndex {
        assert!(
            source.0 < self.nodes.len() && sink.0 < self.nodes.len(),
            "edge ({source}, {sink}) refers to a node that was never added"
        );
        let index = EdgeIndex(self.edges.len());
        self.edges.push(EdgeBuilder { source, sink, data });
        index
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }
}

impl<E, V> Default for HedgeGraphBuilder<E, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, V> From<HedgeGraphBuilder<E, V>> for HedgeGraph<E, V> {
    fn from(builder: HedgeGraphBuilder<E, V>) -> Self {
        let mut graph = HedgeGraph::with_capacity(builder.nodes.len(), builder.edges.len());
        for data in builder.nodes {
            graph.add_node(data);
        }
        for EdgeBuilder { source, sink, data } in builder.edges {
            graph.push_edge(Corner::Node(source), Corner::Node(sink), data);
        }
        graph
    }
}
