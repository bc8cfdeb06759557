use std::fmt::{Display, Write};
use std::ops::{Index, IndexMut};

use bitvec::vec::BitVec;
use derive_more::{From, Into};
use thiserror::Error;

pub mod algorithms;
pub mod builder;
pub mod embedding;
pub mod involution;
pub mod typed_vec;

use involution::{EdgeIndex, Flow, Hedge, HedgePair, Involution};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, From, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeIndex(pub usize);

impl Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position in a rotation where a new hedge can be spliced in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Immediately before the given hedge, in the rotation of the node it leaves.
    Before(Hedge),
    /// Anywhere at the node. For a node without hedges this is the only choice.
    Node(NodeIndex),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HedgeGraphError {
    #[error("Node {0} does not exist or was removed")]
    DeadNode(NodeIndex),
    #[error("Edge {0} does not exist or was removed")]
    DeadEdge(EdgeIndex),
    #[error("Edge {0} is live or was never allocated, so it cannot be revived")]
    LiveEdge(EdgeIndex),
    #[error("Hedge {0} does not belong to a live edge")]
    DeadHedge(Hedge),
    #[error("Node {node} has degree {degree}, expected {expected}")]
    WrongDegree {
        node: NodeIndex,
        degree: usize,
        expected: usize,
    },
    #[error("Edge {edge} is a self-loop at node {node}")]
    SelfLoop { edge: EdgeIndex, node: NodeIndex },
    #[error("The given rotation is not a reordering of the hedges around node {0}")]
    RotationMismatch(NodeIndex),
}

/// Outcome of [`HedgeGraph::unsplit`]: `kept` now spans both former edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unsplit {
    pub kept: EdgeIndex,
    pub removed: EdgeIndex,
}

/// An undirected multigraph stored as half-edges with a rotation system.
///
/// Every node keeps its hedges in a cyclic order (its rotation). The rotation is stored
/// as successor/predecessor arrays over hedges, so splicing a hedge in or out is O(1).
/// Removed nodes and edges leave tombstones behind so that indices stay stable.
#[derive(Clone, Debug)]
pub struct HedgeGraph<E, V> {
    involution: Involution,        // pairing of hedges into edges
    hedge_node: Vec<NodeIndex>,    // node each hedge leaves from
    rot_next: Vec<Hedge>,          // cyclic successor in the rotation
    rot_prev: Vec<Hedge>,          // cyclic predecessor in the rotation
    anchor: Vec<Option<Hedge>>,    // some hedge of each node
    degree: Vec<usize>,            // same length as node_data
    node_data: Vec<V>,
    edge_data: Vec<E>,
    live_nodes: BitVec,
    live_edges: BitVec,
    n_live_nodes: usize,
    n_live_edges: usize,
}

impl<E, V> Default for HedgeGraph<E, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, V> HedgeGraph<E, V> {
    pub fn new() -> Self {
        HedgeGraph {
            involution: Involution::new(),
            hedge_node: Vec::new(),
            rot_next: Vec::new(),
            rot_prev: Vec::new(),
            anchor: Vec::new(),
            degree: Vec::new(),
            node_data: Vec::new(),
            edge_data: Vec::new(),
            live_nodes: BitVec::new(),
            live_edges: BitVec::new(),
            n_live_nodes: 0,
            n_live_edges: 0,
        }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        HedgeGraph {
            involution: Involution::with_capacity(edges),
            hedge_node: Vec::with_capacity(2 * edges),
            rot_next: Vec::with_capacity(2 * edges),
            rot_prev: Vec::with_capacity(2 * edges),
            anchor: Vec::with_capacity(nodes),
            degree: Vec::with_capacity(nodes),
            node_data: Vec::with_capacity(nodes),
            edge_data: Vec::with_capacity(edges),
            live_nodes: BitVec::with_capacity(nodes),
            live_edges: BitVec::with_capacity(edges),
            n_live_nodes: 0,
            n_live_edges: 0,
        }
    }

    // ---------------------------------------------------------------------------------
    // Sizes and liveness
    // ---------------------------------------------------------------------------------

    /// Number of live nodes.
    pub fn n_nodes(&self) -> usize {
        self.n_live_nodes
    }

    /// Number of live edges.
    pub fn n_edges(&self) -> usize {
        self.n_live_edges
    }

    /// One past the largest node index ever handed out.
    pub fn node_bound(&self) -> usize {
        self.node_data.len()
    }

    /// One past the largest edge index ever handed out.
    pub fn edge_bound(&self) -> usize {
        self.edge_data.len()
    }

    /// One past the largest hedge index ever handed out.
    pub fn hedge_bound(&self) -> usize {
        self.involution.len()
    }

    pub fn is_live_node(&self, node: NodeIndex) -> bool {
        self.live_nodes.get(node.0).is_some_and(|b| *b)
    }

    pub fn is_live_edge(&self, edge: EdgeIndex) -> bool {
        self.live_edges.get(edge.0).is_some_and(|b| *b)
    }

    pub fn is_live_hedge(&self, hedge: Hedge) -> bool {
        hedge.0 < self.hedge_bound() && self.is_live_edge(self.edge_id(hedge))
    }

    pub fn check_node(&self, node: NodeIndex) -> Result<(), HedgeGraphError> {
        if self.is_live_node(node) {
            Ok(())
        } else {
            Err(HedgeGraphError::DeadNode(node))
        }
    }

    pub fn check_edge(&self, edge: EdgeIndex) -> Result<(), HedgeGraphError> {
        if self.is_live_edge(edge) {
            Ok(())
        } else {
            Err(HedgeGraphError::DeadEdge(edge))
        }
    }

    pub fn check_hedge(&self, hedge: Hedge) -> Result<(), HedgeGraphError> {
        if self.is_live_hedge(hedge) {
            Ok(())
        } else {
            Err(HedgeGraphError::DeadHedge(hedge))
        }
    }

    // ---------------------------------------------------------------------------------
    // Iteration
    // ---------------------------------------------------------------------------------

    pub fn iter_node_ids(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.live_nodes.iter_ones().map(NodeIndex)
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeIndex, &V)> + '_ {
        self.live_nodes
            .iter_ones()
            .map(|i| (NodeIndex(i), &self.node_data[i]))
    }

    pub fn iter_edge_ids(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.live_edges.iter_ones().map(EdgeIndex)
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = (EdgeIndex, HedgePair, &E)> + '_ {
        self.live_edges.iter_ones().map(|i| {
            let e = EdgeIndex(i);
            (e, self.involution.hedge_pair(e), &self.edge_data[i])
        })
    }

    /// Live hedges, in index order.
    pub fn iter_hedges(&self) -> impl Iterator<Item = Hedge> + '_ {
        self.live_edges.iter_ones().flat_map(|i| [Hedge(2 * i), Hedge(2 * i + 1)])
    }

    /// The hedges around `node`, in rotation order, starting at its anchor.
    pub fn iter_crown(&self, node: NodeIndex) -> CrownIter<'_, E, V> {
        let first = self.anchor.get(node.0).copied().flatten();
        CrownIter {
            graph: self,
            first,
            next: first,
        }
    }

    /// Neighbouring nodes in rotation order (with repetitions for parallel edges).
    pub fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.iter_crown(node).map(|h| self.opposite(h))
    }

    pub fn rotation(&self, node: NodeIndex) -> Vec<Hedge> {
        self.iter_crown(node).collect()
    }

    // ---------------------------------------------------------------------------------
    // Local structure
    // ---------------------------------------------------------------------------------

    pub fn involution(&self) -> &Involution {
        &self.involution
    }

    /// The twin of `hedge`.
    pub fn inv(&self, hedge: Hedge) -> Hedge {
        self.involution.inv(hedge)
    }

    pub fn edge_id(&self, hedge: Hedge) -> EdgeIndex {
        self.involution.edge_id(hedge)
    }

    pub fn flow(&self, hedge: Hedge) -> Flow {
        self.involution.flow(hedge)
    }

    pub fn hedge_pair(&self, edge: EdgeIndex) -> HedgePair {
        self.involution.hedge_pair(edge)
    }

    /// The node `hedge` leaves from.
    pub fn node_id(&self, hedge: Hedge) -> NodeIndex {
        self.hedge_node[hedge.0]
    }

    /// The node at the other end of `hedge`.
    pub fn opposite(&self, hedge: Hedge) -> NodeIndex {
        self.node_id(self.inv(hedge))
    }

    /// (source, sink) nodes of an edge.
    pub fn endpoints(&self, edge: EdgeIndex) -> (NodeIndex, NodeIndex) {
        let pair = self.hedge_pair(edge);
        (self.node_id(pair.source), self.node_id(pair.sink))
    }

    pub fn is_self_loop(&self, edge: EdgeIndex) -> bool {
        let (s, t) = self.endpoints(edge);
        s == t
    }

    pub fn find_self_loop(&self) -> Option<EdgeIndex> {
        self.iter_edge_ids().find(|e| self.is_self_loop(*e))
    }

    /// The hedge of `edge` leaving `node`, if `edge` is incident to it.
    pub fn hedge_at(&self, edge: EdgeIndex, node: NodeIndex) -> Option<Hedge> {
        let pair = self.hedge_pair(edge);
        if self.node_id(pair.source) == node {
            Some(pair.source)
        } else if self.node_id(pair.sink) == node {
            Some(pair.sink)
        } else {
            None
        }
    }

    pub fn rot_next(&self, hedge: Hedge) -> Hedge {
        self.rot_next[hedge.0]
    }

    pub fn rot_prev(&self, hedge: Hedge) -> Hedge {
        self.rot_prev[hedge.0]
    }

    /// Successor of `hedge` on the boundary walk of its left face.
    pub fn face_next(&self, hedge: Hedge) -> Hedge {
        self.rot_next(self.inv(hedge))
    }

    /// Predecessor of `hedge` on the boundary walk of its left face.
    pub fn face_prev(&self, hedge: Hedge) -> Hedge {
        self.inv(self.rot_prev(hedge))
    }

    pub fn degree(&self, node: NodeIndex) -> usize {
        self.degree[node.0]
    }

    pub fn anchor(&self, node: NodeIndex) -> Option<Hedge> {
        self.anchor[node.0]
    }

    // ---------------------------------------------------------------------------------
    // Rotation splicing
    // ---------------------------------------------------------------------------------

    fn push_hedge_slots(&mut self, pair: HedgePair) {
        for h in [pair.source, pair.sink] {
            debug_assert_eq!(h.0, self.rot_next.len());
            self.rot_next.push(h);
            self.rot_prev.push(h);
            self.hedge_node.push(NodeIndex(usize::MAX));
        }
    }

    /// Splices the unlinked hedge `new` in right before `before`.
    fn link_before(&mut self, new: Hedge, before: Hedge) {
        let node = self.hedge_node[before.0];
        let prev = self.rot_prev[before.0];
        self.rot_next[prev.0] = new;
        self.rot_prev[new.0] = prev;
        self.rot_next[new.0] = before;
        self.rot_prev[before.0] = new;
        self.hedge_node[new.0] = node;
        self.degree[node.0] += 1;
    }

    /// Splices the unlinked hedge `new` in as the last hedge of `node`.
    fn link_at_node(&mut self, new: Hedge, node: NodeIndex) {
        match self.anchor[node.0] {
            Some(anchor) => self.link_before(new, anchor),
            None => {
                self.rot_next[new.0] = new;
                self.rot_prev[new.0] = new;
                self.hedge_node[new.0] = node;
                self.anchor[node.0] = Some(new);
                self.degree[node.0] += 1;
            }
        }
    }

    fn link(&mut self, new: Hedge, corner: Corner) {
        match corner {
            Corner::Before(before) => self.link_before(new, before),
            Corner::Node(node) => self.link_at_node(new, node),
        }
    }

    /// Takes `hedge` out of its rotation. Its node id is left untouched.
    fn unlink(&mut self, hedge: Hedge) {
        let node = self.hedge_node[hedge.0];
        if self.degree[node.0] == 1 {
            self.anchor[node.0] = None;
        } else {
            let prev = self.rot_prev[hedge.0];
            let next = self.rot_next[hedge.0];
            self.rot_next[prev.0] = next;
            self.rot_prev[next.0] = prev;
            if self.anchor[node.0] == Some(hedge) {
                self.anchor[node.0] = Some(next);
            }
        }
        self.rot_next[hedge.0] = hedge;
        self.rot_prev[hedge.0] = hedge;
        self.degree[node.0] -= 1;
    }

    /// Puts the unlinked hedge `new` exactly where `old` sits, unlinking `old`.
    fn replace_in_rotation(&mut self, old: Hedge, new: Hedge) {
        let node = self.hedge_node[old.0];
        if self.rot_next[old.0] == old {
            self.rot_next[new.0] = new;
            self.rot_prev[new.0] = new;
        } else {
            let prev = self.rot_prev[old.0];
            let next = self.rot_next[old.0];
            self.rot_next[prev.0] = new;
            self.rot_prev[next.0] = new;
            self.rot_next[new.0] = next;
            self.rot_prev[new.0] = prev;
        }
        if self.anchor[node.0] == Some(old) {
            self.anchor[node.0] = Some(new);
        }
        self.hedge_node[new.0] = node;
        self.rot_next[old.0] = old;
        self.rot_prev[old.0] = old;
    }

    fn check_corner(&self, corner: Corner) -> Result<(), HedgeGraphError> {
        match corner {
            Corner::Before(h) => self.check_hedge(h),
            Corner::Node(n) => self.check_node(n),
        }
    }

    // ---------------------------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------------------------

    pub fn add_node(&mut self, data: V) -> NodeIndex {
        let index = NodeIndex(self.node_data.len());
        self.node_data.push(data);
        self.anchor.push(None);
        self.degree.push(0);
        self.live_nodes.push(true);
        self.n_live_nodes += 1;
        index
    }

    /// Adds an edge appended at the end of both rotations.
    pub fn add_edge(
        &mut self,
        source: NodeIndex,
        sink: NodeIndex,
        data: E,
    ) -> Result<EdgeIndex, HedgeGraphError> {
        self.add_edge_at(Corner::Node(source), Corner::Node(sink), data)
    }

    /// Adds an edge whose hedges are spliced into the given corners.
    pub fn add_edge_at(
        &mut self,
        source: Corner,
        sink: Corner,
        data: E,
    ) -> Result<EdgeIndex, HedgeGraphError> {
        self.check_corner(source)?;
        self.check_corner(sink)?;
        Ok(self.push_edge(source, sink, data))
    }

    /// Brings the removed `edge` back with fresh data, its hedges spliced into the given
    /// corners. The index is reused, so nothing is allocated.
    pub fn revive_edge_at(
        &mut self,
        edge: EdgeIndex,
        source: Corner,
        sink: Corner,
        data: E,
    ) -> Result<(), HedgeGraphError> {
        if edge.0 >= self.edge_bound() || self.is_live_edge(edge) {
            return Err(HedgeGraphError::LiveEdge(edge));
        }
        self.check_corner(source)?;
        self.check_corner(sink)?;
        let pair = self.hedge_pair(edge);
        self.edge_data[edge.0] = data;
        self.live_edges.set(edge.0, true);
        self.n_live_edges += 1;
        self.link(pair.source, source);
        self.link(pair.sink, sink);
        Ok(())
    }

    fn push_edge(&mut self, source: Corner, sink: Corner, data: E) -> EdgeIndex {
        let (edge, pair) = self.involution.add_pair();
        self.push_hedge_slots(pair);
        self.edge_data.push(data);
        self.live_edges.push(true);
        self.n_live_edges += 1;
        self.link(pair.source, source);
        self.link(pair.sink, sink);
        edge
    }

    /// Subdivides `edge = (u, v)` with a new node `x`.
    ///
    /// `edge` becomes `(u, x)` and keeps its source hedge in place at `u`; the new edge
    /// `(x, v)` takes the old sink hedge's place in the rotation of `v`. The rotation of
    /// `x` is `[sink of edge, source of new edge]`.
    pub fn split_edge(
        &mut self,
        edge: EdgeIndex,
        node_data: V,
        edge_data: E,
    ) -> Result<(NodeIndex, EdgeIndex), HedgeGraphError> {
        self.check_edge(edge)?;
        let old = self.hedge_pair(edge);
        let x = self.add_node(node_data);
        let (new_edge, new) = self.involution.add_pair();
        self.push_hedge_slots(new);
        self.edge_data.push(edge_data);
        self.live_edges.push(true);
        self.n_live_edges += 1;

        self.replace_in_rotation(old.sink, new.sink);
        self.link_at_node(old.sink, x);
        self.link_at_node(new.source, x);
        Ok((x, new_edge))
    }

    /// The two hedges at the degree-2 `node` as `(kept, removed)` for
    /// [`HedgeGraph::unsplit`]. The kept one enters `node` whenever one of them does, so
    /// unsplitting undoes [`HedgeGraph::split_edge`] exactly.
    pub fn unsplit_hedges(&self, node: NodeIndex) -> Result<(Hedge, Hedge), HedgeGraphError> {
        self.check_node(node)?;
        let degree = self.degree(node);
        let (Some(a), 2) = (self.anchor(node), degree) else {
            return Err(HedgeGraphError::WrongDegree {
                node,
                degree,
                expected: 2,
            });
        };
        let b = self.rot_next(a);
        if self.flow(a) == Flow::Source && self.flow(b) == Flow::Sink {
            Ok((b, a))
        } else {
            Ok((a, b))
        }
    }

    /// Inverse of [`HedgeGraph::split_edge`]: removes the degree-2 `node`, joining its
    /// two edges into one. The kept edge keeps its hedge at the far end in place and its
    /// hedge at `node` takes the place of the removed edge's far hedge.
    pub fn unsplit(&mut self, node: NodeIndex) -> Result<Unsplit, HedgeGraphError> {
        let (a, b) = self.unsplit_hedges(node)?;
        let kept = self.edge_id(a);
        let removed = self.edge_id(b);
        if kept == removed {
            return Err(HedgeGraphError::SelfLoop { edge: kept, node });
        }
        let far = self.inv(b);

        self.unlink(a);
        self.replace_in_rotation(far, a);
        self.unlink(b);
        self.kill_edge(removed);
        self.kill_node(node);
        Ok(Unsplit { kept, removed })
    }

    pub fn remove_edge(&mut self, edge: EdgeIndex) -> Result<(), HedgeGraphError> {
        self.check_edge(edge)?;
        let pair = self.hedge_pair(edge);
        self.unlink(pair.source);
        self.unlink(pair.sink);
        self.kill_edge(edge);
        Ok(())
    }

    /// Removes an isolated node.
    pub fn remove_node(&mut self, node: NodeIndex) -> Result<(), HedgeGraphError> {
        self.check_node(node)?;
        let degree = self.degree(node);
        if degree != 0 {
            return Err(HedgeGraphError::WrongDegree {
                node,
                degree,
                expected: 0,
            });
        }
        self.kill_node(node);
        Ok(())
    }

    fn kill_edge(&mut self, edge: EdgeIndex) {
        self.live_edges.set(edge.0, false);
        self.n_live_edges -= 1;
    }

    fn kill_node(&mut self, node: NodeIndex) {
        self.anchor[node.0] = None;
        self.degree[node.0] = 0;
        self.live_nodes.set(node.0, false);
        self.n_live_nodes -= 1;
    }

    /// Reorders the rotation of `node`. `order` must contain exactly the hedges of `node`.
    pub fn set_rotation(&mut self, node: NodeIndex, order: &[Hedge]) -> Result<(), HedgeGraphError> {
        self.check_node(node)?;
        if order.len() != self.degree(node)
            || order.iter().any(|h| !self.is_live_hedge(*h) || self.node_id(*h) != node)
        {
            return Err(HedgeGraphError::RotationMismatch(node));
        }
        let mut seen = BitVec::<usize>::repeat(false, self.hedge_bound());
        for h in order {
            if seen.replace(h.0, true) {
                return Err(HedgeGraphError::RotationMismatch(node));
            }
        }
        let n = order.len();
        for (i, h) in order.iter().enumerate() {
            self.rot_next[h.0] = order[(i + 1) % n];
            self.rot_prev[h.0] = order[(i + n - 1) % n];
        }
        self.anchor[node.0] = order.first().copied();
        Ok(())
    }

    /// Copies the structure (including rotations and tombstones) with new data.
    pub fn map_data_ref<E2, V2>(
        &self,
        mut node_map: impl FnMut(NodeIndex, &V) -> V2,
        mut edge_map: impl FnMut(EdgeIndex, &E) -> E2,
    ) -> HedgeGraph<E2, V2> {
        HedgeGraph {
            involution: self.involution.clone(),
            hedge_node: self.hedge_node.clone(),
            rot_next: self.rot_next.clone(),
            rot_prev: self.rot_prev.clone(),
            anchor: self.anchor.clone(),
            degree: self.degree.clone(),
            node_data: self
                .node_data
                .iter()
                .enumerate()
                .map(|(i, v)| node_map(NodeIndex(i), v))
                .collect(),
            edge_data: self
                .edge_data
                .iter()
                .enumerate()
                .map(|(i, e)| edge_map(EdgeIndex(i), e))
                .collect(),
            live_nodes: self.live_nodes.clone(),
            live_edges: self.live_edges.clone(),
            n_live_nodes: self.n_live_nodes,
            n_live_edges: self.n_live_edges,
        }
    }

    /// Writes a graphviz rendering of the bare structure, listing rotations as node comments.
    pub fn write_dot<W: Write>(&self, writer: &mut W) -> std::fmt::Result {
        writeln!(writer, "graph {{")?;
        for n in self.iter_node_ids() {
            let rotation = self
                .iter_crown(n)
                .map(|h| self.edge_id(h).to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(writer, "  {n}; // [{rotation}]")?;
        }
        for (e, _, _) in self.iter_edges() {
            let (s, t) = self.endpoints(e);
            writeln!(writer, "  {s} -- {t} [label=\"{e}\"];")?;
        }
        write!(writer, "}}")
    }

    pub fn dot(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write_dot(&mut out);
        out
    }
}

impl<E, V> Index<NodeIndex> for HedgeGraph<E, V> {
    type Output = V;
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.node_data[index.0]
    }
}

impl<E, V> IndexMut<NodeIndex> for HedgeGraph<E, V> {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.node_data[index.0]
    }
}

impl<E, V> Index<EdgeIndex> for HedgeGraph<E, V> {
    type Output = E;
    fn index(&self, index: EdgeIndex) -> &Self::Output {
        &self.edge_data[index.0]
    }
}

impl<E, V> IndexMut<EdgeIndex> for HedgeGraph<E, V> {
    fn index_mut(&mut self, index: EdgeIndex) -> &mut Self::Output {
        &mut self.edge_data[index.0]
    }
}

/// Iterator over the rotation of one node.
pub struct CrownIter<'a, E, V> {
    graph: &'a HedgeGraph<E, V>,
    first: Option<Hedge>,
    next: Option<Hedge>,
}

impl<E, V> Iterator for CrownIter<'_, E, V> {
    type Item = Hedge;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let succ = self.graph.rot_next(current);
        self.next = if Some(succ) == self.first {
            None
        } else {
            Some(succ)
        };
        Some(current)
    }
}

#[cfg(test)]
pub(crate) mod test_graphs;

#[cfg(test)]
mod tests;
