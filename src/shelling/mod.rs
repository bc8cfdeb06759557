//! # Shelling orders
//!
//! A shelling (canonical) order of an embedded planar graph builds it up from a base
//! edge `(v1, v2)` on the external face. Every later step adds either one vertex or a
//! chain of vertices on top of the current contour, attached to two contour vertices
//! `left` and `right`, so that each intermediate graph is biconnected and has the base
//! edge on its outer face. Grid drawings are computed from such an order, see [`grid`].
//!
//! The order is found by peeling in reverse (Kant): starting from the whole graph, the
//! step to remove is a contour vertex or chain whose removal keeps the rest biconnected.
//! Faces count their contour vertices `outv` and contour edges `oute`; a face touches
//! the contour in `outv - oute` separate pieces.

use bitvec::vec::BitVec;
use tracing::{debug, trace};

use crate::{
    half_edge::{
        embedding::{CombinatorialEmbedding, ExternalFacePolicy, FaceId},
        involution::{EdgeIndex, Hedge},
        HedgeGraph, NodeIndex,
    },
    planarity::{PlanarizationError, Precondition},
};

pub mod augment;
pub mod grid;

/// The working copy a shelling order is computed on. Edges keep the index of the edge
/// they copy; edges added by the augmentation carry `None`.
pub type AugmentedGraph = HedgeGraph<Option<EdgeIndex>, ()>;

/// One group of vertices added together.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShellingStep {
    /// The new vertices, from left to right.
    pub nodes: Vec<NodeIndex>,
    /// Contour vertex the first new vertex attaches to. `None` for the base.
    pub left: Option<NodeIndex>,
    /// Contour vertex the last new vertex attaches to. `None` for the base.
    pub right: Option<NodeIndex>,
}

impl ShellingStep {
    pub fn is_chain(&self) -> bool {
        self.left.is_some() && self.nodes.len() > 1
    }
}

#[derive(Clone, Debug)]
pub struct ShellingOrder {
    steps: Vec<ShellingStep>,
    graph: AugmentedGraph,
    embedding: CombinatorialEmbedding,
    base: Option<Hedge>,
}

impl ShellingOrder {
    /// Computes a shelling order of `graph` embedded by `embedding`.
    ///
    /// Self-loops and parallel edges are ignored. Unless the rest is triconnected it is
    /// augmented to a triangulation first; [`ShellingOrder::graph`] returns the result.
    /// The base edge lies on `external` (by default the largest face).
    pub fn compute<E, V>(
        graph: &HedgeGraph<E, V>,
        embedding: &CombinatorialEmbedding,
        external: Option<FaceId>,
    ) -> Result<Self, PlanarizationError> {
        embedding.check(graph)?;
        if embedding.genus_check(graph).is_err() {
            return Err(Precondition::NotPlanar.into());
        }
        let hint = match external {
            Some(f) if !embedding.contains_face(f) => {
                return Err(Precondition::UnknownFace(f).into())
            }
            Some(f) => embedding.face_hedges(graph, f),
            None => embedding
                .external_face(graph, &ExternalFacePolicy::Largest)
                .map(|f| embedding.face_hedges(graph, f))
                .unwrap_or_default(),
        };

        let mut work: AugmentedGraph = graph.map_data_ref(|_, _| (), |e, _| Some(e));
        let mut emb = embedding.clone();
        let dropped = augment::simplify(&mut work, &mut emb)?;
        let mut base = hint.into_iter().find(|h| work.is_live_hedge(*h)).or_else(|| {
            emb.external_face(&work, &ExternalFacePolicy::Largest)
                .and_then(|f| emb.face(f).ok())
                .map(|face| face.first)
        });

        let nodes: Vec<NodeIndex> = work.iter_node_ids().collect();
        let steps = match nodes.as_slice() {
            [] => Vec::new(),
            [only] => vec![ShellingStep {
                nodes: vec![*only],
                left: None,
                right: None,
            }],
            [first, ..] => {
                if !work.is_triconnected() {
                    let root = base.map_or(*first, |b| work.node_id(b));
                    augment::augment(&mut work, &mut emb, root)?;
                    base = base.or_else(|| work.anchor(root));
                }
                let Some(b) = base else {
                    return Err(PlanarizationError::UnsupportedConfiguration(
                        "no base edge after augmentation".to_owned(),
                    ));
                };
                Peeler::new(&work, &emb, b).run()?
            }
        };

        debug!(
            steps = steps.len(),
            dropped,
            edges = work.n_edges(),
            "computed shelling order"
        );
        Ok(ShellingOrder {
            steps,
            graph: work,
            embedding: emb,
            base,
        })
    }

    pub fn steps(&self) -> &[ShellingStep] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShellingStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The graph the order is valid for, including the augmentation edges.
    pub fn graph(&self) -> &AugmentedGraph {
        &self.graph
    }

    pub fn embedding(&self) -> &CombinatorialEmbedding {
        &self.embedding
    }

    /// `(v1, v2)`: the base edge, `v1` drawn to the left.
    pub fn base(&self) -> Option<(NodeIndex, NodeIndex)> {
        self.base
            .map(|b| (self.graph.opposite(b), self.graph.node_id(b)))
    }

    /// The external face of the augmented embedding.
    pub fn external_face(&self) -> Option<FaceId> {
        self.base.map(|b| self.embedding.left_face(b))
    }

    /// Edges added by the augmentation.
    pub fn added_edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph
            .iter_edges()
            .filter(|(_, _, original)| original.is_none())
            .map(|(e, _, _)| e)
    }

    /// The step each node is added in.
    pub fn ranks(&self) -> Vec<Option<usize>> {
        let mut ranks = vec![None; self.graph.node_bound()];
        for (i, step) in self.steps.iter().enumerate() {
            for n in &step.nodes {
                ranks[n.0] = Some(i);
            }
        }
        ranks
    }
}

impl<'a> IntoIterator for &'a ShellingOrder {
    type Item = &'a ShellingStep;
    type IntoIter = std::slice::Iter<'a, ShellingStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// The reverse peeling state: which vertices are gone and the degrees in what is left.
struct Peeler<'a> {
    graph: &'a AugmentedGraph,
    embedding: &'a CombinatorialEmbedding,
    base: Hedge,
    external: FaceId,
    removed: BitVec,
    degree: Vec<usize>,
    alive_nodes: usize,
    alive_edges: usize,
}

/// Contour of the remaining graph, from `v1` to `v2`, with the hedges between.
struct Contour {
    nodes: Vec<NodeIndex>,
    hedges: Vec<Hedge>,
}

impl<'a> Peeler<'a> {
    fn new(graph: &'a AugmentedGraph, embedding: &'a CombinatorialEmbedding, base: Hedge) -> Self {
        let mut degree = vec![0; graph.node_bound()];
        for n in graph.iter_node_ids() {
            degree[n.0] = graph.degree(n);
        }
        Peeler {
            graph,
            embedding,
            base,
            external: embedding.left_face(base),
            removed: BitVec::repeat(false, graph.node_bound()),
            degree,
            alive_nodes: graph.n_nodes(),
            alive_edges: graph.n_edges(),
        }
    }

    fn run(mut self) -> Result<Vec<ShellingStep>, PlanarizationError> {
        let (v1, v2) = (self.graph.opposite(self.base), self.graph.node_id(self.base));
        let mut reversed = Vec::new();

        while self.alive_nodes > 2 {
            let contour = self.contour()?;
            let last = contour.nodes.len() - 1;
            let (start, end) = if self.alive_edges == self.alive_nodes {
                // a cycle: everything but the base is the first step
                (1, last - 1)
            } else {
                self.candidate(&contour)
                    .ok_or(Precondition::NotTriconnected)?
            };

            let nodes = contour.nodes[start..=end].to_vec();
            trace!(?nodes, "peeled");
            for &v in &nodes {
                self.remove(v);
            }
            reversed.push(ShellingStep {
                nodes,
                left: Some(contour.nodes[start - 1]),
                right: Some(contour.nodes[end + 1]),
            });
        }

        let mut steps = vec![ShellingStep {
            nodes: vec![v1, v2],
            left: None,
            right: None,
        }];
        steps.extend(reversed.into_iter().rev());
        Ok(steps)
    }

    fn alive(&self, node: NodeIndex) -> bool {
        !self.removed[node.0]
    }

    fn remove(&mut self, v: NodeIndex) {
        self.removed.set(v.0, true);
        self.alive_nodes -= 1;
        for w in self.graph.neighbors(v) {
            if self.alive(w) {
                self.degree[w.0] -= 1;
                self.alive_edges -= 1;
            }
        }
    }

    /// Walks the outer face of the remaining graph from `v1` to `v2`, stepping over
    /// removed neighbours.
    fn contour(&self) -> Result<Contour, PlanarizationError> {
        let graph = self.graph;
        let (v1, v2) = (graph.opposite(self.base), graph.node_id(self.base));
        let mut nodes = vec![v1];
        let mut hedges = Vec::new();
        let mut arrived = graph.inv(self.base);

        while nodes[nodes.len() - 1] != v2 {
            if nodes.len() > self.alive_nodes {
                return Err(Precondition::NotTriconnected.into());
            }
            let mut h = graph.rot_next(arrived);
            while h != arrived && !self.alive(graph.opposite(h)) {
                h = graph.rot_next(h);
            }
            if h == arrived {
                return Err(Precondition::NotTriconnected.into());
            }
            hedges.push(h);
            nodes.push(graph.opposite(h));
            arrived = graph.inv(h);
        }
        Ok(Contour { nodes, hedges })
    }

    /// `(outv, oute)` of every inner face of the remaining graph, indexed by face id.
    fn counters(&self, contour: &Contour) -> Vec<Option<(usize, usize)>> {
        let graph = self.graph;
        let mut on_contour: BitVec = BitVec::repeat(false, graph.node_bound());
        let mut contour_edge: BitVec = BitVec::repeat(false, graph.edge_bound());
        for n in &contour.nodes {
            on_contour.set(n.0, true);
        }
        for h in contour.hedges.iter().chain([&self.base]) {
            contour_edge.set(graph.edge_id(*h).0, true);
        }

        let mut counters = vec![None; self.embedding.face_bound()];
        for f in self.embedding.faces() {
            if f == self.external {
                continue;
            }
            let walk = self.embedding.face_hedges(graph, f);
            if walk.iter().any(|h| !self.alive(graph.node_id(*h))) {
                continue;
            }
            let outv = walk
                .iter()
                .filter(|h| on_contour[graph.node_id(**h).0])
                .count();
            let oute = walk
                .iter()
                .filter(|h| contour_edge[graph.edge_id(**h).0])
                .count();
            counters[f.0] = Some((outv, oute));
        }
        counters
    }

    /// The contour positions `start..=end` to peel next, nearest to `v2` first.
    fn candidate(&self, contour: &Contour) -> Option<(usize, usize)> {
        let counters = self.counters(contour);
        let nodes = &contour.nodes;
        let mut i = nodes.len() - 2;

        while i > 0 {
            if self.degree[nodes[i].0] == 2 {
                let end = i;
                let mut start = i;
                while start > 1 && self.degree[nodes[start - 1].0] == 2 {
                    start -= 1;
                }
                let below = self.embedding.right_face(self.graph, contour.hedges[start]);
                if let Some(Some((outv, oute))) = counters.get(below.0) {
                    if *outv == oute + 1 && *outv == end - start + 3 {
                        return Some((start, end));
                    }
                }
                i = start - 1;
            } else {
                if self.removable(nodes[i], &counters) {
                    return Some((i, i));
                }
                i -= 1;
            }
        }
        None
    }

    /// A contour vertex can go alone if every inner face around it touches the contour
    /// in one piece of at most two vertices.
    fn removable(&self, v: NodeIndex, counters: &[Option<(usize, usize)>]) -> bool {
        self.degree[v.0] >= 3
            && self
                .graph
                .iter_crown(v)
                .filter(|h| self.alive(self.graph.opposite(*h)))
                .all(|h| match counters[self.embedding.left_face(h).0] {
                    Some((outv, oute)) => outv <= 2 && outv == oute + 1,
                    None => true,
                })
    }
}
