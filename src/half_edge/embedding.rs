//! Faces of a rotation system.
//!
//! A [`CombinatorialEmbedding`] caches the left face of every hedge of a [`HedgeGraph`].
//! Faces are the cycles of `φ = σ ∘ α` (see [`HedgeGraphExt`]). The embedding does not own
//! the graph: every mutating method takes the graph, applies the change to it and
//! patches the affected faces locally.

use itertools::Itertools;
use thiserror::Error;
use tracing::trace;

use super::{
    involution::{EdgeIndex, Hedge},
    Corner, HedgeGraph, HedgeGraphError, NodeIndex, Unsplit,
};
use crate::{define_indexed_vec, permutation::HedgeGraphExt};

define_indexed_vec!(
    /// A face of a [`CombinatorialEmbedding`].
    pub struct FaceId;

    /// Per-face storage.
    pub struct FaceVec;
);

const UNASSIGNED: FaceId = FaceId(usize::MAX);

/// A boundary walk, given by one of its hedges and its length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Face {
    pub first: Hedge,
    pub size: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error(transparent)]
    Graph(#[from] HedgeGraphError),
    #[error("Face {0} does not exist")]
    UnknownFace(FaceId),
    #[error("Node {0} already has hedges, a corner there must name one of them")]
    AmbiguousCorner(NodeIndex),
    #[error("Both corners are at node {0}")]
    SelfLoop(NodeIndex),
    #[error("{cached} faces are cached but the rotation system has {actual}")]
    FaceCount { cached: usize, actual: usize },
    #[error("Hedge {hedge} is cached on face {cached}, which disagrees with the rotation system")]
    Inconsistent { hedge: Hedge, cached: FaceId },
    #[error("The component of node {node} has Euler characteristic {characteristic}, not 2")]
    NotPlanar { node: NodeIndex, characteristic: isize },
}

/// How [`CombinatorialEmbedding::external_face`] scores candidate faces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExternalFacePolicy {
    /// The face with the most hedges.
    #[default]
    Largest,
    /// `size + weight * (number of distinct preferred nodes on the boundary)`.
    Prefer { nodes: Vec<NodeIndex>, weight: usize },
}

#[derive(Clone, Debug)]
pub struct CombinatorialEmbedding {
    faces: FaceVec<Option<Face>>,
    face_of: Vec<FaceId>,
    n_faces: usize,
}

impl CombinatorialEmbedding {
    /// Computes all faces of the rotation system of `graph`.
    pub fn from_rotation<E, V>(graph: &HedgeGraph<E, V>) -> Self {
        let mut faces = FaceVec::new();
        let mut face_of = vec![UNASSIGNED; graph.hedge_bound()];

        for cycle in graph.face_permutation().find_cycles() {
            let first = Hedge(cycle[0]);
            if !graph.is_live_hedge(first) {
                continue;
            }
            let id = faces.push(Some(Face {
                first,
                size: cycle.len(),
            }));
            for h in cycle {
                face_of[h] = id;
            }
        }
        let n_faces = faces.len();
        trace!(n_faces, "computed faces from rotation");

        CombinatorialEmbedding {
            faces,
            face_of,
            n_faces,
        }
    }

    // ---------------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------------

    pub fn n_faces(&self) -> usize {
        self.n_faces
    }

    /// One past the largest face id ever handed out.
    pub fn face_bound(&self) -> usize {
        self.faces.len()
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces
            .iter()
            .filter_map(|(id, f)| f.is_some().then_some(id))
    }

    pub fn contains_face(&self, face: FaceId) -> bool {
        matches!(self.faces.get(face), Some(Some(_)))
    }

    pub fn face(&self, face: FaceId) -> Result<Face, EmbeddingError> {
        self.faces
            .get(face)
            .copied()
            .flatten()
            .ok_or(EmbeddingError::UnknownFace(face))
    }

    pub fn face_size(&self, face: FaceId) -> usize {
        self.faces[face].map_or(0, |f| f.size)
    }

    /// The face to the left of `hedge`, i.e. the one whose boundary walk contains it.
    pub fn left_face(&self, hedge: Hedge) -> FaceId {
        self.face_of[hedge.0]
    }

    pub fn right_face<E, V>(&self, graph: &HedgeGraph<E, V>, hedge: Hedge) -> FaceId {
        self.left_face(graph.inv(hedge))
    }

    /// The boundary walk of `face`.
    pub fn face_hedges<E, V>(&self, graph: &HedgeGraph<E, V>, face: FaceId) -> Vec<Hedge> {
        let Some(Face { first, size }) = self.faces[face] else {
            return Vec::new();
        };
        let mut walk = Vec::with_capacity(size);
        let mut h = first;
        for _ in 0..size {
            walk.push(h);
            h = graph.face_next(h);
        }
        walk
    }

    /// The nodes along the boundary walk of `face`; cut vertices repeat.
    pub fn face_nodes<E, V>(&self, graph: &HedgeGraph<E, V>, face: FaceId) -> Vec<NodeIndex> {
        self.face_hedges(graph, face)
            .into_iter()
            .map(|h| graph.node_id(h))
            .collect()
    }

    /// The hedge out of `node` whose left face is `face`.
    ///
    /// Splicing a new hedge in right before it places the new hedge inside `face`.
    pub fn corner<E, V>(
        &self,
        graph: &HedgeGraph<E, V>,
        node: NodeIndex,
        face: FaceId,
    ) -> Option<Hedge> {
        graph.iter_crown(node).find(|h| self.left_face(*h) == face)
    }

    /// Every corner of `node` with its face, in rotation order.
    pub fn corners<'a, E, V>(
        &'a self,
        graph: &'a HedgeGraph<E, V>,
        node: NodeIndex,
    ) -> impl Iterator<Item = (Hedge, FaceId)> + 'a {
        graph.iter_crown(node).map(|h| (h, self.left_face(h)))
    }

    /// Picks the external face. Ties go to the lowest face id.
    pub fn external_face<E, V>(
        &self,
        graph: &HedgeGraph<E, V>,
        policy: &ExternalFacePolicy,
    ) -> Option<FaceId> {
        let score = |f: FaceId| match policy {
            ExternalFacePolicy::Largest => self.face_size(f),
            ExternalFacePolicy::Prefer { nodes, weight } => {
                let on_boundary = self
                    .face_nodes(graph, f)
                    .into_iter()
                    .unique()
                    .filter(|n| nodes.contains(n))
                    .count();
                self.face_size(f) + weight * on_boundary
            }
        };
        self.faces()
            .map(|f| (score(f), f))
            .max_by(|(sa, fa), (sb, fb)| sa.cmp(sb).then(fb.cmp(fa)))
            .map(|(_, f)| f)
    }

    // ---------------------------------------------------------------------------------
    // Consistency
    // ---------------------------------------------------------------------------------

    /// Compares the cached faces against the faces recomputed from the rotation system.
    pub fn check<E, V>(&self, graph: &HedgeGraph<E, V>) -> Result<(), EmbeddingError> {
        let fresh = Self::from_rotation(graph);
        if fresh.n_faces != self.n_faces {
            return Err(EmbeddingError::FaceCount {
                cached: self.n_faces,
                actual: fresh.n_faces,
            });
        }
        let mut claimed = vec![false; self.faces.len()];
        for f in fresh.faces() {
            let walk = fresh.face_hedges(graph, f);
            let cached = self.left_face(walk[0]);
            let consistent = self.contains_face(cached)
                && !std::mem::replace(&mut claimed[cached.0], true)
                && self.face_size(cached) == walk.len()
                && walk.iter().all(|h| self.left_face(*h) == cached)
                && walk.contains(&self.faces[cached].map_or(walk[0], |c| c.first));
            if !consistent {
                return Err(EmbeddingError::Inconsistent {
                    hedge: walk[0],
                    cached,
                });
            }
        }
        Ok(())
    }

    /// Checks `V - E + F = 2` for every connected component that has an edge.
    pub fn genus_check<E, V>(&self, graph: &HedgeGraph<E, V>) -> Result<(), EmbeddingError> {
        let components = graph.connected_components();
        let mut chi = vec![0isize; components.len()];
        for (i, members) in components.members.iter().enumerate() {
            chi[i] += members.len() as isize;
        }
        for e in graph.iter_edge_ids() {
            let (s, _) = graph.endpoints(e);
            if let Some(c) = components.of_node[s.0] {
                chi[c] -= 1;
            }
        }
        for f in self.faces() {
            if let Some(face) = self.faces[f] {
                if let Some(c) = components.of_node[graph.node_id(face.first).0] {
                    chi[c] += 1;
                }
            }
        }
        for (c, members) in components.members.iter().enumerate() {
            let has_edges = members.iter().any(|n| graph.degree(*n) > 0);
            if has_edges && chi[c] != 2 {
                return Err(EmbeddingError::NotPlanar {
                    node: members[0],
                    characteristic: chi[c],
                });
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------
    // Local patches
    // ---------------------------------------------------------------------------------

    fn grow<E, V>(&mut self, graph: &HedgeGraph<E, V>) {
        self.face_of.resize(graph.hedge_bound(), UNASSIGNED);
    }

    fn new_face(&mut self, face: Face) -> FaceId {
        self.n_faces += 1;
        self.faces.push(Some(face))
    }

    fn kill_face(&mut self, face: FaceId) {
        if self.faces[face].take().is_some() {
            self.n_faces -= 1;
        }
    }

    /// Labels the walk through `start` with `face`. Returns its length and whether
    /// `watch` was on it.
    fn walk_assign<E, V>(
        &mut self,
        graph: &HedgeGraph<E, V>,
        start: Hedge,
        face: FaceId,
        watch: Option<Hedge>,
    ) -> (usize, bool) {
        let mut size = 0;
        let mut seen = false;
        let mut h = start;
        loop {
            self.face_of[h.0] = face;
            seen |= Some(h) == watch;
            size += 1;
            h = graph.face_next(h);
            if h == start {
                break;
            }
        }
        (size, seen)
    }

    fn corner_face<E, V>(
        &self,
        graph: &HedgeGraph<E, V>,
        corner: Corner,
    ) -> Result<(NodeIndex, Option<FaceId>), EmbeddingError> {
        match corner {
            Corner::Before(h) => {
                graph.check_hedge(h)?;
                Ok((graph.node_id(h), Some(self.left_face(h))))
            }
            Corner::Node(n) => {
                graph.check_node(n)?;
                if graph.degree(n) > 0 {
                    return Err(EmbeddingError::AmbiguousCorner(n));
                }
                Ok((n, None))
            }
        }
    }

    /// Subdivides `edge` in `graph`; the new hedges continue the faces of the old ones.
    pub fn split_edge<E, V>(
        &mut self,
        graph: &mut HedgeGraph<E, V>,
        edge: EdgeIndex,
        node_data: V,
        edge_data: E,
    ) -> Result<(NodeIndex, EdgeIndex), EmbeddingError> {
        let old = graph.hedge_pair(edge);
        let (x, new_edge) = graph.split_edge(edge, node_data, edge_data)?;
        self.grow(graph);
        let new = graph.hedge_pair(new_edge);
        for (old_h, new_h) in [(old.source, new.source), (old.sink, new.sink)] {
            let f = self.left_face(old_h);
            self.face_of[new_h.0] = f;
            if let Some(face) = self.faces[f].as_mut() {
                face.size += 1;
            }
        }
        Ok((x, new_edge))
    }

    /// Inverse of [`CombinatorialEmbedding::split_edge`].
    pub fn unsplit<E, V>(
        &mut self,
        graph: &mut HedgeGraph<E, V>,
        node: NodeIndex,
    ) -> Result<Unsplit, EmbeddingError> {
        let (a, b) = graph.unsplit_hedges(node)?;
        let far = graph.inv(b);
        let back = graph.inv(a);
        let fb = self.left_face(b);
        let ff = self.left_face(far);

        let unsplit = graph.unsplit(node)?;

        // walk of fb: back -> b -> .. becomes back -> ..
        // walk of ff: far -> a -> .. becomes a -> ..
        if let Some(face) = self.faces[fb].as_mut() {
            face.first = back;
            face.size -= 1;
        }
        if let Some(face) = self.faces[ff].as_mut() {
            face.first = a;
            face.size -= 1;
        }
        self.face_of[b.0] = UNASSIGNED;
        self.face_of[far.0] = UNASSIGNED;
        Ok(unsplit)
    }

    /// Adds an edge between two corners.
    ///
    /// Corners on one face split it in two: the source side of the new edge bounds the
    /// new face. Corners on two different faces merge them, which keeps the embedding
    /// planar only when the endpoints lie in different connected components. A node
    /// without hedges is passed as [`Corner::Node`]; it joins the face of the other corner.
    ///
    /// The splice itself is O(1), but the walk of the new (or merged) face is relabelled,
    /// so the whole call is linear in that face's size.
    pub fn insert_edge<E, V>(
        &mut self,
        graph: &mut HedgeGraph<E, V>,
        source: Corner,
        sink: Corner,
        data: E,
    ) -> Result<EdgeIndex, EmbeddingError> {
        let (fs, ft) = self.endpoint_faces(graph, source, sink)?;
        let edge = graph.add_edge_at(source, sink, data)?;
        self.attach(graph, edge, fs, ft);
        Ok(edge)
    }

    /// Like [`CombinatorialEmbedding::insert_edge`], but brings back the removed `edge`
    /// under its old index.
    pub fn reinsert_edge<E, V>(
        &mut self,
        graph: &mut HedgeGraph<E, V>,
        edge: EdgeIndex,
        source: Corner,
        sink: Corner,
        data: E,
    ) -> Result<(), EmbeddingError> {
        let (fs, ft) = self.endpoint_faces(graph, source, sink)?;
        graph.revive_edge_at(edge, source, sink, data)?;
        self.attach(graph, edge, fs, ft);
        Ok(())
    }

    fn endpoint_faces<E, V>(
        &self,
        graph: &HedgeGraph<E, V>,
        source: Corner,
        sink: Corner,
    ) -> Result<(Option<FaceId>, Option<FaceId>), EmbeddingError> {
        let (u, fs) = self.corner_face(graph, source)?;
        let (v, ft) = self.corner_face(graph, sink)?;
        if u == v {
            return Err(EmbeddingError::SelfLoop(u));
        }
        Ok((fs, ft))
    }

    /// Updates the faces around the freshly linked `edge`, whose corners were on `fs`
    /// and `ft`.
    fn attach<E, V>(
        &mut self,
        graph: &HedgeGraph<E, V>,
        edge: EdgeIndex,
        fs: Option<FaceId>,
        ft: Option<FaceId>,
    ) {
        self.grow(graph);
        let pair = graph.hedge_pair(edge);

        match (fs, ft) {
            (Some(f), Some(g)) if f == g => {
                let old_size = self.face_size(f);
                let new = self.new_face(Face {
                    first: pair.source,
                    size: 0,
                });
                let (size, _) = self.walk_assign(graph, pair.source, new, None);
                if let Some(face) = self.faces[new].as_mut() {
                    face.size = size;
                }
                self.face_of[pair.sink.0] = f;
                self.faces[f] = Some(Face {
                    first: pair.sink,
                    size: old_size + 2 - size,
                });
                trace!(%f, %new, "split face");
            }
            (Some(f), Some(g)) => {
                let merged = self.face_size(f) + self.face_size(g) + 2;
                self.walk_assign(graph, pair.source, f, None);
                self.faces[f] = Some(Face {
                    first: pair.source,
                    size: merged,
                });
                self.kill_face(g);
                trace!(%f, %g, "merged faces");
            }
            (Some(f), None) | (None, Some(f)) => {
                self.face_of[pair.source.0] = f;
                self.face_of[pair.sink.0] = f;
                if let Some(face) = self.faces[f].as_mut() {
                    face.size += 2;
                }
            }
            (None, None) => {
                let f = self.new_face(Face {
                    first: pair.source,
                    size: 2,
                });
                self.face_of[pair.source.0] = f;
                self.face_of[pair.sink.0] = f;
            }
        }
    }

    /// Attaches the hedgeless `node` at `corner`. The new edge lies in the corner's face.
    pub fn insert_edge_at_isolated<E, V>(
        &mut self,
        graph: &mut HedgeGraph<E, V>,
        corner: Corner,
        node: NodeIndex,
        data: E,
    ) -> Result<EdgeIndex, EmbeddingError> {
        self.insert_edge(graph, corner, Corner::Node(node), data)
    }

    /// Removes `edge`, merging its two faces or splitting its one face.
    ///
    /// Linear in the size of the surviving face walks, which are relabelled.
    pub fn remove_edge<E, V>(
        &mut self,
        graph: &mut HedgeGraph<E, V>,
        edge: EdgeIndex,
    ) -> Result<(), EmbeddingError> {
        graph.check_edge(edge)?;
        let pair = graph.hedge_pair(edge);
        let fs = self.left_face(pair.source);
        let ft = self.left_face(pair.sink);
        let after_source = graph.face_next(pair.source);
        let after_sink = graph.face_next(pair.sink);

        graph.remove_edge(edge)?;
        self.face_of[pair.source.0] = UNASSIGNED;
        self.face_of[pair.sink.0] = UNASSIGNED;

        let survivors: Vec<Hedge> = [after_source, after_sink]
            .into_iter()
            .filter(|h| graph.is_live_hedge(*h))
            .collect();

        if fs != ft {
            let size = self.face_size(fs) + self.face_size(ft) - 2;
            if let Some(&start) = survivors.first() {
                self.walk_assign(graph, start, fs, None);
                self.faces[fs] = Some(Face { first: start, size });
            }
            self.kill_face(ft);
            return Ok(());
        }

        match survivors.as_slice() {
            [] => self.kill_face(fs),
            [only] => {
                let (size, _) = self.walk_assign(graph, *only, fs, None);
                self.faces[fs] = Some(Face { first: *only, size });
            }
            [first, second, ..] => {
                let (size, joined) = self.walk_assign(graph, *first, fs, Some(*second));
                self.faces[fs] = Some(Face {
                    first: *first,
                    size,
                });
                if !joined {
                    let g = self.new_face(Face {
                        first: *second,
                        size: 0,
                    });
                    let (size, _) = self.walk_assign(graph, *second, g, None);
                    if let Some(face) = self.faces[g].as_mut() {
                        face.size = size;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;
    use crate::half_edge::{test_graphs::TestGraph, HedgeGraph};

    /// Reorders the rotation at `node` to follow the given neighbours.
    fn order_by_neighbors<E, V>(
        graph: &mut HedgeGraph<E, V>,
        node: NodeIndex,
        neighbors: &[usize],
    ) {
        let order: Vec<_> = neighbors
            .iter()
            .map(|&w| {
                graph
                    .iter_crown(node)
                    .find(|h| graph.opposite(*h) == NodeIndex(w))
                    .unwrap()
            })
            .collect();
        graph.set_rotation(node, &order).unwrap();
    }

    /// K4 drawn with 0 in the middle of the triangle 1, 2, 3; every rotation counterclockwise.
    fn planar_k4() -> HedgeGraph<(), ()> {
        let mut graph = TestGraph::Complete(4).graph();
        order_by_neighbors(&mut graph, NodeIndex(0), &[1, 2, 3]);
        order_by_neighbors(&mut graph, NodeIndex(1), &[2, 0, 3]);
        order_by_neighbors(&mut graph, NodeIndex(2), &[3, 0, 1]);
        order_by_neighbors(&mut graph, NodeIndex(3), &[1, 0, 2]);
        graph
    }

    #[test]
    fn faces_partition_the_hedges() {
        let graph = planar_k4();
        let embedding = CombinatorialEmbedding::from_rotation(&graph);
        assert_eq!(embedding.n_faces(), 4);
        let mut all: Vec<_> = embedding
            .faces()
            .flat_map(|f| embedding.face_hedges(&graph, f))
            .collect();
        all.sort();
        assert_eq!(all, graph.iter_hedges().collect::<Vec<_>>());
        embedding.genus_check(&graph).unwrap();
        embedding.check(&graph).unwrap();
    }

    #[test]
    fn builder_k4_is_not_planar_as_given() {
        let graph = TestGraph::Complete(4).graph();
        let embedding = CombinatorialEmbedding::from_rotation(&graph);
        // insertion-order rotations put K4 on the torus
        assert!(matches!(
            embedding.genus_check(&graph),
            Err(EmbeddingError::NotPlanar { .. })
        ));
    }

    #[test]
    fn a_path_has_one_face() {
        let graph = TestGraph::Path(4).graph();
        let embedding = CombinatorialEmbedding::from_rotation(&graph);
        assert_eq!(embedding.n_faces(), 1);
        let f = embedding.faces().next().unwrap();
        assert_eq!(embedding.face_size(f), 6);
        embedding.genus_check(&graph).unwrap();
    }

    #[test]
    fn chord_splits_and_removal_merges() {
        let mut graph = TestGraph::Cycle(6).graph();
        let mut embedding = CombinatorialEmbedding::from_rotation(&graph);
        assert_eq!(embedding.n_faces(), 2);

        let f = embedding.left_face(graph.hedge_pair(EdgeIndex(0)).source);
        let a = embedding.corner(&graph, NodeIndex(0), f).unwrap();
        let b = embedding.corner(&graph, NodeIndex(3), f).unwrap();
        let chord = embedding
            .insert_edge(&mut graph, Corner::Before(a), Corner::Before(b), ())
            .unwrap();

        assert_eq!(embedding.n_faces(), 3);
        embedding.check(&graph).unwrap();
        embedding.genus_check(&graph).unwrap();
        let pair = graph.hedge_pair(chord);
        assert_ne!(embedding.left_face(pair.source), embedding.left_face(pair.sink));
        assert_eq!(
            embedding.face_size(embedding.left_face(pair.source))
                + embedding.face_size(embedding.left_face(pair.sink)),
            8
        );

        embedding.remove_edge(&mut graph, chord).unwrap();
        assert_eq!(embedding.n_faces(), 2);
        embedding.check(&graph).unwrap();
    }

    #[test]
    fn removed_edges_come_back_under_their_index() {
        let mut graph = planar_k4();
        let mut embedding = CombinatorialEmbedding::from_rotation(&graph);
        let (u, v) = graph.endpoints(EdgeIndex(0));
        let bound = graph.edge_bound();
        embedding.remove_edge(&mut graph, EdgeIndex(0)).unwrap();
        assert_eq!(embedding.n_faces(), 3);

        let f = embedding
            .faces()
            .find(|f| {
                embedding.corner(&graph, u, *f).is_some()
                    && embedding.corner(&graph, v, *f).is_some()
            })
            .unwrap();
        let a = embedding.corner(&graph, u, f).unwrap();
        let b = embedding.corner(&graph, v, f).unwrap();
        embedding
            .reinsert_edge(&mut graph, EdgeIndex(0), Corner::Before(a), Corner::Before(b), ())
            .unwrap();

        assert_eq!(embedding.n_faces(), 4);
        assert_eq!(graph.edge_bound(), bound);
        assert_eq!(graph.endpoints(EdgeIndex(0)), (u, v));
        embedding.check(&graph).unwrap();
        embedding.genus_check(&graph).unwrap();

        assert!(matches!(
            embedding.reinsert_edge(
                &mut graph,
                EdgeIndex(1),
                Corner::Before(a),
                Corner::Before(b),
                ()
            ),
            Err(EmbeddingError::Graph(HedgeGraphError::LiveEdge(_)))
        ));
    }

    #[test]
    fn bridge_removal_splits_the_face() {
        let mut graph = TestGraph::Path(5).graph();
        let mut embedding = CombinatorialEmbedding::from_rotation(&graph);
        embedding.remove_edge(&mut graph, EdgeIndex(1)).unwrap();
        assert_eq!(embedding.n_faces(), 2);
        embedding.check(&graph).unwrap();

        // a pendant edge leaves its endpoint isolated
        embedding.remove_edge(&mut graph, EdgeIndex(0)).unwrap();
        assert_eq!(embedding.n_faces(), 1);
        embedding.check(&graph).unwrap();
        embedding.genus_check(&graph).unwrap();
    }

    #[test]
    fn components_merge_and_isolated_nodes_join() {
        let mut graph = TestGraph::Cycle(3).graph();
        let d = graph.add_node(());
        let e = graph.add_node(());
        let mut embedding = CombinatorialEmbedding::from_rotation(&graph);

        embedding
            .insert_edge(&mut graph, Corner::Node(d), Corner::Node(e), ())
            .unwrap();
        assert_eq!(embedding.n_faces(), 3);
        embedding.check(&graph).unwrap();

        let outer = embedding.left_face(Hedge(0));
        let c = embedding.corner(&graph, NodeIndex(1), outer).unwrap();
        let de = embedding.left_face(graph.iter_crown(d).next().unwrap());
        let cd = embedding.corner(&graph, d, de).unwrap();
        embedding
            .insert_edge(&mut graph, Corner::Before(c), Corner::Before(cd), ())
            .unwrap();
        assert_eq!(embedding.n_faces(), 2);
        embedding.check(&graph).unwrap();
        embedding.genus_check(&graph).unwrap();

        let f = graph.add_node(());
        let h = graph.iter_crown(e).next().unwrap();
        let before = embedding.face_size(embedding.left_face(h));
        embedding
            .insert_edge_at_isolated(&mut graph, Corner::Before(h), f, ())
            .unwrap();
        embedding.check(&graph).unwrap();
        assert_eq!(embedding.face_size(embedding.left_face(h)), before + 2);
        assert_eq!(
            embedding.insert_edge(&mut graph, Corner::Node(d), Corner::Node(f), ()),
            Err(EmbeddingError::AmbiguousCorner(d))
        );
    }

    #[test]
    fn split_and_unsplit_patch_locally() {
        let mut graph = planar_k4();
        let mut embedding = CombinatorialEmbedding::from_rotation(&graph);
        let mut created = Vec::new();
        for e in [0, 3, 5, 0] {
            let (x, _) = embedding
                .split_edge(&mut graph, EdgeIndex(e), (), ())
                .unwrap();
            embedding.check(&graph).unwrap();
            created.push(x);
        }
        assert_eq!(embedding.n_faces(), 4);
        embedding.genus_check(&graph).unwrap();

        for x in created.into_iter().rev() {
            embedding.unsplit(&mut graph, x).unwrap();
            embedding.check(&graph).unwrap();
        }
        assert_eq!(graph.n_nodes(), 4);
    }

    #[test]
    fn external_face_policies() {
        let mut graph = TestGraph::Wheel(5).graph();
        // hub 0 with rim 1..=5 counterclockwise
        order_by_neighbors(&mut graph, NodeIndex(0), &[1, 2, 3, 4, 5]);
        for i in 1..=5 {
            let next = i % 5 + 1;
            let prev = (i + 3) % 5 + 1;
            order_by_neighbors(&mut graph, NodeIndex(i), &[next, 0, prev]);
        }
        let embedding = CombinatorialEmbedding::from_rotation(&graph);
        embedding.genus_check(&graph).unwrap();

        let largest = embedding
            .external_face(&graph, &ExternalFacePolicy::Largest)
            .unwrap();
        assert_eq!(embedding.face_size(largest), 5);

        let prefer_hub = ExternalFacePolicy::Prefer {
            nodes: vec![NodeIndex(0)],
            weight: 10,
        };
        let hub_face = embedding.external_face(&graph, &prefer_hub).unwrap();
        assert_eq!(embedding.face_size(hub_face), 3);
        assert!(embedding.face_nodes(&graph, hub_face).contains(&NodeIndex(0)));
    }
}
