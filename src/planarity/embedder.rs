//! Planar rotation systems for planar graphs.

use ahash::AHashMap;
use bitvec::vec::BitVec;
use tracing::{debug, trace};

use super::{check_loopless, PlanarizationError, Precondition};
use crate::half_edge::{
    embedding::{CombinatorialEmbedding, FaceId},
    involution::{EdgeIndex, Hedge},
    Corner, HedgeGraph, NodeIndex,
};

/// Rewrites the rotation system of a planar graph into a planar one.
pub trait Embedder {
    fn embed<E, V>(&self, graph: &mut HedgeGraph<E, V>) -> Result<(), PlanarizationError>;
}

/// Keeps the rotation the graph already has, after checking that it is planar.
#[derive(Clone, Copy, Debug, Default)]
pub struct GivenRotation;

impl Embedder for GivenRotation {
    fn embed<E, V>(&self, graph: &mut HedgeGraph<E, V>) -> Result<(), PlanarizationError> {
        check_loopless(graph)?;
        CombinatorialEmbedding::from_rotation(graph)
            .genus_check(graph)
            .map_err(|_| Precondition::NotPlanar.into())
    }
}

/// Demoucron–Malgrange–Pertuiset path addition.
///
/// Every block is embedded separately: first one cycle, then repeatedly the fragment
/// with the fewest admissible faces contributes a path between two of its attachments.
/// The block rotations are concatenated at the cut vertices.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathAdditionEmbedder;

impl Embedder for PathAdditionEmbedder {
    fn embed<E, V>(&self, graph: &mut HedgeGraph<E, V>) -> Result<(), PlanarizationError> {
        check_loopless(graph)?;
        let blocks = graph.biconnected_components();
        let mut rotations: AHashMap<NodeIndex, Vec<Hedge>> = AHashMap::new();

        for block in &blocks.blocks {
            for (node, hedges) in embed_block(graph, block)? {
                rotations.entry(node).or_default().extend(hedges);
            }
        }
        for (node, order) in rotations {
            graph.set_rotation(node, &order)?;
        }
        debug!(blocks = blocks.blocks.len(), "embedded blocks");
        Ok(())
    }
}

/// A connected piece of the block that is not embedded yet.
struct Fragment {
    edges: Vec<usize>,
    attachments: Vec<usize>,
}

/// The block as seen by the path addition: local node ids, adjacency over block
/// positions, and the partial embedding grown so far.
struct BlockEmbedding {
    block: Vec<EdgeIndex>,
    nodes: Vec<NodeIndex>,
    ends: Vec<(usize, usize)>,
    adj: Vec<Vec<(usize, usize)>>,
    local: HedgeGraph<EdgeIndex, NodeIndex>,
    embedding: CombinatorialEmbedding,
    edge_done: BitVec,
    node_done: BitVec,
}

fn embed_block<E, V>(
    graph: &HedgeGraph<E, V>,
    block: &[EdgeIndex],
) -> Result<Vec<(NodeIndex, Vec<Hedge>)>, PlanarizationError> {
    if let [edge] = block {
        let pair = graph.hedge_pair(*edge);
        return Ok(vec![
            (graph.node_id(pair.source), vec![pair.source]),
            (graph.node_id(pair.sink), vec![pair.sink]),
        ]);
    }

    let mut state = BlockEmbedding::new(graph, block);
    let (cycle_nodes, cycle_edges) = state.find_cycle().ok_or(PlanarizationError::NotPlanar)?;
    state.embed_path(&cycle_nodes, &cycle_edges, None)?;

    while state.edge_done.count_ones() < block.len() {
        let fragments = state.fragments();
        let faces = state.face_members();
        let mut best: Option<(usize, FaceId, usize)> = None;
        for (i, fragment) in fragments.iter().enumerate() {
            let admissible: Vec<FaceId> = faces
                .iter()
                .filter(|(_, members)| fragment.attachments.iter().all(|a| members[*a]))
                .map(|(f, _)| *f)
                .collect();
            let Some(&first) = admissible.first() else {
                debug!(fragment = i, "fragment has no admissible face");
                return Err(PlanarizationError::NotPlanar);
            };
            if best.map_or(true, |(count, _, _)| admissible.len() < count) {
                best = Some((admissible.len(), first, i));
            }
        }
        let Some((_, face, i)) = best else {
            break;
        };
        let (path_nodes, path_edges) = state.fragment_path(&fragments[i]);
        trace!(len = path_edges.len(), %face, "adding path");
        state.embed_path(&path_nodes, &path_edges, Some(face))?;
    }

    Ok(state.rotations(graph))
}

impl BlockEmbedding {
    fn new<E, V>(graph: &HedgeGraph<E, V>, block: &[EdgeIndex]) -> Self {
        let mut index: AHashMap<NodeIndex, usize> = AHashMap::new();
        let mut nodes = Vec::new();
        let mut adj: Vec<Vec<(usize, usize)>> = Vec::new();
        let mut ends = Vec::with_capacity(block.len());
        for (pos, &e) in block.iter().enumerate() {
            let (s, t) = graph.endpoints(e);
            let [ls, lt] = [s, t].map(|n| {
                *index.entry(n).or_insert_with(|| {
                    nodes.push(n);
                    adj.push(Vec::new());
                    nodes.len() - 1
                })
            });
            adj[ls].push((lt, pos));
            adj[lt].push((ls, pos));
            ends.push((ls, lt));
        }

        let mut local = HedgeGraph::with_capacity(nodes.len(), block.len());
        for &n in &nodes {
            local.add_node(n);
        }
        let embedding = CombinatorialEmbedding::from_rotation(&local);
        BlockEmbedding {
            block: block.to_vec(),
            edge_done: BitVec::repeat(false, block.len()),
            node_done: BitVec::repeat(false, nodes.len()),
            nodes,
            ends,
            adj,
            local,
            embedding,
        }
    }

    /// Some cycle of the block: a tree path closed by the first back edge of a DFS.
    fn find_cycle(&self) -> Option<(Vec<usize>, Vec<usize>)> {
        const UNSEEN: usize = usize::MAX;
        let n = self.nodes.len();
        let mut parent = vec![(UNSEEN, UNSEEN); n];
        let mut seen: BitVec = BitVec::repeat(false, n);
        let mut stack = vec![(0usize, UNSEEN, 0usize)];
        seen.set(0, true);

        while let Some((v, via, pos)) = stack.last_mut() {
            let v = *v;
            let Some(&(w, e)) = self.adj[v].get(*pos) else {
                stack.pop();
                continue;
            };
            *pos += 1;
            if e == *via {
                continue;
            }
            if !seen.replace(w, true) {
                parent[w] = (v, e);
                stack.push((w, e, 0));
                continue;
            }
            // w is an ancestor of v
            let mut nodes = vec![w];
            let mut edges = Vec::new();
            let mut path = Vec::new();
            let mut cur = v;
            while cur != w {
                let (p, pe) = parent[cur];
                path.push((cur, pe));
                cur = p;
            }
            for (node, edge) in path.into_iter().rev() {
                edges.push(edge);
                nodes.push(node);
            }
            nodes.push(w);
            edges.push(e);
            return Some((nodes, edges));
        }
        None
    }

    fn corner(&self, node: usize, face: Option<FaceId>) -> Result<Corner, PlanarizationError> {
        let n = NodeIndex(node);
        if self.local.degree(n) == 0 {
            return Ok(Corner::Node(n));
        }
        face.and_then(|f| self.embedding.corner(&self.local, n, f))
            .map(Corner::Before)
            .ok_or(PlanarizationError::NotPlanar)
    }

    /// Inserts the walk `nodes[0], edges[0], nodes[1], …` inside `face`.
    ///
    /// Both ends of the walk are already embedded on `face` (or the walk is the first
    /// cycle); its inner nodes are not embedded yet.
    fn embed_path(
        &mut self,
        nodes: &[usize],
        edges: &[usize],
        mut face: Option<FaceId>,
    ) -> Result<(), PlanarizationError> {
        for (i, &pos) in edges.iter().enumerate() {
            let (a, b) = (nodes[i], nodes[i + 1]);
            let source = self.corner(a, face)?;
            let sink = self.corner(b, face)?;
            let data = EdgeIndex(pos);
            let e = self
                .embedding
                .insert_edge(&mut self.local, source, sink, data)?;
            face = Some(self.embedding.left_face(self.local.hedge_pair(e).source));
            self.edge_done.set(pos, true);
            self.node_done.set(a, true);
            self.node_done.set(b, true);
        }
        Ok(())
    }

    fn fragments(&self) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        let mut seen: BitVec = BitVec::repeat(false, self.nodes.len());

        for (pos, &(a, b)) in self.ends.iter().enumerate() {
            if !self.edge_done[pos] && self.node_done[a] && self.node_done[b] {
                fragments.push(Fragment {
                    edges: vec![pos],
                    attachments: vec![a, b],
                });
            }
        }

        for root in 0..self.nodes.len() {
            if self.node_done[root] || seen.replace(root, true) {
                continue;
            }
            let mut edges = Vec::new();
            let mut attachments = Vec::new();
            let mut stack = vec![root];
            while let Some(v) = stack.pop() {
                for &(w, pos) in &self.adj[v] {
                    if self.edge_done[pos] || edges.contains(&pos) {
                        continue;
                    }
                    edges.push(pos);
                    if self.node_done[w] {
                        if !attachments.contains(&w) {
                            attachments.push(w);
                        }
                    } else if !seen.replace(w, true) {
                        stack.push(w);
                    }
                }
            }
            fragments.push(Fragment { edges, attachments });
        }
        fragments
    }

    /// Every face with a membership mask over the local nodes.
    fn face_members(&self) -> Vec<(FaceId, BitVec)> {
        self.embedding
            .faces()
            .map(|f| {
                let mut members: BitVec = BitVec::repeat(false, self.nodes.len());
                for n in self.embedding.face_nodes(&self.local, f) {
                    members.set(n.0, true);
                }
                (f, members)
            })
            .collect()
    }

    /// A path through `fragment` between two distinct attachments.
    fn fragment_path(&self, fragment: &Fragment) -> (Vec<usize>, Vec<usize>) {
        if let [pos] = fragment.edges.as_slice() {
            let (a, b) = self.ends[*pos];
            if self.node_done[a] && self.node_done[b] {
                return (vec![a, b], vec![*pos]);
            }
        }

        const UNSEEN: usize = usize::MAX;
        let start = fragment.attachments[0];
        let mut parent = vec![(UNSEEN, UNSEEN); self.nodes.len()];
        let mut queue = std::collections::VecDeque::from([start]);
        parent[start] = (start, UNSEEN);
        let mut end = None;
        'search: while let Some(v) = queue.pop_front() {
            for &(w, pos) in &self.adj[v] {
                if self.edge_done[pos] || !fragment.edges.contains(&pos) {
                    continue;
                }
                if self.node_done[w] {
                    if w != start && v != start {
                        parent[w] = (v, pos);
                        end = Some(w);
                        break 'search;
                    }
                    continue;
                }
                if parent[w].0 == UNSEEN {
                    parent[w] = (v, pos);
                    queue.push_back(w);
                }
            }
        }

        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut cur = end.unwrap_or(start);
        while cur != start {
            let (p, pos) = parent[cur];
            nodes.push(cur);
            edges.push(pos);
            cur = p;
        }
        nodes.push(start);
        nodes.reverse();
        edges.reverse();
        (nodes, edges)
    }

    /// The local rotations, translated back to hedges of `graph`.
    fn rotations<E, V>(&self, graph: &HedgeGraph<E, V>) -> Vec<(NodeIndex, Vec<Hedge>)> {
        self.local
            .iter_nodes()
            .map(|(n, &original)| {
                let hedges = self
                    .local
                    .iter_crown(n)
                    .filter_map(|h| {
                        let pos = self.local[self.local.edge_id(h)];
                        graph.hedge_at(self.block[pos.0], original)
                    })
                    .collect();
                (original, hedges)
            })
            .collect()
    }
}
