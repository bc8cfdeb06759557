//! Planar augmentation of an embedded graph.
//!
//! Every added edge is inserted into a face that already contains both of its
//! endpoints, so the embedding stays planar and the rotations of the original edges
//! keep their relative order. Added edges carry `None` as their data.

use ahash::AHashSet;
use tracing::{debug, trace};

use super::AugmentedGraph;
use crate::{
    half_edge::{embedding::CombinatorialEmbedding, involution::EdgeIndex, Corner, NodeIndex},
    planarity::PlanarizationError,
    union_find::UnionFind,
};

/// Drops self-loops and all but the first of every bundle of parallel edges.
///
/// Returns the number of removed edges.
pub fn simplify(
    graph: &mut AugmentedGraph,
    embedding: &mut CombinatorialEmbedding,
) -> Result<usize, PlanarizationError> {
    let mut seen = AHashSet::new();
    let doomed: Vec<EdgeIndex> = graph
        .iter_edge_ids()
        .filter(|&e| {
            let (s, t) = graph.endpoints(e);
            s == t || !seen.insert((s.min(t), s.max(t)))
        })
        .collect();
    for &e in &doomed {
        embedding.remove_edge(graph, e)?;
    }
    Ok(doomed.len())
}

/// Connects, biconnects and triangulates. Returns the number of added edges.
pub fn augment(
    graph: &mut AugmentedGraph,
    embedding: &mut CombinatorialEmbedding,
    root: NodeIndex,
) -> Result<usize, PlanarizationError> {
    let connected = connect(graph, embedding, root)?;
    let biconnected = biconnect(graph, embedding)?;
    let triangulated = triangulate(graph, embedding)?;
    debug!(connected, biconnected, triangulated, "augmented");
    Ok(connected + biconnected + triangulated)
}

fn any_corner(graph: &AugmentedGraph, node: NodeIndex) -> Corner {
    match graph.anchor(node) {
        Some(h) => Corner::Before(h),
        None => Corner::Node(node),
    }
}

/// Joins every other connected component to `root` by one edge.
pub fn connect(
    graph: &mut AugmentedGraph,
    embedding: &mut CombinatorialEmbedding,
    root: NodeIndex,
) -> Result<usize, PlanarizationError> {
    let components = graph.connected_components();
    let mut added = 0;
    for members in &components.members {
        let other = members[0];
        if components.same(root, other) {
            continue;
        }
        let source = any_corner(graph, root);
        match graph.anchor(other) {
            Some(h) => embedding.insert_edge(graph, source, Corner::Before(h), None)?,
            None => embedding.insert_edge_at_isolated(graph, source, other, None)?,
        };
        added += 1;
    }
    Ok(added)
}

/// Removes every cut vertex.
///
/// At a cut vertex `v`, two rotation-consecutive edges `(v, w1)` and `(v, w2)` from
/// different blocks share a face; the edge `(w1, w2)` is added inside it, merging the
/// two blocks. A union-find over the blocks remembers which blocks are merged already.
pub fn biconnect(
    graph: &mut AugmentedGraph,
    embedding: &mut CombinatorialEmbedding,
) -> Result<usize, PlanarizationError> {
    let decomposition = graph.biconnected_components();
    if decomposition.is_biconnected() || graph.n_edges() == 0 {
        return Ok(0);
    }

    let mut block_of = vec![usize::MAX; graph.edge_bound()];
    for (i, block) in decomposition.blocks.iter().enumerate() {
        for e in block {
            block_of[e.0] = i;
        }
    }
    let mut blocks = UnionFind::new(decomposition.blocks.len());
    let mut added = 0;

    let cut_vertices: Vec<NodeIndex> = graph
        .iter_node_ids()
        .filter(|v| decomposition.is_cut_vertex(*v))
        .collect();
    for v in cut_vertices {
        let crown: Vec<_> = graph.iter_crown(v).collect();
        for (i, &h1) in crown.iter().enumerate() {
            let h2 = crown[(i + 1) % crown.len()];
            let (b1, b2) = (block_of[graph.edge_id(h1).0], block_of[graph.edge_id(h2).0]);
            if blocks.same(b1, b2) {
                continue;
            }
            let (w1, w2) = (graph.opposite(h1), graph.opposite(h2));
            if graph.neighbors(w1).any(|n| n == w2) {
                continue;
            }
            let k = graph.face_next(h2);
            let e = embedding.insert_edge(
                graph,
                Corner::Before(k),
                Corner::Before(graph.inv(h1)),
                None,
            )?;
            trace!(%v, %w1, %w2, "joined blocks");
            blocks.union(b1, b2);
            block_of.resize(graph.edge_bound(), usize::MAX);
            block_of[e.0] = blocks.find(b1).0;
            added += 1;
        }
    }

    if !graph.biconnected_components().is_biconnected() {
        return Err(PlanarizationError::UnsupportedConfiguration(
            "biconnecting the embedding left a cut vertex".to_owned(),
        ));
    }
    Ok(added)
}

/// Splits every face with more than three corners by cutting off ears.
///
/// The graph must be simple and biconnected, so every face boundary is a simple cycle.
pub fn triangulate(
    graph: &mut AugmentedGraph,
    embedding: &mut CombinatorialEmbedding,
) -> Result<usize, PlanarizationError> {
    let mut added = 0;
    let faces: Vec<_> = embedding.faces().collect();
    for f in faces {
        while embedding.face_size(f) > 3 {
            let walk = embedding.face_hedges(graph, f);
            let s = walk.len();
            let ear = (0..s).find(|&i| {
                let prev = graph.node_id(walk[(i + s - 1) % s]);
                let next = graph.node_id(walk[(i + 1) % s]);
                prev != next && !graph.neighbors(prev).any(|n| n == next)
            });
            let Some(i) = ear else {
                return Err(PlanarizationError::UnsupportedConfiguration(format!(
                    "face {f} has no diagonal to add"
                )));
            };
            let before_prev = walk[(i + s - 1) % s];
            let after = walk[(i + 1) % s];
            embedding.insert_edge(
                graph,
                Corner::Before(after),
                Corner::Before(before_prev),
                None,
            )?;
            added += 1;
        }
    }
    Ok(added)
}
