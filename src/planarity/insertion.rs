//! Reinserting edges into a fixed embedding.
//!
//! An edge `(u, v)` is routed along a shortest path in the dual graph: from a face at
//! `u` to a face at `v`, paying for every representation edge it crosses. The dual is
//! never built; the search walks face boundaries of the embedding directly.

use std::{cmp::Reverse, collections::BinaryHeap};

use bitvec::vec::BitVec;
use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, trace};

use super::{
    planrep::PlanarRepresentation, PlanarizationError, PlanarizationOptions, Precondition,
    RemoveReinsert,
};
use crate::half_edge::{
    embedding::FaceId,
    involution::{EdgeIndex, Hedge},
    Corner, NodeIndex,
};

/// What an [`EdgeInserter`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertionReport {
    /// Crossings of the final representation.
    pub crossings: usize,
    /// Remove-reinsert rounds run for the kept trial.
    pub rounds: usize,
    /// Which insertion order was kept; 0 is the given one.
    pub trial: usize,
}

pub trait EdgeInserter {
    /// Inserts the original `edges`, none of which may be in `rep` yet.
    fn insert_all<E, V>(
        &self,
        rep: &mut PlanarRepresentation<'_, E, V>,
        edges: &[EdgeIndex],
        options: &PlanarizationOptions,
    ) -> Result<InsertionReport, PlanarizationError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FixedEmbeddingInserter;

impl EdgeInserter for FixedEmbeddingInserter {
    fn insert_all<E, V>(
        &self,
        rep: &mut PlanarRepresentation<'_, E, V>,
        edges: &[EdgeIndex],
        options: &PlanarizationOptions,
    ) -> Result<InsertionReport, PlanarizationError> {
        for &e in edges {
            if !rep.original().is_live_edge(e) {
                return Err(Precondition::UnknownEdge(e).into());
            }
            if rep.contains_edge(e) {
                return Err(PlanarizationError::UnsupportedConfiguration(format!(
                    "edge {e} is already part of the representation"
                )));
            }
        }

        let mut best: Option<(PlanarRepresentation<'_, E, V>, InsertionReport)> = None;
        for trial in 0..options.permutations.max(1) {
            let mut order = edges.to_vec();
            if trial > 0 {
                let mut rng = SmallRng::seed_from_u64(options.seed.wrapping_add(trial as u64));
                order.shuffle(&mut rng);
            }
            let mut work = rep.clone();
            let rounds = run_trial(&mut work, &order, options)?;
            let report = InsertionReport {
                crossings: work.number_of_crossings(),
                rounds,
                trial,
            };
            trace!(trial, crossings = report.crossings, rounds, "insertion trial");
            if best
                .as_ref()
                .map_or(true, |(_, b)| report.crossings < b.crossings)
            {
                best = Some((work, report));
            }
        }

        let Some((work, report)) = best else {
            return Ok(InsertionReport::default());
        };
        *rep = work;
        debug!(
            inserted = edges.len(),
            crossings = report.crossings,
            trial = report.trial,
            "edges inserted"
        );
        Ok(report)
    }
}

fn run_trial<E, V>(
    rep: &mut PlanarRepresentation<'_, E, V>,
    order: &[EdgeIndex],
    options: &PlanarizationOptions,
) -> Result<usize, PlanarizationError> {
    let mut rounds = 0;
    for (i, &e) in order.iter().enumerate() {
        route(rep, e, options)?;
        if options.remove_reinsert == RemoveReinsert::Incremental && i > 0 {
            reinsert_round(rep, &order[..=i], options)?;
            rounds += 1;
        }
    }

    let candidates: Vec<EdgeIndex> = match options.remove_reinsert {
        RemoveReinsert::None | RemoveReinsert::Incremental => return Ok(rounds),
        RemoveReinsert::Inserted => order.to_vec(),
        RemoveReinsert::All => rep.edges().collect(),
        RemoveReinsert::MostCrossed { percent } => {
            let mut edges: Vec<(usize, EdgeIndex)> = rep
                .edges()
                .map(|e| (rep.chain(e).len() - 1, e))
                .collect();
            edges.sort_by_key(|(crossings, _)| Reverse(*crossings));
            let take = (edges.len() * usize::from(percent)).div_ceil(100);
            edges.into_iter().take(take).map(|(_, e)| e).collect()
        }
    };

    loop {
        rounds += 1;
        if !reinsert_round(rep, &candidates, options)? {
            break;
        }
    }
    Ok(rounds)
}

/// Reroutes every edge of `candidates` once. Returns whether any route got cheaper.
fn reinsert_round<E, V>(
    rep: &mut PlanarRepresentation<'_, E, V>,
    candidates: &[EdgeIndex],
    options: &PlanarizationOptions,
) -> Result<bool, PlanarizationError> {
    let mut improved = false;
    for &e in candidates {
        let before: u64 = rep
            .crossed_by(e)
            .into_iter()
            .map(|c| u64::from(options.cost_of(c)))
            .sum();
        if before == 0 {
            continue;
        }
        rep.remove_edge_path(e)?;
        let after = route(rep, e, options)?;
        trace!(edge = %e, before, after, "rerouted");
        improved |= after < before;
    }
    Ok(improved)
}

/// Threads the original edge `edge` through the representation. Returns the cost of
/// the crossings it needed.
fn route<E, V>(
    rep: &mut PlanarRepresentation<'_, E, V>,
    edge: EdgeIndex,
    options: &PlanarizationOptions,
) -> Result<u64, PlanarizationError> {
    let (u, v) = rep.original().endpoints(edge);
    let (u, v) = (rep.rep_node(u)?, rep.rep_node(v)?);
    let graph = rep.graph();

    if graph.degree(u) == 0 || graph.degree(v) == 0 {
        let (source, sink) = (any_corner(rep, u), any_corner(rep, v));
        rep.push_segment(edge, source, sink)?;
        return Ok(0);
    }

    let Some((start, crossed, cost)) = shortest_dual_path(rep, u, v, options) else {
        if graph.connected_components().same(u, v) {
            return Err(PlanarizationError::Infeasible { edge });
        }
        let (source, sink) = (any_corner(rep, u), any_corner(rep, v));
        rep.push_segment(edge, source, sink)?;
        return Ok(0);
    };

    let mut prev = u;
    let mut face = start;
    for h in crossed {
        let next_face = rep.embedding().right_face(rep.graph(), h);
        let x = rep.expand_crossing(edge, rep.graph().edge_id(h))?;
        let source = face_corner(rep, prev, face)?;
        let sink = face_corner(rep, x, face)?;
        rep.push_segment(edge, source, sink)?;
        prev = x;
        face = next_face;
    }
    let source = face_corner(rep, prev, face)?;
    let sink = face_corner(rep, v, face)?;
    rep.push_segment(edge, source, sink)?;
    Ok(cost)
}

fn any_corner<E, V>(rep: &PlanarRepresentation<'_, E, V>, node: NodeIndex) -> Corner {
    match rep.graph().anchor(node) {
        Some(h) => Corner::Before(h),
        None => Corner::Node(node),
    }
}

fn face_corner<E, V>(
    rep: &PlanarRepresentation<'_, E, V>,
    node: NodeIndex,
    face: FaceId,
) -> Result<Corner, PlanarizationError> {
    rep.embedding()
        .corner(rep.graph(), node, face)
        .map(Corner::Before)
        .ok_or_else(|| Precondition::UnknownFace(face).into())
}

/// Dijkstra over the faces: from the faces around `u` to the first face around `v`.
///
/// Returns the face the route starts in, the hedges it crosses (each seen from the face
/// the route leaves) and the total cost.
fn shortest_dual_path<E, V>(
    rep: &PlanarRepresentation<'_, E, V>,
    u: NodeIndex,
    v: NodeIndex,
    options: &PlanarizationOptions,
) -> Option<(FaceId, Vec<Hedge>, u64)> {
    let graph = rep.graph();
    let embedding = rep.embedding();
    let bound = embedding.face_bound();
    let mut dist = vec![u64::MAX; bound];
    let mut entered_by: Vec<Option<Hedge>> = vec![None; bound];
    let mut target: BitVec = BitVec::repeat(false, bound);
    let mut heap = BinaryHeap::new();

    for (_, f) in embedding.corners(graph, v) {
        target.set(f.0, true);
    }
    for (_, f) in embedding.corners(graph, u) {
        if dist[f.0] != 0 {
            dist[f.0] = 0;
            heap.push(Reverse((0u64, f.0)));
        }
    }

    while let Some(Reverse((d, f))) = heap.pop() {
        if d > dist[f] {
            continue;
        }
        if target[f] {
            let mut crossed = Vec::new();
            let mut face = f;
            while let Some(h) = entered_by[face] {
                crossed.push(h);
                face = embedding.left_face(h).0;
            }
            crossed.reverse();
            return Some((FaceId(face), crossed, d));
        }
        for h in embedding.face_hedges(graph, FaceId(f)) {
            let g = embedding.right_face(graph, h).0;
            let crossed = rep.original_edge(graph.edge_id(h));
            if g == f || options.is_forbidden(crossed) {
                continue;
            }
            let nd = d + u64::from(options.cost_of(crossed));
            if nd < dist[g] {
                dist[g] = nd;
                entered_by[g] = Some(h);
                heap.push(Reverse((nd, g)));
            }
        }
    }
    None
}
