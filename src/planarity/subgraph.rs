//! Maximal planar subgraphs by a PQ-tree sweep over st-numberings.
//!
//! Within every block the vertices are visited in st-order. The PQ-tree holds the edges
//! leading from the visited part to the rest, in every order a planar embedding of the
//! visited part allows around its outer face. At each vertex the edges arriving there
//! must be consecutive; when they cannot be made so, the fewest of them are dropped.

use std::cmp::Reverse;

use ahash::AHashMap;
use indexmap::IndexSet;
use itertools::Itertools;
use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::{debug, trace};

use super::{check_loopless, PlanarizationError, PlanarizationOptions, Status};
use crate::{
    half_edge::{involution::EdgeIndex, HedgeGraph, NodeIndex},
    pq_tree::{PqTree, PqTreeError},
};

/// The edges a [`SubgraphExtractor`] had to delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubgraphResult {
    pub deleted: IndexSet<EdgeIndex>,
    pub status: Status,
}

pub trait SubgraphExtractor {
    /// Picks edges whose removal leaves `graph` planar.
    fn extract<E, V>(
        &self,
        graph: &HedgeGraph<E, V>,
        options: &PlanarizationOptions,
    ) -> Result<SubgraphResult, PlanarizationError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PqPlanarSubgraph;

impl SubgraphExtractor for PqPlanarSubgraph {
    fn extract<E, V>(
        &self,
        graph: &HedgeGraph<E, V>,
        options: &PlanarizationOptions,
    ) -> Result<SubgraphResult, PlanarizationError> {
        check_loopless(graph)?;
        let blocks = graph.biconnected_components();
        let mut deleted = IndexSet::new();

        for (i, block) in blocks.blocks.iter().enumerate() {
            if blocks.block_nodes(graph, i).len() < 3 {
                continue;
            }
            let cost = |set: &IndexSet<EdgeIndex>| -> u64 {
                set.iter().map(|e| u64::from(options.cost_of(*e))).sum()
            };

            let mut best: Option<IndexSet<EdgeIndex>> = None;
            for run in 0..options.runs.max(1) {
                let mut rng =
                    (run > 0).then(|| SmallRng::seed_from_u64(options.seed.wrapping_add(run as u64)));
                let removed = sweep_block(graph, block, options, rng.as_mut())?;
                trace!(block = i, run, deleted = removed.len(), "sweep finished");
                let better = best.as_ref().map_or(true, |b| {
                    (removed.len(), cost(&removed)) < (b.len(), cost(b))
                });
                if better {
                    best = Some(removed);
                }
            }
            deleted.extend(best.into_iter().flatten());
        }

        let status = if deleted.is_empty() {
            Status::Optimal
        } else {
            Status::Suboptimal
        };
        debug!(deleted = deleted.len(), "planar subgraph extracted");
        Ok(SubgraphResult { deleted, status })
    }
}

/// One sweep over a block, returning the edges it dropped.
fn sweep_block<E, V>(
    graph: &HedgeGraph<E, V>,
    block: &[EdgeIndex],
    options: &PlanarizationOptions,
    mut rng: Option<&mut SmallRng>,
) -> Result<IndexSet<EdgeIndex>, PlanarizationError> {
    let st_edge = match rng.as_deref_mut() {
        Some(rng) => block[rng.gen_range(0..block.len())],
        None => block[0],
    };
    let st = graph.st_numbering(block, st_edge, rng.as_deref_mut())?;

    let mut incident: AHashMap<NodeIndex, Vec<EdgeIndex>> = AHashMap::new();
    for &e in block {
        let (s, t) = graph.endpoints(e);
        incident.entry(s).or_default().push(e);
        incident.entry(t).or_default().push(e);
    }
    let number = |n: NodeIndex| st.of(n).unwrap_or(usize::MAX);
    let split = |v: NodeIndex| -> (Vec<EdgeIndex>, Vec<EdgeIndex>) {
        let k = number(v);
        incident
            .get(&v)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .copied()
            .partition(|e| {
                let (s, t) = graph.endpoints(*e);
                let other = if s == v { t } else { s };
                number(other) < k
            })
    };

    let mut deleted = IndexSet::new();
    let (_, upper) = split(st.s());
    let mut tree = PqTree::new(upper);

    for &v in &st.order[1..] {
        let (lower, upper) = split(v);
        let pertinent: Vec<EdgeIndex> = lower.into_iter().filter(|e| tree.contains(e)).collect();
        let root = match tree.reduce(&pertinent) {
            Ok(root) => root,
            Err(PqTreeError::Irreducible(_)) => {
                let kept = greedy_subset(&tree, &pertinent, options, rng.as_deref_mut());
                let rejected: Vec<_> = pertinent
                    .iter()
                    .copied()
                    .filter(|e| !kept.contains(e))
                    .collect();
                trace!(node = %v, kept = kept.len(), rejected = rejected.len(), "dropping edges");
                tree.remove_leaves(&rejected)?;
                deleted.extend(rejected);
                tree.reduce(&kept)?
            }
            Err(err) => return Err(err.into()),
        };
        tree.replace_pertinent(root, &upper)?;
    }
    Ok(deleted)
}

/// A maximal subset of `pertinent` that the tree can make consecutive once the other
/// pertinent leaves are gone. Never empty.
///
/// Each candidate is tried on its own copy of the tree, so resolving one vertex costs
/// O(|pertinent| * tree size).
fn greedy_subset(
    tree: &PqTree<EdgeIndex>,
    pertinent: &[EdgeIndex],
    options: &PlanarizationOptions,
    rng: Option<&mut SmallRng>,
) -> Vec<EdgeIndex> {
    let mut candidates = pertinent.to_vec();
    if let Some(rng) = rng {
        candidates.shuffle(rng);
    }
    let candidates = candidates.into_iter().sorted_by_key(|e| {
        (
            !(options.is_preferred(*e) || options.is_forbidden(*e)),
            Reverse(options.cost_of(*e)),
        )
    });

    let mut kept: Vec<EdgeIndex> = Vec::new();
    for candidate in candidates {
        let mut trial = tree.clone();
        let others: Vec<_> = pertinent
            .iter()
            .copied()
            .filter(|e| *e != candidate && !kept.contains(e))
            .collect();
        kept.push(candidate);
        let fits = trial.remove_leaves(&others).is_ok() && trial.reduce(&kept).is_ok();
        if !fits {
            kept.pop();
        }
    }
    kept
}
