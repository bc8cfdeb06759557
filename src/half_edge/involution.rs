use std::{fmt::Display, ops::Neg};

use derive_more::{From, Into};
use thiserror::Error;

/// A half-edge. Edge `e` owns the hedges `2e` (source side) and `2e + 1` (sink side).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hedge(pub usize);

impl Display for Hedge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "h{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeIndex(pub usize);

impl Display for EdgeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Which end of its edge a hedge sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Flow {
    Source,
    Sink,
}

impl Neg for Flow {
    type Output = Self;
    fn neg(self) -> Self::Output {
        match self {
            Flow::Source => Flow::Sink,
            Flow::Sink => Flow::Source,
        }
    }
}

impl Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Source => write!(f, "source"),
            Flow::Sink => write!(f, "sink"),
        }
    }
}

/// The two hedges of one edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HedgePair {
    pub source: Hedge,
    pub sink: Hedge,
}

impl HedgePair {
    pub fn hedge(&self, flow: Flow) -> Hedge {
        match flow {
            Flow::Source => self.source,
            Flow::Sink => self.sink,
        }
    }

    pub fn contains(&self, hedge: Hedge) -> bool {
        self.source == hedge || self.sink == hedge
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvolutiveMapping {
    Source { edge: EdgeIndex, sink_idx: Hedge },
    Sink { source_idx: Hedge },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvolutionError {
    #[error("Hedge {0} is not part of the involution")]
    UnknownHedge(Hedge),
    #[error("Edge {0} is not part of the involution")]
    UnknownEdge(EdgeIndex),
}

/// The pairing of hedges into edges: a fixed-point free involution `α` on the hedge set.
///
/// Twins and edge ids resolve by direct lookup.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Involution {
    pub(super) inv: Vec<InvolutiveMapping>,
}

impl Involution {
    pub fn new() -> Self {
        Involution { inv: Vec::new() }
    }

    pub fn with_capacity(n_edges: usize) -> Self {
        Involution {
            inv: Vec::with_capacity(2 * n_edges),
        }
    }

    /// Number of hedges.
    pub fn len(&self) -> usize {
        self.inv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inv.is_empty()
    }

    pub fn n_edges(&self) -> usize {
        self.inv.len() / 2
    }

    /// Adds a new edge, returning its id and its (source, sink) hedges.
    pub fn add_pair(&mut self) -> (EdgeIndex, HedgePair) {
        let edge = EdgeIndex(self.n_edges());
        let source = Hedge(self.inv.len());
        let sink = Hedge(self.inv.len() + 1);
        self.inv.push(InvolutiveMapping::Source {
            edge,
            sink_idx: sink,
        });
        self.inv.push(InvolutiveMapping::Sink { source_idx: source });
        (edge, HedgePair { source, sink })
    }

    /// The twin of `hedge`: `inv(inv(h)) = h` and `inv(h) != h`.
    pub fn inv(&self, hedge: Hedge) -> Hedge {
        match self.inv[hedge.0] {
            InvolutiveMapping::Source { sink_idx, .. } => sink_idx,
            InvolutiveMapping::Sink { source_idx } => source_idx,
        }
    }

    pub fn try_inv(&self, hedge: Hedge) -> Result<Hedge, InvolutionError> {
        if hedge.0 < self.inv.len() {
            Ok(self.inv(hedge))
        } else {
            Err(InvolutionError::UnknownHedge(hedge))
        }
    }

    pub fn edge_id(&self, hedge: Hedge) -> EdgeIndex {
        match self.inv[hedge.0] {
            InvolutiveMapping::Source { edge, .. } => edge,
            InvolutiveMapping::Sink { source_idx } => match self.inv[source_idx.0] {
                InvolutiveMapping::Source { edge, .. } => edge,
                InvolutiveMapping::Sink { .. } => unreachable!("sink paired with a sink"),
            },
        }
    }

    pub fn flow(&self, hedge: Hedge) -> Flow {
        match self.inv[hedge.0] {
            InvolutiveMapping::Source { .. } => Flow::Source,
            InvolutiveMapping::Sink { .. } => Flow::Sink,
        }
    }

    pub fn hedge_pair(&self, edge: EdgeIndex) -> HedgePair {
        HedgePair {
            source: Hedge(2 * edge.0),
            sink: Hedge(2 * edge.0 + 1),
        }
    }

    pub fn try_hedge_pair(&self, edge: EdgeIndex) -> Result<HedgePair, InvolutionError> {
        if edge.0 < self.n_edges() {
            Ok(self.hedge_pair(edge))
        } else {
            Err(InvolutionError::UnknownEdge(edge))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Hedge, &InvolutiveMapping)> {
        self.inv.iter().enumerate().map(|(i, m)| (Hedge(i), m))
    }
}
