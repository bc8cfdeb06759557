//! # Planarization
//!
//! The pipeline that turns an arbitrary [`HedgeGraph`] into an embedded planar
//! representation:
//!
//! 1. a [`SubgraphExtractor`] picks edges to delete so that the rest is planar,
//! 2. an [`Embedder`] computes a planar rotation system for the rest,
//! 3. an [`EdgeInserter`] threads the deleted edges back in through the faces, putting
//!    a crossing node wherever an edge has to be crossed,
//! 4. optionally a [`GridPlacer`] draws the result on an integer grid, from a
//!    [`ShellingOrder`].
//!
//! [`Planarizer`] composes one implementation of each step. Everything that tunes the
//! run (costs, forbidden and preferred edges, randomized runs, seeds) lives in
//! [`PlanarizationOptions`], which is passed explicitly to every step.
//!
//! ```
//! use planarize::half_edge::builder::HedgeGraphBuilder;
//! use planarize::planarity::{PlanarizationOptions, Planarizer};
//!
//! let mut builder = HedgeGraphBuilder::new();
//! let nodes: Vec<_> = (0..5).map(|_| builder.add_node(())).collect();
//! for i in 0..5 {
//!     for j in i + 1..5 {
//!         builder.add_edge(nodes[i], nodes[j], ());
//!     }
//! }
//! let k5 = builder.build();
//!
//! let planarizer: Planarizer = Planarizer::default();
//! let planarization = planarizer
//!     .planarize(&k5, &PlanarizationOptions::default())
//!     .unwrap();
//! assert_eq!(planarization.crossings(), 1);
//! ```

use std::fmt::Display;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::debug;

use crate::{
    half_edge::{
        algorithms::st_numbering::StNumberingError,
        embedding::{EmbeddingError, FaceId},
        involution::EdgeIndex,
        HedgeGraph, HedgeGraphError, NodeIndex,
    },
    pq_tree::PqTreeError,
    shelling::{grid::GridLayout, ShellingOrder},
};

pub mod embedder;
pub mod insertion;
pub mod planrep;
pub mod subgraph;

pub use embedder::{Embedder, GivenRotation, PathAdditionEmbedder};
pub use insertion::{EdgeInserter, FixedEmbeddingInserter, InsertionReport};
pub use planrep::{PlanarRepresentation, RepEdge, RepNode};
pub use subgraph::{PqPlanarSubgraph, SubgraphExtractor, SubgraphResult};

/// Which caller bug was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    #[error("edge {edge} is a self-loop at node {node}")]
    SelfLoop { edge: EdgeIndex, node: NodeIndex },
    #[error("edge {0} does not exist")]
    UnknownEdge(EdgeIndex),
    #[error("node {0} does not exist")]
    UnknownNode(NodeIndex),
    #[error("face {0} does not exist")]
    UnknownFace(FaceId),
    #[error("the graph must be planar with the given rotation system")]
    NotPlanar,
    #[error("no canonical ordering exists, the graph is not triconnected")]
    NotTriconnected,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanarizationError {
    #[error("No admissible path exists to insert edge {edge}")]
    Infeasible { edge: EdgeIndex },
    #[error("Precondition violated: {0}")]
    PreconditionViolated(Precondition),
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    #[error("The graph is not planar")]
    NotPlanar,
    #[error(transparent)]
    Graph(#[from] HedgeGraphError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Reduction(#[from] PqTreeError),
    #[error(transparent)]
    StNumbering(#[from] StNumberingError),
}

impl From<Precondition> for PlanarizationError {
    fn from(value: Precondition) -> Self {
        PlanarizationError::PreconditionViolated(value)
    }
}

/// Whether a heuristic step is known to have found the best possible result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    Optimal,
    Suboptimal,
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Optimal => write!(f, "optimal"),
            Status::Suboptimal => write!(f, "suboptimal"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubgraphMethod {
    /// The PQ-tree sweep of [`PqPlanarSubgraph`].
    #[default]
    PqTree,
    /// An exact maximum planar subgraph. No solver for it is built in.
    Exact,
}

/// Which edges the inserter removes and reroutes after the first insertion pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemoveReinsert {
    #[default]
    None,
    /// Every edge that was inserted.
    Inserted,
    /// The given percentage of all edges, those with the most crossings first.
    MostCrossed { percent: u8 },
    /// Every edge of the representation.
    All,
    /// After every insertion, one round over the edges inserted so far.
    Incremental,
}

/// Tuning for one pipeline run.
///
/// Edge ids refer to the input graph. Costs default to 1; a cost of 0 counts as 1.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanarizationOptions {
    pub method: SubgraphMethod,
    /// Number of extraction runs; run 0 is deterministic, later ones randomized.
    pub runs: usize,
    /// Number of insertion orders tried; trial 0 keeps the given order.
    pub permutations: usize,
    pub seed: u64,
    pub remove_reinsert: RemoveReinsert,
    pub costs: IndexMap<EdgeIndex, u32>,
    /// Edges that may not be crossed by inserted edges.
    pub forbidden: IndexSet<EdgeIndex>,
    /// Edges the extractor tries hardest to keep.
    pub preferred: IndexSet<EdgeIndex>,
}

impl Default for PlanarizationOptions {
    fn default() -> Self {
        PlanarizationOptions {
            method: SubgraphMethod::default(),
            runs: 1,
            permutations: 1,
            seed: 0,
            remove_reinsert: RemoveReinsert::default(),
            costs: IndexMap::new(),
            forbidden: IndexSet::new(),
            preferred: IndexSet::new(),
        }
    }
}

impl PlanarizationOptions {
    pub fn method(mut self, method: SubgraphMethod) -> Self {
        self.method = method;
        self
    }

    pub fn runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn permutations(mut self, permutations: usize) -> Self {
        self.permutations = permutations;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn remove_reinsert(mut self, mode: RemoveReinsert) -> Self {
        self.remove_reinsert = mode;
        self
    }

    pub fn cost(mut self, edge: EdgeIndex, cost: u32) -> Self {
        self.costs.insert(edge, cost);
        self
    }

    pub fn forbid(mut self, edges: impl IntoIterator<Item = EdgeIndex>) -> Self {
        self.forbidden.extend(edges);
        self
    }

    pub fn prefer(mut self, edges: impl IntoIterator<Item = EdgeIndex>) -> Self {
        self.preferred.extend(edges);
        self
    }

    /// The cost of `edge` of the input graph.
    pub fn cost_of(&self, edge: EdgeIndex) -> u32 {
        self.costs.get(&edge).copied().unwrap_or(1).max(1)
    }

    pub fn is_forbidden(&self, edge: EdgeIndex) -> bool {
        self.forbidden.contains(&edge)
    }

    pub fn is_preferred(&self, edge: EdgeIndex) -> bool {
        self.preferred.contains(&edge)
    }

    /// Rejects unsupported settings and malformed inputs before any work is done.
    pub fn validate<E, V>(&self, graph: &HedgeGraph<E, V>) -> Result<(), PlanarizationError> {
        if self.method == SubgraphMethod::Exact {
            return Err(PlanarizationError::UnsupportedConfiguration(
                "exact planar subgraphs need an external solver".to_owned(),
            ));
        }
        if let RemoveReinsert::MostCrossed { percent } = self.remove_reinsert {
            if percent > 100 {
                return Err(PlanarizationError::UnsupportedConfiguration(format!(
                    "cannot reinsert {percent}% of the edges"
                )));
            }
        }
        let unknown = self
            .costs
            .keys()
            .chain(&self.forbidden)
            .chain(&self.preferred)
            .find(|e| !graph.is_live_edge(**e));
        if let Some(&edge) = unknown {
            return Err(Precondition::UnknownEdge(edge).into());
        }
        check_loopless(graph)
    }
}

pub(crate) fn check_loopless<E, V>(graph: &HedgeGraph<E, V>) -> Result<(), PlanarizationError> {
    match graph.find_self_loop() {
        Some(edge) => Err(Precondition::SelfLoop {
            edge,
            node: graph.endpoints(edge).0,
        }
        .into()),
        None => Ok(()),
    }
}

/// Computes integer coordinates from a shelling order.
pub trait GridPlacer {
    fn place(&self, order: &ShellingOrder) -> Result<GridLayout, PlanarizationError>;
}

/// The outcome of [`Planarizer::planarize`].
#[derive(Clone, Debug)]
pub struct Planarization<'g, E, V> {
    pub representation: PlanarRepresentation<'g, E, V>,
    /// Edges the extractor had to delete, reinserted with crossings.
    pub deleted: IndexSet<EdgeIndex>,
    pub status: Status,
    pub report: InsertionReport,
}

impl<E, V> Planarization<'_, E, V> {
    pub fn crossings(&self) -> usize {
        self.representation.number_of_crossings()
    }
}

/// The pipeline driver, generic over its steps.
#[derive(Clone, Debug, Default)]
pub struct Planarizer<
    S = PqPlanarSubgraph,
    M = PathAdditionEmbedder,
    I = FixedEmbeddingInserter,
    G = crate::shelling::grid::ShiftMethod,
> {
    pub extractor: S,
    pub embedder: M,
    pub inserter: I,
    pub placer: G,
}

impl<S, M, I, G> Planarizer<S, M, I, G>
where
    S: SubgraphExtractor,
    M: Embedder,
    I: EdgeInserter,
    G: GridPlacer,
{
    pub fn new(extractor: S, embedder: M, inserter: I, placer: G) -> Self {
        Planarizer {
            extractor,
            embedder,
            inserter,
            placer,
        }
    }

    /// Extracts a planar subgraph, embeds it and reinserts the deleted edges.
    pub fn planarize<'g, E, V>(
        &self,
        graph: &'g HedgeGraph<E, V>,
        options: &PlanarizationOptions,
    ) -> Result<Planarization<'g, E, V>, PlanarizationError> {
        options.validate(graph)?;

        let SubgraphResult { deleted, status } = self.extractor.extract(graph, options)?;
        debug!(deleted = deleted.len(), %status, "extracted planar subgraph");

        let mut representation = PlanarRepresentation::new(graph, &deleted, &self.embedder)?;
        debug!(
            faces = representation.embedding().n_faces(),
            "embedded planar subgraph"
        );

        let edges: Vec<_> = deleted.iter().copied().collect();
        let report = self.inserter.insert_all(&mut representation, &edges, options)?;
        debug!(crossings = report.crossings, "reinserted deleted edges");

        Ok(Planarization {
            representation,
            deleted,
            status,
            report,
        })
    }

    /// Shelling order and grid drawing of a planarized representation.
    ///
    /// `external` is a face of the representation's embedding.
    pub fn layout<E, V>(
        &self,
        planarization: &Planarization<'_, E, V>,
        external: Option<FaceId>,
    ) -> Result<(ShellingOrder, GridLayout), PlanarizationError> {
        let representation = &planarization.representation;
        let order = ShellingOrder::compute(
            representation.graph(),
            representation.embedding(),
            external,
        )?;
        let layout = self.placer.place(&order)?;
        debug!(
            steps = order.len(),
            width = layout.width(),
            height = layout.height(),
            "placed on the grid"
        );
        Ok((order, layout))
    }
}
