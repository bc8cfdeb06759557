//! # Planarize
//!
//! Planarize turns arbitrary graphs into planar ones and draws them.
//!
//! Graphs are stored as half-edge structures with an explicit rotation system
//! ([`half_edge`]), so an embedding is always just the cyclic order of hedges around
//! every node. On top of that the crate provides
//!
//! - [`pq_tree`]: PQ-trees with the Booth–Lueker reduction templates,
//! - [`planarity`]: maximal planar subgraphs, planar embeddings and edge insertion with
//!   crossing nodes, composed by [`planarity::Planarizer`],
//! - [`shelling`]: canonical (shelling) orders of planar embeddings and straight-line
//!   grid drawings computed from them.
//!
//! Everything logs through [`tracing`]; install a subscriber to see what the
//! algorithms decide.

pub mod half_edge;
pub mod permutation;
pub mod planarity;
pub mod pq_tree;
pub mod shelling;
pub mod union_find;
