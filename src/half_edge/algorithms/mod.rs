//! # Graph Algorithms for Half-Edge Data Structure
//!
//! This module provides the connectivity algorithms the planarization pipeline needs,
//! written against the half-edge representation. All of them are iterative (explicit
//! stacks and queues), so deep graphs do not exhaust the call stack.
//!
//! ## Available Algorithms
//!
//! ### Connectivity
//! - [`connectivity`]: connected components, simplicity and triconnectivity checks
//!
//! ### Blocks
//! - [`biconnected`]: biconnected components and cut vertices (Hopcroft–Tarjan)
//!
//! ### Orderings
//! - [`st_numbering`]: st-numberings of biconnected blocks (Even–Tarjan with Ebert's
//!   sign list)
//!
//! ## Half-Edge Considerations
//!
//! Parallel edges are distinct edges: a DFS only skips the very edge it arrived by, so
//! a doubled edge counts as a cycle. Self-loops carry no connectivity information and
//! are ignored.

pub mod biconnected;
pub mod connectivity;
pub mod st_numbering;
