//! Graph data structures and operations.
//!
//! This module provides the keyed directed graph the layout engine consumes,
//! built on petgraph's StableGraph with a key→index map for O(1) lookup by
//! caller-supplied ids. Adjacency is bidirectional and vertex/edge counts
//! are maintained transactionally with every mutation.

mod digraph;
mod error;

pub use digraph::{DiGraph, VertexId};
pub use error::GraphError;
