//! Error taxonomy for graph operations.
//!
//! Every error is synchronous and deterministic: a failed operation commits
//! no partial state, so callers can treat these as plain precondition
//! violations.

use std::fmt::Debug;

use thiserror::Error;

/// Errors returned by [`DiGraph`](super::DiGraph) mutations and queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError<K: Debug> {
    /// An operation referenced a vertex id that is not in the graph.
    #[error("unknown vertex: {0:?}")]
    UnknownVertex(K),

    /// An operation referenced an edge pair that is not in the graph.
    #[error("unknown edge: ({0:?}, {1:?})")]
    UnknownEdge(K, K),

    /// An insertion would duplicate an existing vertex id.
    #[error("duplicated vertex: {0:?}")]
    DuplicateVertex(K),

    /// An insertion would duplicate an existing ordered edge pair.
    #[error("duplicated edge: ({0:?}, {1:?})")]
    DuplicateEdge(K, K),

    /// Self-loop edges have no layering semantics and are rejected outright.
    #[error("self-loop edge rejected: {0:?}")]
    SelfLoop(K),
}
