//! Keyed directed graph used as layout input.
//!
//! Wraps petgraph's StableGraph with a key→index map so callers address
//! vertices by their own id type instead of internal indices. Vertex and
//! edge payloads are opaque to the layout engine; the caller decides what
//! they carry (labels, box sizes, edge weights).

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Directed, Direction};

use super::error::GraphError;

/// Bounds required of a vertex key.
pub trait VertexId: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> VertexId for T {}

/// Node weight stored in the underlying StableGraph: the caller-facing key
/// plus the attached data.
#[derive(Debug, Clone)]
struct VertexEntry<K, V> {
    id: K,
    data: V,
}

/// A mutable directed graph keyed by `K`, carrying vertex data `V` and edge
/// data `E`.
///
/// Adjacency is maintained bidirectionally, at most one edge exists per
/// ordered pair, and vertex/edge counts are O(1). Neighbor and vertex
/// iteration order is fixed and deterministic for a given mutation history,
/// which the layout passes rely on for reproducible results.
///
/// Single-writer: the graph must not be mutated while a layout pass reads it.
pub struct DiGraph<K, V, E> {
    inner: StableGraph<VertexEntry<K, V>, E, Directed>,
    indices: HashMap<K, NodeIndex>,
}

impl<K: VertexId, V, E> DiGraph<K, V, E> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            inner: StableGraph::new(),
            indices: HashMap::new(),
        }
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(vertices: usize, edges: usize) -> Self {
        Self {
            inner: StableGraph::with_capacity(vertices, edges),
            indices: HashMap::with_capacity(vertices),
        }
    }

    fn index_of(&self, id: &K) -> Result<NodeIndex, GraphError<K>> {
        self.indices
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownVertex(id.clone()))
    }

    // =========================================================================
    // Vertex Operations
    // =========================================================================

    /// Insert a vertex with empty adjacency.
    pub fn add_vertex(&mut self, id: K, data: V) -> Result<(), GraphError<K>> {
        if self.indices.contains_key(&id) {
            return Err(GraphError::DuplicateVertex(id));
        }
        let index = self.inner.add_node(VertexEntry {
            id: id.clone(),
            data,
        });
        self.indices.insert(id, index);
        Ok(())
    }

    /// Remove a vertex and all edges touching it, returning its data.
    pub fn remove_vertex(&mut self, u: &K) -> Result<V, GraphError<K>> {
        let index = self.index_of(u)?;
        self.indices.remove(u);
        // StableGraph drops incident edges in both directions in the same
        // call, so no dangling adjacency is ever observable.
        let entry = self
            .inner
            .remove_node(index)
            .ok_or_else(|| GraphError::UnknownVertex(u.clone()))?;
        Ok(entry.data)
    }

    /// Data attached to a vertex, or `None` if the id is absent. This is a
    /// probing query, not an assertion.
    pub fn vertex(&self, id: &K) -> Option<&V> {
        let index = *self.indices.get(id)?;
        self.inner.node_weight(index).map(|entry| &entry.data)
    }

    /// Mutable access to a vertex's data.
    pub fn vertex_mut(&mut self, id: &K) -> Option<&mut V> {
        let index = *self.indices.get(id)?;
        self.inner.node_weight_mut(index).map(|entry| &mut entry.data)
    }

    /// All vertex ids, in a fixed deterministic order.
    pub fn vertices(&self) -> impl Iterator<Item = &K> {
        self.inner
            .node_indices()
            .filter_map(|index| self.inner.node_weight(index))
            .map(|entry| &entry.id)
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.inner.node_count()
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Insert the edge `(u, v)`, recording `v` in `u`'s out-adjacency and
    /// `u` in `v`'s in-adjacency. Self-loops are rejected because the
    /// layering passes have no semantics for them.
    pub fn add_edge(&mut self, u: K, v: K, data: E) -> Result<(), GraphError<K>> {
        if u == v {
            return Err(GraphError::SelfLoop(u));
        }
        let ui = self.index_of(&u)?;
        let vi = self.index_of(&v)?;
        if self.inner.find_edge(ui, vi).is_some() {
            return Err(GraphError::DuplicateEdge(u, v));
        }
        self.inner.add_edge(ui, vi, data);
        Ok(())
    }

    /// Remove the edge `(u, v)`, returning its data.
    pub fn remove_edge(&mut self, u: &K, v: &K) -> Result<E, GraphError<K>> {
        let unknown = || GraphError::UnknownEdge(u.clone(), v.clone());
        let (ui, vi) = match (self.indices.get(u), self.indices.get(v)) {
            (Some(&ui), Some(&vi)) => (ui, vi),
            _ => return Err(unknown()),
        };
        let edge = self.inner.find_edge(ui, vi).ok_or_else(unknown)?;
        self.inner.remove_edge(edge).ok_or_else(unknown)
    }

    /// Replace the edge `(u, v)` with `(v, u)`, preserving its data.
    ///
    /// Fails with `DuplicateEdge` if the opposite pair already exists, in
    /// which case the graph is left untouched.
    pub fn reverse_edge(&mut self, u: &K, v: &K) -> Result<(), GraphError<K>> {
        if self.edge(v, u).is_some() {
            return Err(GraphError::DuplicateEdge(v.clone(), u.clone()));
        }
        let data = self.remove_edge(u, v)?;
        self.add_edge(v.clone(), u.clone(), data)
    }

    /// Data attached to the edge `(u, v)`, or `None` if absent.
    pub fn edge(&self, u: &K, v: &K) -> Option<&E> {
        let ui = *self.indices.get(u)?;
        let vi = *self.indices.get(v)?;
        let edge = self.inner.find_edge(ui, vi)?;
        self.inner.edge_weight(edge)
    }

    /// Mutable access to the data of edge `(u, v)`.
    pub fn edge_mut(&mut self, u: &K, v: &K) -> Option<&mut E> {
        let ui = *self.indices.get(u)?;
        let vi = *self.indices.get(v)?;
        let edge = self.inner.find_edge(ui, vi)?;
        self.inner.edge_weight_mut(edge)
    }

    /// All edges as `(source, target, data)`, in a fixed deterministic order.
    pub fn edges(&self) -> impl Iterator<Item = (&K, &K, &E)> {
        self.inner.edge_references().map(|edge| {
            (
                &self.inner[edge.source()].id,
                &self.inner[edge.target()].id,
                edge.weight(),
            )
        })
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.inner.edge_count()
    }

    // =========================================================================
    // Adjacency Queries
    // =========================================================================

    /// Successor ids of `u`, in a fixed deterministic order.
    pub fn out_vertices(&self, u: &K) -> Result<Vec<K>, GraphError<K>> {
        let index = self.index_of(u)?;
        Ok(self
            .inner
            .neighbors_directed(index, Direction::Outgoing)
            .map(|v| self.inner[v].id.clone())
            .collect())
    }

    /// Predecessor ids of `u`, in a fixed deterministic order.
    pub fn in_vertices(&self, u: &K) -> Result<Vec<K>, GraphError<K>> {
        let index = self.index_of(u)?;
        Ok(self
            .inner
            .neighbors_directed(index, Direction::Incoming)
            .map(|v| self.inner[v].id.clone())
            .collect())
    }

    /// Number of out-edges of `u`.
    pub fn out_degree(&self, u: &K) -> Result<usize, GraphError<K>> {
        let index = self.index_of(u)?;
        Ok(self.inner.edges_directed(index, Direction::Outgoing).count())
    }

    /// Number of in-edges of `u`.
    pub fn in_degree(&self, u: &K) -> Result<usize, GraphError<K>> {
        let index = self.index_of(u)?;
        Ok(self.inner.edges_directed(index, Direction::Incoming).count())
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// True if the graph contains no directed cycle.
    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.inner)
    }

    /// Remove all vertices and edges.
    pub fn clear(&mut self) {
        self.inner.clear();
        self.indices.clear();
    }
}

impl<K: VertexId, V, E> Default for DiGraph<K, V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: VertexId + fmt::Debug, V: fmt::Debug, E: fmt::Debug> fmt::Debug for DiGraph<K, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiGraph")
            .field("vertices", &self.num_vertices())
            .field("edges", &self.num_edges())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DiGraph<u32, &'static str, f64> {
        let mut g = DiGraph::new();
        g.add_vertex(1, "a").unwrap();
        g.add_vertex(2, "b").unwrap();
        g.add_vertex(3, "c").unwrap();
        g.add_edge(1, 2, 1.0).unwrap();
        g.add_edge(2, 3, 1.0).unwrap();
        g
    }

    #[test]
    fn test_add_vertex_roundtrip() {
        let mut g: DiGraph<u32, &str, ()> = DiGraph::new();
        g.add_vertex(7, "payload").unwrap();

        assert_eq!(g.num_vertices(), 1);
        assert_eq!(g.vertex(&7), Some(&"payload"));
        assert_eq!(g.vertex(&8), None);
    }

    #[test]
    fn test_duplicate_vertex_rejected() {
        let mut g: DiGraph<u32, (), ()> = DiGraph::new();
        g.add_vertex(1, ()).unwrap();

        assert_eq!(g.add_vertex(1, ()), Err(GraphError::DuplicateVertex(1)));
        assert_eq!(g.num_vertices(), 1);
    }

    #[test]
    fn test_add_edge_updates_both_adjacencies() {
        let g = sample();

        assert_eq!(g.out_vertices(&1).unwrap(), vec![2]);
        assert_eq!(g.in_vertices(&2).unwrap(), vec![1]);
        assert_eq!(g.out_degree(&2).unwrap(), 1);
        assert_eq!(g.in_degree(&1).unwrap(), 0);
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn test_add_edge_unknown_endpoint() {
        let mut g: DiGraph<u32, (), ()> = DiGraph::new();
        g.add_vertex(1, ()).unwrap();

        assert_eq!(g.add_edge(1, 9, ()), Err(GraphError::UnknownVertex(9)));
        assert_eq!(g.add_edge(9, 1, ()), Err(GraphError::UnknownVertex(9)));
        assert_eq!(g.num_edges(), 0);
    }

    #[test]
    fn test_duplicate_edge_rejected_reverse_allowed() {
        let mut g = sample();

        assert_eq!(g.add_edge(1, 2, 2.0), Err(GraphError::DuplicateEdge(1, 2)));
        // The opposite ordered pair is a distinct edge.
        g.add_edge(2, 1, 2.0).unwrap();
        assert_eq!(g.num_edges(), 3);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut g = sample();

        assert_eq!(g.add_edge(1, 1, 0.0), Err(GraphError::SelfLoop(1)));
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn test_remove_vertex_cascades_edges() {
        let mut g = sample();
        let data = g.remove_vertex(&2).unwrap();

        assert_eq!(data, "b");
        assert_eq!(g.num_vertices(), 2);
        assert_eq!(g.num_edges(), 0);
        assert!(g.out_vertices(&1).unwrap().is_empty());
        assert!(g.in_vertices(&3).unwrap().is_empty());
    }

    #[test]
    fn test_remove_edge() {
        let mut g = sample();

        assert_eq!(g.remove_edge(&1, &2), Ok(1.0));
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.remove_edge(&1, &2), Err(GraphError::UnknownEdge(1, 2)));
        assert_eq!(g.remove_edge(&3, &1), Err(GraphError::UnknownEdge(3, 1)));
    }

    #[test]
    fn test_reverse_edge_preserves_data() {
        let mut g = sample();
        g.reverse_edge(&1, &2).unwrap();

        assert_eq!(g.edge(&1, &2), None);
        assert_eq!(g.edge(&2, &1), Some(&1.0));
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn test_reverse_edge_conflict_leaves_graph_untouched() {
        let mut g = sample();
        g.add_edge(2, 1, 5.0).unwrap();

        assert_eq!(g.reverse_edge(&1, &2), Err(GraphError::DuplicateEdge(2, 1)));
        assert_eq!(g.edge(&1, &2), Some(&1.0));
        assert_eq!(g.edge(&2, &1), Some(&5.0));
    }

    #[test]
    fn test_unknown_vertex_queries() {
        let g = sample();

        assert_eq!(g.out_vertices(&9), Err(GraphError::UnknownVertex(9)));
        assert_eq!(g.in_degree(&9), Err(GraphError::UnknownVertex(9)));
        assert_eq!(g.edge(&1, &9), None);
    }

    #[test]
    fn test_edges_iteration() {
        let g = sample();
        let mut pairs: Vec<(u32, u32, f64)> = g.edges().map(|(u, v, w)| (*u, *v, *w)).collect();
        pairs.sort_by_key(|p| (p.0, p.1));

        assert_eq!(pairs, vec![(1, 2, 1.0), (2, 3, 1.0)]);
    }

    #[test]
    fn test_vertex_mut_and_edge_mut() {
        let mut g = sample();

        *g.vertex_mut(&1).unwrap() = "z";
        assert_eq!(g.vertex(&1), Some(&"z"));
        *g.edge_mut(&1, &2).unwrap() = 7.5;
        assert_eq!(g.edge(&1, &2), Some(&7.5));

        assert!(g.vertex_mut(&9).is_none());
        assert!(g.edge_mut(&1, &3).is_none());
    }

    #[test]
    fn test_vertex_iteration_deterministic() {
        let g = sample();
        let a: Vec<u32> = g.vertices().copied().collect();
        let b: Vec<u32> = g.vertices().copied().collect();

        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_string_keys() {
        let mut g: DiGraph<String, u8, u8> = DiGraph::new();
        g.add_vertex("start".to_string(), 0).unwrap();
        g.add_vertex("end".to_string(), 1).unwrap();
        g.add_edge("start".to_string(), "end".to_string(), 9).unwrap();

        assert_eq!(g.edge(&"start".to_string(), &"end".to_string()), Some(&9));
    }

    #[test]
    fn test_is_acyclic() {
        let mut g = sample();
        assert!(g.is_acyclic());

        g.add_edge(3, 1, 1.0).unwrap();
        assert!(!g.is_acyclic());
    }

    #[test]
    fn test_clear() {
        let mut g = sample();
        g.clear();

        assert_eq!(g.num_vertices(), 0);
        assert_eq!(g.num_edges(), 0);
        assert_eq!(g.vertex(&1), None);
    }
}
