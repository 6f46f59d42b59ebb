//! Cycle removal by back-edge reversal.
//!
//! Layer assignment is undefined on a cyclic graph, so this pass turns the
//! input into a DAG by reversing back edges found during a depth-first
//! traversal. No edge is ever lost silently: every original edge remains in
//! the graph as itself or as its reverse, and the returned record lets the
//! renderer draw reversed edges in their logically original direction.

use std::collections::{HashMap, HashSet};

use crate::graph::{DiGraph, VertexId};

/// Record of edges whose direction was flipped by [`CycleRemoval`].
///
/// Entries are keyed by the edge's *new* direction as stored in the graph.
/// This is layout-time state owned by the caller, never stored on the graph,
/// so the same graph can be re-laid-out without residue.
#[derive(Debug, Clone)]
pub struct ReversedEdges<K: VertexId> {
    by_source: HashMap<K, HashSet<K>>,
    count: usize,
    dropped: Vec<(K, K)>,
}

impl<K: VertexId> ReversedEdges<K> {
    /// An empty record, suitable for graphs known to be acyclic.
    pub fn new() -> Self {
        Self {
            by_source: HashMap::new(),
            count: 0,
            dropped: Vec::new(),
        }
    }

    fn insert(&mut self, u: K, v: K) {
        if self.by_source.entry(u).or_default().insert(v) {
            self.count += 1;
        }
    }

    /// True if the edge currently stored as `(u, v)` was originally `(v, u)`.
    pub fn contains(&self, u: &K, v: &K) -> bool {
        self.by_source.get(u).is_some_and(|targets| targets.contains(v))
    }

    /// Number of reversed edges.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if nothing was reversed.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Reversed edge pairs in their new direction.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &K)> {
        self.by_source
            .iter()
            .flat_map(|(u, targets)| targets.iter().map(move |v| (u, v)))
    }

    /// Back edges that were removed instead of reversed because their exact
    /// opposite pair already existed (a two-cycle), listed in their original
    /// direction.
    pub fn dropped(&self) -> &[(K, K)] {
        &self.dropped
    }

    fn remove(&mut self, u: &K, v: &K) -> bool {
        let Some(targets) = self.by_source.get_mut(u) else {
            return false;
        };
        if !targets.remove(v) {
            return false;
        }
        self.count -= 1;
        if targets.is_empty() {
            self.by_source.remove(u);
        }
        true
    }

    /// Fold another record into this one. Used when cycle removal runs again
    /// after new edges were added, so earlier reversals stay on record. An
    /// edge reversed once per run in opposite directions is back in its
    /// original direction, so the two entries cancel.
    pub fn merge(&mut self, other: ReversedEdges<K>) {
        for (u, targets) in other.by_source {
            for v in targets {
                if self.remove(&v, &u) {
                    continue;
                }
                self.insert(u.clone(), v);
            }
        }
        self.dropped.extend(other.dropped);
    }
}

impl<K: VertexId> Default for ReversedEdges<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Three-color DFS mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first cycle removal pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleRemoval;

impl CycleRemoval {
    pub fn new() -> Self {
        Self
    }

    /// Reverse every back edge of `g` in place and return the record of
    /// flipped edges.
    ///
    /// The traversal starts from every unvisited vertex, so disconnected
    /// graphs and cyclic components without a zero-in-degree vertex are
    /// fully covered. Running on an already acyclic graph is a no-op that
    /// returns an empty record.
    pub fn run<K: VertexId, V, E>(&self, g: &mut DiGraph<K, V, E>) -> ReversedEdges<K> {
        let mut marks: HashMap<K, Mark> = g
            .vertices()
            .map(|u| (u.clone(), Mark::Unvisited))
            .collect();
        let mut back_edges: Vec<(K, K)> = Vec::new();

        let roots: Vec<K> = g.vertices().cloned().collect();
        for root in roots {
            if marks.get(&root) != Some(&Mark::Unvisited) {
                continue;
            }
            Self::dfs(g, root, &mut marks, &mut back_edges);
        }

        // Reversals are applied after the traversal so the DFS never sees a
        // half-rewritten adjacency. Reversing all back edges of one DFS
        // forest leaves no cycle.
        let mut record = ReversedEdges::new();
        for (u, v) in back_edges {
            if g.edge(&v, &u).is_some() {
                // Two-cycle: the flipped pair already exists, so reversal
                // would duplicate it. Drop the back edge and report it.
                if g.remove_edge(&u, &v).is_ok() {
                    record.dropped.push((u, v));
                }
            } else if g.reverse_edge(&u, &v).is_ok() {
                record.insert(v, u);
            }
        }
        record
    }

    fn dfs<K: VertexId, V, E>(
        g: &DiGraph<K, V, E>,
        root: K,
        marks: &mut HashMap<K, Mark>,
        back_edges: &mut Vec<(K, K)>,
    ) {
        // Explicit stack of (vertex, successors, cursor) frames; deep chains
        // must not overflow the call stack.
        let mut stack: Vec<(K, Vec<K>, usize)> = Vec::new();
        marks.insert(root.clone(), Mark::InProgress);
        let successors = g.out_vertices(&root).unwrap_or_default();
        stack.push((root, successors, 0));

        while let Some(frame) = stack.last_mut() {
            if frame.2 >= frame.1.len() {
                marks.insert(frame.0.clone(), Mark::Done);
                stack.pop();
                continue;
            }
            let u = frame.0.clone();
            let v = frame.1[frame.2].clone();
            frame.2 += 1;

            match marks.get(&v).copied().unwrap_or(Mark::Unvisited) {
                Mark::Unvisited => {
                    marks.insert(v.clone(), Mark::InProgress);
                    let successors = g.out_vertices(&v).unwrap_or_default();
                    stack.push((v, successors, 0));
                }
                // v is an ancestor on the traversal stack: (u, v) closes a
                // cycle.
                Mark::InProgress => back_edges.push((u, v)),
                Mark::Done => {}
            }
        }
    }
}
