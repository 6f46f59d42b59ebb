//! Longest-path layer assignment.

use std::collections::HashMap;

use crate::graph::{DiGraph, VertexId};

/// Assign an integer layer to every vertex of an acyclic graph.
///
/// Each vertex is placed one layer past its deepest predecessor, so every
/// edge `(u, v)` satisfies `layer(v) >= layer(u) + 1`; vertices without
/// predecessors sit at layer 0. The result is then re-normalized: the
/// minimum layer is subtracted from every vertex, except that vertices with
/// in-degree 0 are pinned to exactly 0. The asymmetric pinning rule is kept
/// as-is for compatibility with existing consumers of the layering.
///
/// The graph must be acyclic (run [`CycleRemoval`](super::CycleRemoval)
/// first); the memoized traversal does not terminate on a cycle.
pub fn longest_path<K: VertexId, V, E>(g: &DiGraph<K, V, E>) -> HashMap<K, i32> {
    let mut layers: HashMap<K, i32> = HashMap::with_capacity(g.num_vertices());

    // Explicit work stack; deep chains must not overflow the call stack. A
    // vertex is resolved once all of its predecessors are, so each vertex is
    // re-examined at most once after its unresolved predecessors complete.
    let mut stack: Vec<K> = Vec::new();
    for u in g.vertices() {
        if layers.contains_key(u) {
            continue;
        }
        stack.push(u.clone());
        while let Some(v) = stack.last().cloned() {
            if layers.contains_key(&v) {
                stack.pop();
                continue;
            }
            let preds = g.in_vertices(&v).unwrap_or_default();
            let unresolved: Vec<K> = preds
                .iter()
                .filter(|p| !layers.contains_key(*p))
                .cloned()
                .collect();
            if unresolved.is_empty() {
                let layer = preds.iter().map(|p| layers[p] + 1).max().unwrap_or(0);
                layers.insert(v, layer);
                stack.pop();
            } else {
                stack.extend(unresolved);
            }
        }
    }

    normalize(g, &mut layers);
    layers
}

fn normalize<K: VertexId, V, E>(g: &DiGraph<K, V, E>, layers: &mut HashMap<K, i32>) {
    let min = layers.values().copied().min().unwrap_or(0);
    for u in g.vertices() {
        let pinned = g.in_degree(u).unwrap_or(0) == 0;
        if let Some(layer) = layers.get_mut(u) {
            if pinned {
                *layer = 0;
            } else {
                *layer -= min;
            }
        }
    }
}
