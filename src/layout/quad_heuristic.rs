//! Quad-heuristic layer refinement.
//!
//! Longest-path layering pushes every vertex as early as its predecessors
//! allow, which stretches edges on the successor side. This pass rebalances
//! internal vertices (those with both in- and out-edges) toward the mean
//! layer of their neighbors, clamped between the deepest predecessor and the
//! shallowest successor so every edge keeps spanning at least one layer.
//!
//! Updates are applied in place and in weight order, so later updates within
//! one iteration see earlier ones (Gauss-Seidel relaxation, not Jacobi).
//! A fixed repeat count is the only termination condition; there is no
//! convergence check.

use std::collections::HashMap;

use crate::graph::{DiGraph, VertexId};

use super::longest_path::longest_path;

/// Iterative layer-balancing refinement.
#[derive(Debug, Clone, Copy)]
pub struct QuadHeuristic {
    /// Number of refinement iterations.
    pub repeat: usize,
}

impl Default for QuadHeuristic {
    fn default() -> Self {
        Self { repeat: 4 }
    }
}

impl QuadHeuristic {
    pub fn new(repeat: usize) -> Self {
        Self { repeat }
    }

    /// Compute refined layers for an acyclic graph, starting from the
    /// longest-path assignment.
    pub fn assign<K: VertexId, V, E>(&self, g: &DiGraph<K, V, E>) -> HashMap<K, i32> {
        let mut layers = longest_path(g);

        // Internal vertices in graph order; the stable sort below keeps this
        // order among equal weights, so results are reproducible.
        let mut internal: Vec<K> = g
            .vertices()
            .cloned()
            .filter(|u| {
                g.in_degree(u).unwrap_or(0) > 0 && g.out_degree(u).unwrap_or(0) > 0
            })
            .collect();

        let mut weights: HashMap<K, i64> = HashMap::with_capacity(g.num_vertices());

        for _ in 0..self.repeat {
            // Per-vertex imbalance: the signed layer delta of every incident
            // edge, accumulated at both endpoints. Used only to pick the
            // update order, never as a layout value.
            weights.clear();
            for (u, v, _) in g.edges() {
                let delta = i64::from(layers[v] - layers[u]);
                *weights.entry(u.clone()).or_insert(0) += delta;
                *weights.entry(v.clone()).or_insert(0) += delta;
            }

            internal.sort_by(|a, b| {
                let wa = weights.get(a).copied().unwrap_or(0);
                let wb = weights.get(b).copied().unwrap_or(0);
                wb.cmp(&wa)
            });

            for u in &internal {
                let mut sum = 0i64;
                let mut count = 0i64;
                let mut left_max = i32::MIN;
                let mut right_min = i32::MAX;
                for p in g.in_vertices(u).unwrap_or_default() {
                    let layer = layers[&p];
                    left_max = left_max.max(layer);
                    sum += i64::from(layer);
                    count += 1;
                }
                for s in g.out_vertices(u).unwrap_or_default() {
                    let layer = layers[&s];
                    right_min = right_min.min(layer);
                    sum += i64::from(layer);
                    count += 1;
                }
                if count == 0 {
                    continue;
                }
                // Ties round half away from zero.
                let mean = (sum as f64 / count as f64).round() as i32;
                let layer = (right_min - 1).min((left_max + 1).max(mean));
                layers.insert(u.clone(), layer);
            }
        }

        layers
    }
}
