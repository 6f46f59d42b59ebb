//! Barycenter crossing reduction.
//!
//! Reorders the cells of each layer by the mean position of their neighbors
//! in the adjacent layer, sweeping downward and upward alternately. This is
//! a heuristic: crossings are reduced, not minimized.

use std::cmp::Ordering;

/// Number of alternating sweeps.
const SWEEPS: usize = 4;

/// Reorder `layers` in place.
///
/// `preds`/`succs` give, per cell index, the cell indices of neighbors one
/// layer up/down. Long edges are already split into dummy chains, so every
/// neighbor sits on an adjacent layer. Cells without neighbors on the sweep
/// side keep their current position.
pub(super) fn reduce_crossings(
    layers: &mut [Vec<usize>],
    preds: &[Vec<usize>],
    succs: &[Vec<usize>],
) {
    let mut position: Vec<f64> = vec![0.0; preds.len()];
    for layer in layers.iter() {
        for (order, &cell) in layer.iter().enumerate() {
            position[cell] = order as f64;
        }
    }

    for sweep in 0..SWEEPS {
        let downward = sweep % 2 == 0;
        let indices: Vec<usize> = if downward {
            (1..layers.len()).collect()
        } else {
            (0..layers.len().saturating_sub(1)).rev().collect()
        };

        for li in indices {
            let mut fixed: Vec<(usize, usize)> = Vec::new();
            let mut keyed: Vec<(usize, f64)> = Vec::new();
            for (slot, &cell) in layers[li].iter().enumerate() {
                let neighbors = if downward { &preds[cell] } else { &succs[cell] };
                if neighbors.is_empty() {
                    fixed.push((slot, cell));
                } else {
                    let barycenter = neighbors.iter().map(|&n| position[n]).sum::<f64>()
                        / neighbors.len() as f64;
                    keyed.push((cell, barycenter));
                }
            }

            keyed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

            // Neighborless cells stay pinned to their slot; the sorted rest
            // fill the remaining slots in order.
            let mut reordered: Vec<Option<usize>> = vec![None; layers[li].len()];
            for &(slot, cell) in &fixed {
                reordered[slot] = Some(cell);
            }
            let mut moved = keyed.iter().map(|&(cell, _)| cell);
            for slot in reordered.iter_mut() {
                if slot.is_none() {
                    *slot = moved.next();
                }
            }
            layers[li] = reordered.into_iter().flatten().collect();

            for (order, &cell) in layers[li].iter().enumerate() {
                position[cell] = order as f64;
            }
        }
    }
}
