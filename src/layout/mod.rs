//! Layered (Sugiyama-style) layout for directed graphs.
//!
//! The pipeline runs in phases: [`CycleRemoval`] turns the graph into a DAG
//! by reversing back edges, [`QuadHeuristic`] assigns and balances integer
//! layers on top of the longest-path baseline, and [`SugiyamaLayout`] orders
//! the layers, routes long edges through dummy cells, and produces absolute
//! coordinates and edge paths.
//!
//! Only cycle removal mutates the graph; everything downstream is read-only
//! and keeps its state in caller-owned values, so layouts are repeatable.

pub mod cycle_removal;
pub mod longest_path;
pub mod quad_heuristic;

mod ordering;
mod sugiyama;

pub use cycle_removal::{CycleRemoval, ReversedEdges};
pub use quad_heuristic::QuadHeuristic;
pub use sugiyama::{
    EdgePath, Layout, LayoutBounds, Point, SugiyamaConfig, SugiyamaLayout, VertexGeometry,
};
