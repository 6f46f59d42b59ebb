//! The layered layout pipeline.
//!
//! Consumes an acyclic [`DiGraph`] (run [`CycleRemoval`] first) and produces
//! absolute box geometry per vertex plus a routed point sequence per edge:
//! quad-heuristic layer assignment, dummy-cell insertion for edges spanning
//! multiple layers, barycenter crossing reduction, then coordinate and
//! edge-path assignment.

use std::collections::HashMap;

use serde::Serialize;

use crate::graph::{DiGraph, VertexId};

use super::cycle_removal::ReversedEdges;
use super::ordering::reduce_crossings;
use super::quad_heuristic::QuadHeuristic;

/// Configuration for the layered layout.
#[derive(Debug, Clone)]
pub struct SugiyamaConfig {
    /// Layers flow left-to-right when true, top-to-bottom otherwise.
    pub ltor: bool,
    /// Spacing between adjacent layers.
    pub layer_margin: f64,
    /// Spacing between vertices within a layer.
    pub vertex_margin: f64,
    /// Extent reserved for a routed edge passing through a layer.
    pub edge_margin: f64,
    /// Quad-heuristic iteration count.
    pub repeat: usize,
}

impl Default for SugiyamaConfig {
    fn default() -> Self {
        Self {
            ltor: true,
            layer_margin: 20.0,
            vertex_margin: 5.0,
            edge_margin: 5.0,
            repeat: 4,
        }
    }
}

/// A point on an edge path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Final box geometry of a vertex; `x`/`y` are the box center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VertexGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Routed path of an edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePath {
    /// Points from the logical source's box boundary to the logical
    /// target's box boundary, passing through the entry/exit boundary of
    /// every dummy cell on the way.
    pub points: Vec<Point>,
    /// True if the stored edge direction was flipped by cycle removal. The
    /// points already run in the logically original direction.
    pub reversed: bool,
}

/// Bounding box of a computed layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl LayoutBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Complete layout result.
///
/// Owns only vertex/edge ids, never graph internals, so the graph may be
/// mutated or discarded afterwards without invalidating it.
#[derive(Debug, Clone)]
pub struct Layout<K: VertexId> {
    /// Geometry per vertex id.
    pub vertices: HashMap<K, VertexGeometry>,
    /// Path per edge, keyed by the pair as currently stored in the graph.
    pub edges: HashMap<(K, K), EdgePath>,
}

impl<K: VertexId> Layout<K> {
    /// Geometry of a vertex, or `None` if the id was not laid out.
    pub fn vertex(&self, id: &K) -> Option<&VertexGeometry> {
        self.vertices.get(id)
    }

    /// Path of the edge stored as `(u, v)`.
    pub fn edge(&self, u: &K, v: &K) -> Option<&EdgePath> {
        self.edges.get(&(u.clone(), v.clone()))
    }

    /// Bounding box over all vertex boxes, or `None` for an empty layout.
    /// Useful for centering the drawing in a viewport.
    pub fn bounds(&self) -> Option<LayoutBounds> {
        let mut boxes = self.vertices.values();
        let first = boxes.next()?;
        let mut bounds = LayoutBounds {
            min_x: first.x - first.width / 2.0,
            min_y: first.y - first.height / 2.0,
            max_x: first.x + first.width / 2.0,
            max_y: first.y + first.height / 2.0,
        };
        for v in boxes {
            bounds.min_x = bounds.min_x.min(v.x - v.width / 2.0);
            bounds.min_y = bounds.min_y.min(v.y - v.height / 2.0);
            bounds.max_x = bounds.max_x.max(v.x + v.width / 2.0);
            bounds.max_y = bounds.max_y.max(v.y + v.height / 2.0);
        }
        Some(bounds)
    }
}

/// One slot in the layered grid: a graph vertex or a dummy routing cell.
#[derive(Debug)]
struct Cell<K> {
    /// `Some` for a graph vertex, `None` for a dummy on a long edge.
    vertex: Option<K>,
    layer: usize,
    width: f64,
    height: f64,
    x: f64,
    y: f64,
}

/// The layered layout engine.
#[derive(Debug, Clone, Default)]
pub struct SugiyamaLayout {
    config: SugiyamaConfig,
}

impl SugiyamaLayout {
    /// Create a layout engine with the given configuration.
    pub fn new(config: SugiyamaConfig) -> Self {
        Self { config }
    }

    /// Create a layout engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SugiyamaConfig::default())
    }

    pub fn config(&self) -> &SugiyamaConfig {
        &self.config
    }

    /// Compute the layout of an acyclic graph.
    ///
    /// `reversed` is the record produced by [`CycleRemoval`]; pass
    /// `&ReversedEdges::new()` for graphs known to be acyclic.
    /// `vertex_size` maps a vertex id and its data to a `(width, height)`
    /// box. The graph is read read-only, so re-running with different
    /// parameters never leaves residue; identical input yields identical
    /// output.
    pub fn layout<K, V, E, F>(
        &self,
        g: &DiGraph<K, V, E>,
        reversed: &ReversedEdges<K>,
        vertex_size: F,
    ) -> Layout<K>
    where
        K: VertexId,
        F: Fn(&K, &V) -> (f64, f64),
    {
        let layers = QuadHeuristic::new(self.config.repeat).assign(g);

        let min_layer = layers.values().copied().min().unwrap_or(0);
        let num_layers = layers
            .values()
            .map(|&l| (l - min_layer) as usize)
            .max()
            .map_or(0, |m| m + 1);

        let mut cells: Vec<Cell<K>> = Vec::with_capacity(g.num_vertices());
        let mut cell_of: HashMap<K, usize> = HashMap::with_capacity(g.num_vertices());
        let mut layer_cells: Vec<Vec<usize>> = vec![Vec::new(); num_layers];

        for u in g.vertices() {
            let Some(data) = g.vertex(u) else { continue };
            let (width, height) = vertex_size(u, data);
            let layer = (layers[u] - min_layer) as usize;
            let index = cells.len();
            cells.push(Cell {
                vertex: Some(u.clone()),
                layer,
                width,
                height,
                x: 0.0,
                y: 0.0,
            });
            cell_of.insert(u.clone(), index);
            layer_cells[layer].push(index);
        }

        // Split every edge spanning more than one layer into a chain of
        // dummy cells, one per intermediate layer, so ordering and routing
        // work layer by layer. Dummies reserve edge_margin of extent.
        let mut routes: Vec<((K, K), Vec<usize>)> = Vec::with_capacity(g.num_edges());
        for (u, v, _) in g.edges() {
            let source = cell_of[u];
            let target = cell_of[v];
            let (lu, lv) = (cells[source].layer, cells[target].layer);

            let mut chain = vec![source];
            if lv > lu + 1 {
                for layer in (lu + 1)..lv {
                    let index = cells.len();
                    cells.push(Cell {
                        vertex: None,
                        layer,
                        width: self.config.edge_margin,
                        height: self.config.edge_margin,
                        x: 0.0,
                        y: 0.0,
                    });
                    layer_cells[layer].push(index);
                    chain.push(index);
                }
            }
            chain.push(target);
            routes.push(((u.clone(), v.clone()), chain));
        }

        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); cells.len()];
        let mut succs: Vec<Vec<usize>> = vec![Vec::new(); cells.len()];
        for (_, chain) in &routes {
            for pair in chain.windows(2) {
                succs[pair[0]].push(pair[1]);
                preds[pair[1]].push(pair[0]);
            }
        }

        reduce_crossings(&mut layer_cells, &preds, &succs);

        self.assign_coordinates(&mut cells, &layer_cells);

        let mut vertices = HashMap::with_capacity(g.num_vertices());
        for cell in &cells {
            if let Some(id) = &cell.vertex {
                vertices.insert(
                    id.clone(),
                    VertexGeometry {
                        x: cell.x,
                        y: cell.y,
                        width: cell.width,
                        height: cell.height,
                    },
                );
            }
        }

        let mut edges = HashMap::with_capacity(routes.len());
        for ((u, v), chain) in routes {
            let mut points = Vec::with_capacity(chain.len() * 2);
            points.push(self.exit_point(&cells[chain[0]]));
            for &dummy in &chain[1..chain.len() - 1] {
                points.push(self.entry_point(&cells[dummy]));
                points.push(self.exit_point(&cells[dummy]));
            }
            points.push(self.entry_point(&cells[chain[chain.len() - 1]]));

            let flipped = reversed.contains(&u, &v);
            if flipped {
                // Emit the path in the logically original direction so the
                // arrowhead lands on the real target.
                points.reverse();
            }
            edges.insert((u, v), EdgePath { points, reversed: flipped });
        }

        Layout { vertices, edges }
    }

    /// Place each layer along the layer axis (cumulative max extent plus
    /// layer margin) and each cell along the cross axis (cumulative extent
    /// plus vertex margin), centering cells in both directions.
    fn assign_coordinates<K>(&self, cells: &mut [Cell<K>], layer_cells: &[Vec<usize>]) {
        let ltor = self.config.ltor;
        let mut layer_offset = 0.0;

        for members in layer_cells {
            let max_extent = members
                .iter()
                .map(|&i| if ltor { cells[i].width } else { cells[i].height })
                .fold(0.0, f64::max);
            let layer_center = layer_offset + max_extent / 2.0;

            let mut cross_offset = 0.0;
            for &i in members {
                let extent = if ltor { cells[i].height } else { cells[i].width };
                let cross_center = cross_offset + extent / 2.0;
                if ltor {
                    cells[i].x = layer_center;
                    cells[i].y = cross_center;
                } else {
                    cells[i].x = cross_center;
                    cells[i].y = layer_center;
                }
                cross_offset += extent + self.config.vertex_margin;
            }

            layer_offset += max_extent + self.config.layer_margin;
        }
    }

    /// Boundary point where an edge leaves a cell toward the next layer.
    fn exit_point<K>(&self, cell: &Cell<K>) -> Point {
        if self.config.ltor {
            Point {
                x: cell.x + cell.width / 2.0,
                y: cell.y,
            }
        } else {
            Point {
                x: cell.x,
                y: cell.y + cell.height / 2.0,
            }
        }
    }

    /// Boundary point where an edge enters a cell from the previous layer.
    fn entry_point<K>(&self, cell: &Cell<K>) -> Point {
        if self.config.ltor {
            Point {
                x: cell.x - cell.width / 2.0,
                y: cell.y,
            }
        } else {
            Point {
                x: cell.x,
                y: cell.y - cell.height / 2.0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::CycleRemoval;

    type TestGraph = DiGraph<u32, (f64, f64), ()>;

    fn size(_: &u32, data: &(f64, f64)) -> (f64, f64) {
        *data
    }

    fn diamond() -> TestGraph {
        let mut g = DiGraph::new();
        for id in 1..=4 {
            g.add_vertex(id, (40.0, 20.0)).unwrap();
        }
        g.add_edge(1, 2, ()).unwrap();
        g.add_edge(1, 3, ()).unwrap();
        g.add_edge(2, 4, ()).unwrap();
        g.add_edge(3, 4, ()).unwrap();
        g
    }

    #[test]
    fn test_empty_graph() {
        let g: TestGraph = DiGraph::new();
        let layout = SugiyamaLayout::with_defaults().layout(&g, &ReversedEdges::new(), size);

        assert!(layout.vertices.is_empty());
        assert!(layout.edges.is_empty());
        assert!(layout.bounds().is_none());
    }

    #[test]
    fn test_diamond_layer_positions() {
        let g = diamond();
        let layout = SugiyamaLayout::with_defaults().layout(&g, &ReversedEdges::new(), size);

        let v1 = layout.vertex(&1).unwrap();
        let v2 = layout.vertex(&2).unwrap();
        let v3 = layout.vertex(&3).unwrap();
        let v4 = layout.vertex(&4).unwrap();

        // ltor: x advances with the layer, one track per layer.
        assert!(v1.x < v2.x && v2.x < v4.x);
        assert_eq!(v2.x, v3.x);
        // Siblings in a layer are stacked on the cross axis.
        assert_ne!(v2.y, v3.y);
        assert_eq!(v1.width, 40.0);
        assert_eq!(v1.height, 20.0);
    }

    #[test]
    fn test_layer_margin_respected() {
        let g = diamond();
        let config = SugiyamaConfig {
            layer_margin: 50.0,
            ..Default::default()
        };
        let layout = SugiyamaLayout::new(config).layout(&g, &ReversedEdges::new(), size);

        let v1 = layout.vertex(&1).unwrap();
        let v2 = layout.vertex(&2).unwrap();
        // Gap between box edges equals the layer margin (uniform widths).
        let gap = (v2.x - v2.width / 2.0) - (v1.x + v1.width / 2.0);
        assert!((gap - 50.0).abs() < 1e-9, "layer gap was {gap}");
    }

    #[test]
    fn test_vertex_margin_respected() {
        let g = diamond();
        let config = SugiyamaConfig {
            vertex_margin: 12.0,
            ..Default::default()
        };
        let layout = SugiyamaLayout::new(config).layout(&g, &ReversedEdges::new(), size);

        let v2 = layout.vertex(&2).unwrap();
        let v3 = layout.vertex(&3).unwrap();
        let (upper, lower) = if v2.y < v3.y { (v2, v3) } else { (v3, v2) };
        let gap = (lower.y - lower.height / 2.0) - (upper.y + upper.height / 2.0);
        assert!((gap - 12.0).abs() < 1e-9, "vertex gap was {gap}");
    }

    #[test]
    fn test_orientation_swaps_axes() {
        let g = diamond();
        let ltor = SugiyamaLayout::with_defaults().layout(&g, &ReversedEdges::new(), size);
        let ttb = SugiyamaLayout::new(SugiyamaConfig {
            ltor: false,
            ..Default::default()
        })
        .layout(&g, &ReversedEdges::new(), size);

        let (l1, l4) = (ltor.vertex(&1).unwrap(), ltor.vertex(&4).unwrap());
        let (t1, t4) = (ttb.vertex(&1).unwrap(), ttb.vertex(&4).unwrap());

        assert!(l4.x > l1.x, "ltor layers advance along x");
        assert!(t4.y > t1.y, "ttb layers advance along y");
        // Siblings stack along the other axis in each orientation.
        assert_ne!(ltor.vertex(&2).unwrap().y, ltor.vertex(&3).unwrap().y);
        assert_ne!(ttb.vertex(&2).unwrap().x, ttb.vertex(&3).unwrap().x);
    }

    #[test]
    fn test_edge_path_touches_box_boundaries() {
        let g = diamond();
        let layout = SugiyamaLayout::with_defaults().layout(&g, &ReversedEdges::new(), size);

        let v1 = layout.vertex(&1).unwrap();
        let v2 = layout.vertex(&2).unwrap();
        let path = layout.edge(&1, &2).unwrap();

        assert_eq!(path.points.len(), 2);
        let first = path.points[0];
        let last = path.points[path.points.len() - 1];
        assert!((first.x - (v1.x + v1.width / 2.0)).abs() < 1e-9);
        assert!((first.y - v1.y).abs() < 1e-9);
        assert!((last.x - (v2.x - v2.width / 2.0)).abs() < 1e-9);
        assert!((last.y - v2.y).abs() < 1e-9);
        assert!(!path.reversed);
    }

    #[test]
    fn test_long_edge_routes_through_dummy() {
        // 1→2→3 with a shortcut 1→3 spanning two layers.
        let mut g: TestGraph = DiGraph::new();
        for id in 1..=3 {
            g.add_vertex(id, (40.0, 20.0)).unwrap();
        }
        g.add_edge(1, 2, ()).unwrap();
        g.add_edge(2, 3, ()).unwrap();
        g.add_edge(1, 3, ()).unwrap();

        let layout = SugiyamaLayout::with_defaults().layout(&g, &ReversedEdges::new(), size);

        let path = layout.edge(&1, &3).unwrap();
        // Boundary point, dummy entry/exit, boundary point.
        assert_eq!(path.points.len(), 4);
        let v2 = layout.vertex(&2).unwrap();
        // The dummy sits on vertex 2's layer but not on vertex 2 itself.
        assert!((path.points[1].x > v2.x - v2.width) && (path.points[1].x < v2.x + v2.width));
        assert_ne!(path.points[1].y, v2.y);
        // Points advance monotonically along the layer axis.
        for pair in path.points.windows(2) {
            assert!(pair[1].x >= pair[0].x);
        }
    }

    #[test]
    fn test_reversed_edge_points_run_backwards() {
        let mut g: TestGraph = DiGraph::new();
        for id in 1..=3 {
            g.add_vertex(id, (40.0, 20.0)).unwrap();
        }
        g.add_edge(1, 2, ()).unwrap();
        g.add_edge(2, 3, ()).unwrap();
        g.add_edge(3, 1, ()).unwrap();

        let reversed = CycleRemoval::new().run(&mut g);
        assert_eq!(reversed.len(), 1);

        let layout = SugiyamaLayout::with_defaults().layout(&g, &reversed, size);

        // The closing edge is now stored as (1, 3) but drawn 3→1.
        let path = layout.edge(&1, &3).unwrap();
        assert!(path.reversed);
        let first = path.points[0];
        let last = path.points[path.points.len() - 1];
        assert!(first.x > last.x, "reversed path must run right-to-left");
    }

    #[test]
    fn test_isolated_vertices_share_layer_zero() {
        let mut g: TestGraph = DiGraph::new();
        g.add_vertex(1, (30.0, 10.0)).unwrap();
        g.add_vertex(2, (30.0, 10.0)).unwrap();

        let layout = SugiyamaLayout::with_defaults().layout(&g, &ReversedEdges::new(), size);

        let v1 = layout.vertex(&1).unwrap();
        let v2 = layout.vertex(&2).unwrap();
        assert_eq!(v1.x, v2.x);
        assert_ne!(v1.y, v2.y);
        assert!(layout.edges.is_empty());
    }

    #[test]
    fn test_layout_is_deterministic() {
        let g = diamond();
        let engine = SugiyamaLayout::with_defaults();
        let a = engine.layout(&g, &ReversedEdges::new(), size);
        let b = engine.layout(&g, &ReversedEdges::new(), size);

        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.edges, b.edges);
    }

    #[test]
    fn test_bounds_cover_all_boxes() {
        let g = diamond();
        let layout = SugiyamaLayout::with_defaults().layout(&g, &ReversedEdges::new(), size);

        let bounds = layout.bounds().unwrap();
        for v in layout.vertices.values() {
            assert!(v.x - v.width / 2.0 >= bounds.min_x - 1e-9);
            assert!(v.x + v.width / 2.0 <= bounds.max_x + 1e-9);
            assert!(v.y - v.height / 2.0 >= bounds.min_y - 1e-9);
            assert!(v.y + v.height / 2.0 <= bounds.max_y + 1e-9);
        }
        assert!(bounds.width() > 0.0);
        assert!(bounds.height() > 0.0);
    }

    #[test]
    fn test_size_accessor_drives_geometry() {
        let mut g: DiGraph<u32, f64, ()> = DiGraph::new();
        g.add_vertex(1, 10.0).unwrap();
        g.add_vertex(2, 60.0).unwrap();
        g.add_edge(1, 2, ()).unwrap();

        let layout = SugiyamaLayout::with_defaults().layout(
            &g,
            &ReversedEdges::new(),
            |_, &w| (w, w / 2.0),
        );

        assert_eq!(layout.vertex(&1).unwrap().width, 10.0);
        assert_eq!(layout.vertex(&2).unwrap().width, 60.0);
        assert_eq!(layout.vertex(&2).unwrap().height, 30.0);
    }
}
