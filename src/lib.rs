//! Layered Graph - WASM Module
//!
//! Layered (Sugiyama-style) layout for directed graphs, compiled to
//! WebAssembly with a JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: Directed graph structure using petgraph's StableGraph
//! - `layout`: The layout pipeline (cycle removal, layer assignment,
//!   crossing reduction, coordinate and edge-path assignment)

use js_sys::Float32Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod graph;
pub mod layout;

use graph::DiGraph;
use layout::{CycleRemoval, Layout, ReversedEdges, SugiyamaConfig, SugiyamaLayout};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Size box attached to a vertex.
#[derive(Debug, Clone, Copy)]
struct VertexAttrs {
    width: f64,
    height: f64,
}

/// Weight attached to an edge. Unused by the layout itself but kept for
/// callers that style edges by weight.
#[derive(Debug, Clone, Copy)]
struct EdgeAttrs {
    weight: f64,
}

#[derive(Serialize)]
struct VertexDto {
    id: u32,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Serialize)]
struct EdgeDto {
    source: u32,
    target: u32,
    reversed: bool,
    points: Vec<[f64; 2]>,
}

#[derive(Serialize)]
struct LayoutDto {
    vertices: Vec<VertexDto>,
    edges: Vec<EdgeDto>,
}

/// Main entry point for the layout engine.
///
/// Wraps the internal graph and layout pipeline and exposes the public API
/// to JavaScript. Vertices are identified by caller-chosen u32 ids.
#[wasm_bindgen]
pub struct LayeredGraphWasm {
    graph: DiGraph<u32, VertexAttrs, EdgeAttrs>,
    reversed: ReversedEdges<u32>,
    layout: Option<Layout<u32>>,
}

#[wasm_bindgen]
impl LayeredGraphWasm {
    /// Create a new empty layout engine.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            reversed: ReversedEdges::new(),
            layout: None,
        }
    }

    /// Create a layout engine with pre-allocated capacity.
    #[wasm_bindgen(js_name = withCapacity)]
    pub fn with_capacity(vertex_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(vertex_capacity, edge_capacity),
            reversed: ReversedEdges::new(),
            layout: None,
        }
    }

    // =========================================================================
    // Vertex Operations
    // =========================================================================

    /// Add a vertex with the given id and box size.
    ///
    /// Returns false if the id is already present.
    #[wasm_bindgen(js_name = addVertex)]
    pub fn add_vertex(&mut self, id: u32, width: f64, height: f64) -> bool {
        self.graph
            .add_vertex(id, VertexAttrs { width, height })
            .is_ok()
    }

    /// Remove a vertex and all of its incident edges.
    ///
    /// Returns true if the vertex existed and was removed.
    #[wasm_bindgen(js_name = removeVertex)]
    pub fn remove_vertex(&mut self, id: u32) -> bool {
        self.graph.remove_vertex(&id).is_ok()
    }

    /// Check whether a vertex exists.
    #[wasm_bindgen(js_name = hasVertex)]
    pub fn has_vertex(&self, id: u32) -> bool {
        self.graph.vertex(&id).is_some()
    }

    /// Update a vertex's box size. Takes effect on the next layout.
    ///
    /// Returns false if the id is unknown.
    #[wasm_bindgen(js_name = setVertexSize)]
    pub fn set_vertex_size(&mut self, id: u32, width: f64, height: f64) -> bool {
        match self.graph.vertex_mut(&id) {
            Some(attrs) => {
                attrs.width = width;
                attrs.height = height;
                true
            }
            None => false,
        }
    }

    /// Number of vertices in the graph.
    #[wasm_bindgen(js_name = vertexCount)]
    pub fn vertex_count(&self) -> u32 {
        self.graph.num_vertices() as u32
    }

    /// Out-degree of a vertex, or None if the id is unknown.
    #[wasm_bindgen(js_name = outDegree)]
    pub fn out_degree(&self, id: u32) -> Option<u32> {
        self.graph.out_degree(&id).ok().map(|d| d as u32)
    }

    /// In-degree of a vertex, or None if the id is unknown.
    #[wasm_bindgen(js_name = inDegree)]
    pub fn in_degree(&self, id: u32) -> Option<u32> {
        self.graph.in_degree(&id).ok().map(|d| d as u32)
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add a directed edge.
    ///
    /// Returns false if either endpoint is unknown, the edge already exists,
    /// or the edge is a self-loop.
    #[wasm_bindgen(js_name = addEdge)]
    pub fn add_edge(&mut self, source: u32, target: u32, weight: f64) -> bool {
        self.graph
            .add_edge(source, target, EdgeAttrs { weight })
            .is_ok()
    }

    /// Remove the edge stored as (source, target).
    ///
    /// Returns true if the edge existed and was removed.
    #[wasm_bindgen(js_name = removeEdge)]
    pub fn remove_edge(&mut self, source: u32, target: u32) -> bool {
        self.graph.remove_edge(&source, &target).is_ok()
    }

    /// Check whether the edge (source, target) exists.
    #[wasm_bindgen(js_name = hasEdge)]
    pub fn has_edge(&self, source: u32, target: u32) -> bool {
        self.graph.edge(&source, &target).is_some()
    }

    /// Number of edges in the graph.
    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.graph.num_edges() as u32
    }

    /// Weight of the edge (source, target), or None if it does not exist.
    #[wasm_bindgen(js_name = edgeWeight)]
    pub fn edge_weight(&self, source: u32, target: u32) -> Option<f64> {
        self.graph.edge(&source, &target).map(|e| e.weight)
    }

    /// Update the weight of the edge (source, target).
    ///
    /// Returns false if the edge does not exist.
    #[wasm_bindgen(js_name = setEdgeWeight)]
    pub fn set_edge_weight(&mut self, source: u32, target: u32, weight: f64) -> bool {
        match self.graph.edge_mut(&source, &target) {
            Some(attrs) => {
                attrs.weight = weight;
                true
            }
            None => false,
        }
    }

    /// Successor ids of a vertex.
    #[wasm_bindgen(js_name = getSuccessors)]
    pub fn get_successors(&self, id: u32) -> Vec<u32> {
        self.graph.out_vertices(&id).unwrap_or_default()
    }

    /// Predecessor ids of a vertex.
    #[wasm_bindgen(js_name = getPredecessors)]
    pub fn get_predecessors(&self, id: u32) -> Vec<u32> {
        self.graph.in_vertices(&id).unwrap_or_default()
    }

    // =========================================================================
    // Layout Pipeline
    // =========================================================================

    /// Check whether the graph is currently acyclic.
    #[wasm_bindgen(js_name = isAcyclic)]
    pub fn is_acyclic(&self) -> bool {
        self.graph.is_acyclic()
    }

    /// Make the graph acyclic by reversing back edges.
    ///
    /// Returns the number of newly reversed edges. The reversal record is
    /// kept on the engine (and accumulated across calls) so subsequent
    /// layouts draw reversed edges in their original direction. A no-op on
    /// an already acyclic graph.
    #[wasm_bindgen(js_name = removeCycles)]
    pub fn remove_cycles(&mut self) -> u32 {
        let record = CycleRemoval::new().run(&mut self.graph);
        let count = record.len() as u32;
        self.reversed.merge(record);
        count
    }

    /// Back edges removed (not reversed) by cycle removal because their
    /// opposite pair already existed, flattened to [u0, v0, u1, v1, ...] in
    /// their original direction. Lets callers report edges that are no
    /// longer drawn.
    #[wasm_bindgen(js_name = droppedEdges)]
    pub fn dropped_edges(&self) -> Vec<u32> {
        self.reversed
            .dropped()
            .iter()
            .flat_map(|&(u, v)| [u, v])
            .collect()
    }

    /// Compute the layered layout and store it on the engine.
    ///
    /// Call [`removeCycles`](Self::remove_cycles) first if the graph may be
    /// cyclic. The result is read back with the getters below.
    ///
    /// # Arguments
    ///
    /// * `ltor` - Layers flow left-to-right if true, top-to-bottom otherwise
    /// * `layer_margin` - Spacing between adjacent layers (default: 20)
    /// * `vertex_margin` - Spacing between vertices within a layer (default: 5)
    /// * `edge_margin` - Extent reserved for routed edges (default: 5)
    /// * `repeat` - Layer-balancing iteration count (default: 4)
    #[wasm_bindgen(js_name = computeLayout)]
    pub fn compute_layout(
        &mut self,
        ltor: bool,
        layer_margin: f64,
        vertex_margin: f64,
        edge_margin: f64,
        repeat: usize,
    ) -> bool {
        if !self.graph.is_acyclic() {
            return false;
        }
        let engine = SugiyamaLayout::new(SugiyamaConfig {
            ltor,
            layer_margin,
            vertex_margin,
            edge_margin,
            repeat,
        });
        self.layout = Some(engine.layout(&self.graph, &self.reversed, |_, attrs| {
            (attrs.width, attrs.height)
        }));
        true
    }

    /// Compute the layout with default configuration.
    #[wasm_bindgen(js_name = computeLayoutWithDefaults)]
    pub fn compute_layout_with_defaults(&mut self) -> bool {
        let c = SugiyamaConfig::default();
        self.compute_layout(c.ltor, c.layer_margin, c.vertex_margin, c.edge_margin, c.repeat)
    }

    // =========================================================================
    // Layout Results
    // =========================================================================

    /// Geometry of a laid-out vertex as [x, y, width, height].
    ///
    /// Returns None before the first layout or for unknown ids.
    #[wasm_bindgen(js_name = getVertexGeometry)]
    pub fn get_vertex_geometry(&self, id: u32) -> Option<Vec<f64>> {
        let v = self.layout.as_ref()?.vertex(&id)?;
        Some(vec![v.x, v.y, v.width, v.height])
    }

    /// Routed points of the edge stored as (source, target), flattened to
    /// [x0, y0, x1, y1, ...]. Empty if the edge was not laid out.
    #[wasm_bindgen(js_name = edgePoints)]
    pub fn edge_points(&self, source: u32, target: u32) -> Float32Array {
        let points: Vec<f32> = self
            .layout
            .as_ref()
            .and_then(|l| l.edge(&source, &target))
            .map(|path| {
                path.points
                    .iter()
                    .flat_map(|p| [p.x as f32, p.y as f32])
                    .collect()
            })
            .unwrap_or_default();
        Float32Array::from(&points[..])
    }

    /// True if the edge stored as (source, target) was flipped by cycle
    /// removal; its points run target-to-source.
    #[wasm_bindgen(js_name = isEdgeReversed)]
    pub fn is_edge_reversed(&self, source: u32, target: u32) -> bool {
        self.reversed.contains(&source, &target)
    }

    /// Bounding box of the computed layout as [min_x, min_y, max_x, max_y].
    ///
    /// Returns None before the first layout or for an empty graph.
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f64>> {
        let b = self.layout.as_ref()?.bounds()?;
        Some(vec![b.min_x, b.min_y, b.max_x, b.max_y])
    }

    /// Serialize the whole layout to a plain JS object:
    /// `{ vertices: [{id, x, y, width, height}], edges: [{source, target,
    /// reversed, points: [[x, y], ...]}] }`.
    #[wasm_bindgen(js_name = layoutToJs)]
    pub fn layout_to_js(&self) -> Result<JsValue, JsValue> {
        let Some(layout) = &self.layout else {
            return Ok(JsValue::NULL);
        };

        let mut vertices: Vec<VertexDto> = layout
            .vertices
            .iter()
            .map(|(&id, v)| VertexDto {
                id,
                x: v.x,
                y: v.y,
                width: v.width,
                height: v.height,
            })
            .collect();
        vertices.sort_by_key(|v| v.id);

        let mut edges: Vec<EdgeDto> = layout
            .edges
            .iter()
            .map(|(&(source, target), path)| EdgeDto {
                source,
                target,
                reversed: path.reversed,
                points: path.points.iter().map(|p| [p.x, p.y]).collect(),
            })
            .collect();
        edges.sort_by_key(|e| (e.source, e.target));

        let dto = LayoutDto { vertices, edges };
        serde_wasm_bindgen::to_value(&dto).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Clear the graph, the reversal record, and any computed layout.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.reversed = ReversedEdges::new();
        self.layout = None;
    }
}

impl Default for LayeredGraphWasm {
    fn default() -> Self {
        Self::new()
    }
}
