//! WASM bindings for voronoi-core.
//!
//! Exposes a stateful `VoronoiEngine` that holds sites and viewport options,
//! returning flat typed arrays for efficient JS interop.

use voronoi_core::{
    Attribution, BoundingBox, ConstructionBackend, DelaunayBackend, Diagram, DiagramConfig,
    Position, SweepBackend, VoronoiComputer,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn flatten(points: &[Position]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// A computed diagram, exposed as flat typed arrays for zero-copy JS access.
#[wasm_bindgen]
pub struct VoronoiFrame {
    edges_flat: Vec<f64>,
    vertices_flat: Vec<f64>,
    triangles_flat: Vec<u32>,
    cell_vertices_flat: Vec<f64>,
    cell_offsets: Vec<u32>,
    bounds: [f64; 4],
    duplicates: Vec<u32>,
}

#[wasm_bindgen]
impl VoronoiFrame {
    /// Clipped edges as flat [x1,y1, x2,y2, ...] (length = num_edges * 4)
    #[wasm_bindgen(getter)]
    pub fn edges(&self) -> Vec<f64> {
        self.edges_flat.clone()
    }

    /// Unclipped Voronoi vertices as flat [x0,y0, x1,y1, ...]
    #[wasm_bindgen(getter)]
    pub fn vertices(&self) -> Vec<f64> {
        self.vertices_flat.clone()
    }

    /// Delaunay triangles as site index triples; empty for the sweep
    #[wasm_bindgen(getter)]
    pub fn triangles(&self) -> Vec<u32> {
        self.triangles_flat.clone()
    }

    /// Concatenated cell polygons as flat [x,y, ...]
    #[wasm_bindgen(getter)]
    pub fn cell_vertices(&self) -> Vec<f64> {
        self.cell_vertices_flat.clone()
    }

    /// Start of each site's polygon in `cell_vertices`, counted in points,
    /// plus a final end offset (length = num_sites + 1). Unrenderable
    /// cells are empty.
    #[wasm_bindgen(getter)]
    pub fn cell_offsets(&self) -> Vec<u32> {
        self.cell_offsets.clone()
    }

    /// Viewport as [min_x, min_y, max_x, max_y]
    #[wasm_bindgen(getter)]
    pub fn bounds(&self) -> Vec<f64> {
        self.bounds.to_vec()
    }

    /// Indices of sites dropped as duplicates
    #[wasm_bindgen(getter)]
    pub fn duplicates(&self) -> Vec<u32> {
        self.duplicates.clone()
    }
}

impl VoronoiFrame {
    fn from_diagram(diagram: Diagram) -> Self {
        let edges_flat = diagram
            .edges
            .iter()
            .flat_map(|e| [e.a.x, e.a.y, e.b.x, e.b.y])
            .collect();
        let triangles_flat = diagram
            .triangles
            .iter()
            .flat_map(|t| t.vertices().map(|v| v as u32))
            .collect();

        let mut cell_vertices_flat = Vec::new();
        let mut cell_offsets = Vec::with_capacity(diagram.cells.len() + 1);
        for cell in &diagram.cells {
            cell_offsets.push((cell_vertices_flat.len() / 2) as u32);
            if cell.is_renderable() {
                cell_vertices_flat.extend(flatten(&cell.vertices));
            }
        }
        cell_offsets.push((cell_vertices_flat.len() / 2) as u32);

        let b = diagram.bounds;
        Self {
            edges_flat,
            vertices_flat: flatten(&diagram.vertices),
            triangles_flat,
            cell_vertices_flat,
            cell_offsets,
            bounds: [b.min_x, b.min_y, b.max_x, b.max_y],
            duplicates: diagram.duplicates.iter().map(|&i| i as u32).collect(),
        }
    }
}

fn run<B: ConstructionBackend>(
    backend: B,
    config: DiagramConfig,
    sites: &[Position],
) -> Result<VoronoiFrame, JsError> {
    let diagram = VoronoiComputer::with_config(backend, config).compute(sites)?;
    Ok(VoronoiFrame::from_diagram(diagram))
}

/// Stateful Voronoi engine holding the sites and diagram options.
#[wasm_bindgen]
pub struct VoronoiEngine {
    sites: Vec<Position>,
    config: DiagramConfig,
}

impl Default for VoronoiEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl VoronoiEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();
        Self {
            sites: Vec::new(),
            config: DiagramConfig::default(),
        }
    }

    /// Replace the sites with flat [x0,y0, x1,y1, ...] positions.
    /// A trailing odd value is ignored.
    pub fn set_sites(&mut self, positions: &[f64]) {
        self.sites = positions
            .chunks_exact(2)
            .map(|xy| Position::new(xy[0], xy[1]))
            .collect();
    }

    /// Padding used when no explicit bounds are set
    pub fn set_margin(&mut self, margin: f64) {
        self.config.margin = margin;
    }

    /// Fix the viewport; fails if the box is empty or not finite.
    pub fn set_bounds(
        &mut self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Result<(), JsError> {
        self.config.bounds = Some(BoundingBox::new(min_x, min_y, max_x, max_y)?);
        Ok(())
    }

    /// Go back to bounds derived from the sites and margin.
    pub fn clear_bounds(&mut self) {
        self.config.bounds = None;
    }

    /// `"adjacency"` or `"nearest"`
    pub fn set_attribution(&mut self, attribution: &str) -> Result<(), JsError> {
        self.config.attribution = attribution
            .parse::<Attribution>()
            .map_err(|e| JsError::new(&e))?;
        Ok(())
    }

    /// Build the diagram with `"delaunay"` or `"sweep"`.
    pub fn compute(&self, algorithm: &str) -> Result<VoronoiFrame, JsError> {
        match algorithm.to_lowercase().as_str() {
            "delaunay" => run(DelaunayBackend::new(), self.config, &self.sites),
            "sweep" | "fortune" => run(SweepBackend::new(), self.config, &self.sites),
            other => Err(JsError::new(&format!(
                "Unknown algorithm: {} (expected delaunay or sweep)",
                other
            ))),
        }
    }

    /// Current site positions as flat [x0,y0, x1,y1, ...].
    pub fn get_positions(&self) -> Vec<f64> {
        flatten(&self.sites)
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> VoronoiEngine {
        let mut engine = VoronoiEngine::new();
        engine.set_sites(&[0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0, 5.0, 5.0, 99.0]);
        engine
    }

    #[test]
    fn test_set_sites_ignores_trailing_value() {
        let engine = engine();
        assert_eq!(engine.site_count(), 5);
        assert_eq!(engine.get_positions().len(), 10);
    }

    #[test]
    fn test_frame_layout() {
        let frame = VoronoiFrame::from_diagram(
            VoronoiComputer::new(DelaunayBackend::new())
                .compute(&engine().sites)
                .unwrap(),
        );
        assert_eq!(frame.triangles().len(), 12);
        assert_eq!(frame.vertices().len(), 8);
        assert_eq!(frame.edges().len() % 4, 0);
        assert_eq!(frame.bounds(), vec![-5.0, -5.0, 15.0, 15.0]);

        let offsets = frame.cell_offsets();
        assert_eq!(offsets.len(), 6);
        assert_eq!(offsets[0], 0);
        assert_eq!(*offsets.last().unwrap() as usize * 2, frame.cell_vertices().len());
        assert!(offsets.windows(2).all(|w| w[1] - w[0] >= 3));
    }

    #[test]
    fn test_sweep_has_no_triangles() {
        let frame = VoronoiFrame::from_diagram(
            VoronoiComputer::new(SweepBackend::new())
                .compute(&engine().sites)
                .unwrap(),
        );
        assert!(frame.triangles().is_empty());
        assert_eq!(frame.vertices().len(), 8);
    }
}
