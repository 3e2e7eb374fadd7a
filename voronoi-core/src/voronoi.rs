//! Construction backends, the clip-and-assemble pipeline, and its result.

use crate::cells::{assemble, Attribution, VoronoiCell};
use crate::clip::BoundingBox;
use crate::delaunay::{Degeneracy, Triangle};
use crate::edge::{ClippedEdge, RawEdge};
use crate::site::Extent;
use crate::{Position, Result, VoronoiError};

/// Default padding around the sites' extent
pub const DEFAULT_MARGIN: f64 = 5.0;

/// Unbounded edges are drawn out to this multiple of the scene size
pub const FAR_POINT_FACTOR: f64 = 1000.0;

/// Clipped edges closer than this (scaled by scene size) are merged
const EDGE_TOLERANCE: f64 = 1e-9;

/// Raw output of a construction backend
#[derive(Debug, Clone, Default)]
pub struct Construction {
    /// Delaunay triangles, empty for the sweep
    pub triangles: Vec<Triangle>,
    pub vertices: Vec<Position>,
    pub edges: Vec<RawEdge>,
    pub duplicates: Vec<usize>,
    /// Why the triangulation came out empty, if it did
    pub degeneracy: Option<Degeneracy>,
}

/// Trait for Voronoi construction backends
pub trait ConstructionBackend {
    /// Short name for logs and reports
    fn name(&self) -> &'static str;

    /// Build unclipped Voronoi edges for `sites`
    fn construct(&mut self, sites: &[Position]) -> Result<Construction>;
}

/// Viewport and cell options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagramConfig {
    /// Padding added around the sites when no explicit bounds are given
    pub margin: f64,
    /// Explicit viewport; must contain every site
    pub bounds: Option<BoundingBox>,
    pub attribution: Attribution,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
            bounds: None,
            attribution: Attribution::default(),
        }
    }
}

impl DiagramConfig {
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(VoronoiError::InvalidMargin(self.margin));
        }
        if let Some(b) = self.bounds {
            BoundingBox::new(b.min_x, b.min_y, b.max_x, b.max_y)?;
        }
        Ok(())
    }

    /// Viewport for `sites`: the explicit bounds if set, else the padded extent.
    pub fn resolve_bounds(&self, sites: &[Position]) -> Result<BoundingBox> {
        let Some(bounds) = self.bounds else {
            return BoundingBox::around(sites, self.margin);
        };
        if let Some((index, site)) = sites.iter().enumerate().find(|(_, s)| !bounds.contains(s)) {
            return Err(VoronoiError::SiteOutsideBounds {
                index,
                x: site.x,
                y: site.y,
            });
        }
        Ok(bounds)
    }
}

/// A clipped Voronoi diagram
#[derive(Debug, Clone)]
pub struct Diagram {
    pub sites: Vec<Position>,
    pub bounds: BoundingBox,
    pub triangles: Vec<Triangle>,
    /// Voronoi vertices, possibly outside `bounds`
    pub vertices: Vec<Position>,
    /// Edges before clipping
    pub raw_edges: Vec<RawEdge>,
    pub edges: Vec<ClippedEdge>,
    /// One cell per site, in site order
    pub cells: Vec<VoronoiCell>,
    pub duplicates: Vec<usize>,
    pub degeneracy: Option<Degeneracy>,
}

impl Diagram {
    pub fn renderable_cells(&self) -> impl Iterator<Item = &VoronoiCell> {
        self.cells.iter().filter(|c| c.is_renderable())
    }

    /// Voronoi vertices inside the viewport
    pub fn vertices_in_bounds(&self) -> Vec<Position> {
        self.vertices
            .iter()
            .copied()
            .filter(|v| self.bounds.contains(v))
            .collect()
    }

    /// Sites whose cell has fewer than three vertices
    pub fn unrenderable_sites(&self) -> Vec<usize> {
        self.cells
            .iter()
            .filter(|c| !c.is_renderable())
            .map(|c| c.site)
            .collect()
    }
}

/// High-level Voronoi computer that can use different backends
pub struct VoronoiComputer<B: ConstructionBackend> {
    backend: B,
    config: DiagramConfig,
}

impl<B: ConstructionBackend> VoronoiComputer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: DiagramConfig::default(),
        }
    }

    pub fn with_config(backend: B, config: DiagramConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn compute(&mut self, sites: &[Position]) -> Result<Diagram> {
        if sites.is_empty() {
            return Err(VoronoiError::NoSites);
        }
        self.config.validate()?;
        let bounds = self.config.resolve_bounds(sites)?;

        let construction = self.backend.construct(sites)?;
        let edges = clip_edges(&construction.edges, sites, &bounds);

        let active: Vec<usize> = (0..sites.len())
            .filter(|i| !construction.duplicates.contains(i))
            .collect();
        let cells = assemble(sites, &active, &edges, &bounds, self.config.attribution);

        let diagram = Diagram {
            sites: sites.to_vec(),
            bounds,
            triangles: construction.triangles,
            vertices: construction.vertices,
            raw_edges: construction.edges,
            edges,
            cells,
            duplicates: construction.duplicates,
            degeneracy: construction.degeneracy,
        };
        log::debug!(
            "{}: {} sites, {} triangles, {} vertices, {} edges ({} clipped), {} unrenderable cells",
            self.backend.name(),
            sites.len(),
            diagram.triangles.len(),
            diagram.vertices.len(),
            diagram.raw_edges.len(),
            diagram.edges.len(),
            diagram.unrenderable_sites().len(),
        );
        Ok(diagram)
    }
}

/// Clip raw edges to `bounds`, dropping empty pieces and repeats.
pub fn clip_edges(raw: &[RawEdge], sites: &[Position], bounds: &BoundingBox) -> Vec<ClippedEdge> {
    let site_span = Extent::of(sites).map_or(0.0, |e| e.span());
    let scene = site_span.max(bounds.width()).max(bounds.height()).max(1.0);
    let reach = FAR_POINT_FACTOR * scene;
    let tol = EDGE_TOLERANCE * scene;
    let center = bounds.center();

    let mut clipped: Vec<ClippedEdge> = Vec::with_capacity(raw.len());
    for edge in raw {
        let (a, b) = edge.to_segment(&center, reach);
        let Some((a, b)) = bounds.clip(a, b) else {
            continue;
        };
        let piece = ClippedEdge {
            sites: edge.sites,
            a,
            b,
        };
        if piece.length() <= tol || clipped.iter().any(|e| e.coincides(&piece, tol)) {
            continue;
        }
        clipped.push(piece);
    }
    clipped
}

/// Largest distance from a vertex in either set to the nearest vertex in the
/// other, `None` when exactly one set is empty.
pub fn vertex_discrepancy(a: &[Position], b: &[Position]) -> Option<f64> {
    fn one_way(from: &[Position], to: &[Position]) -> Option<f64> {
        from.iter().try_fold(0.0f64, |worst, p| {
            let nearest = to
                .iter()
                .map(|q| p.dist(q))
                .min_by(|x, y| x.total_cmp(y))?;
            Some(worst.max(nearest))
        })
    }
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Some(0.0),
        (false, false) => Some(one_way(a, b)?.max(one_way(b, a)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DelaunayBackend, SweepBackend};
    use approx::assert_abs_diff_eq;

    fn p(x: f64, y: f64) -> Position {
        Position::new(x, y)
    }

    fn square_with_center() -> Vec<Position> {
        vec![
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(10.0, 10.0),
            p(0.0, 10.0),
            p(5.0, 5.0),
        ]
    }

    #[test]
    fn test_empty_sites_rejected() {
        let mut computer = VoronoiComputer::new(DelaunayBackend::new());
        assert!(matches!(computer.compute(&[]), Err(VoronoiError::NoSites)));
    }

    #[test]
    fn test_invalid_margin_rejected() {
        let config = DiagramConfig::default().with_margin(-2.0);
        let mut computer = VoronoiComputer::with_config(SweepBackend::new(), config);
        assert!(matches!(
            computer.compute(&[p(0.0, 0.0)]),
            Err(VoronoiError::InvalidMargin(_))
        ));
    }

    #[test]
    fn test_explicit_bounds_must_contain_sites() {
        let bounds = BoundingBox::new(0.0, 0.0, 4.0, 4.0).unwrap();
        let config = DiagramConfig::default().with_bounds(bounds);
        let mut computer = VoronoiComputer::with_config(DelaunayBackend::new(), config);
        let err = computer
            .compute(&[p(1.0, 1.0), p(3.0, 3.0), p(6.0, 1.0)])
            .unwrap_err();
        assert!(matches!(
            err,
            VoronoiError::SiteOutsideBounds { index: 2, .. }
        ));
    }

    #[test]
    fn test_square_with_center_cells() {
        let sites = square_with_center();
        for attribution in [Attribution::Adjacency, Attribution::Nearest] {
            let config = DiagramConfig::default()
                .with_margin(0.0)
                .with_attribution(attribution);
            let mut computer = VoronoiComputer::with_config(DelaunayBackend::new(), config);
            let diagram = computer.compute(&sites).unwrap();

            assert_eq!(diagram.triangles.len(), 4);
            assert!(diagram.unrenderable_sites().is_empty());
            // Center cell is the diamond through the edge midpoints
            let center = &diagram.cells[4];
            assert_eq!(center.vertices.len(), 4);
            assert_abs_diff_eq!(center.area(), 50.0, epsilon = 1e-9);

            let total: f64 = diagram.cells.iter().map(|c| c.area()).sum();
            assert_abs_diff_eq!(total, 100.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_backends_agree_on_cells() {
        let sites = square_with_center();
        let mut dual = VoronoiComputer::new(DelaunayBackend::new());
        let mut sweep = VoronoiComputer::new(SweepBackend::new());
        let a = dual.compute(&sites).unwrap();
        let b = sweep.compute(&sites).unwrap();

        assert_eq!(a.edges.len(), b.edges.len());
        for (ca, cb) in a.cells.iter().zip(&b.cells) {
            assert_abs_diff_eq!(ca.area(), cb.area(), epsilon = 1e-6);
        }
        let gap = vertex_discrepancy(&a.vertices, &b.vertices).unwrap();
        assert!(gap < 1e-9);
    }

    #[test]
    fn test_two_sites_sweep_vs_delaunay() {
        let sites = vec![p(0.0, 0.0), p(2.0, 0.0)];
        let dual = VoronoiComputer::new(DelaunayBackend::new())
            .compute(&sites)
            .unwrap();
        assert!(dual.triangles.is_empty());
        assert!(dual.edges.is_empty());
        assert_eq!(dual.degeneracy, Some(Degeneracy::TooFewSites));

        let sweep = VoronoiComputer::new(SweepBackend::new())
            .compute(&sites)
            .unwrap();
        assert_eq!(sweep.edges.len(), 1);
        let edge = sweep.edges[0];
        assert_abs_diff_eq!(edge.a.x, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(edge.b.x, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(edge.length(), 10.0, epsilon = 1e-9);
        for cell in &sweep.cells {
            assert_abs_diff_eq!(cell.area(), 60.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_duplicates_reported() {
        let sites = vec![p(0.0, 0.0), p(4.0, 0.0), p(2.0, 3.0), p(4.0, 0.0)];
        let diagram = VoronoiComputer::new(SweepBackend::new())
            .compute(&sites)
            .unwrap();
        assert_eq!(diagram.duplicates, vec![3]);
        assert_eq!(diagram.unrenderable_sites(), vec![3]);
        assert_eq!(diagram.renderable_cells().count(), 3);
    }

    #[test]
    fn test_vertex_discrepancy() {
        let a = [p(0.0, 0.0), p(1.0, 1.0)];
        let b = [p(1.0, 1.0), p(0.0, 0.5)];
        assert_abs_diff_eq!(vertex_discrepancy(&a, &b).unwrap(), 0.5);
        assert_eq!(vertex_discrepancy(&[], &[]), Some(0.0));
        assert_eq!(vertex_discrepancy(&a, &[]), None);
    }
}
