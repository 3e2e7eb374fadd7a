//! Planar Voronoi diagram construction.
//!
//! Two interchangeable backends build the unclipped diagram: Bowyer-Watson
//! Delaunay triangulation followed by dual extraction, and Fortune's sweep.
//! Both feed the same Cohen-Sutherland clipping and cell assembly.

mod cells;
mod clip;
mod delaunay;
mod dual;
mod edge;
mod fortune;
mod loader;
mod predicates;
mod site;
mod voronoi;

pub use cells::{Attribution, VoronoiCell};
pub use clip::BoundingBox;
pub use delaunay::{super_triangle, Degeneracy, DelaunayBuilder, Triangle, Triangulation};
pub use dual::{extract, DelaunayBackend, DualGraph};
pub use edge::{ClippedEdge, EdgeGeometry, RawEdge};
pub use fortune::{FortuneSweep, SweepBackend, SweepOutput};
pub use loader::{load_sites, parse_sites, LoadError};
pub use predicates::{circumcircle, orientation, CircumCircle};
pub use site::{
    partition_duplicates, Direction, Extent, Position, SiteCollection, DUPLICATE_EPSILON,
};
pub use voronoi::{
    clip_edges, vertex_discrepancy, Construction, ConstructionBackend, Diagram, DiagramConfig,
    VoronoiComputer, DEFAULT_MARGIN,
};

/// Error type for Voronoi operations
#[derive(Debug, thiserror::Error)]
pub enum VoronoiError {
    #[error("No sites provided")]
    NoSites,

    #[error("Invalid margin: {0} (must be finite and non-negative)")]
    InvalidMargin(f64),

    #[error("Invalid bounds: [{min_x}, {max_x}] x [{min_y}, {max_y}]")]
    InvalidBounds {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    #[error("Site {index} at ({x}, {y}) lies outside the bounds")]
    SiteOutsideBounds { index: usize, x: f64, y: f64 },

    #[error("Load error: {0}")]
    Load(#[from] LoadError),
}

pub type Result<T> = std::result::Result<T, VoronoiError>;
