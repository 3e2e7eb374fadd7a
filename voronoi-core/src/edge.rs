//! Voronoi edge types shared by both constructions.

use crate::site::Direction;
use crate::Position;

/// Shape of an edge before clipping
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeGeometry {
    /// Finite edge between two Voronoi vertices
    Segment(Position, Position),
    /// Unbounded edge leaving a Voronoi vertex
    Ray { origin: Position, direction: Direction },
    /// Edge unbounded both ways (no vertex on it)
    Line { through: Position, direction: Direction },
}

/// An edge before clipping, with the pair of sites it separates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEdge {
    /// Site indices, smaller first
    pub sites: (usize, usize),
    pub geometry: EdgeGeometry,
}

impl RawEdge {
    pub fn new(a: usize, b: usize, geometry: EdgeGeometry) -> Self {
        let sites = if a < b { (a, b) } else { (b, a) };
        Self { sites, geometry }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self.geometry, EdgeGeometry::Segment(..))
    }

    /// Finite stand-in for this edge. Unbounded ends are synthesized `reach`
    /// beyond however far the anchor point sits from `center`, so the far
    /// point always lands outside a viewport of size `reach` around `center`.
    pub fn to_segment(&self, center: &Position, reach: f64) -> (Position, Position) {
        match self.geometry {
            EdgeGeometry::Segment(a, b) => (a, b),
            EdgeGeometry::Ray { origin, direction } => {
                let t = reach + origin.dist(center);
                (origin, origin.offset(direction, t))
            }
            EdgeGeometry::Line { through, direction } => {
                let t = reach + through.dist(center);
                (through.offset(direction, -t), through.offset(direction, t))
            }
        }
    }
}

/// A finite edge inside the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedEdge {
    /// Site indices, smaller first
    pub sites: (usize, usize),
    pub a: Position,
    pub b: Position,
}

impl ClippedEdge {
    pub fn length(&self) -> f64 {
        self.a.dist(&self.b)
    }

    pub fn midpoint(&self) -> Position {
        self.a.midpoint(&self.b)
    }

    /// Same undirected segment within `tol`
    pub fn coincides(&self, other: &ClippedEdge, tol: f64) -> bool {
        let tol_sq = tol * tol;
        let forward = self.a.dist_sq(&other.a) <= tol_sq && self.b.dist_sq(&other.b) <= tol_sq;
        let backward = self.a.dist_sq(&other.b) <= tol_sq && self.b.dist_sq(&other.a) <= tol_sq;
        forward || backward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_far_point_clears_viewport() {
        let origin = Position::new(50.0, 0.0);
        let edge = RawEdge::new(
            3,
            1,
            EdgeGeometry::Ray {
                origin,
                direction: Direction::new(-1.0, 0.0).unwrap(),
            },
        );
        assert_eq!(edge.sites, (1, 3));
        let (a, b) = edge.to_segment(&Position::new(0.0, 0.0), 10.0);
        assert_eq!(a, origin);
        assert_eq!(b, Position::new(-10.0, 0.0));
    }

    #[test]
    fn test_line_extends_both_ways() {
        let edge = RawEdge::new(
            0,
            1,
            EdgeGeometry::Line {
                through: Position::new(1.0, 0.0),
                direction: Direction::new(0.0, 1.0).unwrap(),
            },
        );
        assert!(!edge.is_bounded());
        let (a, b) = edge.to_segment(&Position::new(1.0, 0.0), 5.0);
        assert_eq!(a, Position::new(1.0, -5.0));
        assert_eq!(b, Position::new(1.0, 5.0));
    }

    #[test]
    fn test_coincides_ignores_direction() {
        let e1 = ClippedEdge {
            sites: (0, 1),
            a: Position::new(0.0, 0.0),
            b: Position::new(1.0, 1.0),
        };
        let e2 = ClippedEdge {
            sites: (0, 1),
            a: Position::new(1.0, 1.0 + 1e-12),
            b: Position::new(0.0, 0.0),
        };
        assert!(e1.coincides(&e2, 1e-9));
        assert!(!e1.coincides(&ClippedEdge { b: Position::new(2.0, 1.0), ..e1 }, 1e-9));
    }
}
