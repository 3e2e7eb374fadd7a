//! Voronoi edges read off a Delaunay triangulation.
//!
//! Every triangle's circumcenter is a Voronoi vertex. Two triangles sharing
//! an edge give a finite Voronoi edge between their circumcenters; a hull
//! edge, owned by a single triangle, gives a ray leaving the hull.

use std::collections::BTreeMap;

use crate::delaunay::{edge_key, DelaunayBuilder, Triangle};
use crate::edge::{EdgeGeometry, RawEdge};
use crate::predicates::circumcircle;
use crate::site::Direction;
use crate::voronoi::{Construction, ConstructionBackend};
use crate::{Position, Result};

/// Voronoi vertices and edges dual to a triangulation
#[derive(Debug, Clone, Default)]
pub struct DualGraph {
    pub vertices: Vec<Position>,
    pub edges: Vec<RawEdge>,
}

/// Build the dual of `triangles`, whose indices address `sites`.
pub fn extract(sites: &[Position], triangles: &[Triangle]) -> DualGraph {
    let mut vertices = Vec::with_capacity(triangles.len());
    // Edge -> (vertex index, vertex opposite the edge) for each owning triangle
    let mut owners: BTreeMap<(usize, usize), Vec<(usize, usize)>> = BTreeMap::new();

    for tri in triangles {
        let [a, b, c] = tri.vertices();
        let Some(circle) = circumcircle(&sites[a], &sites[b], &sites[c]) else {
            continue;
        };
        let vertex = vertices.len();
        vertices.push(circle.center);
        for ((u, v), opposite) in tri.edges() {
            owners.entry(edge_key(u, v)).or_default().push((vertex, opposite));
        }
    }

    let mut edges = Vec::with_capacity(owners.len());
    for ((u, v), owned) in owners {
        match owned.as_slice() {
            [(i, _), (j, _)] => {
                let (a, b) = (vertices[*i], vertices[*j]);
                // Co-circular neighbors share a circumcenter
                if a != b {
                    edges.push(RawEdge::new(u, v, EdgeGeometry::Segment(a, b)));
                }
            }
            [(i, opposite)] => {
                if let Some(direction) = outward_normal(&sites[u], &sites[v], &sites[*opposite]) {
                    edges.push(RawEdge::new(
                        u,
                        v,
                        EdgeGeometry::Ray {
                            origin: vertices[*i],
                            direction,
                        },
                    ));
                }
            }
            _ => log::warn!("edge ({u}, {v}) shared by {} triangles, skipped", owned.len()),
        }
    }

    log::debug!(
        "dual of {} triangles: {} vertices, {} edges",
        triangles.len(),
        vertices.len(),
        edges.len()
    );
    DualGraph { vertices, edges }
}

/// Normal of hull edge `uv` pointing away from the triangle's third vertex,
/// measured from the edge midpoint. The circumcenter itself may lie outside
/// the triangle, so it is no reference for which side is outward.
fn outward_normal(u: &Position, v: &Position, opposite: &Position) -> Option<Direction> {
    let dir = Direction::new(-(v.y - u.y), v.x - u.x)?;
    let mid = u.midpoint(v);
    if dir.dot(opposite.x - mid.x, opposite.y - mid.y) > 0.0 {
        Some(dir.reversed())
    } else {
        Some(dir)
    }
}

/// Bowyer-Watson triangulation followed by dual extraction
pub struct DelaunayBackend;

impl DelaunayBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DelaunayBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionBackend for DelaunayBackend {
    fn name(&self) -> &'static str {
        "delaunay"
    }

    fn construct(&mut self, sites: &[Position]) -> Result<Construction> {
        let triangulation = DelaunayBuilder::build(sites);
        let dual = extract(sites, &triangulation.triangles);
        Ok(Construction {
            triangles: triangulation.triangles,
            vertices: dual.vertices,
            edges: dual.edges,
            duplicates: triangulation.duplicates,
            degeneracy: triangulation.degeneracy,
        })
    }
}
