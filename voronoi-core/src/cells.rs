//! Cell polygons assembled from clipped edges and viewport corners.

use std::fmt;
use std::str::FromStr;

use crate::clip::BoundingBox;
use crate::edge::ClippedEdge;
use crate::Position;

/// How clipped edge endpoints are assigned to cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Attribution {
    /// Use the site pair recorded by the construction
    #[default]
    Adjacency,
    /// Re-derive the pair as the two sites nearest the edge midpoint
    Nearest,
}

impl FromStr for Attribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adjacency" | "adjacent" => Ok(Attribution::Adjacency),
            "nearest" => Ok(Attribution::Nearest),
            _ => Err(format!(
                "Unknown attribution: {}. Use 'adjacency' or 'nearest'",
                s
            )),
        }
    }
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribution::Adjacency => write!(f, "adjacency"),
            Attribution::Nearest => write!(f, "nearest"),
        }
    }
}

/// Clipped region of one site, vertices counter-clockwise
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiCell {
    pub site: usize,
    pub vertices: Vec<Position>,
}

impl VoronoiCell {
    /// A polygon needs at least three vertices
    pub fn is_renderable(&self) -> bool {
        self.vertices.len() >= 3
    }

    /// Shoelace area, zero when not renderable
    pub fn area(&self) -> f64 {
        if !self.is_renderable() {
            return 0.0;
        }
        let n = self.vertices.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let (a, b) = (&self.vertices[i], &self.vertices[(i + 1) % n]);
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice * 0.5
    }
}

/// Index among `active` of the site nearest `p`, lowest index on ties.
fn nearest(sites: &[Position], active: &[usize], p: &Position) -> Option<usize> {
    active
        .iter()
        .copied()
        .min_by(|&i, &j| p.dist_sq(&sites[i]).total_cmp(&p.dist_sq(&sites[j])).then(i.cmp(&j)))
}

/// The two sites nearest `p`, lowest indices on ties.
fn nearest_two(sites: &[Position], active: &[usize], p: &Position) -> Option<(usize, usize)> {
    let mut best: [Option<(f64, usize)>; 2] = [None, None];
    for &i in active {
        let d = p.dist_sq(&sites[i]);
        match best {
            [None, _] => best[0] = Some((d, i)),
            [Some((d0, _)), _] if d < d0 => best = [Some((d, i)), best[0]],
            [_, None] => best[1] = Some((d, i)),
            [_, Some((d1, _))] if d < d1 => best[1] = Some((d, i)),
            _ => {}
        }
    }
    match best {
        [Some((_, a)), Some((_, b))] => Some((a, b)),
        _ => None,
    }
}

/// Build one cell per site.
///
/// Each clipped edge contributes both endpoints to the cells of its two
/// sites, and each viewport corner goes to the nearest site. Points closer
/// than a small tolerance are merged, and the rest are ordered by angle
/// around their centroid. Sites listed outside `active` (duplicates) get
/// an empty cell.
pub fn assemble(
    sites: &[Position],
    active: &[usize],
    edges: &[ClippedEdge],
    bounds: &BoundingBox,
    attribution: Attribution,
) -> Vec<VoronoiCell> {
    let mut points: Vec<Vec<Position>> = vec![Vec::new(); sites.len()];

    for edge in edges {
        let pair = match attribution {
            Attribution::Adjacency => Some(edge.sites),
            Attribution::Nearest => nearest_two(sites, active, &edge.midpoint()),
        };
        if let Some((i, j)) = pair {
            points[i].extend([edge.a, edge.b]);
            points[j].extend([edge.a, edge.b]);
        }
    }
    for corner in bounds.corners() {
        if let Some(i) = nearest(sites, active, &corner) {
            points[i].push(corner);
        }
    }

    let tol = 1e-9 * bounds.width().max(bounds.height()).max(1.0);
    points
        .into_iter()
        .enumerate()
        .map(|(site, pts)| VoronoiCell {
            site,
            vertices: order_polygon(merge_close(pts, tol)),
        })
        .collect()
}

fn merge_close(points: Vec<Position>, tol: f64) -> Vec<Position> {
    let tol_sq = tol * tol;
    let mut merged: Vec<Position> = Vec::with_capacity(points.len());
    for p in points {
        if !merged.iter().any(|q| q.dist_sq(&p) <= tol_sq) {
            merged.push(p);
        }
    }
    merged
}

/// Sort a convex point set counter-clockwise around its centroid.
fn order_polygon(mut points: Vec<Position>) -> Vec<Position> {
    if points.is_empty() {
        return points;
    }
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    points.sort_by(|a, b| {
        let ta = (a.y - cy).atan2(a.x - cx);
        let tb = (b.y - cy).atan2(b.x - cx);
        ta.total_cmp(&tb)
    });
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn p(x: f64, y: f64) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_attribution_from_str() {
        assert_eq!("nearest".parse::<Attribution>(), Ok(Attribution::Nearest));
        assert_eq!("Adjacency".parse::<Attribution>(), Ok(Attribution::Adjacency));
        assert!("closest".parse::<Attribution>().is_err());
        assert_eq!(Attribution::default().to_string(), "adjacency");
    }

    #[test]
    fn test_two_sites_split_box() {
        let sites = vec![p(2.0, 5.0), p(8.0, 5.0)];
        let bounds = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let edges = vec![ClippedEdge {
            sites: (0, 1),
            a: p(5.0, 0.0),
            b: p(5.0, 10.0),
        }];

        for attribution in [Attribution::Adjacency, Attribution::Nearest] {
            let cells = assemble(&sites, &[0, 1], &edges, &bounds, attribution);
            assert_eq!(cells.len(), 2);
            for cell in &cells {
                assert_eq!(cell.vertices.len(), 4);
                assert_abs_diff_eq!(cell.area(), 50.0, epsilon = 1e-9);
            }
            assert!(cells[0].vertices.contains(&p(0.0, 0.0)));
            assert!(cells[1].vertices.contains(&p(10.0, 10.0)));
        }
    }

    #[test]
    fn test_single_site_is_whole_box() {
        let sites = vec![p(3.0, 3.0)];
        let bounds = BoundingBox::new(0.0, 0.0, 6.0, 6.0).unwrap();
        let cells = assemble(&sites, &[0], &[], &bounds, Attribution::Adjacency);
        assert_eq!(cells[0].vertices, bounds.corners().to_vec());
        assert_abs_diff_eq!(cells[0].area(), 36.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inactive_site_gets_empty_cell() {
        let sites = vec![p(3.0, 3.0), p(3.0, 3.0)];
        let bounds = BoundingBox::new(0.0, 0.0, 6.0, 6.0).unwrap();
        let cells = assemble(&sites, &[0], &[], &bounds, Attribution::Nearest);
        assert!(cells[0].is_renderable());
        assert!(!cells[1].is_renderable());
        assert_eq!(cells[1].area(), 0.0);
    }

    #[test]
    fn test_merge_and_order() {
        let pts = vec![
            p(1.0, 1.0),
            p(-1.0, -1.0),
            p(1.0, 1.0 + 1e-12),
            p(-1.0, 1.0),
            p(1.0, -1.0),
        ];
        let ordered = order_polygon(merge_close(pts, 1e-9));
        assert_eq!(
            ordered,
            vec![p(-1.0, -1.0), p(1.0, -1.0), p(1.0, 1.0), p(-1.0, 1.0)]
        );
    }

    #[test]
    fn test_nearest_two_ties_prefer_low_index() {
        let sites = vec![p(0.0, 0.0), p(2.0, 0.0), p(1.0, 1.0), p(1.0, -1.0)];
        let pair = nearest_two(&sites, &[0, 1, 2, 3], &p(1.0, 0.0));
        assert_eq!(pair, Some((0, 1)));
        assert_eq!(nearest_two(&sites, &[2], &p(1.0, 0.0)), None);
    }
}
