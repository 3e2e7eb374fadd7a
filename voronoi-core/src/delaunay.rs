//! Delaunay triangulation by incremental Bowyer-Watson insertion.
//!
//! Sites are inserted one at a time into a scaffold super-triangle. Each
//! insertion removes the triangles whose circumcircle strictly contains the
//! new site, then fans new triangles from the boundary of the resulting
//! star-shaped cavity to the site. Triangles touching the scaffold are
//! dropped at the end, leaving the triangulation of the convex hull.
//!
//! Nearly collinear hull sites have circumcircles larger than the scaffold,
//! and their triangles get dropped with it. When the result does not cover
//! the hull, the build is repeated with a larger scaffold.

use std::collections::HashMap;

use crate::predicates::{circumcircle, orientation, CircumCircle, COLLINEAR_EPSILON};
use crate::site::{partition_duplicates, Extent};
use crate::Position;

/// Scale of the super-triangle relative to the sites' extent.
pub const SUPER_TRIANGLE_SCALE: f64 = 100.0;

/// Factor the scaffold grows by when the hull comes out incomplete
const SCAFFOLD_GROWTH: f64 = 100.0;

/// Scaffold sizes tried before giving up on the hull
const MAX_SCAFFOLD_ATTEMPTS: usize = 3;

/// A triangle represented by indices into the site array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triangle {
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

impl Triangle {
    pub fn new(a: usize, b: usize, c: usize) -> Self {
        Self { a, b, c }
    }

    pub fn vertices(&self) -> [usize; 3] {
        [self.a, self.b, self.c]
    }

    /// The three edges as `(edge, opposite vertex)`
    pub fn edges(&self) -> [((usize, usize), usize); 3] {
        [
            ((self.a, self.b), self.c),
            ((self.b, self.c), self.a),
            ((self.c, self.a), self.b),
        ]
    }

    pub fn contains_vertex(&self, v: usize) -> bool {
        self.a == v || self.b == v || self.c == v
    }
}

/// Undirected edge key, smaller index first.
#[inline]
pub(crate) fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Why a triangulation came out empty or incomplete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// Fewer than 3 distinct sites
    TooFewSites,
    /// Every site shares one position, so no scaffold can be sized
    CoincidentSites,
    /// All sites lie on one line
    Collinear,
    /// Triangles were built but do not cover the convex hull, even with the
    /// largest scaffold
    IncompleteHull,
}

/// Output of [`DelaunayBuilder::build`]
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    pub triangles: Vec<Triangle>,
    /// Indices of sites merged into an earlier site or skipped on insertion,
    /// sorted
    pub duplicates: Vec<usize>,
    pub degeneracy: Option<Degeneracy>,
}

impl Triangulation {
    fn degenerate(kind: Degeneracy, duplicates: Vec<usize>) -> Self {
        log::warn!("triangulation is empty: {:?}", kind);
        Self {
            triangles: Vec::new(),
            duplicates,
            degeneracy: Some(kind),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Super-triangle vertices strictly enclosing `extent`, or `None` when the
/// extent has zero size.
pub fn super_triangle(extent: &Extent) -> Option<[Position; 3]> {
    scaled_super_triangle(extent, SUPER_TRIANGLE_SCALE)
}

fn scaled_super_triangle(extent: &Extent, scale: f64) -> Option<[Position; 3]> {
    let delta = extent.span() * scale;
    if delta <= 0.0 || !delta.is_finite() {
        return None;
    }
    let (min_x, min_y) = (extent.min.x, extent.min.y);
    Some([
        Position::new(min_x - delta, min_y - delta),
        Position::new(min_x + 2.0 * delta, min_y - delta),
        Position::new(min_x - delta, min_y + 2.0 * delta),
    ])
}

/// Working triangle with its circumcircle cached at creation
#[derive(Debug, Clone, Copy)]
struct Slot {
    tri: Triangle,
    circle: Option<CircumCircle>,
}

/// Incremental Bowyer-Watson triangulator.
///
/// Vertex indices `0..n` address the input sites; `n..n + 3` address the
/// scaffold and never appear in the output.
pub struct DelaunayBuilder<'a> {
    sites: &'a [Position],
    scaffold: [Position; 3],
    slots: Vec<Slot>,
}

impl<'a> DelaunayBuilder<'a> {
    /// Triangulate `sites`.
    pub fn build(sites: &'a [Position]) -> Triangulation {
        let (distinct, mut duplicates) = partition_duplicates(sites);
        if distinct.len() < 3 {
            return Triangulation::degenerate(Degeneracy::TooFewSites, duplicates);
        }

        let Some(extent) = Extent::of(sites) else {
            return Triangulation::degenerate(Degeneracy::TooFewSites, duplicates);
        };
        let hull_tol = COLLINEAR_EPSILON * extent.span().max(1.0).powi(2);

        let mut scale = SUPER_TRIANGLE_SCALE;
        let mut attempt = 1;
        let (triangles, skipped, covered) = loop {
            let Some(scaffold) = scaled_super_triangle(&extent, scale) else {
                return Triangulation::degenerate(Degeneracy::CoincidentSites, duplicates);
            };
            let (triangles, skipped) = Self::triangulate(sites, scaffold, &distinct);
            let inserted: Vec<usize> = distinct
                .iter()
                .copied()
                .filter(|i| !skipped.contains(i))
                .collect();
            let covered =
                !triangles.is_empty() && covers_hull(sites, &inserted, &triangles, hull_tol);
            if covered || attempt == MAX_SCAFFOLD_ATTEMPTS {
                break (triangles, skipped, covered);
            }
            log::debug!(
                "bowyer-watson: hull incomplete with scaffold x{}, retrying larger",
                scale
            );
            scale *= SCAFFOLD_GROWTH;
            attempt += 1;
        };

        if !skipped.is_empty() {
            log::warn!(
                "{} site(s) opened no cavity and were skipped: {:?}",
                skipped.len(),
                skipped
            );
            duplicates.extend(&skipped);
            duplicates.sort_unstable();
        }

        log::debug!(
            "bowyer-watson: {} sites ({} duplicates) -> {} triangles, scaffold x{}",
            sites.len(),
            duplicates.len(),
            triangles.len(),
            scale
        );

        if triangles.is_empty() {
            return Triangulation::degenerate(Degeneracy::Collinear, duplicates);
        }
        if !covered {
            log::warn!("triangulation does not cover the convex hull");
        }
        Triangulation {
            triangles,
            duplicates,
            degeneracy: (!covered).then_some(Degeneracy::IncompleteHull),
        }
    }

    /// One Bowyer-Watson pass over `order` inside `scaffold`. Returns the
    /// triangles free of scaffold vertices and the sites that opened no
    /// cavity.
    fn triangulate(
        sites: &'a [Position],
        scaffold: [Position; 3],
        order: &[usize],
    ) -> (Vec<Triangle>, Vec<usize>) {
        let n = sites.len();
        let mut builder = DelaunayBuilder {
            sites,
            scaffold,
            slots: Vec::with_capacity(2 * order.len() + 1),
        };
        builder.push(Triangle::new(n, n + 1, n + 2));

        let skipped: Vec<usize> = order.iter().copied().filter(|&i| !builder.insert(i)).collect();

        let triangles = builder
            .slots
            .iter()
            .filter(|slot| slot.circle.is_some())
            .map(|slot| slot.tri)
            .filter(|tri| tri.vertices().iter().all(|&v| v < n))
            .collect();
        (triangles, skipped)
    }

    fn vertex(&self, v: usize) -> &Position {
        let n = self.sites.len();
        if v < n {
            &self.sites[v]
        } else {
            &self.scaffold[v - n]
        }
    }

    fn push(&mut self, tri: Triangle) {
        let circle = circumcircle(self.vertex(tri.a), self.vertex(tri.b), self.vertex(tri.c));
        self.slots.push(Slot { tri, circle });
    }

    /// Insert one site, re-triangulating the cavity it opens. Returns
    /// `false` when no circumcircle contains the site.
    fn insert(&mut self, site: usize) -> bool {
        let p = self.sites[site];

        let (invalid, kept): (Vec<Slot>, Vec<Slot>) = self
            .slots
            .iter()
            .copied()
            .partition(|slot| slot.circle.is_some_and(|c| c.contains(&p)));
        if invalid.is_empty() {
            log::trace!("site {} opens no cavity", site);
            return false;
        }

        // Edges seen exactly once bound the cavity; shared ones cancel
        let mut counts: HashMap<(usize, usize), usize> = HashMap::new();
        let mut boundary = Vec::with_capacity(invalid.len() * 3);
        for slot in &invalid {
            for ((u, v), _) in slot.tri.edges() {
                *counts.entry(edge_key(u, v)).or_insert(0) += 1;
                boundary.push((u, v));
            }
        }
        boundary.retain(|&(u, v)| counts[&edge_key(u, v)] == 1);

        self.slots = kept;
        for (u, v) in boundary {
            self.push(Triangle::new(u, v, site));
        }
        true
    }
}

/// True when `triangles` cover the convex hull of `sites[active]`.
///
/// Each edge owned by a single triangle is a boundary edge. The hull is
/// covered exactly when no active site lies strictly outside any boundary
/// edge.
fn covers_hull(sites: &[Position], active: &[usize], triangles: &[Triangle], tol: f64) -> bool {
    let mut owners: HashMap<(usize, usize), Option<(usize, usize)>> = HashMap::new();
    for tri in triangles {
        let [a, b, c] = tri.vertices();
        let ccw = orientation(&sites[a], &sites[b], &sites[c]) > 0.0;
        for ((u, v), _) in tri.edges() {
            let directed = if ccw { (u, v) } else { (v, u) };
            owners
                .entry(edge_key(u, v))
                .and_modify(|e| *e = None)
                .or_insert(Some(directed));
        }
    }
    owners.values().flatten().all(|&(u, v)| {
        active
            .iter()
            .all(|&s| orientation(&sites[u], &sites[v], &sites[s]) >= -tol)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn p(x: f64, y: f64) -> Position {
        Position::new(x, y)
    }

    fn random_sites(count: usize, seed: u64) -> Vec<Position> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..count)
            .map(|_| p(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect()
    }

    fn assert_empty_circumcircles(sites: &[Position], triangles: &[Triangle]) {
        for tri in triangles {
            let cc = circumcircle(&sites[tri.a], &sites[tri.b], &sites[tri.c])
                .expect("output triangle is degenerate");
            for (i, s) in sites.iter().enumerate() {
                if tri.contains_vertex(i) {
                    continue;
                }
                assert!(
                    cc.center.dist(s) >= cc.radius - 1e-9,
                    "site {} lies inside circumcircle of {:?}",
                    i,
                    tri,
                );
            }
        }
    }

    #[test]
    fn test_three_sites_make_one_triangle() {
        let sites = vec![p(0.0, 0.0), p(4.0, 0.0), p(2.0, 3.0)];
        let result = DelaunayBuilder::build(&sites);
        assert_eq!(result.triangles.len(), 1);
        assert!(result.degeneracy.is_none());
        let mut verts = result.triangles[0].vertices();
        verts.sort();
        assert_eq!(verts, [0, 1, 2]);
    }

    #[test]
    fn test_too_few_sites_is_empty_not_error() {
        let result = DelaunayBuilder::build(&[p(0.0, 0.0), p(2.0, 0.0)]);
        assert!(result.is_empty());
        assert_eq!(result.degeneracy, Some(Degeneracy::TooFewSites));

        let result = DelaunayBuilder::build(&[]);
        assert_eq!(result.degeneracy, Some(Degeneracy::TooFewSites));
    }

    #[test]
    fn test_duplicates_do_not_count_as_sites() {
        let sites = vec![p(1.0, 1.0), p(1.0, 1.0), p(3.0, 2.0), p(3.0, 2.0)];
        let result = DelaunayBuilder::build(&sites);
        assert_eq!(result.degeneracy, Some(Degeneracy::TooFewSites));
        assert_eq!(result.duplicates, vec![1, 3]);
    }

    #[test]
    fn test_near_duplicate_is_reported() {
        let sites = vec![p(0.0, 0.0), p(1e-12, 0.0), p(5.0, 0.0), p(2.0, 4.0)];
        let result = DelaunayBuilder::build(&sites);
        assert!(result.degeneracy.is_none());
        assert_eq!(result.duplicates, vec![1]);
        assert_eq!(result.triangles.len(), 1);
        assert!(!result.triangles[0].contains_vertex(1));
    }

    #[test]
    fn test_site_without_cavity_is_skipped() {
        // Re-inserting a site lies on every circumcircle through it
        let sites = vec![p(0.0, 0.0), p(4.0, 0.0), p(2.0, 3.0), p(0.0, 0.0)];
        let scaffold = super_triangle(&Extent::of(&sites).unwrap()).unwrap();
        let (triangles, skipped) = DelaunayBuilder::triangulate(&sites, scaffold, &[0, 1, 2, 3]);
        assert_eq!(skipped, vec![3]);
        assert_eq!(triangles.len(), 1);
    }

    #[test]
    fn test_flat_hull_is_covered() {
        // Hull triangles here have circumradii far beyond the default scaffold
        let sites = vec![
            p(0.0, 0.0),
            p(100.0, 0.0),
            p(50.0, 0.01),
            p(20.0, -0.02),
            p(80.0, 0.005),
        ];
        let result = DelaunayBuilder::build(&sites);
        assert!(result.degeneracy.is_none());
        // Every site is on the hull: n - 2 triangles
        assert_eq!(result.triangles.len(), 3);
        for i in 0..sites.len() {
            assert!(result.triangles.iter().any(|t| t.contains_vertex(i)));
        }
        let all: Vec<usize> = (0..sites.len()).collect();
        let tol = COLLINEAR_EPSILON * 100.0 * 100.0;
        assert!(covers_hull(&sites, &all, &result.triangles, tol));
        assert_empty_circumcircles(&sites, &result.triangles);
    }

    #[test]
    fn test_covers_hull_detects_missing_triangle() {
        let sites = vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)];
        let both = [Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)];
        assert!(covers_hull(&sites, &[0, 1, 2, 3], &both, 1e-10));
        assert!(!covers_hull(&sites, &[0, 1, 2, 3], &both[..1], 1e-10));
    }

    #[test]
    fn test_collinear_sites_yield_no_triangles() {
        let sites: Vec<Position> = (0..6).map(|i| p(i as f64, 2.0 * i as f64)).collect();
        let result = DelaunayBuilder::build(&sites);
        assert!(result.is_empty());
        assert_eq!(result.degeneracy, Some(Degeneracy::Collinear));
    }

    #[test]
    fn test_super_triangle_contains_sites() {
        let sites = vec![p(2.0, 4.0), p(5.0, 8.0), p(18.0, 19.0), p(12.0, 13.0)];
        let st = super_triangle(&Extent::of(&sites).unwrap()).unwrap();
        for s in &sites {
            let d1 = crate::predicates::orientation(&st[0], &st[1], s);
            let d2 = crate::predicates::orientation(&st[1], &st[2], s);
            let d3 = crate::predicates::orientation(&st[2], &st[0], s);
            assert!(d1 > 0.0 && d2 > 0.0 && d3 > 0.0);
        }
        let single = Extent::of(&[p(1.0, 1.0)]).unwrap();
        assert!(super_triangle(&single).is_none());
    }

    #[test]
    fn test_square_with_center() {
        let sites = vec![
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(10.0, 10.0),
            p(0.0, 10.0),
            p(5.0, 5.0),
        ];
        let result = DelaunayBuilder::build(&sites);
        assert_eq!(result.triangles.len(), 4);
        for tri in &result.triangles {
            assert!(tri.contains_vertex(4));
        }
        assert_empty_circumcircles(&sites, &result.triangles);
    }

    #[test]
    fn test_random_sites_satisfy_empty_circumcircle() {
        for seed in 0..5 {
            let sites = random_sites(120, seed);
            let result = DelaunayBuilder::build(&sites);
            assert!(result.degeneracy.is_none());
            for tri in &result.triangles {
                assert!(tri.vertices().iter().all(|&v| v < sites.len()));
            }
            assert_empty_circumcircles(&sites, &result.triangles);
        }
    }

    #[test]
    fn test_triangle_count_matches_euler() {
        // For n sites with h on the hull, a triangulation has 2n - 2 - h triangles
        let sites = vec![
            p(0.0, 0.0),
            p(6.0, 0.0),
            p(6.0, 5.0),
            p(0.0, 5.0),
            p(2.0, 1.5),
            p(4.5, 3.1),
            p(1.2, 3.9),
        ];
        let result = DelaunayBuilder::build(&sites);
        assert_eq!(result.triangles.len(), 2 * 7 - 2 - 4);
    }

    #[test]
    fn test_insertion_order_does_not_change_result() {
        let sites = random_sites(40, 11);
        let mut reversed = sites.clone();
        reversed.reverse();
        let n = sites.len();

        let normalize = |tris: &[Triangle], remap: &dyn Fn(usize) -> usize| {
            let mut out: Vec<[usize; 3]> = tris
                .iter()
                .map(|t| {
                    let mut v = t.vertices().map(remap);
                    v.sort();
                    v
                })
                .collect();
            out.sort();
            out
        };

        let forward = DelaunayBuilder::build(&sites);
        let backward = DelaunayBuilder::build(&reversed);
        assert_eq!(
            normalize(&forward.triangles, &|i| i),
            normalize(&backward.triangles, &|i| n - 1 - i),
        );
    }
}
