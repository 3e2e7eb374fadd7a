//! Site and position types for Voronoi construction.

use std::collections::HashMap;

/// Sites closer than this, relative to the larger of the sites' span and 1,
/// are treated as one site
pub const DUPLICATE_EPSILON: f64 = 1e-9;

/// 2D position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another position
    pub fn dist_sq(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another position
    pub fn dist(&self, other: &Position) -> f64 {
        self.dist_sq(other).sqrt()
    }

    /// Midpoint between two positions
    pub fn midpoint(&self, other: &Position) -> Position {
        Position::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Offset by `dir` scaled by `t`
    pub fn offset(&self, dir: Direction, t: f64) -> Position {
        Position::new(self.x + dir.x * t, self.y + dir.y * t)
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Unit direction vector (magnitude 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    pub x: f64,
    pub y: f64,
}

impl Direction {
    /// Normalize `(x, y)`; `None` for a zero-length vector.
    pub fn new(x: f64, y: f64) -> Option<Self> {
        let len = (x * x + y * y).sqrt();
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        Some(Self { x: x / len, y: y / len })
    }

    pub fn reversed(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }

    pub fn dot(&self, x: f64, y: f64) -> f64 {
        self.x * x + self.y * y
    }
}

/// Axis-aligned extent of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: Position,
    pub max: Position,
}

impl Extent {
    /// Tight extent of `points`, `None` when empty.
    pub fn of(points: &[Position]) -> Option<Self> {
        let first = *points.first()?;
        let mut extent = Extent { min: first, max: first };
        for p in &points[1..] {
            extent.min.x = extent.min.x.min(p.x);
            extent.min.y = extent.min.y.min(p.y);
            extent.max.x = extent.max.x.max(p.x);
            extent.max.y = extent.max.y.max(p.y);
        }
        Some(extent)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Larger of width and height
    pub fn span(&self) -> f64 {
        self.width().max(self.height())
    }
}

/// Split site indices into first occurrences and duplicates.
///
/// A site within [`DUPLICATE_EPSILON`] (scaled by the sites' span) of an
/// earlier kept site is a duplicate. Returns `(distinct, duplicates)`, both
/// in input order.
pub fn partition_duplicates(sites: &[Position]) -> (Vec<usize>, Vec<usize>) {
    let scale = Extent::of(sites).map_or(1.0, |e| e.span().max(1.0));
    let tol = DUPLICATE_EPSILON * scale;
    let tol_sq = tol * tol;
    let bucket = |p: &Position| ((p.x / tol).floor() as i64, (p.y / tol).floor() as i64);

    // Kept sites hashed into cells of side `tol`; a match lies in the 3x3 block
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::with_capacity(sites.len());
    let mut distinct = Vec::with_capacity(sites.len());
    let mut duplicates = Vec::new();
    for (i, site) in sites.iter().enumerate() {
        let (bx, by) = bucket(site);
        let near = (bx.saturating_sub(1)..=bx.saturating_add(1))
            .flat_map(|x| (by.saturating_sub(1)..=by.saturating_add(1)).map(move |y| (x, y)))
            .filter_map(|cell| grid.get(&cell))
            .flatten()
            .any(|&j| sites[j].dist_sq(site) <= tol_sq);
        if near {
            duplicates.push(i);
        } else {
            grid.entry((bx, by)).or_default().push(i);
            distinct.push(i);
        }
    }
    if !duplicates.is_empty() {
        log::warn!("{} duplicate site(s) ignored: {:?}", duplicates.len(), duplicates);
    }
    (distinct, duplicates)
}

/// An ordered collection of sites
#[derive(Debug, Clone, Default)]
pub struct SiteCollection {
    pub sites: Vec<Position>,
}

impl SiteCollection {
    pub fn new(sites: Vec<Position>) -> Self {
        Self { sites }
    }

    /// Create `count` sites uniformly inside `[min, max)` from a seeded RNG
    #[cfg(feature = "random")]
    pub fn random(count: usize, min: Position, max: Position, seed: u64) -> Self {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sites = (0..count)
            .map(|_| {
                Position::new(
                    min.x + rng.gen::<f64>() * (max.x - min.x),
                    min.y + rng.gen::<f64>() * (max.y - min.y),
                )
            })
            .collect();
        Self::new(sites)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Get positions as a slice (for Voronoi construction)
    pub fn positions(&self) -> &[Position] {
        &self.sites
    }
}

impl FromIterator<Position> for SiteCollection {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_duplicates_keeps_first_occurrence() {
        let sites = vec![
            Position::new(1.0, 2.0),
            Position::new(3.0, 4.0),
            Position::new(1.0, 2.0),
            Position::new(-0.0, 0.0),
            Position::new(0.0, 0.0),
        ];
        let (distinct, duplicates) = partition_duplicates(&sites);
        assert_eq!(distinct, vec![0, 1, 3]);
        assert_eq!(duplicates, vec![2, 4]);
    }

    #[test]
    fn test_near_duplicates_merge_with_earlier_site() {
        let sites = vec![
            Position::new(0.0, 0.0),
            Position::new(1e-12, 0.0),
            Position::new(5.0, 0.0),
            Position::new(2.0, 4.0),
            Position::new(2.0, 4.0 - 3e-9),
        ];
        let (distinct, duplicates) = partition_duplicates(&sites);
        assert_eq!(distinct, vec![0, 2, 3]);
        assert_eq!(duplicates, vec![1, 4]);
    }

    #[test]
    fn test_separation_above_tolerance_is_kept() {
        // Span 5 gives a tolerance of 5e-9
        let sites = vec![
            Position::new(0.0, 0.0),
            Position::new(1e-8, 0.0),
            Position::new(5.0, 5.0),
        ];
        let (distinct, duplicates) = partition_duplicates(&sites);
        assert_eq!(distinct, vec![0, 1, 2]);
        assert!(duplicates.is_empty());
    }

    #[test]
    fn test_duplicates_far_from_origin() {
        let o = 1e6;
        let sites = vec![
            Position::new(o, o),
            Position::new(o + 2.0, o + 1.0),
            Position::new(o + 1e-10, o),
        ];
        assert_eq!(partition_duplicates(&sites).1, vec![2]);
    }

    #[test]
    fn test_extent() {
        let extent = Extent::of(&[
            Position::new(2.0, -1.0),
            Position::new(-3.0, 4.0),
            Position::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(extent.min, Position::new(-3.0, -1.0));
        assert_eq!(extent.max, Position::new(2.0, 4.0));
        assert_eq!(extent.span(), 5.0);
        assert!(Extent::of(&[]).is_none());
    }

    #[test]
    fn test_zero_direction_is_rejected() {
        assert!(Direction::new(0.0, 0.0).is_none());
        let d = Direction::new(3.0, 4.0).unwrap();
        assert!((d.x - 0.6).abs() < 1e-12 && (d.y - 0.8).abs() < 1e-12);
    }

    #[cfg(feature = "random")]
    #[test]
    fn test_random_is_reproducible_and_in_range() {
        let min = Position::new(-5.0, 10.0);
        let max = Position::new(5.0, 20.0);
        let a = SiteCollection::random(200, min, max, 7);
        let b = SiteCollection::random(200, min, max, 7);
        let c = SiteCollection::random(200, min, max, 8);
        assert_eq!(a.sites, b.sites);
        assert_ne!(a.sites, c.sites);
        for p in a.positions() {
            assert!(p.x >= min.x && p.x < max.x);
            assert!(p.y >= min.y && p.y < max.y);
        }
    }
}
