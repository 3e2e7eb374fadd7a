//! Geometric predicates: circumcircles, containment, orientation and
//! the parabolic breakpoint used by the sweep.

use crate::Position;

/// Below this magnitude the circumcircle determinant is treated as zero.
pub const COLLINEAR_EPSILON: f64 = 1e-10;

/// Slack subtracted from the radius in [`CircumCircle::contains`].
pub const CONTAINMENT_EPSILON: f64 = 1e-10;

/// Sweep-coordinate tolerance for breakpoints and circle-event scheduling.
pub const SWEEP_EPSILON: f64 = 1e-9;

/// Circle through three points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircumCircle {
    pub center: Position,
    pub radius: f64,
}

impl CircumCircle {
    /// Strict containment with tolerance: points on the circle are outside.
    #[inline]
    pub fn contains(&self, p: &Position) -> bool {
        self.center.dist(p) < self.radius - CONTAINMENT_EPSILON
    }

    /// Lowest point of the circle, where a downward sweep leaves it.
    #[inline]
    pub fn lowest_y(&self) -> f64 {
        self.center.y - self.radius
    }
}

/// Twice the signed area of `abc`; positive when counter-clockwise.
#[inline]
pub fn orientation(a: &Position, b: &Position, c: &Position) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Circumcircle of `abc`, or `None` when the triangle is degenerate.
///
/// Solved relative to `a` so nearby points far from the origin keep their
/// precision.
pub fn circumcircle(a: &Position, b: &Position, c: &Position) -> Option<CircumCircle> {
    let (bx, by) = (b.x - a.x, b.y - a.y);
    let (cx, cy) = (c.x - a.x, c.y - a.y);
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() < COLLINEAR_EPSILON {
        return None;
    }

    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    let center = Position::new(a.x + ux, a.y + uy);

    Some(CircumCircle {
        center,
        radius: (ux * ux + uy * uy).sqrt(),
    })
}

/// X-coordinate where the beach-line arc of `left` meets the arc of `right`
/// (`left` lying to the left) with the sweep line at `sweep_y`.
///
/// Returns `None` when the two sites coincide, since no breakpoint exists.
pub fn breakpoint(left: &Position, right: &Position, sweep_y: f64) -> Option<f64> {
    if left == right {
        return None;
    }
    if (left.y - right.y).abs() < SWEEP_EPSILON {
        return Some((left.x + right.x) * 0.5);
    }

    // A site on the sweep line has collapsed to a vertical ray
    let d1 = 2.0 * (left.y - sweep_y);
    let d2 = 2.0 * (right.y - sweep_y);
    if d1.abs() < SWEEP_EPSILON {
        return Some(left.x);
    }
    if d2.abs() < SWEEP_EPSILON {
        return Some(right.x);
    }

    let a = 1.0 / d1 - 1.0 / d2;
    let b = 2.0 * (right.x / d2 - left.x / d1);
    let c = (left.x * left.x + left.y * left.y - sweep_y * sweep_y) / d1
        - (right.x * right.x + right.y * right.y - sweep_y * sweep_y) / d2;

    let disc = (b * b - 4.0 * a * c).max(0.0).sqrt();
    let q = -0.5 * (b + disc.copysign(b));
    if q == 0.0 {
        return Some(-b / (2.0 * a));
    }
    let (r1, r2) = (q / a, c / q);

    // left - right changes sign from negative to positive at the breakpoint
    Some(if a > 0.0 { r1.max(r2) } else { r1.min(r2) })
}
