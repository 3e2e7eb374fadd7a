//! Axis-aligned viewport and Cohen-Sutherland segment clipping.

use crate::site::Extent;
use crate::{Position, Result, VoronoiError};

/// Region bits of a point relative to the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outcode(u8);

impl Outcode {
    const INSIDE: u8 = 0;
    const LEFT: u8 = 1;
    const RIGHT: u8 = 2;
    const BOTTOM: u8 = 4;
    const TOP: u8 = 8;

    fn is_inside(self) -> bool {
        self.0 == Self::INSIDE
    }

    fn has(self, bit: u8) -> bool {
        self.0 & bit != 0
    }
}

/// Each pass moves one endpoint onto a boundary, clearing at least one bit.
/// Rounding can in rare cases flip a bit back, so the loop is capped.
const MAX_CLIP_PASSES: usize = 8;

/// Viewport rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Explicit rectangle; rejects non-finite or inverted/empty extents.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());
        if !finite || min_x >= max_x || min_y >= max_y {
            return Err(VoronoiError::InvalidBounds {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Sites' extent grown by `margin` on every side.
    pub fn around(sites: &[Position], margin: f64) -> Result<Self> {
        if !margin.is_finite() || margin < 0.0 {
            return Err(VoronoiError::InvalidMargin(margin));
        }
        let extent = Extent::of(sites).ok_or(VoronoiError::NoSites)?;
        Ok(Self {
            min_x: extent.min.x - margin,
            max_x: extent.max.x + margin,
            min_y: extent.min.y - margin,
            max_y: extent.max.y + margin,
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// Closed containment
    pub fn contains(&self, p: &Position) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Corners counter-clockwise from `(min_x, min_y)`
    pub fn corners(&self) -> [Position; 4] {
        [
            Position::new(self.min_x, self.min_y),
            Position::new(self.max_x, self.min_y),
            Position::new(self.max_x, self.max_y),
            Position::new(self.min_x, self.max_y),
        ]
    }

    fn outcode(&self, p: &Position) -> Outcode {
        let mut code = Outcode::INSIDE;
        if p.x < self.min_x {
            code |= Outcode::LEFT;
        } else if p.x > self.max_x {
            code |= Outcode::RIGHT;
        }
        if p.y < self.min_y {
            code |= Outcode::BOTTOM;
        } else if p.y > self.max_y {
            code |= Outcode::TOP;
        }
        Outcode(code)
    }

    /// Portion of segment `ab` inside the box, `None` when nothing remains.
    pub fn clip(&self, a: Position, b: Position) -> Option<(Position, Position)> {
        let (mut a, mut b) = (a, b);
        let (mut code_a, mut code_b) = (self.outcode(&a), self.outcode(&b));

        for _ in 0..MAX_CLIP_PASSES {
            if code_a.is_inside() && code_b.is_inside() {
                return Some((a, b));
            }
            if code_a.0 & code_b.0 != 0 {
                return None;
            }

            let move_a = !code_a.is_inside();
            let out = if move_a { code_a } else { code_b };
            let (dx, dy) = (b.x - a.x, b.y - a.y);

            let p = if out.has(Outcode::TOP) {
                if dy == 0.0 {
                    return None;
                }
                Position::new(a.x + dx * (self.max_y - a.y) / dy, self.max_y)
            } else if out.has(Outcode::BOTTOM) {
                if dy == 0.0 {
                    return None;
                }
                Position::new(a.x + dx * (self.min_y - a.y) / dy, self.min_y)
            } else if out.has(Outcode::RIGHT) {
                if dx == 0.0 {
                    return None;
                }
                Position::new(self.max_x, a.y + dy * (self.max_x - a.x) / dx)
            } else {
                if dx == 0.0 {
                    return None;
                }
                Position::new(self.min_x, a.y + dy * (self.min_x - a.x) / dx)
            };

            if move_a {
                a = p;
                code_a = self.outcode(&a);
            } else {
                b = p;
                code_b = self.outcode(&b);
            }
        }
        None
    }
}
