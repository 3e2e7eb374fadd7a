//! SVG and PNG export of a clipped diagram.

use std::path::Path;

use anyhow::Context;
use svg::node::element::{Circle, Line, Polygon, Rectangle};
use svg::Document;

use voronoi_core::{BoundingBox, Diagram, Position, VoronoiCell};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// Blank border around the drawing, in pixels
const BORDER: f64 = 20.0;

/// Matplotlib's Tableau palette
const PALETTE: [[u8; 3]; 10] = [
    [0x1f, 0x77, 0xb4],
    [0xff, 0x7f, 0x0e],
    [0x2c, 0xa0, 0x2c],
    [0xd6, 0x27, 0x28],
    [0x94, 0x67, 0xbd],
    [0x8c, 0x56, 0x4b],
    [0xe3, 0x77, 0xc2],
    [0x7f, 0x7f, 0x7f],
    [0xbc, 0xbd, 0x22],
    [0x17, 0xbe, 0xcf],
];

const CELL_OPACITY: f64 = 0.4;
const EDGE_COLOR: [u8; 3] = [0xff, 0x00, 0x00];
const SITE_RADIUS: f64 = 6.0;

fn hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

fn cell_color(cell: &VoronoiCell) -> [u8; 3] {
    PALETTE[cell.site % PALETTE.len()]
}

/// Maps diagram coordinates onto a pixel grid, y pointing down
#[derive(Debug, Clone, Copy)]
pub struct Canvas {
    bounds: BoundingBox,
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(bounds: BoundingBox, width: u32, height: u32) -> Self {
        Self {
            bounds,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Full image size, border included
    pub fn image_size(&self) -> (u32, u32) {
        let border = 2 * BORDER as u32;
        (self.width + border, self.height + border)
    }

    pub fn to_pixel(&self, p: &Position) -> (f64, f64) {
        let b = &self.bounds;
        let w = b.width().max(f64::EPSILON);
        let h = b.height().max(f64::EPSILON);
        let px = (p.x - b.min_x) / w * self.width as f64 + BORDER;
        let py = (1.0 - (p.y - b.min_y) / h) * self.height as f64 + BORDER;
        (px, py)
    }
}

pub fn write_svg(
    diagram: &Diagram,
    canvas: &Canvas,
    show_sites: bool,
    path: &Path,
) -> anyhow::Result<()> {
    let document = render_svg(diagram, canvas, show_sites);
    svg::save(path, &document).with_context(|| format!("failed to write SVG: {:?}", path))
}

pub fn render_svg(diagram: &Diagram, canvas: &Canvas, show_sites: bool) -> Document {
    let (w, h) = canvas.image_size();
    let mut document = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", format!("0 0 {} {}", w, h))
        .add(
            Rectangle::new()
                .set("width", w)
                .set("height", h)
                .set("fill", "white"),
        );

    for cell in diagram.renderable_cells() {
        let points = cell
            .vertices
            .iter()
            .map(|v| {
                let (x, y) = canvas.to_pixel(v);
                format!("{:.2},{:.2}", x, y)
            })
            .collect::<Vec<_>>()
            .join(" ");
        document = document.add(
            Polygon::new()
                .set("points", points)
                .set("fill", hex(cell_color(cell)))
                .set("fill-opacity", CELL_OPACITY)
                .set("stroke", "none"),
        );
    }

    for edge in &diagram.edges {
        let (x1, y1) = canvas.to_pixel(&edge.a);
        let (x2, y2) = canvas.to_pixel(&edge.b);
        document = document.add(
            Line::new()
                .set("x1", x1)
                .set("y1", y1)
                .set("x2", x2)
                .set("y2", y2)
                .set("stroke", hex(EDGE_COLOR))
                .set("stroke-width", 1.5),
        );
    }

    if show_sites {
        for (i, site) in diagram.sites.iter().enumerate() {
            let (cx, cy) = canvas.to_pixel(site);
            document = document.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", SITE_RADIUS)
                    .set("fill", hex(PALETTE[i % PALETTE.len()]))
                    .set("stroke", "black")
                    .set("stroke-width", 1.2),
            );
        }
    }
    document
}

pub fn write_png(
    diagram: &Diagram,
    canvas: &Canvas,
    show_sites: bool,
    path: &Path,
) -> anyhow::Result<()> {
    let image = render_png(diagram, canvas, show_sites);
    image
        .save(path)
        .with_context(|| format!("failed to write PNG: {:?}", path))
}

/// Rasterize cells, then edges, then optional site dots.
pub fn render_png(diagram: &Diagram, canvas: &Canvas, show_sites: bool) -> image::RgbImage {
    let (w, h) = canvas.image_size();
    let mut image = image::RgbImage::from_pixel(w, h, image::Rgb([255, 255, 255]));

    for cell in diagram.renderable_cells() {
        let polygon: Vec<(f64, f64)> = cell.vertices.iter().map(|v| canvas.to_pixel(v)).collect();
        fill_convex(&mut image, &polygon, blend_white(cell_color(cell), CELL_OPACITY));
    }
    for edge in &diagram.edges {
        draw_line(&mut image, canvas.to_pixel(&edge.a), canvas.to_pixel(&edge.b), EDGE_COLOR);
    }
    if show_sites {
        let pixels: Vec<(f64, f64)> = diagram.sites.iter().map(|s| canvas.to_pixel(s)).collect();
        draw_sites(&mut image, &pixels);
    }
    image
}

fn blend_white(rgb: [u8; 3], alpha: f64) -> image::Rgb<u8> {
    let mix = |c: u8| (c as f64 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
    image::Rgb([mix(rgb[0]), mix(rgb[1]), mix(rgb[2])])
}

/// Scanline fill of a convex polygon, sampling pixel centers
fn fill_convex(image: &mut image::RgbImage, polygon: &[(f64, f64)], color: image::Rgb<u8>) {
    if polygon.len() < 3 {
        return;
    }
    let (w, h) = (image.width() as i64, image.height() as i64);
    let min_y = polygon.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = polygon.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let row_start = (min_y - 0.5).ceil().max(0.0) as i64;
    let row_end = ((max_y - 0.5).floor() as i64).min(h - 1);

    for row in row_start..=row_end {
        let y = row as f64 + 0.5;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for i in 0..polygon.len() {
            let (a, b) = (polygon[i], polygon[(i + 1) % polygon.len()]);
            if (a.1 <= y && y <= b.1) || (b.1 <= y && y <= a.1) {
                let x = if a.1 == b.1 {
                    lo = lo.min(a.0.min(b.0));
                    a.0.max(b.0)
                } else {
                    a.0 + (y - a.1) * (b.0 - a.0) / (b.1 - a.1)
                };
                lo = lo.min(x);
                hi = hi.max(x);
            }
        }
        if lo > hi {
            continue;
        }
        let col_start = (lo - 0.5).ceil().max(0.0) as i64;
        let col_end = ((hi - 0.5).floor() as i64).min(w - 1);
        for col in col_start..=col_end {
            image.put_pixel(col as u32, row as u32, color);
        }
    }
}

fn draw_line(image: &mut image::RgbImage, a: (f64, f64), b: (f64, f64), rgb: [u8; 3]) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil().max(1.0) as i64;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let px = (a.0 + (b.0 - a.0) * t) as i64;
        let py = (a.1 + (b.1 - a.1) * t) as i64;
        if px >= 0 && px < w && py >= 0 && py < h {
            image.put_pixel(px as u32, py as u32, image::Rgb(rgb));
        }
    }
}

/// Draw 3x3 black dots at each site position
fn draw_sites(image: &mut image::RgbImage, sites: &[(f64, f64)]) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    for &(x, y) in sites {
        let cx = x as i32;
        let cy = y as i32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let px = cx + dx;
                let py = cy + dy;
                if px >= 0 && px < w && py >= 0 && py < h {
                    image.put_pixel(px as u32, py as u32, image::Rgb([0, 0, 0]));
                }
            }
        }
    }
}
