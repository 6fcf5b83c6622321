//! Glyph outline rasterization onto a binary pixel canvas

use crate::data::GlyphBitmap;
use kurbo::{Affine, BezPath, Point, Rect, Shape};
use skrifa::outline::OutlinePen;

/// Collects a skrifa outline as a kurbo path, font units, y up
#[derive(Debug, Default)]
pub struct BezPathPen {
    pub path: BezPath,
}

impl OutlinePen for BezPathPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to((f64::from(x), f64::from(y)));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to((f64::from(x), f64::from(y)));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.path
            .quad_to((f64::from(cx0), f64::from(cy0)), (f64::from(x), f64::from(y)));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.path.curve_to(
            (f64::from(cx0), f64::from(cy0)),
            (f64::from(cx1), f64::from(cy1)),
            (f64::from(x), f64::from(y)),
        );
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}

/// Placement of font-unit outlines on a canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Pixels per font unit
    pub scale: f64,
    /// Canvas x of the glyph origin
    pub origin_x: f64,
    /// Canvas y of the baseline, counted down from the top edge
    pub baseline_y: f64,
}

impl Placement {
    /// Font units (y up) to canvas pixels (y down)
    pub fn transform(&self) -> Affine {
        Affine::new([self.scale, 0.0, 0.0, -self.scale, self.origin_x, self.baseline_y])
    }
}

/// Fill a path onto a `width` x `height` canvas
///
/// A pixel is opaque when its center has a non-zero winding number.
pub fn rasterize(path: &BezPath, placement: &Placement, width: u32, height: u32) -> GlyphBitmap {
    let mut bitmap = GlyphBitmap::new(width, height);
    if path.elements().is_empty() {
        return bitmap;
    }
    let path = placement.transform() * path.clone();
    let bounds = path.bounding_box();
    let canvas = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
    let area = bounds.intersect(canvas);
    if area.is_zero_area() {
        return bitmap;
    }
    let x_start = area.x0.floor().max(0.0) as u32;
    let y_start = area.y0.floor().max(0.0) as u32;
    let x_end = (area.x1.ceil() as u32).min(width);
    let y_end = (area.y1.ceil() as u32).min(height);
    for y in y_start..y_end {
        for x in x_start..x_end {
            let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if path.winding(center) != 0 {
                bitmap.set(x, y, true);
            }
        }
    }
    bitmap
}
