//! TrueType `glyf` and `loca` tables

use crate::build::layout::FontLayout;
use crate::build::writer::ByteWriter;
use crate::core::errors::{to_i16, to_u16, FontError};
use kurbo::Rect;
use skrifa::raw::types::Tag;

pub const GLYF: Tag = Tag::new(b"glyf");
pub const LOCA: Tag = Tag::new(b"loca");

const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

/// Encoded outline tables plus the limits `maxp` needs
#[derive(Debug, Clone)]
pub struct GlyfTables {
    pub glyf: Vec<u8>,
    /// Long (32-bit) offsets, `indexToLocFormat` 1
    pub loca: Vec<u8>,
    pub max_points: u16,
    pub max_contours: u16,
}

impl GlyfTables {
    pub fn from_layout(layout: &FontLayout) -> Result<Self, FontError> {
        let mut glyf = ByteWriter::new();
        let mut loca = ByteWriter::with_capacity((layout.num_glyphs() + 1) * 4);
        let mut max_points = 0u16;
        let mut max_contours = 0u16;
        for gid in 0..layout.num_glyphs() {
            loca.u32(glyf.len() as u32);
            let squares = layout.outline(gid);
            if squares.is_empty() {
                continue;
            }
            let contours = to_u16("numberOfContours", squares.len() as i64)?;
            max_contours = max_contours.max(contours);
            max_points = max_points.max(to_u16("maxPoints", squares.len() as i64 * 4)?);
            encode_glyph(&mut glyf, &squares)?;
            glyf.pad4();
        }
        loca.u32(glyf.len() as u32);
        Ok(Self {
            glyf: glyf.into_inner(),
            loca: loca.into_inner(),
            max_points,
            max_contours,
        })
    }
}

/// Corner points of a square, clockwise with y up
fn clockwise(rect: &Rect) -> [(i32, i32); 4] {
    let (x0, y0) = (rect.x0.round() as i32, rect.y0.round() as i32);
    let (x1, y1) = (rect.x1.round() as i32, rect.y1.round() as i32);
    [(x0, y0), (x0, y1), (x1, y1), (x1, y0)]
}

fn encode_glyph(out: &mut ByteWriter, squares: &[Rect]) -> Result<(), FontError> {
    let points: Vec<(i32, i32)> = squares.iter().flat_map(clockwise).collect();
    let x_min = points.iter().map(|p| p.0).min().unwrap_or(0);
    let y_min = points.iter().map(|p| p.1).min().unwrap_or(0);
    let x_max = points.iter().map(|p| p.0).max().unwrap_or(0);
    let y_max = points.iter().map(|p| p.1).max().unwrap_or(0);

    out.i16(squares.len() as i16)
        .i16(to_i16("xMin", i64::from(x_min))?)
        .i16(to_i16("yMin", i64::from(y_min))?)
        .i16(to_i16("xMax", i64::from(x_max))?)
        .i16(to_i16("yMax", i64::from(y_max))?);
    for contour in 0..squares.len() {
        out.u16(to_u16("endPtsOfContours", contour as i64 * 4 + 3)?);
    }
    out.u16(0); // instructionLength

    let mut flags = Vec::with_capacity(points.len());
    let mut xs = ByteWriter::new();
    let mut ys = ByteWriter::new();
    let mut previous = (0i32, 0i32);
    for &(x, y) in &points {
        let mut flag = ON_CURVE;
        flag |= encode_delta(&mut xs, x - previous.0, X_SHORT, X_SAME_OR_POSITIVE)?;
        flag |= encode_delta(&mut ys, y - previous.1, Y_SHORT, Y_SAME_OR_POSITIVE)?;
        flags.push(flag);
        previous = (x, y);
    }
    out.bytes(&flags).bytes(xs.as_slice()).bytes(ys.as_slice());
    Ok(())
}

/// Write one coordinate delta, returning its flag bits
fn encode_delta(out: &mut ByteWriter, delta: i32, short: u8, same_or_positive: u8) -> Result<u8, FontError> {
    if delta == 0 {
        Ok(same_or_positive)
    } else if delta.unsigned_abs() <= 0xFF {
        out.u8(delta.unsigned_abs() as u8);
        Ok(if delta > 0 { short | same_or_positive } else { short })
    } else {
        out.i16(to_i16("glyph coordinate", i64::from(delta))?);
        Ok(0)
    }
}
