//! UFO export of a laid-out design
//!
//! The UFO carries the same pixel squares as the binary outputs, so it can be
//! opened in a font editor and compiled by other tools.

use crate::build::layout::FontLayout;
use crate::core::config::FamilyConfig;
use kurbo::Rect;
use norad::fontinfo::NonNegativeIntegerOrFloat;
use norad::{Contour, ContourPoint, Font, Glyph, PointType};

/// Build an in-memory UFO for a layout
pub fn ufo_font(layout: &FontLayout, family: &FamilyConfig) -> Font {
    let mut font = Font::new();
    font.font_info.family_name = Some(layout.family_name(&family.family_name));
    font.font_info.style_name = Some("Regular".to_string());
    font.font_info.postscript_font_name = Some(layout.postscript_name(&family.family_name));
    if !family.copyright.is_empty() {
        font.font_info.copyright = Some(family.copyright.clone());
    }
    font.font_info.units_per_em = NonNegativeIntegerOrFloat::new(f64::from(layout.units_per_em()));
    font.font_info.ascender = Some(f64::from(layout.ascender_units()));
    font.font_info.descender = Some(f64::from(layout.descender_units()));
    font.font_info.x_height = Some(f64::from(layout.units(layout.font_config.x_height)));
    font.font_info.cap_height = Some(f64::from(layout.units(layout.font_config.cap_height)));

    let layer = font.default_layer_mut();
    for (gid, layout_glyph) in layout.glyphs.iter().enumerate() {
        let mut glyph = Glyph::new(&layout_glyph.name);
        glyph.width = f64::from(layout.advance_units(gid));
        if let Some(ch) = layout_glyph.codepoint.and_then(char::from_u32) {
            glyph.codepoints.insert(ch);
        }
        glyph.contours = layout.outline(gid).iter().map(square_contour).collect();
        layer.insert_glyph(glyph);
    }
    font
}

/// Closed counter-clockwise contour of line points
fn square_contour(square: &Rect) -> Contour {
    let corners = [
        (square.x0, square.y0),
        (square.x1, square.y0),
        (square.x1, square.y1),
        (square.x0, square.y1),
    ];
    let points = corners
        .into_iter()
        .map(|(x, y)| ContourPoint::new(x, y, PointType::Line, false, None, None))
        .collect();
    Contour::new(points, None)
}
