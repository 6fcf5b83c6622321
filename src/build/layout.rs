//! Glyph layout on the pixel grid
//!
//! Layout fixes the glyph order, the advance width of every glyph under one
//! width mode and the vertical position of every bitmap. Every container
//! format is written from the same [`FontLayout`], so metrics agree across
//! formats by construction.

use crate::core::config::{FontConfig, WidthMode};
use crate::data::blocks::glyph_name;
use crate::data::GlyphBitmap;
use crate::design::DesignContext;
use kurbo::Rect;

pub const NOTDEF: &str = ".notdef";

/// One glyph placed on the grid
#[derive(Debug, Clone)]
pub struct LayoutGlyph {
    /// `None` for `.notdef`
    pub codepoint: Option<u32>,
    pub name: String,
    pub bitmap: GlyphBitmap,
    pub advance_px: u32,
    /// Pixel row 0 of the bitmap spans `top_px - 1 .. top_px` above the baseline
    pub top_px: i32,
}

impl LayoutGlyph {
    /// Pixel bounds `(x_min, y_min, x_max, y_max)` of opaque pixels, y up
    pub fn pixel_bounds(&self) -> Option<(i32, i32, i32, i32)> {
        let mut bounds: Option<(i32, i32, i32, i32)> = None;
        for (x, row) in self.bitmap.opaque_pixels() {
            let (x0, x1) = (x as i32, x as i32 + 1);
            let (y0, y1) = (self.top_px - row as i32 - 1, self.top_px - row as i32);
            bounds = Some(match bounds {
                None => (x0, y0, x1, y1),
                Some((a, b, c, d)) => (a.min(x0), b.min(y0), c.max(x1), d.max(y1)),
            });
        }
        bounds
    }

    /// Bottom edge of the bitmap box in pixels, y up
    pub fn bottom_px(&self) -> i32 {
        self.top_px - self.bitmap.height() as i32
    }
}

/// A design laid out for one width mode
#[derive(Debug, Clone)]
pub struct FontLayout {
    pub font_config: FontConfig,
    pub width_mode: WidthMode,
    pub px_units: u32,
    /// Indexed by glyph id; `.notdef` is glyph 0, then codepoints ascending
    pub glyphs: Vec<LayoutGlyph>,
}

impl FontLayout {
    pub fn new(design: &DesignContext, width_mode: WidthMode, px_units: u32) -> Self {
        let font_config = design.font_config().clone();
        let mut glyphs = Vec::with_capacity(design.len() + 1);
        glyphs.push(LayoutGlyph {
            codepoint: None,
            name: NOTDEF.to_string(),
            bitmap: GlyphBitmap::new(font_config.size, font_config.line_height() as u32),
            advance_px: font_config.size,
            top_px: font_config.ascent,
        });
        for (codepoint, glyph) in design.glyphs() {
            glyphs.push(LayoutGlyph {
                codepoint: Some(codepoint),
                name: glyph_name(codepoint),
                advance_px: advance_width(width_mode, glyph.advance_width, font_config.size),
                top_px: bitmap_top(&font_config, glyph.bitmap.height()),
                bitmap: glyph.bitmap.clone(),
            });
        }
        Self {
            font_config,
            width_mode,
            px_units,
            glyphs,
        }
    }

    pub fn num_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    pub fn units_per_em(&self) -> u32 {
        self.font_config.units_per_em(self.px_units)
    }

    /// Pixels to font units
    pub fn units(&self, px: i32) -> i32 {
        px * self.px_units as i32
    }

    pub fn advance_units(&self, glyph_id: usize) -> i32 {
        self.units(self.glyphs[glyph_id].advance_px as i32)
    }

    /// One unit square per opaque pixel, in font units, y up
    pub fn outline(&self, glyph_id: usize) -> Vec<Rect> {
        let glyph = &self.glyphs[glyph_id];
        let px = f64::from(self.px_units);
        glyph
            .bitmap
            .opaque_pixels()
            .map(|(x, row)| {
                let x0 = f64::from(x) * px;
                let y1 = f64::from(glyph.top_px - row as i32) * px;
                Rect::new(x0, y1 - px, x0 + px, y1)
            })
            .collect()
    }

    /// Outline bounds in font units
    pub fn bounds_units(&self, glyph_id: usize) -> Option<(i32, i32, i32, i32)> {
        self.glyphs[glyph_id]
            .pixel_bounds()
            .map(|(x0, y0, x1, y1)| (self.units(x0), self.units(y0), self.units(x1), self.units(y1)))
    }

    /// Union of every glyph's bounds in font units, zeros for an empty font
    pub fn font_bounds_units(&self) -> (i32, i32, i32, i32) {
        (0..self.glyphs.len())
            .filter_map(|gid| self.bounds_units(gid))
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
            .unwrap_or((0, 0, 0, 0))
    }

    /// `(codepoint, glyph id)` pairs, ascending by codepoint
    pub fn cmap(&self) -> Vec<(u32, u16)> {
        self.glyphs
            .iter()
            .enumerate()
            .filter_map(|(gid, glyph)| glyph.codepoint.map(|cp| (cp, gid as u16)))
            .collect()
    }

    pub fn max_advance_units(&self) -> i32 {
        (0..self.glyphs.len())
            .map(|gid| self.advance_units(gid))
            .max()
            .unwrap_or(0)
    }

    /// Mean advance of glyphs with a non-zero advance, rounded
    pub fn average_advance_units(&self) -> i32 {
        let advances: Vec<i64> = (0..self.glyphs.len())
            .map(|gid| i64::from(self.advance_units(gid)))
            .filter(|&a| a > 0)
            .collect();
        if advances.is_empty() {
            return 0;
        }
        let total: i64 = advances.iter().sum();
        ((total as f64) / (advances.len() as f64)).round() as i32
    }

    pub fn ascender_units(&self) -> i32 {
        self.units(self.font_config.ascent)
    }

    pub fn descender_units(&self) -> i32 {
        self.units(self.font_config.descent)
    }

    /// Family name including the size and width mode
    pub fn family_name(&self, base: &str) -> String {
        format!(
            "{} {}px {}",
            base,
            self.font_config.size,
            self.width_mode.display_name()
        )
    }

    /// PostScript name: no spaces, ASCII only
    pub fn postscript_name(&self, base: &str) -> String {
        let name: String = self
            .family_name(base)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        format!("{name}-Regular")
    }
}

/// Advance width in pixels under a width mode
///
/// Monospaced glyphs occupy whole cells of `size` pixels; only glyphs wider
/// than one cell (Private Use Area) take more than one.
pub fn advance_width(width_mode: WidthMode, natural_width: u32, size: u32) -> u32 {
    match width_mode {
        WidthMode::Proportional => natural_width,
        WidthMode::Monospaced => natural_width.div_ceil(size).max(1) * size,
    }
}

/// Height of the bitmap's top edge above the baseline, in pixels
///
/// Bitmaps are vertically centered on the line box; bitmaps taller than the
/// line overflow equally above and below.
pub fn bitmap_top(font_config: &FontConfig, height: u32) -> i32 {
    let extra = height as i32 - font_config.line_height();
    font_config.ascent + extra.div_euclid(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryGlyphStore;

    fn config() -> FontConfig {
        FontConfig::new(12, 10, -2, 5, 7)
    }

    fn design(widths: &[(u32, usize)]) -> DesignContext {
        let mut store = MemoryGlyphStore::new("test");
        for &(codepoint, width) in widths {
            store = store.with(12, codepoint, GlyphBitmap::from_rows(&vec![vec![1; width]; 12]));
        }
        DesignContext::load(&config(), &store).unwrap()
    }

    #[test]
    fn test_width_mode_example() {
        let design = design(&[(0x41, 4), (0x42, 6), (0x43, 8)]);

        let mono = FontLayout::new(&design, WidthMode::Monospaced, 100);
        let mono_advances: Vec<u32> = mono.glyphs[1..].iter().map(|g| g.advance_px).collect();
        assert_eq!(mono_advances, vec![12, 12, 12]);

        let proportional = FontLayout::new(&design, WidthMode::Proportional, 100);
        let advances: Vec<u32> = proportional.glyphs[1..].iter().map(|g| g.advance_px).collect();
        assert_eq!(advances, vec![4, 6, 8]);
    }

    #[test]
    fn test_wide_private_use_glyph_takes_two_cells() {
        assert_eq!(advance_width(WidthMode::Monospaced, 20, 12), 24);
        assert_eq!(advance_width(WidthMode::Monospaced, 1, 12), 12);
        assert_eq!(advance_width(WidthMode::Proportional, 20, 12), 20);
    }

    #[test]
    fn test_glyph_order_and_cmap() {
        let layout = FontLayout::new(&design(&[(0x4E00, 12), (0x41, 4)]), WidthMode::Proportional, 100);
        assert_eq!(layout.glyphs[0].name, NOTDEF);
        assert_eq!(layout.cmap(), vec![(0x41, 1), (0x4E00, 2)]);
        assert_eq!(layout.glyphs[2].name, "uni4E00");
    }

    #[test]
    fn test_vertical_centering() {
        let config = config();
        assert_eq!(bitmap_top(&config, 12), 10);
        assert_eq!(bitmap_top(&config, 14), 11);
        assert_eq!(bitmap_top(&config, 10), 9);
    }

    #[test]
    fn test_outline_is_one_square_per_pixel() {
        let mut store = MemoryGlyphStore::new("test");
        let mut rows = vec![vec![0u8; 2]; 12];
        rows[0][1] = 1;
        rows[11][0] = 1;
        store = store.with(12, 0x41, GlyphBitmap::from_rows(&rows));
        let design = DesignContext::load(&config(), &store).unwrap();
        let layout = FontLayout::new(&design, WidthMode::Proportional, 100);

        let outline = layout.outline(1);
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0], Rect::new(100.0, 900.0, 200.0, 1000.0));
        assert_eq!(outline[1], Rect::new(0.0, -200.0, 100.0, -100.0));
        assert_eq!(layout.bounds_units(1), Some((0, -200, 200, 1000)));
        assert_eq!(layout.bounds_units(0), None);
    }

    #[test]
    fn test_names() {
        let layout = FontLayout::new(&design(&[(0x41, 4)]), WidthMode::Monospaced, 100);
        assert_eq!(layout.family_name("Fusion Pixel"), "Fusion Pixel 12px Mono");
        assert_eq!(layout.postscript_name("Fusion Pixel"), "FusionPixel12pxMono-Regular");
    }
}
