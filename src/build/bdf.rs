//! BDF 2.1 bitmap strikes

use crate::build::layout::{FontLayout, LayoutGlyph};
use crate::core::config::{FamilyConfig, WidthMode};
use std::fmt::{self, Write};

const RESOLUTION: u32 = 75;
const WEIGHT_NAME: &str = "Medium";
const SLANT: &str = "R";
const SETWIDTH_NAME: &str = "Normal";
const CHARSET_REGISTRY: &str = "ISO10646";
const CHARSET_ENCODING: &str = "1";

/// BDF property value
enum Property {
    Int(i64),
    Str(String),
}

/// Render the layout as a BDF document at its design size
///
/// `.notdef` has no encoding and is left out; every other glyph keeps the
/// advance width of the outline formats, in pixels.
pub fn bdf(layout: &FontLayout, family: &FamilyConfig) -> Result<String, fmt::Error> {
    let config = &layout.font_config;
    let glyphs: Vec<&LayoutGlyph> = layout.glyphs.iter().filter(|g| g.codepoint.is_some()).collect();
    let family_name = layout.family_name(&family.family_name);
    let spacing = match layout.width_mode {
        WidthMode::Monospaced => "C",
        WidthMode::Proportional => "P",
    };
    let average_width = average_width_tenths(&glyphs);
    let (bbx_w, bbx_h, bbx_x, bbx_y) = font_bounding_box(&glyphs, layout);

    let foundry = xlfd_field(&family.vendor_id);
    let xlfd = format!(
        "-{}-{}-{}-{}-{}--{}-{}-{}-{}-{}-{}-{}-{}",
        foundry,
        xlfd_field(&family_name),
        WEIGHT_NAME,
        SLANT,
        SETWIDTH_NAME,
        config.size,
        config.size * 10,
        RESOLUTION,
        RESOLUTION,
        spacing,
        average_width,
        CHARSET_REGISTRY,
        CHARSET_ENCODING
    );

    let mut properties = vec![
        ("FOUNDRY", Property::Str(foundry)),
        ("FAMILY_NAME", Property::Str(family_name.clone())),
        ("WEIGHT_NAME", Property::Str(WEIGHT_NAME.to_string())),
        ("SLANT", Property::Str(SLANT.to_string())),
        ("SETWIDTH_NAME", Property::Str(SETWIDTH_NAME.to_string())),
        ("PIXEL_SIZE", Property::Int(i64::from(config.size))),
        ("POINT_SIZE", Property::Int(i64::from(config.size) * 10)),
        ("RESOLUTION_X", Property::Int(i64::from(RESOLUTION))),
        ("RESOLUTION_Y", Property::Int(i64::from(RESOLUTION))),
        ("SPACING", Property::Str(spacing.to_string())),
        ("AVERAGE_WIDTH", Property::Int(average_width)),
        ("CHARSET_REGISTRY", Property::Str(CHARSET_REGISTRY.to_string())),
        ("CHARSET_ENCODING", Property::Str(CHARSET_ENCODING.to_string())),
        ("FONT_ASCENT", Property::Int(i64::from(config.ascent))),
        ("FONT_DESCENT", Property::Int(-i64::from(config.descent))),
        ("X_HEIGHT", Property::Int(i64::from(config.x_height))),
        ("CAP_HEIGHT", Property::Int(i64::from(config.cap_height))),
        ("FONT_VERSION", Property::Str(family.version.clone())),
        ("COPYRIGHT", Property::Str(family.copyright.clone())),
    ];
    if let Some(default_char) = default_char(&glyphs) {
        properties.push(("DEFAULT_CHAR", Property::Int(i64::from(default_char))));
    }

    let mut out = String::new();
    writeln!(out, "STARTFONT 2.1")?;
    writeln!(out, "FONT {xlfd}")?;
    writeln!(out, "SIZE {} {} {}", config.size, RESOLUTION, RESOLUTION)?;
    writeln!(out, "FONTBOUNDINGBOX {bbx_w} {bbx_h} {bbx_x} {bbx_y}")?;
    writeln!(out, "STARTPROPERTIES {}", properties.len())?;
    for (name, value) in &properties {
        match value {
            Property::Int(v) => writeln!(out, "{name} {v}")?,
            Property::Str(s) => writeln!(out, "{name} \"{}\"", s.replace('"', "\"\""))?,
        }
    }
    writeln!(out, "ENDPROPERTIES")?;
    writeln!(out, "CHARS {}", glyphs.len())?;
    for glyph in &glyphs {
        write_glyph(&mut out, glyph, config.size)?;
    }
    writeln!(out, "ENDFONT")?;
    Ok(out)
}

fn write_glyph(out: &mut String, glyph: &LayoutGlyph, size: u32) -> fmt::Result {
    let codepoint = glyph.codepoint.unwrap_or(0);
    let swidth = (f64::from(glyph.advance_px) * 1000.0 / f64::from(size)).round() as i64;
    let (width, height) = (glyph.bitmap.width(), glyph.bitmap.height());
    writeln!(out, "STARTCHAR {}", glyph.name)?;
    writeln!(out, "ENCODING {codepoint}")?;
    writeln!(out, "SWIDTH {swidth} 0")?;
    writeln!(out, "DWIDTH {} 0", glyph.advance_px)?;
    writeln!(out, "BBX {} {} 0 {}", width, height, glyph.bottom_px())?;
    writeln!(out, "BITMAP")?;
    for row in glyph.bitmap.rows() {
        writeln!(out, "{}", hex_row(row))?;
    }
    writeln!(out, "ENDCHAR")
}

/// One bitmap row, MSB first, padded to whole bytes
fn hex_row(row: &[bool]) -> String {
    let mut hex = String::with_capacity(row.len().div_ceil(8) * 2);
    for chunk in row.chunks(8) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |byte, (i, &on)| if on { byte | (0x80 >> i) } else { byte });
        hex.push_str(&format!("{byte:02X}"));
    }
    hex
}

fn average_width_tenths(glyphs: &[&LayoutGlyph]) -> i64 {
    if glyphs.is_empty() {
        return 0;
    }
    let total: u64 = glyphs.iter().map(|g| u64::from(g.advance_px)).sum();
    ((total as f64 * 10.0) / glyphs.len() as f64).round() as i64
}

/// Union of every glyph's BBX as `(width, height, x offset, y offset)`
fn font_bounding_box(glyphs: &[&LayoutGlyph], layout: &FontLayout) -> (u32, i32, i32, i32) {
    let width = glyphs.iter().map(|g| g.bitmap.width()).max().unwrap_or(0);
    let bottom = glyphs
        .iter()
        .map(|g| g.bottom_px())
        .min()
        .unwrap_or(layout.font_config.descent);
    let top = glyphs
        .iter()
        .map(|g| g.top_px)
        .max()
        .unwrap_or(layout.font_config.ascent);
    (width, top - bottom, 0, bottom)
}

fn default_char(glyphs: &[&LayoutGlyph]) -> Option<u32> {
    let covered = |cp: u32| glyphs.iter().any(|g| g.codepoint == Some(cp));
    [0xFFFD, 0x20]
        .into_iter()
        .find(|&cp| covered(cp))
        .or_else(|| glyphs.first().and_then(|g| g.codepoint))
}

/// XLFD fields may not contain dashes
fn xlfd_field(value: &str) -> String {
    value.replace('-', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FontConfig;
    use crate::data::{GlyphBitmap, MemoryGlyphStore};
    use crate::design::DesignContext;

    fn layout(width_mode: WidthMode) -> FontLayout {
        let config = FontConfig::new(12, 10, -2, 5, 7);
        let mut rows = vec![vec![0u8; 9]; 12];
        rows[0] = vec![1, 0, 0, 0, 0, 0, 0, 0, 1];
        let store = MemoryGlyphStore::new("test")
            .with(12, 0x41, GlyphBitmap::from_rows(&rows))
            .with(12, 0x20, GlyphBitmap::new(3, 12));
        let design = DesignContext::load(&config, &store).unwrap();
        FontLayout::new(&design, width_mode, 100)
    }

    #[test]
    fn test_hex_rows() {
        assert_eq!(hex_row(&[true, false, false, false, false, false, false, false, true]), "8080");
        assert_eq!(hex_row(&[false, true, true]), "60");
    }

    #[test]
    fn test_glyph_records() {
        let text = bdf(&layout(WidthMode::Proportional), &FamilyConfig::default()).unwrap();
        assert!(text.starts_with("STARTFONT 2.1\n"));
        assert!(text.ends_with("ENDFONT\n"));
        assert!(text.contains("CHARS 2\n"));
        assert!(text.contains("STARTCHAR uni0041\nENCODING 65\nSWIDTH 750 0\nDWIDTH 9 0\nBBX 9 12 0 -2\nBITMAP\n8080\n"));
        assert!(text.contains("DEFAULT_CHAR 32\n"));
        assert!(text.contains("SPACING \"P\"\n"));
        assert!(!text.contains(".notdef"));
    }

    #[test]
    fn test_monospaced_strike() {
        let text = bdf(&layout(WidthMode::Monospaced), &FamilyConfig::default()).unwrap();
        assert!(text.contains("DWIDTH 12 0\n"));
        assert!(!text.contains("DWIDTH 9 0\n"));
        assert!(text.contains("SPACING \"C\"\n"));
        assert!(text.contains("-NONE-Fusion Pixel 12px Mono-Medium-R-Normal--12-120-75-75-C-120-ISO10646-1\n"));
    }

    #[test]
    fn test_quotes_are_doubled() {
        let mut family = FamilyConfig::default();
        family.copyright = "the \"Fusion\" authors".to_string();
        let text = bdf(&layout(WidthMode::Proportional), &family).unwrap();
        assert!(text.contains("COPYRIGHT \"the \"\"Fusion\"\" authors\"\n"));
    }
}
