//! Per-size font identity and width modes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Advance-width policy applied when a design is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthMode {
    /// Every glyph advances by whole cells of `font size` pixels
    Monospaced,
    /// Every glyph advances by its natural bitmap width
    Proportional,
}

impl WidthMode {
    pub const ALL: [WidthMode; 2] = [WidthMode::Monospaced, WidthMode::Proportional];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidthMode::Monospaced => "monospaced",
            WidthMode::Proportional => "proportional",
        }
    }

    /// Capitalized form used inside font names
    pub fn display_name(&self) -> &'static str {
        match self {
            WidthMode::Monospaced => "Mono",
            WidthMode::Proportional => "Proportional",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "monospaced" | "mono" => Some(WidthMode::Monospaced),
            "proportional" => Some(WidthMode::Proportional),
            _ => None,
        }
    }
}

impl fmt::Display for WidthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static identity of one font size
///
/// Line metrics are in pixels relative to the baseline, y up, so `descent`
/// is negative for glyphs that reach below the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontConfig {
    pub size: u32,
    pub ascent: i32,
    pub descent: i32,
    pub x_height: i32,
    pub cap_height: i32,
}

impl FontConfig {
    pub fn new(size: u32, ascent: i32, descent: i32, x_height: i32, cap_height: i32) -> Self {
        Self {
            size,
            ascent,
            descent,
            x_height,
            cap_height,
        }
    }

    pub fn line_height(&self) -> i32 {
        self.ascent - self.descent
    }

    /// Design units per em for a given pixel unit size
    pub fn units_per_em(&self, px_units: u32) -> u32 {
        self.size * px_units
    }

    pub fn size_dir_name(&self) -> String {
        self.size.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_mode_names() {
        assert_eq!(WidthMode::parse("monospaced"), Some(WidthMode::Monospaced));
        assert_eq!(WidthMode::parse("Proportional"), Some(WidthMode::Proportional));
        assert_eq!(WidthMode::parse("condensed"), None);
        assert_eq!(WidthMode::Monospaced.to_string(), "monospaced");
    }

    #[test]
    fn test_line_height() {
        let config = FontConfig::new(12, 10, -2, 5, 7);
        assert_eq!(config.line_height(), 12);
        assert_eq!(config.units_per_em(100), 1200);
    }
}
