//! Unicode block lookup and printability

use std::fmt;
use unicode_general_category::{get_general_category, GeneralCategory};

/// Start of the Private Use Area, the only block allowed to exceed one cell
pub const PRIVATE_USE_AREA_START: u32 = 0xE000;

/// A contiguous, named Unicode range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodepointBlock {
    pub start: u32,
    pub end: u32,
    pub name: &'static str,
}

impl CodepointBlock {
    /// Block containing `codepoint`, if it is a scalar value inside any block
    pub fn of(codepoint: u32) -> Option<Self> {
        let c = char::from_u32(codepoint)?;
        let block = unicode_blocks::find_unicode_block(c)?;
        Some(Self {
            start: block.start(),
            end: block.end(),
            name: block.name(),
        })
    }

    /// Directory name used by glyph source trees, e.g. `0000-007F Basic Latin`
    pub fn dir_name(&self) -> String {
        format!("{:04X}-{:04X} {}", self.start, self.end, self.name)
    }

    pub fn is_private_use_area(&self) -> bool {
        self.start == PRIVATE_USE_AREA_START
    }
}

impl fmt::Display for CodepointBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dir_name())
    }
}

/// True when glyphs of `codepoint` may be wider than the font size
pub fn is_width_exempt(codepoint: u32) -> bool {
    CodepointBlock::of(codepoint).is_some_and(|block| block.is_private_use_area())
}

/// Whether a codepoint should produce a visible glyph
///
/// Controls, format characters, surrogates, unassigned codepoints and all
/// separators except the ASCII space are not printable. Private-use
/// codepoints are printable.
pub fn is_printable(codepoint: u32) -> bool {
    let Some(c) = char::from_u32(codepoint) else {
        return false;
    };
    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::Unassigned
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}

/// Upper-case hex name of a codepoint, at least four digits
pub fn codepoint_hex(codepoint: u32) -> String {
    format!("{codepoint:04X}")
}

/// PostScript-style glyph name for a codepoint
pub fn glyph_name(codepoint: u32) -> String {
    if codepoint <= 0xFFFF {
        format!("uni{codepoint:04X}")
    } else {
        format!("u{codepoint:05X}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_latin_block() {
        let block = CodepointBlock::of(0x41).unwrap();
        assert_eq!(block.start, 0x0000);
        assert_eq!(block.end, 0x007F);
        assert_eq!(block.dir_name(), "0000-007F Basic Latin");
    }

    #[test]
    fn test_private_use_area_is_exempt() {
        assert!(is_width_exempt(0xE000));
        assert!(is_width_exempt(0xE0A0));
        assert!(!is_width_exempt(0x4E00));
        assert!(!is_width_exempt(0x41));
    }

    #[test]
    fn test_printable() {
        assert!(is_printable(0x41));
        assert!(is_printable(0x20));
        assert!(is_printable(0x4E00));
        assert!(is_printable(0xE000));
        assert!(!is_printable(0x0A));
        assert!(!is_printable(0x200B));
        assert!(!is_printable(0x3000));
        assert!(!is_printable(0xD800));
    }

    #[test]
    fn test_names() {
        assert_eq!(codepoint_hex(0x41), "0041");
        assert_eq!(codepoint_hex(0x1F600), "1F600");
        assert_eq!(glyph_name(0x41), "uni0041");
        assert_eq!(glyph_name(0x1F600), "u1F600");
    }
}
