//! Compact Font Format table with Type 2 charstrings
//!
//! A single name-keyed font: header, Name/Top DICT/String/Global Subr INDEXes,
//! a format 0 charset, the CharStrings INDEX and a Private DICT. Offsets in
//! the Top DICT are always written as 5-byte integers so its size does not
//! depend on the values it points at.

use crate::build::layout::FontLayout;
use crate::build::writer::ByteWriter;
use crate::core::config::FamilyConfig;
use crate::core::errors::{to_u16, FontError};
use kurbo::Rect;
use skrifa::raw::types::Tag;

pub const CFF: Tag = Tag::new(b"CFF ");

/// First string id after the 391 standard strings
const FIRST_CUSTOM_SID: u16 = 391;

mod op {
    pub const FULL_NAME: &[u8] = &[2];
    pub const FAMILY_NAME: &[u8] = &[3];
    pub const FONT_BBOX: &[u8] = &[5];
    pub const CHARSET: &[u8] = &[15];
    pub const CHAR_STRINGS: &[u8] = &[17];
    pub const PRIVATE: &[u8] = &[18];
    pub const FONT_MATRIX: &[u8] = &[12, 7];
    pub const NOMINAL_WIDTH_X: &[u8] = &[21];

    pub const HLINETO: u8 = 6;
    pub const ENDCHAR: u8 = 14;
    pub const RMOVETO: u8 = 21;
}

/// Build the `CFF ` table for a layout
pub fn cff_table(layout: &FontLayout, family: &FamilyConfig) -> Result<Vec<u8>, FontError> {
    let postscript_name = layout.postscript_name(&family.family_name);
    let family_name = layout.family_name(&family.family_name);
    let full_name = format!("{family_name} Regular");

    let mut strings: Vec<&[u8]> = vec![full_name.as_bytes(), family_name.as_bytes()];
    let mut charset = ByteWriter::new();
    charset.u8(0);
    for (index, glyph) in layout.glyphs.iter().enumerate().skip(1) {
        strings.push(glyph.name.as_bytes());
        charset.u16(to_u16("glyph name SID", i64::from(FIRST_CUSTOM_SID) + 1 + index as i64)?);
    }

    let charstrings: Vec<Vec<u8>> = (0..layout.num_glyphs())
        .map(|gid| charstring(layout.advance_units(gid), &layout.outline(gid)))
        .collect();
    let charstrings_index = index(&charstrings.iter().map(Vec::as_slice).collect::<Vec<_>>());

    let mut private = ByteWriter::new();
    dict_int(&mut private, 0);
    private.bytes(op::NOMINAL_WIDTH_X);
    let private = private.into_inner();

    let name_index = index(&[postscript_name.as_bytes()]);
    let string_index = index(&strings);
    let global_subrs = index(&[]);
    let bbox = layout.font_bounds_units();
    let units_per_em = layout.units_per_em();

    let top_dict = |charset_offset: i32, charstrings_offset: i32, private_offset: i32| {
        let mut dict = ByteWriter::new();
        dict_int(&mut dict, i32::from(FIRST_CUSTOM_SID));
        dict.bytes(op::FULL_NAME);
        dict_int(&mut dict, i32::from(FIRST_CUSTOM_SID) + 1);
        dict.bytes(op::FAMILY_NAME);
        if units_per_em != 1000 {
            let scale = 1.0 / f64::from(units_per_em);
            for value in [scale, 0.0, 0.0, scale, 0.0, 0.0] {
                dict_real(&mut dict, value);
            }
            dict.bytes(op::FONT_MATRIX);
        }
        for value in [bbox.0, bbox.1, bbox.2, bbox.3] {
            dict_int(&mut dict, value);
        }
        dict.bytes(op::FONT_BBOX);
        dict_fixed_int(&mut dict, charset_offset);
        dict.bytes(op::CHARSET);
        dict_fixed_int(&mut dict, charstrings_offset);
        dict.bytes(op::CHAR_STRINGS);
        dict_fixed_int(&mut dict, private.len() as i32);
        dict_fixed_int(&mut dict, private_offset);
        dict.bytes(op::PRIVATE);
        dict.into_inner()
    };

    let top_dict_len = index(&[top_dict(0, 0, 0).as_slice()]).len();
    let charset_offset = 4 + name_index.len() + top_dict_len + string_index.len() + global_subrs.len();
    let charstrings_offset = charset_offset + charset.len();
    let private_offset = charstrings_offset + charstrings_index.len();
    let top_dict = top_dict(
        charset_offset as i32,
        charstrings_offset as i32,
        private_offset as i32,
    );
    let top_dict_index = index(&[top_dict.as_slice()]);

    let mut out = ByteWriter::with_capacity(private_offset + private.len());
    out.u8(1).u8(0).u8(4).u8(4); // major, minor, hdrSize, offSize
    out.bytes(&name_index)
        .bytes(&top_dict_index)
        .bytes(&string_index)
        .bytes(&global_subrs)
        .bytes(charset.as_slice())
        .bytes(&charstrings_index)
        .bytes(&private);
    Ok(out.into_inner())
}

/// Type 2 charstring: one counter-clockwise closed square per pixel
fn charstring(advance: i32, squares: &[Rect]) -> Vec<u8> {
    let mut out = ByteWriter::new();
    let mut width = (advance != 0).then_some(advance);
    let mut current = (0i32, 0i32);
    for square in squares {
        let (x0, y0) = (square.x0.round() as i32, square.y0.round() as i32);
        let (w, h) = (
            square.x1.round() as i32 - x0,
            square.y1.round() as i32 - y0,
        );
        if let Some(width) = width.take() {
            charstring_int(&mut out, width);
        }
        charstring_int(&mut out, x0 - current.0);
        charstring_int(&mut out, y0 - current.1);
        out.u8(op::RMOVETO);
        for value in [w, h, -w, -h] {
            charstring_int(&mut out, value);
        }
        out.u8(op::HLINETO);
        current = (x0, y0);
    }
    if let Some(width) = width {
        charstring_int(&mut out, width);
    }
    out.u8(op::ENDCHAR);
    out.into_inner()
}

/// CFF INDEX with the smallest offset size that fits
fn index(items: &[&[u8]]) -> Vec<u8> {
    let mut out = ByteWriter::new();
    out.u16(items.len() as u16);
    if items.is_empty() {
        return out.into_inner();
    }
    let data_len: usize = items.iter().map(|item| item.len()).sum();
    let last_offset = data_len + 1;
    let off_size: u8 = match last_offset {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    };
    out.u8(off_size);
    let mut offset = 1usize;
    let write_offset = |out: &mut ByteWriter, offset: usize| {
        let bytes = (offset as u32).to_be_bytes();
        out.bytes(&bytes[4 - off_size as usize..]);
    };
    write_offset(&mut out, offset);
    for item in items {
        offset += item.len();
        write_offset(&mut out, offset);
    }
    for item in items {
        out.bytes(item);
    }
    out.into_inner()
}

/// Shortest encoding shared by DICT and charstring operands
fn compact_int(out: &mut ByteWriter, value: i32) -> bool {
    match value {
        -107..=107 => {
            out.u8((value + 139) as u8);
        }
        108..=1131 => {
            let v = value - 108;
            out.u8(((v >> 8) + 247) as u8).u8((v & 0xFF) as u8);
        }
        -1131..=-108 => {
            let v = -value - 108;
            out.u8(((v >> 8) + 251) as u8).u8((v & 0xFF) as u8);
        }
        -32768..=32767 => {
            out.u8(28).i16(value as i16);
        }
        _ => return false,
    }
    true
}

fn dict_int(out: &mut ByteWriter, value: i32) {
    if !compact_int(out, value) {
        dict_fixed_int(out, value);
    }
}

/// Always five bytes
fn dict_fixed_int(out: &mut ByteWriter, value: i32) {
    out.u8(29).i32(value);
}

fn charstring_int(out: &mut ByteWriter, value: i32) {
    if !compact_int(out, value) {
        // 16.16 fixed; pixel outlines never get here
        out.u8(255).i32(value << 16);
    }
}

/// Real number operand as packed BCD nibbles
fn dict_real(out: &mut ByteWriter, value: f64) {
    if value == 0.0 {
        dict_int(out, 0);
        return;
    }
    let text = format!("{value:.15e}");
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');

    let mut nibbles = Vec::new();
    for c in mantissa.chars() {
        match c {
            '-' => nibbles.push(0xE),
            '.' => nibbles.push(0xA),
            d => nibbles.push(d.to_digit(10).unwrap_or(0) as u8),
        }
    }
    if exponent != "0" {
        match exponent.strip_prefix('-') {
            Some(digits) => {
                nibbles.push(0xC);
                nibbles.extend(digits.chars().map(|d| d.to_digit(10).unwrap_or(0) as u8));
            }
            None => {
                nibbles.push(0xB);
                nibbles.extend(exponent.chars().map(|d| d.to_digit(10).unwrap_or(0) as u8));
            }
        }
    }
    nibbles.push(0xF);
    if nibbles.len() % 2 == 1 {
        nibbles.push(0xF);
    }
    out.u8(30);
    for pair in nibbles.chunks(2) {
        out.u8((pair[0] << 4) | pair[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_int(value: i32) -> Vec<u8> {
        let mut out = ByteWriter::new();
        dict_int(&mut out, value);
        out.into_inner()
    }

    #[test]
    fn test_int_operands() {
        assert_eq!(encode_int(0), vec![139]);
        assert_eq!(encode_int(100), vec![239]);
        assert_eq!(encode_int(1000), vec![250, 124]);
        assert_eq!(encode_int(-1000), vec![254, 124]);
        assert_eq!(encode_int(10000), vec![28, 0x27, 0x10]);
        assert_eq!(encode_int(100000), vec![29, 0, 1, 0x86, 0xA0]);
    }

    #[test]
    fn test_real_operand() {
        let mut out = ByteWriter::new();
        dict_real(&mut out, 0.00125);
        // 1.25e-3
        assert_eq!(out.as_slice(), &[30, 0x1A, 0x25, 0xC3, 0xFF]);

        let mut out = ByteWriter::new();
        dict_real(&mut out, -2.5);
        assert_eq!(out.as_slice(), &[30, 0xE2, 0xA5, 0xFF]);
    }

    #[test]
    fn test_index_layout() {
        assert_eq!(index(&[]), vec![0, 0]);
        assert_eq!(index(&[&b"ab"[..], &b"c"[..]]), vec![0, 2, 1, 1, 3, 4, b'a', b'b', b'c']);
    }

    #[test]
    fn test_charstring_width_and_square() {
        let cs = charstring(400, &[Rect::new(100.0, 0.0, 200.0, 100.0)]);
        // width, dx, dy rmoveto, w h -w -h hlineto, endchar
        assert_eq!(cs, vec![248, 36, 239, 139, 21, 239, 239, 39, 39, 6, 14]);
        assert_eq!(charstring(0, &[]), vec![14]);
        assert_eq!(charstring(1200, &[]), vec![28, 0x04, 0xB0, 14]);
    }

    #[test]
    fn test_relative_moves_between_squares() {
        let squares = [Rect::new(0.0, 0.0, 100.0, 100.0), Rect::new(300.0, -200.0, 400.0, -100.0)];
        let cs = charstring(0, &squares);
        // second move is relative to the first square's start
        let second_move = &cs[8..13];
        assert_eq!(second_move, &[247, 192, 251, 92, 21]);
    }
}
