//! Encoders for the tables shared by the TrueType and CFF flavors

use crate::build::layout::FontLayout;
use crate::build::writer::{search_params, ByteWriter};
use crate::core::config::{FamilyConfig, WidthMode};
use crate::core::errors::{to_i16, to_u16, FontError};
use skrifa::raw::types::Tag;

pub const CMAP: Tag = Tag::new(b"cmap");
pub const HHEA: Tag = Tag::new(b"hhea");
pub const HMTX: Tag = Tag::new(b"hmtx");
pub const MAXP: Tag = Tag::new(b"maxp");
pub const NAME: Tag = Tag::new(b"name");
pub const OS2: Tag = Tag::new(b"OS/2");
pub const POST: Tag = Tag::new(b"post");

const WINDOWS_PLATFORM: u16 = 3;
const WINDOWS_UNICODE_BMP: u16 = 1;
const WINDOWS_ENGLISH_US: u16 = 0x0409;

/// Which outline flavor a table set is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineFlavor {
    TrueType,
    Cff,
}

/// Every metric the shared tables need, computed once per layout
#[derive(Debug, Clone)]
pub struct FontMetrics {
    pub num_glyphs: u16,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub x_height: i16,
    pub cap_height: i16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub advance_max: u16,
    pub average_advance: i16,
    pub min_lsb: i16,
    pub min_rsb: i16,
    pub x_max_extent: i16,
    pub advances: Vec<u16>,
    pub lsbs: Vec<i16>,
    pub pixel_size: u16,
}

impl FontMetrics {
    pub fn from_layout(layout: &FontLayout) -> Result<Self, FontError> {
        let num_glyphs = to_u16("numGlyphs", layout.num_glyphs() as i64)?;
        let (x_min, y_min, x_max, y_max) = layout.font_bounds_units();
        let mut advances = Vec::with_capacity(layout.num_glyphs());
        let mut lsbs = Vec::with_capacity(layout.num_glyphs());
        let mut min_lsb: Option<i32> = None;
        let mut min_rsb: Option<i32> = None;
        let mut x_max_extent: Option<i32> = None;
        for gid in 0..layout.num_glyphs() {
            let advance = layout.advance_units(gid);
            advances.push(to_u16("advanceWidth", i64::from(advance))?);
            match layout.bounds_units(gid) {
                Some((g_x_min, _, g_x_max, _)) => {
                    lsbs.push(to_i16("leftSideBearing", i64::from(g_x_min))?);
                    min_lsb = Some(min_lsb.map_or(g_x_min, |m| m.min(g_x_min)));
                    let rsb = advance - g_x_max;
                    min_rsb = Some(min_rsb.map_or(rsb, |m| m.min(rsb)));
                    x_max_extent = Some(x_max_extent.map_or(g_x_max, |m| m.max(g_x_max)));
                }
                None => lsbs.push(0),
            }
        }
        let field = |name: &'static str, value: i32| to_i16(name, i64::from(value));
        Ok(Self {
            num_glyphs,
            units_per_em: to_u16("unitsPerEm", i64::from(layout.units_per_em()))?,
            ascender: field("ascender", layout.ascender_units())?,
            descender: field("descender", layout.descender_units())?,
            x_height: field("sxHeight", layout.units(layout.font_config.x_height))?,
            cap_height: field("sCapHeight", layout.units(layout.font_config.cap_height))?,
            x_min: field("xMin", x_min)?,
            y_min: field("yMin", y_min)?,
            x_max: field("xMax", x_max)?,
            y_max: field("yMax", y_max)?,
            advance_max: to_u16("advanceWidthMax", i64::from(layout.max_advance_units()))?,
            average_advance: field("xAvgCharWidth", layout.average_advance_units())?,
            min_lsb: field("minLeftSideBearing", min_lsb.unwrap_or(0))?,
            min_rsb: field("minRightSideBearing", min_rsb.unwrap_or(0))?,
            x_max_extent: field("xMaxExtent", x_max_extent.unwrap_or(0))?,
            advances,
            lsbs,
            pixel_size: to_u16("lowestRecPPEM", i64::from(layout.font_config.size))?,
        })
    }
}

/// Parse "1.2.3" into a 16.16 font revision, using the first two parts
pub fn font_revision(version: &str) -> u32 {
    let mut parts = version.split('.').map(|p| p.trim().parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(1).min(0x7FFF);
    let minor = parts.next().unwrap_or(0);
    let fraction = if minor == 0 {
        0
    } else {
        let digits = 10f64.powi(minor.to_string().len() as i32);
        ((f64::from(minor) / digits) * 65536.0).round() as u32
    };
    (major << 16) | fraction.min(0xFFFF)
}

pub fn head(metrics: &FontMetrics, flavor: OutlineFlavor, revision: u32) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(54);
    w.u32(0x0001_0000) // version
        .u32(revision)
        .u32(0) // checkSumAdjustment, filled in by the sfnt writer
        .u32(0x5F0F_3CF5)
        .u16(0b0000_0000_0000_1011) // baseline at 0, lsb at 0, integer ppem
        .u16(metrics.units_per_em)
        .i64(0) // created
        .i64(0) // modified
        .i16(metrics.x_min)
        .i16(metrics.y_min)
        .i16(metrics.x_max)
        .i16(metrics.y_max)
        .u16(0) // macStyle
        .u16(metrics.pixel_size)
        .i16(2) // fontDirectionHint
        .i16(match flavor {
            OutlineFlavor::TrueType => 1,
            OutlineFlavor::Cff => 0,
        })
        .i16(0);
    w.into_inner()
}

pub fn hhea(metrics: &FontMetrics) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(36);
    w.u32(0x0001_0000)
        .i16(metrics.ascender)
        .i16(metrics.descender)
        .i16(0) // lineGap
        .u16(metrics.advance_max)
        .i16(metrics.min_lsb)
        .i16(metrics.min_rsb)
        .i16(metrics.x_max_extent)
        .i16(1) // caretSlopeRise
        .i16(0)
        .i16(0);
    for _ in 0..4 {
        w.i16(0);
    }
    w.i16(0) // metricDataFormat
        .u16(metrics.num_glyphs);
    w.into_inner()
}

pub fn hmtx(metrics: &FontMetrics) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(metrics.advances.len() * 4);
    for (advance, lsb) in metrics.advances.iter().zip(&metrics.lsbs) {
        w.u16(*advance).i16(*lsb);
    }
    w.into_inner()
}

/// Version 0.5 for CFF, 1.0 with outline limits for TrueType
pub fn maxp(num_glyphs: u16, limits: Option<(u16, u16)>) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(32);
    match limits {
        None => {
            w.u32(0x0000_5000).u16(num_glyphs);
        }
        Some((max_points, max_contours)) => {
            w.u32(0x0001_0000)
                .u16(num_glyphs)
                .u16(max_points)
                .u16(max_contours)
                .u16(0) // maxCompositePoints
                .u16(0) // maxCompositeContours
                .u16(2) // maxZones
                .u16(0)
                .u16(0)
                .u16(0)
                .u16(0)
                .u16(0)
                .u16(0)
                .u16(0)
                .u16(0);
        }
    }
    w.into_inner()
}

pub fn os2(
    metrics: &FontMetrics,
    layout: &FontLayout,
    family: &FamilyConfig,
) -> Vec<u8> {
    let upm = i32::from(metrics.units_per_em);
    let script_size = (upm * 65 / 100) as i16;
    let script_offset = (upm * 14 / 100) as i16;
    let superscript_offset = (upm * 35 / 100) as i16;
    let cmap = layout.cmap();
    let first_char = cmap.first().map_or(0, |&(cp, _)| cp.min(0xFFFF) as u16);
    let last_char = cmap.last().map_or(0, |&(cp, _)| cp.min(0xFFFF) as u16);
    let mut panose = [0u8; 10];
    panose[0] = 2; // Latin text
    panose[3] = match layout.width_mode {
        WidthMode::Monospaced => 9,
        WidthMode::Proportional => 0,
    };
    let mut vendor = [b' '; 4];
    for (dst, src) in vendor.iter_mut().zip(family.vendor_id.bytes()) {
        *dst = src;
    }

    let mut w = ByteWriter::with_capacity(96);
    w.u16(4)
        .i16(metrics.average_advance)
        .u16(400) // usWeightClass
        .u16(5) // usWidthClass
        .u16(0) // fsType: installable
        .i16(script_size)
        .i16(script_size)
        .i16(0)
        .i16(script_offset)
        .i16(script_size)
        .i16(script_size)
        .i16(0)
        .i16(superscript_offset)
        .i16(layout.px_units as i16) // yStrikeoutSize
        .i16(metrics.x_height / 2) // yStrikeoutPosition
        .i16(0) // sFamilyClass
        .bytes(&panose)
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0)
        .bytes(&vendor)
        .u16(0x0040 | 0x0080) // REGULAR | USE_TYPO_METRICS
        .u16(first_char)
        .u16(last_char)
        .i16(metrics.ascender)
        .i16(metrics.descender)
        .i16(0) // sTypoLineGap
        .u16(metrics.ascender.max(0) as u16)
        .u16(metrics.descender.min(0).unsigned_abs())
        .u32(1) // ulCodePageRange1: Latin 1
        .u32(0)
        .i16(metrics.x_height)
        .i16(metrics.cap_height)
        .u16(0) // usDefaultChar
        .u16(0x20) // usBreakChar
        .u16(0); // usMaxContext
    w.into_inner()
}

pub fn post(layout: &FontLayout) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(32);
    w.u32(0x0003_0000)
        .u32(0) // italicAngle
        .i16(-(layout.px_units as i16)) // underlinePosition
        .i16(layout.px_units as i16) // underlineThickness
        .u32(match layout.width_mode {
            WidthMode::Monospaced => 1,
            WidthMode::Proportional => 0,
        })
        .u32(0)
        .u32(0)
        .u32(0)
        .u32(0);
    w.into_inner()
}

/// Format 4 (BMP) and format 12 (full range) subtables
///
/// A BMP with too many runs for a 16-bit subtable length gets format 12
/// records only.
pub fn cmap(mappings: &[(u32, u16)]) -> Vec<u8> {
    let format4 = cmap_format4(mappings);
    let format12 = cmap_format12(mappings);

    let num_records: usize = if format4.is_some() { 4 } else { 2 };
    let header_len = 4 + 8 * num_records;
    let format4_len = format4.as_ref().map_or(0, Vec::len);
    let format4_offset = header_len as u32;
    let format12_offset = format4_offset + format4_len as u32;

    let mut w = ByteWriter::with_capacity(header_len + format4_len + format12.len());
    w.u16(0).u16(num_records as u16);
    // (platform, encoding) pairs in sorted order
    if format4.is_some() {
        w.u16(0).u16(3).u32(format4_offset);
    }
    w.u16(0).u16(4).u32(format12_offset);
    if format4.is_some() {
        w.u16(3).u16(1).u32(format4_offset);
    }
    w.u16(3).u16(10).u32(format12_offset);
    if let Some(format4) = &format4 {
        w.bytes(format4);
    }
    w.bytes(&format12);
    w.into_inner()
}

/// Runs of consecutive codepoints mapped to consecutive glyph ids
fn runs(mappings: &[(u32, u16)]) -> Vec<(u32, u32, u16)> {
    let mut runs: Vec<(u32, u32, u16)> = Vec::new();
    for &(codepoint, gid) in mappings {
        match runs.last_mut() {
            Some((start, end, start_gid))
                if codepoint == *end + 1
                    && u32::from(gid) == u32::from(*start_gid) + (codepoint - *start) =>
            {
                *end = codepoint;
            }
            _ => runs.push((codepoint, codepoint, gid)),
        }
    }
    runs
}

/// `None` when the segments do not fit a 16-bit subtable length
fn cmap_format4(mappings: &[(u32, u16)]) -> Option<Vec<u8>> {
    let bmp: Vec<(u32, u16)> = mappings
        .iter()
        .copied()
        .filter(|&(cp, _)| cp < 0xFFFF)
        .collect();
    let mut segments: Vec<(u16, u16, u16)> = runs(&bmp)
        .into_iter()
        .map(|(start, end, gid)| (start as u16, end as u16, gid.wrapping_sub(start as u16)))
        .collect();
    segments.push((0xFFFF, 0xFFFF, 1));

    let length = to_u16("cmap format 4 length", 16 + 8 * segments.len() as i64).ok()?;
    let seg_count = segments.len() as u16;
    let (search_range, entry_selector, range_shift) = search_params(seg_count, 2);

    let mut w = ByteWriter::with_capacity(usize::from(length));
    w.u16(4)
        .u16(length)
        .u16(0)
        .u16(seg_count * 2)
        .u16(search_range)
        .u16(entry_selector)
        .u16(range_shift);
    for &(_, end, _) in &segments {
        w.u16(end);
    }
    w.u16(0);
    for &(start, _, _) in &segments {
        w.u16(start);
    }
    for &(_, _, delta) in &segments {
        w.u16(delta);
    }
    for _ in &segments {
        w.u16(0);
    }
    Some(w.into_inner())
}

fn cmap_format12(mappings: &[(u32, u16)]) -> Vec<u8> {
    let groups = runs(mappings);
    let length = 16 + 12 * groups.len();
    let mut w = ByteWriter::with_capacity(length);
    w.u16(12)
        .u16(0)
        .u32(length as u32)
        .u32(0)
        .u32(groups.len() as u32);
    for (start, end, gid) in groups {
        w.u32(start).u32(end).u32(u32::from(gid));
    }
    w.into_inner()
}

/// Name records, Windows platform, US English, UTF-16BE
pub fn name(layout: &FontLayout, family: &FamilyConfig) -> Vec<u8> {
    let family_name = layout.family_name(&family.family_name);
    let unique_id = format!("{};{}", family.version, layout.postscript_name(&family.family_name));
    let records: Vec<(u16, String)> = [
        (0, family.copyright.clone()),
        (1, family_name.clone()),
        (2, "Regular".to_string()),
        (3, unique_id),
        (4, format!("{family_name} Regular")),
        (5, format!("Version {}", family.version)),
        (6, layout.postscript_name(&family.family_name)),
        (11, family.vendor_url.clone()),
        (13, family.license.clone()),
        (14, family.license_url.clone()),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .collect();

    let encoded: Vec<Vec<u8>> = records
        .iter()
        .map(|(_, value)| value.encode_utf16().flat_map(u16::to_be_bytes).collect())
        .collect();
    let storage_offset = 6 + 12 * records.len();

    let mut w = ByteWriter::new();
    w.u16(0).u16(records.len() as u16).u16(storage_offset as u16);
    let mut offset = 0usize;
    for ((name_id, _), bytes) in records.iter().zip(&encoded) {
        w.u16(WINDOWS_PLATFORM)
            .u16(WINDOWS_UNICODE_BMP)
            .u16(WINDOWS_ENGLISH_US)
            .u16(*name_id)
            .u16(bytes.len() as u16)
            .u16(offset as u16);
        offset += bytes.len();
    }
    for bytes in &encoded {
        w.bytes(bytes);
    }
    w.into_inner()
}
