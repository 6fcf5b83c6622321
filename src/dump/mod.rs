//! Glyph dumping: rasterize a reference font into a glyph source tree
//!
//! The dumper samples every printable codepoint of a reference font at a
//! fixed rasterize size and writes one binary bitmap per codepoint. Bitmaps
//! are rendered in parallel and written in ascending codepoint order.

pub mod alphabet;
pub mod raster;

use crate::core::config::{DumpConfig, DumpRole};
use crate::core::errors::FusionResult;
use crate::data::{is_printable, is_width_exempt, CodepointBlock, GlyphBitmap, GlyphStore};
use alphabet::{load_font_data, parse_font, AlphabetSet};
use anyhow::anyhow;
use raster::{rasterize, BezPathPen, Placement};
use rayon::prelude::*;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::DrawSettings;
use skrifa::raw::TableProvider;
use skrifa::{GlyphId, MetadataProvider};
use tracing::{debug, info};

pub use alphabet::AlphabetIndex;

/// Counts reported after a dump
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub written: usize,
    pub unprintable: usize,
    pub deduplicated: usize,
    pub empty: usize,
    pub clamped: usize,
}

/// Vertical canvas size for a reference font
///
/// The canvas covers the font's ascender to descender at the rasterize size.
/// When the difference to the target size is odd the canvas grows by one
/// pixel so the glyph can be centered with integer padding.
pub fn canvas_height(ascender: i32, descender: i32, units_per_em: u16, rasterize_size: f32, font_size: u32) -> u32 {
    let line = f64::from(ascender - descender) / f64::from(units_per_em);
    let mut height = (line * f64::from(rasterize_size)).ceil().max(0.0) as i64;
    if (height - i64::from(font_size)).rem_euclid(2) == 1 {
        height += 1;
    }
    height as u32
}

/// Horizontal canvas size of one glyph; `None` when it would be empty
pub fn canvas_width(advance: f32, units_per_em: u16, rasterize_size: f32) -> Option<u32> {
    let width = (f64::from(advance) * f64::from(rasterize_size) / f64::from(units_per_em)).ceil();
    (width > 0.0).then_some(width as u32)
}

/// One glyph to render
struct DumpJob {
    codepoint: u32,
    glyph_id: GlyphId,
    width: u32,
}

/// Rasterizes one reference font for one target size
#[derive(Debug, Clone)]
pub struct GlyphDumper {
    dump: DumpConfig,
}

impl GlyphDumper {
    pub fn new(dump: DumpConfig) -> Self {
        Self { dump }
    }

    pub fn config(&self) -> &DumpConfig {
        &self.dump
    }

    /// Dump every eligible codepoint into `store`
    ///
    /// Codepoints in `alphabet` are left out unless this is the reference
    /// dump, which always covers its whole character map.
    pub fn dump_to(&self, alphabet: &AlphabetSet, store: &mut dyn GlyphStore) -> FusionResult<DumpSummary> {
        let path = &self.dump.font_file;
        let data = load_font_data(path)?;
        let font = parse_font(&data, path)?;
        let head = font
            .head()
            .map_err(|e| anyhow!("failed to read head of {}: {e}", path.display()))?;
        let hhea = font
            .hhea()
            .map_err(|e| anyhow!("failed to read hhea of {}: {e}", path.display()))?;
        let units_per_em = head.units_per_em();
        let ascender = i32::from(hhea.ascender().to_i16());
        let descender = i32::from(hhea.descender().to_i16());

        let rasterize_size = self.dump.rasterize_size;
        let font_size = self.dump.font_size;
        let height = canvas_height(ascender, descender, units_per_em, rasterize_size, font_size);
        let scale = f64::from(rasterize_size) / f64::from(units_per_em);
        let (offset_x, offset_y) = self.dump.rasterize_offset;
        let placement = Placement {
            scale,
            origin_x: f64::from(offset_x),
            baseline_y: f64::from(offset_y) + (f64::from(ascender) * scale).round(),
        };

        let mut mappings: Vec<(u32, GlyphId)> = font.charmap().mappings().collect();
        mappings.sort_by_key(|&(codepoint, _)| codepoint);
        mappings.dedup_by_key(|&mut (codepoint, _)| codepoint);

        let metrics = font.glyph_metrics(Size::unscaled(), LocationRef::default());
        let mut summary = DumpSummary::default();
        let mut jobs = Vec::with_capacity(mappings.len());
        for (codepoint, glyph_id) in mappings {
            if !is_printable(codepoint) || CodepointBlock::of(codepoint).is_none() {
                summary.unprintable += 1;
                continue;
            }
            if self.dump.role == DumpRole::Supplement && alphabet.contains(&codepoint) {
                summary.deduplicated += 1;
                continue;
            }
            let advance = metrics.advance_width(glyph_id).unwrap_or(0.0);
            let Some(mut width) = canvas_width(advance, units_per_em, rasterize_size) else {
                summary.empty += 1;
                continue;
            };
            if width > font_size && !is_width_exempt(codepoint) {
                width = font_size;
                summary.clamped += 1;
            }
            jobs.push(DumpJob {
                codepoint,
                glyph_id,
                width,
            });
        }

        let rendered: Vec<(u32, GlyphBitmap)> = jobs
            .par_iter()
            .map_init(
                || font.outline_glyphs(),
                |outlines, job| {
                    let mut pen = BezPathPen::default();
                    if let Some(glyph) = outlines.get(job.glyph_id) {
                        glyph
                            .draw(
                                DrawSettings::unhinted(Size::unscaled(), LocationRef::default()),
                                &mut pen,
                            )
                            .map_err(|e| {
                                anyhow!(
                                    "failed to draw U+{:04X} from {}: {e}",
                                    job.codepoint,
                                    path.display()
                                )
                            })?;
                    }
                    Ok((job.codepoint, rasterize(&pen.path, &placement, job.width, height)))
                },
            )
            .collect::<FusionResult<_>>()?;

        for (codepoint, bitmap) in &rendered {
            store.put(font_size, *codepoint, bitmap)?;
            debug!(
                "Dumped U+{:04X} ({}x{}) into {}",
                codepoint,
                bitmap.width(),
                bitmap.height(),
                store.describe()
            );
        }
        summary.written = rendered.len();
        info!(
            "Dumped {} glyphs of {} at {}px into {} ({} deduplicated, {} clamped)",
            summary.written,
            path.display(),
            font_size,
            store.describe(),
            summary.deduplicated,
            summary.clamped
        );
        Ok(summary)
    }
}
