//! Resolved glyph designs
//!
//! A [`DesignContext`] is the codepoint → bitmap mapping of one font size,
//! merged from several glyph sources in priority order. Once the merge is
//! done it is shared read-only by every width-mode build.

use crate::core::config::FontConfig;
use crate::core::errors::{FontError, FusionResult};
use crate::data::blocks::is_width_exempt;
use crate::data::{GlyphBitmap, GlyphStore};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// One resolved glyph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignGlyph {
    pub bitmap: GlyphBitmap,
    /// Natural advance in pixels, the bitmap width
    pub advance_width: u32,
    /// Store the glyph was taken from
    pub source: String,
}

/// Fallback-merged design of one font size
#[derive(Debug, Clone)]
pub struct DesignContext {
    font_config: FontConfig,
    glyphs: BTreeMap<u32, DesignGlyph>,
}

impl DesignContext {
    /// An empty design, the neutral element of [`DesignContext::fallback`]
    pub fn empty(font_config: &FontConfig) -> Self {
        Self {
            font_config: font_config.clone(),
            glyphs: BTreeMap::new(),
        }
    }

    /// Read every glyph of `font_config.size` from a store
    pub fn load(font_config: &FontConfig, store: &dyn GlyphStore) -> FusionResult<Self> {
        let source = store.describe();
        let mut glyphs = BTreeMap::new();
        for (codepoint, bitmap) in store.load_all(font_config.size)? {
            if bitmap.width() == 0 {
                debug!("Dropping {}", FontError::EmptyGlyph { codepoint });
                continue;
            }
            let bitmap = if bitmap.width() > font_config.size && !is_width_exempt(codepoint) {
                warn!(
                    "U+{:04X} from {} is {}px wide, cropping to {}px",
                    codepoint,
                    source,
                    bitmap.width(),
                    font_config.size
                );
                bitmap.cropped_to_width(font_config.size)
            } else {
                bitmap
            };
            glyphs.insert(
                codepoint,
                DesignGlyph {
                    advance_width: bitmap.width(),
                    bitmap,
                    source: source.clone(),
                },
            );
        }
        debug!("Loaded {} glyphs of {}px from {}", glyphs.len(), font_config.size, source);
        Ok(Self {
            font_config: font_config.clone(),
            glyphs,
        })
    }

    /// Fill the gaps of `self` with glyphs of `other`; never replaces
    ///
    /// Returns how many codepoints were added.
    pub fn fallback(&mut self, other: &DesignContext) -> usize {
        let mut added = 0;
        for (&codepoint, glyph) in &other.glyphs {
            if !self.glyphs.contains_key(&codepoint) {
                self.glyphs.insert(codepoint, glyph.clone());
                added += 1;
            }
        }
        added
    }

    /// Merge stores in priority order: the first store that has a codepoint wins
    pub fn resolve(font_config: &FontConfig, stores: &[&dyn GlyphStore]) -> FusionResult<Self> {
        let mut design = Self::empty(font_config);
        for store in stores {
            let layer = Self::load(font_config, *store)?;
            let added = design.fallback(&layer);
            info!(
                "{}px: {} of {} glyphs taken from {}",
                font_config.size,
                added,
                layer.len(),
                store.describe()
            );
        }
        Ok(design)
    }

    pub fn font_config(&self) -> &FontConfig {
        &self.font_config
    }

    pub fn get(&self, codepoint: u32) -> Option<&DesignGlyph> {
        self.glyphs.get(&codepoint)
    }

    pub fn contains(&self, codepoint: u32) -> bool {
        self.glyphs.contains_key(&codepoint)
    }

    pub fn provenance(&self, codepoint: u32) -> Option<&str> {
        self.glyphs.get(&codepoint).map(|g| g.source.as_str())
    }

    /// Codepoints in ascending order
    pub fn codepoints(&self) -> impl Iterator<Item = u32> + '_ {
        self.glyphs.keys().copied()
    }

    /// Glyphs in ascending codepoint order
    pub fn glyphs(&self) -> impl Iterator<Item = (u32, &DesignGlyph)> + '_ {
        self.glyphs.iter().map(|(&codepoint, glyph)| (codepoint, glyph))
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Every covered character as a string, ascending
    pub fn alphabet(&self) -> String {
        self.codepoints().filter_map(char::from_u32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryGlyphStore;

    fn config() -> FontConfig {
        FontConfig::new(12, 10, -2, 5, 7)
    }

    fn block(width: usize, height: usize) -> GlyphBitmap {
        GlyphBitmap::from_rows(&vec![vec![1; width]; height])
    }

    #[test]
    fn test_priority_order_example() {
        let patch = MemoryGlyphStore::new("patch").with(12, 0x41, block(6, 12));
        let ark_pixel = MemoryGlyphStore::new("ark-pixel")
            .with(12, 0x41, block(8, 12))
            .with(12, 0x42, block(8, 12));
        let generic = MemoryGlyphStore::new("generic")
            .with(12, 0x42, block(3, 12))
            .with(12, 0x43, block(5, 12));

        let stores: [&dyn GlyphStore; 3] = [&patch, &ark_pixel, &generic];
        let design = DesignContext::resolve(&config(), &stores).unwrap();

        let a = design.get(0x41).unwrap();
        assert_eq!((a.bitmap.width(), a.bitmap.height()), (6, 12));
        assert_eq!(a.source, "patch");
        let b = design.get(0x42).unwrap();
        assert_eq!((b.bitmap.width(), b.bitmap.height()), (8, 12));
        assert_eq!(design.provenance(0x42), Some("ark-pixel"));
        assert_eq!(design.provenance(0x43), Some("generic"));
        assert_eq!(design.codepoints().collect::<Vec<_>>(), vec![0x41, 0x42, 0x43]);
    }

    #[test]
    fn test_fallback_is_additive_only() {
        let first = MemoryGlyphStore::new("first").with(12, 0x41, block(4, 12));
        let second = MemoryGlyphStore::new("second")
            .with(12, 0x41, block(9, 12))
            .with(12, 0x4E00, block(12, 12));

        let mut design = DesignContext::load(&config(), &first).unwrap();
        let other = DesignContext::load(&config(), &second).unwrap();
        assert_eq!(design.fallback(&other), 1);
        assert_eq!(design.get(0x41).unwrap().advance_width, 4);
        assert_eq!(design.get(0x4E00).unwrap().bitmap, block(12, 12));
        assert_eq!(design.fallback(&other), 0);
    }

    #[test]
    fn test_load_only_reads_configured_size() {
        let store = MemoryGlyphStore::new("s")
            .with(10, 0x41, block(4, 10))
            .with(12, 0x42, block(4, 12));
        let design = DesignContext::load(&config(), &store).unwrap();
        assert!(!design.contains(0x41));
        assert!(design.contains(0x42));
    }

    #[test]
    fn test_width_clamp_except_private_use() {
        let store = MemoryGlyphStore::new("wide")
            .with(12, 0x41, block(15, 12))
            .with(12, 0xE000, block(24, 12));
        let design = DesignContext::load(&config(), &store).unwrap();
        assert_eq!(design.get(0x41).unwrap().bitmap.width(), 12);
        assert_eq!(design.get(0xE000).unwrap().bitmap.width(), 24);
        assert_eq!(design.get(0xE000).unwrap().advance_width, 24);
    }

    #[test]
    fn test_zero_width_glyphs_are_dropped() {
        let store = MemoryGlyphStore::new("s").with(12, 0x41, GlyphBitmap::new(0, 12));
        assert!(DesignContext::load(&config(), &store).unwrap().is_empty());
    }

    #[test]
    fn test_alphabet() {
        let store = MemoryGlyphStore::new("s")
            .with(12, 0x42, block(1, 1))
            .with(12, 0x41, block(1, 1));
        assert_eq!(DesignContext::load(&config(), &store).unwrap().alphabet(), "AB");
    }
}
