//! Per-size alphabets of already-covered codepoints

use crate::build::woff2;
use crate::core::config::BuildConfig;
use crate::core::errors::{FileContext, FontError, FusionResult};
use anyhow::Context;
use skrifa::{FontRef, MetadataProvider};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::info;

/// Codepoints considered visually covered at one size
pub type AlphabetSet = BTreeSet<u32>;

/// Read a font file as a plain sfnt, unpacking WOFF2 when needed
pub fn load_font_data(path: &Path) -> FusionResult<Vec<u8>> {
    let data = fs::read(path).with_file_context("read", path)?;
    if data.starts_with(b"wOF2") {
        let font = woff2::decode(&data).with_context(|| format!("failed to decode {}", path.display()))?;
        return Ok(font.build());
    }
    Ok(data)
}

/// Parse sfnt data, naming the file on failure
pub fn parse_font<'a>(data: &'a [u8], path: &Path) -> FusionResult<FontRef<'a>> {
    FontRef::new(data)
        .map_err(|e| FontError::MalformedFont(format!("{}: {e}", path.display())).into())
}

/// Every codepoint mapped by a font's best character map
pub fn font_alphabet(path: &Path) -> FusionResult<AlphabetSet> {
    let data = load_font_data(path)?;
    let font = parse_font(&data, path)?;
    Ok(font.charmap().mappings().map(|(codepoint, _)| codepoint).collect())
}

/// Alphabet sets by font size
#[derive(Debug, Clone, Default)]
pub struct AlphabetIndex {
    sets: BTreeMap<u32, AlphabetSet>,
    empty: AlphabetSet,
}

impl AlphabetIndex {
    /// Read the alphabet font of every size that has one configured
    ///
    /// Sizes without an alphabet font, the baseline size among them, map to
    /// the empty set.
    pub fn load(config: &BuildConfig) -> FusionResult<Self> {
        let mut index = Self::default();
        for alphabet in &config.alphabets {
            let set = font_alphabet(&alphabet.font_file)?;
            info!(
                "Alphabet for {}px: {} codepoints from {}",
                alphabet.font_size,
                set.len(),
                alphabet.font_file.display()
            );
            index.sets.entry(alphabet.font_size).or_default().extend(set);
        }
        Ok(index)
    }

    pub fn insert(&mut self, size: u32, set: AlphabetSet) {
        self.sets.insert(size, set);
    }

    /// The set for `size`; unknown sizes yield the empty set
    pub fn get(&self, size: u32) -> &AlphabetSet {
        self.sets.get(&size).unwrap_or(&self.empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::FontContext;
    use crate::core::config::{AlphabetConfig, FontConfig, WidthMode};
    use crate::data::{GlyphBitmap, MemoryGlyphStore};
    use crate::design::DesignContext;
    use std::sync::Arc;

    fn write_fonts(dir: &Path) -> BuildConfig {
        let font_config = FontConfig::new(12, 10, -2, 5, 7);
        let store = MemoryGlyphStore::new("test")
            .with(12, 0x41, GlyphBitmap::from_rows(&vec![vec![1; 5]; 12]))
            .with(12, 0x3042, GlyphBitmap::from_rows(&vec![vec![1; 11]; 12]));
        let design = Arc::new(DesignContext::load(&font_config, &store).unwrap());
        let mut config = BuildConfig::default();
        config.outputs_dir = dir.to_path_buf();
        let context = FontContext::new(design, WidthMode::Proportional, &config);
        context.make_ttf().unwrap();
        context.make_woff2().unwrap();
        config
    }

    #[test]
    fn test_alphabet_from_sfnt_and_woff2() {
        let dir = tempfile::tempdir().unwrap();
        write_fonts(dir.path());
        let expected: AlphabetSet = [0x41, 0x3042].into_iter().collect();
        let ttf = dir.path().join("fusion-pixel-12px-proportional.ttf");
        let woff2 = dir.path().join("fusion-pixel-12px-proportional.woff2");
        assert_eq!(font_alphabet(&ttf).unwrap(), expected);
        assert_eq!(font_alphabet(&woff2).unwrap(), expected);
    }

    #[test]
    fn test_index_by_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_fonts(dir.path());
        config.alphabets.push(AlphabetConfig {
            font_size: 16,
            font_file: dir.path().join("fusion-pixel-12px-proportional.woff2"),
        });
        let index = AlphabetIndex::load(&config).unwrap();
        assert!(index.get(12).is_empty());
        assert!(index.get(16).contains(&0x3042));
    }

    #[test]
    fn test_malformed_font_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"not a font").unwrap();
        let message = format!("{:#}", font_alphabet(&path).unwrap_err());
        assert!(message.contains("broken.ttf"));
    }
}
