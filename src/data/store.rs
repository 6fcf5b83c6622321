//! Glyph stores: where bitmaps live, addressed by (font size, codepoint)
//!
//! The on-disk layout is
//! `<root>/<size>/<blockStart>-<blockEnd> <blockName>/<codepointHex>.png`.
//! Trees supplied from outside may nest files differently below the size
//! directory; every PNG whose stem is a hex codepoint is picked up.

use crate::core::errors::{validate_source_dir, FileContext, FontError, FusionResult};
use crate::data::bitmap::GlyphBitmap;
use crate::data::blocks::{codepoint_hex, CodepointBlock};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Content-addressable storage of glyph bitmaps
pub trait GlyphStore {
    fn get(&self, size: u32, codepoint: u32) -> FusionResult<Option<GlyphBitmap>>;

    fn put(&mut self, size: u32, codepoint: u32, bitmap: &GlyphBitmap) -> FusionResult<()>;

    /// Every stored codepoint of one size, ascending
    fn codepoints(&self, size: u32) -> FusionResult<Vec<u32>>;

    /// Human-readable origin used in logs and provenance
    fn describe(&self) -> String;

    /// Every bitmap of one size
    fn load_all(&self, size: u32) -> FusionResult<BTreeMap<u32, GlyphBitmap>> {
        let mut glyphs = BTreeMap::new();
        for codepoint in self.codepoints(size)? {
            if let Some(bitmap) = self.get(size, codepoint)? {
                glyphs.insert(codepoint, bitmap);
            }
        }
        Ok(glyphs)
    }
}

/// A glyph source tree on disk
#[derive(Debug, Clone)]
pub struct DirGlyphStore {
    root: PathBuf,
}

impl DirGlyphStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open an existing tree; a missing root is an error
    pub fn open(root: impl Into<PathBuf>) -> FusionResult<Self> {
        let store = Self::new(root);
        validate_source_dir(&store.root)?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn size_dir(&self, size: u32) -> PathBuf {
        self.root.join(size.to_string())
    }

    /// Canonical location of a glyph file
    pub fn glyph_path(&self, size: u32, codepoint: u32) -> PathBuf {
        let block_dir = CodepointBlock::of(codepoint)
            .map(|block| block.dir_name())
            .unwrap_or_else(|| "No Block".to_string());
        self.size_dir(size)
            .join(block_dir)
            .join(format!("{}.png", codepoint_hex(codepoint)))
    }

    /// Delete the whole tree
    pub fn clear(&self) -> FusionResult<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).with_file_context("delete", &self.root)?;
        }
        Ok(())
    }

    /// Map every glyph file of one size to its codepoint
    ///
    /// Paths are visited in sorted order; when a codepoint appears twice the
    /// first path wins.
    pub fn scan(&self, size: u32) -> FusionResult<BTreeMap<u32, PathBuf>> {
        let size_dir = self.size_dir(size);
        let mut files = Vec::new();
        if size_dir.is_dir() {
            collect_files(&size_dir, &mut files)?;
        }
        files.sort();

        let mut glyphs = BTreeMap::new();
        for path in files {
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            let codepoint = match parse_codepoint(&path) {
                Ok(codepoint) => codepoint,
                Err(e) => {
                    debug!("Skipping {}", e);
                    continue;
                }
            };
            if let Some(existing) = glyphs.get(&codepoint) {
                warn!(
                    "Duplicate glyph U+{:04X}: keeping {:?}, ignoring {:?}",
                    codepoint, existing, path
                );
                continue;
            }
            glyphs.insert(codepoint, path);
        }
        Ok(glyphs)
    }

    /// Rewrite every glyph file of one size as a canonical binarized PNG
    ///
    /// Files already in canonical form come out byte-identical, so running
    /// this repeatedly is harmless.
    pub fn normalize(&self, size: u32) -> FusionResult<usize> {
        let files = self.scan(size)?;
        for path in files.values() {
            let bitmap = GlyphBitmap::load_png(path)?;
            bitmap.save_png(path)?;
        }
        debug!("Normalized {} glyph files in {:?}", files.len(), self.size_dir(size));
        Ok(files.len())
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> FusionResult<()> {
    for entry in fs::read_dir(dir).with_file_context("list", dir)? {
        let entry = entry.with_file_context("list", dir)?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn parse_codepoint(path: &Path) -> Result<u32, FontError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| u32::from_str_radix(stem, 16).ok())
        .filter(|&codepoint| char::from_u32(codepoint).is_some())
        .ok_or_else(|| FontError::InvalidGlyphFileName(path.to_path_buf()))
}

impl GlyphStore for DirGlyphStore {
    fn get(&self, size: u32, codepoint: u32) -> FusionResult<Option<GlyphBitmap>> {
        let canonical = self.glyph_path(size, codepoint);
        if canonical.is_file() {
            return GlyphBitmap::load_png(&canonical).map(Some);
        }
        match self.scan(size)?.get(&codepoint) {
            Some(path) => GlyphBitmap::load_png(path).map(Some),
            None => Ok(None),
        }
    }

    fn put(&mut self, size: u32, codepoint: u32, bitmap: &GlyphBitmap) -> FusionResult<()> {
        let path = self.glyph_path(size, codepoint);
        bitmap.save_png(&path)
    }

    fn codepoints(&self, size: u32) -> FusionResult<Vec<u32>> {
        Ok(self.scan(size)?.into_keys().collect())
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn load_all(&self, size: u32) -> FusionResult<BTreeMap<u32, GlyphBitmap>> {
        self.scan(size)?
            .into_iter()
            .map(|(codepoint, path)| Ok((codepoint, GlyphBitmap::load_png(&path)?)))
            .collect()
    }
}

/// A glyph store held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryGlyphStore {
    name: String,
    glyphs: BTreeMap<(u32, u32), GlyphBitmap>,
}

impl MemoryGlyphStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            glyphs: BTreeMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, size: u32, codepoint: u32, bitmap: GlyphBitmap) -> Self {
        self.glyphs.insert((size, codepoint), bitmap);
        self
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl GlyphStore for MemoryGlyphStore {
    fn get(&self, size: u32, codepoint: u32) -> FusionResult<Option<GlyphBitmap>> {
        Ok(self.glyphs.get(&(size, codepoint)).cloned())
    }

    fn put(&mut self, size: u32, codepoint: u32, bitmap: &GlyphBitmap) -> FusionResult<()> {
        self.glyphs.insert((size, codepoint), bitmap.clone());
        Ok(())
    }

    fn codepoints(&self, size: u32) -> FusionResult<Vec<u32>> {
        Ok(self
            .glyphs
            .range((size, 0)..=(size, u32::MAX))
            .map(|(&(_, codepoint), _)| codepoint)
            .collect())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
