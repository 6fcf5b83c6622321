//! Build configuration file handling
//!
//! The whole build is described by one JSON document, loaded once at startup
//! and passed by reference to every stage. Relative paths in the document are
//! resolved against the directory that contains it.

use crate::core::config::font_config::FontConfig;
use crate::core::errors::{FileContext, FusionResult};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default name of the configuration file in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "fusion-pixel.json";

/// How a glyph source directory comes to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Hand-maintained bitmaps, normalized in place before every build
    Patch,
    /// Extracted by the external asset updater, tracked by `version.json`
    Upstream,
    /// Produced by the glyph dumper into the build directory
    Dump,
}

/// One entry of the ordered fallback list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphSource {
    pub name: String,
    pub kind: SourceKind,
    /// Root of the tree; ignored for dump sources, which live in the build dir
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Whether a dumped font is subject to alphabet dedup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpRole {
    /// The baseline typeface itself; always dumps every printable codepoint
    Reference,
    /// Only dumps codepoints the baseline does not already cover
    Supplement,
}

/// Rasterization of one reference font at one target size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Name of the dump glyph source this dump fills
    pub source: String,
    pub font_file: PathBuf,
    pub font_size: u32,
    pub rasterize_size: f32,
    #[serde(default)]
    pub rasterize_offset: (i32, i32),
    pub role: DumpRole,
}

/// Font whose cmap defines the already-covered alphabet of one size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphabetConfig {
    pub font_size: u32,
    pub font_file: PathBuf,
}

/// Naming and licensing shared by every generated font
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub family_name: String,
    pub output_name: String,
    pub version: String,
    pub copyright: String,
    pub license: String,
    pub license_url: String,
    pub vendor_url: String,
    pub vendor_id: String,
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self {
            family_name: "Fusion Pixel".to_string(),
            output_name: "fusion-pixel".to_string(),
            version: "1.0.0".to_string(),
            copyright: "Copyright (c) Fusion Pixel Font contributors".to_string(),
            license: "This Font Software is licensed under the SIL Open Font License, Version 1.1."
                .to_string(),
            license_url: "https://openfontlicense.org".to_string(),
            vendor_url: String::new(),
            vendor_id: "NONE".to_string(),
        }
    }
}

/// Complete description of a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub family: FamilyConfig,
    /// Font units per pixel; units-per-em is `size * px_units`
    pub px_units: u32,
    pub font_sizes: Vec<FontConfig>,
    /// Glyph sources in priority order, first wins
    pub sources: Vec<GlyphSource>,
    #[serde(default)]
    pub dumps: Vec<DumpConfig>,
    #[serde(default)]
    pub alphabets: Vec<AlphabetConfig>,
    pub build_dir: PathBuf,
    pub outputs_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            family: FamilyConfig::default(),
            px_units: 100,
            font_sizes: vec![
                FontConfig::new(8, 7, -1, 4, 5),
                FontConfig::new(10, 8, -2, 5, 7),
                FontConfig::new(12, 10, -2, 5, 7),
            ],
            sources: vec![
                GlyphSource {
                    name: "patch".to_string(),
                    kind: SourceKind::Patch,
                    dir: Some(PathBuf::from("assets/glyphs/patch")),
                },
                GlyphSource {
                    name: "ark-pixel".to_string(),
                    kind: SourceKind::Upstream,
                    dir: Some(PathBuf::from("assets/glyphs/ark-pixel")),
                },
            ],
            dumps: Vec::new(),
            alphabets: Vec::new(),
            build_dir: PathBuf::from("build"),
            outputs_dir: PathBuf::from("build/outputs"),
        }
    }
}

impl BuildConfig {
    /// Load and validate a configuration file, resolving relative paths
    pub fn load(path: &Path) -> FusionResult<Self> {
        let contents = fs::read_to_string(path).with_file_context("read", path)?;
        let config: BuildConfig = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = config.resolved(base);
        config.validate()?;
        debug!("Loaded build config from {:?}", path);
        Ok(config)
    }

    /// Load `path` if it exists, otherwise the built-in defaults rooted at `.`
    pub fn load_or_default(path: &Path) -> FusionResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config at {:?}, using built-in defaults", path);
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> FusionResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_file_context("create", parent)?;
        }
        let mut contents = serde_json::to_string_pretty(self)?;
        contents.push('\n');
        fs::write(path, contents).with_file_context("write", path)?;
        Ok(())
    }

    /// Returns a copy whose relative paths are joined onto `base`
    pub fn resolved(mut self, base: &Path) -> Self {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.build_dir);
        join(&mut self.outputs_dir);
        for source in &mut self.sources {
            if let Some(dir) = source.dir.as_mut() {
                join(dir);
            }
        }
        for dump in &mut self.dumps {
            join(&mut dump.font_file);
        }
        for alphabet in &mut self.alphabets {
            join(&mut alphabet.font_file);
        }
        self
    }

    /// Reject configurations the pipeline cannot build
    pub fn validate(&self) -> FusionResult<()> {
        if self.px_units == 0 {
            bail!("px_units must be positive");
        }
        if self.font_sizes.is_empty() {
            bail!("at least one font size must be configured");
        }
        for font_config in &self.font_sizes {
            if font_config.size == 0 || font_config.line_height() <= 0 {
                bail!("font size {} has an empty line box", font_config.size);
            }
            if u64::from(font_config.size) * u64::from(self.px_units) > 16384 {
                bail!("font size {} exceeds the maximum units per em", font_config.size);
            }
        }
        if self.sources.is_empty() {
            bail!("at least one glyph source must be configured");
        }
        for (index, source) in self.sources.iter().enumerate() {
            if self.sources[..index].iter().any(|s| s.name == source.name) {
                bail!("glyph source '{}' is listed twice", source.name);
            }
            match source.kind {
                SourceKind::Patch | SourceKind::Upstream => {
                    if source.dir.is_none() {
                        bail!("glyph source '{}' needs a dir", source.name);
                    }
                }
                SourceKind::Dump => {}
            }
        }
        for dump in &self.dumps {
            match self.source(&dump.source) {
                Some(source) if source.kind == SourceKind::Dump => {}
                Some(_) => bail!("dump target '{}' is not a dump source", dump.source),
                None => bail!("dump target '{}' is not a configured source", dump.source),
            }
            if self.font_config(dump.font_size).is_none() {
                bail!("dump of {:?} targets unknown size {}", dump.font_file, dump.font_size);
            }
            if dump.rasterize_size <= 0.0 {
                bail!("dump of {:?} has a non-positive rasterize size", dump.font_file);
            }
        }
        Ok(())
    }

    pub fn font_config(&self, size: u32) -> Option<&FontConfig> {
        self.font_sizes.iter().find(|c| c.size == size)
    }

    pub fn source(&self, name: &str) -> Option<&GlyphSource> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Directory that holds (or will hold) a source's glyph tree
    pub fn source_dir(&self, source: &GlyphSource) -> PathBuf {
        match source.kind {
            SourceKind::Patch | SourceKind::Upstream => source
                .dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(&source.name)),
            SourceKind::Dump => self.dump_dir().join(&source.name),
        }
    }

    pub fn dump_dir(&self) -> PathBuf {
        self.build_dir.join("dump")
    }

    /// Sizes in ascending order, the member order of every collection
    pub fn sorted_font_sizes(&self) -> Vec<&FontConfig> {
        let mut sizes: Vec<&FontConfig> = self.font_sizes.iter().collect();
        sizes.sort_by_key(|c| c.size);
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BuildConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.font_config(12).map(|c| c.line_height()), Some(12));
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let config = BuildConfig::default().resolved(Path::new("/work"));
        assert_eq!(config.build_dir, PathBuf::from("/work/build"));
        let patch = config.source("patch").unwrap();
        assert_eq!(
            config.source_dir(patch),
            PathBuf::from("/work/assets/glyphs/patch")
        );
    }

    #[test]
    fn test_dump_sources_live_in_build_dir() {
        let mut config = BuildConfig::default();
        config.sources.push(GlyphSource {
            name: "unifont".to_string(),
            kind: SourceKind::Dump,
            dir: None,
        });
        let source = config.source("unifont").unwrap().clone();
        assert_eq!(config.source_dir(&source), PathBuf::from("build/dump/unifont"));
    }

    #[test]
    fn test_duplicate_source_is_rejected() {
        let mut config = BuildConfig::default();
        let first = config.sources[0].clone();
        config.sources.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dump_must_target_dump_source() {
        let mut config = BuildConfig::default();
        config.dumps.push(DumpConfig {
            source: "patch".to_string(),
            font_file: PathBuf::from("font.ttf"),
            font_size: 12,
            rasterize_size: 12.0,
            rasterize_offset: (0, 0),
            role: DumpRole::Supplement,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fusion-pixel.json");
        BuildConfig::default().save(&path).unwrap();
        let loaded = BuildConfig::load(&path).unwrap();
        assert_eq!(loaded.build_dir, dir.path().join("build"));
        assert_eq!(loaded.font_sizes, BuildConfig::default().font_sizes);
    }
}
