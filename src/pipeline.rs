//! End-to-end build: dump, normalize, resolve, generate
//!
//! Every stage reads the same [`BuildConfig`]. Each run starts from empty
//! output directories, so repeated runs produce identical trees.

use crate::build::FontContext;
use crate::core::config::{BuildConfig, FontConfig, GlyphSource, SourceKind, WidthMode};
use crate::core::errors::{FileContext, FusionResult};
use crate::data::{DirGlyphStore, GlyphStore, VersionInfo};
use crate::design::DesignContext;
use crate::dump::{AlphabetIndex, DumpSummary, GlyphDumper};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Files produced by a build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub fonts: Vec<PathBuf>,
    pub collections: Vec<PathBuf>,
}

pub struct Pipeline {
    config: BuildConfig,
}

impl Pipeline {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Clean everything, dump, then build
    pub fn run(&self) -> FusionResult<BuildReport> {
        remove_dir(&self.config.build_dir)?;
        self.dump()?;
        self.build()
    }

    /// Regenerate every dump source tree from its reference font
    pub fn dump(&self) -> FusionResult<Vec<DumpSummary>> {
        remove_dir(&self.config.dump_dir())?;
        if self.config.dumps.is_empty() {
            return Ok(Vec::new());
        }
        let alphabets = AlphabetIndex::load(&self.config)?;
        let mut summaries = Vec::with_capacity(self.config.dumps.len());
        for dump in &self.config.dumps {
            let Some(source) = self.config.source(&dump.source) else {
                continue;
            };
            let mut store = DirGlyphStore::new(self.config.source_dir(source));
            let dumper = GlyphDumper::new(dump.clone());
            summaries.push(dumper.dump_to(alphabets.get(dump.font_size), &mut store)?);
        }
        Ok(summaries)
    }

    /// Rewrite every patch glyph as a canonical binarized PNG
    pub fn format_glyph_files(&self) -> FusionResult<usize> {
        let mut count = 0;
        for source in self.sources_of(SourceKind::Patch) {
            let store = DirGlyphStore::open(self.config.source_dir(source))?;
            for font_config in &self.config.font_sizes {
                count += store.normalize(font_config.size)?;
            }
        }
        info!("Normalized {} patch glyph files", count);
        Ok(count)
    }

    /// Merge the configured sources for one size, in priority order
    pub fn resolve_design(&self, font_config: &FontConfig) -> FusionResult<DesignContext> {
        let stores = self
            .config
            .sources
            .iter()
            .map(|source| self.open_store(source))
            .collect::<FusionResult<Vec<_>>>()?;
        let stores: Vec<&dyn GlyphStore> = stores.iter().map(|s| s as &dyn GlyphStore).collect();
        DesignContext::resolve(font_config, &stores)
    }

    /// Generate every font, alphabet, info file and collection from the current sources
    pub fn build(&self) -> FusionResult<BuildReport> {
        remove_dir(&self.config.outputs_dir)?;
        self.log_upstream_versions()?;
        self.format_glyph_files()?;

        let mut report = BuildReport::default();
        for font_config in self.config.sorted_font_sizes() {
            let design = Arc::new(self.resolve_design(font_config)?);
            info!("{}px design has {} glyphs", font_config.size, design.len());
            let built = WidthMode::ALL
                .par_iter()
                .map(|&width_mode| {
                    FontContext::new(Arc::clone(&design), width_mode, &self.config).make_all()
                })
                .collect::<FusionResult<Vec<_>>>()?;
            report.fonts.extend(built.into_iter().flatten());
        }

        for width_mode in WidthMode::ALL {
            report
                .collections
                .push(FontContext::make_otc(&self.config, width_mode)?);
            report
                .collections
                .push(FontContext::make_ttc(&self.config, width_mode)?);
        }
        info!(
            "Built {} files and {} collections into {}",
            report.fonts.len(),
            report.collections.len(),
            self.config.outputs_dir.display()
        );
        Ok(report)
    }

    fn sources_of(&self, kind: SourceKind) -> impl Iterator<Item = &GlyphSource> {
        self.config.sources.iter().filter(move |s| s.kind == kind)
    }

    fn open_store(&self, source: &GlyphSource) -> FusionResult<DirGlyphStore> {
        let dir = self.config.source_dir(source);
        match source.kind {
            SourceKind::Patch | SourceKind::Upstream => DirGlyphStore::open(dir),
            SourceKind::Dump => {
                if !dir.is_dir() {
                    warn!("Dump source '{}' has no glyphs yet at {:?}", source.name, dir);
                }
                Ok(DirGlyphStore::new(dir))
            }
        }
    }

    fn log_upstream_versions(&self) -> FusionResult<()> {
        for source in self.sources_of(SourceKind::Upstream) {
            match VersionInfo::load_from_dir(&self.config.source_dir(source))? {
                Some(version) => info!(
                    "Building from {} {} ({})",
                    source.name, version.version, version.sha
                ),
                None => warn!("Upstream source '{}' has no version file", source.name),
            }
        }
        Ok(())
    }
}

fn remove_dir(dir: &Path) -> FusionResult<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_file_context("delete", dir)?;
    }
    Ok(())
}
