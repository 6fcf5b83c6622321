//! Font generation
//!
//! A [`FontContext`] turns one resolved design into every output format for
//! one width mode. All formats are written from the same [`FontLayout`], and
//! the collections are assembled from the standalone files afterwards.

pub mod bdf;
pub mod cff;
pub mod collection;
pub mod glyf;
pub mod layout;
pub mod report;
pub mod sfnt;
pub mod tables;
pub mod ufo;
pub mod woff2;
pub mod writer;

use crate::core::config::{BuildConfig, FamilyConfig, WidthMode};
use crate::core::errors::{FileContext, FusionResult};
use crate::design::DesignContext;
use layout::FontLayout;
use sfnt::{SfntTables, CFF_FLAVOR, HEAD, TRUETYPE_FLAVOR};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tables::{FontMetrics, OutlineFlavor};
use tracing::info;

pub use layout::{advance_width, bitmap_top};

/// Output container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFormat {
    Otf,
    Ttf,
    Woff2,
    Bdf,
    Ufo,
}

impl FontFormat {
    pub const ALL: [FontFormat; 5] = [
        FontFormat::Otf,
        FontFormat::Woff2,
        FontFormat::Ttf,
        FontFormat::Bdf,
        FontFormat::Ufo,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            FontFormat::Otf => "otf",
            FontFormat::Ttf => "ttf",
            FontFormat::Woff2 => "woff2",
            FontFormat::Bdf => "bdf",
            FontFormat::Ufo => "ufo",
        }
    }
}

/// Collection container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionFormat {
    Otc,
    Ttc,
}

impl CollectionFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            CollectionFormat::Otc => "otc",
            CollectionFormat::Ttc => "ttc",
        }
    }

    /// Format of the standalone fonts a collection bundles
    pub fn member_format(&self) -> FontFormat {
        match self {
            CollectionFormat::Otc => FontFormat::Otf,
            CollectionFormat::Ttc => FontFormat::Ttf,
        }
    }
}

/// `<output_name>-<size>px-<mode>.<ext>`
pub fn font_file_name(output_name: &str, size: u32, width_mode: WidthMode, extension: &str) -> String {
    format!("{output_name}-{size}px-{width_mode}.{extension}")
}

/// `<output_name>-<mode>.<ext>`
pub fn collection_file_name(output_name: &str, width_mode: WidthMode, format: CollectionFormat) -> String {
    format!("{output_name}-{width_mode}.{}", format.extension())
}

/// Generation of every format for one design and one width mode
pub struct FontContext {
    design: Arc<DesignContext>,
    layout: FontLayout,
    family: FamilyConfig,
    outputs_dir: PathBuf,
}

impl FontContext {
    pub fn new(design: Arc<DesignContext>, width_mode: WidthMode, config: &BuildConfig) -> Self {
        let layout = FontLayout::new(&design, width_mode, config.px_units);
        Self {
            design,
            layout,
            family: config.family.clone(),
            outputs_dir: config.outputs_dir.clone(),
        }
    }

    pub fn design(&self) -> &DesignContext {
        &self.design
    }

    pub fn layout(&self) -> &FontLayout {
        &self.layout
    }

    pub fn width_mode(&self) -> WidthMode {
        self.layout.width_mode
    }

    pub fn size(&self) -> u32 {
        self.layout.font_config.size
    }

    pub fn output_path(&self, format: FontFormat) -> PathBuf {
        self.outputs_dir.join(self.file_name(format.extension()))
    }

    fn file_name(&self, extension: &str) -> String {
        font_file_name(&self.family.output_name, self.size(), self.width_mode(), extension)
    }

    /// Tables common to both outline flavors
    fn shared_tables(&self, flavor: OutlineFlavor) -> FusionResult<(SfntTables, FontMetrics)> {
        let metrics = FontMetrics::from_layout(&self.layout)?;
        let mut font = SfntTables::new(match flavor {
            OutlineFlavor::TrueType => TRUETYPE_FLAVOR,
            OutlineFlavor::Cff => CFF_FLAVOR,
        });
        font.insert(HEAD, tables::head(&metrics, flavor, tables::font_revision(&self.family.version)))
            .insert(tables::HHEA, tables::hhea(&metrics))
            .insert(tables::HMTX, tables::hmtx(&metrics))
            .insert(tables::CMAP, tables::cmap(&self.layout.cmap()))
            .insert(tables::NAME, tables::name(&self.layout, &self.family))
            .insert(tables::OS2, tables::os2(&metrics, &self.layout, &self.family))
            .insert(tables::POST, tables::post(&self.layout));
        Ok((font, metrics))
    }

    /// OpenType font with CFF outlines
    pub fn otf_bytes(&self) -> FusionResult<Vec<u8>> {
        let (mut font, metrics) = self.shared_tables(OutlineFlavor::Cff)?;
        let num_glyphs = metrics.num_glyphs;
        font.insert(tables::MAXP, tables::maxp(num_glyphs, None))
            .insert(cff::CFF, cff::cff_table(&self.layout, &self.family)?);
        Ok(font.build())
    }

    /// TrueType font with `glyf` outlines
    pub fn ttf_bytes(&self) -> FusionResult<Vec<u8>> {
        let (mut font, metrics) = self.shared_tables(OutlineFlavor::TrueType)?;
        let glyf = glyf::GlyfTables::from_layout(&self.layout)?;
        let num_glyphs = metrics.num_glyphs;
        font.insert(
            tables::MAXP,
            tables::maxp(num_glyphs, Some((glyf.max_points, glyf.max_contours))),
        )
        .insert(glyf::GLYF, glyf.glyf)
        .insert(glyf::LOCA, glyf.loca);
        Ok(font.build())
    }

    /// WOFF2 wrapping the OpenType tables
    pub fn woff2_bytes(&self) -> FusionResult<Vec<u8>> {
        Ok(woff2::encode(&self.otf_bytes()?)?)
    }

    pub fn bdf_text(&self) -> FusionResult<String> {
        Ok(bdf::bdf(&self.layout, &self.family)?)
    }

    pub fn make_otf(&self) -> FusionResult<PathBuf> {
        self.write_output(FontFormat::Otf, &self.otf_bytes()?)
    }

    pub fn make_ttf(&self) -> FusionResult<PathBuf> {
        self.write_output(FontFormat::Ttf, &self.ttf_bytes()?)
    }

    pub fn make_woff2(&self) -> FusionResult<PathBuf> {
        self.write_output(FontFormat::Woff2, &self.woff2_bytes()?)
    }

    pub fn make_bdf(&self) -> FusionResult<PathBuf> {
        self.write_output(FontFormat::Bdf, self.bdf_text()?.as_bytes())
    }

    /// Editable UFO source, written as a directory
    pub fn make_ufo(&self) -> FusionResult<PathBuf> {
        let path = self.output_path(FontFormat::Ufo);
        fs::create_dir_all(&self.outputs_dir).with_file_context("create", &self.outputs_dir)?;
        ufo::ufo_font(&self.layout, &self.family)
            .save(&path)
            .with_file_context("save", &path)?;
        info!("Made font file: {}", path.display());
        Ok(path)
    }

    /// Plain-text list of every covered character
    pub fn make_alphabet(&self) -> FusionResult<PathBuf> {
        let path = self.outputs_dir.join(self.file_name("alphabet.txt"));
        write_file(&path, self.design.alphabet().as_bytes())?;
        info!("Made alphabet file: {}", path.display());
        Ok(path)
    }

    /// Coverage per glyph source and per Unicode block, as Markdown
    pub fn make_info(&self) -> FusionResult<PathBuf> {
        let path = self.outputs_dir.join(self.file_name("info.md"));
        let text = report::coverage_report(&self.design, &self.layout, &self.family)?;
        write_file(&path, text.as_bytes())?;
        info!("Made info file: {}", path.display());
        Ok(path)
    }

    /// Every single-font format plus the alphabet and info files
    pub fn make_all(&self) -> FusionResult<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(FontFormat::ALL.len() + 2);
        for format in FontFormat::ALL {
            paths.push(self.make(format)?);
        }
        paths.push(self.make_alphabet()?);
        paths.push(self.make_info()?);
        Ok(paths)
    }

    pub fn make(&self, format: FontFormat) -> FusionResult<PathBuf> {
        match format {
            FontFormat::Otf => self.make_otf(),
            FontFormat::Ttf => self.make_ttf(),
            FontFormat::Woff2 => self.make_woff2(),
            FontFormat::Bdf => self.make_bdf(),
            FontFormat::Ufo => self.make_ufo(),
        }
    }

    /// OpenType collection of every size's `.otf`, sizes ascending
    pub fn make_otc(config: &BuildConfig, width_mode: WidthMode) -> FusionResult<PathBuf> {
        Self::make_collection(config, width_mode, CollectionFormat::Otc)
    }

    /// TrueType collection of every size's `.ttf`, sizes ascending
    pub fn make_ttc(config: &BuildConfig, width_mode: WidthMode) -> FusionResult<PathBuf> {
        Self::make_collection(config, width_mode, CollectionFormat::Ttc)
    }

    fn make_collection(
        config: &BuildConfig,
        width_mode: WidthMode,
        format: CollectionFormat,
    ) -> FusionResult<PathBuf> {
        let mut members = Vec::with_capacity(config.font_sizes.len());
        for font_config in config.sorted_font_sizes() {
            let member = config.outputs_dir.join(font_file_name(
                &config.family.output_name,
                font_config.size,
                width_mode,
                format.member_format().extension(),
            ));
            members.push(fs::read(&member).with_file_context("read collection member", &member)?);
        }
        let bytes = collection::build_collection(&members)?;
        let path = config
            .outputs_dir
            .join(collection_file_name(&config.family.output_name, width_mode, format));
        write_file(&path, &bytes)?;
        info!("Made font collection: {} ({} fonts)", path.display(), members.len());
        Ok(path)
    }

    fn write_output(&self, format: FontFormat, bytes: &[u8]) -> FusionResult<PathBuf> {
        let path = self.output_path(format);
        write_file(&path, bytes)?;
        info!("Made font file: {}", path.display());
        Ok(path)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> FusionResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_file_context("create", parent)?;
    }
    fs::write(path, bytes).with_file_context("write", path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FontConfig;
    use crate::data::{GlyphBitmap, MemoryGlyphStore};
    use skrifa::instance::{LocationRef, Size};
    use skrifa::raw::TableProvider;
    use skrifa::{FontRef, MetadataProvider};

    fn design() -> Arc<DesignContext> {
        let config = FontConfig::new(12, 10, -2, 5, 7);
        let mut rows = vec![vec![0u8; 6]; 12];
        rows[2] = vec![1, 1, 1, 1, 1, 1];
        rows[9][0] = 1;
        let store = MemoryGlyphStore::new("test")
            .with(12, 0x41, GlyphBitmap::from_rows(&rows))
            .with(12, 0x4E00, GlyphBitmap::from_rows(&vec![vec![1; 12]; 12]))
            .with(12, 0x1F600, GlyphBitmap::from_rows(&vec![vec![1; 8]; 12]));
        Arc::new(DesignContext::load(&config, &store).unwrap())
    }

    fn context(width_mode: WidthMode, outputs: &Path) -> FontContext {
        let mut config = BuildConfig::default();
        config.outputs_dir = outputs.to_path_buf();
        FontContext::new(design(), width_mode, &config)
    }

    fn advances(bytes: &[u8]) -> Vec<(u32, f32)> {
        let font = FontRef::new(bytes).unwrap();
        let metrics = font.glyph_metrics(Size::unscaled(), LocationRef::default());
        font.charmap()
            .mappings()
            .map(|(cp, gid)| (cp, metrics.advance_width(gid).unwrap_or(0.0)))
            .collect()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            font_file_name("fusion-pixel", 12, WidthMode::Proportional, "otf"),
            "fusion-pixel-12px-proportional.otf"
        );
        assert_eq!(
            collection_file_name("fusion-pixel", WidthMode::Monospaced, CollectionFormat::Ttc),
            "fusion-pixel-monospaced.ttc"
        );
    }

    #[test]
    fn test_otf_and_ttf_parse_with_same_advances() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(WidthMode::Proportional, dir.path());
        let otf = context.otf_bytes().unwrap();
        let ttf = context.ttf_bytes().unwrap();
        let expected = vec![(0x41, 600.0), (0x4E00, 1200.0), (0x1F600, 800.0)];
        assert_eq!(advances(&otf), expected);
        assert_eq!(advances(&ttf), expected);

        let font = FontRef::new(&ttf).unwrap();
        assert_eq!(font.head().unwrap().units_per_em(), 1200);
        assert_eq!(font.hhea().unwrap().ascender().to_i16(), 1000);
        assert_eq!(font.maxp().unwrap().num_glyphs(), 4);
    }

    #[test]
    fn test_outlines_are_readable() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(WidthMode::Monospaced, dir.path());
        for bytes in [context.otf_bytes().unwrap(), context.ttf_bytes().unwrap()] {
            let font = FontRef::new(&bytes).unwrap();
            let gid = font.charmap().map('A').unwrap();
            let glyphs = font.outline_glyphs();
            let glyph = glyphs.get(gid).unwrap();
            let mut pen = crate::dump::raster::BezPathPen::default();
            glyph
                .draw(
                    skrifa::outline::DrawSettings::unhinted(Size::unscaled(), LocationRef::default()),
                    &mut pen,
                )
                .unwrap();
            let bounds = kurbo::Shape::bounding_box(&pen.path);
            // CFF coordinates pass through the font matrix
            for (actual, expected) in [(bounds.x0, 0.0), (bounds.y0, 0.0), (bounds.x1, 600.0), (bounds.y1, 800.0)] {
                assert!((actual - expected).abs() < 0.5, "{actual} != {expected}");
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let first = context(WidthMode::Monospaced, dir.path());
        let second = context(WidthMode::Monospaced, dir.path());
        assert_eq!(first.otf_bytes().unwrap(), second.otf_bytes().unwrap());
        assert_eq!(first.ttf_bytes().unwrap(), second.ttf_bytes().unwrap());
        assert_eq!(first.woff2_bytes().unwrap(), second.woff2_bytes().unwrap());
        assert_eq!(first.bdf_text().unwrap(), second.bdf_text().unwrap());
    }

    #[test]
    fn test_woff2_wraps_otf() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(WidthMode::Proportional, dir.path());
        let otf = context.otf_bytes().unwrap();
        let decoded = woff2::decode(&context.woff2_bytes().unwrap()).unwrap();
        assert_eq!(decoded.build(), otf);
    }

    #[test]
    fn test_make_writes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(WidthMode::Monospaced, dir.path());
        let paths = context.make_all().unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "fusion-pixel-12px-monospaced.otf",
                "fusion-pixel-12px-monospaced.woff2",
                "fusion-pixel-12px-monospaced.ttf",
                "fusion-pixel-12px-monospaced.bdf",
                "fusion-pixel-12px-monospaced.ufo",
                "fusion-pixel-12px-monospaced.alphabet.txt",
                "fusion-pixel-12px-monospaced.info.md",
            ]
        );
        assert!(paths[4].is_dir());
        let alphabet = fs::read_to_string(&paths[5]).unwrap();
        assert_eq!(alphabet, "A\u{4E00}\u{1F600}");
        let info = fs::read_to_string(&paths[6]).unwrap();
        assert!(info.starts_with("# Fusion Pixel 12px Mono\n"));
        assert!(info.contains("| test | 3 |\n"));
    }

    #[test]
    fn test_collection_needs_members() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BuildConfig::default();
        config.outputs_dir = dir.path().to_path_buf();
        assert!(FontContext::make_otc(&config, WidthMode::Monospaced).is_err());
    }
}
