//! Build configuration
//!
//! This module handles all configuration aspects:
//! - The JSON build description (sources, dumps, sizes, output paths)
//! - Per-size font identity and width modes

pub mod build_config;
pub mod font_config;

pub use build_config::{
    AlphabetConfig, BuildConfig, DumpConfig, DumpRole, FamilyConfig, GlyphSource, SourceKind,
    DEFAULT_CONFIG_FILE,
};
pub use font_config::{FontConfig, WidthMode};
