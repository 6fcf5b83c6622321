//! Glyph source data
//!
//! Bitmaps, the stores that hold them, Unicode block lookup and the version
//! sidecars of upstream sources.

pub mod bitmap;
pub mod blocks;
pub mod store;
pub mod version;

pub use bitmap::GlyphBitmap;
pub use blocks::{is_printable, is_width_exempt, CodepointBlock};
pub use store::{DirGlyphStore, GlyphStore, MemoryGlyphStore};
pub use version::{SourceType, VersionInfo};
