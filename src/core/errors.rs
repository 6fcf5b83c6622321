//! Error types and error-context helpers
//!
//! Library-level failures that callers may want to match on are collected in
//! [`FontError`]. Everything else travels as [`anyhow::Error`] with context
//! attached at the point where a file or directory is touched.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used across the build pipeline
pub type FusionResult<T> = anyhow::Result<T>;

/// Failures produced while reading sources or encoding fonts
#[derive(Debug, Error)]
pub enum FontError {
    #[error("malformed font data: {0}")]
    MalformedFont(String),

    #[error("unsupported WOFF2 feature: {0}")]
    UnsupportedWoff2(String),

    #[error("glyph source directory not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("glyph file name is not a codepoint: {}", .0.display())]
    InvalidGlyphFileName(PathBuf),

    #[error("glyph bitmap for U+{codepoint:04X} has zero width")]
    EmptyGlyph { codepoint: u32 },

    #[error("collection needs at least one member font")]
    EmptyCollection,

    #[error("value {value} does not fit in {field}")]
    Overflow { field: &'static str, value: i64 },
}

/// Attaches "failed to <operation> <path>" to any error on a file operation
pub trait FileContext<T> {
    fn with_file_context(self, operation: &str, path: &Path) -> FusionResult<T>;
}

impl<T, E> FileContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_file_context(self, operation: &str, path: &Path) -> FusionResult<T> {
        self.map_err(|e| {
            anyhow::Error::new(e).context(format!("failed to {operation} {}", path.display()))
        })
    }
}

/// Checks that a glyph source directory exists before it is read
pub fn validate_source_dir(path: &Path) -> Result<(), FontError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(FontError::MissingSource(path.to_path_buf()))
    }
}

/// Converts a value into a `u16` table field, reporting overflow by name
pub fn to_u16(field: &'static str, value: i64) -> Result<u16, FontError> {
    u16::try_from(value).map_err(|_| FontError::Overflow { field, value })
}

/// Converts a value into an `i16` table field, reporting overflow by name
pub fn to_i16(field: &'static str, value: i64) -> Result<i16, FontError> {
    i16::try_from(value).map_err(|_| FontError::Overflow { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_context_names_path() {
        let path = Path::new("/definitely/not/here.png");
        let result: FusionResult<Vec<u8>> = std::fs::read(path).with_file_context("read", path);
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("failed to read /definitely/not/here.png"));
    }

    #[test]
    fn test_missing_source_dir() {
        let err = validate_source_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, FontError::MissingSource(_)));
    }

    #[test]
    fn test_field_overflow() {
        assert_eq!(to_u16("advanceWidth", 1200).unwrap(), 1200);
        assert!(to_u16("advanceWidth", 70_000).is_err());
        assert!(to_i16("xMin", -40_000).is_err());
    }
}
