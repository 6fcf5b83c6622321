//! `version.json` sidecars of upstream glyph sources
//!
//! The external asset updater resolves a tag, branch or commit to a SHA and
//! records it next to the extracted glyphs. The build only compares SHAs to
//! decide whether the installed glyphs are current.

use crate::core::errors::{FileContext, FusionResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const VERSION_FILE_NAME: &str = "version.json";

/// How an upstream revision is pinned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum SourceType {
    Tag(String),
    Branch(String),
    Commit(String),
}

/// Resolved upstream revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub sha: String,
    pub version: String,
    pub version_url: String,
    pub asset_url: String,
}

impl VersionInfo {
    /// Describe a GitHub revision once its SHA is known
    pub fn for_github(repository: &str, source: &SourceType, sha: &str) -> Self {
        let version = match source {
            SourceType::Tag(name) | SourceType::Branch(name) => name.clone(),
            SourceType::Commit(_) => sha.to_string(),
        };
        Self {
            sha: sha.to_string(),
            version_url: format!("https://github.com/{repository}/tree/{version}"),
            asset_url: format!("https://github.com/{repository}/archive/{sha}.zip"),
            version,
        }
    }

    pub fn load(path: &Path) -> FusionResult<Self> {
        let contents = fs::read_to_string(path).with_file_context("read", path)?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse version file {}", path.display()))
    }

    /// Read `dir/version.json` if present
    pub fn load_from_dir(dir: &Path) -> FusionResult<Option<Self>> {
        let path = dir.join(VERSION_FILE_NAME);
        if path.is_file() {
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// UTF-8, two-space indent, trailing newline
    pub fn save(&self, path: &Path) -> FusionResult<()> {
        let mut contents = serde_json::to_string_pretty(self)?;
        contents.push('\n');
        fs::write(path, contents).with_file_context("write", path)
    }

    /// Whether glyphs installed at `installed` must be replaced by `pinned`
    pub fn needs_update(installed: Option<&VersionInfo>, pinned: &VersionInfo) -> bool {
        installed.map_or(true, |current| current.sha != pinned.sha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_for_tag_and_commit() {
        let tag = VersionInfo::for_github(
            "TakWolf/ark-pixel-font",
            &SourceType::Tag("2024.05.12".to_string()),
            "abc123",
        );
        assert_eq!(tag.version, "2024.05.12");
        assert_eq!(
            tag.version_url,
            "https://github.com/TakWolf/ark-pixel-font/tree/2024.05.12"
        );
        assert_eq!(
            tag.asset_url,
            "https://github.com/TakWolf/ark-pixel-font/archive/abc123.zip"
        );

        let commit = VersionInfo::for_github(
            "TakWolf/ark-pixel-font",
            &SourceType::Commit("abc123".to_string()),
            "abc123",
        );
        assert_eq!(commit.version, "abc123");
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(VERSION_FILE_NAME);
        let info = VersionInfo::for_github("a/b", &SourceType::Branch("main".to_string()), "f00");
        info.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"sha\": \"f00\",\n"));
        assert!(text.ends_with("}\n"));
        assert_eq!(VersionInfo::load_from_dir(dir.path()).unwrap(), Some(info));
    }

    #[test]
    fn test_needs_update_compares_sha() {
        let pinned = VersionInfo::for_github("a/b", &SourceType::Commit("1".to_string()), "1");
        let other = VersionInfo::for_github("a/b", &SourceType::Commit("2".to_string()), "2");
        assert!(VersionInfo::needs_update(None, &pinned));
        assert!(VersionInfo::needs_update(Some(&other), &pinned));
        assert!(!VersionInfo::needs_update(Some(&pinned), &pinned));
    }
}
