//! Command line interface for the fusion-pixel builder
//!
//! Handles parsing command line arguments and validating them before any
//! build work starts.

use crate::core::config::DEFAULT_CONFIG_FILE;
use crate::logging::{default_logs_dir, LogOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fusion-pixel CLI arguments
///
/// Examples:
///   fusion-pixel                         # Dump and build everything
///   fusion-pixel build                   # Build fonts from existing sources
///   fusion-pixel dump                    # Only regenerate dumped glyphs
///   fusion-pixel --config my.json all    # Use another configuration file
///   fusion-pixel init-config             # Write the default configuration
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "fusion-pixel",
    version,
    about = "Builds pixel fonts from layered glyph bitmap sources",
    long_about = "fusion-pixel rasterizes reference fonts into glyph bitmaps, merges glyph sources in priority order and writes OTF, TTF, WOFF2, BDF, UFO and collection files for every configured size and width mode."
)]
pub struct CliArgs {
    /// Build configuration file
    #[clap(
        long = "config",
        short = 'c',
        default_value = DEFAULT_CONFIG_FILE,
        help = "Build configuration file (JSON)",
        long_help = "Path to the JSON build configuration. Relative paths inside it are resolved against its directory. When the file does not exist the built-in defaults are used."
    )]
    pub config: PathBuf,

    /// Directory for the dated log file
    #[clap(long = "log-dir", help = "Directory for log files")]
    pub log_dir: Option<PathBuf>,

    /// Log to the console only
    #[clap(long = "no-log-file", help = "Do not write a log file")]
    pub no_log_file: bool,

    /// Show debug output
    #[clap(long = "verbose", short = 'v', help = "Show debug output")]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Rasterize reference fonts into their dump sources
    Dump,
    /// Generate fonts from the current glyph sources
    Build,
    /// Dump, then build (the default)
    All,
    /// Write the built-in configuration to the config path
    InitConfig,
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    pub fn validate(&self) -> Result<(), String> {
        if self.config.is_dir() {
            return Err(format!(
                "Config path is a directory: {}\nPass the path of a JSON file.",
                self.config.display()
            ));
        }
        if let Some(dir) = &self.log_dir {
            if dir.is_file() {
                return Err(format!("Log directory is a file: {}", dir.display()));
            }
        }
        Ok(())
    }

    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::All)
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            default_filter: if self.verbose { "debug" } else { "info" }.to_string(),
            log_dir: if self.no_log_file {
                None
            } else {
                Some(self.log_dir.clone().unwrap_or_else(default_logs_dir))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_all() {
        let args = CliArgs::parse_from(["fusion-pixel"]);
        assert_eq!(args.command(), Command::All);
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_subcommands() {
        let args = CliArgs::parse_from(["fusion-pixel", "-c", "x.json", "build"]);
        assert_eq!(args.command(), Command::Build);
        assert_eq!(args.config, PathBuf::from("x.json"));
        let args = CliArgs::parse_from(["fusion-pixel", "init-config"]);
        assert_eq!(args.command(), Command::InitConfig);
    }

    #[test]
    fn test_log_options() {
        let args = CliArgs::parse_from(["fusion-pixel", "--no-log-file", "-v"]);
        let options = args.log_options();
        assert!(options.log_dir.is_none());
        assert_eq!(options.default_filter, "debug");

        let args = CliArgs::parse_from(["fusion-pixel", "--log-dir", "/tmp/logs"]);
        assert_eq!(args.log_options().log_dir, Some(PathBuf::from("/tmp/logs")));
    }

    #[test]
    fn test_directory_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let args = CliArgs::parse_from(["fusion-pixel", "--config", dir.path().to_str().unwrap()]);
        assert!(args.validate().is_err());
    }
}
