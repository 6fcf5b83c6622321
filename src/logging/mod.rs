//! Logging setup
//!
//! Console output goes to stderr through `tracing-subscriber`, filtered by
//! `RUST_LOG`. A copy of every run can also be written to a dated log file.

use crate::core::errors::{FileContext, FusionResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const APP_DIR: &str = "fusion-pixel";

/// Get the path to the fusion-pixel config directory
fn config_dir() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
    config_dir.join(APP_DIR)
}

/// Default directory for log files
pub fn default_logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Name of today's log file
pub fn log_file_name() -> String {
    let date = chrono::Local::now().format("%Y-%m-%d");
    format!("{APP_DIR}-{date}.log")
}

/// Where and how much to log
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
    /// Directory for the log file; `None` logs to the console only
    pub log_dir: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            log_dir: Some(default_logs_dir()),
        }
    }
}

/// Keeps the file writer flushing until dropped
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
    pub log_file: Option<PathBuf>,
}

/// Install the global subscriber
pub fn init(options: &LogOptions) -> FusionResult<LogGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard, log_file) = match &options.log_dir {
        Some(dir) => {
            let (writer, guard, path) = file_writer(dir)?;
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard), Some(path))
        }
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()?;

    if let Some(path) = &log_file {
        tracing::debug!("Logging to {}", path.display());
    }
    Ok(LogGuard {
        _file: guard,
        log_file,
    })
}

fn file_writer(
    dir: &Path,
) -> FusionResult<(tracing_appender::non_blocking::NonBlocking, WorkerGuard, PathBuf)> {
    fs::create_dir_all(dir).with_file_context("create", dir)?;
    let file_name = log_file_name();
    let appender = tracing_appender::rolling::never(dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((writer, guard, dir.join(file_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name_is_dated() {
        let name = log_file_name();
        assert!(name.starts_with("fusion-pixel-"));
        assert!(name.ends_with(".log"));
        // fusion-pixel-YYYY-MM-DD.log
        assert_eq!(name.len(), "fusion-pixel-".len() + 10 + 4);
    }

    #[test]
    fn test_default_logs_dir() {
        assert!(default_logs_dir().ends_with("fusion-pixel/logs"));
    }
}
