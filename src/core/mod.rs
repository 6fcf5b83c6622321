//! Core application functionality
//!
//! This module contains the application plumbing:
//! - Build configuration
//! - CLI handling and the command runner
//! - Error types

pub mod cli;
pub mod config;
pub mod errors;
pub mod platform;
pub mod runner;

// Re-export commonly used items
pub use cli::CliArgs;
pub use config::BuildConfig;
pub use errors::{FontError, FusionResult};
pub use runner::run_app;
