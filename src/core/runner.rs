//! Application runner logic
//!
//! Sets up logging, loads the build configuration and dispatches the
//! selected subcommand.

use crate::core::cli::{CliArgs, Command};
use crate::core::config::BuildConfig;
use crate::logging;
use crate::pipeline::Pipeline;
use anyhow::{anyhow, bail, Result};
use std::path::Path;
use tracing::info;

/// Run the selected subcommand with the given CLI arguments.
pub fn run_app(cli_args: CliArgs) -> Result<()> {
    cli_args.validate().map_err(|message| anyhow!(message))?;
    let _log_guard = logging::init(&cli_args.log_options())?;

    match cli_args.command() {
        Command::InitConfig => init_config(&cli_args.config)?,
        Command::Dump => {
            let summaries = load_pipeline(&cli_args.config)?.dump()?;
            let written: usize = summaries.iter().map(|s| s.written).sum();
            info!("Dumped {} glyphs from {} fonts", written, summaries.len());
        }
        Command::Build => {
            load_pipeline(&cli_args.config)?.build()?;
        }
        Command::All => {
            load_pipeline(&cli_args.config)?.run()?;
        }
    }
    Ok(())
}

fn load_pipeline(config_path: &Path) -> Result<Pipeline> {
    Ok(Pipeline::new(BuildConfig::load_or_default(config_path)?))
}

/// Write the built-in configuration, never overwriting an existing file
fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    BuildConfig::default().save(path)?;
    info!("Wrote default configuration to {}", path.display());
    Ok(())
}
