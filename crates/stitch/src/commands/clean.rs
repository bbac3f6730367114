//! `stitch clean` command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::config::Config;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the clean command.
#[derive(Args)]
pub(crate) struct CleanArgs {
    /// Path to configuration file (default: auto-discover stitch.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl CleanArgs {
    /// Execute the clean command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails to load or the build
    /// directory cannot be emptied.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;

        let build_path = config.build_path();
        clean_dir(&build_path)?;
        output.success(&format!("Cleaned '{}'", build_path.display()));
        Ok(())
    }
}

/// Empty a directory without removing the directory itself.
///
/// A missing directory is not an error; the next build creates it.
pub(crate) fn clean_dir(path: &Path) -> Result<(), CliError> {
    if !path.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
