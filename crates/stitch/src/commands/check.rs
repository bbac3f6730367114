//! `stitch check` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;

use stitch_site::Manifest;

use crate::config::{CliSettings, Config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Path to configuration file (default: auto-discover stitch.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Manifest file path (overrides config).
    #[arg(short, long)]
    manifest: Option<PathBuf>,
}

impl CheckArgs {
    /// Execute the check command: load the manifest and report every
    /// consistency diagnostic.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the manifest has diagnostics, so the
    /// exit code reflects manifest health.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let cli_settings = CliSettings {
            manifest: self.manifest,
            build_dir: None,
            public_dir: None,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let manifest = Manifest::load(&config.manifest_path)?;
        let mut diagnostics = manifest.validate();
        diagnostics.extend(missing_sources(&manifest, &config.working_dir));
        for diagnostic in &diagnostics {
            output.warning(diagnostic);
        }
        if diagnostics.is_empty() {
            output.success(&format!("Manifest valid, {} pages", manifest.len()));
            Ok(())
        } else {
            Err(CliError::Validation(format!(
                "manifest has {} problem(s)",
                diagnostics.len()
            )))
        }
    }
}

/// Diagnostics for pages whose source file is missing on disk.
pub(crate) fn missing_sources(manifest: &Manifest, working_dir: &Path) -> Vec<String> {
    let mut diagnostics = Vec::new();
    for page in manifest.pages() {
        if page.source.is_empty() {
            continue;
        }
        let source = working_dir.join(page.source.trim_start_matches('/'));
        if !source.is_file() {
            diagnostics.push(format!(
                "page {} source file does not exist: {}",
                page.path,
                source.display()
            ));
        }
    }
    diagnostics
}
