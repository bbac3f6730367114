//! `stitch build` command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::warn;

use stitch_compose::{Composer, FsSource};
use stitch_site::Manifest;

use crate::commands::check;
use crate::commands::clean::clean_dir;
use crate::config::{CliSettings, Config};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover stitch.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Manifest file path (overrides config).
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Build output directory (overrides config).
    #[arg(short, long)]
    build_dir: Option<String>,

    /// Public assets directory (overrides config).
    #[arg(short, long)]
    public_dir: Option<String>,

    /// Enable verbose output (per-stage composition logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// Pages are composed independently; a page that fails to compose is
    /// logged and skipped so the rest of the site still builds.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or the manifest fails to load, or
    /// on I/O failures outside per-page composition.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            manifest: self.manifest,
            build_dir: self.build_dir,
            public_dir: self.public_dir,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let manifest = Manifest::load(&config.manifest_path)?;
        let mut diagnostics = manifest.validate();
        diagnostics.extend(check::missing_sources(&manifest, &config.working_dir));
        for diagnostic in diagnostics {
            warn!("{diagnostic}");
            output.warning(&format!("Manifest: {diagnostic}"));
        }

        let build_path = config.build_path();
        clean_dir(&build_path)?;

        let source = FsSource::new(&config.working_dir);
        let composer = Composer::new(&manifest, &source, &config.working_dir);

        let mut built = 0usize;
        let mut failed = 0usize;
        for page in manifest.pages() {
            if page.path.is_empty() {
                continue;
            }
            output.info(&format!("Generating '{}'", page.path));
            match composer.compose_page(page) {
                Ok(html) => {
                    write_page(&build_path, &page.path, &html)?;
                    built += 1;
                }
                Err(err) => {
                    warn!(page = %page.path, "{err}");
                    output.warning(&format!("Skipped '{}': {err}", page.path));
                    failed += 1;
                }
            }
        }

        copy_dir_all(&config.public_path(), &build_path)?;

        if failed > 0 {
            output.warning(&format!("Built {built} pages, {failed} failed"));
        } else {
            output.success(&format!("Built {built} pages"));
        }
        Ok(())
    }
}

/// Write a composed page under the build directory.
fn write_page(build_path: &Path, page_path: &str, html: &str) -> Result<(), CliError> {
    let relative = page_path.trim_start_matches('/');
    let out_path = build_path.join(relative);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out_path, html)?;
    Ok(())
}

/// Recursively copy a directory tree, overwriting existing files.
pub(crate) fn copy_dir_all(source: &Path, destination: &Path) -> Result<(), CliError> {
    if !source.is_dir() || source == destination {
        return Ok(());
    }
    fs::create_dir_all(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
