//! Configuration management for stitch.
//!
//! Parses `stitch.toml` with serde and auto-discovers the config file in
//! parent directories. CLI settings can be applied during load via
//! [`CliSettings`]; they take precedence over file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "stitch.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub(crate) struct CliSettings {
    /// Override the manifest file path.
    pub manifest: Option<PathBuf>,
    /// Override the build output directory.
    pub build_dir: Option<String>,
    /// Override the public assets directory.
    pub public_dir: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Raw site section as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    manifest: Option<String>,
    build_dir: Option<String>,
    public_dir: Option<String>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Site configuration (paths are relative strings from TOML).
    site: SiteConfigRaw,

    /// Working directory every relative path resolves against
    /// (set after loading).
    #[serde(skip)]
    pub working_dir: PathBuf,
    /// Resolved manifest file path (set after loading).
    #[serde(skip)]
    pub manifest_path: PathBuf,
    /// Build output directory, relative to the working directory
    /// (set after loading).
    #[serde(skip)]
    pub build_dir: String,
    /// Public assets directory, relative to the working directory
    /// (set after loading).
    #[serde(skip)]
    pub public_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise,
    /// searches for `stitch.toml` in the current directory and parents,
    /// falling back to defaults rooted at the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `config_path` doesn't exist, parsing
    /// fails, or validation fails.
    pub(crate) fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Absolute build directory path.
    pub(crate) fn build_path(&self) -> PathBuf {
        self.working_dir.join(&self.build_dir)
    }

    /// Absolute public assets directory path.
    pub(crate) fn public_path(&self) -> PathBuf {
        self.working_dir.join(&self.public_dir)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(manifest) = &settings.manifest {
            self.manifest_path = if manifest.is_absolute() {
                manifest.clone()
            } else {
                self.working_dir.join(manifest)
            };
        }
        if let Some(build_dir) = &settings.build_dir {
            self.build_dir.clone_from(build_dir);
        }
        if let Some(public_dir) = &settings.public_dir {
            self.public_dir.clone_from(public_dir);
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` when a directory is absolute,
    /// empty, or the build and public directories collide.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("build_dir", &self.build_dir), ("public_dir", &self.public_dir)] {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!("site.{name} cannot be empty")));
            }
            if Path::new(value).is_absolute() {
                return Err(ConfigError::Validation(format!(
                    "site.{name} must be relative to the working directory"
                )));
            }
        }
        if self.build_path() == self.public_path() {
            return Err(ConfigError::Validation(
                "site.build_dir and site.public_dir cannot be the same".to_owned(),
            ));
        }
        Ok(())
    }

    /// Search for the config file in the current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            working_dir: base.to_path_buf(),
            manifest_path: base.join("manifest.toml"),
            build_dir: "build".to_owned(),
            public_dir: "public".to_owned(),
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        Ok(config)
    }

    /// Resolve raw relative strings against the config file's directory.
    fn resolve_paths(&mut self, base: &Path) {
        self.working_dir = base.to_path_buf();
        let manifest = self.site.manifest.as_deref().unwrap_or("manifest.toml");
        self.manifest_path = if Path::new(manifest).is_absolute() {
            PathBuf::from(manifest)
        } else {
            base.join(manifest)
        };
        self.build_dir = self
            .site
            .build_dir
            .clone()
            .unwrap_or_else(|| "build".to_owned());
        self.public_dir = self
            .site
            .public_dir
            .clone()
            .unwrap_or_else(|| "public".to_owned());
    }
}
