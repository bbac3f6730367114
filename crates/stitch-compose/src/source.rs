//! Fragment access behind a trait, so composition can be tested without
//! touching the filesystem.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ComposeError;

/// Read access to fragment files referenced by the manifest and by
/// insertion directives.
///
/// Paths are site-relative: a leading `/` is equivalent to none, and both
/// resolve against the site's working directory.
pub trait FragmentSource {
    /// Read a fragment to a string.
    ///
    /// # Errors
    ///
    /// [`ComposeError::NotFound`] when the fragment does not exist,
    /// [`ComposeError::Io`] when it cannot be read.
    fn read(&self, path: &Path) -> Result<String, ComposeError>;
}

/// Fragment source backed by a directory on disk.
#[derive(Debug)]
pub struct FsSource {
    working_dir: PathBuf,
}

impl FsSource {
    /// Create a source rooted at the site's working directory.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let relative = path.strip_prefix("/").unwrap_or(path);
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.working_dir.join(relative)
        }
    }
}

impl FragmentSource for FsSource {
    fn read(&self, path: &Path) -> Result<String, ComposeError> {
        let full = self.resolve(path);
        if !full.is_file() {
            return Err(ComposeError::NotFound(full));
        }
        fs::read_to_string(&full).map_err(|source| ComposeError::Io { path: full, source })
    }
}

/// In-memory fragment source for tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, String>,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fragment under a site-relative path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl FragmentSource for MemorySource {
    fn read(&self, path: &Path) -> Result<String, ComposeError> {
        let key = path.strip_prefix("/").unwrap_or(path);
        self.files
            .get(key)
            .cloned()
            .ok_or_else(|| ComposeError::NotFound(key.to_path_buf()))
    }
}
