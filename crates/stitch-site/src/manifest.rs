//! Manifest loading and validation.
//!
//! The manifest is a TOML document declaring the page tree:
//!
//! ```toml
//! [[pages]]
//! path = "/index.html"
//! title = "Home"
//! source = "home.html"
//!
//! [pages.tokens]
//! blurb = "Welcome"
//!
//! [[pages.pages]]
//! path = "/docs/index.html"
//! title = "Docs"
//! source = "docs/index.html"
//! ```
//!
//! Nesting under `pages.pages` establishes the parent/child links; the flat
//! page map keyed by path is derived from the tree at load time.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Page;

/// Error raised while loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}")]
    Read {
        /// Manifest file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The manifest is not valid TOML or misses required fields.
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),
    /// Two pages declare the same path.
    #[error("duplicate page path {0}")]
    DuplicatePath(String),
}

/// Error raised when a page reference does not resolve.
#[derive(Debug, thiserror::Error)]
#[error("page {reference} is not declared in the manifest")]
pub struct LookupError {
    /// The unresolved page path.
    pub reference: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPage {
    path: String,
    title: String,
    source: String,
    #[serde(default)]
    tokens: HashMap<String, String>,
    #[serde(default)]
    pages: Vec<RawPage>,
}

/// The immutable page map, keyed by page path.
///
/// Constructed once at load time and only ever read afterwards.
#[derive(Debug, Default)]
pub struct Manifest {
    pages: HashMap<String, Page>,
    order: Vec<String>,
}

impl Manifest {
    /// Load a manifest from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse a manifest from TOML text.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(text)?;
        let mut manifest = Self::default();
        for page in raw.pages {
            manifest.insert_tree(page, None)?;
        }
        Ok(manifest)
    }

    fn insert_tree(&mut self, raw: RawPage, parent: Option<&str>) -> Result<(), ManifestError> {
        if self.pages.contains_key(&raw.path) {
            return Err(ManifestError::DuplicatePath(raw.path));
        }
        let children: Vec<String> = raw.pages.iter().map(|p| p.path.clone()).collect();
        let page = Page {
            path: raw.path.clone(),
            title: raw.title,
            source: raw.source,
            parent: parent.map(str::to_owned),
            children,
            tokens: raw.tokens,
        };
        self.order.push(raw.path.clone());
        self.pages.insert(raw.path.clone(), page);
        for child in raw.pages {
            self.insert_tree(child, Some(&raw.path))?;
        }
        Ok(())
    }

    /// Look up a page by path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Page> {
        self.pages.get(path)
    }

    /// Look up a page by path, failing when it is not declared.
    pub fn require(&self, path: &str) -> Result<&Page, LookupError> {
        self.get(path).ok_or_else(|| LookupError {
            reference: path.to_owned(),
        })
    }

    /// Iterate over pages in declaration order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.order.iter().filter_map(|path| self.pages.get(path))
    }

    /// Number of declared pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the manifest declares no pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Consistency diagnostics.
    ///
    /// These are advisory: the build proceeds regardless, composing the
    /// pages that can be composed.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut diagnostics = Vec::new();
        for page in self.pages() {
            if page.title.is_empty() {
                diagnostics.push(format!("page {} has an empty title", page.path));
            }
            if page.source.is_empty() {
                diagnostics.push(format!("page {} has an empty source", page.path));
            }
            if let Some(parent) = &page.parent
                && !self.pages.contains_key(parent)
            {
                diagnostics.push(format!(
                    "page {} references missing parent {parent}",
                    page.path
                ));
            }
            for child in &page.children {
                if !self.pages.contains_key(child) {
                    diagnostics.push(format!(
                        "page {} references missing child {child}",
                        page.path
                    ));
                }
            }
        }
        diagnostics
    }
}
