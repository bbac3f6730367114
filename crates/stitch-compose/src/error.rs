//! Composition error taxonomy.

use std::path::PathBuf;

use stitch_dom::ParseError;
use stitch_site::LookupError;

/// Error raised while composing a page.
///
/// Format and lookup errors indicate bad input (malformed fragments,
/// inconsistent manifest references) and are never recovered locally; the
/// build loop catches them at the per-page boundary.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// Malformed fragment or directive: parse failures, missing head or
    /// body, unresolved navigation targets, incomplete navigation menus.
    #[error("{0}")]
    Format(String),
    /// A manifest reference to a page that is not declared.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// A referenced fragment file does not exist.
    #[error("fragment was not found (path: '{}')", .0.display())]
    NotFound(PathBuf),
    /// A fragment file exists but could not be read.
    #[error("failed to read fragment (path: '{}')", path.display())]
    Io {
        /// The fragment path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl ComposeError {
    /// A format error tied to a fragment path.
    pub(crate) fn format_at(path: &std::path::Path, error: &ParseError) -> Self {
        Self::Format(format!("{error} (path: '{}')", path.display()))
    }
}
