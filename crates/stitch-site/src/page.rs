//! Page metadata as declared by the site manifest.

use std::collections::HashMap;

/// A single page of the site.
///
/// Pages are created once at manifest load and never mutated afterwards.
/// The `path` doubles as the page's unique id and its output route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// Unique id and output route, e.g. `/docs/index.html`.
    pub path: String,
    /// Human-readable title.
    pub title: String,
    /// Fragment reference the page is composed from.
    pub source: String,
    /// Path of the parent page, `None` for roots.
    pub parent: Option<String>,
    /// Paths of child pages, in declared order.
    pub children: Vec<String>,
    /// Page-specific substitution tokens, name to replacement text.
    pub tokens: HashMap<String, String>,
}

impl Page {
    /// Whether the page has a parent.
    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Whether the page declares child pages.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
