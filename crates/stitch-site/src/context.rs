//! Per-page hierarchy context derived from the manifest.

use crate::{LookupError, Manifest, Page};

/// The hierarchy around one page, computed fresh per composition.
///
/// All page lists preserve the order declared in the manifest.
#[derive(Debug)]
pub struct PageContext<'a> {
    /// The page being composed.
    pub page: &'a Page,
    /// Ancestors in root-first order; empty for a root page.
    pub ancestors: Vec<&'a Page>,
    /// The parent's children in declared order, or just `page` for a root.
    pub siblings_and_self: Vec<&'a Page>,
    /// The page's own children in declared order.
    pub children: Vec<&'a Page>,
}

impl<'a> PageContext<'a> {
    /// Derive the context for a page.
    ///
    /// # Errors
    ///
    /// Fails with a [`LookupError`] when a parent or child reference does
    /// not resolve, which indicates an inconsistent manifest.
    pub fn derive(manifest: &'a Manifest, page: &'a Page) -> Result<Self, LookupError> {
        Ok(Self {
            page,
            ancestors: ancestors_of(manifest, page)?,
            siblings_and_self: siblings_and_self(manifest, page)?,
            children: children_of(manifest, page)?,
        })
    }

    /// The nearest ancestor, when one exists.
    #[must_use]
    pub fn parent(&self) -> Option<&'a Page> {
        self.ancestors.last().copied()
    }
}

/// Ancestors of a page in root-first order.
pub fn ancestors_of<'a>(manifest: &'a Manifest, page: &'a Page) -> Result<Vec<&'a Page>, LookupError> {
    let mut ancestors = Vec::new();
    let mut current = page;
    while let Some(parent_path) = &current.parent {
        let parent = manifest.require(parent_path)?;
        ancestors.push(parent);
        current = parent;
    }
    ancestors.reverse();
    Ok(ancestors)
}

/// The parent's children in declared order, or `[page]` for a root page.
pub fn siblings_and_self<'a>(
    manifest: &'a Manifest,
    page: &'a Page,
) -> Result<Vec<&'a Page>, LookupError> {
    let Some(parent_path) = &page.parent else {
        return Ok(vec![page]);
    };
    let parent = manifest.require(parent_path)?;
    children_of(manifest, parent)
}

/// The page's children in declared order.
pub fn children_of<'a>(manifest: &'a Manifest, page: &'a Page) -> Result<Vec<&'a Page>, LookupError> {
    page.children
        .iter()
        .map(|path| manifest.require(path))
        .collect()
}
