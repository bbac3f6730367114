//! Tree positions and template indexing.

use std::collections::HashMap;

use crate::{Element, Node};

/// Tags with structural meaning inside a template tree.
///
/// Matching is a static table; anything outside this set never anchors a
/// template merge.
const RECOGNIZED_TAGS: [&str; 15] = [
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "hr", "ol", "ul", "dl", "a", "img", "table",
];

/// Whether a tag participates in template indexing.
#[must_use]
pub fn is_recognized_tag(tag: &str) -> bool {
    matches!(
        tag,
        "h1" | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "p"
            | "br"
            | "hr"
            | "ol"
            | "ul"
            | "dl"
            | "a"
            | "img"
            | "table"
    )
}

/// Position of a node in a tree as child indices from a reference root.
///
/// The empty path denotes the reference node itself. Indices count every
/// child node, text runs included, matching [`Element::node_at`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BranchPath(Vec<usize>);

impl BranchPath {
    /// Number of steps from the reference root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this path denotes the reference root itself.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Child index at a given depth.
    #[must_use]
    pub fn get(&self, depth: usize) -> Option<usize> {
        self.0.get(depth).copied()
    }

    /// Iterate over the child indices, root-first.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Extend the path by one child step.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut items = Vec::with_capacity(self.0.len() + 1);
        items.extend_from_slice(&self.0);
        items.push(index);
        Self(items)
    }

    /// Split off the deepest step. `None` for the empty path.
    #[must_use]
    pub fn split_last(&self) -> Option<(Self, usize)> {
        let (&last, parent) = self.0.split_last()?;
        Some((Self(parent.to_vec()), last))
    }

    /// Keep only the first `depth` steps.
    #[must_use]
    pub fn truncated(&self, depth: usize) -> Self {
        Self(self.0[..depth.min(self.0.len())].to_vec())
    }

    /// Length of the longest common prefix with another path.
    ///
    /// This is the depth of the deepest shared ancestor.
    #[must_use]
    pub fn common_prefix_len(&self, other: &Self) -> usize {
        self.0
            .iter()
            .zip(&other.0)
            .take_while(|(a, b)| a == b)
            .count()
    }
}

impl From<Vec<usize>> for BranchPath {
    fn from(items: Vec<usize>) -> Self {
        Self(items)
    }
}

/// Recognized structural tags mapped to their first pre-order position
/// inside a template tree.
///
/// Built fresh per template use; the first occurrence of a tag wins so the
/// shallowest, earliest structure decides where content anchors.
#[derive(Debug, Default)]
pub struct TemplateIndex {
    branches: HashMap<&'static str, BranchPath>,
}

impl TemplateIndex {
    /// Index a template tree rooted at `template`.
    #[must_use]
    pub fn build(template: &Element) -> Self {
        let mut index = Self::default();
        index.walk(template, &BranchPath::default());
        index
    }

    /// Template position for a tag, if the template declares one.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&BranchPath> {
        self.branches.get(tag)
    }

    /// Whether the template declares a position for the tag.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.branches.contains_key(tag)
    }

    fn walk(&mut self, el: &Element, path: &BranchPath) {
        if let Some(tag) = RECOGNIZED_TAGS.iter().find(|t| **t == el.tag)
            && !self.branches.contains_key(tag)
        {
            self.branches.insert(tag, path.clone());
        }
        for (i, child) in el.children.iter().enumerate() {
            if let Node::Element(inner) = child {
                self.walk(inner, &path.child(i));
            }
        }
    }
}
