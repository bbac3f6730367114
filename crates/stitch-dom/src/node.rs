//! Ordered element tree with interleaved text nodes.
//!
//! Attributes keep insertion order and are matched case-sensitively.
//! Child indices count every node (text and comments included) so that a
//! [`BranchPath`](crate::BranchPath) computed during a tree walk stays valid
//! for later lookups.

use crate::BranchPath;

/// A node in the document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// An element with tag, attributes and children.
    Element(Element),
    /// A run of character data.
    Text(String),
    /// A comment, preserved verbatim (without the `<!--`/`-->` delimiters).
    Comment(String),
}

impl Node {
    /// View this node as an element.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// View this node as a mutable element.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// An element: tag name, insertion-ordered attributes, ordered children.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name, lowercase by convention.
    pub tag: String,
    attrs: Vec<(String, String)>,
    /// Ordered child nodes.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Clone the element and its attributes, but none of its children.
    #[must_use]
    pub fn shallow_clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children: Vec::new(),
        }
    }

    /// Get an attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value or appending a new one.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name.to_owned(), value));
        }
    }

    /// Remove an attribute. Returns its value if it was present.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(idx).1)
    }

    /// Iterate over `(name, value)` attribute pairs in insertion order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Mutable iteration over attribute values (names stay fixed).
    pub fn attr_values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.attrs.iter_mut().map(|(_, v)| v)
    }

    /// Whether the `class` attribute contains the given whole token.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|v| v.split_whitespace().any(|t| t == class))
    }

    /// Remove a single class token, dropping the attribute when it empties.
    pub fn remove_class(&mut self, class: &str) {
        let Some(value) = self.attr("class") else {
            return;
        };
        let kept: Vec<&str> = value.split_whitespace().filter(|t| *t != class).collect();
        if kept.is_empty() {
            self.remove_attr("class");
        } else {
            let joined = kept.join(" ");
            self.set_attr("class", joined);
        }
    }

    /// Merge another element's attributes onto this one.
    ///
    /// Non-`class` attributes are copied only when this element does not
    /// already carry them; `class` tokens are unioned, source order first.
    pub fn merge_attrs(&mut self, source: &Element) {
        for (name, value) in source.attrs() {
            if name == "class" {
                let mut tokens: Vec<&str> = self
                    .attr("class")
                    .map(|v| v.split_whitespace().collect())
                    .unwrap_or_default();
                for token in value.split_whitespace() {
                    if !tokens.contains(&token) {
                        tokens.push(token);
                    }
                }
                let joined = tokens.join(" ");
                self.set_attr("class", joined);
            } else if self.attr(name).is_none() {
                self.set_attr(name, value);
            }
        }
    }

    /// First child that is an element, with its child index.
    #[must_use]
    pub fn first_element_child(&self) -> Option<(usize, &Element)> {
        self.children
            .iter()
            .enumerate()
            .find_map(|(i, n)| n.as_element().map(|el| (i, el)))
    }

    /// Concatenated text content of the subtree, in document order.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Append a child node.
    pub fn append(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Element at a child-index path relative to this element.
    ///
    /// The empty path resolves to `self`; a path step landing on a non-element
    /// node resolves to `None`.
    #[must_use]
    pub fn node_at(&self, path: &BranchPath) -> Option<&Element> {
        let mut current = self;
        for idx in path.iter() {
            current = current.children.get(idx)?.as_element()?;
        }
        Some(current)
    }

    /// Mutable element access at a child-index path relative to this element.
    pub fn node_at_mut(&mut self, path: &BranchPath) -> Option<&mut Element> {
        let mut current = self;
        for idx in path.iter() {
            current = current.children.get_mut(idx)?.as_element_mut()?;
        }
        Some(current)
    }

    /// Detach and return the child node addressed by a non-empty path.
    pub fn remove_at(&mut self, path: &BranchPath) -> Option<Node> {
        let (parent_path, last) = path.split_last()?;
        let parent = self.node_at_mut(&parent_path)?;
        if last < parent.children.len() {
            Some(parent.children.remove(last))
        } else {
            None
        }
    }

    /// First descendant element matching the predicate, in pre-order.
    ///
    /// `self` is not considered; the returned path is relative to `self`.
    #[must_use]
    pub fn find_first<F>(&self, pred: F) -> Option<BranchPath>
    where
        F: Fn(&Element) -> bool,
    {
        let mut result = None;
        visit(self, &BranchPath::default(), &mut |el, path| {
            if result.is_none() && pred(el) {
                result = Some(path.clone());
                false
            } else {
                result.is_none()
            }
        });
        result
    }

    /// All descendant elements matching the predicate, in pre-order.
    #[must_use]
    pub fn find_all<F>(&self, pred: F) -> Vec<BranchPath>
    where
        F: Fn(&Element) -> bool,
    {
        let mut result = Vec::new();
        visit(self, &BranchPath::default(), &mut |el, path| {
            if pred(el) {
                result.push(path.clone());
            }
            true
        });
        result
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(inner) => collect_text(inner, out),
            Node::Comment(_) => {}
        }
    }
}

/// Pre-order walk over descendant elements. The visitor returns `false` to
/// stop the walk early.
fn visit<F>(el: &Element, base: &BranchPath, f: &mut F) -> bool
where
    F: FnMut(&Element, &BranchPath) -> bool,
{
    for (i, child) in el.children.iter().enumerate() {
        if let Node::Element(inner) = child {
            let path = base.child(i);
            if !f(inner, &path) || !visit(inner, &path, f) {
                return false;
            }
        }
    }
    true
}
