//! Serialization of element trees back to markup text.

use std::fmt::Write as _;

use crate::{Element, Node};

/// Elements that never carry children and serialize self-closed.
const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Serialize a document: doctype (when present) followed by the root tree.
#[must_use]
pub fn serialize_document(doctype: Option<&str>, root: &Element) -> String {
    let mut out = String::new();
    if let Some(doctype) = doctype {
        let _ = write!(out, "<!DOCTYPE {doctype}>");
    }
    write_element(&mut out, root);
    out
}

/// Serialize a list of sibling nodes without any wrapping element.
#[must_use]
pub fn serialize_children(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(el) => write_element(out, el),
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
        }
    }
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in el.attrs() {
        let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
    }
    if el.children.is_empty() && is_void(&el.tag) {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        write_node(out, child);
    }
    let _ = write!(out, "</{}>", el.tag);
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
