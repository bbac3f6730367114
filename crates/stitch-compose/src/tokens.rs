//! `_TOKEN_` substitution against page metadata.
//!
//! Tokens come from the page's manifest-declared token map plus the built-in
//! `PATH` and `TITLE` names. An optional role prefix selects which page a
//! token refers to, e.g. `_PARENT_TITLE_` for the nearest ancestor.

use stitch_dom::{Element, Node, parse_fragment, serialize_children};
use stitch_site::Page;

use crate::ComposeError;
use crate::composer::NAVIGATION;

/// Replace every token of `page` in `text`.
///
/// Token names are matched in their uppercased form: a manifest token
/// `blurb` is written as `_BLURB_` (or `_PARENT_BLURB_` with a prefix).
/// Unprefixed matching never touches the tail of a `_PARENT_*_` token.
#[must_use]
pub fn substitute(text: &str, page: &Page, prefix: Option<&str>) -> String {
    let mut out = text.to_owned();
    for (name, value) in &page.tokens {
        out = replace_token(&out, &token(prefix, &name.to_uppercase()), value, prefix);
    }
    out = replace_token(&out, &token(prefix, "PATH"), &page.path, prefix);
    replace_token(&out, &token(prefix, "TITLE"), &page.title, prefix)
}

fn token(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("_{prefix}_{name}_"),
        None => format!("_{name}_"),
    }
}

/// Replace `token` with `value`. An unprefixed token shares its spelling
/// with the tail of its `_PARENT_*_` form, so those occurrences are left
/// for the prefixed pass.
fn replace_token(text: &str, token: &str, value: &str, prefix: Option<&str>) -> String {
    if prefix.is_some() {
        return text.replace(token, value);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(token) {
        out.push_str(&rest[..pos]);
        if out.ends_with("_PARENT") {
            out.push_str(token);
        } else {
            out.push_str(value);
        }
        rest = &rest[pos + token.len()..];
    }
    out.push_str(rest);
    out
}

/// Replace parent-page and current-page tokens over a document text.
///
/// The `PARENT`-prefixed pass runs first so the unprefixed pass only ever
/// sees tokens that belong to the current page.
#[must_use]
pub fn substitute_document(text: &str, page: &Page, parent: Option<&Page>) -> String {
    let mut out = text.to_owned();
    if let Some(parent) = parent {
        out = substitute(&out, parent, Some("PARENT"));
    }
    substitute(&out, page, None)
}

/// Replace document-level tokens across a parsed tree.
///
/// Subtrees carrying a navigation directive are left untouched: their item
/// templates keep `_PATH_`/`_TITLE_` for per-page expansion.
pub fn substitute_tree(
    el: &mut Element,
    page: &Page,
    parent: Option<&Page>,
) -> Result<(), ComposeError> {
    if el.attr(NAVIGATION).is_some() {
        return Ok(());
    }
    for value in el.attr_values_mut() {
        *value = substitute_document(value, page, parent);
    }
    let mut children = Vec::with_capacity(el.children.len());
    for child in std::mem::take(&mut el.children) {
        match child {
            Node::Text(text) => {
                let replaced = substitute_document(&text, page, parent);
                if replaced != text && replaced.contains('<') {
                    children.extend(parse_fragment(&replaced).map_err(|e| {
                        ComposeError::Format(format!(
                            "token expansion produced invalid markup: {e}"
                        ))
                    })?);
                } else {
                    children.push(Node::Text(replaced));
                }
            }
            Node::Element(mut inner) => {
                substitute_tree(&mut inner, page, parent)?;
                children.push(Node::Element(inner));
            }
            other => children.push(other),
        }
    }
    el.children = children;
    Ok(())
}

/// Run unprefixed substitution over an element's attribute values and its
/// serialized inner content.
///
/// The inner content is serialized, substituted and reparsed, so tokens may
/// expand to markup.
pub fn apply_to_element(el: &mut Element, page: &Page) -> Result<(), ComposeError> {
    for value in el.attr_values_mut() {
        *value = substitute(value, page, None);
    }
    let inner = serialize_children(&el.children);
    let replaced = substitute(&inner, page, None);
    if replaced != inner {
        el.children = parse_fragment(&replaced)
            .map_err(|e| ComposeError::Format(format!("token expansion produced invalid markup: {e}")))?;
    }
    Ok(())
}
