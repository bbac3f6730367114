//! Navigation menu expansion.
//!
//! A navigation directive names a set of pages (`self`, `children`,
//! `ancestors`, `ancestorsAndSelf`, or an explicit page path); a `nav-item`
//! template is expanded once per page, with the page's tokens substituted
//! and the current page's `nav-link` marked.

use stitch_dom::{Element, Node};
use stitch_site::{Manifest, Page, PageContext, siblings_and_self};

use crate::tokens;
use crate::ComposeError;

/// Class marking the per-page item template inside a menu.
pub const NAV_ITEM: &str = "nav-item";
/// Class marking the link inside an item that receives `aria-current`.
pub const NAV_LINK: &str = "nav-link";
/// Class marking the element cloned between expanded items.
pub const NAV_SEP: &str = "nav-sep";

/// Resolve a navigation directive to the pages it lists and the path that
/// should be highlighted as current.
pub fn resolve_target<'a>(
    directive: &str,
    manifest: &'a Manifest,
    ctx: &PageContext<'a>,
) -> Result<(Vec<&'a Page>, Option<String>), ComposeError> {
    match directive {
        "self" => Ok((
            ctx.siblings_and_self.clone(),
            Some(ctx.page.path.clone()),
        )),
        "children" => Ok((ctx.children.clone(), None)),
        "ancestors" => Ok((ctx.ancestors.clone(), None)),
        "ancestorsAndSelf" => {
            let mut pages = ctx.ancestors.clone();
            pages.push(ctx.page);
            Ok((pages, Some(ctx.page.path.clone())))
        }
        path => match manifest.get(path) {
            Some(page) => Ok((
                siblings_and_self(manifest, page)?,
                Some(path.to_owned()),
            )),
            None => Err(ComposeError::Format(format!(
                "navigation target is not valid (value: '{directive}')"
            ))),
        },
    }
}

/// Expand the item template once for a page.
///
/// Tokens are substituted over the clone's attributes and inner content;
/// the `nav-link` whose `href` matches `target` is marked with
/// `aria-current`, and a `disabled`-classed link trades its marker class
/// for `aria-disabled`.
pub fn expand_item(
    page: &Page,
    template: &Element,
    target: Option<&str>,
) -> Result<Element, ComposeError> {
    let mut item = template.clone();
    tokens::apply_to_element(&mut item, page)?;
    let link_path = if item.has_class(NAV_LINK) {
        Some(stitch_dom::BranchPath::default())
    } else {
        item.find_first(|el| el.has_class(NAV_LINK))
    };
    if let Some(path) = link_path
        && let Some(link) = item.node_at_mut(&path)
    {
        if link.attr("href").is_some() && link.attr("href") == target {
            link.set_attr("aria-current", "page");
        }
        if link.has_class("disabled") {
            link.set_attr("aria-disabled", "true");
            link.remove_class("disabled");
        }
    }
    Ok(item)
}

/// Expand the item template for every page, in order, appending the items
/// (and separator clones between them) to the destination.
pub fn expand_list(
    pages: &[&Page],
    template: &Element,
    destination: &mut Element,
    separator: Option<&Element>,
    target: Option<&str>,
) -> Result<(), ComposeError> {
    for (i, page) in pages.iter().enumerate() {
        if i > 0
            && let Some(separator) = separator
        {
            destination.append(Node::Element(separator.clone()));
        }
        let item = expand_item(page, template, target)?;
        destination.append(Node::Element(item));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use stitch_dom::{parse_fragment, serialize_children};

    use super::*;

    fn page(path: &str, title: &str) -> Page {
        Page {
            path: path.to_owned(),
            title: title.to_owned(),
            source: format!("src{path}"),
            parent: None,
            children: Vec::new(),
            tokens: HashMap::new(),
        }
    }

    fn item_template(markup: &str) -> Element {
        match parse_fragment(markup).unwrap().into_iter().next().unwrap() {
            Node::Element(el) => el,
            _ => unreachable!(),
        }
    }

    fn manifest() -> Manifest {
        Manifest::parse(
            r#"
[[pages]]
path = "/index.html"
title = "Home"
source = "home.html"

[[pages.pages]]
path = "/docs/index.html"
title = "Docs"
source = "docs.html"

[[pages.pages]]
path = "/about.html"
title = "About"
source = "about.html"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_expand_item_substitutes_tokens() {
        let template =
            item_template("<li class=\"nav-item\"><a class=\"nav-link\" href=\"_PATH_\">_TITLE_</a></li>");
        let item = expand_item(&page("/a.html", "A"), &template, None).unwrap();

        assert_eq!(
            serialize_children(&[Node::Element(item)]),
            "<li class=\"nav-item\"><a class=\"nav-link\" href=\"/a.html\">A</a></li>"
        );
    }

    #[test]
    fn test_expand_item_marks_current_page() {
        let template =
            item_template("<li><a class=\"nav-link\" href=\"_PATH_\">_TITLE_</a></li>");
        let item = expand_item(&page("/a.html", "A"), &template, Some("/a.html")).unwrap();

        let out = serialize_children(&[Node::Element(item)]);
        assert!(out.contains("aria-current=\"page\""));
    }

    #[test]
    fn test_expand_item_leaves_other_pages_unmarked() {
        let template =
            item_template("<li><a class=\"nav-link\" href=\"_PATH_\">_TITLE_</a></li>");
        let item = expand_item(&page("/a.html", "A"), &template, Some("/b.html")).unwrap();

        let out = serialize_children(&[Node::Element(item)]);
        assert!(!out.contains("aria-current"));
    }

    #[test]
    fn test_disabled_class_becomes_aria_attribute() {
        let template =
            item_template("<li><a class=\"nav-link disabled\" href=\"_PATH_\">_TITLE_</a></li>");
        let item = expand_item(&page("/a.html", "A"), &template, None).unwrap();

        let out = serialize_children(&[Node::Element(item)]);
        assert!(out.contains("aria-disabled=\"true\""));
        assert!(out.contains("class=\"nav-link\""));
    }

    #[test]
    fn test_expand_list_inserts_separator_between_items() {
        let template = item_template("<li><a class=\"nav-link\" href=\"_PATH_\">_TITLE_</a></li>");
        let separator = item_template("<li class=\"nav-sep\">|</li>");
        let mut destination = Element::new("ul");
        let a = page("/a.html", "A");
        let b = page("/b.html", "B");
        let c = page("/c.html", "C");

        expand_list(&[&a, &b, &c], &template, &mut destination, Some(&separator), None).unwrap();

        let out = serialize_children(&destination.children);
        assert_eq!(out.matches("nav-sep").count(), 2);
        assert!(out.ends_with("C</a></li>"));
    }

    #[test]
    fn test_expand_list_without_separator() {
        let template = item_template("<li>_TITLE_</li>");
        let mut destination = Element::new("ul");
        let a = page("/a.html", "A");
        let b = page("/b.html", "B");

        expand_list(&[&a, &b], &template, &mut destination, None, None).unwrap();

        assert_eq!(serialize_children(&destination.children), "<li>A</li><li>B</li>");
    }

    #[test]
    fn test_resolve_self_lists_siblings() {
        let manifest = manifest();
        let docs = manifest.get("/docs/index.html").unwrap();
        let ctx = PageContext::derive(&manifest, docs).unwrap();

        let (pages, target) = resolve_target("self", &manifest, &ctx).unwrap();
        let paths: Vec<&str> = pages.iter().map(|p| p.path.as_str()).collect();

        assert_eq!(paths, vec!["/docs/index.html", "/about.html"]);
        assert_eq!(target.as_deref(), Some("/docs/index.html"));
    }

    #[test]
    fn test_resolve_ancestors_and_self() {
        let manifest = manifest();
        let docs = manifest.get("/docs/index.html").unwrap();
        let ctx = PageContext::derive(&manifest, docs).unwrap();

        let (pages, target) = resolve_target("ancestorsAndSelf", &manifest, &ctx).unwrap();
        let paths: Vec<&str> = pages.iter().map(|p| p.path.as_str()).collect();

        assert_eq!(paths, vec!["/index.html", "/docs/index.html"]);
        assert_eq!(target.as_deref(), Some("/docs/index.html"));
    }

    #[test]
    fn test_resolve_explicit_page_path() {
        let manifest = manifest();
        let home = manifest.get("/index.html").unwrap();
        let ctx = PageContext::derive(&manifest, home).unwrap();

        let (pages, target) = resolve_target("/about.html", &manifest, &ctx).unwrap();
        let paths: Vec<&str> = pages.iter().map(|p| p.path.as_str()).collect();

        assert_eq!(paths, vec!["/docs/index.html", "/about.html"]);
        assert_eq!(target.as_deref(), Some("/about.html"));
    }

    #[test]
    fn test_resolve_unknown_target_is_format_error() {
        let manifest = manifest();
        let home = manifest.get("/index.html").unwrap();
        let ctx = PageContext::derive(&manifest, home).unwrap();

        let err = resolve_target("/missing.html", &manifest, &ctx).unwrap_err();
        assert!(matches!(err, ComposeError::Format(_)));
    }
}
