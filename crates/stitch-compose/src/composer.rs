//! Per-page composition pipeline.
//!
//! For each page: token substitution, recursive fragment insertion, empty
//! table-header cleanup, navigation expansion, table-of-contents
//! generation, spoiler markup, and finally path rewriting. Stages run in
//! that order; every stage works on the same document tree.

use std::path::{Path, PathBuf};

use tracing::debug;

use stitch_dom::{Document, Element, Node};
use stitch_site::{Manifest, Page, PageContext};

use crate::navigation::{NAV_ITEM, NAV_SEP};
use crate::paths::PathRewriter;
use crate::source::FragmentSource;
use crate::{ComposeError, markdown, merge, navigation, toc, tokens};

/// Attribute naming a fragment to transclude.
pub const INSERT_SRC: &str = "data-insert-src";
/// Attribute carrying a navigation directive.
pub const NAVIGATION: &str = "data-navigation";
/// Attribute naming a structural or navigation template.
pub const TEMPLATE: &str = "data-template";
/// Attribute naming the id of the element to summarize.
pub const TOC: &str = "data-toc";

/// Composes pages of one site.
pub struct Composer<'a, S> {
    manifest: &'a Manifest,
    source: &'a S,
    working_dir: PathBuf,
}

impl<'a, S: FragmentSource> Composer<'a, S> {
    /// Create a composer over a loaded manifest and fragment source.
    pub fn new(manifest: &'a Manifest, source: &'a S, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            manifest,
            source,
            working_dir: working_dir.into(),
        }
    }

    /// The manifest this composer builds from.
    #[must_use]
    pub fn manifest(&self) -> &'a Manifest {
        self.manifest
    }

    /// Compose a single page to its final markup.
    ///
    /// # Errors
    ///
    /// Any [`ComposeError`]; failures are scoped to this page and leave the
    /// composer reusable for the next one.
    pub fn compose_page(&self, page: &Page) -> Result<String, ComposeError> {
        let ctx = PageContext::derive(self.manifest, page)?;
        let parent = ctx.parent();

        let mut doc = self.load_document(&page.source, Some((page, parent)))?;
        self.handle_insertion(&mut doc.root, page, parent)?;
        {
            let body = require_body_mut(&mut doc)?;
            handle_table_headers(body);
        }
        self.handle_navigation(&mut doc, &ctx)?;
        {
            let body = require_body_mut(&mut doc)?;
            handle_toc(body)?;
            handle_spoilers(body);
        }
        PathRewriter::new(&self.working_dir, Path::new(&page.source)).rewrite_tree(&mut doc.root);
        Ok(doc.serialize())
    }

    /// Load a fragment as a validated document, converting markdown and
    /// substituting page tokens when a page context is given.
    ///
    /// Tokens are substituted over the parsed tree, not the raw text, so
    /// navigation item templates keep theirs for per-page expansion.
    fn load_document(
        &self,
        path: &str,
        pages: Option<(&Page, Option<&Page>)>,
    ) -> Result<Document, ComposeError> {
        let rel = Path::new(path);
        let text = self.source.read(rel)?;
        let markup = match rel.extension().and_then(|e| e.to_str()) {
            Some("html") => text,
            Some("md") => markdown::to_html(&text),
            _ => {
                return Err(ComposeError::Format(format!(
                    "file format is not supported (path: '{path}')"
                )));
            }
        };
        let mut doc = Document::parse(&markup).map_err(|e| ComposeError::format_at(rel, &e))?;
        doc.require_head().map_err(|e| ComposeError::format_at(rel, &e))?;
        doc.require_body().map_err(|e| ComposeError::format_at(rel, &e))?;
        if let Some((page, parent)) = pages {
            tokens::substitute_tree(&mut doc.root, page, parent)?;
        }
        Ok(doc)
    }

    /// Resolve every insertion directive in the tree, depth-first: an
    /// inserted fragment has its own tokens and insertions handled before
    /// it is merged.
    fn handle_insertion(
        &self,
        root: &mut Element,
        page: &Page,
        parent: Option<&Page>,
    ) -> Result<(), ComposeError> {
        while let Some(path) = root.find_first(|el| el.attr(INSERT_SRC).is_some()) {
            let (src, template_ref) = {
                let el = root.node_at(&path).ok_or_else(lost_directive)?;
                (
                    el.attr(INSERT_SRC).unwrap_or_default().to_owned(),
                    el.attr(TEMPLATE)
                        .filter(|v| !v.is_empty())
                        .map(str::to_owned),
                )
            };
            debug!(src = %src, template = ?template_ref, "inserting fragment");
            let mut fragment = self.load_document(&src, Some((page, parent)))?;
            self.handle_insertion(&mut fragment.root, page, parent)?;
            let content = fragment
                .body_mut()
                .map(|body| std::mem::take(&mut body.children))
                .unwrap_or_default();

            match template_ref {
                None => {
                    let destination = root.node_at_mut(&path).ok_or_else(lost_directive)?;
                    merge::insert_content(content, destination);
                }
                Some(template_path) => {
                    let template_doc = self.load_document(&template_path, None)?;
                    let template = template_doc
                        .body()
                        .ok_or_else(lost_directive)?;
                    let destination = root.node_at_mut(&path).ok_or_else(lost_directive)?;
                    merge::insert_with_template(content, template, destination)?;
                }
            }

            let destination = root.node_at_mut(&path).ok_or_else(lost_directive)?;
            destination.remove_attr(INSERT_SRC);
            destination.remove_attr(TEMPLATE);
        }
        Ok(())
    }

    /// Expand every navigation directive in the body.
    fn handle_navigation(
        &self,
        doc: &mut Document,
        ctx: &PageContext<'a>,
    ) -> Result<(), ComposeError> {
        loop {
            let body = require_body_mut(doc)?;
            let Some(nav_path) = body.find_first(|el| el.attr(NAVIGATION).is_some()) else {
                return Ok(());
            };
            let (directive, template_ref) = {
                let el = body.node_at(&nav_path).ok_or_else(lost_directive)?;
                (
                    el.attr(NAVIGATION).unwrap_or_default().to_owned(),
                    el.attr(TEMPLATE)
                        .filter(|v| !v.is_empty())
                        .map(str::to_owned),
                )
            };
            debug!(directive = %directive, "expanding navigation");

            // An external menu template is cloned into the directive node
            // before the item template is looked up.
            let menu_source = template_ref.clone().unwrap_or_else(|| ctx.page.source.clone());
            if let Some(template_path) = template_ref {
                let mut template_doc = self.load_document(&template_path, None)?;
                let children = template_doc
                    .body_mut()
                    .map(|body| std::mem::take(&mut body.children))
                    .unwrap_or_default();
                let body = require_body_mut(doc)?;
                let nav = body.node_at_mut(&nav_path).ok_or_else(lost_directive)?;
                for child in children {
                    nav.append(child);
                }
                nav.remove_attr(TEMPLATE);
            }

            let (pages, target) = navigation::resolve_target(&directive, self.manifest, ctx)?;

            let body = require_body_mut(doc)?;
            let nav = body.node_at_mut(&nav_path).ok_or_else(lost_directive)?;
            let separator = nav
                .find_first(|el| el.has_class(NAV_SEP))
                .and_then(|p| nav.remove_at(&p))
                .and_then(into_element);
            let Some(item_path) = nav.find_first(|el| el.has_class(NAV_ITEM)) else {
                return Err(ComposeError::Format(format!(
                    "navigation menu does not contain a nav item (path: '{menu_source}')"
                )));
            };
            let item_parent = item_path
                .split_last()
                .map(|(parent, _)| parent)
                .unwrap_or_default();
            let item = nav
                .remove_at(&item_path)
                .and_then(into_element)
                .ok_or_else(lost_directive)?;
            let destination = nav.node_at_mut(&item_parent).ok_or_else(lost_directive)?;
            navigation::expand_list(
                &pages,
                &item,
                destination,
                separator.as_ref(),
                target.as_deref(),
            )?;
            nav.remove_attr(NAVIGATION);
        }
    }
}

fn into_element(node: Node) -> Option<Element> {
    match node {
        Node::Element(el) => Some(el),
        _ => None,
    }
}

fn lost_directive() -> ComposeError {
    ComposeError::Format("directive element vanished during composition".to_owned())
}

fn require_body_mut(doc: &mut Document) -> Result<&mut Element, ComposeError> {
    doc.body_mut()
        .ok_or_else(|| ComposeError::Format("document does not contain a body".to_owned()))
}

/// Drop `thead` elements whose rows carry no header content.
fn handle_table_headers(body: &mut Element) {
    let heads = body.find_all(|el| el.tag == "thead");
    for path in heads.iter().rev() {
        let empty = body.node_at(path).is_some_and(is_table_head_empty);
        if empty {
            body.remove_at(path);
        }
    }
}

fn is_table_head_empty(thead: &Element) -> bool {
    for row_path in thead.find_all(|el| el.tag == "tr") {
        let Some(row) = thead.node_at(&row_path) else {
            continue;
        };
        if !row.find_all(|el| el.tag == "td").is_empty() {
            return false;
        }
        for cell_path in row.find_all(|el| el.tag == "th") {
            if row
                .node_at(&cell_path)
                .is_some_and(|cell| !cell.children.is_empty())
            {
                return false;
            }
        }
    }
    true
}

/// Build a table of contents for every `data-toc` directive.
fn handle_toc(body: &mut Element) -> Result<(), ComposeError> {
    while let Some(dest_path) = body.find_first(|el| el.attr(TOC).is_some()) {
        let target = body
            .node_at(&dest_path)
            .and_then(|el| el.attr(TOC))
            .unwrap_or_default()
            .to_owned();
        debug!(target = %target, "building table of contents");
        let content_path = body
            .find_first(|el| el.attr("id") == Some(target.as_str()))
            .ok_or_else(|| {
                ComposeError::Format(format!(
                    "table of contents target was not found (id: '{target}')"
                ))
            })?;
        toc::build(body, &content_path, &dest_path)?;
        if let Some(el) = body.node_at_mut(&dest_path) {
            el.remove_attr(TOC);
        }
    }
    Ok(())
}

/// Wrap spoiler content for click-to-reveal behavior.
fn handle_spoilers(body: &mut Element) {
    while let Some(path) =
        body.find_first(|el| el.has_class("spoiler") && el.attr("role") != Some("button"))
    {
        let Some(node) = body.node_at_mut(&path) else {
            return;
        };
        let mut hidden = Element::new("span");
        hidden.children = std::mem::take(&mut node.children);
        hidden.set_attr("aria-live", "assertive");
        hidden.set_attr("aria-hidden", "true");
        node.append(Node::Element(hidden));
        node.set_attr("role", "button");
        node.set_attr("title", "Show spoiler");
        node.set_attr("onclick", "spoiler(event)");
        node.set_attr("onkeydown", "spoiler(event)");
        node.set_attr("tabindex", "0");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use stitch_dom::parse_fragment;

    use super::*;
    use crate::source::MemorySource;

    const MANIFEST: &str = r#"
[[pages]]
path = "/index.html"
title = "Home"
source = "home.html"

[[pages.pages]]
path = "/docs/index.html"
title = "Docs"
source = "docs/index.html"

[pages.pages.tokens]
topic = "composition"

[[pages.pages]]
path = "/about.html"
title = "About"
source = "about.html"
"#;

    fn compose(source: &MemorySource, path: &str) -> Result<String, ComposeError> {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let composer = Composer::new(&manifest, source, "/site");
        let page = manifest.get(path).unwrap();
        composer.compose_page(page)
    }

    fn page_doc(body: &str) -> String {
        format!("<html><head><title>t</title></head><body>{body}</body></html>")
    }

    #[test]
    fn test_tokens_substituted_across_document() {
        let mut source = MemorySource::new();
        source.insert(
            "docs/index.html",
            page_doc("<h1>_TITLE_ on _TOPIC_</h1><a href=\"_PARENT_PATH_\">_PARENT_TITLE_</a>"),
        );

        let out = compose(&source, "/docs/index.html").unwrap();

        assert!(out.contains("<h1>Docs on composition</h1>"));
        assert!(out.contains(">Home</a>"));
    }

    #[test]
    fn test_insertion_without_template_appends_fragment_body() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc("<main data-insert-src=\"intro.html\"></main>"),
        );
        source.insert("intro.html", page_doc("<p>welcome</p>"));

        let out = compose(&source, "/index.html").unwrap();

        assert!(out.contains("<main><p>welcome</p></main>"));
        assert!(!out.contains(INSERT_SRC));
    }

    #[test]
    fn test_insertion_is_recursive() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc("<main data-insert-src=\"outer.html\"></main>"),
        );
        source.insert(
            "outer.html",
            page_doc("<div data-insert-src=\"inner.html\"></div>"),
        );
        source.insert("inner.html", page_doc("<p>deep</p>"));

        let out = compose(&source, "/index.html").unwrap();

        assert!(out.contains("<main><div><p>deep</p></div></main>"));
    }

    #[test]
    fn test_insertion_with_structural_template() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc("<main data-insert-src=\"list.html\" data-template=\"card.html\"></main>"),
        );
        source.insert("list.html", page_doc("<h2>A</h2><h2>B</h2>"));
        source.insert(
            "card.html",
            page_doc("<section class=\"card\"><h2></h2></section>"),
        );

        let out = compose(&source, "/index.html").unwrap();

        assert!(out.contains("<section class=\"card\"><h2>A</h2><h2>B</h2></section>"));
        assert!(!out.contains("data-template"));
    }

    #[test]
    fn test_markdown_fragment_is_converted() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc("<main data-insert-src=\"notes.md\"></main>"),
        );
        source.insert("notes.md", "# Notes\n\nsome *text*");

        let out = compose(&source, "/index.html").unwrap();

        assert!(out.contains("<h1>Notes</h1>"));
        assert!(out.contains("<em>text</em>"));
    }

    #[test]
    fn test_unsupported_fragment_extension_is_format_error() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc("<main data-insert-src=\"raw.txt\"></main>"),
        );
        source.insert("raw.txt", "plain");

        let err = compose(&source, "/index.html").unwrap_err();
        assert!(matches!(err, ComposeError::Format(_)));
    }

    #[test]
    fn test_missing_fragment_is_not_found() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc("<main data-insert-src=\"absent.html\"></main>"),
        );

        let err = compose(&source, "/index.html").unwrap_err();
        assert!(matches!(err, ComposeError::NotFound(_)));
    }

    #[test]
    fn test_navigation_expands_siblings() {
        let mut source = MemorySource::new();
        source.insert(
            "docs/index.html",
            page_doc(concat!(
                "<ul data-navigation=\"self\">",
                "<li class=\"nav-sep\">|</li>",
                "<li class=\"nav-item\"><a class=\"nav-link\" href=\"_PATH_\">_TITLE_</a></li>",
                "</ul>"
            )),
        );

        let out = compose(&source, "/docs/index.html").unwrap();

        // Siblings in declared order, separated once, current page marked.
        let docs_pos = out.find(">Docs</a>").unwrap();
        let about_pos = out.find(">About</a>").unwrap();
        assert!(docs_pos < about_pos);
        assert_eq!(out.matches("nav-sep").count(), 1);
        assert!(out.contains("aria-current=\"page\""));
        assert!(!out.contains("data-navigation"));
    }

    #[test]
    fn test_navigation_item_tokens_expand_per_page() {
        let mut source = MemorySource::new();
        source.insert(
            "docs/index.html",
            page_doc(concat!(
                "<h1>_TITLE_</h1>",
                "<ul data-navigation=\"self\">",
                "<li class=\"nav-item\"><a class=\"nav-link\" href=\"_PATH_\">_TITLE_</a></li>",
                "</ul>"
            )),
        );

        let out = compose(&source, "/docs/index.html").unwrap();

        // Page content uses the current page's tokens; the inline item
        // template expands once per sibling with that sibling's tokens.
        assert!(out.contains("<h1>Docs</h1>"));
        assert!(out.contains("href=\"/about.html\">About</a>"));
        assert_eq!(out.matches("aria-current").count(), 1);
    }

    #[test]
    fn test_navigation_with_external_menu_template() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc("<nav data-navigation=\"children\" data-template=\"menu.html\"></nav>"),
        );
        source.insert(
            "menu.html",
            page_doc("<ul><li class=\"nav-item\"><a class=\"nav-link\" href=\"_PATH_\">_TITLE_</a></li></ul>"),
        );

        let out = compose(&source, "/index.html").unwrap();

        assert!(out.contains(">Docs</a>"));
        assert!(out.contains(">About</a>"));
    }

    #[test]
    fn test_navigation_without_item_is_format_error() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc("<nav data-navigation=\"self\"><ul></ul></nav>"),
        );

        let err = compose(&source, "/index.html").unwrap_err();
        assert!(matches!(err, ComposeError::Format(_)));
    }

    #[test]
    fn test_empty_thead_is_removed() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc(concat!(
                "<table><thead><tr><th></th><th></th></tr></thead></table>",
                "<table><thead><tr><th>kept</th></tr></thead></table>"
            )),
        );

        let out = compose(&source, "/index.html").unwrap();

        assert_eq!(out.matches("<thead>").count(), 1);
        assert!(out.contains("kept"));
    }

    #[test]
    fn test_toc_built_from_target_headings() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc(concat!(
                "<aside data-toc=\"guide\"></aside>",
                "<div id=\"guide\"><h2>Install</h2><h2>Use</h2></div>"
            )),
        );

        let out = compose(&source, "/index.html").unwrap();

        assert!(out.contains("<a href=\"#Install\">Install</a>"));
        assert!(out.contains("<h2 id=\"Install\">Install</h2>"));
        assert!(!out.contains("data-toc"));
    }

    #[test]
    fn test_missing_toc_target_is_format_error() {
        let mut source = MemorySource::new();
        source.insert("home.html", page_doc("<aside data-toc=\"nowhere\"></aside>"));

        let err = compose(&source, "/index.html").unwrap_err();
        assert!(matches!(err, ComposeError::Format(_)));
    }

    #[test]
    fn test_spoiler_markup_is_expanded() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc("<span class=\"spoiler\">the twist</span>"),
        );

        let out = compose(&source, "/index.html").unwrap();

        assert!(out.contains("role=\"button\""));
        assert!(out.contains("onclick=\"spoiler(event)\""));
        assert!(out.contains("<span aria-live=\"assertive\" aria-hidden=\"true\">the twist</span>"));
    }

    #[test]
    fn test_paths_rewritten_relative_to_build_root() {
        let mut source = MemorySource::new();
        source.insert(
            "docs/index.html",
            page_doc("<a href=\"docs/setup/index.html\">s</a><img src=\"./img/a.png\"/>"),
        );

        let out = compose(&source, "/docs/index.html").unwrap();

        assert!(out.contains("href=\"/docs/setup/\""));
        assert!(out.contains("src=\"/docs/img/a.png\""));
    }

    #[test]
    fn test_missing_body_is_format_error() {
        let mut source = MemorySource::new();
        source.insert("home.html", "<html><head></head></html>".to_owned());

        let err = compose(&source, "/index.html").unwrap_err();
        assert!(matches!(err, ComposeError::Format(_)));
    }

    #[test]
    fn test_stage_order_navigation_sees_inserted_content() {
        let mut source = MemorySource::new();
        source.insert(
            "home.html",
            page_doc("<div data-insert-src=\"menu-holder.html\"></div>"),
        );
        source.insert(
            "menu-holder.html",
            page_doc(concat!(
                "<ul data-navigation=\"children\">",
                "<li class=\"nav-item\"><a class=\"nav-link\" href=\"_PATH_\">_TITLE_</a></li>",
                "</ul>"
            )),
        );

        let out = compose(&source, "/index.html").unwrap();

        assert!(out.contains(">Docs</a>"));
        assert!(out.contains(">About</a>"));
    }

    #[test]
    fn test_compose_serializes_full_document() {
        let mut source = MemorySource::new();
        source.insert("home.html", page_doc("<p>hi</p>"));

        let out = compose(&source, "/index.html").unwrap();

        assert_eq!(out, page_doc("<p>hi</p>"));
        let reparsed = parse_fragment(&out).unwrap();
        assert_eq!(reparsed.len(), 1);
    }
}
