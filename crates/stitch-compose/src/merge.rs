//! Structural merge of flat content into a template skeleton.
//!
//! A template tree declares, through the positions of its recognized tags,
//! how deep each kind of content element nests. Merging walks the content's
//! top-level nodes in order, finds each element's anchor (the first
//! recognized tag on its first-element-child chain), rebuilds the minimum
//! template skeleton required for that anchor and re-parents the anchor's
//! children onto it. Consecutive elements anchored at the same template
//! position share their wrapper containers; a template element carrying a
//! `<tag>-sep` class is inserted once between consecutive groups.

use stitch_dom::{BranchPath, Element, Node, TemplateIndex};

use crate::ComposeError;

/// Append content nodes to the destination verbatim.
pub fn insert_content(content: Vec<Node>, destination: &mut Element) {
    for node in content {
        destination.append(node);
    }
}

/// Merge content nodes into the destination following the template's
/// structure.
///
/// Content elements without a recognized anchor, as well as top-level text
/// and comments, are appended to the most recently built destination node
/// unchanged.
pub fn insert_with_template(
    content: Vec<Node>,
    template: &Element,
    destination: &mut Element,
) -> Result<(), ComposeError> {
    let index = TemplateIndex::build(template);
    let mut previous_branch = BranchPath::default();
    // Open destination levels, root first, as paths from the destination.
    let mut stack: Vec<BranchPath> = vec![BranchPath::default()];
    let mut previous_destination = BranchPath::default();

    for node in content {
        let Node::Element(mut el) = node else {
            append_at(destination, &previous_destination, node)?;
            continue;
        };

        let Some(anchor) = resolve_anchor(&el, &index) else {
            append_at(destination, &previous_destination, Node::Element(el))?;
            continue;
        };
        let Anchor {
            branch,
            tag: anchor_tag,
            path: anchor_path,
            depth: anchor_index,
        } = anchor;

        let is_same_level = branch == previous_branch;
        let separator_class = format!("{anchor_tag}-sep");
        let separator = template
            .find_first(|e| e.has_class(&separator_class))
            .and_then(|p| template.node_at(&p))
            .cloned();
        let has_separator = separator.is_some() && !previous_branch.is_empty();
        let shared_depth = previous_branch.common_prefix_len(&branch);
        let mut skeleton_from = shared_depth;

        if is_same_level {
            // Close the reused leaf level; its container stays open.
            skeleton_from = skeleton_from.saturating_sub(1);
            stack.pop();
            if anchor_index > 0 {
                // The anchor sits below the element: reproduce the element's
                // own wrapper chain as flat siblings at the open level.
                let top = current_top(&stack);
                for depth in (1..anchor_index).rev() {
                    let wrapper = el
                        .node_at(&anchor_path.truncated(depth))
                        .ok_or_else(invalid_position)?
                        .shallow_clone();
                    append_at(destination, &top, Node::Element(wrapper))?;
                }
                append_at(destination, &top, Node::Element(el.shallow_clone()))?;
            }
            if let Some(separator) = &separator
                && has_separator
            {
                // Unwind to the destination root, place the separator there,
                // then re-open each level as a fresh clone so following
                // siblings never share a wrapper with the separator.
                let popped: Vec<BranchPath> = stack.drain(1..).collect();
                let root = current_top(&stack);
                append_at(destination, &root, Node::Element(separator.clone()))?;
                for old in popped {
                    let clone = destination
                        .node_at(&old)
                        .ok_or_else(invalid_position)?
                        .shallow_clone();
                    let top = current_top(&stack);
                    let reopened = append_at(destination, &top, Node::Element(clone))?;
                    stack.push(reopened);
                }
            }
        } else {
            while stack.len() > shared_depth + 1 {
                stack.pop();
            }
            if let Some(separator) = &separator
                && has_separator
            {
                let top = current_top(&stack);
                append_at(destination, &top, Node::Element(separator.clone()))?;
            }
        }

        previous_destination = current_top(&stack);

        // Rebuild the skeleton from the shared depth down to the anchor's
        // template position.
        for i in skeleton_from..branch.len() {
            let template_node = template
                .node_at(&branch.truncated(i + 1))
                .ok_or_else(invalid_position)?;
            let mut clone = template_node.shallow_clone();
            if i == anchor_index {
                clone.merge_attrs(&el);
            }
            let opened = append_at(destination, &previous_destination, Node::Element(clone))?;
            stack.push(opened.clone());
            previous_destination = opened;
        }

        // Move, not clone, the anchor's children onto the deepest node.
        let anchor_el = el.node_at_mut(&anchor_path).ok_or_else(invalid_position)?;
        for child in std::mem::take(&mut anchor_el.children) {
            append_at(destination, &previous_destination, child)?;
        }

        previous_branch = if anchor_index == 0 {
            branch
        } else {
            branch.truncated(branch.len().saturating_sub(anchor_index + 1))
        };
    }
    Ok(())
}

struct Anchor {
    branch: BranchPath,
    tag: String,
    path: BranchPath,
    depth: usize,
}

/// Walk the first-element-child chain until a tag with a template position
/// is found.
fn resolve_anchor(el: &Element, index: &TemplateIndex) -> Option<Anchor> {
    let mut current = el;
    let mut path = BranchPath::default();
    let mut depth = 0;
    loop {
        if let Some(branch) = index.get(&current.tag) {
            return Some(Anchor {
                branch: branch.clone(),
                tag: current.tag.clone(),
                path,
                depth,
            });
        }
        let (i, child) = current.first_element_child()?;
        path = path.child(i);
        depth += 1;
        current = child;
    }
}

fn current_top(stack: &[BranchPath]) -> BranchPath {
    stack.last().cloned().unwrap_or_default()
}

fn append_at(
    root: &mut Element,
    path: &BranchPath,
    node: Node,
) -> Result<BranchPath, ComposeError> {
    let target = root.node_at_mut(path).ok_or_else(invalid_position)?;
    target.append(node);
    Ok(path.child(target.children.len() - 1))
}

fn invalid_position() -> ComposeError {
    ComposeError::Format("content merge reached an invalid tree position".to_owned())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use stitch_dom::{parse_fragment, serialize_children};

    use super::*;

    fn element(markup: &str) -> Element {
        let mut root = Element::new("body");
        root.children = parse_fragment(markup).unwrap();
        root
    }

    fn merged(content: &str, template: &str) -> String {
        let content = parse_fragment(content).unwrap();
        let template = element(template);
        let mut destination = Element::new("div");
        insert_with_template(content, &template, &mut destination).unwrap();
        serialize_children(&destination.children)
    }

    #[test]
    fn test_insert_content_appends_verbatim() {
        let content = parse_fragment("<p>a</p>text<p>b</p>").unwrap();
        let mut destination = Element::new("div");

        insert_content(content, &mut destination);

        assert_eq!(
            serialize_children(&destination.children),
            "<p>a</p>text<p>b</p>"
        );
    }

    #[test]
    fn test_template_rooted_at_recognized_tag_merges_at_destination_root() {
        // A recognized root indexes at the empty branch, so the first
        // element takes the same-level path immediately and closes the
        // root level; later anchors must still rebuild from the top.
        let content = parse_fragment("<ul><li>x</li></ul><a href=\"#\">z</a>").unwrap();
        let mut template = Element::new("ul");
        template.children = parse_fragment("<a></a>").unwrap();
        let mut destination = Element::new("div");

        insert_with_template(content, &template, &mut destination).unwrap();

        assert_eq!(
            serialize_children(&destination.children),
            "<li>x</li><a href=\"#\">z</a>"
        );
    }

    #[test]
    fn test_unanchored_elements_pass_through() {
        let out = merged("<video>x</video>", "<section><p></p></section>");

        assert_eq!(out, "<video>x</video>");
    }

    #[test]
    fn test_single_element_gains_template_wrappers() {
        let out = merged("<h2>Title</h2>", "<section class=\"card\"><h2></h2></section>");

        assert_eq!(out, "<section class=\"card\"><h2>Title</h2></section>");
    }

    #[test]
    fn test_consecutive_same_tag_share_container() {
        let out = merged(
            "<h2>A</h2><h2>B</h2>",
            "<section class=\"card\"><h2></h2></section>",
        );

        // Both headings reuse one section.
        assert_eq!(out, "<section class=\"card\"><h2>A</h2><h2>B</h2></section>");
    }

    #[test]
    fn test_attrs_merge_onto_walked_anchor_depth() {
        // The anchor is the element itself (depth 0), so its attributes
        // merge onto the first walked template node.
        let out = merged(
            "<h2 id=\"intro\" class=\"big\">A</h2>",
            "<section class=\"card\"><h2></h2></section>",
        );

        assert_eq!(
            out,
            "<section class=\"card big\" id=\"intro\"><h2>A</h2></section>"
        );
    }

    #[test]
    fn test_separator_between_groups() {
        let out = merged(
            "<ul><li>1</li></ul><ul><li>2</li></ul>",
            "<div class=\"group\"><ul></ul></div><hr class=\"ul-sep\"/>",
        );

        assert_eq!(
            out,
            "<div class=\"group\"><ul><li>1</li></ul></div><hr class=\"ul-sep\"/><div class=\"group\"><ul><li>2</li></ul></div>"
        );
    }

    #[test]
    fn test_no_separator_before_first_item() {
        let out = merged(
            "<p>only</p>",
            "<div><p></p></div><hr class=\"p-sep\"/>",
        );

        assert!(!out.contains("p-sep"));
    }

    #[test]
    fn test_anchor_below_element_rebuilds_wrapper_chain() {
        // The section has no template position; its inner p does. The p's
        // children land at the p's template slot, and the merge point resets.
        let out = merged(
            "<section><p>x</p></section>",
            "<article><p></p></article>",
        );

        assert_eq!(out, "<article><p>x</p></article>");
    }

    #[test]
    fn test_same_level_anchor_below_element_clones_wrappers_flat() {
        let out = merged(
            "<p>a</p><section class=\"wrap\"><p>b</p></section><section class=\"wrap\"><p>c</p></section>",
            "<article><p></p></article>",
        );

        // First p opens the article; the wrapped p's anchor shares the same
        // branch, so the section clones appear as flat siblings inside it.
        assert!(out.starts_with("<article><p>a</p>"));
        assert!(out.contains("<section class=\"wrap\"></section>"));
    }

    #[test]
    fn test_deeper_nesting_reuses_shared_ancestors() {
        let out = merged(
            "<h2>A</h2><h2>B</h2>",
            "<div class=\"outer\"><div class=\"inner\"><h2></h2></div></div>",
        );

        assert_eq!(
            out,
            "<div class=\"outer\"><div class=\"inner\"><h2>A</h2><h2>B</h2></div></div>"
        );
    }

    #[test]
    fn test_text_between_items_follows_previous_destination() {
        let out = merged(
            "<h2>A</h2>after",
            "<section><h2></h2></section>",
        );

        // The text lands inside the heading built for the previous element.
        assert_eq!(out, "<section><h2>Aafter</h2></section>");
    }

    #[test]
    fn test_mixed_tags_switch_template_positions() {
        let out = merged(
            "<h2>T</h2><p>body</p>",
            "<header><h2></h2></header><main><p></p></main>",
        );

        assert_eq!(out, "<header><h2>T</h2></header><main><p>body</p></main>");
    }

    #[test]
    fn test_separator_reopens_fresh_wrappers() {
        let out = merged(
            "<ul><li>1</li></ul><ul><li>2</li></ul><ul><li>3</li></ul>",
            "<div class=\"group\"><ul></ul></div><hr class=\"ul-sep\"/>",
        );

        // Three groups, two separators, each group in its own wrapper.
        assert_eq!(out.matches("ul-sep").count(), 2);
        assert_eq!(out.matches("<div class=\"group\">").count(), 3);
    }
}
