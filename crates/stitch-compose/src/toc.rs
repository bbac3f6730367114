//! Table-of-contents generation from headings.

use stitch_dom::{BranchPath, Element, Node};

use crate::ComposeError;

/// Heading level for `h1`..`h6` tags, `None` for anything else.
#[must_use]
pub fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Derive a stable anchor id from heading text.
///
/// Slashes become underscores, characters outside `[A-Za-z0-9 _-]` are
/// dropped, whitespace collapses and then turns into underscores.
#[must_use]
pub fn slug(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-')
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace(' ', "_")
}

struct Heading {
    level: usize,
    id: String,
    content: Vec<Node>,
}

/// Build a nested list summarizing the headings under `content_path` and
/// append it to the element at `destination_path`.
///
/// Headings without an `id` get one derived from their text, so the
/// generated links resolve.
pub fn build(
    body: &mut Element,
    content_path: &BranchPath,
    destination_path: &BranchPath,
) -> Result<(), ComposeError> {
    let headings = {
        let content = body
            .node_at_mut(content_path)
            .ok_or_else(|| ComposeError::Format("contents target vanished during composition".to_owned()))?;
        collect_headings(content)
    };

    let destination = body
        .node_at_mut(destination_path)
        .ok_or_else(|| ComposeError::Format("contents destination vanished during composition".to_owned()))?;

    // Built into a scratch root first, then moved, so the open-list stack
    // can hold plain mutable positions.
    let mut scratch = Element::new("nav");
    let mut open_lists: Vec<BranchPath> = vec![BranchPath::default()];
    let mut previous_level = 0;
    for heading in headings {
        if heading.level >= previous_level {
            for _ in previous_level..heading.level {
                open_new_list(&mut scratch, &mut open_lists);
            }
        } else {
            for _ in heading.level..=previous_level {
                open_lists.pop();
            }
            open_new_list(&mut scratch, &mut open_lists);
        }
        let mut link = Element::new("a");
        link.set_attr("href", format!("#{}", heading.id));
        link.children = heading.content;
        let mut item = Element::new("li");
        item.append(Node::Element(link));
        let top = open_lists.last().cloned().unwrap_or_default();
        if let Some(list) = scratch.node_at_mut(&top) {
            list.append(Node::Element(item));
        }
        previous_level = heading.level;
    }

    for node in std::mem::take(&mut scratch.children) {
        destination.append(node);
    }
    Ok(())
}

/// Walk the content subtree in document order, assigning missing ids.
fn collect_headings(content: &mut Element) -> Vec<Heading> {
    let paths = content.find_all(|el| heading_level(&el.tag).is_some());
    let mut headings = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(node) = content.node_at_mut(&path) else {
            continue;
        };
        let Some(level) = heading_level(&node.tag) else {
            continue;
        };
        let id = match node.attr("id") {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => {
                let id = slug(&node.text());
                node.set_attr("id", id.clone());
                id
            }
        };
        headings.push(Heading {
            level,
            id,
            content: node.children.clone(),
        });
    }
    headings
}

fn open_new_list(scratch: &mut Element, open_lists: &mut Vec<BranchPath>) {
    let top = open_lists.last().cloned().unwrap_or_default();
    if let Some(parent) = scratch.node_at_mut(&top) {
        parent.append(Node::Element(Element::new("ul")));
        let opened = top.child(parent.children.len() - 1);
        open_lists.push(opened);
    }
}
