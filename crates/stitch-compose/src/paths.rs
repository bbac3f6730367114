//! Rewriting of `href`/`src` values into build-root-relative paths.

use std::path::{Component, Path, PathBuf};

use stitch_dom::Element;

/// The default index file name, collapsed out of rewritten paths.
pub const INDEX_FILE: &str = "index.html";

/// Rewrites resource paths for one page.
///
/// Site-relative paths gain a leading `/`; dot-relative paths are resolved
/// against the source fragment's directory and re-expressed from the
/// working directory. In-page anchors and absolute URLs pass through, and
/// the first `index.html` occurrence is stripped so directory URLs stay
/// canonical.
#[derive(Debug)]
pub struct PathRewriter {
    fragment_dir: PathBuf,
    working_dir: PathBuf,
}

impl PathRewriter {
    /// Create a rewriter for a page whose source fragment lives at
    /// `fragment_path`, relative to `working_dir`.
    #[must_use]
    pub fn new(working_dir: &Path, fragment_path: &Path) -> Self {
        let fragment_dir = fragment_path
            .parent()
            .map_or_else(|| working_dir.to_path_buf(), |dir| working_dir.join(dir));
        Self {
            fragment_dir,
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Rewrite every `href` and `src` attribute in the tree.
    pub fn rewrite_tree(&self, root: &mut Element) {
        let paths = root.find_all(|el| el.attr("href").is_some() || el.attr("src").is_some());
        for path in paths {
            let Some(el) = root.node_at_mut(&path) else {
                continue;
            };
            for name in ["href", "src"] {
                let value = el.attr(name).map(str::to_owned);
                if let Some(value) = value {
                    el.set_attr(name, self.rewrite(&value));
                }
            }
        }
    }

    /// Rewrite a single attribute value.
    #[must_use]
    pub fn rewrite(&self, value: &str) -> String {
        if value.starts_with('#') || is_absolute_url(value) {
            return strip_index(value);
        }
        let rewritten = if value.starts_with('.') {
            let resolved = normalize(&self.fragment_dir.join(value));
            let relative = relative_to(&self.working_dir, &resolved);
            with_leading_slash(&to_url(&relative))
        } else if value.starts_with('/') {
            value.to_owned()
        } else {
            with_leading_slash(value)
        };
        strip_index(&rewritten)
    }
}

fn with_leading_slash(value: &str) -> String {
    if value.starts_with('/') {
        value.to_owned()
    } else {
        format!("/{value}")
    }
}

fn is_absolute_url(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };
    !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
}

/// Remove the first `index.html` occurrence, collapsing the path to its
/// containing directory.
fn strip_index(value: &str) -> String {
    match value.find(INDEX_FILE) {
        Some(pos) => format!("{}{}", &value[..pos], &value[pos + INDEX_FILE.len()..]),
        None => value.to_owned(),
    }
}

/// Resolve `.` and `..` components lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Express `target` relative to `base`, walking up with `..` when needed.
fn relative_to(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<Component<'_>> = base.components().collect();
    let target: Vec<Component<'_>> = target.components().collect();
    let shared = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();
    let mut out = PathBuf::new();
    for _ in shared..base.len() {
        out.push("..");
    }
    for component in &target[shared..] {
        out.push(component);
    }
    out
}

fn to_url(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}
