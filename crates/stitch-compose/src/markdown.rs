//! Markdown fragments, converted to a full document before composition.
//!
//! Beyond CommonMark with tables and strikethrough, two shorthands are
//! rewritten before conversion:
//! - `>!hidden!<` marks an inline spoiler; it becomes a `span` with the
//!   `spoiler` class, picked up later by the spoiler pass.
//! - a line holding a doubled `-`/`_`/`*` (e.g. `--`) forces an empty
//!   paragraph; the same line ending in `\` forces a line break. These give
//!   authors explicit vertical spacing that plain markdown collapses.

use pulldown_cmark::{Options, Parser, html};

/// Convert markdown text to a complete document (`html`/`head`/`body`).
#[must_use]
pub fn to_html(md: &str) -> String {
    let prepared = preprocess(md);
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(&prepared, options);
    let mut body = String::with_capacity(prepared.len() * 2);
    html::push_html(&mut body, parser);
    format!("<html><head></head><body>{body}</body></html>")
}

fn preprocess(md: &str) -> String {
    let normalized = md.replace("\r\n", "\n").replace('\r', "\n");
    let with_spoilers = normalized
        .replace(">!", "<span class=\"spoiler\">")
        .replace("!<", "</span>");
    let mut out = String::with_capacity(with_spoilers.len());
    for (i, line) in with_spoilers.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match spacing_shorthand(line) {
            Some(Spacing::EmptyLine) => out.push_str("<p></p>"),
            Some(Spacing::LineBreak) => out.push_str("<br />"),
            None => out.push_str(line),
        }
    }
    out
}

enum Spacing {
    EmptyLine,
    LineBreak,
}

/// Recognize `--`, `__` or `**` spacing lines, optionally ending in `\`.
///
/// At most three leading spaces are allowed, mirroring markdown's
/// thematic-break indentation rule.
fn spacing_shorthand(line: &str) -> Option<Spacing> {
    let mut rest = line;
    let mut leading = 0;
    while let Some(stripped) = rest.strip_prefix(' ') {
        rest = stripped;
        leading += 1;
        if leading > 3 {
            return None;
        }
    }
    let marker = rest.chars().next()?;
    if !matches!(marker, '-' | '_' | '*') {
        return None;
    }
    rest = &rest[1..];
    rest = rest.trim_start_matches([' ', '\t']);
    rest = rest.strip_prefix(marker)?;
    rest = rest.trim_start_matches([' ', '\t']);
    if rest.is_empty() {
        return Some(Spacing::EmptyLine);
    }
    rest = rest.strip_prefix('\\')?;
    if rest.trim_start_matches([' ', '\t']).is_empty() {
        Some(Spacing::LineBreak)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_headings_and_paragraphs() {
        let out = to_html("# Title\n\nbody text");

        assert!(out.starts_with("<html><head></head><body>"));
        assert!(out.contains("<h1>Title</h1>"));
        assert!(out.contains("<p>body text</p>"));
    }

    #[test]
    fn test_pipe_tables_are_enabled() {
        let out = to_html("| a | b |\n|---|---|\n| 1 | 2 |");

        assert!(out.contains("<table>"));
        assert!(out.contains("<th>a</th>"));
    }

    #[test]
    fn test_spoiler_shorthand_becomes_span() {
        let out = to_html("the killer is >!the butler!<.");

        assert!(out.contains("<span class=\"spoiler\">the butler</span>"));
    }

    #[test]
    fn test_double_dash_line_forces_empty_paragraph() {
        let out = to_html("above\n\n--\n\nbelow");

        assert!(out.contains("<p></p>"));
        assert!(!out.contains("<hr"));
    }

    #[test]
    fn test_double_dash_with_backslash_forces_line_break() {
        let out = to_html("above\n\n--\\\n\nbelow");

        assert!(out.contains("<br />"));
    }

    #[test]
    fn test_regular_thematic_break_untouched() {
        let out = to_html("above\n\n---\n\nbelow");

        assert!(out.contains("<hr"));
    }

    #[test]
    fn test_spacing_shorthand_rules() {
        assert!(matches!(spacing_shorthand("--"), Some(Spacing::EmptyLine)));
        assert!(matches!(spacing_shorthand("  * *"), Some(Spacing::EmptyLine)));
        assert!(matches!(spacing_shorthand("__ \\"), Some(Spacing::LineBreak)));
        assert!(spacing_shorthand("    --").is_none());
        assert!(spacing_shorthand("-").is_none());
        assert!(spacing_shorthand("-- text").is_none());
    }
}
