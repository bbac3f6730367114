//! Markup parsing via quick-xml.
//!
//! Fragments are expected to be well-formed XHTML-style markup: properly
//! nested tags, void elements self-closed. Parse problems surface as
//! [`ParseError`] values carrying the byte offset, so the composer can fail
//! fast on a malformed fragment instead of emitting broken output.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::serializer::serialize_document;
use crate::{Element, Node};

/// Error raised while parsing markup.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Malformed markup (mismatched tags, bad syntax).
    #[error("markup error at offset {offset}: {message}")]
    Syntax {
        /// Byte offset into the input.
        offset: u64,
        /// Underlying parser message.
        message: String,
    },
    /// The input contained no root element.
    #[error("document contains no root element")]
    NoRoot,
    /// The document lacks a `head` element.
    #[error("document does not contain a head")]
    MissingHead,
    /// The document lacks a `body` element.
    #[error("document does not contain a body")]
    MissingBody,
}

/// A parsed markup document: optional doctype plus a single root element.
#[derive(Clone, Debug)]
pub struct Document {
    doctype: Option<String>,
    /// Root element, `html` for complete pages.
    pub root: Element,
}

impl Document {
    /// Parse a complete document.
    ///
    /// Leading text and comments before the root element are discarded; the
    /// doctype is kept for serialization.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let (doctype, nodes) = parse_nodes(text)?;
        let root = nodes
            .into_iter()
            .find_map(|n| match n {
                Node::Element(el) => Some(el),
                _ => None,
            })
            .ok_or(ParseError::NoRoot)?;
        Ok(Self { doctype, root })
    }

    /// Serialize the document back to markup text.
    #[must_use]
    pub fn serialize(&self) -> String {
        serialize_document(self.doctype.as_deref(), &self.root)
    }

    /// The document's `head` element, if present.
    #[must_use]
    pub fn head(&self) -> Option<&Element> {
        self.first_named("head")
    }

    /// The document's `body` element, if present.
    #[must_use]
    pub fn body(&self) -> Option<&Element> {
        self.first_named("body")
    }

    /// Mutable access to the document's `body` element.
    pub fn body_mut(&mut self) -> Option<&mut Element> {
        let path = self.root.find_first(|el| el.tag == "body")?;
        self.root.node_at_mut(&path)
    }

    /// Require a `head` element, per the well-formedness contract.
    pub fn require_head(&self) -> Result<&Element, ParseError> {
        self.head().ok_or(ParseError::MissingHead)
    }

    /// Require a `body` element, per the well-formedness contract.
    pub fn require_body(&self) -> Result<&Element, ParseError> {
        self.body().ok_or(ParseError::MissingBody)
    }

    fn first_named(&self, tag: &str) -> Option<&Element> {
        if self.root.tag == tag {
            return Some(&self.root);
        }
        let path = self.root.find_first(|el| el.tag == tag)?;
        self.root.node_at(&path)
    }
}

/// Parse a markup fragment into a list of top-level nodes.
pub fn parse_fragment(text: &str) -> Result<Vec<Node>, ParseError> {
    let (_, nodes) = parse_nodes(text)?;
    Ok(nodes)
}

fn parse_nodes(text: &str) -> Result<(Option<String>, Vec<Node>), ParseError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut doctype = None;
    // Synthetic fragment root; real elements are pushed on top of it.
    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        let event = reader
            .read_event()
            .map_err(|e| syntax_error(&reader, &e.to_string()))?;
        match event {
            Event::Start(e) => {
                stack.push(element_from(&e)?);
            }
            Event::Empty(e) => {
                let el = element_from(&e)?;
                top(&mut stack).append(Node::Element(el));
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(syntax_error(&reader, "unexpected closing tag"));
                }
                let el = stack.pop().unwrap_or_default();
                top(&mut stack).append(Node::Element(el));
            }
            Event::Text(e) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|e| syntax_error(&reader, &e.to_string()))?;
                append_text(top(&mut stack), &text);
            }
            Event::GeneralRef(e) => {
                let name = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|e| syntax_error(&reader, &e.to_string()))?;
                let decoded = decode_entity(&name);
                append_text(top(&mut stack), &decoded);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                append_text(top(&mut stack), &text);
            }
            Event::Comment(e) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|e| syntax_error(&reader, &e.to_string()))?;
                top(&mut stack).append(Node::Comment(text.into_owned()));
            }
            Event::DocType(e) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|e| syntax_error(&reader, &e.to_string()))?;
                doctype = Some(text.trim().to_owned());
            }
            Event::Decl(_) | Event::PI(_) => {}
            Event::Eof => {
                if stack.len() > 1 {
                    return Err(syntax_error(&reader, "unexpected end of input inside element"));
                }
                let root = stack.pop().unwrap_or_default();
                return Ok((doctype, root.children));
            }
        }
    }
}

fn top(stack: &mut [Element]) -> &mut Element {
    stack.last_mut().expect("parse stack is never empty")
}

fn syntax_error(reader: &Reader<&[u8]>, message: &str) -> ParseError {
    ParseError::Syntax {
        offset: reader.buffer_position(),
        message: message.to_owned(),
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, ParseError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut el = Element::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::Syntax {
            offset: 0,
            message: e.to_string(),
        })?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value).into_owned();
        el.set_attr(&name, decode_entities(&raw));
    }
    Ok(el)
}

fn append_text(el: &mut Element, text: &str) {
    if let Some(Node::Text(prev)) = el.children.last_mut() {
        prev.push_str(text);
    } else {
        el.append(Node::Text(text.to_owned()));
    }
}

/// Decode a single entity reference name (without `&`/`;`).
///
/// Unknown names are kept literally so unusual entities survive a
/// parse/serialize round trip instead of vanishing.
fn decode_entity(name: &str) -> String {
    if let Some(num) = name.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()
        } else {
            num.parse().ok()
        };
        if let Some(ch) = code.and_then(char::from_u32) {
            return ch.to_string();
        }
        return format!("&{name};");
    }
    match name {
        "amp" => "&".to_owned(),
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "quot" => "\"".to_owned(),
        "apos" => "'".to_owned(),
        "nbsp" => "\u{a0}".to_owned(),
        "copy" => "\u{a9}".to_owned(),
        "mdash" => "\u{2014}".to_owned(),
        "ndash" => "\u{2013}".to_owned(),
        "hellip" => "\u{2026}".to_owned(),
        "laquo" => "\u{ab}".to_owned(),
        "raquo" => "\u{bb}".to_owned(),
        _ => format!("&{name};"),
    }
}

/// Decode entity references embedded in attribute text.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        if let Some(end) = tail.find(';')
            && end > 0
            && tail[..end].chars().all(|c| c.is_ascii_alphanumeric() || c == '#')
        {
            out.push_str(&decode_entity(&tail[..end]));
            rest = &tail[end + 1..];
        } else {
            out.push('&');
            rest = tail;
        }
    }
    out.push_str(rest);
    out
}
