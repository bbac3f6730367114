//! Element-tree model for the stitch site generator.
//!
//! Provides the document abstraction the composition engine works on:
//! - [`Document`] / [`Element`] / [`Node`] — an ordered tree with tags,
//!   insertion-ordered attributes and interleaved text nodes
//! - [`BranchPath`] — a node position expressed as child indices from a
//!   reference root, used both for template indexing and as the handle type
//!   for tree mutation
//! - [`TemplateIndex`] — recognized structural tags mapped to their first
//!   pre-order position inside a template tree
//!
//! Parsing expects well-formed XHTML-style markup (void elements
//! self-closed). Lenient tag-soup recovery is out of scope; malformed input
//! is reported as a [`ParseError`] so callers can fail fast per fragment.

mod branch;
mod node;
mod parser;
mod serializer;

pub use branch::{BranchPath, TemplateIndex, is_recognized_tag};
pub use node::{Element, Node};
pub use parser::{Document, ParseError, parse_fragment};
pub use serializer::serialize_children;
