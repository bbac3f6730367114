//! Site manifest and page hierarchy for the stitch site generator.
//!
//! The manifest is loaded once into an immutable [`Manifest`] (the page map
//! keyed by path); [`PageContext`] derives the hierarchy around a single
//! page on demand. Nothing here touches fragment content; composition lives
//! in `stitch-compose`.

mod context;
mod manifest;
mod page;

pub use context::{PageContext, ancestors_of, children_of, siblings_and_self};
pub use manifest::{LookupError, Manifest, ManifestError};
pub use page::Page;
