//! Document composition engine for the stitch site generator.
//!
//! Pages are declared in a manifest (`stitch-site`) and composed from
//! markup or markdown fragments: fragments are transcluded into the page,
//! optionally restructured through a template ([`merge`]), navigation menus
//! and tables of contents are generated, tokens are substituted, and
//! resource paths are rewritten to the build root. [`Composer`] drives the
//! whole pipeline per page.

mod composer;
mod error;
pub mod markdown;
pub mod merge;
pub mod navigation;
mod paths;
mod source;
pub mod toc;
pub mod tokens;

pub use composer::{Composer, INSERT_SRC, NAVIGATION, TEMPLATE, TOC};
pub use error::ComposeError;
pub use paths::{INDEX_FILE, PathRewriter};
pub use source::{FragmentSource, FsSource, MemorySource};
