//! PPTX (Office Open XML) container reader for presentation text extraction.
//!
//! Parses .pptx files, which are ZIP archives of XML parts, into the typed
//! records of [`xtract_core`]: positioned shapes, speaker notes, and
//! comments.

mod comments;
mod package;
pub mod parser;
mod rels;
mod shapes;
mod xml;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use parser::{PptxContainer, PptxParser};
