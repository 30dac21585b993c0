//! Core domain types, reading-order engine, and document assembly for
//! presentation text extraction.

pub mod assemble;
pub mod container;
pub mod error;
pub mod normalize;
pub mod order;
pub mod types;

pub use assemble::{AssemblerConfig, BlockLabel, Document, LabeledBlock, Section, TextAssembler};
pub use container::{read_presentation, ContainerReader};
pub use error::{Error, Result};
pub use normalize::TextNormalizer;
pub use order::reading_order;
pub use types::{Comment, Presentation, ShapeRef, Slide, TextBlock};
