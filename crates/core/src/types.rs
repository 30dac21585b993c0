//! Domain types for representing extracted presentation content.

use chrono::NaiveDateTime;

/// An entire presentation with its extracted content.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    /// Original filename (without path).
    pub filename: String,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create an empty presentation for the given filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Filename without its extension, used as the document title.
    pub fn stem(&self) -> &str {
        self.filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(&self.filename)
    }
}

/// A single slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Body text, one block per shape, in reading order.
    pub blocks: Vec<TextBlock>,

    /// Speaker notes for this slide.
    pub notes: Option<TextBlock>,

    /// Comments attached to this slide.
    pub comments: Vec<Comment>,
}

impl Slide {
    /// Create a new empty slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            blocks: Vec::new(),
            notes: None,
            comments: Vec::new(),
        }
    }

    /// Get all body lines of this slide, flattened.
    pub fn body_lines(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter().map(String::as_str))
            .collect()
    }
}

/// The full text of one shape, note, or comment.
///
/// Each entry in `lines` is one source line; paragraph ends and explicit
/// breaks in the source become separate lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub lines: Vec<String>,
}

impl TextBlock {
    /// Create a block from already-split lines.
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Whether the block has no non-blank line.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

impl<S: Into<String>> FromIterator<S> for TextBlock {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A text-bearing shape together with its position on the slide.
///
/// Positions are in EMU (the container's native unit). Only the relative
/// order matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeRef {
    /// Distance from the top edge of the slide.
    pub top: i64,

    /// Distance from the left edge of the slide.
    pub left: i64,

    /// Index of the shape among the slide's text-bearing shapes, in
    /// document order.
    pub order: usize,

    /// The shape's text.
    pub block: TextBlock,
}

impl ShapeRef {
    pub fn new(top: i64, left: i64, order: usize, block: TextBlock) -> Self {
        Self {
            top,
            left,
            order,
            block,
        }
    }
}

/// A reviewer comment attached to a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Display name of the author.
    pub author: String,

    /// When the comment was made, if the container records it.
    pub timestamp: Option<NaiveDateTime>,

    /// Comment text.
    pub body: TextBlock,
}

impl Comment {
    pub fn new(author: impl Into<String>, timestamp: Option<NaiveDateTime>, body: TextBlock) -> Self {
        Self {
            author: author.into(),
            timestamp,
            body,
        }
    }
}
