//! Assembles slides into a labeled document tree for the output writers.

use crate::types::{Presentation, Slide, TextBlock};
use chrono::NaiveDateTime;

/// What a block of text is, so writers can label it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockLabel {
    /// Text from a shape on the slide.
    Body,
    /// Speaker notes.
    Notes,
    /// A reviewer comment.
    Comment {
        author: String,
        timestamp: Option<NaiveDateTime>,
    },
}

impl BlockLabel {
    pub fn is_comment(&self) -> bool {
        matches!(self, Self::Comment { .. })
    }
}

/// A text block together with its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledBlock {
    pub label: BlockLabel,
    pub block: TextBlock,
}

/// The assembled content of one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// 1-based slide number.
    pub slide_number: usize,

    /// Body blocks in reading order, then notes, then comments.
    pub blocks: Vec<LabeledBlock>,
}

impl Section {
    /// Blocks with the given kind of label, in order.
    pub fn blocks_where<'a, F>(&'a self, pred: F) -> impl Iterator<Item = &'a LabeledBlock> + 'a
    where
        F: Fn(&BlockLabel) -> bool + 'a,
    {
        self.blocks.iter().filter(move |b| pred(&b.label))
    }
}

/// The whole document handed to an output writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub sections: Vec<Section>,
}

/// Assembler configuration.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Whether comments are emitted.
    pub include_comments: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            include_comments: true,
        }
    }
}

impl AssemblerConfig {
    pub fn with_include_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }
}

/// Turns a [`Presentation`] into a [`Document`].
#[derive(Debug, Clone, Default)]
pub struct TextAssembler {
    config: AssemblerConfig,
}

impl TextAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// Assemble every slide of the presentation, in presentation order.
    pub fn assemble(&self, presentation: &Presentation) -> Document {
        Document {
            title: presentation.stem().to_string(),
            sections: presentation
                .slides
                .iter()
                .map(|s| self.assemble_slide(s))
                .collect(),
        }
    }

    /// Assemble a single slide.
    pub fn assemble_slide(&self, slide: &Slide) -> Section {
        let mut blocks: Vec<LabeledBlock> = slide
            .blocks
            .iter()
            .filter(|b| !b.is_empty())
            .map(|b| LabeledBlock {
                label: BlockLabel::Body,
                block: b.clone(),
            })
            .collect();

        if let Some(notes) = slide.notes.as_ref().filter(|n| !n.is_empty()) {
            blocks.push(LabeledBlock {
                label: BlockLabel::Notes,
                block: notes.clone(),
            });
        }

        if self.config.include_comments {
            blocks.extend(slide.comments.iter().map(|c| LabeledBlock {
                label: BlockLabel::Comment {
                    author: c.author.clone(),
                    timestamp: c.timestamp,
                },
                block: c.body.clone(),
            }));
        }

        Section {
            slide_number: slide.number,
            blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Comment;
    use chrono::NaiveDate;

    fn sample_presentation() -> Presentation {
        let mut slide1 = Slide::new(1);
        slide1.blocks.push(TextBlock::from_iter(["Quarterly Review", "Q3 2024"]));
        slide1.blocks.push(TextBlock::from_iter(["Revenue up", "Costs down"]));
        slide1.notes = Some(TextBlock::from_iter(["Mention the hiring freeze"]));
        slide1.comments.push(Comment::new(
            "Alice",
            NaiveDate::from_ymd_opt(2024, 10, 1).and_then(|d| d.and_hms_opt(9, 30, 0)),
            TextBlock::from_iter(["Add a chart here"]),
        ));

        let mut slide2 = Slide::new(2);
        slide2.blocks.push(TextBlock::from_iter(["Questions?"]));

        let mut presentation = Presentation::new("review.pptx");
        presentation.add_slide(slide1);
        presentation.add_slide(slide2);
        presentation
    }

    #[test]
    fn test_section_order_body_notes_comments() {
        let doc = TextAssembler::default().assemble(&sample_presentation());

        assert_eq!(doc.title, "review");
        assert_eq!(doc.sections.len(), 2);

        let labels: Vec<&BlockLabel> = doc.sections[0].blocks.iter().map(|b| &b.label).collect();
        assert_eq!(labels.len(), 4);
        assert_eq!(labels[0], &BlockLabel::Body);
        assert_eq!(labels[1], &BlockLabel::Body);
        assert_eq!(labels[2], &BlockLabel::Notes);
        assert!(labels[3].is_comment());

        assert_eq!(doc.sections[0].blocks[0].block.lines[0], "Quarterly Review");
        assert_eq!(doc.sections[1].slide_number, 2);
    }

    #[test]
    fn test_exclude_comments_leaves_everything_else() {
        let presentation = sample_presentation();
        let with = TextAssembler::default().assemble(&presentation);
        let without =
            TextAssembler::new(AssemblerConfig::default().with_include_comments(false))
                .assemble(&presentation);

        for (a, b) in with.sections.iter().zip(&without.sections) {
            let kept: Vec<&LabeledBlock> = a.blocks_where(|l| !l.is_comment()).collect();
            let all: Vec<&LabeledBlock> = b.blocks.iter().collect();
            assert_eq!(kept, all);
            assert_eq!(b.blocks_where(BlockLabel::is_comment).count(), 0);
        }
    }

    #[test]
    fn test_comment_label_carries_author_and_time() {
        let doc = TextAssembler::default().assemble(&sample_presentation());
        let comment = doc.sections[0]
            .blocks_where(BlockLabel::is_comment)
            .next()
            .unwrap();

        match &comment.label {
            BlockLabel::Comment { author, timestamp } => {
                assert_eq!(author, "Alice");
                assert_eq!(
                    timestamp.map(|t| t.to_string()).as_deref(),
                    Some("2024-10-01 09:30:00")
                );
            }
            other => panic!("unexpected label {:?}", other),
        }
        assert_eq!(comment.block.lines, vec!["Add a chart here"]);
    }

    #[test]
    fn test_empty_notes_and_blocks_are_skipped() {
        let mut slide = Slide::new(3);
        slide.blocks.push(TextBlock::default());
        slide.blocks.push(TextBlock::from_iter(["kept"]));
        slide.notes = Some(TextBlock::from_iter(["   "]));

        let section = TextAssembler::default().assemble_slide(&slide);
        assert_eq!(section.blocks.len(), 1);
        assert_eq!(section.blocks[0].block.lines, vec!["kept"]);
    }
}
