//! The seam between container formats and the extraction pipeline.

use crate::error::Result;
use crate::order::reading_order;
use crate::types::{Comment, Presentation, ShapeRef, Slide, TextBlock};

/// Typed access to the parts of a presentation container.
///
/// Slide indices are 0-based and follow presentation order.
pub trait ContainerReader {
    /// Number of slides in the presentation.
    fn slide_count(&self) -> usize;

    /// Every text-bearing shape on a slide, with its position.
    fn slide_shapes(&mut self, index: usize) -> Result<Vec<ShapeRef>>;

    /// The slide's speaker notes, if it has any.
    fn slide_notes(&mut self, index: usize) -> Result<Option<TextBlock>>;

    /// Comments attached to the slide.
    fn slide_comments(&mut self, index: usize) -> Result<Vec<Comment>>;
}

/// Read a whole presentation, ordering each slide's shapes for reading.
///
/// Comment parts are not touched when `include_comments` is false.
pub fn read_presentation<C: ContainerReader + ?Sized>(
    reader: &mut C,
    filename: &str,
    include_comments: bool,
) -> Result<Presentation> {
    let mut presentation = Presentation::new(filename);

    for index in 0..reader.slide_count() {
        let mut slide = Slide::new(index + 1);
        slide.blocks = reading_order(reader.slide_shapes(index)?);
        slide.notes = reader.slide_notes(index)?;
        if include_comments {
            slide.comments = reader.slide_comments(index)?;
        }

        log::debug!(
            "Slide {}: {} blocks, notes: {}, {} comments",
            slide.number,
            slide.blocks.len(),
            slide.notes.is_some(),
            slide.comments.len()
        );

        presentation.add_slide(slide);
    }

    Ok(presentation)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory reader over pre-built slides.
    struct FakeReader {
        shapes: Vec<Vec<ShapeRef>>,
        comment_reads: usize,
    }

    impl ContainerReader for FakeReader {
        fn slide_count(&self) -> usize {
            self.shapes.len()
        }

        fn slide_shapes(&mut self, index: usize) -> Result<Vec<ShapeRef>> {
            Ok(self.shapes[index].clone())
        }

        fn slide_notes(&mut self, index: usize) -> Result<Option<TextBlock>> {
            Ok((index == 0).then(|| TextBlock::from_iter(["note"])))
        }

        fn slide_comments(&mut self, _index: usize) -> Result<Vec<Comment>> {
            self.comment_reads += 1;
            Ok(vec![Comment::new("Bob", None, TextBlock::from_iter(["hi"]))])
        }
    }

    fn fake() -> FakeReader {
        FakeReader {
            shapes: vec![
                vec![
                    ShapeRef::new(100, 0, 0, TextBlock::from_iter(["body"])),
                    ShapeRef::new(0, 0, 1, TextBlock::from_iter(["title"])),
                ],
                vec![ShapeRef::new(0, 0, 0, TextBlock::from_iter(["second"]))],
            ],
            comment_reads: 0,
        }
    }

    #[test]
    fn test_read_presentation_orders_and_numbers_slides() {
        let mut reader = fake();
        let presentation = read_presentation(&mut reader, "deck.pptx", true).unwrap();

        assert_eq!(presentation.slides.len(), 2);
        assert_eq!(presentation.slides[0].number, 1);
        assert_eq!(presentation.slides[0].body_lines(), vec!["title", "body"]);
        assert_eq!(presentation.slides[0].notes, Some(TextBlock::from_iter(["note"])));
        assert_eq!(presentation.slides[1].notes, None);
        assert_eq!(presentation.slides[1].comments.len(), 1);
    }

    #[test]
    fn test_comments_not_read_when_excluded() {
        let mut reader = fake();
        let presentation = read_presentation(&mut reader, "deck.pptx", false).unwrap();

        assert_eq!(reader.comment_reads, 0);
        assert!(presentation.slides.iter().all(|s| s.comments.is_empty()));
    }
}
