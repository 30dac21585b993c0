//! PPTX container reader.

use crate::comments::{parse_authors, parse_comments, parse_timestamp};
use crate::package::Package;
use crate::rels::Relationships;
use crate::shapes::{locate_shapes, LocatedShape, Offset, Placeholder, PlaceholderMap};
use crate::xml::{local_name, prefixed_attr, xml_error};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use xtract_core::{
    read_presentation, Comment, ContainerReader, Presentation, Result, ShapeRef, TextBlock,
    TextNormalizer,
};

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Shown when a comment's author id has no entry in the authors part.
const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Parser for PPTX (Office Open XML) files.
#[derive(Debug, Clone, Default)]
pub struct PptxParser {
    normalizer: TextNormalizer,
}

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a PPTX package for slide-by-slide reading.
    pub fn open<R: Read + Seek>(&self, reader: R) -> Result<PptxContainer<R>> {
        PptxContainer::open(reader, self.normalizer.clone())
    }

    /// Parse a whole PPTX file from a reader.
    pub fn parse<R: Read + Seek>(
        &self,
        reader: R,
        filename: &str,
        include_comments: bool,
    ) -> Result<Presentation> {
        let mut container = self.open(reader)?;
        read_presentation(&mut container, filename, include_comments)
    }
}

/// An opened PPTX package.
pub struct PptxContainer<R> {
    package: Package<R>,
    normalizer: TextNormalizer,
    /// Slide part paths in presentation order.
    slides: Vec<String>,
    /// Placeholder positions of layouts and masters, by part path.
    placeholders: HashMap<String, PlaceholderMap>,
    /// Comment author names by id; loaded on first use.
    authors: Option<HashMap<String, String>>,
}

impl<R: Read + Seek> PptxContainer<R> {
    fn open(reader: R, normalizer: TextNormalizer) -> Result<Self> {
        let mut package = Package::open(reader)?;
        let slides = slide_order(&mut package)?;
        log::debug!("Found {} slides", slides.len());

        Ok(Self {
            package,
            normalizer,
            slides,
            placeholders: HashMap::new(),
            authors: None,
        })
    }

    /// Part path of the slide at `index`.
    fn slide_part(&self, index: usize) -> Result<String> {
        self.slides
            .get(index)
            .cloned()
            .ok_or_else(|| xtract_core::Error::invalid(format!("No slide at index {}", index)))
    }

    /// Target of the first relationship of `kind` from `part`.
    fn related_part(&mut self, part: &str, kind: &str) -> Result<Option<String>> {
        Ok(self.package.rels(part)?.target_of_kind(kind).map(str::to_string))
    }

    /// Position of a placeholder that has no `a:xfrm` of its own.
    ///
    /// Layout first (by idx, then type), then master (by type).
    fn inherited_offset(&mut self, slide_part: &str, ph: &Placeholder) -> Result<Option<Offset>> {
        let Some(layout_part) = self.related_part(slide_part, "slideLayout")? else {
            return Ok(None);
        };

        let (offset, master_kind) = match self.placeholder_map(&layout_part)?.lookup(ph) {
            Some((layout_ph, offset)) => (*offset, layout_ph.master_kind().to_string()),
            None => (None, ph.master_kind().to_string()),
        };
        if offset.is_some() {
            return Ok(offset);
        }

        let Some(master_part) = self.related_part(&layout_part, "slideMaster")? else {
            return Ok(None);
        };

        Ok(self
            .placeholder_map(&master_part)?
            .by_kind(&master_kind)
            .and_then(|(_, offset)| *offset))
    }

    fn placeholder_map(&mut self, part: &str) -> Result<&PlaceholderMap> {
        if !self.placeholders.contains_key(part) {
            let map = match self.package.read_optional_part(part)? {
                Some(xml) => PlaceholderMap::from_shapes(&locate_shapes(&xml, part)?),
                None => {
                    log::warn!("Missing layout part '{}'", part);
                    PlaceholderMap::default()
                }
            };
            self.placeholders.insert(part.to_string(), map);
        }

        Ok(&self.placeholders[part])
    }

    /// Load the authors parts referenced by the presentation.
    fn authors(&mut self) -> Result<&HashMap<String, String>> {
        if self.authors.is_none() {
            let rels = self.package.rels(PRESENTATION_PART)?;
            let mut authors = HashMap::new();

            for part in rels
                .of_kind("commentAuthors")
                .chain(rels.of_kind("authors"))
                .map(|r| r.target.clone())
            {
                let Some(xml) = self.package.read_optional_part(&part)? else {
                    log::warn!("Missing comment authors part '{}'", part);
                    continue;
                };
                match parse_authors(&xml, &part) {
                    Ok(parsed) => {
                        for (id, name) in parsed {
                            authors.entry(id).or_insert(name);
                        }
                    }
                    Err(e) => log::warn!("Could not read comment authors: {}", e),
                }
            }

            self.authors = Some(authors);
        }

        Ok(&*self.authors.get_or_insert_with(HashMap::new))
    }

    fn text_block(&self, lines: &[String]) -> TextBlock {
        self.normalizer.normalize_block(lines)
    }
}

impl<R: Read + Seek> ContainerReader for PptxContainer<R> {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn slide_shapes(&mut self, index: usize) -> Result<Vec<ShapeRef>> {
        let part = self.slide_part(index)?;
        let xml = self.package.read_part(&part)?;
        let located: Vec<LocatedShape> = locate_shapes(&xml, &part)?
            .into_iter()
            .filter(LocatedShape::has_text)
            .collect();

        let mut shapes = Vec::with_capacity(located.len());
        for (order, shape) in located.into_iter().enumerate() {
            let offset = match (shape.offset, &shape.placeholder) {
                (Some(offset), _) => Some(offset),
                (None, Some(ph)) => self.inherited_offset(&part, ph)?,
                (None, None) => None,
            };
            let offset = offset.unwrap_or_else(|| {
                log::debug!("{}: shape {} has no position, using (0, 0)", part, order);
                Offset::default()
            });

            let block = self.text_block(&shape.lines);
            if !block.is_empty() {
                shapes.push(ShapeRef::new(offset.y, offset.x, order, block));
            }
        }

        Ok(shapes)
    }

    fn slide_notes(&mut self, index: usize) -> Result<Option<TextBlock>> {
        let part = self.slide_part(index)?;
        let Some(notes_part) = self.related_part(&part, "notesSlide")? else {
            return Ok(None);
        };

        let Some(xml) = self.package.read_optional_part(&notes_part)? else {
            log::warn!("{} references missing notes part '{}'", part, notes_part);
            return Ok(None);
        };

        let lines: Vec<String> = locate_shapes(&xml, &notes_part)?
            .into_iter()
            .filter(|s| s.placeholder.as_ref().is_some_and(|p| p.kind == "body"))
            .flat_map(|s| s.lines)
            .collect();

        let block = self.text_block(&lines);
        Ok((!block.is_empty()).then_some(block))
    }

    fn slide_comments(&mut self, index: usize) -> Result<Vec<Comment>> {
        let part = self.slide_part(index)?;
        let comment_parts: Vec<String> = self
            .package
            .rels(&part)?
            .of_kind("comments")
            .map(|r| r.target.clone())
            .collect();

        let mut raw = Vec::new();
        for comment_part in comment_parts {
            let Some(xml) = self.package.read_optional_part(&comment_part)? else {
                log::warn!("{} references missing comments part '{}'", part, comment_part);
                continue;
            };
            match parse_comments(&xml, &comment_part) {
                Ok(parsed) => raw.extend(parsed),
                Err(e) => log::warn!("Could not extract comments for {}: {}", part, e),
            }
        }

        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let authors = self.authors()?.clone();
        Ok(raw
            .into_iter()
            .map(|c| {
                let author = authors
                    .get(&c.author_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
                let timestamp = c.created.as_deref().and_then(parse_timestamp);
                Comment::new(author, timestamp, self.text_block(&c.lines))
            })
            .collect())
    }
}

/// Get the ordered list of slide parts.
///
/// Follows `p:sldIdLst` in `ppt/presentation.xml`; when that list is
/// missing, falls back to the slide relationships ordered by number.
fn slide_order<R: Read + Seek>(package: &mut Package<R>) -> Result<Vec<String>> {
    let rels = package.rels(PRESENTATION_PART)?;
    let xml = package.read_part(PRESENTATION_PART)?;

    let listed: Vec<String> = slide_ids(&xml)?
        .iter()
        .filter_map(|id| match rels.by_id(id) {
            Some(rel) if rel.is("slide") => Some(rel.target.clone()),
            _ => {
                log::warn!("Slide id '{}' has no slide relationship", id);
                None
            }
        })
        .collect();

    if !listed.is_empty() {
        return Ok(listed);
    }

    Ok(slides_by_number(&rels))
}

/// The `r:id` of every `p:sldId`, in list order.
fn slide_ids(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                if let Some(id) = prefixed_attr(e, b"id") {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(PRESENTATION_PART, e)),
            _ => {}
        }
    }

    Ok(ids)
}

fn slides_by_number(rels: &Relationships) -> Vec<String> {
    let mut slides: Vec<(String, Option<usize>)> = rels
        .of_kind("slide")
        .map(|r| {
            let order_num = extract_slide_number(&r.target).or_else(|| extract_slide_number(&r.id));
            (r.target.clone(), order_num)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    slides.into_iter().map(|(path, _)| path).collect()
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
