//! Part relationships (`_rels/*.rels`).

use crate::xml::{attr, local_name, xml_error};
use quick_xml::events::Event;
use quick_xml::Reader;
use xtract_core::Result;

/// One relationship from a source part to a target part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Package path of the target, without a leading slash.
    pub target: String,
}

impl Relationship {
    /// Whether the relationship type ends in `/<kind>`.
    pub fn is(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit_once('/')
            .is_some_and(|(_, last)| last == kind)
    }
}

/// All internal relationships of one part, in file order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    /// Parse a `.rels` part belonging to `source_part`.
    ///
    /// Targets are resolved to package paths; external targets are dropped.
    pub fn parse(xml: &str, source_part: &str) -> Result<Self> {
        let rels_part = rels_path(source_part);
        let mut reader = Reader::from_str(xml);
        let mut rels = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"Relationship" =>
                {
                    if attr(e, b"TargetMode").is_some_and(|m| m == "External") {
                        continue;
                    }

                    let (Some(id), Some(rel_type), Some(target)) =
                        (attr(e, b"Id"), attr(e, b"Type"), attr(e, b"Target"))
                    else {
                        log::warn!("Skipping incomplete relationship in '{}'", rels_part);
                        continue;
                    };

                    rels.push(Relationship {
                        id,
                        rel_type,
                        target: resolve_target(source_part, &target),
                    });
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(xml_error(&rels_part, e)),
                _ => {}
            }
        }

        Ok(Self { rels })
    }

    pub fn by_id(&self, id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.id == id)
    }

    pub fn of_kind<'a, 'k>(&'a self, kind: &'k str) -> impl Iterator<Item = &'a Relationship> + 'k
    where
        'a: 'k,
    {
        self.rels.iter().filter(move |r| r.is(kind))
    }

    /// Target of the first relationship of the given kind.
    pub fn target_of_kind(&self, kind: &str) -> Option<&str> {
        self.rels.iter().find(|r| r.is(kind)).map(|r| r.target.as_str())
    }
}

/// Path of the relationships part for a given part.
///
/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`
pub(crate) fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the folder of its source part.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments" Target="../comments/comment1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide1.xml"/>
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout2.xml"/>
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn test_rels_path() {
        assert_eq!(rels_path("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(rels_path("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../notesSlides/notesSlide1.xml"),
            "ppt/notesSlides/notesSlide1.xml"
        );
        assert_eq!(resolve_target("ppt/presentation.xml", "slides/slide2.xml"), "ppt/slides/slide2.xml");
        assert_eq!(resolve_target("ppt/slides/slide1.xml", "/ppt/media/a.png"), "ppt/media/a.png");
        assert_eq!(resolve_target("ppt/slides/slide1.xml", "./slide2.xml"), "ppt/slides/slide2.xml");
    }

    #[test]
    fn test_parse_resolves_and_filters() {
        let rels = Relationships::parse(SLIDE_RELS, "ppt/slides/slide1.xml").unwrap();

        assert_eq!(rels.target_of_kind("notesSlide"), Some("ppt/notesSlides/notesSlide1.xml"));
        assert_eq!(rels.target_of_kind("slideLayout"), Some("ppt/slideLayouts/slideLayout2.xml"));
        assert_eq!(rels.of_kind("comments").count(), 1);
        assert!(rels.by_id("rId4").is_none());
        assert_eq!(rels.by_id("rId3").map(|r| r.target.as_str()), Some("ppt/comments/comment1.xml"));
    }

    #[test]
    fn test_target_outlives_kind_argument() {
        let rels = Relationships::parse(SLIDE_RELS, "ppt/slides/slide1.xml").unwrap();

        let target = {
            let kind = String::from("comments");
            rels.target_of_kind(&kind)
        };
        assert_eq!(target, Some("ppt/comments/comment1.xml"));
        assert_eq!(rels.target_of_kind("handoutMaster"), None);
    }

    #[test]
    fn test_kind_matches_last_segment_only() {
        let rel = Relationship {
            id: "rId1".into(),
            rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout".into(),
            target: String::new(),
        };
        assert!(rel.is("slideLayout"));
        assert!(!rel.is("slide"));
    }
}
