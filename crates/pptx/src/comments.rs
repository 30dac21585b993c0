//! Slide comments and their authors.
//!
//! Two layouts exist in the wild:
//!
//! - legacy `p:cmLst` parts with a numeric `authorId`, a `dt` timestamp and
//!   the text in `p:text`, authors in `ppt/commentAuthors.xml`;
//! - modern threaded `p188:cmLst` parts with a GUID `authorId`, a `created`
//!   timestamp and the text in a DrawingML `p188:txBody`, authors in
//!   `ppt/authors.xml`. Replies are nested inside their parent comment.
//!
//! Both are read by the same walk since the local names line up.

use crate::xml::{attr, local_name, xml_error};
use chrono::{DateTime, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use xtract_core::Result;

/// A comment as stored in the part, before author lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RawComment {
    pub author_id: String,
    pub created: Option<String>,
    pub lines: Vec<String>,
}

#[derive(Debug, Default)]
struct CommentBuilder {
    /// Position of the opening tag among all comments, for output order.
    order: usize,
    comment: RawComment,
    paragraph: Option<String>,
    in_text: bool,
}

impl CommentBuilder {
    fn start(order: usize, e: &BytesStart) -> Self {
        Self {
            order,
            comment: RawComment {
                author_id: attr(e, b"authorId").unwrap_or_default(),
                created: attr(e, b"dt").or_else(|| attr(e, b"created")),
                lines: Vec::new(),
            },
            paragraph: None,
            in_text: false,
        }
    }

    fn end_paragraph(&mut self) {
        if let Some(line) = self.paragraph.take() {
            self.comment.lines.push(line);
        }
    }
}

/// Parse every comment in a comments part, replies after their parent.
pub(crate) fn parse_comments(xml: &str, part: &str) -> Result<Vec<RawComment>> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<CommentBuilder> = Vec::new();
    let mut done: Vec<(usize, RawComment)> = Vec::new();
    let mut started = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"cm" | b"reply" => {
                    open.push(CommentBuilder::start(started, e));
                    started += 1;
                }
                // Legacy plain-text body: one element holding the whole text.
                b"text" | b"p" => {
                    if let Some(top) = open.last_mut() {
                        top.paragraph = Some(String::new());
                        top.in_text = local_name(e.name().as_ref()) == b"text";
                    }
                }
                b"t" => {
                    if let Some(top) = open.last_mut() {
                        top.in_text = top.paragraph.is_some();
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"cm" | b"reply" => {
                    done.push((started, CommentBuilder::start(started, e).comment));
                    started += 1;
                }
                b"br" => {
                    if let Some(top) = open.last_mut() {
                        top.end_paragraph();
                        top.paragraph = Some(String::new());
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"cm" | b"reply" => {
                    if let Some(mut builder) = open.pop() {
                        builder.end_paragraph();
                        done.push((builder.order, builder.comment));
                    }
                }
                b"text" | b"p" => {
                    if let Some(top) = open.last_mut() {
                        top.end_paragraph();
                        top.in_text = false;
                    }
                }
                b"t" => {
                    if let Some(top) = open.last_mut() {
                        top.in_text = false;
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if let Some(top) = open.last_mut().filter(|b| b.in_text) {
                    let text = e.unescape().map_err(|err| xml_error(part, err))?;
                    if let Some(line) = top.paragraph.as_mut() {
                        line.push_str(&text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
    }

    done.sort_by_key(|(order, _)| *order);
    Ok(done.into_iter().map(|(_, c)| c).collect())
}

/// Parse an authors part into an id → display name map.
///
/// Accepts both `p:cmAuthor` (legacy) and `p188:author` (modern) entries.
pub(crate) fn parse_authors(xml: &str, part: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut authors = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if matches!(local_name(e.name().as_ref()), b"cmAuthor" | b"author") =>
            {
                if let (Some(id), Some(name)) = (attr(e, b"id"), attr(e, b"name")) {
                    authors.entry(id).or_insert(name);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
    }

    Ok(authors)
}

/// Parse a comment timestamp.
///
/// Accepts RFC 3339 (normalized to UTC) and offset-less ISO-8601 with
/// optional fractional seconds.
pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:cmLst xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cm authorId="1" dt="2024-03-05T14:07:31.512" idx="1"><p:pos x="10" y="10"/><p:text>Fix the typo
in the title</p:text></p:cm>
  <p:cm authorId="0" dt="2024-03-06T08:00:00.000" idx="2"><p:pos x="10" y="10"/><p:text>Looks good &amp; ready</p:text></p:cm>
</p:cmLst>"#;

    const MODERN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p188:cmLst xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p188="http://schemas.microsoft.com/office/powerpoint/2018/8/main">
  <p188:cm id="{A}" authorId="{AUTHOR-1}" created="2024-05-01T10:15:00.000Z">
    <pc:sldMkLst xmlns:pc="http://schemas.microsoft.com/office/powerpoint/2013/main/command"><pc:docMk/><pc:sldMk cId="1" sldId="256"/></pc:sldMkLst>
    <p188:replyLst>
      <p188:reply id="{B}" authorId="{AUTHOR-2}" created="2024-05-01T11:00:00.000Z">
        <p188:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>Agreed</a:t></a:r></a:p></p188:txBody>
      </p188:reply>
    </p188:replyLst>
    <p188:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>Shorten </a:t></a:r><a:r><a:t>this</a:t></a:r></a:p><a:p><a:r><a:t>please</a:t></a:r></a:p></p188:txBody>
  </p188:cm>
</p188:cmLst>"#;

    #[test]
    fn test_parse_legacy_comments() {
        let comments = parse_comments(LEGACY, "comment1.xml").unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author_id, "1");
        assert_eq!(comments[0].created.as_deref(), Some("2024-03-05T14:07:31.512"));
        assert_eq!(comments[0].lines, vec!["Fix the typo\nin the title"]);
        assert_eq!(comments[1].lines, vec!["Looks good & ready"]);
    }

    #[test]
    fn test_parse_modern_comments_with_reply() {
        let comments = parse_comments(MODERN, "modernComment_1.xml").unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author_id, "{AUTHOR-1}");
        assert_eq!(comments[0].lines, vec!["Shorten this", "please"]);
        assert_eq!(comments[1].author_id, "{AUTHOR-2}");
        assert_eq!(comments[1].lines, vec!["Agreed"]);
    }

    #[test]
    fn test_parse_authors_both_layouts() {
        let legacy = r#"<p:cmAuthorLst xmlns:p="x"><p:cmAuthor id="0" name="Alice" initials="A" lastIdx="2" clrIdx="0"/><p:cmAuthor id="1" name="Bob" initials="B" lastIdx="1" clrIdx="1"/></p:cmAuthorLst>"#;
        let modern = r#"<p188:authorLst xmlns:p188="x"><p188:author id="{AUTHOR-1}" name="Carol" initials="C" userId="carol@example.com" providerId="AD"/></p188:authorLst>"#;

        let authors = parse_authors(legacy, "commentAuthors.xml").unwrap();
        assert_eq!(authors.get("0").map(String::as_str), Some("Alice"));
        assert_eq!(authors.get("1").map(String::as_str), Some("Bob"));

        let authors = parse_authors(modern, "authors.xml").unwrap();
        assert_eq!(authors.get("{AUTHOR-1}").map(String::as_str), Some("Carol"));
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(
            parse_timestamp("2024-03-05T14:07:31.512").map(|t| t.to_string()),
            Some("2024-03-05 14:07:31.512".to_string())
        );
        assert_eq!(
            parse_timestamp("2024-05-01T10:15:00Z").map(|t| t.to_string()),
            Some("2024-05-01 10:15:00".to_string())
        );
        assert_eq!(
            parse_timestamp("2024-05-01T12:15:00+02:00").map(|t| t.to_string()),
            Some("2024-05-01 10:15:00".to_string())
        );
        assert_eq!(
            parse_timestamp("2024-03-05T14:07:31").map(|t| t.to_string()),
            Some("2024-03-05 14:07:31".to_string())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
