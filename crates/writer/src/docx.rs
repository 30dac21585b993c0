//! Native DOCX writer.
//!
//! Writes a minimal WordprocessingML package: content types, package and
//! document relationships, core properties, styles, bullet numbering and
//! the document body. Every zip entry carries the same fixed timestamp so
//! the same input always yields the same bytes.

use quick_xml::escape::escape;
use std::io::{self, Cursor, Write};
use xtract_core::{BlockLabel, Document, Error, LabeledBlock, Result, Section};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Render a document as DOCX bytes.
pub fn render(doc: &Document) -> Result<Vec<u8>> {
    let document = document_xml(doc);
    let core = core_xml(&doc.title);

    let parts: [(&str, &str); 7] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("docProps/core.xml", core.as_str()),
        ("word/document.xml", document.as_str()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ("word/styles.xml", STYLES),
        ("word/numbering.xml", NUMBERING),
    ];

    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        zip.start_file(name, options).map_err(zip_error)?;
        zip.write_all(content.as_bytes())?;
    }
    let cursor = zip.finish().map_err(zip_error)?;

    Ok(cursor.into_inner())
}

fn zip_error(e: zip::result::ZipError) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::Other, e))
}

fn document_xml(doc: &Document) -> String {
    let mut body = String::new();
    push_paragraph(&mut body, Some("Title"), None, &[doc.title.as_str()]);

    for section in &doc.sections {
        push_section(&mut body, section);
    }

    format!(
        r#"{}<w:document xmlns:w="{}"><w:body>{}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
        XML_DECL, W_NS, body
    )
}

fn push_section(body: &mut String, section: &Section) {
    let heading = format!("Slide {}", section.slide_number);
    push_paragraph(body, Some("Heading1"), None, &[heading.as_str()]);

    for block in section.blocks_where(|l| *l == BlockLabel::Body) {
        push_paragraph(body, None, None, &lines(block));
    }

    for block in section.blocks_where(|l| *l == BlockLabel::Notes) {
        push_paragraph(body, Some("Heading2"), None, &["Speaker Notes"]);
        push_paragraph(body, None, None, &lines(block));
    }

    let mut comments = section.blocks_where(BlockLabel::is_comment).peekable();
    if comments.peek().is_some() {
        push_paragraph(body, Some("Heading2"), None, &["Comments"]);
    }
    for comment in comments {
        if let BlockLabel::Comment { author, timestamp } = &comment.label {
            let mut tail = String::new();
            if let Some(ts) = timestamp {
                tail.push_str(&format!(" ({})", ts.format("%Y-%m-%d %H:%M")));
            }
            tail.push_str(": ");
            push_paragraph(body, Some("ListBullet"), Some((author.as_str(), tail.as_str())), &lines(comment));
        }
    }
}

fn lines(block: &LabeledBlock) -> Vec<&str> {
    block.block.lines.iter().map(String::as_str).collect()
}

/// One `w:p`. `lead` is a bold run plus a plain run placed before the text;
/// lines are separated by `w:br`.
fn push_paragraph(body: &mut String, style: Option<&str>, lead: Option<(&str, &str)>, lines: &[&str]) {
    body.push_str("<w:p>");
    if let Some(style) = style {
        body.push_str(&format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, style));
    }

    if let Some((bold, plain)) = lead {
        body.push_str(&format!(
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r><w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
            escape(bold),
            escape(plain)
        ));
    }

    if !lines.is_empty() {
        body.push_str("<w:r>");
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                body.push_str("<w:br/>");
            }
            body.push_str(&format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape(*line)));
        }
        body.push_str("</w:r>");
    }

    body.push_str("</w:p>");
}

fn core_xml(title: &str) -> String {
    format!(
        r#"{}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title></cp:coreProperties>"#,
        XML_DECL,
        escape(title)
    )
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/><w:lang w:val="en-US"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:b/><w:sz w:val="56"/><w:szCs w:val="56"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="360" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/><w:szCs w:val="26"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:numPr><w:numId w:val="1"/></w:numPr><w:spacing w:after="80"/><w:ind w:left="360" w:hanging="360"/></w:pPr></w:style></w:styles>"#;

const NUMBERING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:abstractNum w:abstractNumId="0"><w:multiLevelType w:val="singleLevel"/><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="360" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num></w:numbering>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_document;
    use std::io::Read;
    use zip::ZipArchive;

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_package_parts() {
        let bytes = render(&sample_document()).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();

        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/numbering.xml",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_document_order_and_styles() {
        let bytes = render(&sample_document()).unwrap();
        let xml = part(&bytes, "word/document.xml");

        let find = |needle: &str| xml.find(needle).unwrap_or_else(|| panic!("missing {}", needle));
        assert!(find(r#"<w:pStyle w:val="Title"/>"#) < find("Slide 1"));
        assert!(find("Quarterly Review") < find("Revenue up 12%"));
        assert!(find("Revenue up 12%") < find("Speaker Notes"));
        assert!(find("Speaker Notes") < find("Mention the hiring freeze"));
        assert!(find("Mention the hiring freeze") < find(r#"<w:pStyle w:val="ListBullet"/>"#));
        assert!(find("Add a chart here") < find("Slide 2"));
        assert!(xml.contains(
            r#"<w:t xml:space="preserve">Quarterly Review</w:t><w:br/><w:t xml:space="preserve">Q3 2024</w:t>"#
        ));
        assert!(xml.contains(r#"<w:b/></w:rPr><w:t xml:space="preserve">Alice</w:t>"#));
        assert!(xml.contains(" (2024-10-01 09:30): "));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut doc = sample_document();
        doc.title = "R&D <draft>".to_string();
        let bytes = render(&doc).unwrap();

        assert!(part(&bytes, "word/document.xml").contains("R&amp;D &lt;draft&gt;"));
        assert!(part(&bytes, "docProps/core.xml").contains("<dc:title>R&amp;D &lt;draft&gt;</dc:title>"));
    }

    #[test]
    fn test_render_is_byte_identical() {
        let doc = sample_document();
        assert_eq!(render(&doc).unwrap(), render(&doc).unwrap());
    }
}
