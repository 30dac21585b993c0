//! In-memory PPTX packages for tests.
//!
//! Builds the smallest package the reader accepts: presentation part and
//! relationships, slides, and optionally a layout/master pair, notes
//! slides, legacy and threaded comments, and comment authors. Any generated
//! part can be replaced or left out to model damaged files.

use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const MODERN_REL_NS: &str = "http://schemas.microsoft.com/office/2018/10/relationships";
const MODERN_NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p188="http://schemas.microsoft.com/office/powerpoint/2018/8/main""#;

/// `(author_id, created, text)` of one comment.
type CommentFixture = (String, String, String);

#[derive(Debug, Default)]
struct ThreadFixture {
    comment: CommentFixture,
    replies: Vec<CommentFixture>,
}

#[derive(Debug, Default)]
struct SlideFixture {
    shapes: String,
    notes: Option<String>,
    comments: Vec<CommentFixture>,
    threads: Vec<ThreadFixture>,
}

/// Builder for a test PPTX package.
#[derive(Debug, Default)]
pub struct PackageBuilder {
    slides: Vec<SlideFixture>,
    order: Option<Vec<usize>>,
    layout: Option<String>,
    master: Option<String>,
    authors: Vec<(String, String)>,
    modern_authors: Vec<(String, String)>,
    replaced: Vec<(String, String)>,
    omitted: Vec<String>,
    skip_presentation: bool,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide with one text box at (`top`, `left`) holding the given
    /// `a:p` elements.
    pub fn slide(self, paragraphs: &str, top: i64, left: i64) -> Self {
        self.raw_slide(&[(top, left, paragraphs)])
    }

    /// Add a slide with one text box per `(top, left, paragraphs)` entry.
    pub fn raw_slide(self, boxes: &[(i64, i64, &str)]) -> Self {
        let shapes: String = boxes
            .iter()
            .enumerate()
            .map(|(i, (top, left, paragraphs))| text_box(i + 2, *top, *left, paragraphs))
            .collect();
        self.slide_xml(&shapes)
    }

    /// Add a slide whose shape tree holds exactly this XML.
    pub fn slide_xml(mut self, shapes: &str) -> Self {
        self.slides.push(SlideFixture {
            shapes: shapes.to_string(),
            ..SlideFixture::default()
        });
        self
    }

    /// List slides in `p:sldIdLst` in this order (1-based slide numbers).
    pub fn slide_order(mut self, order: &[usize]) -> Self {
        self.order = Some(order.to_vec());
        self
    }

    /// Shape tree of the layout every slide uses.
    pub fn layout(mut self, shapes: &str) -> Self {
        self.layout = Some(shapes.to_string());
        self
    }

    /// Shape tree of the master behind the layout.
    pub fn master(mut self, shapes: &str) -> Self {
        self.master = Some(shapes.to_string());
        self
    }

    /// Speaker notes for a slide (1-based).
    pub fn notes(mut self, slide: usize, text: &str) -> Self {
        self.slides[slide - 1].notes = Some(text.to_string());
        self
    }

    /// A legacy comment on a slide (1-based).
    pub fn comment(mut self, slide: usize, author_id: &str, dt: &str, text: &str) -> Self {
        self.slides[slide - 1]
            .comments
            .push((author_id.to_string(), dt.to_string(), text.to_string()));
        self
    }

    /// An entry in `ppt/commentAuthors.xml`.
    pub fn author(mut self, id: &str, name: &str) -> Self {
        self.authors.push((id.to_string(), name.to_string()));
        self
    }

    /// A threaded comment on a slide (1-based), with `(author_id, created,
    /// text)` replies.
    pub fn modern_comment(
        mut self,
        slide: usize,
        author_id: &str,
        created: &str,
        text: &str,
        replies: &[(&str, &str, &str)],
    ) -> Self {
        self.slides[slide - 1].threads.push(ThreadFixture {
            comment: (author_id.to_string(), created.to_string(), text.to_string()),
            replies: replies
                .iter()
                .map(|(a, c, t)| (a.to_string(), c.to_string(), t.to_string()))
                .collect(),
        });
        self
    }

    /// An entry in `ppt/authors.xml`.
    pub fn modern_author(mut self, id: &str, name: &str) -> Self {
        self.modern_authors.push((id.to_string(), name.to_string()));
        self
    }

    /// Write `content` in place of the generated part `name`.
    pub fn part(mut self, name: &str, content: &str) -> Self {
        self.replaced.push((name.to_string(), content.to_string()));
        self
    }

    /// Leave the part `name` out while keeping relationships to it.
    pub fn without_part(mut self, name: &str) -> Self {
        self.omitted.push(name.to_string());
        self
    }

    /// Leave out `ppt/presentation.xml`.
    pub fn without_presentation(mut self) -> Self {
        self.skip_presentation = true;
        self
    }

    /// Serialize the package.
    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut put = |name: &str, content: &str| {
            if self.omitted.iter().any(|p| p == name) {
                return;
            }
            let content = self
                .replaced
                .iter()
                .find(|(p, _)| p == name)
                .map_or(content, |(_, c)| c.as_str());
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        };

        put("[Content_Types].xml", CONTENT_TYPES);

        let mut pres_rels = Vec::new();
        let mut id_list = String::new();
        for n in 1..=self.slides.len() {
            pres_rels.push(rel(&format!("rId{}", n + 100), "slide", &format!("slides/slide{}.xml", n)));
        }
        let order: Vec<usize> = self.order.clone().unwrap_or_else(|| (1..=self.slides.len()).collect());
        for (i, n) in order.iter().enumerate() {
            id_list.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, n + 100));
        }
        if !self.authors.is_empty() {
            pres_rels.push(rel("rId1", "commentAuthors", "commentAuthors.xml"));
            let authors: String = self
                .authors
                .iter()
                .map(|(id, name)| {
                    format!(
                        r#"<p:cmAuthor id="{}" name="{}" initials="X" lastIdx="1" clrIdx="0"/>"#,
                        id,
                        escape(name.as_str())
                    )
                })
                .collect();
            put(
                "ppt/commentAuthors.xml",
                &format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:cmAuthorLst {}>{}</p:cmAuthorLst>"#, NS, authors),
            );
        }
        if !self.modern_authors.is_empty() {
            pres_rels.push(modern_rel("rId2", "authors", "authors.xml"));
            let authors: String = self
                .modern_authors
                .iter()
                .map(|(id, name)| {
                    format!(
                        r#"<p188:author id="{}" name="{}" initials="X" userId="{}" providerId="None"/>"#,
                        id,
                        escape(name.as_str()),
                        escape(name.as_str())
                    )
                })
                .collect();
            put(
                "ppt/authors.xml",
                &format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p188:authorLst {}>{}</p188:authorLst>"#, MODERN_NS, authors),
            );
        }
        put("ppt/_rels/presentation.xml.rels", &rels(&pres_rels));

        if !self.skip_presentation {
            put(
                "ppt/presentation.xml",
                &format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {}><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
                    NS, id_list
                ),
            );
        }

        if let Some(layout) = &self.layout {
            put("ppt/slideLayouts/slideLayout1.xml", &sld("sldLayout", layout));
            put(
                "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
                &rels(&[rel("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
            );
        }
        if let Some(master) = &self.master {
            put("ppt/slideMasters/slideMaster1.xml", &sld("sldMaster", master));
        }

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            put(&format!("ppt/slides/slide{}.xml", n), &sld("sld", &slide.shapes));

            let mut slide_rels = Vec::new();
            if self.layout.is_some() {
                slide_rels.push(rel("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"));
            }
            if let Some(notes) = &slide.notes {
                slide_rels.push(rel("rId2", "notesSlide", &format!("../notesSlides/notesSlide{}.xml", n)));
                put(&format!("ppt/notesSlides/notesSlide{}.xml", n), &notes_slide(notes));
            }
            if !slide.comments.is_empty() {
                slide_rels.push(rel("rId3", "comments", &format!("../comments/comment{}.xml", n)));
                let comments: String = slide
                    .comments
                    .iter()
                    .enumerate()
                    .map(|(idx, (author, dt, text))| {
                        format!(
                            r#"<p:cm authorId="{}" dt="{}" idx="{}"><p:pos x="0" y="0"/><p:text>{}</p:text></p:cm>"#,
                            author,
                            dt,
                            idx + 1,
                            escape(text.as_str())
                        )
                    })
                    .collect();
                put(
                    &format!("ppt/comments/comment{}.xml", n),
                    &format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:cmLst {}>{}</p:cmLst>"#, NS, comments),
                );
            }
            if !slide.threads.is_empty() {
                slide_rels.push(modern_rel("rId4", "comments", &format!("../comments/modernComment_{}.xml", n)));
                let threads: String = slide.threads.iter().map(thread).collect();
                put(
                    &format!("ppt/comments/modernComment_{}.xml", n),
                    &format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p188:cmLst {}>{}</p188:cmLst>"#, MODERN_NS, threads),
                );
            }
            put(&format!("ppt/slides/_rels/slide{}.xml.rels", n), &rels(&slide_rels));
        }

        zip.finish().unwrap().into_inner()
    }
}

/// A text box shape at the given position.
pub fn text_box(id: usize, top: i64, left: i64, paragraphs: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="TextBox {}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="1000" cy="500"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
        id, id, left, top, paragraphs
    )
}

/// `a:p` elements, one per line.
pub fn paragraphs(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", escape(*l)))
        .collect()
}

fn sld(root: &str, shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:{root} {ns}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{shapes}</p:spTree></p:cSld></p:{root}>"#,
        root = root,
        ns = NS,
        shapes = shapes
    )
}

fn notes_slide(text: &str) -> String {
    let shapes = format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="4" name="Slide Number"/><p:cNvSpPr/><p:nvPr><p:ph type="sldNum" idx="5"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:fld id="x" type="slidenum"><a:t>1</a:t></a:fld></a:p></p:txBody></p:sp>"#,
        escape(text)
    );
    sld("notes", &shapes)
}

fn rel(id: &str, kind: &str, target: &str) -> String {
    format!(
        r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
        id, REL_NS, kind, target
    )
}

fn modern_rel(id: &str, kind: &str, target: &str) -> String {
    format!(
        r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
        id, MODERN_REL_NS, kind, target
    )
}

/// A `p188:cm` element. Replies come before the parent's own body, as
/// PowerPoint writes them.
fn thread(fixture: &ThreadFixture) -> String {
    let body = |text: &str| {
        format!(
            "<p188:txBody><a:bodyPr/><a:lstStyle/>{}</p188:txBody>",
            paragraphs(&text.lines().collect::<Vec<_>>())
        )
    };
    let replies: String = fixture
        .replies
        .iter()
        .enumerate()
        .map(|(i, (author, created, text))| {
            format!(
                r#"<p188:reply id="{{R{}}}" authorId="{}" created="{}">{}</p188:reply>"#,
                i + 1,
                author,
                created,
                body(text)
            )
        })
        .collect();
    let (author, created, text) = &fixture.comment;
    format!(
        r#"<p188:cm id="{{C}}" authorId="{}" created="{}"><p188:replyLst>{}</p188:replyLst>{}</p188:cm>"#,
        author,
        created,
        replies,
        body(text)
    )
}

fn rels(entries: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        entries.concat()
    )
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/></Types>"#;
