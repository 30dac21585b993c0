//! Native RTF writer.
//!
//! Plain RTF 1.x with a single font and direct formatting: bold headings,
//! `\line` between the lines of a block, bullet paragraphs for comments.
//! Characters outside ASCII are written as `\uN?` with UTF-16 code units.

use std::io::{self, Write};
use xtract_core::{BlockLabel, Document, LabeledBlock, Result, Section};

/// Half-point font sizes.
const TITLE_SIZE: i32 = 40;
const HEADING1_SIZE: i32 = 32;
const HEADING2_SIZE: i32 = 24;
const BODY_SIZE: i32 = 22;

/// Render a document as RTF bytes.
pub fn render(doc: &Document) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut writer = RtfWriter::new(&mut out);
    writer.write_document(doc)?;
    Ok(out)
}

/// Paragraph-level formatting.
#[derive(Debug, Clone, Copy)]
struct ParagraphFormat {
    size: i32,
    bold: bool,
    space_before: i32,
    space_after: i32,
    bullet: bool,
}

impl ParagraphFormat {
    const fn heading(size: i32, space_before: i32) -> Self {
        Self {
            size,
            bold: true,
            space_before,
            space_after: 120,
            bullet: false,
        }
    }

    const fn body() -> Self {
        Self {
            size: BODY_SIZE,
            bold: false,
            space_before: 0,
            space_after: 160,
            bullet: false,
        }
    }

    const fn bullet() -> Self {
        Self {
            space_after: 60,
            bullet: true,
            ..Self::body()
        }
    }
}

/// RTF serializer over any byte sink.
struct RtfWriter<W: Write> {
    writer: W,
    /// A control word was just written; text must be delimited from it.
    needs_delimiter: bool,
}

impl<W: Write> RtfWriter<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            needs_delimiter: false,
        }
    }

    fn write_document(&mut self, doc: &Document) -> io::Result<()> {
        self.write_document_header()?;

        self.write_paragraph(ParagraphFormat::heading(TITLE_SIZE, 0), None, &[doc.title.as_str()])?;
        for section in &doc.sections {
            self.write_section(section)?;
        }

        self.write_str("}\n")
    }

    fn write_document_header(&mut self) -> io::Result<()> {
        self.write_str("{")?;
        self.write_control_word("rtf", Some(1))?;
        self.write_control_word("ansi", None)?;
        self.write_control_word("ansicpg", Some(1252))?;
        self.write_control_word("deff", Some(0))?;
        self.write_control_word("deftab", Some(720))?;
        self.write_str("{")?;
        self.write_control_word("fonttbl", None)?;
        self.write_str("{")?;
        self.write_control_word("f", Some(0))?;
        self.write_control_word("fswiss", None)?;
        self.write_control_word("fcharset", Some(0))?;
        self.write_text("Calibri;")?;
        self.write_str("}}\n")?;
        self.write_control_word("uc", Some(1))?;
        self.write_str("\n")
    }

    fn write_section(&mut self, section: &Section) -> io::Result<()> {
        let heading = format!("Slide {}", section.slide_number);
        self.write_paragraph(ParagraphFormat::heading(HEADING1_SIZE, 360), None, &[heading.as_str()])?;

        for block in section.blocks_where(|l| *l == BlockLabel::Body) {
            self.write_paragraph(ParagraphFormat::body(), None, &lines(block))?;
        }

        for block in section.blocks_where(|l| *l == BlockLabel::Notes) {
            self.write_paragraph(ParagraphFormat::heading(HEADING2_SIZE, 240), None, &["Speaker Notes"])?;
            self.write_paragraph(ParagraphFormat::body(), None, &lines(block))?;
        }

        let mut comments = section.blocks_where(BlockLabel::is_comment).peekable();
        if comments.peek().is_some() {
            self.write_paragraph(ParagraphFormat::heading(HEADING2_SIZE, 240), None, &["Comments"])?;
        }
        for comment in comments {
            if let BlockLabel::Comment { author, timestamp } = &comment.label {
                let mut tail = String::new();
                if let Some(ts) = timestamp {
                    tail.push_str(&format!(" ({})", ts.format("%Y-%m-%d %H:%M")));
                }
                tail.push_str(": ");
                self.write_paragraph(
                    ParagraphFormat::bullet(),
                    Some((author.as_str(), tail.as_str())),
                    &lines(comment),
                )?;
            }
        }

        Ok(())
    }

    /// One `{\pard ... \par}` group. `lead` is bold text plus plain text
    /// written before the lines.
    fn write_paragraph(&mut self, format: ParagraphFormat, lead: Option<(&str, &str)>, lines: &[&str]) -> io::Result<()> {
        self.write_str("{")?;
        self.write_control_word("pard", None)?;
        if format.bullet {
            self.write_control_word("fi", Some(-360))?;
            self.write_control_word("li", Some(360))?;
        }
        self.write_control_word("sb", Some(format.space_before))?;
        self.write_control_word("sa", Some(format.space_after))?;
        self.write_control_word("fs", Some(format.size))?;
        if format.bold {
            self.write_control_word("b", None)?;
        }

        if format.bullet {
            self.write_control_word("bullet", None)?;
            self.write_control_word("tab", None)?;
        }

        if let Some((bold, plain)) = lead {
            self.write_str("{")?;
            self.write_control_word("b", None)?;
            self.write_text(bold)?;
            self.write_str("}")?;
            self.write_text(plain)?;
        }

        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                self.write_control_word("line", None)?;
            }
            self.write_text(line)?;
        }

        self.write_control_word("par", None)?;
        self.write_str("}\n")
    }

    fn write_control_word(&mut self, word: &str, param: Option<i32>) -> io::Result<()> {
        self.write_str("\\")?;
        self.write_str(word)?;
        if let Some(p) = param {
            write!(self.writer, "{}", p)?;
        }
        self.needs_delimiter = true;
        Ok(())
    }

    /// Write text, escaping RTF syntax characters.
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if self.needs_delimiter {
            self.write_str(" ")?;
        }

        let mut units = [0u16; 2];
        for ch in text.chars() {
            match ch {
                '\\' => self.write_str("\\\\")?,
                '{' => self.write_str("\\{")?,
                '}' => self.write_str("\\}")?,
                '\t' => self.write_str("\\tab ")?,
                c if c.is_ascii() && !c.is_ascii_control() => {
                    write!(self.writer, "{}", c)?;
                }
                c if c.is_ascii() => {}
                c => {
                    // \uN takes a signed 16-bit value; astral characters
                    // go out as a surrogate pair.
                    for unit in c.encode_utf16(&mut units) {
                        write!(self.writer, "\\u{}?", *unit as i16)?;
                    }
                }
            }
        }

        self.needs_delimiter = false;
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.needs_delimiter = false;
        self.writer.write_all(s.as_bytes())
    }
}

fn lines(block: &LabeledBlock) -> Vec<&str> {
    block.block.lines.iter().map(String::as_str).collect()
}
