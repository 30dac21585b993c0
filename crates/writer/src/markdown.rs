//! Markdown rendering.
//!
//! The same text feeds pandoc, so the layout sticks to constructs every
//! Markdown reader agrees on: ATX headings, bullet lists and thematic
//! breaks. Lines inside a block are separated by a single newline; pandoc
//! is told to treat those as hard breaks.

use crate::wrap::wrap_line;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use xtract_core::{BlockLabel, Document, LabeledBlock, Section};

/// Line starts that Markdown would read as structure.
static BLOCK_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:#{1,6}(?:\s|$)|>|[-+*](?:\s|$)|(?:-{3,}|\*{3,}|_{3,}|={3,})\s*$|```|~~~)").unwrap()
});

/// Ordered list markers such as `1.` or `2)`.
static ORDERED_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,9})[.)](?:\s|$)").unwrap());

/// Markdown rendering options.
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptions {
    /// Wrap text lines at this many characters (0 = no wrapping).
    pub wrap_width: usize,
    /// Backslash-escape inline syntax in slide text. Set when the output is
    /// read back by pandoc, so `<draft>` or `*` reach the document as typed.
    pub escape_inline_syntax: bool,
}

impl MarkdownOptions {
    pub fn with_wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width;
        self
    }

    pub fn with_inline_escapes(mut self, escape: bool) -> Self {
        self.escape_inline_syntax = escape;
        self
    }

    fn text<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if self.escape_inline_syntax {
            Cow::Owned(escape_inline_syntax(line))
        } else {
            Cow::Borrowed(line)
        }
    }
}

/// Render a document as Markdown.
pub fn render(doc: &Document, options: &MarkdownOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", escape_inline(&doc.title)));

    for (i, section) in doc.sections.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n\n");
        }
        render_section(&mut out, section, options);
    }

    // End on exactly one newline.
    out.truncate(out.trim_end_matches('\n').len());
    out.push('\n');

    out
}

fn render_section(out: &mut String, section: &Section, options: &MarkdownOptions) {
    out.push_str(&format!("## Slide {}\n\n", section.slide_number));

    for block in section.blocks_where(|l| *l == BlockLabel::Body) {
        push_paragraph(out, block, options);
    }

    for block in section.blocks_where(|l| *l == BlockLabel::Notes) {
        out.push_str("### Speaker Notes\n\n");
        push_paragraph(out, block, options);
    }

    let comments: Vec<&LabeledBlock> = section.blocks_where(BlockLabel::is_comment).collect();
    if !comments.is_empty() {
        out.push_str("### Comments\n\n");
        for comment in comments {
            push_comment(out, comment, options);
        }
        out.push('\n');
    }
}

fn push_paragraph(out: &mut String, block: &LabeledBlock, options: &MarkdownOptions) {
    for line in &block.block.lines {
        for piece in wrap_text(&options.text(line), options.wrap_width) {
            out.push_str(&piece);
            out.push('\n');
        }
    }
    out.push('\n');
}

/// Wrap a text line, escaping a block marker at the start of every piece.
///
/// A piece that needs the escape is broken one column earlier, so the
/// backslash never pushes it past `width`.
fn wrap_text(line: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![escape_block_marker(line).into_owned()];
    }

    let mut pieces = Vec::new();
    let mut rest = line.to_string();
    while !rest.is_empty() {
        let (mut piece, mut tail) = split_first(&rest, width);
        if needs_escape(&piece) && width > 1 {
            (piece, tail) = split_first(&rest, width - 1);
        }
        pieces.push(escape_block_marker(&piece).into_owned());
        rest = tail;
    }
    if pieces.is_empty() {
        pieces.push(String::new());
    }

    pieces
}

/// First wrapped piece of `text` and the text left after it.
fn split_first(text: &str, width: usize) -> (String, String) {
    let mut pieces = wrap_line(text, width).into_iter();
    let first = pieces.next().unwrap_or_default();
    (first, pieces.collect::<Vec<_>>().join(" "))
}

fn needs_escape(piece: &str) -> bool {
    matches!(escape_block_marker(piece), Cow::Owned(_))
}

/// One bullet item: `- **author** (timestamp): text`, continuation lines
/// indented to stay inside the item.
fn push_comment(out: &mut String, comment: &LabeledBlock, options: &MarkdownOptions) {
    let BlockLabel::Comment { author, timestamp } = &comment.label else {
        return;
    };

    let mut head = format!("**{}**", escape_inline(author));
    if let Some(ts) = timestamp {
        head.push_str(&format!(" ({})", ts.format("%Y-%m-%d %H:%M")));
    }
    head.push(':');

    // List marker and continuation indent are both two columns wide.
    let width = options.wrap_width;
    let inner = if width == 0 { 0 } else { width.saturating_sub(2).max(1) };

    // The head starts with `**`, so only the pieces after it can need escaping.
    let mut lines = comment.block.lines.iter();
    let mut pieces = match lines.next() {
        Some(line) => wrap_text(&format!("{} {}", head, options.text(line)), inner),
        None => vec![head],
    };
    for line in lines {
        pieces.extend(wrap_text(&options.text(line), inner));
    }

    for (i, piece) in pieces.iter().enumerate() {
        out.push_str(if i == 0 { "- " } else { "  " });
        out.push_str(piece);
        out.push('\n');
    }
}

/// Escape a leading block marker so the line stays plain text.
pub fn escape_block_marker(line: &str) -> Cow<'_, str> {
    if let Some(caps) = ORDERED_MARKER_REGEX.captures(line) {
        let digits = caps[1].len();
        return Cow::Owned(format!("{}\\{}", &line[..digits], &line[digits..]));
    }
    if BLOCK_MARKER_REGEX.is_match(line) {
        return Cow::Owned(format!("\\{}", line));
    }
    Cow::Borrowed(line)
}

/// Escape emphasis markers in text placed inside markup.
fn escape_inline(text: &str) -> String {
    text.replace('\\', "\\\\").replace('*', "\\*").replace('_', "\\_")
}

/// Backslash-escape every character pandoc's Markdown reader treats as
/// inline syntax: emphasis, code, raw HTML, links, sub/superscript, math.
fn escape_inline_syntax(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '<' | '[' | ']' | '~' | '^' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{block, sample_document};
    use xtract_core::Section;

    #[test]
    fn test_render_sample() {
        let md = render(&sample_document(), &MarkdownOptions::default());

        let expected = "\
# review

## Slide 1

Quarterly Review
Q3 2024

Revenue up 12%
Costs flat

### Speaker Notes

Mention the hiring freeze

### Comments

- **Alice** (2024-10-01 09:30): Add a chart here

---

## Slide 2

Questions?
";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_comment_without_timestamp_and_multiline() {
        let doc = Document {
            title: "deck".to_string(),
            sections: vec![Section {
                slide_number: 1,
                blocks: vec![block(
                    BlockLabel::Comment {
                        author: "Unknown Author".to_string(),
                        timestamp: None,
                    },
                    &["first", "second"],
                )],
            }],
        };

        let md = render(&doc, &MarkdownOptions::default());
        assert!(md.contains("- **Unknown Author**: first\n  second\n"));
    }

    #[test]
    fn test_escape_block_markers() {
        assert_eq!(escape_block_marker("# not a heading"), "\\# not a heading");
        assert_eq!(escape_block_marker("- not a list"), "\\- not a list");
        assert_eq!(escape_block_marker("---"), "\\---");
        assert_eq!(escape_block_marker("> quote"), "\\> quote");
        assert_eq!(escape_block_marker("1. First"), "1\\. First");
        assert_eq!(escape_block_marker("2024) review"), "2024\\) review");
        assert_eq!(escape_block_marker("#hashtag"), "#hashtag");
        assert_eq!(escape_block_marker("-5 degrees"), "-5 degrees");
        assert_eq!(escape_block_marker("Revenue up 12%"), "Revenue up 12%");
    }

    #[test]
    fn test_wrapping_applies_to_text_not_headings() {
        let doc = Document {
            title: "a title that is much longer than the width".to_string(),
            sections: vec![Section {
                slide_number: 1,
                blocks: vec![block(BlockLabel::Body, &["one two three four five"])],
            }],
        };

        let md = render(&doc, &MarkdownOptions::default().with_wrap_width(10));
        assert!(md.starts_with("# a title that is much longer than the width\n"));
        assert!(md.contains("one two\nthree four\nfive\n"));
    }

    #[test]
    fn test_wrapped_comment_stays_in_item() {
        let doc = Document {
            title: "t".to_string(),
            sections: vec![Section {
                slide_number: 1,
                blocks: vec![block(
                    BlockLabel::Comment {
                        author: "Bo".to_string(),
                        timestamp: None,
                    },
                    &["please add a chart"],
                )],
            }],
        };

        let md = render(&doc, &MarkdownOptions::default().with_wrap_width(18));
        assert!(md.contains("- **Bo**: please\n  add a chart\n"));
    }

    fn single_slide(blocks: Vec<LabeledBlock>) -> Document {
        Document {
            title: "t".to_string(),
            sections: vec![Section {
                slide_number: 1,
                blocks,
            }],
        }
    }

    fn comment_by(author: &str, lines: &[&str]) -> LabeledBlock {
        block(
            BlockLabel::Comment {
                author: author.to_string(),
                timestamp: None,
            },
            lines,
        )
    }

    #[test]
    fn test_wrapped_lines_fit_width_after_escaping() {
        let doc = single_slide(vec![
            block(BlockLabel::Body, &["aaaa - bb # cc 1. dd > ee --- ff * gg 2) hh"]),
            block(BlockLabel::Notes, &["note - with + markers"]),
            comment_by("Bo", &["abcdef - x # y", "more - text 3. z"]),
        ]);

        for width in 1..=30 {
            let md = render(&doc, &MarkdownOptions::default().with_wrap_width(width));
            for line in md.lines().skip(1) {
                if line.is_empty() || line.starts_with('#') || line == "---" {
                    continue;
                }
                let (text, limit) = match line.strip_prefix("- ").or_else(|| line.strip_prefix("  ")) {
                    Some(rest) => (rest, width.saturating_sub(2).max(1)),
                    None => (line, width),
                };
                assert!(
                    text.chars().count() <= limit || !text.contains(' '),
                    "line {:?} exceeds width {}",
                    line,
                    width
                );
                assert!(!needs_escape(text), "line {:?} reads as markup at width {}", line, width);
            }
        }
    }

    #[test]
    fn test_narrow_wrap_escapes_marker_piece() {
        let doc = single_slide(vec![block(BlockLabel::Body, &["aaaa - bb"])]);
        let md = render(&doc, &MarkdownOptions::default().with_wrap_width(4));
        assert!(md.contains("\naaaa\n\\-\nbb\n"));
    }

    #[test]
    fn test_comment_continuation_is_escaped() {
        let doc = single_slide(vec![comment_by("Bo", &["abcdef - x"])]);
        let md = render(&doc, &MarkdownOptions::default().with_wrap_width(16));
        assert!(md.contains("- **Bo**: abcdef\n  \\- x\n"));
        assert!(!md.contains("\n  - "));
    }

    #[test]
    fn test_inline_syntax_escaped_only_on_request() {
        let doc = single_slide(vec![
            block(BlockLabel::Body, &["<draft> uses `code` and *stars*"]),
            comment_by("Bo", &["see [1] for $5"]),
        ]);

        let plain = render(&doc, &MarkdownOptions::default());
        assert!(plain.contains("<draft> uses `code` and *stars*\n"));

        let escaped = render(&doc, &MarkdownOptions::default().with_inline_escapes(true));
        assert!(escaped.contains("\\<draft> uses \\`code\\` and \\*stars\\*\n"));
        assert!(escaped.contains("- **Bo**: see \\[1\\] for \\$5\n"));
    }

    #[test]
    fn test_inline_escape_in_author() {
        assert_eq!(escape_inline("snake_case*"), "snake\\_case\\*");
    }
}
