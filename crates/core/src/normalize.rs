//! Text cleanup for extracted slide text.
//!
//! Splits on embedded line breaks, collapses whitespace runs, decodes the
//! `_xHHHH_` escapes OOXML uses for control characters, and applies NFC
//! normalization so visually identical text compares equal.

use crate::types::TextBlock;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse horizontal whitespace (including no-break spaces) into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}\u{2007}\u{202F}]+").unwrap());

/// Regex matching the `_xHHHH_` escape used by OOXML for characters XML cannot carry.
static XSTRING_ESCAPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_x([0-9A-Fa-f]{4})_").unwrap());

/// Characters that end a line inside a single run of text.
const LINE_BREAK_CHARS: &[char] = &['\n', '\r', '\u{000B}', '\u{2028}', '\u{2029}'];

/// Text normalizer for slide, note, and comment text.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a single line of text.
    ///
    /// - Decodes `_xHHHH_` escapes
    /// - Drops control characters other than tab
    /// - Collapses whitespace runs and trims
    /// - Applies NFC normalization
    ///
    /// Line-break characters are treated like any other control character;
    /// use [`normalize_to_lines`](Self::normalize_to_lines) to split on them.
    pub fn normalize_line(&self, text: &str) -> String {
        self.clean(&decode_xstring(text))
    }

    fn clean(&self, text: &str) -> String {
        let cleaned: String = text
            .chars()
            .filter(|c| *c == '\t' || !c.is_control())
            .collect();

        WHITESPACE_COLLAPSE_REGEX
            .replace_all(&cleaned, " ")
            .trim()
            .nfc()
            .collect()
    }

    /// Normalize text that may contain embedded line breaks, returning
    /// individual non-empty lines.
    pub fn normalize_to_lines(&self, text: &str) -> Vec<String> {
        let decoded = decode_xstring(text);

        decoded
            .replace("\r\n", "\n")
            .split(LINE_BREAK_CHARS)
            .map(|l| self.clean(l))
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Normalize raw source lines into a text block.
    ///
    /// Each raw line may itself contain breaks; empty lines are dropped.
    pub fn normalize_block<I, S>(&self, raw_lines: I) -> TextBlock
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        TextBlock::new(
            raw_lines
                .into_iter()
                .flat_map(|l| self.normalize_to_lines(l.as_ref()))
                .collect(),
        )
    }
}

/// Replace `_xHHHH_` escapes with the character they encode.
fn decode_xstring(text: &str) -> String {
    if !text.contains("_x") {
        return text.to_string();
    }

    XSTRING_ESCAPE_REGEX
        .replace_all(text, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
