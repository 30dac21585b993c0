//! Greedy word wrapping for Markdown output.

/// Wrap `line` at `width` characters, breaking only at spaces.
///
/// A width of 0 disables wrapping. Words longer than `width` are kept whole
/// on a line of their own. Runs of spaces at a break are dropped.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if width == 0 || line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split(' ').filter(|w| !w.is_empty()) {
        let len = word.chars().count();
        if current_len == 0 {
            current.push_str(word);
            current_len = len;
        } else if current_len + 1 + len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + len;
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = len;
        }
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Revenue grew twelve percent year over year while costs stayed flat across every region";

    #[test]
    fn test_zero_width_is_identity() {
        assert_eq!(wrap_line(SAMPLE, 0), vec![SAMPLE]);
    }

    #[test]
    fn test_short_line_untouched() {
        assert_eq!(wrap_line("Costs flat", 20), vec!["Costs flat"]);
    }

    #[test]
    fn test_wraps_at_spaces() {
        assert_eq!(
            wrap_line("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_long_word_kept_whole() {
        assert_eq!(
            wrap_line("see https://example.com/a/very/long/path now", 12),
            vec!["see", "https://example.com/a/very/long/path", "now"]
        );
    }

    #[test]
    fn test_no_line_exceeds_width_unless_single_token() {
        for width in 1..=40 {
            for line in wrap_line(SAMPLE, width) {
                assert!(
                    line.chars().count() <= width || !line.contains(' '),
                    "width {}: {:?}",
                    width,
                    line
                );
            }
        }
    }

    #[test]
    fn test_wrapping_keeps_every_word() {
        for width in 1..=40 {
            let joined = wrap_line(SAMPLE, width).join(" ");
            assert_eq!(joined, SAMPLE);
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(wrap_line("café crème brûlée", 10), vec!["café crème", "brûlée"]);
    }
}
