//! Line-break index over a document.
//!
//! Maps flat character offsets to `(line, column)` positions and back using a Rope, so the
//! overlay renderer never walks the text to find where an offset lands.

use ropey::Rope;

/// Logical line index backed by a Rope.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    /// Build the index for `text`.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Total line count (an empty document has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Char offset of the first character of `line`, clamped to the document end.
    pub fn line_start(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line)
    }

    /// Length of `line` in chars, excluding its line break.
    pub fn line_len(&self, line: usize) -> usize {
        self.line_text(line).map_or(0, |text| text.chars().count())
    }

    /// Get line number and column from a char offset (clamped to the document end).
    pub fn char_offset_to_position(&self, char_offset: usize) -> (usize, usize) {
        let char_offset = char_offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_offset);
        (line, char_offset - self.rope.line_to_char(line))
    }

    /// Get the char offset of `(line, column)`; the column is clamped to the line length.
    pub fn position_to_char_offset(&self, line: usize, column: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line) + column.min(self.line_len(line))
    }

    /// Text of `line` without its trailing `\n` / `\r\n`.
    pub fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }

        let mut text = self.rope.line(line).to_string();
        if text.ends_with("\r\n") {
            text.truncate(text.len() - 2);
        } else if text.ends_with(is_line_break) {
            text.pop();
        }
        Some(text)
    }

    /// Iterate all lines without their line breaks.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.line_count()).filter_map(|line| self.line_text(line))
    }
}

/// Line terminators recognized by Ropey with its default features.
fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_one_line() {
        let index = LineIndex::from_text("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.char_offset_to_position(5), (0, 0));
    }

    #[test]
    fn test_char_offset_to_position() {
        let index = LineIndex::from_text("ABC\nDEF\nGHI");

        assert_eq!(index.char_offset_to_position(0), (0, 0));
        assert_eq!(index.char_offset_to_position(3), (0, 3)); // the '\n' itself
        assert_eq!(index.char_offset_to_position(4), (1, 0));
        assert_eq!(index.char_offset_to_position(11), (2, 3));
    }

    #[test]
    fn test_position_to_char_offset_clamps_column() {
        let index = LineIndex::from_text("ABC\nDEF\nGHI");

        assert_eq!(index.position_to_char_offset(1, 1), 5);
        assert_eq!(index.position_to_char_offset(0, 99), 3);
        assert_eq!(index.position_to_char_offset(9, 0), 11);
    }

    #[test]
    fn test_crlf_lines() {
        let index = LineIndex::from_text("one\r\ntwo");
        assert_eq!(index.line_text(0).as_deref(), Some("one"));
        assert_eq!(index.line_len(0), 3);
        assert_eq!(index.line_start(1), 5);
    }

    #[test]
    fn test_cjk_offsets() {
        let index = LineIndex::from_text("你好\n世界");
        assert_eq!(index.char_count(), 5);
        assert_eq!(index.char_offset_to_position(3), (1, 0));
        let lines: Vec<String> = index.lines().collect();
        assert_eq!(lines, vec!["你好".to_string(), "世界".to_string()]);
    }
}
