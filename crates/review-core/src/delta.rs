//! Single contiguous text edits.
//!
//! A [`TextEdit`] describes "replace `start..end` of the previous text with `inserted`", in
//! character offsets against the text **before** the edit. Surfaces that only report full text
//! snapshots can recover the edit with [`TextEdit::between`].

use crate::text::{char_len, char_slice};

/// One contiguous replacement expressed in character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Start of the replaced range in the previous text.
    pub start: usize,
    /// Exclusive end of the replaced range in the previous text.
    pub end: usize,
    /// Replacement text (may be empty).
    pub inserted: String,
}

impl TextEdit {
    /// Replace `start..end` with `inserted`.
    pub fn replace(start: usize, end: usize, inserted: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            inserted: inserted.into(),
        }
    }

    /// Insert `text` at `offset`.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(offset, offset, text)
    }

    /// Delete `start..end`.
    pub fn delete(start: usize, end: usize) -> Self {
        Self::replace(start, end, String::new())
    }

    /// Length of `inserted` in characters.
    pub fn inserted_len(&self) -> usize {
        char_len(&self.inserted)
    }

    /// Length of the replaced range in characters.
    pub fn deleted_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Net change in document length.
    pub fn delta(&self) -> isize {
        self.inserted_len() as isize - self.deleted_len() as isize
    }

    /// `true` if the edit changes nothing.
    pub fn is_noop(&self) -> bool {
        self.deleted_len() == 0 && self.inserted.is_empty()
    }

    /// Apply this edit to `text`, returning the new text.
    pub fn apply(&self, text: &str) -> String {
        let total = char_len(text);
        let start = self.start.min(total);
        let end = self.end.min(total).max(start);

        let mut out = String::with_capacity(text.len() + self.inserted.len());
        out.push_str(char_slice(text, 0, start));
        out.push_str(&self.inserted);
        out.push_str(char_slice(text, end, total));
        out
    }

    /// Derive the single edit that turns `old` into `new`.
    ///
    /// The edit spans everything between the longest common prefix and the longest common
    /// suffix (which never overlap). Returns `None` if the texts are equal.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }

        let old_chars: Vec<char> = old.chars().collect();
        let new_chars: Vec<char> = new.chars().collect();

        let prefix = old_chars
            .iter()
            .zip(new_chars.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
        let suffix = old_chars
            .iter()
            .rev()
            .zip(new_chars.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let inserted: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();
        Some(Self::replace(prefix, old_chars.len() - suffix, inserted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_insertion() {
        let edit = TextEdit::between("ABCDE", "ABCXDE").unwrap();
        assert_eq!(edit, TextEdit::insert(3, "X"));
        assert_eq!(edit.delta(), 1);
    }

    #[test]
    fn test_between_replacement() {
        let edit = TextEdit::between("Hello world", "Hello there").unwrap();
        assert_eq!(edit, TextEdit::replace(6, 11, "there"));
        assert_eq!(edit.apply("Hello world"), "Hello there");
    }

    #[test]
    fn test_between_repeated_chars_does_not_overlap() {
        let edit = TextEdit::between("aa", "aaa").unwrap();
        assert_eq!(edit, TextEdit::insert(2, "a"));

        let edit = TextEdit::between("aaa", "a").unwrap();
        assert_eq!(edit, TextEdit::delete(1, 3));
    }

    #[test]
    fn test_between_equal_is_none() {
        assert!(TextEdit::between("same", "same").is_none());
    }

    #[test]
    fn test_inverted_range_acts_as_insertion() {
        let edit = TextEdit {
            start: 5,
            end: 3,
            inserted: "ab".to_string(),
        };
        assert_eq!(edit.deleted_len(), 0);
        assert_eq!(edit.delta(), 2);
        assert_eq!(edit.apply("0123456"), "01234ab56");
    }

    #[test]
    fn test_apply_multibyte() {
        let edit = TextEdit::replace(1, 2, "界界");
        assert_eq!(edit.apply("你好吗"), "你界界吗");
    }
}
