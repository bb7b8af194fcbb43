//! Char-offset helpers over `&str`.
//!
//! Every offset in this crate counts Unicode scalar values (`char`), not bytes.

/// Number of `char`s in `text`.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `char_offset`-th character, clamped to `text.len()`.
pub(crate) fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Slice `text` by char offsets (`start..end`), clamping both ends.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let start_byte = byte_index(text, start);
    let end_byte = byte_index(text, end.max(start));
    &text[start_byte..end_byte]
}

/// The last `max_chars` characters of `text[..end]`.
pub(crate) fn chars_before(text: &str, end: usize, max_chars: usize) -> &str {
    char_slice(text, end.saturating_sub(max_chars), end)
}

/// The first `max_chars` characters of `text[start..]`.
pub(crate) fn chars_after(text: &str, start: usize, max_chars: usize) -> &str {
    char_slice(text, start, start.saturating_add(max_chars))
}

/// Char offsets of every (possibly overlapping) occurrence of a non-empty `needle`.
pub(crate) fn match_offsets(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }

    let mut offsets = Vec::new();
    let mut search_from = 0usize;
    // Running char count up to `counted_bytes`, so each match costs only the gap since the last.
    let mut counted_bytes = 0usize;
    let mut counted_chars = 0usize;

    while let Some(found) = haystack[search_from..].find(needle) {
        let byte = search_from + found;
        counted_chars += char_len(&haystack[counted_bytes..byte]);
        counted_bytes = byte;
        offsets.push(counted_chars);

        let step = haystack[byte..].chars().next().map_or(1, char::len_utf8);
        search_from = byte + step;
    }

    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_slice_clamps() {
        assert_eq!(char_slice("héllo", 1, 3), "él");
        assert_eq!(char_slice("héllo", 3, 99), "lo");
        assert_eq!(char_slice("héllo", 4, 2), "");
    }

    #[test]
    fn test_context_windows() {
        assert_eq!(chars_before("abcdef", 4, 2), "cd");
        assert_eq!(chars_before("abcdef", 1, 5), "a");
        assert_eq!(chars_after("abcdef", 4, 5), "ef");
    }

    #[test]
    fn test_match_offsets_are_char_based() {
        assert_eq!(match_offsets("你好 ab 你好 ab", "ab"), vec![3, 9]);
        assert_eq!(match_offsets("aaa", "aa"), vec![0, 1]);
        assert!(match_offsets("abc", "").is_empty());
    }
}
