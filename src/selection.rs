//! Selection markers.
//!
//! A fixture may bracket part of its input and expected text with `‹` and `›` to check
//! that the formatter carries a selection across reformatting. The glyphs never occur in
//! real formatter output, so they are removed without any escaping.

/// Marks the start of a selection.
pub const SELECTION_START: char = '‹';
/// Marks the end of a selection.
pub const SELECTION_END: char = '›';

/// A byte range into marker-free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub len: usize,
}

impl Selection {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Text with its markers removed and the range they described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCode {
    pub text: String,
    pub selection: Selection,
    /// Whether either marker was present.
    pub has_markers: bool,
}

/// Removes the selection markers from `source` and computes the selection they denote.
///
/// A missing start marker selects from offset 0; a missing end marker selects to the end
/// of the text. An end marker placed before the start marker gives an empty selection.
pub fn extract_selection(source: &str) -> SourceCode {
    let start = source.find(SELECTION_START).map(|at| {
        let ends_before = source[..at].matches(SELECTION_END).count();
        at - ends_before * SELECTION_END.len_utf8()
    });
    let without_start = source.replace(SELECTION_START, "");
    let end = without_start.find(SELECTION_END);
    let text = without_start.replace(SELECTION_END, "");

    let start_offset = start.unwrap_or(0);
    let end_offset = end.unwrap_or(text.len());
    SourceCode {
        has_markers: start.is_some() || end.is_some(),
        selection: Selection::new(start_offset, end_offset.saturating_sub(start_offset)),
        text,
    }
}

/// Re-inserts markers around `selection`, clamped to `text` and to char boundaries.
pub fn mark(text: &str, selection: Selection) -> String {
    let start = floor_char_boundary(text, selection.start);
    let end = floor_char_boundary(text, selection.end()).max(start);
    let mut marked = String::with_capacity(text.len() + 6);
    marked.push_str(&text[..start]);
    marked.push(SELECTION_START);
    marked.push_str(&text[start..end]);
    marked.push(SELECTION_END);
    marked.push_str(&text[end..]);
    marked
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_markers_selects_everything() {
        let code = extract_selection("foo();\n");
        assert_eq!(code.text, "foo();\n");
        assert_eq!(code.selection, Selection::new(0, 7));
        assert!(!code.has_markers);
    }

    #[test]
    fn test_both_markers() {
        let raw = "a ‹b c› d";
        let s = raw.find(SELECTION_START).unwrap();
        let e = raw.find(SELECTION_END).unwrap();
        let code = extract_selection(raw);
        assert_eq!(code.text, "a b c d");
        assert_eq!(code.selection.start, s);
        assert_eq!(code.selection.end(), e - SELECTION_START.len_utf8());
        assert_eq!(&code.text[code.selection.start..code.selection.end()], "b c");
    }

    #[test]
    fn test_only_start_marker() {
        let code = extract_selection("abc‹def");
        assert_eq!(code.text, "abcdef");
        assert_eq!(code.selection, Selection::new(3, 3));
    }

    #[test]
    fn test_only_end_marker() {
        let code = extract_selection("abc›def");
        assert_eq!(code.text, "abcdef");
        assert_eq!(code.selection, Selection::new(0, 3));
        assert!(code.has_markers);
    }

    #[test]
    fn test_end_before_start_is_empty() {
        let code = extract_selection("a›b‹c");
        assert_eq!(code.text, "abc");
        assert_eq!(code.selection, Selection::new(2, 0));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let once = extract_selection("x ‹y› z");
        let twice = extract_selection(&once.text);
        assert_eq!(once.text, twice.text);
    }

    #[test]
    fn test_mark_round_trips() {
        let raw = "int ‹x = 1›;";
        let code = extract_selection(raw);
        assert_eq!(mark(&code.text, code.selection), raw);
    }

    #[test]
    fn test_mark_clamps_out_of_range() {
        assert_eq!(mark("ab", Selection::new(1, 10)), "a‹b›");
        assert_eq!(mark("ab", Selection::new(9, 1)), "ab‹›");
    }
}
