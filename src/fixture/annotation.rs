//! The `(indent N)` header annotation.
//!
//! Regression fixtures are often lifted from deeply nested code. A header ending in
//! `(indent N)` says every line of the case carries N columns of shared indentation,
//! which the parser strips before formatting and takes off the page width.

const OPEN: &str = "(indent";

/// Result of reading the annotation off a case header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentAnnotation {
    /// The header carries no annotation.
    Absent,
    /// `(indent N)` with its value.
    Present(usize),
    /// Something that starts like an annotation but cannot be read.
    Malformed {
        /// Byte offset of `(indent` within the header.
        at: usize,
        reason: &'static str,
    },
}

/// Reads a trailing `(indent N)` annotation from a case header.
///
/// The annotation must be the last thing on the line, trailing whitespace aside, and
/// either open the header or follow whitespace. `(indent` text anywhere else, such as
/// `(indent 4) was slow` or `(indentation)`, is prose and reads as `Absent`.
pub fn parse_indent(header: &str) -> IndentAnnotation {
    let trimmed = header.trim_end();
    if !trimmed.ends_with(')') {
        return IndentAnnotation::Absent;
    }
    let Some(at) = trimmed.rfind(OPEN) else {
        return IndentAnnotation::Absent;
    };
    let at_boundary = trimmed[..at]
        .chars()
        .next_back()
        .map_or(true, char::is_whitespace);
    if !at_boundary {
        return IndentAnnotation::Absent;
    }

    let rest = &trimmed[at + OPEN.len()..trimmed.len() - 1];
    let Some(digits) = rest.strip_prefix(' ') else {
        return IndentAnnotation::Absent;
    };
    if digits.contains(')') {
        return IndentAnnotation::Absent;
    }
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return IndentAnnotation::Malformed {
            at,
            reason: "indent must be a non-negative integer",
        };
    }
    match digits.parse() {
        Ok(n) => IndentAnnotation::Present(n),
        Err(_) => IndentAnnotation::Malformed {
            at,
            reason: "indent is too large",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent() {
        assert_eq!(parse_indent("wrap long argument lists"), IndentAnnotation::Absent);
        assert_eq!(parse_indent(""), IndentAnnotation::Absent);
    }

    #[test]
    fn test_present() {
        assert_eq!(
            parse_indent("regression/0000/0025.stmt:1  (indent 4)"),
            IndentAnnotation::Present(4)
        );
        assert_eq!(
            parse_indent("nested closure (indent 12)   "),
            IndentAnnotation::Present(12)
        );
        assert_eq!(parse_indent("zero (indent 0)"), IndentAnnotation::Present(0));
    }

    #[test]
    fn test_glued_to_text_is_not_an_annotation() {
        assert_eq!(parse_indent("call(indent 4)"), IndentAnnotation::Absent);
        assert_eq!(parse_indent("case (indent4)"), IndentAnnotation::Absent);
    }

    #[test]
    fn test_opening_the_header() {
        assert_eq!(parse_indent("(indent 4)"), IndentAnnotation::Present(4));
        assert_eq!(parse_indent(" (indent 6)"), IndentAnnotation::Present(6));
    }

    #[test]
    fn test_non_trailing_is_prose() {
        assert_eq!(parse_indent("x (indent 4) trailing prose"), IndentAnnotation::Absent);
        assert_eq!(parse_indent(" (indent 4) was slow"), IndentAnnotation::Absent);
        assert_eq!(parse_indent("(indentation)"), IndentAnnotation::Absent);
        assert_eq!(parse_indent("keeps (indentation) of strings"), IndentAnnotation::Absent);
        assert_eq!(parse_indent("case (indent 4"), IndentAnnotation::Absent);
        assert_eq!(parse_indent("a (indent 4) then (b)"), IndentAnnotation::Absent);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            parse_indent("case (indent x)"),
            IndentAnnotation::Malformed { at: 5, .. }
        ));
        assert!(matches!(
            parse_indent("case (indent )"),
            IndentAnnotation::Malformed { .. }
        ));
        assert!(matches!(
            parse_indent("case (indent -2)"),
            IndentAnnotation::Malformed { reason: "indent must be a non-negative integer", .. }
        ));
        assert!(matches!(
            parse_indent("case (indent 99999999999999999999999)"),
            IndentAnnotation::Malformed { reason: "indent is too large", .. }
        ));
    }
}
