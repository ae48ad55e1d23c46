//! Single-pass parser for the fixture format.
//!
//! ```text
//! 40|                              optional, first line only: page width = column of `|`
//! >>> description (indent 4)       case header; `>>>` and the annotation are optional
//! input lines...
//! <<<
//! expected lines...
//! >>> next description             closes the expected block and opens the next case
//! ```
//!
//! A bare `>>>` followed only by blank lines ends the file without opening a case.
//! The scan never backtracks: `<<<` and `>>>` are unambiguous line prefixes.

use tracing::trace;

use crate::diagnostics::{to_error_source, SourceArc, Span};
use crate::err_src;
use crate::fixture::annotation::{parse_indent, IndentAnnotation};
use crate::fixture::{Case, FixtureKind, DEFAULT_PAGE_WIDTH};
use crate::HarnessError;

const BEGIN_EXPECTED: &str = "<<<";
const END_CASE: &str = ">>>";
const WIDTH_MARKER: char = '|';
const FRAGMENT_OPEN: &str = "m() {\n";
const FRAGMENT_CLOSE: &str = "}\n";
const FRAGMENT_INDENT: &str = "  ";
/// Extra room given to fragments for the wrapper's indentation.
const FRAGMENT_WIDTH_BONUS: usize = 2;

/// Parses the text of one fixture file into its cases, in file order.
///
/// `label` is the `<dir>/<file>` prefix used to build each case id.
pub fn parse_fixture(
    label: &str,
    kind: FixtureKind,
    text: &str,
) -> Result<Vec<Case>, HarnessError> {
    FixtureParser::new(label, kind, text).parse()
}

/// A line of fixture text with its byte offset, terminator stripped.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    offset: usize,
    text: &'a str,
}

impl Line<'_> {
    fn span(&self) -> Span {
        Span {
            start: self.offset,
            end: self.offset + self.text.len(),
        }
    }
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|chunk| {
            let line = chunk.strip_suffix('\n').unwrap_or(chunk);
            let line = line.strip_suffix('\r').unwrap_or(line);
            let current = Line { offset, text: line };
            offset += chunk.len();
            current
        })
        .collect()
}

struct FixtureParser<'a> {
    label: &'a str,
    kind: FixtureKind,
    text: &'a str,
    lines: Vec<Line<'a>>,
    pos: usize,
    /// File-level width, fragment bonus included.
    page_width: usize,
    /// Width handed to the formatter; lowered by `(indent N)` and kept for later cases.
    right_margin: usize,
}

impl<'a> FixtureParser<'a> {
    fn new(label: &'a str, kind: FixtureKind, text: &'a str) -> Self {
        Self {
            label,
            kind,
            text,
            lines: split_lines(text),
            pos: 0,
            page_width: DEFAULT_PAGE_WIDTH,
            right_margin: DEFAULT_PAGE_WIDTH,
        }
    }

    fn is_fragment(&self) -> bool {
        matches!(self.kind, FixtureKind::Fragment)
    }

    fn source(&self) -> SourceArc {
        to_error_source(self.label, self.text)
    }

    fn parse(mut self) -> Result<Vec<Case>, HarnessError> {
        self.read_page_width();
        let mut cases = Vec::new();
        while self.pos < self.lines.len() {
            if let Some(case) = self.read_case()? {
                cases.push(case);
            }
        }
        Ok(cases)
    }

    fn read_page_width(&mut self) {
        if let Some(first) = self.lines.first() {
            if first.text.ends_with(WIDTH_MARKER) {
                self.page_width = first
                    .text
                    .chars()
                    .take_while(|&c| c != WIDTH_MARKER)
                    .count();
                self.pos = 1;
            }
        }
        if self.is_fragment() {
            self.page_width += FRAGMENT_WIDTH_BONUS;
        }
        self.right_margin = self.page_width;
    }

    fn only_blank_lines_remain(&self) -> bool {
        self.lines[self.pos..]
            .iter()
            .all(|line| line.text.trim().is_empty())
    }

    /// Reads one case starting at the header line. Returns `None` for a trailing
    /// bare `>>>` terminator.
    fn read_case(&mut self) -> Result<Option<Case>, HarnessError> {
        let header = self.lines[self.pos];
        let line_number = self.pos + 1;
        self.pos += 1;

        let header_text = header.text.replace(END_CASE, "");
        if header_text.trim().is_empty() && self.only_blank_lines_remain() {
            self.pos = self.lines.len();
            return Ok(None);
        }

        let id = format!("{}:{} {}", self.label, line_number, header_text)
            .trim()
            .to_string();
        let description = header_text.trim().to_string();
        let leading_indent = self.read_indent(&header_text, header)?;

        let input = self.read_input(&description, header, leading_indent)?;
        let expected = self.read_expected(leading_indent)?;

        trace!(case = %id, right_margin = self.right_margin, "parsed case");
        Ok(Some(Case {
            id,
            description,
            line: line_number,
            kind: self.kind,
            page_width: self.right_margin,
            leading_indent,
            input,
            expected,
        }))
    }

    fn read_indent(&mut self, header_text: &str, header: Line<'_>) -> Result<usize, HarnessError> {
        match parse_indent(header_text) {
            IndentAnnotation::Absent => Ok(0),
            IndentAnnotation::Present(indent) if indent < self.page_width => {
                self.right_margin = self.page_width - indent;
                Ok(indent)
            }
            IndentAnnotation::Present(indent) => Err(err_src!(
                MalformedAnnotation,
                format!(
                    "indent {} leaves no room in a page width of {}",
                    indent, self.page_width
                ),
                &self.source(),
                header.span()
            )),
            IndentAnnotation::Malformed { reason, .. } => Err(err_src!(
                MalformedAnnotation,
                reason,
                &self.source(),
                header.span(),
                "write the annotation as `(indent N)` at the end of the header"
            )),
        }
    }

    fn read_input(
        &mut self,
        description: &str,
        header: Line<'_>,
        leading_indent: usize,
    ) -> Result<String, HarnessError> {
        let mut input = self.open_block();
        loop {
            let Some(line) = self.lines.get(self.pos) else {
                return Err(err_src!(
                    MalformedFixture,
                    format!(
                        "case `{}` reaches end of file without a `{}` line",
                        description, BEGIN_EXPECTED
                    ),
                    &self.source(),
                    header.span(),
                    "separate the input from the expected output with a `<<<` line"
                ));
            };
            if line.text.starts_with(BEGIN_EXPECTED) {
                self.pos += 1;
                break;
            }
            self.push_line(&mut input, line.text, leading_indent);
            self.pos += 1;
        }
        self.close_block(&mut input);
        Ok(input)
    }

    fn read_expected(&mut self, leading_indent: usize) -> Result<String, HarnessError> {
        let mut expected = self.open_block();
        while let Some(line) = self.lines.get(self.pos) {
            if line.text.starts_with(END_CASE) {
                break;
            }
            if line.text.starts_with(BEGIN_EXPECTED) {
                // A second `<<<` means the `>>>` closing this case was dropped.
                return Err(err_src!(
                    MalformedFixture,
                    format!("`{}` found before the `{}` ending this case", BEGIN_EXPECTED, END_CASE),
                    &self.source(),
                    line.span(),
                    "start each case with a `>>>` header line"
                ));
            }
            self.push_line(&mut expected, line.text, leading_indent);
            self.pos += 1;
        }
        self.close_block(&mut expected);
        Ok(expected)
    }

    fn open_block(&self) -> String {
        if self.is_fragment() {
            FRAGMENT_OPEN.to_string()
        } else {
            String::new()
        }
    }

    fn close_block(&self, block: &mut String) {
        if self.is_fragment() {
            block.push_str(FRAGMENT_CLOSE);
        }
    }

    fn push_line(&self, block: &mut String, line: &str, leading_indent: usize) {
        let line = strip_indent(line, leading_indent);
        if self.is_fragment() && !line.is_empty() {
            block.push_str(FRAGMENT_INDENT);
        }
        block.push_str(line);
        block.push('\n');
    }
}

/// Drops `indent` leading chars from lines at least that long.
fn strip_indent(line: &str, indent: usize) -> &str {
    if indent == 0 {
        return line;
    }
    match line.char_indices().nth(indent) {
        Some((at, _)) => &line[at..],
        None if line.chars().count() == indent => "",
        None => line,
    }
}
