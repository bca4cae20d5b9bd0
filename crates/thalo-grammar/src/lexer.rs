//! Pure-Rust port of the external scanner's line classification.
//!
//! `scanner.c` decides, character by character, whether the parser is
//! looking at an `INDENT` or a `CONTENT_BLANK`. Because thalo's grammar is
//! strictly line-oriented, the equivalent decision can be made once per
//! line instead of character-by-character, which is what this module does
//! for the pure-Rust parsing path described in SPEC_FULL.md section 4.1.

/// A single physical line of source, with comments already stripped and
/// indentation measured, per data-model invariant 5.
#[derive(Debug, Clone)]
pub struct Line<'a> {
    /// Byte offset of the first character of this line (including any
    /// leading indentation) in the source.
    pub start: usize,
    /// Byte offset one past the last character of the line's content,
    /// not including the trailing newline.
    pub end: usize,
    /// Number of leading space/tab bytes.
    pub indent: usize,
    /// The line's content after `//` comment stripping, indentation
    /// included, trailing whitespace trimmed.
    pub content: &'a str,
    /// True for a line that is empty, all whitespace, or comment-only.
    pub is_blank: bool,
}

impl<'a> Line<'a> {
    /// The content with leading indentation removed.
    pub fn trimmed_content(&self) -> &'a str {
        &self.content[self.indent.min(self.content.len())..]
    }
}

/// Splits `source` into [`Line`]s, stripping `//` line comments exactly as
/// `scanner.c`'s `skip_comment` does, regardless of indentation.
pub fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for raw_line in source.split_inclusive('\n') {
        let has_newline = raw_line.ends_with('\n');
        let line_text = if has_newline { &raw_line[..raw_line.len() - 1] } else { raw_line };
        let line_text = line_text.strip_suffix('\r').unwrap_or(line_text);
        let start = offset;
        let content_end = strip_comment(line_text);
        let content = &line_text[..content_end];
        let indent = content.len() - content.trim_start_matches([' ', '\t']).len();
        let is_blank = content.trim().is_empty();
        lines.push(Line { start, end: start + content.len(), indent, content, is_blank });
        offset += raw_line.len();
    }
    lines
}

/// Returns the byte length of `line` up to (but not including) a `//`
/// comment marker, or the full length if none is present.
fn strip_comment(line: &str) -> usize {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'/' && bytes[i + 1] == b'/' {
            return i;
        }
        i += 1;
    }
    line.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_comment() {
        let lines = split_lines("  key: \"v\" // a note\n");
        assert_eq!(lines[0].content.trim_end(), "  key: \"v\"");
    }

    #[test]
    fn comment_only_line_is_blank() {
        let lines = split_lines("// just a comment\n");
        assert!(lines[0].is_blank);
    }

    #[test]
    fn indent_measures_leading_whitespace() {
        let lines = split_lines("\tkey: \"v\"\n");
        assert_eq!(lines[0].indent, 1);
    }
}
