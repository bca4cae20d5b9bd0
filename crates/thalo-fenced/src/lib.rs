//! Extracts the thalo source text embedded in a document. A `.thalo` file
//! is one block covering the whole source with an
//! identity [`SourceMap`]; a `.md` file may embed any number of top-level
//! ` ```thalo ` fenced code blocks, each with its own map back to file
//! coordinates.

use thalo_position::{ByteSpan, SourceMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Thalo,
    Markdown,
}

/// One fenced (or whole-file) thalo block.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedBlock {
    pub content: String,
    pub span: ByteSpan,
    pub source_map: SourceMap,
}

/// Fallback detection for a frontend that has
/// neither a file extension nor an explicit `fileType` to go on: markdown
/// iff the source contains the literal substring `` ```thalo ``, else
/// thalo.
pub fn detect_file_type(source: &str) -> FileType {
    if source.contains("```thalo") {
        FileType::Markdown
    } else {
        FileType::Thalo
    }
}

/// Resolves a file's type from its extension first, falling back to
/// [`detect_file_type`] for anything else.
pub fn file_type_for_extension(extension: Option<&str>, source: &str) -> FileType {
    match extension {
        Some("thalo") => FileType::Thalo,
        Some("md") | Some("markdown") => FileType::Markdown,
        _ => detect_file_type(source),
    }
}

/// `extractBlocks(source, fileType)`.
pub fn extract_blocks(source: &str, file_type: FileType) -> Vec<ExtractedBlock> {
    match file_type {
        FileType::Thalo => vec![ExtractedBlock {
            content: source.to_string(),
            span: ByteSpan::whole(source),
            source_map: SourceMap::IDENTITY,
        }],
        FileType::Markdown => extract_markdown_blocks(source),
    }
}

struct SourceLine<'a> {
    start: usize,
    text: &'a str,
}

fn split_lines(source: &str) -> Vec<SourceLine<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            out.push(SourceLine { start, text: &source[start..i] });
            start = i + 1;
        }
    }
    if start <= source.len() {
        out.push(SourceLine { start, text: &source[start..] });
    }
    out
}

/// Returns `(fence_char, fence_len, indent, info_string)` if `line` opens a
/// fenced code block, per CommonMark: up to three leading spaces, three or
/// more identical backtick-or-tilde characters, then an info string.
fn fence_open(text: &str) -> Option<(u8, usize, usize, &str)> {
    let indent = text.len() - text.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &text[indent..];
    let fence_char = rest.as_bytes().first().copied()?;
    if fence_char != b'`' && fence_char != b'~' {
        return None;
    }
    let fence_len = rest.bytes().take_while(|&b| b == fence_char).count();
    if fence_len < 3 {
        return None;
    }
    let info = rest[fence_len..].trim();
    Some((fence_char, fence_len, indent, info))
}

/// Returns true if `line` closes a fence opened with `fence_char`/`fence_len`.
fn fence_close(text: &str, fence_char: u8, fence_len: usize) -> bool {
    let indent = text.len() - text.trim_start_matches(' ').len();
    if indent > 3 {
        return false;
    }
    let rest = &text[indent..];
    if !rest.bytes().all(|b| b == fence_char) {
        return false;
    }
    rest.len() >= fence_len
}

fn extract_markdown_blocks(source: &str) -> Vec<ExtractedBlock> {
    let lines = split_lines(source);
    let mut blocks = Vec::new();
    let mut row: u32 = 0;
    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        if let Some((fence_char, fence_len, indent, info)) = fence_open(line.text) {
            let is_thalo = info == "thalo";
            let content_start_row = row + 1;
            let content_char_start = line.start + line.text.len() + 1; // skip the fence line's newline
            let mut content_lines: Vec<&str> = Vec::new();
            let mut j = i + 1;
            let mut closed_at_char = content_char_start;
            while j < lines.len() {
                if fence_close(lines[j].text, fence_char, fence_len) {
                    break;
                }
                content_lines.push(lines[j].text);
                closed_at_char = lines[j].start + lines[j].text.len() + 1;
                j += 1;
            }
            if is_thalo {
                let content = content_lines.join("\n");
                let content = if content_lines.is_empty() { String::new() } else { content + "\n" };
                let span = ByteSpan::new(content_char_start, closed_at_char.min(source.len()));
                let source_map = SourceMap::new(content_char_start, content_start_row, indent as u32);
                blocks.push(ExtractedBlock { content, span, source_map });
            }
            row += (j - i + 1) as u32;
            i = j + 1;
        } else {
            row += 1;
            i += 1;
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thalo_file_is_a_single_identity_block() {
        let blocks = extract_blocks("hello", FileType::Thalo);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].source_map, SourceMap::IDENTITY);
        assert_eq!(blocks[0].content, "hello");
    }

    #[test]
    fn markdown_extracts_only_thalo_fences() {
        let source = "# Doc\n\n```thalo\n2026-01-05T18:00Z create lore \"E\"\n```\n\n```rust\nfn f() {}\n```\n";
        let blocks = extract_blocks(source, FileType::Markdown);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].content.starts_with("2026-01-05T18:00Z create lore"));
    }

    #[test]
    fn block_source_map_locates_file_absolute_position() {
        let source = "intro\n\n```thalo\nline one\nline two\n```\n";
        let blocks = extract_blocks(source, FileType::Markdown);
        let block = &blocks[0];
        assert_eq!(block.content, "line one\nline two\n");
        let file_pos = block.source_map.to_file_position(thalo_position::Position::new(1, 0));
        assert_eq!(file_pos, thalo_position::Position::new(4, 0));
    }

    #[test]
    fn detects_markdown_from_fence_substring() {
        assert_eq!(detect_file_type("plain\n"), FileType::Thalo);
        assert_eq!(detect_file_type("intro\n```thalo\nx\n```\n"), FileType::Markdown);
    }

    #[test]
    fn extension_wins_over_content_sniffing() {
        assert_eq!(file_type_for_extension(Some("thalo"), "```thalo\n"), FileType::Thalo);
        assert_eq!(file_type_for_extension(Some("md"), "plain"), FileType::Markdown);
        assert_eq!(file_type_for_extension(None, "intro\n```thalo\nx\n```\n"), FileType::Markdown);
        assert_eq!(file_type_for_extension(None, "plain"), FileType::Thalo);
    }

    #[test]
    fn two_fenced_blocks_both_extracted_with_distinct_line_offsets() {
        let source = "one\n```thalo\nA\n```\ntwo\n```thalo\nB\n```\n";
        let blocks = extract_blocks(source, FileType::Markdown);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].content, "A\n");
        assert_eq!(blocks[1].content, "B\n");
        assert!(blocks[1].source_map.line_offset > blocks[0].source_map.line_offset);
    }
}
