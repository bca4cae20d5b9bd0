//! Recursive-descent parser producing a [`CstNode`] tree that implements
//! the grammar in `grammar.js` over the line classification in
//! [`crate::lexer`]. This is the pure-Rust path described in SPEC_FULL.md
//! section 4.1; it never goes through the generated `parser.c`.

use crate::cst::{CstKind, CstNode};
use crate::lexer::{split_lines, Line};
use once_cell::sync::Lazy;
use regex::Regex;
use thalo_position::{Location, Position};

static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})T(\d{2}:\d{2})(Z|[+-]\d{2}:\d{2})?$").unwrap());
static METADATA_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-z][a-zA-Z0-9_-]*)\s*:\s?(.*)$").unwrap());
static DATETIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Parses `source` into a `source_file` concrete syntax tree.
pub fn parse(source: &str) -> CstNode {
    tracing::trace!(bytes = source.len(), "parsing source into concrete syntax tree");
    let lines = split_lines(source);
    let mut entries = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        while i < lines.len() && lines[i].is_blank {
            i += 1;
        }
        if i >= lines.len() {
            break;
        }
        let header_idx = i;
        i += 1;
        let body_start = i;
        while i < lines.len() && !(lines[i].indent == 0 && !lines[i].is_blank) {
            i += 1;
        }
        let body_end = i;
        entries.push(parse_entry(&lines, header_idx, body_start, body_end));
    }

    let start = entries.first().map(|e| e.location).unwrap_or(Location::new(
        0,
        source.len(),
        Position::new(0, 0),
        Position::new(0, 0),
    ));
    let end = entries.last().map(|e| e.location).unwrap_or(start);
    let location = Location::new(start.start_index, end.end_index, start.start_position, end.end_position);
    CstNode::new(CstKind::SourceFile, location, "").with_children(entries)
}

fn line_location(row: usize, line: &Line, start_col: usize, end_col: usize) -> Location {
    Location::new(
        line.start + start_col,
        line.start + end_col,
        Position::new(row as u32, start_col as u32),
        Position::new(row as u32, end_col as u32),
    )
}

fn error_node(row: usize, line: &Line) -> CstNode {
    CstNode::new(CstKind::Error, line_location(row, line, 0, line.content.len()), line.content.to_string())
}

fn parse_entry(lines: &[Line], header_idx: usize, body_start: usize, body_end: usize) -> CstNode {
    let header_line = &lines[header_idx];
    let tokens = HeaderTokens::tokenize(header_line.content);
    let directive = tokens.directive.as_deref().unwrap_or("");

    match directive {
        "create" | "update" => {
            let header = build_header(CstKind::Header, header_idx, header_line, &tokens);
            parse_instance_like(CstKind::InstanceEntry, header, lines, body_start, body_end)
        }
        "define-entity" | "alter-entity" => {
            let header = build_header(CstKind::SchemaHeader, header_idx, header_line, &tokens);
            parse_schema_entry(header, lines, body_start, body_end)
        }
        "define-synthesis" => {
            let header = build_header(CstKind::SynthesisHeader, header_idx, header_line, &tokens);
            parse_instance_like(CstKind::SynthesisEntry, header, lines, body_start, body_end)
        }
        "actualize-synthesis" => {
            let header = build_header(CstKind::ActualizeHeader, header_idx, header_line, &tokens);
            parse_actualize_entry(header, lines, body_start, body_end)
        }
        _ => {
            // Unknown directive: wrap the whole entry as an error region but
            // keep scanning the body for location purposes.
            let end_line = if body_end > body_start { &lines[body_end - 1] } else { header_line };
            let location = Location::new(
                header_line.start,
                end_line.end,
                Position::new(header_idx as u32, 0),
                Position::new((body_end.max(header_idx + 1) - 1) as u32, end_line.content.len() as u32),
            );
            CstNode::new(CstKind::Error, location, header_line.content.to_string())
        }
    }
}

struct HeaderTokens {
    timestamp: Option<(String, usize, usize)>,
    directive: Option<String>,
    directive_span: Option<(usize, usize)>,
    entity: Option<(String, usize, usize)>,
    title: Option<(String, usize, usize)>,
    link: Option<(String, usize, usize)>,
    tags: Vec<(String, usize, usize)>,
}

impl HeaderTokens {
    fn tokenize(content: &str) -> Self {
        let mut out =
            HeaderTokens { timestamp: None, directive: None, directive_span: None, entity: None, title: None, link: None, tags: Vec::new() };
        let mut cursor = 0usize;

        macro_rules! skip_ws {
            () => {
                while cursor < content.len() && content.as_bytes()[cursor] == b' ' {
                    cursor += 1;
                }
            };
        }

        skip_ws!();
        let ts_start = cursor;
        while cursor < content.len() && content.as_bytes()[cursor] != b' ' {
            cursor += 1;
        }
        out.timestamp = Some((content[ts_start..cursor].to_string(), ts_start, cursor));
        skip_ws!();

        let dir_start = cursor;
        while cursor < content.len() && content.as_bytes()[cursor] != b' ' {
            cursor += 1;
        }
        out.directive = Some(content[dir_start..cursor].to_string());
        out.directive_span = Some((dir_start, cursor));
        skip_ws!();

        let ent_start = cursor;
        while cursor < content.len() && content.as_bytes()[cursor] != b' ' {
            cursor += 1;
        }
        out.entity = Some((content[ent_start..cursor].to_string(), ent_start, cursor));
        skip_ws!();

        if cursor < content.len() && content.as_bytes()[cursor] == b'"' {
            let title_start = cursor;
            cursor += 1;
            while cursor < content.len() && content.as_bytes()[cursor] != b'"' {
                cursor += 1;
            }
            if cursor < content.len() {
                cursor += 1;
            }
            out.title = Some((content[title_start..cursor].to_string(), title_start, cursor));
        }
        skip_ws!();

        while cursor < content.len() {
            let tok_start = cursor;
            while cursor < content.len() && content.as_bytes()[cursor] != b' ' {
                cursor += 1;
            }
            let tok = &content[tok_start..cursor];
            if let Some(stripped) = tok.strip_prefix('^') {
                out.link = Some((stripped.to_string(), tok_start, cursor));
            } else if let Some(stripped) = tok.strip_prefix('#') {
                out.tags.push((stripped.to_string(), tok_start, cursor));
            }
            skip_ws!();
        }

        out
    }
}

fn build_header(kind: CstKind, row: usize, line: &Line, tokens: &HeaderTokens) -> CstNode {
    let mut children = Vec::new();

    if let Some((text, s, e)) = &tokens.timestamp {
        children.push(build_timestamp(row, line, text, *s, *e));
    }
    if let Some((s, e)) = tokens.directive_span {
        let text = tokens.directive.clone().unwrap_or_default();
        children.push(CstNode::new(CstKind::Directive, line_location(row, line, s, e), text));
    }
    if let Some((text, s, e)) = &tokens.entity {
        children.push(CstNode::new(CstKind::Entity, line_location(row, line, *s, *e), text.clone()));
    }
    if let Some((text, s, e)) = &tokens.title {
        let inner = text.trim_matches('"').to_string();
        children.push(CstNode::new(CstKind::Title, line_location(row, line, *s, *e), inner));
    }
    if let Some((text, s, e)) = &tokens.link {
        children.push(CstNode::new(CstKind::LinkDef, line_location(row, line, *s, *e), text.clone()));
    }
    for (text, s, e) in &tokens.tags {
        children.push(CstNode::new(CstKind::Tag, line_location(row, line, *s, *e), text.clone()));
    }

    let end_col = line.content.len();
    let location = line_location(row, line, 0, end_col);
    CstNode::new(kind, location, line.content.to_string()).with_children(children)
}

fn build_timestamp(row: usize, line: &Line, text: &str, start_col: usize, end_col: usize) -> CstNode {
    let location = line_location(row, line, start_col, end_col);
    let mut node = CstNode::new(CstKind::Timestamp, location, text.to_string());
    if let Some(caps) = TIMESTAMP_RE.captures(text) {
        let date_str = &caps[1];
        let time_str = &caps[2];
        let date_end = start_col + date_str.len();
        node.children.push(CstNode::new(CstKind::Date, line_location(row, line, start_col, date_end), date_str.to_string()));
        let time_start = date_end + 1; // skip 'T'
        let time_end = time_start + time_str.len();
        node.children.push(CstNode::new(CstKind::Time, line_location(row, line, time_start, time_end), time_str.to_string()));
        if let Some(tz) = caps.get(3) {
            let tz_start = time_end;
            let tz_end = tz_start + tz.as_str().len();
            node.children
                .push(CstNode::new(CstKind::Timezone, line_location(row, line, tz_start, tz_end), tz.as_str().to_string()));
        }
    } else {
        node.children.push(error_node(row, line));
    }
    node
}

fn parse_instance_like(kind: CstKind, header: CstNode, lines: &[Line], body_start: usize, body_end: usize) -> CstNode {
    let mut children = vec![header.clone()];
    let mut i = body_start;

    while i < body_end {
        let line = &lines[i];
        if line.is_blank {
            i += 1;
            continue;
        }
        let trimmed = line.trimmed_content();
        if METADATA_KEY_RE.is_match(trimmed) {
            children.push(parse_metadata(i, line));
            i += 1;
        } else {
            break;
        }
    }

    // Skip the gap between metadata and content (CONTENT_BLANK).
    while i < body_end && lines[i].is_blank {
        i += 1;
    }

    if i < body_end {
        let content_start = i;
        children.push(parse_content_block(lines, content_start, body_end));
    }

    let end = children.last().map(|c| c.location).unwrap_or(header.location);
    let location = Location::new(header.location.start_index, end.end_index, header.location.start_position, end.end_position);
    CstNode::new(kind, location, "").with_children(children)
}

fn parse_actualize_entry(header: CstNode, lines: &[Line], body_start: usize, body_end: usize) -> CstNode {
    let mut children = vec![header.clone()];
    for i in body_start..body_end {
        let line = &lines[i];
        if line.is_blank {
            continue;
        }
        let trimmed = line.trimmed_content();
        if METADATA_KEY_RE.is_match(trimmed) {
            children.push(parse_metadata(i, line));
        } else {
            children.push(error_node(i, line));
        }
    }
    let end = children.last().map(|c| c.location).unwrap_or(header.location);
    let location = Location::new(header.location.start_index, end.end_index, header.location.start_position, end.end_position);
    CstNode::new(CstKind::ActualizeEntry, location, "").with_children(children)
}

fn parse_metadata(row: usize, line: &Line) -> CstNode {
    let trimmed = line.trimmed_content();
    let col0 = line.indent;
    if let Some(caps) = METADATA_KEY_RE.captures(trimmed) {
        let key_text = &caps[1];
        let value_text = &caps[2];
        let key_start = col0;
        let key_end = key_start + key_text.len();
        let key_node = CstNode::new(CstKind::Key, line_location(row, line, key_start, key_end), key_text.to_string());
        let value_start = line.content.len() - value_text.len();
        let value_node = parse_value(row, line, value_text, value_start);
        let location = line_location(row, line, col0, line.content.len());
        CstNode::new(CstKind::Metadata, location, "").with_children(vec![key_node, value_node])
    } else {
        error_node(row, line)
    }
}

fn parse_value(row: usize, line: &Line, text: &str, start_col: usize) -> CstNode {
    let text = text.trim_end();
    let end_col = start_col + text.len();
    let loc = line_location(row, line, start_col, end_col);

    if let Some(elements) = split_top_level(text, ',') {
        if elements.len() > 1 {
            let mut children = Vec::new();
            let mut cursor = start_col;
            for raw in &elements {
                let elem_text = raw.trim_start();
                let leading_ws = raw.len() - elem_text.len();
                let elem_start = cursor + leading_ws;
                children.push(parse_array_element(row, line, elem_text.trim_end(), elem_start));
                cursor += raw.len() + 1; // +1 for the comma
            }
            return CstNode::new(CstKind::ValueArray, loc, text.to_string()).with_children(children);
        }
    }

    parse_array_element(row, line, text, start_col)
}

fn parse_array_element(row: usize, line: &Line, text: &str, start_col: usize) -> CstNode {
    let end_col = start_col + text.len();
    let loc = line_location(row, line, start_col, end_col);

    if text.starts_with('"') && text.ends_with('"') && text.len() >= 2 {
        CstNode::new(CstKind::ValueQuotedString, loc, text[1..text.len() - 1].to_string())
    } else if let Some(stripped) = text.strip_prefix('^') {
        CstNode::new(CstKind::ValueLinkRef, loc, stripped.to_string())
    } else if let Some((left, right)) = split_date_range(text) {
        let mut node = CstNode::new(CstKind::ValueDateRange, loc, text.to_string());
        let left_end = start_col + left.len();
        node.children.push(CstNode::new(CstKind::Date, line_location(row, line, start_col, left_end), left.to_string()));
        let right_start = end_col - right.len();
        node.children.push(CstNode::new(CstKind::Date, line_location(row, line, right_start, end_col), right.to_string()));
        node
    } else if DATETIME_RE.is_match(text) {
        CstNode::new(CstKind::ValueDatetime, loc, text.to_string())
    } else {
        CstNode::new(CstKind::ValueQuery, loc, text.to_string())
    }
}

/// Splits on a top-level delimiter (not inside a quoted string). Returns
/// `None` if the delimiter never appears outside quotes.
fn split_top_level(text: &str, delim: char) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut found = false;
    for ch in text.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c == delim && !in_quotes => {
                found = true;
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    parts.push(current);
    if found {
        Some(parts)
    } else {
        None
    }
}

fn split_date_range(text: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = text.splitn(2, '~').collect();
    if parts.len() != 2 {
        return None;
    }
    let left = parts[0].trim();
    let right = parts[1].trim();
    if DATETIME_RE.is_match(left) && DATETIME_RE.is_match(right) {
        Some((left, right))
    } else {
        None
    }
}

fn parse_content_block(lines: &[Line], start: usize, end: usize) -> CstNode {
    let mut children = Vec::new();
    let mut first_loc = None;
    let mut last_loc = None;
    for i in start..end {
        let line = &lines[i];
        if line.is_blank {
            continue;
        }
        let node = parse_content_line(i, line);
        if first_loc.is_none() {
            first_loc = Some(node.location);
        }
        last_loc = Some(node.location);
        children.push(node);
    }
    let location = match (first_loc, last_loc) {
        (Some(f), Some(l)) => Location::new(f.start_index, l.end_index, f.start_position, l.end_position),
        _ => Location::new(0, 0, Position::new(0, 0), Position::new(0, 0)),
    };
    CstNode::new(CstKind::ContentBlock, location, "").with_children(children)
}

fn parse_content_line(row: usize, line: &Line) -> CstNode {
    let trimmed = line.trimmed_content();
    let col0 = line.indent;
    let loc = line_location(row, line, col0, line.content.len());
    if let Some(rest) = trimmed.strip_prefix("# ") {
        CstNode::new(CstKind::MdHeader, loc, rest.to_string())
    } else if trimmed == "#" {
        CstNode::new(CstKind::MdHeader, loc, String::new())
    } else if let Some(rest) = trimmed.strip_prefix("- ") {
        CstNode::new(CstKind::BulletItem, loc, rest.to_string())
    } else {
        CstNode::new(CstKind::PlainText, loc, trimmed.to_string())
    }
}

fn parse_schema_entry(header: CstNode, lines: &[Line], body_start: usize, body_end: usize) -> CstNode {
    let mut children = vec![header.clone()];
    let base_indent = if body_start < body_end { lines[body_start].indent } else { 0 };

    let mut i = body_start;
    while i < body_end {
        let line = &lines[i];
        if line.is_blank {
            i += 1;
            continue;
        }
        if line.indent != base_indent {
            children.push(error_node(i, line));
            i += 1;
            continue;
        }
        let trimmed = line.trimmed_content();
        let block_kind = if trimmed.starts_with("# Remove Metadata") {
            Some(CstKind::RemoveMetadataSection)
        } else if trimmed.starts_with("# Remove Sections") {
            Some(CstKind::RemoveSectionsSection)
        } else if trimmed.starts_with("# Metadata") {
            Some(CstKind::MetadataSection)
        } else if trimmed.starts_with("# Sections") {
            Some(CstKind::SectionsSection)
        } else {
            None
        };

        let Some(block_kind) = block_kind else {
            children.push(error_node(i, line));
            i += 1;
            continue;
        };

        let header_loc = line_location(i, line, 0, line.content.len());
        let mut block_children = Vec::new();
        let mut j = i + 1;
        while j < body_end {
            let inner = &lines[j];
            if inner.is_blank {
                j += 1;
                continue;
            }
            if inner.indent <= base_indent {
                break;
            }
            match block_kind {
                CstKind::MetadataSection => block_children.push(parse_field_def(j, inner)),
                CstKind::SectionsSection => block_children.push(parse_section_def(j, inner)),
                CstKind::RemoveMetadataSection | CstKind::RemoveSectionsSection => {
                    let text = inner.trimmed_content().to_string();
                    let loc = line_location(j, inner, inner.indent, inner.content.len());
                    block_children.push(CstNode::new(CstKind::Identifier, loc, text));
                }
                _ => unreachable!(),
            }
            j += 1;
        }
        let end_loc = block_children.last().map(|c| c.location).unwrap_or(header_loc);
        let block_loc = Location::new(header_loc.start_index, end_loc.end_index, header_loc.start_position, end_loc.end_position);
        children.push(CstNode::new(block_kind, block_loc, "").with_children(block_children));
        i = j;
    }

    let end = children.last().map(|c| c.location).unwrap_or(header.location);
    let location = Location::new(header.location.start_index, end.end_index, header.location.start_position, end.end_position);
    CstNode::new(CstKind::SchemaEntry, location, "").with_children(children)
}

fn parse_field_def(row: usize, line: &Line) -> CstNode {
    let trimmed = line.trimmed_content();
    let col0 = line.indent;
    let loc = line_location(row, line, col0, line.content.len());

    // name[?]: type [= default] [; "description"]
    let Some(colon_idx) = trimmed.find(':') else {
        return error_node(row, line);
    };
    let key_raw = trimmed[..colon_idx].trim_end();
    let key_start = col0;
    let key_end = key_start + key_raw.len();
    let key_node = CstNode::new(CstKind::Key, line_location(row, line, key_start, key_end), key_raw.to_string());

    let rest = trimmed[colon_idx + 1..].trim_start();
    let rest_start = col0 + (trimmed.len() - rest.len());

    let (type_part, default_part, desc_part) = split_field_tail(rest);

    let mut children = vec![key_node];
    children.push(parse_type(row, line, type_part.trim(), rest_start));

    if let Some(default_text) = default_part {
        let trimmed_default = default_text.trim();
        let default_start = col0 + (trimmed.len() - rest.len()) + find_sub_offset(rest, default_text);
        let loc = line_location(row, line, default_start, default_start + trimmed_default.len());
        children.push(CstNode::new(CstKind::DefaultValue, loc, trimmed_default.to_string()));
    }
    if let Some(desc_text) = desc_part {
        let inner = desc_text.trim().trim_matches('"').to_string();
        let desc_start = col0 + (trimmed.len() - desc_text.trim().len());
        let loc = line_location(row, line, desc_start, desc_start + inner.len());
        children.push(CstNode::new(CstKind::Description, loc, inner));
    }

    CstNode::new(CstKind::FieldDef, loc, "").with_children(children)
}

/// Byte offset of `needle`'s start within `haystack`, assuming `needle` is
/// a suffix-derived substr obtained via `split_field_tail`.
fn find_sub_offset(haystack: &str, needle: &str) -> usize {
    let haystack_ptr = haystack.as_ptr() as usize;
    let needle_ptr = needle.as_ptr() as usize;
    needle_ptr.saturating_sub(haystack_ptr)
}

/// Splits `name?: type = default ; description` tail (everything after the
/// first `:`) into (type text, optional default text, optional description
/// text), honoring the fact that `;` only ever separates the description.
fn split_field_tail(rest: &str) -> (&str, Option<&str>, Option<&str>) {
    let (before_desc, desc) = match rest.find(';') {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };
    let (type_part, default_part) = match before_desc.find('=') {
        Some(idx) => (&before_desc[..idx], Some(&before_desc[idx + 1..])),
        None => (before_desc, None),
    };
    (type_part, default_part, desc)
}

fn parse_section_def(row: usize, line: &Line) -> CstNode {
    let trimmed = line.trimmed_content();
    let col0 = line.indent;
    let loc = line_location(row, line, col0, line.content.len());
    let (name_part, desc_part) = match trimmed.find(';') {
        Some(idx) => (&trimmed[..idx], Some(&trimmed[idx + 1..])),
        None => (trimmed, None),
    };
    let mut children = Vec::new();
    if let Some(desc) = desc_part {
        let inner = desc.trim().trim_matches('"').to_string();
        children.push(CstNode::new(CstKind::Description, loc, inner));
    }
    CstNode::new(CstKind::SectionDef, loc, name_part.trim().to_string()).with_children(children)
}

fn parse_type(row: usize, line: &Line, text: &str, start_col: usize) -> CstNode {
    let text = text.trim();
    let end_col = start_col + text.len();
    let loc = line_location(row, line, start_col, end_col);

    if let Some(inner) = text.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        let inner_loc_start = start_col + 1;
        return CstNode::new(CstKind::TypeGroup, loc, text.to_string())
            .with_children(vec![parse_type(row, line, inner, inner_loc_start)]);
    }
    if let Some(base) = text.strip_suffix("[]") {
        return CstNode::new(CstKind::TypeArray, loc, text.to_string())
            .with_children(vec![parse_type(row, line, base, start_col)]);
    }
    if let Some((left, right)) = split_top_level_union(text) {
        let right_start = start_col + text.len() - right.len();
        return CstNode::new(CstKind::TypeUnion, loc, text.to_string()).with_children(vec![
            parse_type(row, line, left, start_col),
            parse_type(row, line, right, right_start),
        ]);
    }
    if text.starts_with('"') && text.ends_with('"') {
        return CstNode::new(CstKind::TypeLiteral, loc, text[1..text.len().saturating_sub(1)].to_string());
    }
    match text {
        "string" | "datetime" | "date-range" | "link" => CstNode::new(CstKind::TypePrimitive, loc, text.to_string()),
        _ => CstNode::new(CstKind::Error, loc, text.to_string()),
    }
}

fn split_top_level_union(text: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            '|' if depth == 0 => return Some((text[..i].trim(), text[i + 1..].trim())),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn parses_simple_instance_entry() {
        let source = "2026-01-05T18:00Z create lore \"E\" #t\n  type: \"fact\"\n  subject: \"x\"\n\n  # Summary\n  body.\n";
        let tree = parse(source);
        assert_eq!(tree.children.len(), 1);
        let entry = &tree.children[0];
        assert_eq!(entry.kind, CstKind::InstanceEntry);
        let header = entry.child_of_kind(CstKind::Header).unwrap();
        assert_eq!(header.child_of_kind(CstKind::Entity).unwrap().text, "lore");
        assert_eq!(header.child_of_kind(CstKind::Title).unwrap().text, "E");
        let metadata: Vec<_> = entry.children_of_kind(CstKind::Metadata).collect();
        assert_eq!(metadata.len(), 2);
        let content = entry.child_of_kind(CstKind::ContentBlock).unwrap();
        assert_eq!(content.children.len(), 2);
        assert_eq!(content.children[0].kind, CstKind::MdHeader);
    }

    #[test]
    fn parses_link_and_tags() {
        let source = "2026-01-05T18:00Z create lore \"E\" ^abc #t1 #t2\n  k: \"v\"\n";
        let tree = parse(source);
        let header = tree.children[0].child_of_kind(CstKind::Header).unwrap();
        assert_eq!(header.child_of_kind(CstKind::LinkDef).unwrap().text, "abc");
        assert_eq!(header.children_of_kind(CstKind::Tag).count(), 2);
    }

    #[test]
    fn parses_value_array() {
        let source = "2026-01-05T18:00Z create lore \"E\"\n  k: \"a\", \"b\", ^c\n";
        let tree = parse(source);
        let metadata = tree.children[0].child_of_kind(CstKind::Metadata).unwrap();
        let value = &metadata.children[1];
        assert_eq!(value.kind, CstKind::ValueArray);
        assert_eq!(value.children.len(), 3);
    }

    #[test]
    fn parses_schema_entry_blocks() {
        let source = "2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Metadata\n    subject: string\n  # Sections\n    Summary\n";
        let tree = parse(source);
        let entry = &tree.children[0];
        assert_eq!(entry.kind, CstKind::SchemaEntry);
        let meta_section = entry.child_of_kind(CstKind::MetadataSection).unwrap();
        assert_eq!(meta_section.children[0].kind, CstKind::FieldDef);
        let sections = entry.child_of_kind(CstKind::SectionsSection).unwrap();
        assert_eq!(sections.children[0].text, "Summary");
    }

    #[test]
    fn multiple_entries_separated_by_blank_lines() {
        let source = "2026-01-05T18:00Z create lore \"A\"\n  k: \"v\"\n\n2026-01-06T18:00Z create lore \"B\"\n  k: \"v\"\n";
        let tree = parse(source);
        assert_eq!(tree.children.len(), 2);
    }
}
