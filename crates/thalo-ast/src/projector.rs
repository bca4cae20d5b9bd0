//! Walks a [`thalo_grammar::CstNode`] tree into the typed AST. Every branch
//! has a fallback for the shape it cannot recognize, so a CST produced from
//! malformed input always projects to *something* rather than panicking —
//! the error-sibling form from data-model invariant 4.

use thalo_grammar::{CstKind, CstNode};
use thalo_position::Location;

use crate::content::{Content, ContentChild};
use crate::entry::{ActualizeEntry, Entry, InstanceEntry, SchemaDirective, SchemaEntry, SourceFile, SynthesisEntry};
use crate::header::{Directive, Header, SimpleDateParts, TimeParts, Timestamp, Timezone};
use crate::syntax_error::{Parsed, SyntaxError};
use crate::types::{FieldDefinition, PrimitiveType, SectionDefinition, TypeExpression};
use crate::value::{Metadata, SimpleDate, ValueContent};

const HEADER_KINDS: [CstKind; 4] = [CstKind::Header, CstKind::SchemaHeader, CstKind::SynthesisHeader, CstKind::ActualizeHeader];

/// Projects a `source_file` concrete syntax tree, as produced by
/// `thalo_grammar::parse`, into a [`SourceFile`] AST.
pub fn project(cst: &CstNode) -> SourceFile {
    let entries = cst.children.iter().map(project_entry).collect();
    SourceFile { entries, location: cst.location }
}

fn project_entry(node: &CstNode) -> Entry {
    match node.kind {
        CstKind::InstanceEntry => Entry::Instance(project_instance(node)),
        CstKind::SchemaEntry => Entry::Schema(project_schema(node)),
        CstKind::SynthesisEntry => Entry::Synthesis(project_synthesis(node)),
        CstKind::ActualizeEntry => Entry::Actualize(project_actualize(node)),
        _ => Entry::Error(SyntaxError { raw: node.text.clone(), location: node.location }),
    }
}

fn find_header(node: &CstNode) -> Option<&CstNode> {
    node.children.iter().find(|c| HEADER_KINDS.contains(&c.kind))
}

fn project_instance(node: &CstNode) -> InstanceEntry {
    let header = find_header(node).map(project_header).unwrap_or_else(|| empty_header(node.location));
    let metadata = node.children_of_kind(CstKind::Metadata).map(project_metadata).collect();
    let content = node.child_of_kind(CstKind::ContentBlock).map(project_content);
    InstanceEntry { header, metadata, content, location: node.location }
}

fn project_synthesis(node: &CstNode) -> SynthesisEntry {
    let header = find_header(node).map(project_header).unwrap_or_else(|| empty_header(node.location));
    let metadata = node.children_of_kind(CstKind::Metadata).map(project_metadata).collect();
    let content = node.child_of_kind(CstKind::ContentBlock).map(project_content);
    SynthesisEntry { header, metadata, content, location: node.location }
}

fn project_actualize(node: &CstNode) -> ActualizeEntry {
    let header = find_header(node).map(project_header).unwrap_or_else(|| empty_header(node.location));
    let metadata = node.children_of_kind(CstKind::Metadata).map(project_metadata).collect();
    ActualizeEntry { header, metadata, location: node.location }
}

fn project_schema(node: &CstNode) -> SchemaEntry {
    let header = find_header(node).map(project_header).unwrap_or_else(|| empty_header(node.location));
    let directive = match header.directive {
        Directive::AlterEntity => SchemaDirective::Alter,
        _ => SchemaDirective::Define,
    };
    let description = header.title.clone();

    let fields = node
        .child_of_kind(CstKind::MetadataSection)
        .map(|block| block.children.iter().filter(|c| c.kind == CstKind::FieldDef).map(project_field_def).collect())
        .unwrap_or_default();
    let sections = node
        .child_of_kind(CstKind::SectionsSection)
        .map(|block| block.children.iter().filter(|c| c.kind == CstKind::SectionDef).map(project_section_def).collect())
        .unwrap_or_default();
    let remove_metadata = node
        .child_of_kind(CstKind::RemoveMetadataSection)
        .map(|block| block.children.iter().map(|c| c.text.clone()).collect())
        .unwrap_or_default();
    let remove_sections = node
        .child_of_kind(CstKind::RemoveSectionsSection)
        .map(|block| block.children.iter().map(|c| c.text.clone()).collect())
        .unwrap_or_default();

    SchemaEntry { header, directive, description, fields, sections, remove_metadata, remove_sections, location: node.location }
}

fn empty_header(location: Location) -> Header {
    Header {
        timestamp: Parsed::Error(SyntaxError { raw: String::new(), location }),
        directive: Directive::Create,
        entity: String::new(),
        title: None,
        link: None,
        tags: Vec::new(),
        location,
    }
}

fn project_header(node: &CstNode) -> Header {
    let timestamp = node
        .child_of_kind(CstKind::Timestamp)
        .map(project_timestamp)
        .unwrap_or_else(|| Parsed::Error(SyntaxError { raw: node.text.clone(), location: node.location }));

    let directive_text = node.child_of_kind(CstKind::Directive).map(|c| c.text.as_str()).unwrap_or("");
    // The parser only ever builds a header node after matching one of these
    // keywords, so this always succeeds in practice.
    let directive = Directive::parse(directive_text).unwrap_or(Directive::Create);

    let entity = node.child_of_kind(CstKind::Entity).map(|c| c.text.clone()).unwrap_or_default();
    let title = node.child_of_kind(CstKind::Title).map(|c| c.text.clone());
    let link = node.child_of_kind(CstKind::LinkDef).map(|c| c.text.clone());
    let tags = node.children_of_kind(CstKind::Tag).map(|c| c.text.clone()).collect();

    Header { timestamp, directive, entity, title, link, tags, location: node.location }
}

fn project_timestamp(node: &CstNode) -> Parsed<Timestamp> {
    if node.child_of_kind(CstKind::Error).is_some() {
        return Parsed::Error(SyntaxError { raw: node.text.clone(), location: node.location });
    }
    let Some(date_node) = node.child_of_kind(CstKind::Date) else {
        return Parsed::Error(SyntaxError { raw: node.text.clone(), location: node.location });
    };
    let Some(time_node) = node.child_of_kind(CstKind::Time) else {
        return Parsed::Error(SyntaxError { raw: node.text.clone(), location: node.location });
    };
    let Some(date) = parse_date_parts(&date_node.text) else {
        return Parsed::Error(SyntaxError { raw: node.text.clone(), location: node.location });
    };
    let Some(time) = parse_time_parts(&time_node.text) else {
        return Parsed::Error(SyntaxError { raw: node.text.clone(), location: node.location });
    };
    let timezone = node.child_of_kind(CstKind::Timezone).map(|tz| parse_timezone(&tz.text));
    Parsed::Ok(Timestamp { date, time, timezone })
}

fn parse_date_parts(text: &str) -> Option<SimpleDateParts> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    Some(SimpleDateParts { year: text[0..4].parse().ok()?, month: text[5..7].parse().ok()?, day: text[8..10].parse().ok()? })
}

fn parse_time_parts(text: &str) -> Option<TimeParts> {
    let (hour, minute) = text.split_once(':')?;
    Some(TimeParts { hour: hour.parse().ok()?, minute: minute.parse().ok()? })
}

fn parse_timezone(text: &str) -> Timezone {
    if text == "Z" {
        return Timezone::Utc;
    }
    let sign = if text.starts_with('-') { -1 } else { 1 };
    let rest = &text[1..];
    let (hour, minute) = rest.split_once(':').unwrap_or(("0", "0"));
    Timezone::Offset { sign, hour: hour.parse().unwrap_or(0), minute: minute.parse().unwrap_or(0) }
}

fn project_metadata(node: &CstNode) -> Metadata {
    let key = node.child_of_kind(CstKind::Key).map(|c| c.text.clone()).unwrap_or_default();
    let value_node = node.children.iter().find(|c| c.kind != CstKind::Key);
    let content = value_node.map(project_value).unwrap_or_else(|| ValueContent::QuotedString(String::new()));
    let raw = value_node.map(|v| v.text.clone()).unwrap_or_default();
    Metadata { key, raw, content, location: node.location }
}

fn project_value(node: &CstNode) -> ValueContent {
    match node.kind {
        CstKind::ValueQuotedString => ValueContent::QuotedString(node.text.clone()),
        CstKind::ValueLinkRef => ValueContent::Link(node.text.clone()),
        CstKind::ValueDatetime => ValueContent::Datetime(simple_date_or_epoch(&node.text)),
        CstKind::ValueDateRange => {
            let mut dates = node.children_of_kind(CstKind::Date);
            let start = dates.next().map(|d| simple_date_or_epoch(&d.text)).unwrap_or_default();
            let end = dates.next().map(|d| simple_date_or_epoch(&d.text)).unwrap_or(start);
            ValueContent::DateRange(start, end)
        }
        CstKind::ValueArray => ValueContent::Array(node.children.iter().map(project_value).collect()),
        CstKind::ValueQuery => ValueContent::Query(node.text.clone()),
        _ => ValueContent::Query(node.text.clone()),
    }
}

fn simple_date_or_epoch(text: &str) -> SimpleDate {
    SimpleDate::parse(text).unwrap_or_default()
}

fn project_content(node: &CstNode) -> Content {
    let children = node.children.iter().map(project_content_child).collect();
    Content { children, location: node.location }
}

fn project_content_child(node: &CstNode) -> ContentChild {
    match node.kind {
        CstKind::MdHeader => ContentChild::MdHeader { text: node.text.clone(), location: node.location },
        CstKind::BulletItem => ContentChild::BulletItem { text: node.text.clone(), location: node.location },
        _ => ContentChild::PlainText { text: node.text.clone(), location: node.location },
    }
}

fn project_field_def(node: &CstNode) -> FieldDefinition {
    let key_raw = node.child_of_kind(CstKind::Key).map(|c| c.text.as_str()).unwrap_or("");
    let (name, optional) = split_optional_suffix(key_raw);

    let type_node = node
        .children
        .iter()
        .find(|c| !matches!(c.kind, CstKind::Key | CstKind::DefaultValue | CstKind::Description));
    let type_expr = type_node.map(project_type).unwrap_or(TypeExpression::Primitive(PrimitiveType::String));

    let default = node.child_of_kind(CstKind::DefaultValue).map(|c| parse_default_value_text(&c.text));
    let description = node.child_of_kind(CstKind::Description).map(|c| c.text.clone());

    FieldDefinition { name, optional, type_expr, default, description, location: node.location }
}

fn project_section_def(node: &CstNode) -> SectionDefinition {
    let (name, optional) = split_optional_suffix(&node.text);
    let description = node.child_of_kind(CstKind::Description).map(|c| c.text.clone());
    SectionDefinition { name, optional, description, location: node.location }
}

fn split_optional_suffix(text: &str) -> (String, bool) {
    match text.strip_suffix('?') {
        Some(stripped) => (stripped.to_string(), true),
        None => (text.to_string(), false),
    }
}

fn project_type(node: &CstNode) -> TypeExpression {
    match node.kind {
        CstKind::TypePrimitive => TypeExpression::Primitive(PrimitiveType::parse(&node.text).unwrap_or(PrimitiveType::String)),
        CstKind::TypeLiteral => TypeExpression::Literal(node.text.clone()),
        CstKind::TypeUnion => {
            let members = node.children.iter().map(project_type).collect();
            TypeExpression::Union(members)
        }
        CstKind::TypeArray => {
            let element = node.children.first().map(project_type).unwrap_or(TypeExpression::Primitive(PrimitiveType::String));
            TypeExpression::Array(Box::new(element))
        }
        CstKind::TypeGroup => node.children.first().map(project_type).unwrap_or(TypeExpression::Primitive(PrimitiveType::String)),
        // Falls back to a literal match on the raw text rather than
        // rejecting the whole field definition.
        _ => TypeExpression::Literal(node.text.clone()),
    }
}

/// Interprets a default-value's raw text (the grammar keeps `DefaultValue`
/// nodes leaf-shaped, so this mirrors `thalo_grammar::parser::parse_array_element`
/// rather than walking child nodes).
fn parse_default_value_text(text: &str) -> ValueContent {
    if text.starts_with('"') && text.ends_with('"') && text.len() >= 2 {
        ValueContent::QuotedString(text[1..text.len() - 1].to_string())
    } else if let Some(stripped) = text.strip_prefix('^') {
        ValueContent::Link(stripped.to_string())
    } else if let Some(date) = SimpleDate::parse(text) {
        ValueContent::Datetime(date)
    } else {
        ValueContent::Query(text.to_string())
    }
}

impl Default for SimpleDate {
    fn default() -> Self {
        SimpleDate { year: 1970, month: 1, day: 1 }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use thalo_grammar::parse as parse_cst;

    #[test]
    fn projects_simple_instance_entry() {
        let source = "2026-01-05T18:00Z create lore \"E\" #t\n  type: \"fact\"\n  subject: \"x\"\n\n  # Summary\n  body.\n";
        let source_file = project(&parse_cst(source));
        assert_eq!(source_file.entries.len(), 1);
        let Entry::Instance(entry) = &source_file.entries[0] else { panic!("expected instance entry") };
        assert_eq!(entry.header.entity, "lore");
        assert_eq!(entry.header.title.as_deref(), Some("E"));
        assert_eq!(entry.header.tags, vec!["t".to_string()]);
        let ts = entry.header.timestamp.ok().expect("valid timestamp");
        assert_eq!(ts.date, SimpleDateParts { year: 2026, month: 1, day: 5 });
        assert_eq!(entry.metadata.len(), 2);
        assert_eq!(entry.metadata[0].key, "type");
        assert_eq!(entry.metadata[0].content, ValueContent::QuotedString("fact".into()));
        let content = entry.content.as_ref().expect("content block");
        assert_eq!(content.section_names(), vec!["Summary"]);
        assert_eq!(content.section_body("Summary").as_deref(), Some("body."));
    }

    #[test]
    fn projects_value_array_and_link() {
        let source = "2026-01-05T18:00Z create lore \"E\"\n  related: \"a\", \"b\", ^c\n";
        let source_file = project(&parse_cst(source));
        let Entry::Instance(entry) = &source_file.entries[0] else { panic!("expected instance entry") };
        match &entry.metadata[0].content {
            ValueContent::Array(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[2].as_link(), Some("c"));
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn projects_schema_entry_with_fields_and_sections() {
        let source = "2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Metadata\n    subject?: string = \"unknown\"\n  # Sections\n    Summary\n";
        let source_file = project(&parse_cst(source));
        let Entry::Schema(entry) = &source_file.entries[0] else { panic!("expected schema entry") };
        assert_eq!(entry.directive, SchemaDirective::Define);
        assert_eq!(entry.fields.len(), 1);
        assert_eq!(entry.fields[0].name, "subject");
        assert!(entry.fields[0].optional);
        assert_eq!(entry.fields[0].default, Some(ValueContent::QuotedString("unknown".into())));
        assert_eq!(entry.sections.len(), 1);
        assert_eq!(entry.sections[0].name, "Summary");
    }
}
