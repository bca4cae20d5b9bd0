//! From-scratch source serialization: merge
//! recombines entries built from different documents, so output can't be
//! sliced from any single original span.

use thalo_ast::{
    ContentChild, Directive, Entry, FieldDefinition, Header, Metadata, Parsed, PrimitiveType, SchemaDirective, SchemaEntry, SectionDefinition, Timestamp,
    TypeExpression, ValueContent,
};

fn timestamp_text(ts: &Parsed<Timestamp>) -> String {
    match ts {
        Parsed::Ok(t) => t.format(),
        Parsed::Error(e) => e.raw.clone(),
    }
}

fn header_line(header: &Header, directive_text: &str) -> String {
    let mut line = format!("{} {directive_text} {}", timestamp_text(&header.timestamp), header.entity);
    line.push_str(&format!(" \"{}\"", header.title.as_deref().unwrap_or_default()));
    if let Some(link) = &header.link {
        line.push_str(&format!(" ^{link}"));
    }
    for tag in &header.tags {
        line.push_str(&format!(" #{tag}"));
    }
    line
}

fn date_text(d: &thalo_ast::SimpleDate) -> String {
    format!("{:04}-{:02}-{:02}", d.year, d.month, d.day)
}

pub fn serialize_value(value: &ValueContent) -> String {
    match value {
        ValueContent::QuotedString(s) => format!("\"{s}\""),
        ValueContent::Link(id) => format!("^{id}"),
        ValueContent::Datetime(d) => date_text(d),
        ValueContent::DateRange(a, b) => format!("{}~{}", date_text(a), date_text(b)),
        ValueContent::Query(q) => q.clone(),
        ValueContent::Array(items) => items.iter().map(serialize_value).collect::<Vec<_>>().join(", "),
    }
}

fn metadata_lines(metadata: &[Metadata], indent: &str) -> Vec<String> {
    metadata.iter().map(|m| format!("{indent}{}: {}", m.key, serialize_value(&m.content))).collect()
}

fn content_lines(children: &[ContentChild], indent: &str) -> Vec<String> {
    children
        .iter()
        .map(|child| match child {
            ContentChild::MdHeader { text, .. } => format!("{indent}# {text}"),
            ContentChild::BulletItem { text, .. } => format!("{indent}- {text}"),
            ContentChild::PlainText { text, .. } => format!("{indent}{text}"),
            ContentChild::Blank { .. } => String::new(),
        })
        .collect()
}

fn primitive_text(p: PrimitiveType) -> &'static str {
    match p {
        PrimitiveType::String => "string",
        PrimitiveType::Datetime => "datetime",
        PrimitiveType::DateRange => "date-range",
        PrimitiveType::Link => "link",
    }
}

fn type_text(t: &TypeExpression) -> String {
    match t {
        TypeExpression::Primitive(p) => primitive_text(*p).to_string(),
        TypeExpression::Literal(s) => format!("\"{s}\""),
        TypeExpression::Union(members) => members.iter().map(type_text).collect::<Vec<_>>().join(" | "),
        TypeExpression::Array(element) => match element.as_ref() {
            TypeExpression::Union(_) => format!("({})[]", type_text(element)),
            other => format!("{}[]", type_text(other)),
        },
    }
}

fn field_def_line(field: &FieldDefinition, indent: &str) -> String {
    let mut line = format!("{indent}{}", field.name);
    if field.optional {
        line.push('?');
    }
    line.push_str(&format!(": {}", type_text(&field.type_expr)));
    if let Some(default) = &field.default {
        line.push_str(&format!(" = {}", serialize_value(default)));
    }
    if let Some(description) = &field.description {
        line.push_str(&format!("; \"{description}\""));
    }
    line
}

fn section_def_line(section: &SectionDefinition, indent: &str) -> String {
    let mut line = format!("{indent}{}", section.name);
    if section.optional {
        line.push('?');
    }
    if let Some(description) = &section.description {
        line.push_str(&format!("; \"{description}\""));
    }
    line
}

fn schema_directive_text(directive: SchemaDirective) -> &'static str {
    match directive {
        SchemaDirective::Define => "define-entity",
        SchemaDirective::Alter => "alter-entity",
    }
}

fn serialize_schema(schema: &SchemaEntry) -> String {
    let mut lines = vec![header_line(&schema.header, schema_directive_text(schema.directive))];
    if !schema.fields.is_empty() {
        lines.push("  # Metadata".to_string());
        for field in &schema.fields {
            lines.push(field_def_line(field, "    "));
        }
    }
    if !schema.sections.is_empty() {
        lines.push("  # Sections".to_string());
        for section in &schema.sections {
            lines.push(section_def_line(section, "    "));
        }
    }
    if !schema.remove_metadata.is_empty() {
        lines.push("  # Remove Metadata".to_string());
        for name in &schema.remove_metadata {
            lines.push(format!("    {name}"));
        }
    }
    if !schema.remove_sections.is_empty() {
        lines.push("  # Remove Sections".to_string());
        for name in &schema.remove_sections {
            lines.push(format!("    {name}"));
        }
    }
    lines.join("\n")
}

/// Serializes a merged or single-side entry back to thalo source text.
/// `actualize-synthesis` entries are the one exception: per the resolved
/// open question on synthesis runs, they always carry `raw_override`, the
/// verbatim text of whichever side supplied them, rather than being
/// re-derived field by field.
pub fn serialize_entry(entry: &Entry, raw_override: Option<&str>) -> String {
    if let Some(raw) = raw_override {
        if matches!(entry, Entry::Actualize(_)) {
            return raw.trim_end().to_string();
        }
    }
    match entry {
        Entry::Instance(e) => {
            let mut lines = vec![header_line(&e.header, if e.header.directive == Directive::Update { "update" } else { "create" })];
            lines.extend(metadata_lines(&e.metadata, "  "));
            if let Some(content) = &e.content {
                lines.push(String::new());
                lines.extend(content_lines(&content.children, "  "));
            }
            lines.join("\n")
        }
        Entry::Synthesis(e) => {
            let mut lines = vec![header_line(&e.header, "define-synthesis")];
            lines.extend(metadata_lines(&e.metadata, "  "));
            if let Some(content) = &e.content {
                lines.push(String::new());
                lines.extend(content_lines(&content.children, "  "));
            }
            lines.join("\n")
        }
        Entry::Actualize(e) => {
            let mut lines = vec![header_line(&e.header, "actualize-synthesis")];
            lines.extend(metadata_lines(&e.metadata, "  "));
            lines.join("\n")
        }
        Entry::Schema(e) => serialize_schema(e),
        Entry::Error(e) => e.raw.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_entry_round_trips_through_reserialization() {
        let tree = thalo_ast::parse("2026-01-01T00:00Z create lore \"E\" ^abc #tag\n  k: \"v\"\n");
        let text = serialize_entry(&tree.entries[0], None);
        assert_eq!(text, "2026-01-01T00:00Z create lore \"E\" ^abc #tag\n  k: \"v\"");
    }

    #[test]
    fn actualize_entry_prefers_raw_override() {
        let tree = thalo_ast::parse("2026-01-10T00:00Z actualize-synthesis ^d1 \"run\"\n  checkpoint: \"ts:2026-01-01T00:00Z\"\n");
        let text = serialize_entry(&tree.entries[0], Some("  VERBATIM  \n"));
        assert_eq!(text, "  VERBATIM");
    }

    #[test]
    fn array_value_serializes_comma_separated() {
        let value = ValueContent::Array(vec![ValueContent::QuotedString("a".into()), ValueContent::QuotedString("b".into())]);
        assert_eq!(serialize_value(&value), "\"a\", \"b\"");
    }
}
