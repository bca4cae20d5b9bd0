//! Structural equality that ignores [`thalo_position::Location`], since the
//! same entry parsed from base/ours/theirs documents never shares byte
//! offsets even when semantically unchanged.

use thalo_ast::{Content, ContentChild, Entry, FieldDefinition, Header, Metadata, SchemaEntry, SectionDefinition};

pub fn headers_equal(a: &Header, b: &Header) -> bool {
    a.directive == b.directive && a.entity == b.entity && a.title == b.title && a.link == b.link && a.tags == b.tags && a.timestamp == b.timestamp
}

pub fn metadata_equal(a: &Metadata, b: &Metadata) -> bool {
    a.key == b.key && a.content == b.content
}

pub fn metadata_vec_equal(a: &[Metadata], b: &[Metadata]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| metadata_equal(x, y))
}

fn content_child_equal(a: &ContentChild, b: &ContentChild) -> bool {
    use ContentChild::*;
    match (a, b) {
        (MdHeader { text: x, .. }, MdHeader { text: y, .. }) => x == y,
        (BulletItem { text: x, .. }, BulletItem { text: y, .. }) => x == y,
        (PlainText { text: x, .. }, PlainText { text: y, .. }) => x == y,
        (Blank { .. }, Blank { .. }) => true,
        _ => false,
    }
}

pub fn content_equal(a: &Content, b: &Content) -> bool {
    a.children.len() == b.children.len() && a.children.iter().zip(&b.children).all(|(x, y)| content_child_equal(x, y))
}

pub fn content_opt_equal(a: Option<&Content>, b: Option<&Content>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => content_equal(x, y),
        _ => false,
    }
}

fn field_def_equal(a: &FieldDefinition, b: &FieldDefinition) -> bool {
    a.name == b.name && a.optional == b.optional && a.type_expr == b.type_expr && a.default == b.default && a.description == b.description
}

fn section_def_equal(a: &SectionDefinition, b: &SectionDefinition) -> bool {
    a.name == b.name && a.optional == b.optional && a.description == b.description
}

pub fn schema_body_equal(a: &SchemaEntry, b: &SchemaEntry) -> bool {
    a.directive == b.directive
        && a.description == b.description
        && a.fields.len() == b.fields.len()
        && a.fields.iter().zip(&b.fields).all(|(x, y)| field_def_equal(x, y))
        && a.sections.len() == b.sections.len()
        && a.sections.iter().zip(&b.sections).all(|(x, y)| section_def_equal(x, y))
        && a.remove_metadata == b.remove_metadata
        && a.remove_sections == b.remove_sections
}

/// Whole-entry structural equality (used for the "unchanged since base"
/// and "both changed identically" merge outcomes).
pub fn entries_equal(a: &Entry, b: &Entry) -> bool {
    match (a, b) {
        (Entry::Instance(x), Entry::Instance(y)) => {
            headers_equal(&x.header, &y.header) && metadata_vec_equal(&x.metadata, &y.metadata) && content_opt_equal(x.content.as_ref(), y.content.as_ref())
        }
        (Entry::Synthesis(x), Entry::Synthesis(y)) => {
            headers_equal(&x.header, &y.header) && metadata_vec_equal(&x.metadata, &y.metadata) && content_opt_equal(x.content.as_ref(), y.content.as_ref())
        }
        (Entry::Actualize(x), Entry::Actualize(y)) => headers_equal(&x.header, &y.header) && metadata_vec_equal(&x.metadata, &y.metadata),
        (Entry::Schema(x), Entry::Schema(y)) => headers_equal(&x.header, &y.header) && schema_body_equal(x, y),
        (Entry::Error(x), Entry::Error(y)) => x.raw == y.raw,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_from_different_offsets_is_equal() {
        let a = thalo_ast::parse("2026-01-01T00:00Z create lore \"E\"\n  k: \"v\"\n");
        let b = thalo_ast::parse("\n\n2026-01-01T00:00Z create lore \"E\"\n  k: \"v\"\n");
        assert!(entries_equal(&a.entries[0], &b.entries[0]));
    }

    #[test]
    fn differing_metadata_value_is_unequal() {
        let a = thalo_ast::parse("2026-01-01T00:00Z create lore \"E\"\n  k: \"v1\"\n");
        let b = thalo_ast::parse("2026-01-01T00:00Z create lore \"E\"\n  k: \"v2\"\n");
        assert!(!entries_equal(&a.entries[0], &b.entries[0]));
    }
}
