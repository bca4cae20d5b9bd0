//! `findNodeAtPosition`: classifies a cursor
//! position into a tagged [`NodeContext`] union so a definition/references/
//! hover/completion handler can dispatch on it without re-deriving the
//! classification itself.
//!
//! Unlike the rest of this crate, this walks the concrete syntax tree
//! directly rather than the projected AST: the AST's [`thalo_ast::Header`]
//! keeps only text for its sub-fields (entity, title, link, tags), not
//! their individual spans, so a precise node-at-position answer has to
//! come from the CST the AST was itself projected from. The position is
//! first mapped through the containing block's source map, same technique
//! as the fragment parser's wrapper embedding.

use thalo_grammar::{parse, CstKind, CstNode};
use thalo_position::Position;
use thalo_semantic::SemanticModel;

/// The tagged union `findNodeAtPosition` resolves a cursor to. Downstream
/// handlers (definition, references, hover, completion) dispatch on this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContext {
    Link(String),
    Tag(String),
    Entity(String),
    SchemaEntity(String),
    MetadataKey(String),
    SectionHeader(String),
    FieldName(String),
    SectionName(String),
    Directive,
    Timestamp,
    Title,
    Type,
    Unknown,
}

const SCHEMA_HEADER_KINDS: [CstKind; 1] = [CstKind::SchemaHeader];

/// Resolves `position` (file-absolute, zero-based) against `model`'s
/// blocks. Returns [`NodeContext::Unknown`] if the position falls outside
/// every block or lands on a node with no more specific classification.
pub fn find_node_at_position(model: &SemanticModel, position: Position) -> NodeContext {
    let Some(file_offset) = model.line_index.position_to_offset(position) else {
        return NodeContext::Unknown;
    };
    let Some(block) = model.blocks.iter().find(|b| b.span.contains(file_offset) || file_offset == b.span.end) else {
        return NodeContext::Unknown;
    };
    let block_offset = file_offset - block.span.start;
    let cst = parse(&block.content);
    classify(&cst, block_offset, None)
}

fn classify(node: &CstNode, offset: usize, parent: Option<CstKind>) -> NodeContext {
    if let Some(child) = node.children.iter().find(|c| c.location.span().contains(offset) || offset == c.location.end_index) {
        return classify(child, offset, Some(node.kind));
    }
    classify_leaf(node.kind, parent, &node.text)
}

fn classify_leaf(kind: CstKind, parent: Option<CstKind>, text: &str) -> NodeContext {
    match kind {
        CstKind::Tag => NodeContext::Tag(text.to_string()),
        CstKind::LinkDef => NodeContext::Link(text.to_string()),
        CstKind::Entity => {
            if parent.is_some_and(|p| SCHEMA_HEADER_KINDS.contains(&p)) {
                NodeContext::SchemaEntity(text.to_string())
            } else {
                NodeContext::Entity(text.to_string())
            }
        }
        CstKind::Key => {
            if parent == Some(CstKind::FieldDef) {
                NodeContext::FieldName(text.trim_end_matches('?').to_string())
            } else {
                NodeContext::MetadataKey(text.to_string())
            }
        }
        CstKind::SectionDef => NodeContext::SectionName(text.trim_end_matches('?').trim().to_string()),
        CstKind::MdHeader => NodeContext::SectionHeader(text.to_string()),
        CstKind::Directive => NodeContext::Directive,
        CstKind::Timestamp | CstKind::Date | CstKind::Time | CstKind::Timezone => NodeContext::Timestamp,
        CstKind::Title => NodeContext::Title,
        CstKind::TypePrimitive | CstKind::TypeLiteral | CstKind::TypeUnion | CstKind::TypeArray | CstKind::TypeGroup => NodeContext::Type,
        CstKind::ValueLinkRef => NodeContext::Link(text.to_string()),
        _ => NodeContext::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thalo_fenced::FileType;
    use thalo_position::Position;

    fn model(source: &str) -> SemanticModel {
        SemanticModel::build("a.thalo", source.to_string(), FileType::Thalo)
    }

    #[test]
    fn cursor_on_entity_resolves_entity_context() {
        let m = model("2026-01-05T18:00Z create lore \"E\" #t\n  subject: \"x\"\n");
        let ctx = find_node_at_position(&m, Position::new(0, 22));
        assert_eq!(ctx, NodeContext::Entity("lore".to_string()));
    }

    #[test]
    fn cursor_on_tag_resolves_tag_context() {
        let m = model("2026-01-05T18:00Z create lore \"E\" #urgent\n  subject: \"x\"\n");
        let ctx = find_node_at_position(&m, Position::new(0, 36));
        assert_eq!(ctx, NodeContext::Tag("urgent".to_string()));
    }

    #[test]
    fn cursor_on_metadata_key_resolves_metadata_key_context() {
        let m = model("2026-01-05T18:00Z create lore \"E\"\n  subject: \"x\"\n");
        let ctx = find_node_at_position(&m, Position::new(1, 3));
        assert_eq!(ctx, NodeContext::MetadataKey("subject".to_string()));
    }

    #[test]
    fn cursor_on_section_header_resolves_section_header_context() {
        let m = model("2026-01-05T18:00Z create lore \"E\"\n  subject: \"x\"\n\n  # Summary\n  body.\n");
        let ctx = find_node_at_position(&m, Position::new(3, 4));
        assert_eq!(ctx, NodeContext::SectionHeader("Summary".to_string()));
    }

    #[test]
    fn cursor_on_schema_entity_resolves_schema_entity_context() {
        let m = model("2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Sections\n    Summary\n");
        let ctx = find_node_at_position(&m, Position::new(0, 33));
        assert_eq!(ctx, NodeContext::SchemaEntity("lore".to_string()));
    }

    #[test]
    fn cursor_outside_every_block_is_unknown() {
        let m = model("2026-01-05T18:00Z create lore \"E\"\n  subject: \"x\"\n");
        let ctx = find_node_at_position(&m, Position::new(50, 0));
        assert_eq!(ctx, NodeContext::Unknown);
    }
}
