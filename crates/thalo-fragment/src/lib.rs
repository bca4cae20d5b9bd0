//! Parses standalone sub-expressions (queries, values, type expressions)
//! without a separate grammar: each fragment is embedded into a minimal
//! wrapper document guaranteed to parse under the main grammar, then the
//! resulting tree is navigated down to the fragment's own node.

use thalo_grammar::{CstKind, CstNode};
use thalo_position::{Location, Position};

/// The node a fragment parse resolved to, whether or not it parsed
/// cleanly. `valid` mirrors `!node.is_error()`; when `false`, `error`
/// carries the raw text so IDE-style partial parsing still has something
/// to show.
pub struct FragmentResult {
    pub node: CstNode,
    pub valid: bool,
    pub error: Option<String>,
}

impl FragmentResult {
    fn from_node(node: CstNode) -> Self {
        let valid = !node.is_error();
        let error = if valid { None } else { Some(node.text.clone()) };
        FragmentResult { node, valid, error }
    }
}

fn unparsed(raw: &str) -> CstNode {
    let location = Location::new(0, raw.len(), Position::new(0, 0), Position::new(0, raw.len() as u32));
    CstNode::new(CstKind::Error, location, raw.to_string())
}

/// Parses `fragment` as a metadata value — the shape shared by standalone
/// values and query strings, both of which are legal metadata values in
/// the main grammar.
pub fn parse_value_fragment(fragment: &str) -> FragmentResult {
    let source = format!("2026-01-01T00:00Z create _fragment_wrapper\n  value: {fragment}\n");
    let tree = thalo_grammar::parse(&source);
    let node = tree
        .children
        .first()
        .and_then(|entry| entry.child_of_kind(CstKind::Metadata))
        .and_then(|metadata| metadata.children.iter().find(|c| c.kind != CstKind::Key))
        .cloned()
        .unwrap_or_else(|| unparsed(fragment));
    FragmentResult::from_node(node)
}

/// Parses `fragment` as a query expression. Queries are not a distinct
/// grammar production — they fall through to `ValueQuery`, the same value
/// wrapper used for standalone values.
pub fn parse_query_fragment(fragment: &str) -> FragmentResult {
    parse_value_fragment(fragment)
}

/// Parses `fragment` as the type expression of a field definition.
pub fn parse_type_fragment(fragment: &str) -> FragmentResult {
    let source = format!("2026-01-01T00:00Z define-entity _fragment_wrapper\n  # Metadata\n    field: {fragment}\n");
    let tree = thalo_grammar::parse(&source);
    let node = tree
        .children
        .first()
        .and_then(|entry| entry.child_of_kind(CstKind::MetadataSection))
        .and_then(|section| section.children.first())
        .and_then(|field_def| {
            field_def.children.iter().find(|c| !matches!(c.kind, CstKind::Key | CstKind::DefaultValue | CstKind::Description))
        })
        .cloned()
        .unwrap_or_else(|| unparsed(fragment));
    FragmentResult::from_node(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_fragment_resolves_quoted_string() {
        let result = parse_value_fragment("\"hello\"");
        assert!(result.valid);
        assert_eq!(result.node.kind, CstKind::ValueQuotedString);
        assert_eq!(result.node.text, "hello");
    }

    #[test]
    fn query_fragment_resolves_to_value_query() {
        let result = parse_query_fragment("lore where subject = \"x\"");
        assert!(result.valid);
        assert_eq!(result.node.kind, CstKind::ValueQuery);
    }

    #[test]
    fn type_fragment_resolves_primitive() {
        let result = parse_type_fragment("string");
        assert!(result.valid);
        assert_eq!(result.node.kind, CstKind::TypePrimitive);
    }

    #[test]
    fn type_fragment_resolves_union() {
        let result = parse_type_fragment("\"fact\" | \"insight\"");
        assert!(result.valid);
        assert_eq!(result.node.kind, CstKind::TypeUnion);
    }
}
