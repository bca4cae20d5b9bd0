//! `extractSemanticTokens`: maps CST node kinds to a
//! fixed token-type table. Positions are absolute `(line, char)` pairs, not
//! delta-encoded — delta encoding for the LSP wire format is a separate
//! step the client-facing transport performs.

use rustc_hash::FxHashMap;
use thalo_grammar::{parse, CstKind, CstNode};
use thalo_semantic::SemanticModel;

/// One classified span, in the flat `{line, startChar, length, tokenType,
/// tokenModifiers}` shape. `token_type` and
/// `token_modifiers` are indices into the [`TokenLegend`] returned by
/// [`legend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticToken {
    pub line: u32,
    pub start_char: u32,
    pub length: u32,
    pub token_type: u32,
    pub token_modifiers: u32,
}

/// The type/modifier name tables a client registers against, and the
/// lookup map from name to index for anything that needs to classify by
/// name rather than by number.
pub struct TokenLegend {
    pub token_types: Vec<String>,
    pub token_modifiers: Vec<String>,
    pub type_index: FxHashMap<String, u32>,
}

const MOD_DECLARATION: u32 = 1 << 0;

/// Index 9 is `number`, reserved for timestamps and datetime values
///. The rest of the table exists only to
/// give every other classifiable node kind a slot.
pub fn legend() -> TokenLegend {
    let token_types: Vec<String> = [
        "keyword", "class", "string", "decorator", "property", "type", "macro", "namespace", "variable", "number",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    let token_modifiers: Vec<String> = ["declaration"].into_iter().map(String::from).collect();
    let type_index = token_types.iter().enumerate().map(|(i, name)| (name.clone(), i as u32)).collect();
    TokenLegend { token_types, token_modifiers, type_index }
}

/// Walks every block of `model` and classifies each leaf worth
/// highlighting, in document order.
pub fn extract_semantic_tokens(model: &SemanticModel) -> Vec<SemanticToken> {
    let leg = legend();
    let mut tokens = Vec::new();
    for block in &model.blocks {
        let cst = parse(&block.content);
        walk(&cst, None, block.span.start, model, &leg, &mut tokens);
    }
    tokens
}

fn walk(node: &CstNode, parent: Option<CstKind>, block_start: usize, model: &SemanticModel, leg: &TokenLegend, out: &mut Vec<SemanticToken>) {
    if node.children.is_empty() {
        if let Some((type_name, modifiers)) = classify(node.kind, parent) {
            emit(node, block_start, type_name, modifiers, model, leg, out);
        }
        return;
    }
    for child in &node.children {
        walk(child, Some(node.kind), block_start, model, leg, out);
    }
}

fn classify(kind: CstKind, parent: Option<CstKind>) -> Option<(&'static str, u32)> {
    match kind {
        CstKind::Entity if parent == Some(CstKind::SchemaHeader) => Some(("class", MOD_DECLARATION)),
        CstKind::Entity => Some(("keyword", 0)),
        CstKind::Directive => Some(("macro", 0)),
        CstKind::Tag => Some(("decorator", 0)),
        CstKind::LinkDef => Some(("variable", MOD_DECLARATION)),
        CstKind::ValueLinkRef => Some(("variable", 0)),
        CstKind::Title | CstKind::ValueQuotedString => Some(("string", 0)),
        CstKind::Key if parent == Some(CstKind::FieldDef) => Some(("property", MOD_DECLARATION)),
        CstKind::Key => Some(("property", 0)),
        CstKind::SectionDef | CstKind::MdHeader => Some(("namespace", 0)),
        CstKind::TypePrimitive | CstKind::TypeLiteral | CstKind::TypeUnion | CstKind::TypeArray | CstKind::TypeGroup => Some(("type", 0)),
        CstKind::Timestamp | CstKind::Date | CstKind::Time | CstKind::Timezone | CstKind::ValueDatetime | CstKind::ValueDateRange => Some(("number", 0)),
        _ => None,
    }
}

fn emit(node: &CstNode, block_start: usize, type_name: &str, modifiers: u32, model: &SemanticModel, leg: &TokenLegend, out: &mut Vec<SemanticToken>) {
    let Some(&type_index) = leg.type_index.get(type_name) else { return };
    let file_offset = block_start + node.location.start_index;
    let length = (node.location.end_index - node.location.start_index) as u32;
    if length == 0 {
        return;
    }
    let position = model.line_index.offset_to_position(file_offset);
    out.push(SemanticToken { line: position.row, start_char: position.column, length, token_type: type_index, token_modifiers: modifiers });
}

#[cfg(test)]
mod tests {
    use super::*;
    use thalo_fenced::FileType;

    fn model(source: &str) -> SemanticModel {
        SemanticModel::build("a.thalo", source.to_string(), FileType::Thalo)
    }

    #[test]
    fn legend_reserves_index_nine_for_number() {
        let leg = legend();
        assert_eq!(leg.type_index["number"], 9);
    }

    #[test]
    fn timestamp_token_uses_number_type() {
        let m = model("2026-01-05T18:00Z create lore \"E\"\n  subject: \"x\"\n");
        let tokens = extract_semantic_tokens(&m);
        let leg = legend();
        let timestamp_tokens: Vec<_> = tokens.iter().filter(|t| t.token_type == leg.type_index["number"]).collect();
        assert!(!timestamp_tokens.is_empty());
        assert_eq!(timestamp_tokens[0].line, 0);
        assert_eq!(timestamp_tokens[0].start_char, 0);
    }

    #[test]
    fn entity_and_tag_tokens_are_classified() {
        let m = model("2026-01-05T18:00Z create lore \"E\" #urgent\n  subject: \"x\"\n");
        let tokens = extract_semantic_tokens(&m);
        let leg = legend();
        assert!(tokens.iter().any(|t| t.token_type == leg.type_index["keyword"]));
        assert!(tokens.iter().any(|t| t.token_type == leg.type_index["decorator"]));
        assert!(tokens.iter().any(|t| t.token_type == leg.type_index["property"]));
    }

    #[test]
    fn schema_entity_gets_class_type_with_declaration_modifier() {
        let m = model("2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Sections\n    Summary\n");
        let tokens = extract_semantic_tokens(&m);
        let leg = legend();
        let class_tokens: Vec<_> = tokens.iter().filter(|t| t.token_type == leg.type_index["class"]).collect();
        assert_eq!(class_tokens.len(), 1);
        assert_eq!(class_tokens[0].token_modifiers, MOD_DECLARATION);
    }
}
