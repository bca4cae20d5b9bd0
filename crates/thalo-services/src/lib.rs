//! Read-only language services over a [`thalo_workspace::Workspace`]:
//! definition/references lookup, cursor-to-node classification, and
//! semantic token extraction. Every service here reads a workspace; none
//! of them mutate the AST or schema registry.

mod definition;
mod node_context;
mod occurrences;
mod semantic_tokens;

pub use definition::{find_definition, find_references, ReferenceLocation};
pub use node_context::{find_node_at_position, NodeContext};
pub use occurrences::{find_entity_references, find_field_references, find_section_references, find_tag_references, Occurrence};
pub use semantic_tokens::{extract_semantic_tokens, legend, SemanticToken, TokenLegend};
