//! Tag, entity, field, and section "references":
//! everywhere a name shows up in the workspace, not just `^id` links.
//! Unlike [`crate::definition`], these aren't backed by a cache — each
//! call walks every document's AST, since nothing pre-indexes tag/entity/
//! field/section usage the way the link index does.

use thalo_ast::{ContentChild, Entry};
use thalo_position::Location;
use thalo_workspace::Workspace;

/// One place a name occurs, without the definition/reference distinction
/// [`crate::definition::ReferenceLocation`] draws — tags, entities,
/// fields, and sections have no declaration site of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub file: String,
    pub location: Location,
}

/// Every entry header carrying `#tag`, across the
/// whole workspace, in stable `(file, startIndex)` order.
pub fn find_tag_references(workspace: &Workspace, tag: &str) -> Vec<Occurrence> {
    collect(workspace, |entry| match entry.header() {
        Some(header) if header.tags.iter().any(|t| t == tag) => Some(header.location),
        _ => None,
    })
}

/// Every entry header naming `entity`: the entity
/// type for instance/synthesis/actualize entries, or the entity being
/// defined/altered for schema entries.
pub fn find_entity_references(workspace: &Workspace, entity: &str) -> Vec<Occurrence> {
    collect(workspace, |entry| match entry.header() {
        Some(header) if header.entity == entity => Some(header.location),
        _ => None,
    })
}

/// Every metadata assignment keyed `field` on any entry, across the
/// workspace.
pub fn find_field_references(workspace: &Workspace, field: &str) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    for model in workspace.all_models() {
        for entry in &model.source_file.entries {
            let metadata = match entry {
                Entry::Instance(e) => e.metadata.as_slice(),
                Entry::Synthesis(e) => e.metadata.as_slice(),
                Entry::Actualize(e) => e.metadata.as_slice(),
                Entry::Schema(_) | Entry::Error(_) => &[],
            };
            for m in metadata {
                if m.key == field {
                    occurrences.push(Occurrence { file: model.filename.clone(), location: m.location });
                }
            }
        }
    }
    sort_occurrences(occurrences)
}

/// Every `# Name` markdown header appearing in any entry's content block,
/// across the workspace.
pub fn find_section_references(workspace: &Workspace, section: &str) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    for model in workspace.all_models() {
        for entry in &model.source_file.entries {
            let content = match entry {
                Entry::Instance(e) => e.content.as_ref(),
                Entry::Synthesis(e) => e.content.as_ref(),
                Entry::Actualize(_) | Entry::Schema(_) | Entry::Error(_) => None,
            };
            let Some(content) = content else { continue };
            for child in &content.children {
                if let ContentChild::MdHeader { text, location } = child {
                    if text == section {
                        occurrences.push(Occurrence { file: model.filename.clone(), location: *location });
                    }
                }
            }
        }
    }
    sort_occurrences(occurrences)
}

fn collect(workspace: &Workspace, mut locate: impl FnMut(&Entry) -> Option<Location>) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    for model in workspace.all_models() {
        for entry in &model.source_file.entries {
            if let Some(location) = locate(entry) {
                occurrences.push(Occurrence { file: model.filename.clone(), location });
            }
        }
    }
    sort_occurrences(occurrences)
}

fn sort_occurrences(mut occurrences: Vec<Occurrence>) -> Vec<Occurrence> {
    occurrences.sort_by(|a, b| (a.file.as_str(), a.location.start_index).cmp(&(b.file.as_str(), b.location.start_index)));
    occurrences
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use thalo_fenced::FileType;

    fn workspace() -> Workspace {
        let mut ws = Workspace::new();
        ws.add_document(
            "a.thalo",
            "2026-01-01T00:00Z create lore \"E1\" #urgent\n  subject: \"x\"\n\n  # Summary\n  body.\n".to_string(),
            FileType::Thalo,
        )
        .unwrap();
        ws.add_document(
            "b.thalo",
            "2026-01-02T00:00Z create lore \"E2\" #urgent\n  subject: \"y\"\n".to_string(),
            FileType::Thalo,
        )
        .unwrap();
        ws
    }

    #[test]
    fn find_tag_references_spans_documents() {
        let ws = workspace();
        let hits = find_tag_references(&ws, "urgent");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].file, "a.thalo");
        assert_eq!(hits[1].file, "b.thalo");
    }

    #[test]
    fn find_entity_references_matches_header_entity() {
        let ws = workspace();
        let hits = find_entity_references(&ws, "lore");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn find_field_references_matches_metadata_key() {
        let ws = workspace();
        let hits = find_field_references(&ws, "subject");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn find_section_references_matches_content_header() {
        let ws = workspace();
        let hits = find_section_references(&ws, "Summary");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file, "a.thalo");
    }

    #[test]
    fn unmatched_name_yields_no_occurrences() {
        let ws = workspace();
        assert!(find_tag_references(&ws, "nope").is_empty());
    }
}
