//! `findDefinition`/`findReferences`: the two
//! services built directly on the workspace's global link index.

use thalo_position::Location;
use thalo_semantic::LinkDefinition;
use thalo_workspace::Workspace;

/// One location a `^id` occurs at, tagged with whether that occurrence is
/// the definition site (so a client can render it distinctly, per
/// `includeDeclaration`).
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLocation {
    pub file: String,
    pub location: Location,
    pub is_definition: bool,
}

/// `findDefinition(workspace, linkId) -> {file, location, definition}?`
///. Returns `None` if no entry in the workspace
/// declares `^linkId`.
pub fn find_definition(workspace: &mut Workspace, link_id: &str) -> Option<LinkDefinition> {
    workspace.refresh_caches();
    workspace.cached_link_definition(link_id).cloned()
}

/// `findReferences(workspace, linkId, includeDeclaration) -> {locations}`
///: every reference site, plus the definition site
/// when `include_declaration` is set, in stable `(file, startIndex)` order.
pub fn find_references(workspace: &mut Workspace, link_id: &str, include_declaration: bool) -> Vec<ReferenceLocation> {
    workspace.refresh_caches();
    let mut locations: Vec<ReferenceLocation> = workspace
        .cached_link_references(link_id)
        .iter()
        .map(|r| ReferenceLocation { file: r.file.clone(), location: r.location, is_definition: false })
        .collect();
    if include_declaration {
        if let Some(def) = workspace.cached_link_definition(link_id) {
            locations.push(ReferenceLocation { file: def.file.clone(), location: def.location, is_definition: true });
        }
    }
    locations.sort_by(|a, b| (a.file.as_str(), a.location.start_index, !a.is_definition).cmp(&(b.file.as_str(), b.location.start_index, !b.is_definition)));
    locations
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use thalo_fenced::FileType;

    #[test]
    fn find_definition_resolves_cross_file() {
        let mut ws = Workspace::new();
        ws.add_document("a.thalo", "2026-01-01T00:00Z create lore \"E\" ^x\n  k: \"v\"\n".to_string(), FileType::Thalo).unwrap();
        ws.add_document("b.thalo", "2026-01-02T00:00Z create lore \"F\"\n  rel: ^x\n".to_string(), FileType::Thalo).unwrap();

        let def = find_definition(&mut ws, "x").expect("definition");
        assert_eq!(def.file, "a.thalo");
    }

    #[test]
    fn find_references_includes_declaration_when_requested() {
        let mut ws = Workspace::new();
        ws.add_document("a.thalo", "2026-01-01T00:00Z create lore \"E\" ^x\n  k: \"v\"\n".to_string(), FileType::Thalo).unwrap();
        ws.add_document("b.thalo", "2026-01-02T00:00Z create lore \"F\"\n  rel: ^x\n".to_string(), FileType::Thalo).unwrap();

        let locations = find_references(&mut ws, "x", true);
        assert_eq!(locations.len(), 2);
        assert!(locations.iter().any(|l| l.is_definition && l.file == "a.thalo"));
        assert!(locations.iter().any(|l| !l.is_definition && l.file == "b.thalo"));
    }

    #[test]
    fn find_references_excludes_declaration_by_default() {
        let mut ws = Workspace::new();
        ws.add_document("a.thalo", "2026-01-01T00:00Z create lore \"E\" ^x\n  k: \"v\"\n".to_string(), FileType::Thalo).unwrap();
        ws.add_document("b.thalo", "2026-01-02T00:00Z create lore \"F\"\n  rel: ^x\n".to_string(), FileType::Thalo).unwrap();

        let locations = find_references(&mut ws, "x", false);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].file, "b.thalo");
    }
}
