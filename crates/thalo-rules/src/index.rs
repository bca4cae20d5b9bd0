//! `WorkspaceIndex`: facts prebuilt once per check run so individual rules
//! don't each re-walk every document.

use rustc_hash::FxHashMap;
use thalo_ast::Entry;
use thalo_position::Location;
use thalo_workspace::Workspace;

#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    tag_counts: FxHashMap<String, usize>,
    entity_use_counts: FxHashMap<String, usize>,
    /// Every header-level `^id` definition site, keyed by id, across the
    /// whole workspace — unlike `Workspace`'s own link index, this keeps
    /// every site rather than collapsing to the first, so `duplicate-link-id`
    /// can see the full multiplicity.
    link_definition_sites: FxHashMap<String, Vec<(String, Location)>>,
}

impl WorkspaceIndex {
    pub fn build(workspace: &Workspace) -> Self {
        let mut index = WorkspaceIndex::default();
        let mut files: Vec<&str> = workspace.files().collect();
        files.sort();

        for filename in files {
            let Some(model) = workspace.get_model(filename) else { continue };
            for entry in &model.source_file.entries {
                let Some(header) = entry.header() else { continue };

                for tag in &header.tags {
                    *index.tag_counts.entry(tag.clone()).or_insert(0) += 1;
                }
                if !matches!(entry, Entry::Schema(_)) {
                    *index.entity_use_counts.entry(header.entity.clone()).or_insert(0) += 1;
                }
                // actualize-synthesis headers' `^id` is a reference, not a definition.
                if let (Some(id), false) = (&header.link, matches!(entry, Entry::Actualize(_))) {
                    index.link_definition_sites.entry(id.clone()).or_default().push((filename.to_string(), header.location));
                }
            }
        }
        index
    }

    pub fn tag_count(&self, tag: &str) -> usize {
        self.tag_counts.get(tag).copied().unwrap_or(0)
    }

    pub fn entity_use_count(&self, entity: &str) -> usize {
        self.entity_use_counts.get(entity).copied().unwrap_or(0)
    }

    /// Ids with more than one `^id` definition site in the workspace.
    pub fn duplicate_link_ids(&self) -> impl Iterator<Item = (&str, &[(String, Location)])> {
        self.link_definition_sites.iter().filter(|(_, sites)| sites.len() > 1).map(|(id, sites)| (id.as_str(), sites.as_slice()))
    }
}
