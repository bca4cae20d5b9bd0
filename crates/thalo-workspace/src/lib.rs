//! Owns every document's [`SemanticModel`] plus the cross-document caches
//! built over them: the global link index and the entity schema registry.
//! Both caches are lazily rebuilt behind dirty flags — never returned
//! stale.

use rustc_hash::FxHashMap;
use thalo_fenced::FileType;
use thalo_schema::{SchemaContribution, SchemaRegistry};
use thalo_semantic::{LinkDefinition, LinkReference, SemanticModel, SemanticUpdateResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("document already exists: {0}")]
    DuplicateFilename(String),
    #[error("no such document: {0}")]
    UnknownFile(String),
}

#[derive(Debug, Default)]
struct GlobalLinkIndex {
    definitions: FxHashMap<String, LinkDefinition>,
    references: FxHashMap<String, Vec<LinkReference>>,
}

pub struct Workspace {
    models: FxHashMap<String, SemanticModel>,
    schema_registry: SchemaRegistry,
    schema_registry_dirty: bool,
    link_index: GlobalLinkIndex,
    link_index_dirty: bool,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            models: FxHashMap::default(),
            schema_registry: SchemaRegistry::default(),
            schema_registry_dirty: true,
            link_index: GlobalLinkIndex::default(),
            link_index_dirty: true,
        }
    }

    pub fn add_document(&mut self, filename: impl Into<String>, source: String, file_type: FileType) -> Result<(), WorkspaceError> {
        let filename = filename.into();
        if self.models.contains_key(&filename) {
            return Err(WorkspaceError::DuplicateFilename(filename));
        }
        let model = SemanticModel::build(filename.clone(), source, file_type);
        self.models.insert(filename, model);
        self.invalidate_all();
        Ok(())
    }

    /// Idempotent: replaces the document even if `source` is unchanged.
    pub fn update_document(&mut self, filename: &str, source: String) -> Result<SemanticUpdateResult, WorkspaceError> {
        let model = self.models.get_mut(filename).ok_or_else(|| WorkspaceError::UnknownFile(filename.to_string()))?;
        let result = model.update(source);
        self.link_index_dirty = true;
        if result.schema_entries_changed {
            self.schema_registry_dirty = true;
        }
        Ok(result)
    }

    pub fn remove_document(&mut self, filename: &str) -> Result<(), WorkspaceError> {
        self.models.remove(filename).ok_or_else(|| WorkspaceError::UnknownFile(filename.to_string()))?;
        self.invalidate_all();
        Ok(())
    }

    pub fn get_model(&self, filename: &str) -> Option<&SemanticModel> {
        self.models.get(filename)
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn all_models(&self) -> impl Iterator<Item = &SemanticModel> {
        self.models.values()
    }

    pub fn get_link_definition(&mut self, id: &str) -> Option<&LinkDefinition> {
        self.rebuild_link_index_if_dirty();
        self.link_index.definitions.get(id)
    }

    pub fn get_link_references(&mut self, id: &str) -> &[LinkReference] {
        self.rebuild_link_index_if_dirty();
        self.link_index.references.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn schema_registry(&mut self) -> &SchemaRegistry {
        self.rebuild_schema_registry_if_dirty();
        &self.schema_registry
    }

    /// Forces both lazily-built caches up to date. Callers that need a
    /// read-only `&Workspace` afterward (the rule framework, which shares
    /// one `&Workspace` across every rule) call this once up front instead
    /// of relying on the mutable accessors above.
    pub fn refresh_caches(&mut self) {
        self.rebuild_link_index_if_dirty();
        self.rebuild_schema_registry_if_dirty();
    }

    /// Reads the link index built by the last [`Workspace::refresh_caches`]
    /// or mutable accessor call. Returns stale data if the workspace has
    /// been mutated since without a refresh.
    pub fn cached_link_definition(&self, id: &str) -> Option<&LinkDefinition> {
        self.link_index.definitions.get(id)
    }

    pub fn cached_link_references(&self, id: &str) -> &[LinkReference] {
        self.link_index.references.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cached_schema_registry(&self) -> &SchemaRegistry {
        &self.schema_registry
    }

    fn invalidate_all(&mut self) {
        self.link_index_dirty = true;
        self.schema_registry_dirty = true;
    }

    fn rebuild_link_index_if_dirty(&mut self) {
        if !self.link_index_dirty {
            return;
        }
        let mut filenames: Vec<&String> = self.models.keys().collect();
        filenames.sort();

        let mut definitions: FxHashMap<String, LinkDefinition> = FxHashMap::default();
        let mut references: FxHashMap<String, Vec<LinkReference>> = FxHashMap::default();
        for filename in filenames {
            // Safe: filenames were collected from self.models's own keys.
            let model = &self.models[filename];
            for (id, def) in &model.link_index.definitions {
                let keep_existing = definitions
                    .get(id)
                    .is_some_and(|existing| (existing.file.as_str(), existing.location.start_index) <= (def.file.as_str(), def.location.start_index));
                if !keep_existing {
                    definitions.insert(id.clone(), def.clone());
                }
            }
            for (id, refs) in &model.link_index.references {
                references.entry(id.clone()).or_default().extend(refs.iter().cloned());
            }
        }
        self.link_index = GlobalLinkIndex { definitions, references };
        self.link_index_dirty = false;
    }

    fn rebuild_schema_registry_if_dirty(&mut self) {
        if !self.schema_registry_dirty {
            return;
        }
        let mut contributions = Vec::new();
        for (filename, model) in &self.models {
            for entry in &model.source_file.entries {
                if let thalo_ast::Entry::Schema(schema) = entry {
                    let timestamp = schema.header.timestamp.ok().map(|ts| ts.format()).unwrap_or_default();
                    contributions.push(SchemaContribution {
                        file: filename.clone(),
                        timestamp,
                        start_index: schema.location.start_index,
                        entry: schema,
                    });
                }
            }
        }
        self.schema_registry = SchemaRegistry::rebuild(contributions);
        self.schema_registry_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn schema_registry_resolves_across_two_documents() {
        let mut ws = Workspace::new();
        ws.add_document(
            "a.thalo",
            "2026-01-01T00:00Z define-entity lore \"Lore\"\n  # Sections\n    Summary\n".to_string(),
            FileType::Thalo,
        )
        .unwrap();
        ws.add_document(
            "b.thalo",
            "2026-01-02T00:00Z alter-entity lore\n  # Remove Sections\n    Summary\n  # Sections\n    Body\n".to_string(),
            FileType::Thalo,
        )
        .unwrap();

        let resolved = ws.schema_registry().get("lore").expect("resolved schema");
        assert_eq!(resolved.sections.len(), 1);
        assert!(resolved.sections.contains_key("Body"));
    }

    #[test]
    fn link_definition_resolves_across_documents() {
        let mut ws = Workspace::new();
        ws.add_document("a.thalo", "2026-01-01T00:00Z create lore \"E\" ^abc\n  k: \"v\"\n".to_string(), FileType::Thalo).unwrap();
        let def = ws.get_link_definition("abc").expect("definition");
        assert_eq!(def.file, "a.thalo");
    }

    #[test]
    fn duplicate_filename_is_rejected() {
        let mut ws = Workspace::new();
        ws.add_document("a.thalo", String::new(), FileType::Thalo).unwrap();
        let err = ws.add_document("a.thalo", String::new(), FileType::Thalo).unwrap_err();
        assert!(matches!(err, WorkspaceError::DuplicateFilename(_)));
    }
}
