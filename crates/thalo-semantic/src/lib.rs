//! Per-document semantic model: the link index built over an AST, and the
//! incremental-update algorithm that keeps both in sync with edits.

mod link;
mod update;

pub use link::{LinkDefinition, LinkIndex, LinkReference};
pub use update::SemanticUpdateResult;

use rustc_hash::FxHashSet;
use thalo_ast::{Entry, SourceFile};
use thalo_fenced::{ExtractedBlock, FileType};
use thalo_position::{LineIndex, Location, SourceMap};

/// Everything known about one document: its AST, source text, line index,
/// the extracted blocks it was parsed from, and the link index built over
/// it.
pub struct SemanticModel {
    pub filename: String,
    pub source: String,
    pub file_type: FileType,
    pub line_index: LineIndex,
    pub blocks: Vec<ExtractedBlock>,
    pub source_file: SourceFile,
    pub link_index: LinkIndex,
    /// Entity names whose schema contribution may have changed and have not
    /// yet been reconciled into the workspace's schema registry.
    pub dirty_schema_entities: FxHashSet<String>,
}

impl SemanticModel {
    /// Builds a model from scratch: extracts blocks, parses each with the
    /// grammar, and unions their link indexes. Block positions are mapped to
    /// file-absolute coordinates via each block's source map before being
    /// stored, so every `Location` on `source_file`/`link_index` is already
    /// file-absolute.
    pub fn build(filename: impl Into<String>, source: String, file_type: FileType) -> Self {
        let filename = filename.into();
        let line_index = LineIndex::new(&source);
        let blocks = thalo_fenced::extract_blocks(&source, file_type);

        let mut entries = Vec::new();
        let mut link_index = LinkIndex::default();
        for block in &blocks {
            let block_source_file = thalo_ast::parse(&block.content);
            for entry in block_source_file.entries {
                let entry = remap_entry(entry, &block.source_map);
                link::index_entry(&filename, &entry, &mut link_index);
                entries.push(entry);
            }
        }

        let location = blocks
            .first()
            .map(|_| Location::new(0, source.len(), thalo_position::Position::new(0, 0), line_index.offset_to_position(source.len())))
            .unwrap_or(Location::new(0, 0, thalo_position::Position::new(0, 0), thalo_position::Position::new(0, 0)));

        let source_file = SourceFile { entries, location };
        let dirty_schema_entities = schema_entity_names(&source_file);

        Self { filename, source, file_type, line_index, blocks, source_file, link_index, dirty_schema_entities }
    }

    /// Replaces this model's content in place and returns the delta needed
    /// to keep cross-document caches correct.
    pub fn update(&mut self, source: String) -> SemanticUpdateResult {
        let rebuilt = Self::build(self.filename.clone(), source, self.file_type);
        let result = update::diff(&self.filename, &self.source_file, &rebuilt.source_file);
        *self = rebuilt;
        result
    }
}

fn remap_entry(entry: Entry, map: &SourceMap) -> Entry {
    if map == &SourceMap::IDENTITY {
        return entry;
    }
    update::remap_entry_locations(entry, map)
}

fn schema_entity_names(source_file: &SourceFile) -> FxHashSet<String> {
    source_file
        .entries
        .iter()
        .filter_map(|e| match e {
            Entry::Schema(s) => Some(s.header.entity.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn build_indexes_a_header_link_definition() {
        let model = SemanticModel::build("a.thalo", "2026-01-05T18:00Z create lore \"E\" ^abc\n  k: \"v\"\n".to_string(), FileType::Thalo);
        let def = model.link_index.definitions.get("abc").expect("definition indexed");
        assert_eq!(def.file, "a.thalo");
        assert_eq!(model.dirty_schema_entities.len(), 0);
    }

    #[test]
    fn build_collects_schema_entity_names() {
        let model = SemanticModel::build(
            "a.thalo",
            "2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Sections\n    Summary\n".to_string(),
            FileType::Thalo,
        );
        assert!(model.dirty_schema_entities.contains("lore"));
    }

    #[test]
    fn markdown_block_link_locations_are_file_absolute() {
        let source = "intro\n\n```thalo\n2026-01-05T18:00Z create lore \"E\" ^abc\n  k: \"v\"\n```\n";
        let model = SemanticModel::build("a.md", source.to_string(), FileType::Markdown);
        let def = model.link_index.definitions.get("abc").expect("definition indexed");
        // The fenced block starts on file line 2 (0-based), so the header's
        // file-absolute row is offset by the block's line_offset.
        assert_eq!(def.location.start_position.row, 3);
    }

    #[test]
    fn update_reports_added_link_definition() {
        let mut model = SemanticModel::build("a.thalo", "2026-01-05T18:00Z create lore \"E\"\n  k: \"v\"\n".to_string(), FileType::Thalo);
        let result = model.update("2026-01-05T18:00Z create lore \"E\" ^abc\n  k: \"v\"\n".to_string());
        assert_eq!(result.added_link_definitions, vec!["abc".to_string()]);
        assert!(result.removed_link_definitions.is_empty());
    }

    #[test]
    fn update_reports_removed_link_definition() {
        let mut model = SemanticModel::build("a.thalo", "2026-01-05T18:00Z create lore \"E\" ^abc\n  k: \"v\"\n".to_string(), FileType::Thalo);
        let result = model.update("2026-01-05T18:00Z create lore \"E\"\n  k: \"v\"\n".to_string());
        assert_eq!(result.removed_link_definitions, vec!["abc".to_string()]);
        assert!(model.link_index.definitions.get("abc").is_none());
    }

    #[test]
    fn update_flags_changed_entity_names_when_a_schema_entry_changes() {
        let mut model = SemanticModel::build(
            "a.thalo",
            "2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Sections\n    Summary\n".to_string(),
            FileType::Thalo,
        );
        let result = model.update("2026-01-05T18:00Z define-entity lore \"Lore v2\"\n  # Sections\n    Summary\n".to_string());
        assert!(result.schema_entries_changed);
        assert!(result.changed_entity_names.contains("lore"));
    }

    #[test]
    fn update_with_unchanged_source_reports_no_changes() {
        let source = "2026-01-05T18:00Z create lore \"E\" ^abc\n  k: \"v\"\n";
        let mut model = SemanticModel::build("a.thalo", source.to_string(), FileType::Thalo);
        let result = model.update(source.to_string());
        assert!(result.added_link_definitions.is_empty());
        assert!(result.removed_link_definitions.is_empty());
        assert!(!result.schema_entries_changed);
    }
}
