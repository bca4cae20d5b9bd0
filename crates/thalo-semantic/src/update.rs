use std::collections::HashMap;

use rustc_hash::FxHashSet;
use thalo_ast::{
    ActualizeEntry, Content, ContentChild, Entry, FieldDefinition, Header, InstanceEntry, Metadata, Parsed,
    SchemaEntry, SectionDefinition, SourceFile, SyntaxError, SynthesisEntry,
};
use thalo_position::{Location, SourceMap};

use crate::link::touched_link_ids;

/// Report produced by [`crate::SemanticModel::update`]: what changed in
/// the model as a result of one incremental edit.
#[derive(Debug, Default)]
pub struct SemanticUpdateResult {
    pub added_link_definitions: Vec<String>,
    pub removed_link_definitions: Vec<String>,
    pub changed_link_references: Vec<String>,
    pub schema_entries_changed: bool,
    pub changed_entity_names: FxHashSet<String>,
}

/// Computes the set-difference of entries keyed by `(variant, startIndex,
/// endIndex)` between the previous and
/// rebuilt AST, reporting what a workspace needs to invalidate.
pub(crate) fn diff(_filename: &str, before: &SourceFile, after: &SourceFile) -> SemanticUpdateResult {
    let before_map: HashMap<_, _> = before.entries.iter().map(|e| (e.identity_key(), e)).collect();
    let after_map: HashMap<_, _> = after.entries.iter().map(|e| (e.identity_key(), e)).collect();

    let mut result = SemanticUpdateResult::default();

    for (key, entry) in &before_map {
        if after_map.contains_key(key) {
            continue;
        }
        if let Some(id) = entry.header().and_then(|h| h.link.clone()) {
            result.removed_link_definitions.push(id);
        }
        result.changed_link_references.extend(touched_link_ids(entry));
        record_schema_change(entry, &mut result);
    }
    for (key, entry) in &after_map {
        if before_map.contains_key(key) {
            continue;
        }
        if let Some(id) = entry.header().and_then(|h| h.link.clone()) {
            result.added_link_definitions.push(id);
        }
        result.changed_link_references.extend(touched_link_ids(entry));
        record_schema_change(entry, &mut result);
    }

    result
}

fn record_schema_change(entry: &Entry, result: &mut SemanticUpdateResult) {
    if let Entry::Schema(schema) = entry {
        result.schema_entries_changed = true;
        result.changed_entity_names.insert(schema.header.entity.clone());
    }
}

fn remap_location(loc: Location, map: &SourceMap) -> Location {
    Location {
        start_index: map.to_file_offset(loc.start_index),
        end_index: map.to_file_offset(loc.end_index),
        start_position: map.to_file_position(loc.start_position),
        end_position: map.to_file_position(loc.end_position),
    }
}

fn remap_syntax_error(err: SyntaxError, map: &SourceMap) -> SyntaxError {
    SyntaxError { raw: err.raw, location: remap_location(err.location, map) }
}

fn remap_header(header: Header, map: &SourceMap) -> Header {
    let timestamp = match header.timestamp {
        Parsed::Ok(ts) => Parsed::Ok(ts),
        Parsed::Error(err) => Parsed::Error(remap_syntax_error(err, map)),
    };
    Header { timestamp, location: remap_location(header.location, map), ..header }
}

fn remap_metadata(metadata: Vec<Metadata>, map: &SourceMap) -> Vec<Metadata> {
    metadata.into_iter().map(|m| Metadata { location: remap_location(m.location, map), ..m }).collect()
}

fn remap_content(content: Content, map: &SourceMap) -> Content {
    let children = content
        .children
        .into_iter()
        .map(|child| match child {
            ContentChild::MdHeader { text, location } => ContentChild::MdHeader { text, location: remap_location(location, map) },
            ContentChild::BulletItem { text, location } => ContentChild::BulletItem { text, location: remap_location(location, map) },
            ContentChild::PlainText { text, location } => ContentChild::PlainText { text, location: remap_location(location, map) },
            ContentChild::Blank { location } => ContentChild::Blank { location: remap_location(location, map) },
        })
        .collect();
    Content { children, location: remap_location(content.location, map) }
}

fn remap_fields(fields: Vec<FieldDefinition>, map: &SourceMap) -> Vec<FieldDefinition> {
    fields.into_iter().map(|f| FieldDefinition { location: remap_location(f.location, map), ..f }).collect()
}

fn remap_sections(sections: Vec<SectionDefinition>, map: &SourceMap) -> Vec<SectionDefinition> {
    sections.into_iter().map(|s| SectionDefinition { location: remap_location(s.location, map), ..s }).collect()
}

/// Composes a block-relative entry's locations onto file-absolute
/// coordinates via the block's [`SourceMap`].
pub(crate) fn remap_entry_locations(entry: Entry, map: &SourceMap) -> Entry {
    match entry {
        Entry::Instance(InstanceEntry { header, metadata, content, location }) => Entry::Instance(InstanceEntry {
            header: remap_header(header, map),
            metadata: remap_metadata(metadata, map),
            content: content.map(|c| remap_content(c, map)),
            location: remap_location(location, map),
        }),
        Entry::Synthesis(SynthesisEntry { header, metadata, content, location }) => Entry::Synthesis(SynthesisEntry {
            header: remap_header(header, map),
            metadata: remap_metadata(metadata, map),
            content: content.map(|c| remap_content(c, map)),
            location: remap_location(location, map),
        }),
        Entry::Actualize(ActualizeEntry { header, metadata, location }) => Entry::Actualize(ActualizeEntry {
            header: remap_header(header, map),
            metadata: remap_metadata(metadata, map),
            location: remap_location(location, map),
        }),
        Entry::Schema(SchemaEntry { header, directive, description, fields, sections, remove_metadata, remove_sections, location }) => {
            Entry::Schema(SchemaEntry {
                header: remap_header(header, map),
                directive,
                description,
                fields: remap_fields(fields, map),
                sections: remap_sections(sections, map),
                remove_metadata,
                remove_sections,
                location: remap_location(location, map),
            })
        }
        Entry::Error(err) => Entry::Error(remap_syntax_error(err, map)),
    }
}
