//! Per-entry three-way merge: given a
//! `{base?, ours, theirs}` triple where both sides are present and at
//! least one differs from base, attempts a field-wise merge and reports
//! the first applicable conflict in priority order.

use thalo_ast::{ActualizeEntry, Content, Entry, InstanceEntry, Metadata, SchemaEntry, SynthesisEntry, ValueContent};

use crate::equality::content_opt_equal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    DuplicateLinkId,
    ConcurrentMetadataUpdate,
    ConcurrentContentEdit,
    IncompatibleSchemaChange,
    ConcurrentTitleChange,
}

impl ConflictKind {
    pub fn code(&self) -> &'static str {
        match self {
            ConflictKind::DuplicateLinkId => "duplicate-link-id",
            ConflictKind::ConcurrentMetadataUpdate => "concurrent-metadata-update",
            ConflictKind::ConcurrentContentEdit => "concurrent-content-edit",
            ConflictKind::IncompatibleSchemaChange => "incompatible-schema-change",
            ConflictKind::ConcurrentTitleChange => "concurrent-title-change",
        }
    }
}

/// Resolves a single value slot (title, a metadata key, a schema
/// field/section/removal) three ways. `Err(())` means both sides changed
/// it to different values and neither matches base: a conflict.
fn resolve<T: PartialEq + Clone>(base: Option<&T>, ours: Option<&T>, theirs: Option<&T>) -> Result<Option<T>, ()> {
    match (ours, theirs) {
        (None, None) => Ok(None),
        (Some(o), None) => {
            if base.is_some_and(|b| b == o) {
                Ok(None)
            } else {
                Ok(Some(o.clone()))
            }
        }
        (None, Some(t)) => {
            if base.is_some_and(|b| b == t) {
                Ok(None)
            } else {
                Ok(Some(t.clone()))
            }
        }
        (Some(o), Some(t)) => {
            if o == t {
                Ok(Some(o.clone()))
            } else if base.is_some_and(|b| b == o) {
                Ok(Some(t.clone()))
            } else if base.is_some_and(|b| b == t) {
                Ok(Some(o.clone()))
            } else {
                Err(())
            }
        }
    }
}

fn metadata_key<'a>(metadata: &'a [Metadata], key: &str) -> Option<&'a Metadata> {
    metadata.iter().find(|m| m.key == key)
}

/// `(key, content)` pair compared by content only — lets [`resolve`]
/// treat two differently-`raw`-but-identically-typed values as equal.
#[derive(Clone)]
struct MetaValue(String, ValueContent);
impl PartialEq for MetaValue {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

fn metadata_keys_union(base: &[Metadata], ours: &[Metadata], theirs: &[Metadata]) -> Vec<String> {
    let mut keys = Vec::new();
    for m in ours.iter().chain(theirs).chain(base) {
        if !keys.contains(&m.key) {
            keys.push(m.key.clone());
        }
    }
    keys
}

/// Merges metadata key by key. `Err` carries the conflicting key, used
/// only for diagnostics; the caller reports `ConcurrentMetadataUpdate` and
/// discards the partial merge.
pub fn merge_metadata(base: &[Metadata], ours: &[Metadata], theirs: &[Metadata]) -> Result<Vec<Metadata>, String> {
    let mut merged = Vec::new();
    for key in metadata_keys_union(base, ours, theirs) {
        let b = metadata_key(base, &key).map(|m| MetaValue(m.key.clone(), m.content.clone()));
        let o = metadata_key(ours, &key).map(|m| MetaValue(m.key.clone(), m.content.clone()));
        let t = metadata_key(theirs, &key).map(|m| MetaValue(m.key.clone(), m.content.clone()));
        match resolve(b.as_ref(), o.as_ref(), t.as_ref()) {
            Err(()) => return Err(key),
            Ok(None) => {}
            Ok(Some(value)) => {
                let source = [metadata_key(ours, &key), metadata_key(theirs, &key)]
                    .into_iter()
                    .flatten()
                    .find(|m| m.content == value.1)
                    .or_else(|| metadata_key(ours, &key))
                    .or_else(|| metadata_key(theirs, &key))
                    .expect("resolved value must come from a side");
                merged.push(Metadata { key: value.0, raw: source.raw.clone(), content: value.1, location: source.location });
            }
        }
    }
    merged
}

fn content_unchanged(base: Option<&Content>, side: Option<&Content>) -> bool {
    match base {
        Some(_) => content_opt_equal(base, side),
        None => side.is_none(),
    }
}

/// Merges optional content blocks. `Err` means both sides kept content
/// that differs (`ConcurrentContentEdit`); a side deleting content while
/// the other only edited it resolves to the edit — the conflict is
/// reserved for "both sides kept content but differ".
pub fn merge_content(base: Option<&Content>, ours: Option<&Content>, theirs: Option<&Content>) -> Result<Option<Content>, ()> {
    match (ours, theirs) {
        (None, None) => Ok(None),
        (Some(o), Some(t)) if crate::equality::content_equal(o, t) => Ok(Some(o.clone())),
        (Some(o), Some(t)) => {
            let o_unchanged = content_unchanged(base, Some(o));
            let t_unchanged = content_unchanged(base, Some(t));
            if o_unchanged {
                Ok(Some(t.clone()))
            } else if t_unchanged {
                Ok(Some(o.clone()))
            } else {
                Err(())
            }
        }
        (Some(o), None) => {
            if content_unchanged(base, Some(o)) {
                Ok(None)
            } else {
                Ok(Some(o.clone()))
            }
        }
        (None, Some(t)) => {
            if content_unchanged(base, Some(t)) {
                Ok(None)
            } else {
                Ok(Some(t.clone()))
            }
        }
    }
}

fn merge_tags(ours: &[String], theirs: &[String]) -> Vec<String> {
    if ours == theirs {
        return ours.to_vec();
    }
    let mut merged: Vec<String> = ours.to_vec();
    for tag in theirs {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    merged.sort();
    merged
}

/// Attempts the field-wise merge for an instance/synthesis entry sharing
/// the metadata+content+title shape. Conflict priority:
/// `concurrent-metadata-update` before `concurrent-content-edit` before
/// `concurrent-title-change`.
pub fn merge_instance_like(
    base_header_title: Option<&String>,
    base_metadata: &[Metadata],
    base_content: Option<&Content>,
    ours: (&str, &[Metadata], Option<&Content>, &[String]),
    theirs: (&str, &[Metadata], Option<&Content>, &[String]),
) -> Result<(Option<String>, Vec<Metadata>, Option<Content>, Vec<String>), ConflictKind> {
    let merged_metadata = merge_metadata(base_metadata, ours.1, theirs.1).map_err(|_| ConflictKind::ConcurrentMetadataUpdate)?;
    let merged_content = merge_content(base_content, ours.2, theirs.2).map_err(|_| ConflictKind::ConcurrentContentEdit)?;
    let ours_title = if ours.0.is_empty() { None } else { Some(ours.0.to_string()) };
    let theirs_title = if theirs.0.is_empty() { None } else { Some(theirs.0.to_string()) };
    let merged_title = resolve(base_header_title, ours_title.as_ref(), theirs_title.as_ref()).map_err(|_| ConflictKind::ConcurrentTitleChange)?;
    let merged_tags = merge_tags(ours.3, theirs.3);
    Ok((merged_title, merged_metadata, merged_content, merged_tags))
}

pub struct ResolvedInstance {
    pub entry: InstanceEntry,
}

/// Builds the merged [`InstanceEntry`] given already-resolved field-wise
/// parts, keeping `ours`'s header as the structural template (timestamp,
/// directive, entity, link are identity-defining and assumed equal).
pub fn build_instance(template: &InstanceEntry, title: Option<String>, metadata: Vec<Metadata>, content: Option<Content>, tags: Vec<String>) -> InstanceEntry {
    let mut header = template.header.clone();
    header.title = title;
    header.tags = tags;
    InstanceEntry { header, metadata, content, location: template.location }
}

pub fn build_synthesis(template: &SynthesisEntry, title: Option<String>, metadata: Vec<Metadata>, content: Option<Content>, tags: Vec<String>) -> SynthesisEntry {
    let mut header = template.header.clone();
    header.title = title;
    header.tags = tags;
    SynthesisEntry { header, metadata, content, location: template.location }
}

pub fn build_actualize(template: &ActualizeEntry, title: Option<String>, metadata: Vec<Metadata>, tags: Vec<String>) -> ActualizeEntry {
    let mut header = template.header.clone();
    header.title = title;
    header.tags = tags;
    ActualizeEntry { header, metadata, location: template.location }
}

/// Merges schema field/section/removal lists by name, same three-way
/// logic as metadata keys. Returns `Err` if any list entry is changed
/// incompatibly on both sides (`incompatible-schema-change`).
pub fn merge_schema(base: &SchemaEntry, ours: &SchemaEntry, theirs: &SchemaEntry) -> Result<SchemaEntry, ConflictKind> {
    let fields = merge_named(&base.fields, &ours.fields, &theirs.fields, |f| f.name.clone()).map_err(|_| ConflictKind::IncompatibleSchemaChange)?;
    let sections = merge_named(&base.sections, &ours.sections, &theirs.sections, |s| s.name.clone()).map_err(|_| ConflictKind::IncompatibleSchemaChange)?;
    let remove_metadata =
        merge_named(&base.remove_metadata, &ours.remove_metadata, &theirs.remove_metadata, |s| s.clone()).map_err(|_| ConflictKind::IncompatibleSchemaChange)?;
    let remove_sections =
        merge_named(&base.remove_sections, &ours.remove_sections, &theirs.remove_sections, |s| s.clone()).map_err(|_| ConflictKind::IncompatibleSchemaChange)?;
    let description = resolve(base.description.as_ref(), ours.description.as_ref(), theirs.description.as_ref()).map_err(|_| ConflictKind::ConcurrentTitleChange)?;

    let mut header = ours.header.clone();
    header.title = description.clone();
    Ok(SchemaEntry { header, directive: ours.directive, description, fields, sections, remove_metadata, remove_sections, location: ours.location })
}

fn merge_named<T: PartialEq + Clone>(base: &[T], ours: &[T], theirs: &[T], name_of: impl Fn(&T) -> String) -> Result<Vec<T>, ()> {
    let mut names = Vec::new();
    for item in ours.iter().chain(theirs).chain(base) {
        let name = name_of(item);
        if !names.contains(&name) {
            names.push(name);
        }
    }
    let mut merged = Vec::new();
    for name in names {
        let b = base.iter().find(|i| name_of(*i) == name);
        let o = ours.iter().find(|i| name_of(*i) == name);
        let t = theirs.iter().find(|i| name_of(*i) == name);
        if let Some(value) = resolve(b, o, t)? {
            merged.push(value);
        }
    }
    Ok(merged)
}

/// Diagnostic helper: true if `entry` structurally equals `other` (used by
/// the caller to decide "unchanged since base").
pub fn entry_unchanged(entry: &Entry, other: &Entry) -> bool {
    crate::equality::entries_equal(entry, other)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn meta(key: &str, text: &str) -> Metadata {
        Metadata {
            key: key.to_string(),
            raw: format!("\"{text}\""),
            content: ValueContent::QuotedString(text.to_string()),
            location: thalo_position::Location::new(0, 0, thalo_position::Position::default(), thalo_position::Position::default()),
        }
    }

    #[test]
    fn metadata_merges_disjoint_changes() {
        let base = vec![meta("k", "1")];
        let ours = vec![meta("k", "2")];
        let theirs = vec![meta("k", "1"), meta("j", "x")];
        let merged = merge_metadata(&base, &ours, &theirs).unwrap();
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|m| m.key == "k" && m.content == ValueContent::QuotedString("2".into())));
        assert!(merged.iter().any(|m| m.key == "j"));
    }

    #[test]
    fn metadata_conflicts_when_both_sides_change_differently() {
        let base = vec![meta("k", "1")];
        let ours = vec![meta("k", "2")];
        let theirs = vec![meta("k", "3")];
        assert_eq!(merge_metadata(&base, &ours, &theirs), Err("k".to_string()));
    }
}
