//! Three-way structural merge driver: matches
//! entries across base/ours/theirs by identity, merges field by field
//! where possible, and serializes the result with conflict markers around
//! anything it couldn't reconcile.

mod equality;
mod identity;
mod resolve;
mod serialize;

use thalo_ast::{Entry, SourceFile};
use tracing::debug;

pub use resolve::ConflictKind;
pub use serialize::serialize_entry;

/// Re-serializes every entry of `source_file` back to thalo source text,
/// blank-line separated, the same shape [`merge`] itself produces — the
/// basis for the `format` frontend's round trip, since both just want the
/// AST's canonical text.
pub fn format_source_file(source_file: &SourceFile) -> String {
    let mut text = source_file.entries.iter().map(|e| serialize_entry(e, None)).collect::<Vec<_>>().join("\n\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// One side of the merge: its entries plus the source text they were
/// parsed from (needed to preserve `actualize-synthesis` entries verbatim
/// and to slice a rival's raw text into a conflict block).
#[derive(Debug, Clone, Copy)]
pub struct Side<'a> {
    pub source: &'a str,
    pub entries: &'a [Entry],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Merge,
    Diff3,
}

#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    pub marker_style: MarkerStyle,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self { marker_style: MarkerStyle::Merge }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub total_entries: usize,
    pub common: usize,
    pub ours_only: usize,
    pub theirs_only: usize,
    pub auto_merged: usize,
    pub conflicts: usize,
}

impl MergeStats {
    pub fn success(&self) -> bool {
        self.conflicts == 0
    }
}

#[derive(Debug, Clone)]
pub struct MergeResult {
    pub text: String,
    pub stats: MergeStats,
}

struct Triple<'a> {
    base: Option<&'a Entry>,
    ours: Option<&'a Entry>,
    theirs: Option<&'a Entry>,
}

fn index_by_identity(entries: &[Entry]) -> Vec<(String, &Entry)> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for entry in entries {
        let Some(id) = identity::identity(entry) else { continue };
        if seen.insert(id.clone()) {
            out.push((id, entry));
        }
    }
    out
}

fn raw_text<'a>(source: &'a str, entry: &Entry) -> &'a str {
    entry.location().span().slice(source)
}

fn timestamp_key(entry: &Entry) -> String {
    entry.header().and_then(|h| h.timestamp.ok()).map(|t| t.format()).unwrap_or_default()
}

enum Outcome<'a> {
    /// Identity present on at most one side, or deletion won: nothing to
    /// emit (or the one present side is emitted verbatim). The `bool` is
    /// true when this resolved a "both sides changed identically" case,
    /// which still counts toward the `autoMerged` statistic.
    Take(&'a Entry, &'a str, bool),
    /// Field-wise merge succeeded without a conflict.
    Merged(Entry),
    /// Entry vanished from the output (symmetric deletion, or a deletion
    /// that wins outright over a no-op on the other side).
    Deleted,
    Conflict(ConflictKind, Option<&'a Entry>, &'a Entry, &'a Entry),
}

/// Applies steps 3-4 to one identity's triple.
fn resolve_triple<'a>(triple: &Triple<'a>, ours_src: &'a str, theirs_src: &'a str) -> Outcome<'a> {
    match (triple.base, triple.ours, triple.theirs) {
        (None, Some(o), None) => Outcome::Take(o, ours_src, false),
        (None, None, Some(t)) => Outcome::Take(t, theirs_src, false),
        (None, None, None) => Outcome::Deleted,
        (None, Some(o), Some(t)) => {
            if identity::is_explicit_link(o) {
                return Outcome::Conflict(ConflictKind::DuplicateLinkId, None, o, t);
            }
            resolve_both_present(None, o, t, ours_src, theirs_src)
        }
        (Some(_), None, None) => Outcome::Deleted,
        (Some(b), Some(o), None) => {
            if equality::entries_equal(b, o) {
                Outcome::Deleted
            } else {
                Outcome::Take(o, ours_src, false)
            }
        }
        (Some(b), None, Some(t)) => {
            if equality::entries_equal(b, t) {
                Outcome::Deleted
            } else {
                Outcome::Take(t, theirs_src, false)
            }
        }
        (Some(b), Some(o), Some(t)) => {
            let ours_unchanged = equality::entries_equal(b, o);
            let theirs_unchanged = equality::entries_equal(b, t);
            match (ours_unchanged, theirs_unchanged) {
                (true, true) => Outcome::Take(o, ours_src, false),
                (true, false) => Outcome::Take(t, theirs_src, false),
                (false, true) => Outcome::Take(o, ours_src, false),
                (false, false) => resolve_both_present(Some(b), o, t, ours_src, theirs_src),
            }
        }
    }
}

fn resolve_both_present<'a>(base: Option<&'a Entry>, ours: &'a Entry, theirs: &'a Entry, ours_src: &'a str, theirs_src: &'a str) -> Outcome<'a> {
    if equality::entries_equal(ours, theirs) {
        return Outcome::Take(ours, ours_src, true);
    }

    match (base, ours, theirs) {
        (base, Entry::Instance(o), Entry::Instance(t)) => {
            let base_i = base.and_then(|b| if let Entry::Instance(bi) = b { Some(bi) } else { None });
            let merge_result = resolve::merge_instance_like(
                base_i.and_then(|b| b.header.title.as_ref()),
                base_i.map(|b| b.metadata.as_slice()).unwrap_or(&[]),
                base_i.and_then(|b| b.content.as_ref()),
                (o.header.title.as_deref().unwrap_or(""), &o.metadata, o.content.as_ref(), &o.header.tags),
                (t.header.title.as_deref().unwrap_or(""), &t.metadata, t.content.as_ref(), &t.header.tags),
            );
            match merge_result {
                Ok((title, metadata, content, tags)) => Outcome::Merged(Entry::Instance(resolve::build_instance(o, title, metadata, content, tags))),
                Err(kind) => Outcome::Conflict(kind, base, ours, theirs),
            }
        }
        (base, Entry::Synthesis(o), Entry::Synthesis(t)) => {
            let base_s = base.and_then(|b| if let Entry::Synthesis(bs) = b { Some(bs) } else { None });
            let merge_result = resolve::merge_instance_like(
                base_s.and_then(|b| b.header.title.as_ref()),
                base_s.map(|b| b.metadata.as_slice()).unwrap_or(&[]),
                base_s.and_then(|b| b.content.as_ref()),
                (o.header.title.as_deref().unwrap_or(""), &o.metadata, o.content.as_ref(), &o.header.tags),
                (t.header.title.as_deref().unwrap_or(""), &t.metadata, t.content.as_ref(), &t.header.tags),
            );
            match merge_result {
                Ok((title, metadata, content, tags)) => Outcome::Merged(Entry::Synthesis(resolve::build_synthesis(o, title, metadata, content, tags))),
                Err(kind) => Outcome::Conflict(kind, base, ours, theirs),
            }
        }
        (base, Entry::Schema(o), Entry::Schema(t)) => {
            let base_e = base.and_then(|b| if let Entry::Schema(bs) = b { Some(bs) } else { None });
            let synthetic_base = base_e.cloned().unwrap_or_else(|| empty_schema_like(o));
            match resolve::merge_schema(&synthetic_base, o, t) {
                Ok(merged) => Outcome::Merged(Entry::Schema(merged)),
                Err(kind) => Outcome::Conflict(kind, base, ours, theirs),
            }
        }
        // Actualize entries are never field-merged (resolved open question:
        // they carry verbatim raw text rather than being re-derived), so
        // "both changed" always surfaces as a conflict.
        (base, Entry::Actualize(_), Entry::Actualize(_)) => Outcome::Conflict(ConflictKind::ConcurrentMetadataUpdate, base, ours, theirs),
        _ => Outcome::Conflict(ConflictKind::ConcurrentMetadataUpdate, base, ours, theirs),
    }
}

fn empty_schema_like(template: &thalo_ast::SchemaEntry) -> thalo_ast::SchemaEntry {
    thalo_ast::SchemaEntry {
        header: template.header.clone(),
        directive: template.directive,
        description: None,
        fields: Vec::new(),
        sections: Vec::new(),
        remove_metadata: Vec::new(),
        remove_sections: Vec::new(),
        location: template.location,
    }
}

fn conflict_block(kind: ConflictKind, base: Option<&Entry>, ours: &Entry, theirs: &Entry, ours_src: &str, theirs_src: &str, style: MarkerStyle) -> String {
    debug!(code = kind.code(), "unresolved merge conflict");
    let ours_text = serialize::serialize_entry(ours, Some(raw_text(ours_src, ours)));
    let theirs_text = serialize::serialize_entry(theirs, Some(raw_text(theirs_src, theirs)));
    let mut lines = vec!["<<<<<<< ours".to_string(), ours_text];
    if style == MarkerStyle::Diff3 {
        if let Some(b) = base {
            lines.push("||||||| base".to_string());
            lines.push(serialize::serialize_entry(b, None));
        }
    }
    lines.push("=======".to_string());
    lines.push(theirs_text);
    lines.push(">>>>>>> theirs".to_string());
    lines.join("\n")
}

/// Runs the three-way merge and returns the serialized result plus
/// statistics.
pub fn merge(base: Side<'_>, ours: Side<'_>, theirs: Side<'_>, options: &MergeOptions) -> MergeResult {
    let base_index = index_by_identity(base.entries);
    let ours_index = index_by_identity(ours.entries);
    let theirs_index = index_by_identity(theirs.entries);

    let mut order = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for (id, _) in base_index.iter().chain(&ours_index).chain(&theirs_index) {
        if seen.insert(id.clone()) {
            order.push(id.clone());
        }
    }

    let find = |index: &[(String, &Entry)], id: &str| index.iter().find(|(k, _)| k == id).map(|(_, e)| *e);

    let mut stats = MergeStats::default();
    let mut items: Vec<(String, String)> = Vec::new();

    for id in &order {
        stats.total_entries += 1;
        let triple = Triple { base: find(&base_index, id), ours: find(&ours_index, id), theirs: find(&theirs_index, id) };

        let present_sides = [triple.base.is_some(), triple.ours.is_some(), triple.theirs.is_some()].iter().filter(|p| **p).count();
        if present_sides > 1 {
            stats.common += 1;
        } else if triple.ours.is_some() {
            stats.ours_only += 1;
        } else if triple.theirs.is_some() {
            stats.theirs_only += 1;
        }

        match resolve_triple(&triple, ours.source, theirs.source) {
            Outcome::Deleted => {}
            Outcome::Take(entry, src, counts_as_merged) => {
                if counts_as_merged {
                    stats.auto_merged += 1;
                }
                let raw_override = matches!(entry, Entry::Actualize(_)).then(|| raw_text(src, entry));
                items.push((timestamp_key(entry), serialize::serialize_entry(entry, raw_override)));
            }
            Outcome::Merged(entry) => {
                stats.auto_merged += 1;
                let text = serialize::serialize_entry(&entry, None);
                items.push((timestamp_key(&entry), text));
            }
            Outcome::Conflict(kind, base_entry, our_entry, their_entry) => {
                stats.conflicts += 1;
                let ts = timestamp_key(our_entry).max(timestamp_key(their_entry));
                let block = conflict_block(kind, base_entry, our_entry, their_entry, ours.source, theirs.source, options.marker_style);
                items.push((ts, block));
            }
        }
    }

    items.sort_by(|a, b| a.0.cmp(&b.0));
    let text = items.into_iter().map(|(_, text)| text).collect::<Vec<_>>().join("\n\n");
    MergeResult { text, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thalo_ast::parse;

    fn entries(source: &str) -> Vec<Entry> {
        parse(source).entries
    }

    #[test]
    fn disjoint_field_changes_auto_merge() {
        let base_src = "2026-01-05T10:00Z create lore \"t\" ^a\n  k: \"1\"\n";
        let ours_src = "2026-01-05T10:00Z create lore \"t\" ^a\n  k: \"2\"\n";
        let theirs_src = "2026-01-05T10:00Z create lore \"t2\" ^a\n  k: \"1\"\n";
        let base_entries = entries(base_src);
        let ours_entries = entries(ours_src);
        let theirs_entries = entries(theirs_src);

        let result = merge(
            Side { source: base_src, entries: &base_entries },
            Side { source: ours_src, entries: &ours_entries },
            Side { source: theirs_src, entries: &theirs_entries },
            &MergeOptions::default(),
        );

        assert_eq!(result.stats.conflicts, 0);
        assert_eq!(result.stats.auto_merged, 1);
        assert!(result.text.contains("k: \"2\""));
        assert!(result.text.contains("\"t2\""));
        assert!(result.stats.success());
    }

    #[test]
    fn concurrent_metadata_edit_conflicts() {
        let base_src = "2026-01-05T10:00Z create lore \"t\" ^a\n  k: \"1\"\n";
        let ours_src = "2026-01-05T10:00Z create lore \"t\" ^a\n  k: \"2\"\n";
        let theirs_src = "2026-01-05T10:00Z create lore \"t\" ^a\n  k: \"3\"\n";
        let base_entries = entries(base_src);
        let ours_entries = entries(ours_src);
        let theirs_entries = entries(theirs_src);

        let result = merge(
            Side { source: base_src, entries: &base_entries },
            Side { source: ours_src, entries: &ours_entries },
            Side { source: theirs_src, entries: &theirs_entries },
            &MergeOptions::default(),
        );

        assert_eq!(result.stats.conflicts, 1);
        assert!(!result.stats.success());
        assert!(result.text.contains("<<<<<<< ours"));
        assert!(result.text.contains(">>>>>>> theirs"));
    }

    #[test]
    fn added_only_in_ours_is_kept() {
        let base_src = "";
        let ours_src = "2026-01-05T10:00Z create lore \"new\" ^a\n  k: \"1\"\n";
        let theirs_src = "";
        let base_entries = entries(base_src);
        let ours_entries = entries(ours_src);
        let theirs_entries = entries(theirs_src);

        let result = merge(
            Side { source: base_src, entries: &base_entries },
            Side { source: ours_src, entries: &ours_entries },
            Side { source: theirs_src, entries: &theirs_entries },
            &MergeOptions::default(),
        );

        assert_eq!(result.stats.ours_only, 1);
        assert_eq!(result.stats.conflicts, 0);
        assert!(result.text.contains("\"new\""));
    }

    #[test]
    fn unchanged_deletion_by_theirs_wins() {
        let base_src = "2026-01-05T10:00Z create lore \"t\" ^a\n  k: \"1\"\n";
        let ours_src = "2026-01-05T10:00Z create lore \"t\" ^a\n  k: \"1\"\n";
        let theirs_src = "";
        let base_entries = entries(base_src);
        let ours_entries = entries(ours_src);
        let theirs_entries = entries(theirs_src);

        let result = merge(
            Side { source: base_src, entries: &base_entries },
            Side { source: ours_src, entries: &ours_entries },
            Side { source: theirs_src, entries: &theirs_entries },
            &MergeOptions::default(),
        );

        assert_eq!(result.text, "");
        assert_eq!(result.stats.conflicts, 0);
    }

    #[test]
    fn schema_fields_merge_when_sides_add_different_fields() {
        let base_src = "2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Metadata\n    subject?: string\n";
        let ours_src = "2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Metadata\n    subject?: string\n    mood?: string\n";
        let theirs_src = "2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Metadata\n    subject?: string\n  # Sections\n    Summary\n";
        let base_entries = entries(base_src);
        let ours_entries = entries(ours_src);
        let theirs_entries = entries(theirs_src);

        let result = merge(
            Side { source: base_src, entries: &base_entries },
            Side { source: ours_src, entries: &ours_entries },
            Side { source: theirs_src, entries: &theirs_entries },
            &MergeOptions::default(),
        );

        assert_eq!(result.stats.conflicts, 0);
        assert!(result.text.contains("mood?: string"));
        assert!(result.text.contains("Summary"));
    }

    #[test]
    fn actualize_entry_keeps_verbatim_text_when_only_one_side_changes() {
        let base_src = "2026-01-10T00:00Z actualize-synthesis ^d1 \"run\"\n  checkpoint: \"ts:2026-01-01T00:00Z\"\n";
        let ours_src = "2026-01-10T00:00Z actualize-synthesis ^d1   \"run\"\n  checkpoint: \"ts:2026-01-02T00:00Z\"\n";
        let theirs_src = base_src;
        let base_entries = entries(base_src);
        let ours_entries = entries(ours_src);
        let theirs_entries = entries(theirs_src);

        let result = merge(
            Side { source: base_src, entries: &base_entries },
            Side { source: ours_src, entries: &ours_entries },
            Side { source: theirs_src, entries: &theirs_entries },
            &MergeOptions::default(),
        );

        assert_eq!(result.stats.conflicts, 0);
        assert!(result.text.contains("ts:2026-01-02T00:00Z"));
    }

    #[test]
    fn symmetric_case_equals_either_side() {
        let base_src = "2026-01-05T10:00Z create lore \"t\" ^a\n  k: \"1\"\n";
        let shared_src = "2026-01-05T10:00Z create lore \"t2\" ^a\n  k: \"1\"\n";
        let base_entries = entries(base_src);
        let ours_entries = entries(shared_src);
        let theirs_entries = entries(shared_src);

        let result = merge(
            Side { source: base_src, entries: &base_entries },
            Side { source: shared_src, entries: &ours_entries },
            Side { source: shared_src, entries: &theirs_entries },
            &MergeOptions::default(),
        );

        assert_eq!(result.stats.conflicts, 0);
        assert!(result.text.contains("\"t2\""));
    }

    #[test]
    fn format_source_file_round_trips_through_the_ast() {
        let src = "2026-01-05T18:00Z create lore \"E\" #t\n  subject: \"x\"\n\n  # Summary\n  body.\n";
        let source_file = thalo_ast::parse(src);
        let formatted = format_source_file(&source_file);
        let reparsed = thalo_ast::parse(&formatted);
        assert_eq!(reparsed.entries.len(), source_file.entries.len());
        assert!(formatted.contains("subject: \"x\""));
    }
}
