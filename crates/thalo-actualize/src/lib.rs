//! Actualize command: for every `define-synthesis`
//! entry, finds its latest `actualize-synthesis` marker, asks the change
//! tracker for entries new since that checkpoint, and emits a pending-update
//! record.

use thalo_ast::{Entry, SynthesisEntry};
use thalo_query::{format_query, parse_query_string, Query};
use thalo_tracker::{parse_checkpoint, ChangeTracker, Marker};
use thalo_workspace::Workspace;

/// One entry the tracker reported as new for a synthesis's sources.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub file: String,
    pub timestamp: String,
    pub entity: String,
    pub title: Option<String>,
    pub link_id: Option<String>,
    pub tags: Vec<String>,
    pub raw_text: String,
}

/// One `define-synthesis`'s actualize status.
#[derive(Debug, Clone)]
pub struct ActualizeRecord {
    pub file: String,
    pub title: Option<String>,
    pub link_id: String,
    pub sources: Vec<String>,
    pub last_checkpoint: Option<String>,
    pub prompt: Option<String>,
    pub entries: Vec<PendingEntry>,
    pub current_checkpoint: String,
    pub is_up_to_date: bool,
}

#[derive(Debug)]
pub struct ActualizeResult {
    pub tracker_type: &'static str,
    pub records: Vec<ActualizeRecord>,
    /// Link ids the caller asked about (`--synthesis <id>`) that did not
    /// correspond to any `define-synthesis` entry in the workspace.
    pub unknown_synthesis_ids: Vec<String>,
}

/// Finds, for each `(file, SynthesisEntry)`, the latest `actualize-synthesis`
/// entry in the whole workspace targeting its `^linkId` (step 1: "highest
/// timestamp wins").
fn latest_actualize_marker<'a>(workspace: &'a Workspace, link_id: &str) -> Option<(&'a str, &'a thalo_ast::ActualizeEntry)> {
    let mut best: Option<(&str, &thalo_ast::ActualizeEntry)> = None;
    let mut files: Vec<&str> = workspace.files().collect();
    files.sort();
    for filename in files {
        let Some(model) = workspace.get_model(filename) else { continue };
        for entry in &model.source_file.entries {
            let Entry::Actualize(a) = entry else { continue };
            if a.header.link.as_deref() != Some(link_id) {
                continue;
            }
            let Some(ts) = a.header.timestamp.ok() else { continue };
            let formatted = ts.format();
            let is_better = best.as_ref().is_none_or(|(_, current)| {
                current.header.timestamp.ok().map(|c| c.format()).unwrap_or_default() < formatted
            });
            if is_better {
                best = Some((filename, a));
            }
        }
    }
    best
}

fn checkpoint_of(actualize: &thalo_ast::ActualizeEntry) -> Option<String> {
    actualize.metadata.iter().find(|m| m.key == "checkpoint").map(|m| m.raw.trim_matches('"').to_string())
}

fn sources_queries(synthesis: &SynthesisEntry) -> Vec<Query> {
    let Some(sources) = synthesis.metadata.iter().find(|m| m.key == "sources") else {
        return Vec::new();
    };
    let raw = match &sources.content {
        thalo_ast::ValueContent::Query(text) => text.clone(),
        other => other_to_text(other),
    };
    parse_query_string(&raw)
}

fn other_to_text(value: &thalo_ast::ValueContent) -> String {
    match value {
        thalo_ast::ValueContent::QuotedString(s) => format!("\"{s}\""),
        thalo_ast::ValueContent::Link(id) => format!("^{id}"),
        thalo_ast::ValueContent::Query(q) => q.clone(),
        thalo_ast::ValueContent::Array(items) => items.first().map(other_to_text).unwrap_or_default(),
        thalo_ast::ValueContent::Datetime(_) | thalo_ast::ValueContent::DateRange(_, _) => String::new(),
    }
}

/// Runs the actualize command over every `define-synthesis` in the
/// workspace, optionally restricted to `requested_ids` (the CLI's
/// `--synthesis <id>...`).
pub fn actualize(workspace: &Workspace, tracker: &dyn ChangeTracker, requested_ids: Option<&[String]>) -> ActualizeResult {
    tracing::debug!(files = workspace.files().count(), requested = ?requested_ids, "running actualize");
    let mut records = Vec::new();
    let mut found_ids: Vec<String> = Vec::new();

    let mut files: Vec<&str> = workspace.files().collect();
    files.sort();
    for filename in &files {
        let Some(model) = workspace.get_model(filename) else { continue };
        for entry in &model.source_file.entries {
            let Entry::Synthesis(synthesis) = entry else { continue };
            let Some(link_id) = &synthesis.header.link else { continue };
            if let Some(ids) = requested_ids {
                if !ids.contains(link_id) {
                    continue;
                }
            }
            found_ids.push(link_id.clone());

            let marker_entry = latest_actualize_marker(workspace, link_id);
            let last_checkpoint = marker_entry.and_then(|(_, a)| checkpoint_of(a));
            let last_marker = last_checkpoint.as_deref().and_then(parse_checkpoint);

            let queries = sources_queries(synthesis);
            let changed = tracker.changed_entries(workspace, &queries, last_marker.as_ref());

            let (entries, current_marker) = match changed {
                Ok(result) => (result.entries, result.current_marker),
                Err(_) => (Vec::new(), Marker::Timestamp(String::new())),
            };

            let pending: Vec<PendingEntry> = entries
                .into_iter()
                .map(|m| {
                    let raw_text = workspace.get_model(&m.file).map(|model| m.location.span().slice(&model.source).to_string()).unwrap_or_default();
                    PendingEntry {
                        file: m.file,
                        timestamp: m.formatted_timestamp,
                        entity: m.entry.header.entity.clone(),
                        title: m.entry.header.title.clone(),
                        link_id: m.entry.header.link.clone(),
                        tags: m.entry.header.tags.clone(),
                        raw_text,
                    }
                })
                .collect();

            let is_up_to_date = pending.is_empty();
            records.push(ActualizeRecord {
                file: filename.to_string(),
                title: synthesis.header.title.clone(),
                link_id: link_id.clone(),
                sources: queries.iter().map(format_query).collect(),
                last_checkpoint,
                prompt: synthesis.content.as_ref().and_then(|c| c.section_body("Prompt")),
                entries: pending,
                current_checkpoint: current_marker.to_string(),
                is_up_to_date,
            });
        }
    }

    let unknown_synthesis_ids = requested_ids.map(|ids| ids.iter().filter(|id| !found_ids.contains(id)).cloned().collect()).unwrap_or_default();

    ActualizeResult { tracker_type: tracker.tracker_type(), records, unknown_synthesis_ids }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use thalo_fenced::FileType;
    use thalo_tracker::TimestampTracker;

    #[test]
    fn first_actualize_includes_all_matching_entries() {
        let mut ws = Workspace::new();
        ws.add_document(
            "syn.thalo",
            "2026-01-01T00:00Z define-synthesis synth \"Digest\" ^d1\n  sources: lore\n\n  # Prompt\n  Summarize new lore.\n".to_string(),
            FileType::Thalo,
        )
        .unwrap();
        ws.add_document("lore.thalo", "2026-01-05T00:00Z create lore \"E\"\n  subject: \"x\"\n".to_string(), FileType::Thalo).unwrap();

        let tracker = TimestampTracker::with_clock(|| "2026-02-01T00:00Z".to_string());
        let result = actualize(&ws, &tracker, None);
        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.link_id, "d1");
        assert_eq!(record.prompt.as_deref(), Some("Summarize new lore."));
        assert_eq!(record.entries.len(), 1);
        assert!(!record.is_up_to_date);
        assert!(record.last_checkpoint.is_none());
    }

    #[test]
    fn requested_id_with_no_synthesis_is_reported_unknown() {
        let ws = Workspace::new();
        let tracker = TimestampTracker::with_clock(|| "2026-02-01T00:00Z".to_string());
        let result = actualize(&ws, &tracker, Some(&["missing".to_string()]));
        assert_eq!(result.unknown_synthesis_ids, vec!["missing".to_string()]);
    }

    #[test]
    fn actualize_marker_checkpoint_is_respected() {
        let mut ws = Workspace::new();
        ws.add_document(
            "syn.thalo",
            "2026-01-01T00:00Z define-synthesis synth \"Digest\" ^d1\n  sources: lore\n\n2026-01-10T00:00Z actualize-synthesis ^d1 \"run\"\n  checkpoint: \"ts:2026-01-08T00:00Z\"\n".to_string(),
            FileType::Thalo,
        )
        .unwrap();
        ws.add_document(
            "lore.thalo",
            "2026-01-05T00:00Z create lore \"Old\"\n  subject: \"x\"\n\n2026-01-09T00:00Z create lore \"New\"\n  subject: \"x\"\n".to_string(),
            FileType::Thalo,
        )
        .unwrap();

        let tracker = TimestampTracker::with_clock(|| "2026-02-01T00:00Z".to_string());
        let result = actualize(&ws, &tracker, None);
        let record = &result.records[0];
        assert_eq!(record.last_checkpoint.as_deref(), Some("ts:2026-01-08T00:00Z"));
        assert_eq!(record.entries.len(), 1);
        assert_eq!(record.entries[0].title.as_deref(), Some("New"));
    }
}
