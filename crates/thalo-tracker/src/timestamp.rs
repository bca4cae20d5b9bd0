use chrono::Utc;
use thalo_query::{execute_queries, ExecuteOptions, Query};
use thalo_workspace::Workspace;

use crate::{ChangeTracker, ChangedEntries, CheckpointError, Marker};

/// `type = "ts"` strategy: `currentMarker = now()`
/// in minute-precision ISO; entries are those matching the queries whose
/// timestamp is lexicographically greater than `lastMarker.value`.
pub struct TimestampTracker {
    now: fn() -> String,
}

impl Default for TimestampTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampTracker {
    pub fn new() -> Self {
        Self { now: default_now }
    }

    /// Injects a fixed clock, for deterministic tests.
    pub fn with_clock(now: fn() -> String) -> Self {
        Self { now }
    }
}

fn default_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%MZ").to_string()
}

impl ChangeTracker for TimestampTracker {
    fn tracker_type(&self) -> &'static str {
        "ts"
    }

    fn changed_entries(&self, workspace: &Workspace, queries: &[Query], last_marker: Option<&Marker>) -> Result<ChangedEntries, CheckpointError> {
        let after_timestamp = match last_marker {
            None => None,
            Some(Marker::Timestamp(ts)) => Some(ts.clone()),
            Some(other) => return Err(CheckpointError::WrongStrategy(other.to_string())),
        };
        let matches = execute_queries(workspace, queries, &ExecuteOptions { after_timestamp });
        Ok(ChangedEntries { entries: matches, current_marker: Marker::Timestamp((self.now)()) })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use thalo_fenced::FileType;
    use thalo_query::parse_query_string;

    #[test]
    fn first_run_with_no_marker_returns_everything() {
        let mut ws = Workspace::new();
        ws.add_document("a.thalo", "2026-01-01T00:00Z create lore \"First\"\n  subject: \"x\"\n".to_string(), FileType::Thalo).unwrap();
        let tracker = TimestampTracker::with_clock(|| "2026-02-01T00:00Z".to_string());
        let queries = parse_query_string("lore");
        let result = tracker.changed_entries(&ws, &queries, None).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.current_marker, Marker::Timestamp("2026-02-01T00:00Z".to_string()));
    }

    #[test]
    fn only_entries_after_marker_are_returned() {
        let mut ws = Workspace::new();
        ws.add_document(
            "a.thalo",
            "2026-01-01T00:00Z create lore \"First\"\n  subject: \"x\"\n\n2026-01-10T00:00Z create lore \"Second\"\n  subject: \"x\"\n".to_string(),
            FileType::Thalo,
        )
        .unwrap();
        let tracker = TimestampTracker::with_clock(|| "2026-02-01T00:00Z".to_string());
        let queries = parse_query_string("lore");
        let marker = Marker::Timestamp("2026-01-05T00:00Z".to_string());
        let result = tracker.changed_entries(&ws, &queries, Some(&marker)).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].entry.header.title.as_deref(), Some("Second"));
    }

    #[test]
    fn wrong_strategy_marker_is_rejected() {
        let ws = Workspace::new();
        let tracker = TimestampTracker::new();
        let marker = Marker::Git("abc".to_string());
        let err = tracker.changed_entries(&ws, &[], Some(&marker)).unwrap_err();
        assert!(matches!(err, CheckpointError::WrongStrategy(_)));
    }
}
