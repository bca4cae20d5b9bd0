use std::collections::HashMap;
use std::path::{Path, PathBuf};

use git2::{Diff, DiffFindOptions, DiffOptions, Repository};
use thalo_ast::Entry;
use thalo_query::{execute_queries, ExecuteOptions, Query, QueryMatch};
use thalo_workspace::Workspace;

use crate::{ChangeTracker, ChangedEntries, CheckpointError, Marker};

/// `type = "git"` strategy: `currentMarker = HEAD`;
/// an entry is included if its document was modified since `lastMarker`
/// and the entry at HEAD differs in identity or content from its version
/// at `lastMarker`. Renames are followed with `-M` detection.
pub struct GitTracker {
    repo: Repository,
}

impl GitTracker {
    /// Discovers the repository containing `path`. Tolerates the absence
    /// of history gracefully: callers that hit
    /// [`CheckpointError::NotAGitRepository`] should fall back to treating
    /// the run as "everything matching the query", same as a `None`
    /// `last_marker` would.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let repo = Repository::discover(path.as_ref()).map_err(|_| CheckpointError::NotAGitRepository(path.as_ref().display().to_string()))?;
        tracing::debug!(workdir = ?repo.workdir(), "discovered git repository for change tracking");
        Ok(Self { repo })
    }

    fn head_sha(&self) -> Result<String, CheckpointError> {
        let head = self.repo.head().map_err(|e| CheckpointError::Git(e.to_string()))?;
        let commit = head.peel_to_commit().map_err(|e| CheckpointError::Git(e.to_string()))?;
        Ok(commit.id().to_string())
    }

    /// Files (workspace-relative paths) changed between `from` and `to`,
    /// with rename detection enabled (`-M`), unioning a renamed file's old
    /// and new path so either is treated as touched.
    fn changed_files(&self, from_sha: &str, to_sha: &str) -> Result<Vec<PathBuf>, CheckpointError> {
        let from_commit = self
            .repo
            .revparse_single(from_sha)
            .map_err(|_| CheckpointError::CommitNotFound(from_sha.to_string()))?
            .peel_to_commit()
            .map_err(|e| CheckpointError::Git(e.to_string()))?;
        let to_commit = self
            .repo
            .revparse_single(to_sha)
            .map_err(|_| CheckpointError::CommitNotFound(to_sha.to_string()))?
            .peel_to_commit()
            .map_err(|e| CheckpointError::Git(e.to_string()))?;
        let from_tree = from_commit.tree().map_err(|e| CheckpointError::Git(e.to_string()))?;
        let to_tree = to_commit.tree().map_err(|e| CheckpointError::Git(e.to_string()))?;

        let mut diff_opts = DiffOptions::new();
        let mut diff: Diff<'_> = self
            .repo
            .diff_tree_to_tree(Some(&from_tree), Some(&to_tree), Some(&mut diff_opts))
            .map_err(|e| CheckpointError::Git(e.to_string()))?;
        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts)).map_err(|e| CheckpointError::Git(e.to_string()))?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            if let Some(old) = delta.old_file().path() {
                files.push(old.to_path_buf());
            }
            if let Some(new) = delta.new_file().path() {
                files.push(new.to_path_buf());
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Reads a file's blob content at `rev`, or `None` if it did not exist
    /// there (new file since that revision).
    fn blob_at(&self, rev: &str, path: &Path) -> Option<String> {
        let object = self.repo.revparse_single(rev).ok()?;
        let commit = object.peel_to_commit().ok()?;
        let tree = commit.tree().ok()?;
        let entry = tree.get_path(path).ok()?;
        let blob = entry.to_object(&self.repo).ok()?.peel_to_blob().ok()?;
        String::from_utf8(blob.content().to_vec()).ok()
    }
}

/// Identity used to match an entry across revisions: explicit link id, or
/// `(directive, formatted timestamp, entity)` — same shape as
/// `thalo_merge`'s identity rule, computed
/// independently here since the tracker only needs equality, not merge.
fn entry_identity(entry: &Entry) -> Option<String> {
    let header = entry.header()?;
    if let Some(link) = &header.link {
        return Some(format!("^{link}"));
    }
    let ts = header.timestamp.ok()?.format();
    Some(format!("{:?}:{ts}:{}", entry.directive(), header.entity))
}

/// True if `entry`'s identity is absent from `old_source`, or present but
/// with different raw text than `current_text` (the entry's own slice of
/// the current file, trimmed of surrounding whitespace so a reformatted
/// but semantically identical entry is still treated as unchanged).
fn entry_is_new_or_changed(entry: &Entry, current_text: &str, old_source: &str) -> bool {
    let Some(identity) = entry_identity(entry) else { return true };
    let old_tree = thalo_ast::parse(old_source);
    let mut old_by_identity: HashMap<String, &str> = HashMap::new();
    for old_entry in &old_tree.entries {
        if let Some(old_identity) = entry_identity(old_entry) {
            let span = old_entry.location().span();
            old_by_identity.insert(old_identity, span.slice(old_source));
        }
    }
    match old_by_identity.get(&identity) {
        None => true,
        Some(old_text) => old_text.trim() != current_text.trim(),
    }
}

impl ChangeTracker for GitTracker {
    fn tracker_type(&self) -> &'static str {
        "git"
    }

    fn changed_entries(&self, workspace: &Workspace, queries: &[Query], last_marker: Option<&Marker>) -> Result<ChangedEntries, CheckpointError> {
        let current_marker = Marker::Git(self.head_sha()?);

        let last_sha = match last_marker {
            None => {
                let matches = execute_queries(workspace, queries, &ExecuteOptions { after_timestamp: None });
                return Ok(ChangedEntries { entries: matches, current_marker });
            }
            Some(Marker::Git(sha)) => sha.clone(),
            Some(other) => return Err(CheckpointError::WrongStrategy(other.to_string())),
        };

        let head_sha = match &current_marker {
            Marker::Git(sha) => sha.clone(),
            Marker::Timestamp(_) => unreachable!("current_marker is always Git here"),
        };
        if last_sha == head_sha {
            return Ok(ChangedEntries { entries: Vec::new(), current_marker });
        }

        let touched_files = self.changed_files(&last_sha, &head_sha)?;
        let all_matches: Vec<QueryMatch> = execute_queries(workspace, queries, &ExecuteOptions { after_timestamp: None });

        let mut entries = Vec::new();
        for m in all_matches {
            let file_path = PathBuf::from(&m.file);
            if !touched_files.iter().any(|f| f == &file_path) {
                continue;
            }
            let current_text = workspace
                .get_model(&m.file)
                .map(|model| m.location.span().slice(&model.source).to_string())
                .unwrap_or_default();
            let old_source = self.blob_at(&last_sha, &file_path);
            let is_new_or_changed = match &old_source {
                None => true,
                Some(old) => entry_is_new_or_changed(&Entry::Instance(m.entry.clone()), &current_text, old),
            };
            if is_new_or_changed {
                entries.push(m);
            }
        }
        Ok(ChangedEntries { entries, current_marker })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn entry_identity_prefers_explicit_link() {
        let source = "2026-01-01T00:00Z create lore \"E\" ^abc\n  k: \"v\"\n";
        let tree = thalo_ast::parse(source);
        assert_eq!(entry_identity(&tree.entries[0]).as_deref(), Some("^abc"));
    }

    #[test]
    fn entry_without_link_falls_back_to_timestamp_and_entity() {
        let source = "2026-01-01T00:00Z create lore \"E\"\n  k: \"v\"\n";
        let tree = thalo_ast::parse(source);
        let identity = entry_identity(&tree.entries[0]).unwrap();
        assert!(identity.contains("2026-01-01T00:00"));
        assert!(identity.contains("lore"));
    }
}
