//! Change tracker abstraction: decides which
//! instance entries are "new since checkpoint" for the actualize command.
//! Two strategies share one trait so a host without git access can
//! substitute the timestamp tracker.

mod git;
mod marker;
mod timestamp;

pub use git::GitTracker;
pub use marker::{parse_checkpoint, Marker};
pub use timestamp::TimestampTracker;

use thalo_query::{Query, QueryMatch};
use thalo_workspace::Workspace;
use thiserror::Error;

/// A change-tracker failure: "not a git repo for a
/// `git:` checkpoint, missing commit". Returned as a typed value from the
/// command layer; the workspace itself remains usable.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint \"{0}\" does not belong to this tracker's strategy")]
    WrongStrategy(String),
    #[error("not a git repository: {0}")]
    NotAGitRepository(String),
    #[error("git commit not found: {0}")]
    CommitNotFound(String),
    #[error("git error: {0}")]
    Git(String),
}

/// Result of [`ChangeTracker::changed_entries`]: the matched entries plus
/// the marker to persist as the new checkpoint.
#[derive(Debug)]
pub struct ChangedEntries {
    pub entries: Vec<QueryMatch>,
    pub current_marker: Marker,
}

/// `ChangeTracker{type, getChangedEntries}`.
pub trait ChangeTracker {
    fn tracker_type(&self) -> &'static str;

    fn changed_entries(
        &self,
        workspace: &Workspace,
        queries: &[Query],
        last_marker: Option<&Marker>,
    ) -> Result<ChangedEntries, CheckpointError>;
}
