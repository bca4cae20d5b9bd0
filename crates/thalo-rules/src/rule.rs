use crate::diagnostic::{Category, Diagnostic, Severity};
use crate::index::WorkspaceIndex;
use thalo_ast::{ActualizeEntry, InstanceEntry, SchemaEntry, SynthesisEntry};
use thalo_workspace::Workspace;

pub struct RuleMeta {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub default_severity: Severity,
}

/// What a rule's `check_*`/hook methods see: the document they're visiting
/// (empty for the workspace-level hooks) plus the whole refreshed workspace
/// and its prebuilt index.
pub struct RuleContext<'a> {
    pub filename: &'a str,
    pub workspace: &'a Workspace,
    pub index: &'a WorkspaceIndex,
}

/// One diagnostic rule. Every entry-visitor method defaults to a no-op, so
/// a rule only has to implement the variants it cares about.
pub trait Rule: Send + Sync {
    fn meta(&self) -> RuleMeta;

    fn check_instance(&self, _ctx: &RuleContext<'_>, _entry: &InstanceEntry) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn check_schema(&self, _ctx: &RuleContext<'_>, _entry: &SchemaEntry) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn check_synthesis(&self, _ctx: &RuleContext<'_>, _entry: &SynthesisEntry) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn check_actualize(&self, _ctx: &RuleContext<'_>, _entry: &ActualizeEntry) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Runs once per whole-workspace check, before any entry is visited.
    /// Used by workspace-level rules like `duplicate-link-id`.
    fn before_check(&self, _ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Runs once per whole-workspace check, after every entry has been
    /// visited.
    fn after_check(&self, _ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        Vec::new()
    }
}
