//! Checker driver: builds the per-run [`WorkspaceIndex`], runs the rules
//! library over a workspace (whole or incremental), and applies severity
//! overrides before handing diagnostics back.

use rustc_hash::FxHashMap;
use thalo_ast::Entry;
use thalo_rules::{default_rules, run_visitors, run_visitors_on_entries, Diagnostic, Rule, Severity, WorkspaceIndex};
use thalo_semantic::SemanticModel;
use thalo_workspace::Workspace;

/// Per-rule severity override. `Off` suppresses the rule's diagnostics
/// entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityOverride {
    Off,
    Error,
    Warning,
    Info,
}

impl SeverityOverride {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "off" => Some(Self::Off),
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }

    fn apply(self) -> Option<Severity> {
        match self {
            SeverityOverride::Off => None,
            SeverityOverride::Error => Some(Severity::Error),
            SeverityOverride::Warning => Some(Severity::Warning),
            SeverityOverride::Info => Some(Severity::Info),
        }
    }
}

/// `[rules]` table from `thalo.toml`: rule code -> severity override.
#[derive(Debug, Clone, Default)]
pub struct CheckerConfig {
    pub rule_overrides: FxHashMap<String, SeverityOverride>,
    /// `--max-warnings N`: exit code 1 once warnings exceed this count, even
    /// with zero errors.
    pub max_warnings: Option<usize>,
}

pub struct Checker {
    rules: Vec<Box<dyn Rule>>,
    config: CheckerConfig,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new(default_rules(), CheckerConfig::default())
    }
}

impl Checker {
    pub fn new(rules: Vec<Box<dyn Rule>>, config: CheckerConfig) -> Self {
        Self { rules, config }
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Runs every rule over the whole workspace, refreshing the lazily-built caches first so rules
    /// never see stale schema/link data.
    pub fn check_workspace(&self, workspace: &mut Workspace) -> Vec<Diagnostic> {
        workspace.refresh_caches();
        let index = WorkspaceIndex::build(workspace);
        let mut diagnostics = Vec::new();
        run_visitors(&self.rules, workspace, &index, &mut |d| {
            if let Some(overridden) = self.apply_override(&d) {
                diagnostics.push(overridden);
            }
        });
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }

    /// Runs every rule over a single document, used by an LSP-style host checking one open
    /// file against the rest of the already-indexed workspace.
    pub fn check_model(&self, workspace: &mut Workspace, filename: &str) -> Vec<Diagnostic> {
        workspace.refresh_caches();
        let index = WorkspaceIndex::build(workspace);
        let Some(model) = workspace.get_model(filename) else { return Vec::new() };
        let mut diagnostics = Vec::new();
        thalo_rules::run_visitors_on_model(&self.rules, model, workspace, &index, &mut |d| {
            if let Some(overridden) = self.apply_override(&d) {
                diagnostics.push(overridden);
            }
        });
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }

    /// Runs every rule over an explicit subset of entries without the
    /// `before_check`/`after_check` hooks, for incremental re-checks driven by a
    /// [`thalo_semantic::SemanticUpdateResult`].
    pub fn check_entries(&self, workspace: &mut Workspace, filename: &str, entries: &[Entry]) -> Vec<Diagnostic> {
        workspace.refresh_caches();
        let index = WorkspaceIndex::build(workspace);
        let mut diagnostics = Vec::new();
        run_visitors_on_entries(&self.rules, entries, filename, workspace, &index, &mut |d| {
            if let Some(overridden) = self.apply_override(&d) {
                diagnostics.push(overridden);
            }
        });
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }

    fn apply_override(&self, diagnostic: &Diagnostic) -> Option<Diagnostic> {
        let severity = match self.config.rule_overrides.get(&diagnostic.code) {
            Some(over) => over.apply()?,
            None => diagnostic.severity,
        };
        let mut out = diagnostic.clone();
        out.severity = severity;
        Some(out)
    }

    /// `exitCode`: 1 if any error is present, or if
    /// warnings exceed `max_warnings`; 0 otherwise. Argument/IO errors (exit
    /// 2) are the frontend's concern, not the checker's.
    pub fn exit_code(&self, diagnostics: &[Diagnostic]) -> i32 {
        let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
        let warnings = diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();
        let warnings_exceeded = self.config.max_warnings.is_some_and(|max| warnings > max);
        if errors > 0 || warnings_exceeded {
            1
        } else {
            0
        }
    }
}

/// Deterministic ordering: file ascending, then start
/// position ascending.
fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| (a.file.as_str(), a.location.start_index).cmp(&(b.file.as_str(), b.location.start_index)));
}

/// Applies the update diff from [`SemanticModel::update`] to decide which
/// entries need re-checking, rather than always doing a whole-workspace
/// check. Returns the entries from the *current* model that fall inside
/// any changed span; callers combine this with [`Checker::check_entries`].
pub fn entries_touched_by_update<'a>(model: &'a SemanticModel, changed_entity_names: &rustc_hash::FxHashSet<String>) -> Vec<&'a Entry> {
    if changed_entity_names.is_empty() {
        return model.source_file.entries.iter().collect();
    }
    model
        .source_file
        .entries
        .iter()
        .filter(|entry| match entry {
            Entry::Instance(e) => changed_entity_names.contains(&e.header.entity),
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use thalo_fenced::FileType;

    #[test]
    fn whole_workspace_check_reports_unknown_entity() {
        let mut ws = Workspace::new();
        ws.add_document("a.thalo", "2026-01-05T18:00Z create journal \"x\"\n  a: \"v\"\n".to_string(), FileType::Thalo).unwrap();
        let checker = Checker::default();
        let diagnostics = checker.check_workspace(&mut ws);
        assert!(diagnostics.iter().any(|d| d.code == "unknown-entity"));
        assert_eq!(checker.exit_code(&diagnostics), 1);
    }

    #[test]
    fn off_override_suppresses_rule_entirely() {
        let mut ws = Workspace::new();
        ws.add_document("a.thalo", "2026-01-05T18:00Z create journal \"x\"\n  a: \"v\"\n".to_string(), FileType::Thalo).unwrap();
        let mut config = CheckerConfig::default();
        config.rule_overrides.insert("unknown-entity".to_string(), SeverityOverride::Off);
        let checker = Checker::new(default_rules(), config);
        let diagnostics = checker.check_workspace(&mut ws);
        assert!(!diagnostics.iter().any(|d| d.code == "unknown-entity"));
    }

    #[test]
    fn max_warnings_exceeded_fails_even_without_errors() {
        let mut ws = Workspace::new();
        ws.add_document(
            "a.thalo",
            "2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Sections\n    Summary\n\n2026-01-06T18:00Z create lore \"E\"\n  extra: \"v\"\n\n  # Summary\n  ok.\n".to_string(),
            FileType::Thalo,
        )
        .unwrap();
        let checker = Checker::new(default_rules(), CheckerConfig { rule_overrides: FxHashMap::default(), max_warnings: Some(0) });
        let diagnostics = checker.check_workspace(&mut ws);
        assert!(diagnostics.iter().any(|d| d.code == "unknown-field"));
        assert_eq!(checker.exit_code(&diagnostics), 1);
    }
}
