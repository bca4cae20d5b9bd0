use crate::diagnostic::Diagnostic;
use crate::index::WorkspaceIndex;
use crate::rule::{Rule, RuleContext};
use thalo_ast::Entry;
use thalo_semantic::SemanticModel;
use thalo_workspace::Workspace;

/// Runs every rule over every document in the workspace: `before_check`
/// once, every entry in every document, then `after_check` once. The
/// workspace-level entry point.
pub fn run_visitors(rules: &[Box<dyn Rule>], workspace: &Workspace, index: &WorkspaceIndex, report: &mut dyn FnMut(Diagnostic)) {
    let hook_ctx = RuleContext { filename: "", workspace, index };
    for rule in rules {
        rule.before_check(&hook_ctx).into_iter().for_each(|d| report(d));
    }

    let mut files: Vec<&str> = workspace.files().collect();
    files.sort();
    for filename in files {
        if let Some(model) = workspace.get_model(filename) {
            run_visitors_on_entries(rules, &model.source_file.entries, filename, workspace, index, report);
        }
    }

    for rule in rules {
        rule.after_check(&hook_ctx).into_iter().for_each(|d| report(d));
    }
}

/// Runs every rule over a single document's entries, with `before_check`/
/// `after_check` scoped to that one document.
pub fn run_visitors_on_model(
    rules: &[Box<dyn Rule>],
    model: &SemanticModel,
    workspace: &Workspace,
    index: &WorkspaceIndex,
    report: &mut dyn FnMut(Diagnostic),
) {
    let hook_ctx = RuleContext { filename: &model.filename, workspace, index };
    for rule in rules {
        rule.before_check(&hook_ctx).into_iter().for_each(|d| report(d));
    }
    run_visitors_on_entries(rules, &model.source_file.entries, &model.filename, workspace, index, report);
    for rule in rules {
        rule.after_check(&hook_ctx).into_iter().for_each(|d| report(d));
    }
}

/// Runs every rule over an explicit slice of entries, without calling
/// `before_check`/`after_check` — the incremental entry point, used when
/// only the changed entries from an update diff need re-checking.
pub fn run_visitors_on_entries(
    rules: &[Box<dyn Rule>],
    entries: &[Entry],
    filename: &str,
    workspace: &Workspace,
    index: &WorkspaceIndex,
    report: &mut dyn FnMut(Diagnostic),
) {
    let ctx = RuleContext { filename, workspace, index };
    for entry in entries {
        for rule in rules {
            let diagnostics = match entry {
                Entry::Instance(e) => rule.check_instance(&ctx, e),
                Entry::Schema(e) => rule.check_schema(&ctx, e),
                Entry::Synthesis(e) => rule.check_synthesis(&ctx, e),
                Entry::Actualize(e) => rule.check_actualize(&ctx, e),
                Entry::Error(_) => Vec::new(),
            };
            diagnostics.into_iter().for_each(|d| report(d));
        }
    }
}
