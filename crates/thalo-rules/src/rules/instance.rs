use crate::diagnostic::{Category, Diagnostic, Severity};
use crate::rule::{Rule, RuleContext, RuleMeta};
use thalo_ast::InstanceEntry;

/// `unknown-entity`: the instance's entity name has no schema at all.
pub struct UnknownEntity;

impl Rule for UnknownEntity {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "unknown-entity",
            name: "Unknown entity",
            description: "Instance entry's entity name has no schema",
            category: Category::Instance,
            default_severity: Severity::Error,
        }
    }

    fn check_instance(&self, ctx: &RuleContext<'_>, entry: &InstanceEntry) -> Vec<Diagnostic> {
        if ctx.workspace.cached_schema_registry().get(&entry.header.entity).is_some() {
            return Vec::new();
        }
        vec![Diagnostic::new(
            ctx.filename,
            entry.header.location,
            Severity::Error,
            "unknown-entity",
            format!("unknown entity \"{}\"", entry.header.entity),
        )]
    }
}

/// `missing-title`: header title is empty or absent. Applies to every
/// header-bearing entry, not only instances.
pub struct MissingTitle;

impl Rule for MissingTitle {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "missing-title",
            name: "Missing title",
            description: "Header title is empty or absent",
            category: Category::Instance,
            default_severity: Severity::Error,
        }
    }

    fn check_instance(&self, ctx: &RuleContext<'_>, entry: &InstanceEntry) -> Vec<Diagnostic> {
        missing_title(ctx, &entry.header)
    }

    fn check_synthesis(&self, ctx: &RuleContext<'_>, entry: &thalo_ast::SynthesisEntry) -> Vec<Diagnostic> {
        missing_title(ctx, &entry.header)
    }

    fn check_actualize(&self, ctx: &RuleContext<'_>, entry: &thalo_ast::ActualizeEntry) -> Vec<Diagnostic> {
        missing_title(ctx, &entry.header)
    }

    fn check_schema(&self, ctx: &RuleContext<'_>, entry: &thalo_ast::SchemaEntry) -> Vec<Diagnostic> {
        missing_title(ctx, &entry.header)
    }
}

fn missing_title(ctx: &RuleContext<'_>, header: &thalo_ast::Header) -> Vec<Diagnostic> {
    match &header.title {
        Some(title) if !title.trim().is_empty() => Vec::new(),
        _ => vec![Diagnostic::new(ctx.filename, header.location, Severity::Error, "missing-title", "header title is empty or absent")],
    }
}
