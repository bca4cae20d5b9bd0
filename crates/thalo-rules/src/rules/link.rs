use crate::diagnostic::{Category, Diagnostic, Severity};
use crate::rule::{Rule, RuleContext, RuleMeta};
use thalo_ast::{ActualizeEntry, Entry, SynthesisEntry, ValueContent};
use thalo_query::parse_query_string;

/// `unresolved-link`: a reference `^id` has no link definition anywhere in
/// the workspace.
pub struct UnresolvedLink;

impl Rule for UnresolvedLink {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "unresolved-link",
            name: "Unresolved link",
            description: "A reference ^id has no link definition anywhere in the workspace",
            category: Category::Link,
            default_severity: Severity::Warning,
        }
    }

    fn check_instance(&self, ctx: &RuleContext<'_>, entry: &thalo_ast::InstanceEntry) -> Vec<Diagnostic> {
        check_metadata_links(ctx, &entry.metadata)
    }

    fn check_synthesis(&self, ctx: &RuleContext<'_>, entry: &SynthesisEntry) -> Vec<Diagnostic> {
        check_metadata_links(ctx, &entry.metadata)
    }

    fn check_actualize(&self, ctx: &RuleContext<'_>, entry: &ActualizeEntry) -> Vec<Diagnostic> {
        let mut diagnostics = check_metadata_links(ctx, &entry.metadata);
        if let Some(id) = &entry.header.link {
            if ctx.workspace.cached_link_definition(id).is_none() {
                diagnostics.push(Diagnostic::new(
                    ctx.filename,
                    entry.header.location,
                    Severity::Warning,
                    "unresolved-link",
                    format!("unresolved link \"^{id}\""),
                ));
            }
        }
        diagnostics
    }
}

fn check_metadata_links(ctx: &RuleContext<'_>, metadata: &[thalo_ast::Metadata]) -> Vec<Diagnostic> {
    metadata
        .iter()
        .flat_map(|m| {
            m.content.link_ids().into_iter().filter_map(|id| {
                if ctx.workspace.cached_link_definition(id).is_some() {
                    return None;
                }
                Some(Diagnostic::new(ctx.filename, m.location, Severity::Warning, "unresolved-link", format!("unresolved link \"^{id}\"")))
            })
        })
        .collect()
}

/// `duplicate-link-id`: two entries in the workspace define the same
/// `^id`. A workspace-level fact, surfaced once per check run.
pub struct DuplicateLinkId;

impl Rule for DuplicateLinkId {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "duplicate-link-id",
            name: "Duplicate link id",
            description: "Two entries in the workspace define the same ^id",
            category: Category::Link,
            default_severity: Severity::Error,
        }
    }

    fn before_check(&self, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        ctx.index
            .duplicate_link_ids()
            .flat_map(|(id, sites)| {
                sites
                    .iter()
                    .skip(1)
                    .map(move |(file, location)| Diagnostic::new(file.clone(), *location, Severity::Error, "duplicate-link-id", format!("\"^{id}\" is already defined elsewhere in the workspace")))
            })
            .collect()
    }
}

/// `synthesis-target-unknown-entity`: a `define-synthesis`'s `sources`
/// query names an entity absent from the schema registry.
pub struct SynthesisTargetUnknownEntity;

impl Rule for SynthesisTargetUnknownEntity {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "synthesis-target-unknown-entity",
            name: "Synthesis targets unknown entity",
            description: "A define-synthesis entry's sources query names an entity absent from the schema registry",
            category: Category::Link,
            default_severity: Severity::Warning,
        }
    }

    fn check_synthesis(&self, ctx: &RuleContext<'_>, entry: &SynthesisEntry) -> Vec<Diagnostic> {
        let Some(sources) = entry.metadata.iter().find(|m| m.key == "sources") else {
            return Vec::new();
        };
        let raw = match &sources.content {
            ValueContent::Query(text) => text.as_str(),
            _ => sources.raw.as_str(),
        };
        parse_query_string(raw)
            .into_iter()
            .filter(|q| ctx.workspace.cached_schema_registry().get(&q.entity).is_none())
            .map(|q| {
                Diagnostic::new(
                    ctx.filename,
                    sources.location,
                    Severity::Warning,
                    "synthesis-target-unknown-entity",
                    format!("synthesis source references unknown entity \"{}\"", q.entity),
                )
            })
            .collect()
    }
}

/// `actualize-target-unresolved`: an `actualize-synthesis` entry's target
/// `^id` has no `define-synthesis` definition.
pub struct ActualizeTargetUnresolved;

impl Rule for ActualizeTargetUnresolved {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "actualize-target-unresolved",
            name: "Actualize target unresolved",
            description: "An actualize-synthesis entry's target ^id has no define-synthesis definition",
            category: Category::Link,
            default_severity: Severity::Warning,
        }
    }

    fn check_actualize(&self, ctx: &RuleContext<'_>, entry: &ActualizeEntry) -> Vec<Diagnostic> {
        let Some(target) = &entry.header.link else { return Vec::new() };
        let resolved = ctx.workspace.all_models().any(|model| {
            model.source_file.entries.iter().any(|e| matches!(e, Entry::Synthesis(s) if s.header.link.as_deref() == Some(target.as_str())))
        });
        if resolved {
            return Vec::new();
        }
        vec![Diagnostic::new(
            ctx.filename,
            entry.header.location,
            Severity::Warning,
            "actualize-target-unresolved",
            format!("actualize-synthesis target \"^{target}\" has no define-synthesis definition"),
        )]
    }
}
