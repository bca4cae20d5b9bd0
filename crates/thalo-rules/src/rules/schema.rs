use crate::diagnostic::{Category, Diagnostic, Severity};
use crate::rule::{Rule, RuleContext, RuleMeta};
use thalo_ast::{SchemaDirective, SchemaEntry};

/// `define-entity-requires-section`: a `define-entity` declares zero
/// sections.
pub struct DefineEntityRequiresSection;

impl Rule for DefineEntityRequiresSection {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "define-entity-requires-section",
            name: "Define-entity requires a section",
            description: "A define-entity entry declares zero sections",
            category: Category::Schema,
            default_severity: Severity::Error,
        }
    }

    fn check_schema(&self, ctx: &RuleContext<'_>, entry: &SchemaEntry) -> Vec<Diagnostic> {
        if entry.directive != SchemaDirective::Define || !entry.sections.is_empty() {
            return Vec::new();
        }
        vec![Diagnostic::new(
            ctx.filename,
            entry.header.location,
            Severity::Error,
            "define-entity-requires-section",
            format!("define-entity \"{}\" declares zero sections", entry.header.entity),
        )]
    }
}

/// `invalid-default-value`: a field's declared default fails `matches`
/// against its own type.
pub struct InvalidDefaultValue;

impl Rule for InvalidDefaultValue {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "invalid-default-value",
            name: "Invalid default value",
            description: "A field's declared default does not satisfy its own type",
            category: Category::Schema,
            default_severity: Severity::Error,
        }
    }

    fn check_schema(&self, ctx: &RuleContext<'_>, entry: &SchemaEntry) -> Vec<Diagnostic> {
        entry
            .fields
            .iter()
            .filter_map(|field| {
                let default = field.default.as_ref()?;
                if field.type_expr.matches_default(default) {
                    return None;
                }
                Some(Diagnostic::new(
                    ctx.filename,
                    field.location,
                    Severity::Error,
                    "invalid-default-value",
                    format!("default value for field \"{}\" does not satisfy its declared type", field.name),
                ))
            })
            .collect()
    }
}

/// `duplicate-entity`: a second `define-entity` for a name already defined
///. This is a workspace-level
/// fact computed once by the schema registry, so it surfaces in
/// `after_check` rather than per-entry.
pub struct DuplicateEntity;

impl Rule for DuplicateEntity {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "duplicate-entity",
            name: "Duplicate entity definition",
            description: "A second define-entity entry redefines an already-defined entity name",
            category: Category::Schema,
            default_severity: Severity::Warning,
        }
    }

    fn after_check(&self, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        ctx.workspace
            .cached_schema_registry()
            .duplicate_entity_definitions()
            .iter()
            .map(|dup| {
                Diagnostic::new(
                    dup.second_file.clone(),
                    dup.second_location,
                    Severity::Warning,
                    "duplicate-entity",
                    format!("entity \"{}\" is already defined in {}", dup.entity, dup.first_file),
                )
            })
            .collect()
    }
}
