use crate::diagnostic::{Category, Diagnostic, Severity};
use crate::rule::{Rule, RuleContext, RuleMeta};
use thalo_ast::{Entry, InstanceEntry};

/// `missing-required-section`: schema declares a non-optional section not
/// present in the entry's content as a markdown header.
pub struct MissingRequiredSection;

impl Rule for MissingRequiredSection {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "missing-required-section",
            name: "Missing required section",
            description: "Schema declares a non-optional section not present as a markdown header",
            category: Category::Content,
            default_severity: Severity::Error,
        }
    }

    fn check_instance(&self, ctx: &RuleContext<'_>, entry: &InstanceEntry) -> Vec<Diagnostic> {
        let Some(schema) = ctx.workspace.cached_schema_registry().get(&entry.header.entity) else {
            return Vec::new();
        };
        let present = entry.content.as_ref().map(|c| c.section_names()).unwrap_or_default();
        schema
            .sections
            .values()
            .filter(|section| !section.optional && !present.contains(&section.name.as_str()))
            .map(|section| {
                Diagnostic::new(
                    ctx.filename,
                    entry.header.location,
                    Severity::Error,
                    "missing-required-section",
                    format!("missing required section \"{}\"", section.name),
                )
            })
            .collect()
    }
}

/// `unknown-section`: content contains a markdown header not in the
/// schema.
pub struct UnknownSection;

impl Rule for UnknownSection {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "unknown-section",
            name: "Unknown section",
            description: "Content contains a markdown header absent from the schema",
            category: Category::Content,
            default_severity: Severity::Warning,
        }
    }

    fn check_instance(&self, ctx: &RuleContext<'_>, entry: &InstanceEntry) -> Vec<Diagnostic> {
        let Some(schema) = ctx.workspace.cached_schema_registry().get(&entry.header.entity) else {
            return Vec::new();
        };
        let Some(content) = &entry.content else { return Vec::new() };
        content
            .children
            .iter()
            .filter_map(|child| match child {
                thalo_ast::ContentChild::MdHeader { text, location } if !schema.sections.contains_key(text) => {
                    Some(Diagnostic::new(ctx.filename, *location, Severity::Warning, "unknown-section", format!("unknown section \"{text}\"")))
                }
                _ => None,
            })
            .collect()
    }
}

/// `parse-error`: surfaces any syntax-error node reachable from an entry —
/// a top-level malformed entry, or a header whose timestamp failed to
/// parse. Runs once per
/// check rather than per entry variant, since `Entry::Error` is not
/// dispatched to `check_*` methods.
pub struct ParseError;

impl Rule for ParseError {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "parse-error",
            name: "Parse error",
            description: "A region of the source could not be fit to any typed node",
            category: Category::Content,
            default_severity: Severity::Error,
        }
    }

    fn after_check(&self, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut filenames: Vec<&str> = ctx.workspace.files().collect();
        filenames.sort();
        filenames
            .into_iter()
            .flat_map(|filename| {
                let model = ctx.workspace.get_model(filename);
                model.into_iter().flat_map(move |model| model.source_file.entries.iter().flat_map(move |entry| entry_errors(filename, entry)))
            })
            .collect()
    }
}

fn entry_errors(filename: &str, entry: &Entry) -> Vec<Diagnostic> {
    match entry {
        Entry::Error(err) => vec![Diagnostic::new(filename, err.location, Severity::Error, "parse-error", format!("could not parse: {}", err.raw.trim()))],
        Entry::Instance(e) => header_timestamp_error(filename, &e.header),
        Entry::Synthesis(e) => header_timestamp_error(filename, &e.header),
        Entry::Actualize(e) => header_timestamp_error(filename, &e.header),
        Entry::Schema(e) => header_timestamp_error(filename, &e.header),
    }
}

fn header_timestamp_error(filename: &str, header: &thalo_ast::Header) -> Vec<Diagnostic> {
    match &header.timestamp {
        thalo_ast::Parsed::Error(err) => {
            vec![Diagnostic::new(filename, err.location, Severity::Error, "parse-error", "header timestamp could not be parsed")]
        }
        thalo_ast::Parsed::Ok(_) => Vec::new(),
    }
}
