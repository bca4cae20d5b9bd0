use crate::diagnostic::{Category, Diagnostic, Severity};
use crate::rule::{Rule, RuleContext, RuleMeta};
use thalo_ast::{InstanceEntry, PrimitiveType, TypeExpression, ValueContent};

/// `missing-required-field`: schema declares a non-optional field absent
/// from the instance's metadata.
pub struct MissingRequiredField;

impl Rule for MissingRequiredField {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "missing-required-field",
            name: "Missing required field",
            description: "Schema declares a non-optional field not present on the instance",
            category: Category::Metadata,
            default_severity: Severity::Error,
        }
    }

    fn check_instance(&self, ctx: &RuleContext<'_>, entry: &InstanceEntry) -> Vec<Diagnostic> {
        let Some(schema) = ctx.workspace.cached_schema_registry().get(&entry.header.entity) else {
            return Vec::new();
        };
        schema
            .fields
            .values()
            .filter(|field| !field.optional && !entry.metadata.iter().any(|m| m.key == field.name))
            .map(|field| {
                Diagnostic::new(
                    ctx.filename,
                    entry.header.location,
                    Severity::Error,
                    "missing-required-field",
                    format!("missing required field \"{}\"", field.name),
                )
            })
            .collect()
    }
}

/// `unknown-field`: instance supplies a field absent from the schema.
pub struct UnknownField;

impl Rule for UnknownField {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "unknown-field",
            name: "Unknown field",
            description: "Instance supplies a field absent from the schema",
            category: Category::Metadata,
            default_severity: Severity::Warning,
        }
    }

    fn check_instance(&self, ctx: &RuleContext<'_>, entry: &InstanceEntry) -> Vec<Diagnostic> {
        let Some(schema) = ctx.workspace.cached_schema_registry().get(&entry.header.entity) else {
            return Vec::new();
        };
        entry
            .metadata
            .iter()
            .filter(|m| !schema.fields.contains_key(&m.key))
            .map(|m| Diagnostic::new(ctx.filename, m.location, Severity::Warning, "unknown-field", format!("unknown field \"{}\"", m.key)))
            .collect()
    }
}

/// `invalid-field-type`: the parsed value content does not satisfy the
/// field's `TypeExpression`.
pub struct InvalidFieldType;

impl Rule for InvalidFieldType {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "invalid-field-type",
            name: "Invalid field type",
            description: "Value content does not satisfy the field's declared type",
            category: Category::Metadata,
            default_severity: Severity::Error,
        }
    }

    fn check_instance(&self, ctx: &RuleContext<'_>, entry: &InstanceEntry) -> Vec<Diagnostic> {
        let Some(schema) = ctx.workspace.cached_schema_registry().get(&entry.header.entity) else {
            return Vec::new();
        };
        entry
            .metadata
            .iter()
            .filter_map(|m| {
                let field = schema.fields.get(&m.key)?;
                if field.type_expr.matches(&m.content) {
                    return None;
                }
                Some(Diagnostic::new(
                    ctx.filename,
                    m.location,
                    Severity::Error,
                    "invalid-field-type",
                    format!("field \"{}\" does not match its declared type", m.key),
                ))
            })
            .collect()
    }
}

/// `quoted-value-required`: a field typed with a `Literal` or bare `string`
/// must be supplied as a quoted value, not a link/datetime/query/array.
pub struct QuotedValueRequired;

impl Rule for QuotedValueRequired {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "quoted-value-required",
            name: "Quoted value required",
            description: "A string- or literal-typed field must be supplied as a quoted value",
            category: Category::Metadata,
            default_severity: Severity::Error,
        }
    }

    fn check_instance(&self, ctx: &RuleContext<'_>, entry: &InstanceEntry) -> Vec<Diagnostic> {
        let Some(schema) = ctx.workspace.cached_schema_registry().get(&entry.header.entity) else {
            return Vec::new();
        };
        entry
            .metadata
            .iter()
            .filter_map(|m| {
                let field = schema.fields.get(&m.key)?;
                if !requires_quoted_value(&field.type_expr) {
                    return None;
                }
                if matches!(m.content, ValueContent::QuotedString(_)) {
                    return None;
                }
                Some(Diagnostic::new(
                    ctx.filename,
                    m.location,
                    Severity::Error,
                    "quoted-value-required",
                    format!("field \"{}\" must be a quoted value", m.key),
                ))
            })
            .collect()
    }
}

fn requires_quoted_value(type_expr: &TypeExpression) -> bool {
    matches!(type_expr, TypeExpression::Primitive(PrimitiveType::String) | TypeExpression::Literal(_))
}

/// `array-element-type-mismatch`: one or more elements of an array-valued
/// metadata field fail `matches` against the element type.
pub struct ArrayElementTypeMismatch;

impl Rule for ArrayElementTypeMismatch {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            code: "array-element-type-mismatch",
            name: "Array element type mismatch",
            description: "An array-valued field has an element that fails the declared element type",
            category: Category::Metadata,
            default_severity: Severity::Error,
        }
    }

    fn check_instance(&self, ctx: &RuleContext<'_>, entry: &InstanceEntry) -> Vec<Diagnostic> {
        let Some(schema) = ctx.workspace.cached_schema_registry().get(&entry.header.entity) else {
            return Vec::new();
        };
        entry
            .metadata
            .iter()
            .filter_map(|m| {
                let field = schema.fields.get(&m.key)?;
                let TypeExpression::Array(element) = &field.type_expr else { return None };
                let ValueContent::Array(items) = &m.content else { return None };
                if items.iter().all(|item| element.matches(item)) {
                    return None;
                }
                Some(Diagnostic::new(
                    ctx.filename,
                    m.location,
                    Severity::Error,
                    "array-element-type-mismatch",
                    format!("one or more elements of \"{}\" do not match its element type", m.key),
                ))
            })
            .collect()
    }
}
