//! Schema registry: replays `define-entity`/`alter-entity` entries across
//! the workspace, in timestamp order, into one resolved schema per entity
//! name.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use thalo_ast::{SchemaDirective, SchemaEntry};
use thalo_position::Location;

pub use thalo_ast::FieldDefinition as FieldSchema;
pub use thalo_ast::SectionDefinition as SectionSchema;

#[derive(Debug, Clone)]
pub struct ResolvedEntitySchema {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldSchema>,
    pub sections: IndexMap<String, SectionSchema>,
    pub defined_at: String,
    pub defined_in: String,
}

/// One schema entry gathered from a document, ready to be grouped by
/// entity name and replayed by [`SchemaRegistry::rebuild`].
#[derive(Debug, Clone)]
pub struct SchemaContribution<'a> {
    pub file: String,
    /// Canonical formatted timestamp (`thalo_ast::Timestamp::format`),
    /// compared lexicographically for replay order.
    pub timestamp: String,
    pub start_index: usize,
    pub entry: &'a SchemaEntry,
}

/// `define-entity` applied twice for the same entity: the later one still
/// wins for non-removed items, but this is how the registry surfaces the
/// fact to the `duplicate-entity` rule.
#[derive(Debug, Clone)]
pub struct DuplicateEntityDefinition {
    pub entity: String,
    pub first_file: String,
    pub second_file: String,
    pub second_location: Location,
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: FxHashMap<String, ResolvedEntitySchema>,
    duplicates: Vec<DuplicateEntityDefinition>,
}

impl SchemaRegistry {
    pub fn get(&self, entity_name: &str) -> Option<&ResolvedEntitySchema> {
        self.schemas.get(entity_name)
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn duplicate_entity_definitions(&self) -> &[DuplicateEntityDefinition] {
        &self.duplicates
    }

    /// Rebuilds the whole registry from every schema entry in the
    /// workspace. Contributions need not be pre-sorted: this groups by
    /// entity name, then replays each group in `(timestamp, file,
    /// startIndex)` order.
    pub fn rebuild<'a>(contributions: impl IntoIterator<Item = SchemaContribution<'a>>) -> Self {
        let mut by_entity: FxHashMap<String, Vec<SchemaContribution<'a>>> = FxHashMap::default();
        for c in contributions {
            by_entity.entry(c.entry.header.entity.clone()).or_default().push(c);
        }

        let mut schemas = FxHashMap::default();
        let mut duplicates = Vec::new();
        for (entity, mut group) in by_entity {
            group.sort_by(|a, b| (&a.timestamp, &a.file, a.start_index).cmp(&(&b.timestamp, &b.file, b.start_index)));
            schemas.insert(entity.clone(), replay(&entity, &group, &mut duplicates));
        }
        Self { schemas, duplicates }
    }
}

fn replay(entity: &str, group: &[SchemaContribution<'_>], duplicates: &mut Vec<DuplicateEntityDefinition>) -> ResolvedEntitySchema {
    let mut schema = ResolvedEntitySchema {
        name: entity.to_string(),
        description: None,
        fields: IndexMap::new(),
        sections: IndexMap::new(),
        defined_at: String::new(),
        defined_in: String::new(),
    };
    let mut first_define: Option<&SchemaContribution<'_>> = None;

    for c in group {
        match c.entry.directive {
            SchemaDirective::Define => {
                match first_define {
                    Some(first) => duplicates.push(DuplicateEntityDefinition {
                        entity: entity.to_string(),
                        first_file: first.file.to_string(),
                        second_file: c.file.to_string(),
                        second_location: c.entry.location,
                    }),
                    None => first_define = Some(c),
                }
                schema.description = c.entry.description.clone();
                for field in &c.entry.fields {
                    schema.fields.insert(field.name.clone(), field.clone());
                }
                for section in &c.entry.sections {
                    schema.sections.insert(section.name.clone(), section.clone());
                }
            }
            SchemaDirective::Alter => {
                for field in &c.entry.fields {
                    schema.fields.insert(field.name.clone(), field.clone());
                }
                for section in &c.entry.sections {
                    schema.sections.insert(section.name.clone(), section.clone());
                }
                for name in &c.entry.remove_metadata {
                    schema.fields.shift_remove(name);
                }
                for name in &c.entry.remove_sections {
                    schema.sections.shift_remove(name);
                }
            }
        }
        schema.defined_at = c.timestamp.to_string();
        schema.defined_in = c.file.to_string();
    }

    schema
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use thalo_ast::{Directive, Header, Parsed, SyntaxError};
    use thalo_position::{Location, Position};

    fn loc() -> Location {
        Location::new(0, 0, Position::new(0, 0), Position::new(0, 0))
    }

    fn header(entity: &str, directive: Directive) -> Header {
        Header {
            timestamp: Parsed::Error(SyntaxError { raw: String::new(), location: loc() }),
            directive,
            entity: entity.to_string(),
            title: None,
            link: None,
            tags: Vec::new(),
            location: loc(),
        }
    }

    #[test]
    fn alter_entity_inserts_and_removes_fields() {
        let define = SchemaEntry {
            header: header("lore", Directive::DefineEntity),
            directive: SchemaDirective::Define,
            description: Some("Lore".to_string()),
            fields: vec![FieldSchema {
                name: "subject".to_string(),
                optional: false,
                type_expr: thalo_ast::TypeExpression::Primitive(thalo_ast::PrimitiveType::String),
                default: None,
                description: None,
                location: loc(),
            }],
            sections: vec![SectionSchema { name: "Summary".to_string(), optional: false, description: None, location: loc() }],
            remove_metadata: Vec::new(),
            remove_sections: Vec::new(),
            location: loc(),
        };
        let alter = SchemaEntry {
            header: header("lore", Directive::AlterEntity),
            directive: SchemaDirective::Alter,
            description: None,
            fields: Vec::new(),
            sections: Vec::new(),
            remove_metadata: vec!["subject".to_string()],
            remove_sections: Vec::new(),
            location: loc(),
        };

        let contributions = vec![
            SchemaContribution { file: "a.thalo".to_string(), timestamp: "2026-01-01T00:00".to_string(), start_index: 0, entry: &define },
            SchemaContribution { file: "a.thalo".to_string(), timestamp: "2026-01-02T00:00".to_string(), start_index: 0, entry: &alter },
        ];
        let registry = SchemaRegistry::rebuild(contributions);
        let resolved = registry.get("lore").expect("resolved schema");
        assert!(resolved.fields.is_empty());
        assert_eq!(resolved.sections.len(), 1);
        assert_eq!(resolved.defined_at, "2026-01-02T00:00");
    }

    #[test]
    fn second_define_entity_is_flagged_as_duplicate() {
        let first = SchemaEntry {
            header: header("lore", Directive::DefineEntity),
            directive: SchemaDirective::Define,
            description: None,
            fields: Vec::new(),
            sections: vec![SectionSchema { name: "Summary".to_string(), optional: false, description: None, location: loc() }],
            remove_metadata: Vec::new(),
            remove_sections: Vec::new(),
            location: loc(),
        };
        let second = first.clone();
        let contributions = vec![
            SchemaContribution { file: "a.thalo".to_string(), timestamp: "2026-01-01T00:00".to_string(), start_index: 0, entry: &first },
            SchemaContribution { file: "b.thalo".to_string(), timestamp: "2026-01-02T00:00".to_string(), start_index: 0, entry: &second },
        ];
        let registry = SchemaRegistry::rebuild(contributions);
        assert_eq!(registry.duplicate_entity_definitions().len(), 1);
    }
}
