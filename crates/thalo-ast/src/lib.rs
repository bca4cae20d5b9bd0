//! Typed abstract syntax tree for thalo documents, projected from the
//! concrete syntax tree in [`thalo_grammar`]. Every node that can fail to
//! parse has an error-sibling form (data-model invariant 4): either the
//! whole [`Entry`] is an [`Entry::Error`], or a sub-field is wrapped in
//! [`Parsed`].

mod content;
mod entry;
mod header;
mod projector;
mod syntax_error;
mod types;
mod value;

pub use content::{Content, ContentChild};
pub use entry::{
    ActualizeEntry, Entry, InstanceEntry, SchemaDirective, SchemaEntry, SourceFile, SynthesisEntry,
};
pub use header::{Directive, Header, SimpleDateParts, TimeParts, Timestamp, Timezone};
pub use projector::project;
pub use syntax_error::{MaybeSyntaxError, Parsed, SyntaxError};
pub use types::{FieldDefinition, PrimitiveType, SectionDefinition, TypeExpression};
pub use value::{Metadata, SimpleDate, ValueContent};

/// Parses and projects `source` in one step.
pub fn parse(source: &str) -> SourceFile {
    project(&thalo_grammar::parse(source))
}
