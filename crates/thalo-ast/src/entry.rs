use crate::content::Content;
use crate::header::{Directive, Header};
use crate::syntax_error::SyntaxError;
use crate::types::{FieldDefinition, SectionDefinition};
use crate::value::Metadata;
use serde::{Deserialize, Serialize};
use thalo_position::Location;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceEntry {
    pub header: Header,
    pub metadata: Vec<Metadata>,
    pub content: Option<Content>,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaDirective {
    Define,
    Alter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub header: Header,
    pub directive: SchemaDirective,
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub sections: Vec<SectionDefinition>,
    pub remove_metadata: Vec<String>,
    pub remove_sections: Vec<String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisEntry {
    pub header: Header,
    pub metadata: Vec<Metadata>,
    pub content: Option<Content>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualizeEntry {
    pub header: Header,
    pub metadata: Vec<Metadata>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub entries: Vec<Entry>,
    pub location: Location,
}

/// The closed sum type of every top-level entry variant, per data-model
/// section 3.1. `Error` is the variant's own syntax-error sibling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entry {
    Instance(InstanceEntry),
    Schema(SchemaEntry),
    Synthesis(SynthesisEntry),
    Actualize(ActualizeEntry),
    Error(SyntaxError),
}

impl Entry {
    pub fn location(&self) -> Location {
        match self {
            Entry::Instance(e) => e.location,
            Entry::Schema(e) => e.location,
            Entry::Synthesis(e) => e.location,
            Entry::Actualize(e) => e.location,
            Entry::Error(e) => e.location,
        }
    }

    pub fn header(&self) -> Option<&Header> {
        match self {
            Entry::Instance(e) => Some(&e.header),
            Entry::Schema(e) => Some(&e.header),
            Entry::Synthesis(e) => Some(&e.header),
            Entry::Actualize(e) => Some(&e.header),
            Entry::Error(_) => None,
        }
    }

    pub fn directive(&self) -> Option<Directive> {
        self.header().map(|h| h.directive)
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Entry::Error(_))
    }

    /// Identity key used by the incremental updater: `(variant, startIndex, endIndex)`.
    pub fn identity_key(&self) -> (u8, usize, usize) {
        let tag = match self {
            Entry::Instance(_) => 0,
            Entry::Schema(_) => 1,
            Entry::Synthesis(_) => 2,
            Entry::Actualize(_) => 3,
            Entry::Error(_) => 4,
        };
        let loc = self.location();
        (tag, loc.start_index, loc.end_index)
    }
}
