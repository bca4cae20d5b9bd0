mod content;
mod instance;
mod link;
mod metadata;
mod schema;

pub use content::{MissingRequiredSection, ParseError, UnknownSection};
pub use instance::{MissingTitle, UnknownEntity};
pub use link::{ActualizeTargetUnresolved, DuplicateLinkId, SynthesisTargetUnknownEntity, UnresolvedLink};
pub use metadata::{ArrayElementTypeMismatch, InvalidFieldType, MissingRequiredField, QuotedValueRequired, UnknownField};
pub use schema::{DefineEntityRequiresSection, DuplicateEntity, InvalidDefaultValue};

use crate::rule::Rule;

/// Every rule the crate ships, in the order `rules list` displays them.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(UnknownEntity),
        Box::new(MissingRequiredField),
        Box::new(UnknownField),
        Box::new(InvalidFieldType),
        Box::new(MissingRequiredSection),
        Box::new(UnknownSection),
        Box::new(UnresolvedLink),
        Box::new(DuplicateLinkId),
        Box::new(DefineEntityRequiresSection),
        Box::new(MissingTitle),
        Box::new(QuotedValueRequired),
        Box::new(ArrayElementTypeMismatch),
        Box::new(InvalidDefaultValue),
        Box::new(SynthesisTargetUnknownEntity),
        Box::new(ActualizeTargetUnresolved),
        Box::new(DuplicateEntity),
        Box::new(ParseError),
    ]
}
