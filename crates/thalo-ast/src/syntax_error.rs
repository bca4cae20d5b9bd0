use serde::{Deserialize, Serialize};
use thalo_position::Location;

/// A region the projector could not fit to any typed node, per data-model
/// invariant 4: "every AST variant has an error-sibling form". Carries the
/// raw text so downstream consumers (formatter, merge driver) can still
/// round-trip it even though its semantics are unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxError {
    pub raw: String,
    pub location: Location,
}

/// Either a successfully projected node, or the raw text it failed to
/// become. Used for sub-structures (the timestamp, a field's type) whose
/// absence must not poison the rest of the enclosing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parsed<T> {
    Ok(T),
    Error(SyntaxError),
}

impl<T> Parsed<T> {
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Parsed::Error(_))
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            Parsed::Ok(value) => Some(value),
            Parsed::Error(_) => None,
        }
    }
}

/// Exposed for any node type that might be a syntax error, mirroring an
/// `isSyntaxError(node)` predicate.
pub trait MaybeSyntaxError {
    fn is_syntax_error(&self) -> bool;
}
