use crate::value::ValueContent;
use serde::{Deserialize, Serialize};
use thalo_position::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveType {
    String,
    Datetime,
    DateRange,
    Link,
}

impl PrimitiveType {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "string" => Some(Self::String),
            "datetime" => Some(Self::Datetime),
            "date-range" => Some(Self::DateRange),
            "link" => Some(Self::Link),
            _ => None,
        }
    }
}

/// A field/default-value type expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpression {
    Primitive(PrimitiveType),
    Literal(String),
    Union(Vec<TypeExpression>),
    Array(Box<TypeExpression>),
}

impl TypeExpression {
    /// Structural `matches(value, type)`.
    /// `is_element` disables the array's "wrap a single value" behavior
    /// while inside the recursive element check it itself triggers — the
    /// flag distinguishes "checking a value against Array(E)" (which may
    /// accept a bare single value) from "checking an element against E".
    pub fn matches(&self, value: &ValueContent) -> bool {
        match self {
            TypeExpression::Primitive(PrimitiveType::String) => true,
            TypeExpression::Primitive(PrimitiveType::Link) => matches!(value, ValueContent::Link(_)),
            TypeExpression::Primitive(PrimitiveType::Datetime) => matches!(value, ValueContent::Datetime(_)),
            TypeExpression::Primitive(PrimitiveType::DateRange) => matches!(value, ValueContent::DateRange(_, _)),
            TypeExpression::Literal(expected) => {
                matches!(value, ValueContent::QuotedString(s) if s == expected)
            }
            TypeExpression::Union(members) => members.iter().any(|m| m.matches(value)),
            TypeExpression::Array(element) => match value {
                ValueContent::Array(items) => !items.is_empty() && items.iter().all(|item| element.matches_element(item)),
                other => element.matches_element(other),
            },
        }
    }

    /// Matches a single array element: like `matches`, except a bare
    /// `string` element must actually be a quoted string.
    fn matches_element(&self, value: &ValueContent) -> bool {
        match self {
            TypeExpression::Primitive(PrimitiveType::String) => matches!(value, ValueContent::QuotedString(_)),
            _ => self.matches(value),
        }
    }

    /// Default-value matching: identical to `matches` except arrays and
    /// date-ranges can never be default values (grammar restriction).
    pub fn matches_default(&self, value: &ValueContent) -> bool {
        if matches!(value, ValueContent::Array(_) | ValueContent::DateRange(_, _)) {
            return false;
        }
        self.matches(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub optional: bool,
    pub type_expr: TypeExpression,
    pub default: Option<ValueContent>,
    pub description: Option<String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub name: String,
    pub optional: bool,
    pub description: Option<String>,
    pub location: Location,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SimpleDate;

    #[test]
    fn primitive_string_accepts_anything() {
        let t = TypeExpression::Primitive(PrimitiveType::String);
        assert!(t.matches(&ValueContent::QuotedString("x".into())));
        assert!(t.matches(&ValueContent::Link("id".into())));
    }

    #[test]
    fn literal_matches_exact_quoted_text() {
        let t = TypeExpression::Literal("fact".into());
        assert!(t.matches(&ValueContent::QuotedString("fact".into())));
        assert!(!t.matches(&ValueContent::QuotedString("insight".into())));
    }

    #[test]
    fn array_accepts_single_value_as_one_element_array() {
        let t = TypeExpression::Array(Box::new(TypeExpression::Literal("fact".into())));
        assert!(t.matches(&ValueContent::QuotedString("fact".into())));
    }

    #[test]
    fn array_string_elements_must_be_quoted() {
        let t = TypeExpression::Array(Box::new(TypeExpression::Primitive(PrimitiveType::String)));
        assert!(t.matches(&ValueContent::Array(vec![ValueContent::QuotedString("a".into())])));
        assert!(!t.matches(&ValueContent::Array(vec![ValueContent::Link("a".into())])));
    }

    #[test]
    fn default_rejects_arrays_and_date_ranges() {
        let t = TypeExpression::Primitive(PrimitiveType::DateRange);
        let range = ValueContent::DateRange(SimpleDate { year: 2026, month: 1, day: 1 }, SimpleDate {
            year: 2026,
            month: 1,
            day: 2,
        });
        assert!(t.matches(&range));
        assert!(!t.matches_default(&range));
    }
}
