use serde::{Deserialize, Serialize};
use thalo_position::Location;

/// A calendar date as it appears in a `datetime` metadata value
/// (`YYYY-MM-DD`, no time component — ).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl SimpleDate {
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return None;
        }
        let year = text[0..4].parse().ok()?;
        let month = text[5..7].parse().ok()?;
        let day = text[8..10].parse().ok()?;
        Some(Self { year, month, day })
    }
}

/// The parsed content of a metadata value. `raw` (kept alongside on
/// [`crate::Metadata`]) is the original text;
/// this is its typed interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueContent {
    QuotedString(String),
    Link(String),
    Datetime(SimpleDate),
    DateRange(SimpleDate, SimpleDate),
    /// A raw query expression; re-parsed on demand by
    /// `thalo-query` rather than eagerly here.
    Query(String),
    Array(Vec<ValueContent>),
}

impl ValueContent {
    pub fn as_link(&self) -> Option<&str> {
        match self {
            ValueContent::Link(id) => Some(id),
            _ => None,
        }
    }

    /// Every link id reachable from this value: itself if it's a link, or
    /// each array element that is a link.
    pub fn link_ids(&self) -> Vec<&str> {
        match self {
            ValueContent::Link(id) => vec![id],
            ValueContent::Array(items) => items.iter().filter_map(ValueContent::as_link).collect(),
            _ => Vec::new(),
        }
    }
}

/// A metadata key/value pair attached to an instance, synthesis, or
/// actualize entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub key: String,
    pub raw: String,
    pub content: ValueContent,
    pub location: Location,
}
