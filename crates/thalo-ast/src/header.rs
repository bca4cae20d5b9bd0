use crate::syntax_error::Parsed;
use serde::{Deserialize, Serialize};
use thalo_position::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleDateParts {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeParts {
    pub hour: u8,
    pub minute: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timezone {
    Utc,
    Offset { sign: i8, hour: u8, minute: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    pub date: SimpleDateParts,
    pub time: TimeParts,
    pub timezone: Option<Timezone>,
}

impl Timestamp {
    /// Canonical textual form used for sorting (query engine, change
    /// tracker) and in diagnostic messages.
    pub fn format(&self) -> String {
        let tz = match self.timezone {
            None => String::new(),
            Some(Timezone::Utc) => "Z".to_string(),
            Some(Timezone::Offset { sign, hour, minute }) => {
                format!("{}{:02}:{:02}", if sign < 0 { '-' } else { '+' }, hour, minute)
            }
        };
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}{}",
            self.date.year, self.date.month, self.date.day, self.time.hour, self.time.minute, tz
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    Create,
    Update,
    DefineEntity,
    AlterEntity,
    DefineSynthesis,
    ActualizeSynthesis,
}

impl Directive {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "define-entity" => Some(Self::DefineEntity),
            "alter-entity" => Some(Self::AlterEntity),
            "define-synthesis" => Some(Self::DefineSynthesis),
            "actualize-synthesis" => Some(Self::ActualizeSynthesis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::DefineEntity => "define-entity",
            Self::AlterEntity => "alter-entity",
            Self::DefineSynthesis => "define-synthesis",
            Self::ActualizeSynthesis => "actualize-synthesis",
        }
    }
}

/// The shared header shape: every entry variant has one of these, though
/// the entity slot means different things
/// (an entity *type* for instance/synthesis/actualize entries, an entity
/// *name being defined* for schema entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub timestamp: Parsed<Timestamp>,
    pub directive: Directive,
    pub entity: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub tags: Vec<String>,
    pub location: Location,
}
