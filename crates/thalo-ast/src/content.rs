use serde::{Deserialize, Serialize};
use thalo_position::Location;

/// A single classified line inside an entry's content block: preserves the
/// original text but classifies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentChild {
    MdHeader { text: String, location: Location },
    BulletItem { text: String, location: Location },
    PlainText { text: String, location: Location },
    Blank { location: Location },
}

impl ContentChild {
    pub fn location(&self) -> Location {
        match self {
            ContentChild::MdHeader { location, .. }
            | ContentChild::BulletItem { location, .. }
            | ContentChild::PlainText { location, .. }
            | ContentChild::Blank { location } => *location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub children: Vec<ContentChild>,
    pub location: Location,
}

impl Content {
    /// Markdown header names present in this content, in document order —
    /// what `missing-required-section`/`unknown-section` compare against.
    pub fn section_names(&self) -> Vec<&str> {
        self.children
            .iter()
            .filter_map(|child| match child {
                ContentChild::MdHeader { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The text of a named `# Header` section's body: every plain-text and
    /// bullet line up to (but not including) the next `# Header`. Used by
    /// `thalo-actualize` to read the `Prompt` section.
    pub fn section_body(&self, name: &str) -> Option<String> {
        let mut lines = Vec::new();
        let mut in_section = false;
        for child in &self.children {
            match child {
                ContentChild::MdHeader { text, .. } => {
                    if in_section {
                        break;
                    }
                    in_section = text == name;
                }
                ContentChild::PlainText { text, .. } if in_section => lines.push(text.clone()),
                ContentChild::BulletItem { text, .. } if in_section => lines.push(format!("- {text}")),
                _ => {}
            }
        }
        if lines.is_empty() && !in_section {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}
