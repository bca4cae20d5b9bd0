use serde::Serialize;
use serde_json::Value;
use thalo_position::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Instance,
    Link,
    Schema,
    Metadata,
    Content,
}

/// One diagnostic, in file-absolute coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub location: Location,
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Diagnostic {
    pub fn new(file: impl Into<String>, location: Location, severity: Severity, code: &str, message: impl Into<String>) -> Self {
        Self { file: file.into(), location, severity, code: code.to_string(), message: message.into(), data: None }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
