use std::fmt;

/// An opaque point in the workspace's history:
/// either a minute-precision ISO timestamp or a git commit hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Timestamp(String),
    Git(String),
}

impl Marker {
    pub fn tracker_type(&self) -> &'static str {
        match self {
            Marker::Timestamp(_) => "ts",
            Marker::Git(_) => "git",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Timestamp(ts) => write!(f, "ts:{ts}"),
            Marker::Git(sha) => write!(f, "git:{sha}"),
        }
    }
}

/// `parseCheckpoint`: unknown prefixes are treated as absent, not an error.
pub fn parse_checkpoint(text: &str) -> Option<Marker> {
    if let Some(rest) = text.strip_prefix("ts:") {
        Some(Marker::Timestamp(rest.to_string()))
    } else if let Some(rest) = text.strip_prefix("git:") {
        Some(Marker::Git(rest.to_string()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_prefixes() {
        assert_eq!(parse_checkpoint("ts:2026-01-01T00:00Z"), Some(Marker::Timestamp("2026-01-01T00:00Z".to_string())));
        assert_eq!(parse_checkpoint("git:abc123"), Some(Marker::Git("abc123".to_string())));
    }

    #[test]
    fn unknown_prefix_is_absent() {
        assert_eq!(parse_checkpoint("rev:1"), None);
    }

    #[test]
    fn round_trips_through_display() {
        let marker = Marker::Git("deadbeef".to_string());
        assert_eq!(parse_checkpoint(&marker.to_string()), Some(marker));
    }
}
