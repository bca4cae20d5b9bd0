use thalo_ast::{Directive, Entry};

/// Cross-revision identity: an explicit
/// `^linkId` if declared, otherwise `(variant, timestamp, entity)`.
/// `actualize-synthesis` is special-cased to `(actualize, targetId,
/// timestamp)` since its header link names the synthesis it targets, not
/// an id it mints — two runs against the same synthesis must stay distinct
/// entries rather than collapsing onto one identity.
pub fn identity(entry: &Entry) -> Option<String> {
    let header = entry.header()?;
    if header.directive == Directive::ActualizeSynthesis {
        let target = header.link.as_deref().unwrap_or("");
        let ts = header.timestamp.ok().map(|t| t.format()).unwrap_or_default();
        return Some(format!("actualize:{target}:{ts}"));
    }
    if let Some(link) = &header.link {
        return Some(format!("^{link}"));
    }
    let ts = header.timestamp.ok().map(|t| t.format()).unwrap_or_default();
    Some(format!("{}:{ts}:{}", header.directive.as_str(), header.entity))
}

/// True for identities minted from an explicit `^linkId`, used by the
/// `duplicate-link-id` conflict rule.
pub fn is_explicit_link(entry: &Entry) -> bool {
    match entry.header() {
        Some(h) if h.directive != Directive::ActualizeSynthesis => h.link.is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn explicit_link_wins_over_timestamp_identity() {
        let tree = thalo_ast::parse("2026-01-01T00:00Z create lore \"E\" ^abc\n  k: \"v\"\n");
        assert_eq!(identity(&tree.entries[0]).as_deref(), Some("^abc"));
        assert!(is_explicit_link(&tree.entries[0]));
    }

    #[test]
    fn actualize_identity_keys_on_target_and_own_timestamp() {
        let tree = thalo_ast::parse("2026-01-10T00:00Z actualize-synthesis ^d1 \"run\"\n  checkpoint: \"ts:2026-01-01T00:00Z\"\n");
        let id = identity(&tree.entries[0]).unwrap();
        assert!(id.starts_with("actualize:d1:2026-01-10"));
        assert!(!is_explicit_link(&tree.entries[0]));
    }

    #[test]
    fn entity_only_identity_uses_directive_timestamp_entity() {
        let tree = thalo_ast::parse("2026-01-01T00:00Z create lore \"E\"\n  k: \"v\"\n");
        let id = identity(&tree.entries[0]).unwrap();
        assert_eq!(id, "create:2026-01-01T00:00:lore");
    }
}
