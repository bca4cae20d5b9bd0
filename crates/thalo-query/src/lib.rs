//! Query language: parse `parseQueryString` text into [`Query`] values,
//! execute them against a [`Workspace`], and format them back. Shares
//! nothing with the rule framework's own link/tag bookkeeping —
//! queries run against live documents, not a prebuilt index.

use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::OnceLock;
use thalo_ast::{Entry, InstanceEntry};
use thalo_position::Location;
use thalo_workspace::Workspace;

/// One ANDed condition inside a [`Query`]'s `where` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Field(String, String),
    Tag(String),
    Link(String),
}

/// `{entity, conditions}` with conditions ANDed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub entity: String,
    pub conditions: Vec<Condition>,
}

impl Query {
    fn matches(&self, entry: &InstanceEntry) -> bool {
        if entry.header.entity != self.entity {
            return false;
        }
        self.conditions.iter().all(|c| condition_matches(c, entry))
    }
}

fn condition_matches(condition: &Condition, entry: &InstanceEntry) -> bool {
    match condition {
        Condition::Field(name, expected) => entry.metadata.iter().any(|m| &m.key == name && &m.raw == expected),
        Condition::Tag(name) => entry.header.tags.iter().any(|t| t == name),
        Condition::Link(id) => {
            entry.header.link.as_deref() == Some(id.as_str())
                || entry.metadata.iter().any(|m| m.content.link_ids().contains(&id.as_str()))
        }
    }
}

fn condition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r#"(?:(tag|link)\s*:\s*(\S+))|(?:([a-z][a-z0-9_-]*)\s*=\s*"((?:[^"\\]|\\.)*)")"#).unwrap()
    })
}

fn query_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?s)^\s*([a-z][a-z0-9_-]*)\s*(?:where\s+(.*))?$").unwrap()
    })
}

/// Parses a comma-separated query string into one [`Query`] per clause
/// (comma = OR). Each clause is `entity [where cond (and cond)*]`.
pub fn parse_query_string(text: &str) -> Vec<Query> {
    text.split(',')
        .filter_map(|clause| {
            let captures = query_regex().captures(clause.trim())?;
            let entity = captures.get(1)?.as_str().to_string();
            let conditions = captures
                .get(2)
                .map(|where_clause| parse_conditions(where_clause.as_str()))
                .unwrap_or_default();
            Some(Query { entity, conditions })
        })
        .collect()
}

fn parse_conditions(where_clause: &str) -> Vec<Condition> {
    where_clause
        .split(" and ")
        .filter_map(|term| {
            let captures = condition_regex().captures(term.trim())?;
            if let (Some(kind), Some(value)) = (captures.get(1), captures.get(2)) {
                return Some(match kind.as_str() {
                    "tag" => Condition::Tag(value.as_str().to_string()),
                    _ => Condition::Link(value.as_str().to_string()),
                });
            }
            let name = captures.get(3)?.as_str().to_string();
            let value = captures.get(4)?.as_str().replace("\\\"", "\"");
            Some(Condition::Field(name, value))
        })
        .collect()
}

/// Regenerates a query's canonical textual form, used in diagnostic
/// messages and actualize output.
pub fn format_query(query: &Query) -> String {
    if query.conditions.is_empty() {
        return query.entity.clone();
    }
    let clauses: Vec<String> = query
        .conditions
        .iter()
        .map(|c| match c {
            Condition::Field(name, value) => format!("{name} = \"{}\"", value.replace('"', "\\\"")),
            Condition::Tag(name) => format!("tag:{name}"),
            Condition::Link(id) => format!("link:{id}"),
        })
        .collect();
    format!("{} where {}", query.entity, clauses.join(" and "))
}

pub struct ExecuteOptions {
    pub after_timestamp: Option<String>,
}

/// One matched instance entry with the file it came from, ready for
/// display or for the actualize pipeline to read.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub file: String,
    pub location: Location,
    pub entry: InstanceEntry,
    pub formatted_timestamp: String,
}

/// Runs every query against every document's instance entries: matches on
/// any query (OR across queries), deduplicated by `(file, startPosition)`,
/// filtered by `afterTimestamp` when given, sorted
/// ascending by formatted timestamp.
pub fn execute_queries(workspace: &Workspace, queries: &[Query], options: &ExecuteOptions) -> Vec<QueryMatch> {
    tracing::debug!(queries = queries.len(), "executing query set");
    let mut seen: FxHashSet<(String, usize)> = FxHashSet::default();
    let mut matches = Vec::new();

    let mut files: Vec<&str> = workspace.files().collect();
    files.sort();
    for filename in files {
        let Some(model) = workspace.get_model(filename) else { continue };
        for entry in &model.source_file.entries {
            let Entry::Instance(instance) = entry else { continue };
            if !queries.iter().any(|q| q.matches(instance)) {
                continue;
            }
            let key = (filename.to_string(), instance.location.start_index);
            if !seen.insert(key) {
                continue;
            }
            let Some(timestamp) = instance.header.timestamp.ok() else { continue };
            let formatted = timestamp.format();
            if let Some(after) = &options.after_timestamp {
                if formatted.as_str() <= after.as_str() {
                    continue;
                }
            }
            matches.push(QueryMatch {
                file: filename.to_string(),
                location: instance.location,
                entry: instance.clone(),
                formatted_timestamp: formatted,
            });
        }
    }

    matches.sort_by(|a, b| a.formatted_timestamp.cmp(&b.formatted_timestamp));
    matches
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use thalo_fenced::FileType;

    #[test]
    fn parses_comma_separated_or_queries_with_where_clause() {
        let queries = parse_query_string("lore, opinion where subject = \"x\"");
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].entity, "lore");
        assert!(queries[0].conditions.is_empty());
        assert_eq!(queries[1].entity, "opinion");
        assert_eq!(queries[1].conditions, vec![Condition::Field("subject".to_string(), "x".to_string())]);
    }

    #[test]
    fn parses_tag_and_link_conditions() {
        let queries = parse_query_string("lore where tag:urgent and link:abc123");
        assert_eq!(
            queries[0].conditions,
            vec![Condition::Tag("urgent".to_string()), Condition::Link("abc123".to_string())]
        );
    }

    #[test]
    fn format_query_round_trips_field_condition() {
        let query = Query { entity: "lore".to_string(), conditions: vec![Condition::Field("subject".to_string(), "x".to_string())] };
        assert_eq!(format_query(&query), "lore where subject = \"x\"");
    }

    #[test]
    fn execute_queries_deduplicates_and_sorts_by_timestamp() {
        let mut ws = Workspace::new();
        ws.add_document(
            "a.thalo",
            "2026-01-02T00:00Z create lore \"Second\"\n  subject: \"x\"\n\n2026-01-01T00:00Z create lore \"First\"\n  subject: \"x\"\n".to_string(),
            FileType::Thalo,
        )
        .unwrap();

        let queries = parse_query_string("lore where subject = \"x\"");
        let matches = execute_queries(&ws, &queries, &ExecuteOptions { after_timestamp: None });
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].formatted_timestamp, "2026-01-01T00:00Z");
        assert_eq!(matches[1].formatted_timestamp, "2026-01-02T00:00Z");
    }
}
