//! `thalo` command-line frontend: wires the §6.4 command surface
//! (`check`, `format`, `query`, `rules list`, `actualize`, `lsp`) onto the
//! core crates. I/O errors are caught here and turned into exit code 2;
//! everything else is the checker's/tracker's own typed error surface.

mod cli;
mod config;
mod files;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use serde_json::json;
use thalo_ast::parse as parse_thalo;
use thalo_checker::Checker;
use thalo_merge::format_source_file;
use thalo_query::{execute_queries, format_query, parse_query_string, ExecuteOptions};
use thalo_rules::{Diagnostic, Severity};
use thalo_tracker::{parse_checkpoint, ChangeTracker, GitTracker, Marker, TimestampTracker};
use thalo_workspace::Workspace;

use cli::{ActualizeArgs, CheckArgs, Cli, Commands, FormatArgs, QueryArgs, RulesCommands};
use config::FileConfig;
use files::discover;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("thalo: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let code = match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Format(args) => run_format(args),
        Commands::Query(args) => run_query(args),
        Commands::Rules(args) => run_rules(args.command),
        Commands::Actualize(args) => run_actualize(args),
        Commands::Lsp => run_lsp(),
    }?;
    Ok(ExitCode::from(code))
}

/// Reads every discovered file into a fresh [`Workspace`], returning the
/// loaded workspace and any I/O error encountered along the way.
fn load_workspace(paths: &[PathBuf]) -> anyhow::Result<Workspace> {
    let mut workspace = Workspace::new();
    for file in discover(paths) {
        let source = std::fs::read_to_string(&file.path)?;
        let filename = file.path.to_string_lossy().into_owned();
        workspace.add_document(filename, source, file.file_type)?;
    }
    Ok(workspace)
}

#[derive(Serialize)]
struct JsonDiagnostic {
    file: String,
    line: u32,
    column: u32,
    #[serde(rename = "endLine")]
    end_line: u32,
    #[serde(rename = "endColumn")]
    end_column: u32,
    severity: Severity,
    code: String,
    message: String,
}

/// §6.3: external positions are 1-based; the internal [`Diagnostic`] stays
/// 0-based right up to this boundary.
fn to_json_diagnostic(d: &Diagnostic) -> JsonDiagnostic {
    JsonDiagnostic {
        file: d.file.clone(),
        line: d.location.start_position.row + 1,
        column: d.location.start_position.column + 1,
        end_line: d.location.end_position.row + 1,
        end_column: d.location.end_position.column + 1,
        severity: d.severity,
        code: d.code.clone(),
        message: d.message.clone(),
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

fn run_check(args: CheckArgs) -> anyhow::Result<u8> {
    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::discover(&std::env::current_dir()?)?.map(|(_, c)| c).unwrap_or_default(),
    };
    let checker_config = file_config.into_checker_config()?;
    let checker = Checker::new(thalo_rules::default_rules(), checker_config);

    let mut workspace = load_workspace(&args.paths)?;
    let diagnostics = checker.check_workspace(&mut workspace);

    if args.json {
        let payload: Vec<JsonDiagnostic> = diagnostics.iter().map(to_json_diagnostic).collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for d in &diagnostics {
            let json = to_json_diagnostic(d);
            println!("{}:{}:{}: {} {} {}", json.file, json.line, json.column, severity_label(d.severity), d.code, d.message);
        }
        if diagnostics.is_empty() {
            println!("No issues found.");
        }
    }

    Ok(checker.exit_code(&diagnostics) as u8)
}

fn run_format(args: FormatArgs) -> anyhow::Result<u8> {
    let files = discover(&args.paths);
    let mut unformatted = Vec::new();
    for file in &files {
        let source = std::fs::read_to_string(&file.path)?;
        let source_file = parse_thalo(&source);
        let formatted = format_source_file(&source_file);
        if formatted == source {
            continue;
        }
        if args.write {
            std::fs::write(&file.path, &formatted)?;
        } else if args.check {
            unformatted.push(file.path.display().to_string());
        } else {
            print!("{formatted}");
        }
    }
    if args.check {
        for path in &unformatted {
            println!("{path}");
        }
        return Ok(if unformatted.is_empty() { 0 } else { 1 });
    }
    Ok(0)
}

fn run_query(args: QueryArgs) -> anyhow::Result<u8> {
    let workspace = load_workspace(&args.paths)?;
    let queries = parse_query_string(&args.query);
    let after_timestamp = match &args.since {
        Some(checkpoint) => match parse_checkpoint(checkpoint) {
            Some(Marker::Timestamp(ts)) => Some(ts),
            Some(Marker::Git(_)) => {
                anyhow::bail!("query --since only accepts a `ts:` checkpoint; use `actualize` for `git:` checkpoints")
            }
            None => anyhow::bail!("unrecognized checkpoint \"{checkpoint}\""),
        },
        None => None,
    };

    let mut matches = execute_queries(&workspace, &queries, &ExecuteOptions { after_timestamp });
    if let Some(limit) = args.limit {
        matches.truncate(limit);
    }

    if args.json {
        let payload: Vec<_> = matches
            .iter()
            .map(|m| {
                json!({
                    "file": m.file,
                    "timestamp": m.formatted_timestamp,
                    "entity": m.entry.header.entity,
                    "title": m.entry.header.title,
                    "link": m.entry.header.link,
                    "tags": m.entry.header.tags,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if args.raw {
        for m in &matches {
            if let Some(model) = workspace.get_model(&m.file) {
                print!("{}\n\n", m.location.span().slice(&model.source));
            }
        }
    } else {
        for m in &matches {
            println!("{}: {} {} \"{}\"", m.file, m.formatted_timestamp, m.entry.header.entity, m.entry.header.title.as_deref().unwrap_or(""));
        }
        if matches.is_empty() {
            eprintln!("No entries matched {}", queries.iter().map(format_query).collect::<Vec<_>>().join(", "));
        }
    }

    Ok(0)
}

fn run_rules(command: RulesCommands) -> anyhow::Result<u8> {
    let RulesCommands::List { json } = command;
    let rules = thalo_rules::default_rules();
    if json {
        let payload: Vec<_> = rules
            .iter()
            .map(|r| {
                let meta = r.meta();
                json!({
                    "code": meta.code,
                    "name": meta.name,
                    "description": meta.description,
                    "category": format!("{:?}", meta.category).to_lowercase(),
                    "defaultSeverity": severity_label(meta.default_severity),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for rule in &rules {
            let meta = rule.meta();
            println!("{:<32} {:<9} {}", meta.code, severity_label(meta.default_severity), meta.description);
        }
    }
    Ok(0)
}

fn run_actualize(args: ActualizeArgs) -> anyhow::Result<u8> {
    let workspace = load_workspace(&args.paths)?;
    let cwd = std::env::current_dir()?;
    let tracker: Box<dyn ChangeTracker> = match GitTracker::discover(&cwd) {
        Ok(tracker) => Box::new(tracker),
        Err(_) => Box::new(TimestampTracker::new()),
    };
    let requested = if args.synthesis_ids.is_empty() { None } else { Some(args.synthesis_ids.as_slice()) };
    let result = thalo_actualize::actualize(&workspace, tracker.as_ref(), requested);

    if args.json {
        let payload: Vec<_> = result
            .records
            .iter()
            .map(|r| {
                json!({
                    "file": r.file,
                    "title": r.title,
                    "linkId": r.link_id,
                    "sources": r.sources,
                    "lastCheckpoint": r.last_checkpoint,
                    "prompt": r.prompt,
                    "currentCheckpoint": r.current_checkpoint,
                    "isUpToDate": r.is_up_to_date,
                    "entries": r.entries.iter().map(|e| json!({
                        "file": e.file,
                        "timestamp": e.timestamp,
                        "entity": e.entity,
                        "title": e.title,
                        "linkId": e.link_id,
                        "tags": e.tags,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "trackerType": result.tracker_type,
                "records": payload,
                "unknownSynthesisIds": result.unknown_synthesis_ids,
            }))?
        );
    } else {
        for record in &result.records {
            let status = if record.is_up_to_date { "up to date" } else { "pending" };
            println!("^{} \"{}\" [{status}]: {} new entries", record.link_id, record.title.as_deref().unwrap_or(""), record.entries.len());
        }
        for id in &result.unknown_synthesis_ids {
            eprintln!("no define-synthesis found for ^{id}");
        }
    }

    Ok(if result.unknown_synthesis_ids.is_empty() { 0 } else { 1 })
}

fn run_lsp() -> anyhow::Result<u8> {
    let mut server = thalo_lsp::Server::new();
    server.run_stdio()?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn check_exits_nonzero_on_unknown_entity() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.thalo"), "2026-01-05T18:00Z create journal \"x\"\n  a: \"v\"\n").unwrap();
        let code = run_check(CheckArgs { paths: vec![dir.path().to_path_buf()], config: None, json: true }).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn check_exits_zero_on_a_clean_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.thalo"),
            "2026-01-05T18:00Z define-entity lore \"Lore\"\n  # Sections\n    Summary\n\n2026-01-06T18:00Z create lore \"E\"\n\n  # Summary\n  ok.\n",
        )
        .unwrap();
        let code = run_check(CheckArgs { paths: vec![dir.path().to_path_buf()], config: None, json: false }).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn query_reports_no_matches_without_erroring() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.thalo"), "2026-01-05T18:00Z create lore \"E\"\n  subject: \"x\"\n").unwrap();
        let code = run_query(QueryArgs {
            query: "opinion".to_string(),
            paths: vec![dir.path().to_path_buf()],
            since: None,
            limit: None,
            json: false,
            raw: false,
        })
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn format_check_flags_a_file_needing_a_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.thalo");
        std::fs::write(&file, "2026-01-05T18:00Z create lore \"E\"\n  subject: \"x\"").unwrap();
        let code = run_format(FormatArgs { paths: vec![file], check: true, write: false }).unwrap();
        assert_eq!(code, 1);
    }
}
