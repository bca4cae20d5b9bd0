use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "thalo")]
#[command(about = "Check, format, query, and actualize thalo knowledge files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the rule checker over one or more files or directories
    Check(CheckArgs),
    /// Print or rewrite a file's canonical serialized form
    Format(FormatArgs),
    /// Run a query string against a set of files
    Query(QueryArgs),
    /// Inspect the rule library
    Rules(RulesArgs),
    /// Run the actualize command over `define-synthesis` entries
    Actualize(ActualizeArgs),
    /// Start the language server over stdio
    Lsp,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Files or directories to check (defaults to the current directory)
    pub paths: Vec<PathBuf>,

    /// Path to a thalo.toml config file (defaults to ./thalo.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit diagnostics as JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Files or directories to format (defaults to the current directory)
    pub paths: Vec<PathBuf>,

    /// Report files that are not already formatted, without writing
    #[arg(long, conflicts_with = "write")]
    pub check: bool,

    /// Rewrite files in place
    #[arg(long, conflicts_with = "check")]
    pub write: bool,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query string, e.g. `lore where tag:open and subject = "x"`
    pub query: String,

    /// Files or directories to search (defaults to the current directory)
    pub paths: Vec<PathBuf>,

    /// Only include entries after this checkpoint (`ts:...` or `git:...`)
    #[arg(long)]
    pub since: Option<String>,

    /// Cap the number of results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Emit matches as JSON
    #[arg(long, conflicts_with = "raw")]
    pub json: bool,

    /// Emit each match's raw source text, blank-line separated
    #[arg(long, conflicts_with = "json")]
    pub raw: bool,
}

#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommands,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommands {
    /// List every rule in the default rule library
    List {
        /// Emit the list as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ActualizeArgs {
    /// Files or directories to actualize over (defaults to the current directory)
    pub paths: Vec<PathBuf>,

    /// Restrict to these synthesis link ids (defaults to every `define-synthesis`)
    #[arg(long = "synthesis")]
    pub synthesis_ids: Vec<String>,

    /// Emit the result as JSON
    #[arg(long)]
    pub json: bool,
}
