//! Rule visitor framework: diagnostics, the `Rule` trait, a prebuilt
//! `WorkspaceIndex`, the three `run_visitors*` entry points, and the
//! concrete rules library.

mod diagnostic;
mod index;
mod rule;
mod run;
pub mod rules;

pub use diagnostic::{Category, Diagnostic, Severity};
pub use index::WorkspaceIndex;
pub use rule::{Rule, RuleContext, RuleMeta};
pub use run::{run_visitors, run_visitors_on_entries, run_visitors_on_model};
pub use rules::default_rules;
