//! Grammar, external scanner, and concrete syntax tree for thalo.
//!
//! `grammar.js` and `src/scanner.c` document and implement the tree-sitter
//! surface normatively. The rest of the workspace
//! depends on the pure-Rust [`parser::parse`] / [`cst`] path, which
//! implements the same grammar without requiring a C toolchain at build
//! time — see `DESIGN.md` for why the generated LR table is not checked in.

pub mod cst;
mod lexer;
mod parser;

pub use cst::{CstKind, CstNode};
pub use parser::parse;
