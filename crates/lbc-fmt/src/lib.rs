//! AST pretty-printer and JSON dump for lbc.
//!
//! This crate implements both modes spec'd for tooling output:
//!
//! 1. [`format_module`] walks an [`lbc_parser::Ast`]/[`Module`] to a
//!    `FormatIR` document tree (via [`walker`]) and prints it respecting
//!    line width constraints (via [`printer`]) — used for round-trip tests.
//! 2. [`dump_module`] walks the same AST to a `serde_json::Value` tree (via
//!    [`json`]) — used by developer tooling.
//!
//! Both are read-only on the AST; neither mutates it.

pub mod ir;
pub mod json;
pub mod printer;
pub mod walker;

use lbc_common::{LineIndex, StringInterner};
use lbc_parser::{Ast, Module};

pub use printer::FormatConfig;

/// Re-print a parsed module as canonical lbc source.
///
/// # Example
///
/// ```
/// use lbc_common::{DiagnosticEngine, StringInterner};
/// use lbc_fmt::{format_module, FormatConfig};
///
/// let source = "DIM X AS INTEGER = 1+2";
/// let mut interner = StringInterner::new();
/// let mut diagnostics = DiagnosticEngine::new();
/// let (ast, module) = lbc_parser::parse(source, &mut interner, &mut diagnostics);
/// let module = module.expect("parse should succeed");
/// let formatted = format_module(&ast, &module, &interner, &FormatConfig::default());
/// assert_eq!(formatted, "DIM X AS INTEGER = 1 + 2\n");
/// ```
pub fn format_module(ast: &Ast, module: &Module, interner: &StringInterner, config: &FormatConfig) -> String {
    let ir = walker::Walker::new(ast, interner).module(module);
    printer::print(&ir, config)
}

/// Dump a parsed module as a structural JSON tree (`class`/`loc`/children
/// per node).
pub fn dump_module(ast: &Ast, module: &Module, interner: &StringInterner, source: &str) -> serde_json::Value {
    let lines = LineIndex::new(source);
    json::JsonDumper::new(ast, interner, &lines).module(module)
}
