//! Shared infrastructure for the lbc compiler: source spans and line/column
//! resolution, diagnostic accumulation, string interning, and the literal
//! value lattice. Every other crate in the workspace depends on this one.

pub mod diag;
pub mod intern;
pub mod literal;
pub mod span;
pub mod token;

pub use diag::{Diagnostic, DiagnosticEngine, Severity};
pub use intern::{StringId, StringInterner};
pub use literal::LiteralValue;
pub use span::{LineIndex, SourceId, Span};
pub use token::{Arity, Assoc, Category, Token, TokenGroup, TokenKind};
