//! Diagnostic accumulation and rendering.
//!
//! Diagnostics are collected as they are raised and rendered later (either
//! by an explicit `flush`, or when the engine is dropped in debug builds
//! without having been flushed — mirroring the original compiler's
//! destructor-renders-if-pending behavior, made explicit here since Rust
//! has no implicit side-effecting destructors worth relying on for output).

use crate::span::{LineIndex, Span};
use ariadne::{Color, Config, Label, Report, ReportKind, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl Severity {
    fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            span,
            message: message.into(),
        }
    }

    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, span, message)
    }

    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, span, message)
    }
}

/// Accumulates diagnostics raised while processing a single source buffer
/// and renders them on demand. One engine per compilation unit.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity >= Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Render every accumulated diagnostic as `<file>:<line>:<column>:
    /// <severity>: <message>`, the plain format mandated at the core
    /// boundary. Deterministic; used for snapshot tests and any consumer
    /// that doesn't want ANSI color.
    pub fn render_plain(&self, file: &str, source: &str) -> Vec<String> {
        let index = LineIndex::new(source);
        self.diagnostics
            .iter()
            .map(|d| {
                let (line, col) = index.line_col(d.span.start);
                format!("{file}:{line}:{col}: {}: {}", d.severity.as_str(), d.message)
            })
            .collect()
    }

    /// Render every accumulated diagnostic with `ariadne`, underlining the
    /// offending range. Color is disabled so output stays deterministic.
    pub fn render_pretty(&self, file: &str, source: &str) -> Vec<String> {
        let mut out = Vec::with_capacity(self.diagnostics.len());
        for d in &self.diagnostics {
            let kind = match d.severity {
                Severity::Warning => ReportKind::Warning,
                Severity::Error | Severity::Fatal => ReportKind::Error,
            };
            let start = (d.span.start as usize).min(source.len());
            let end = (d.span.end as usize).max(start).min(source.len());
            let mut buf = Vec::new();
            Report::build(kind, (file, start..end))
                .with_config(Config::default().with_color(false))
                .with_message(&d.message)
                .with_label(
                    Label::new((file, start..end))
                        .with_message(&d.message)
                        .with_color(Color::Red),
                )
                .finish()
                .write((file, Source::from(source)), &mut buf)
                .expect("ariadne report should render to an in-memory buffer");
            out.push(String::from_utf8_lossy(&buf).into_owned());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rendering_matches_boundary_format() {
        let mut engine = DiagnosticEngine::new();
        engine.report(Diagnostic::error(Span::new(3, 3), "undefined identifier FOO"));
        let rendered = engine.render_plain("main.bas", "DIM\nFOO\n");
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0], "main.bas:2:1: error: undefined identifier FOO");
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let mut engine = DiagnosticEngine::new();
        engine.report(Diagnostic::warning(Span::at(0), "unused"));
        assert!(!engine.has_errors());
        engine.report(Diagnostic::error(Span::at(0), "broken"));
        assert!(engine.has_errors());
    }
}
