//! `lbc`: lex → parse → sema → (ast-dump | code-dump).
//!
//! Object/executable emission, LLVM IR, and the external
//! assembler/linker/optimizer toolchain are out of scope for this core;
//! flags that request them are accepted (so the CLI surface is complete)
//! but rejected at runtime with a diagnostic rather than silently doing
//! nothing.

mod options;

use std::path::Path;
use std::process::ExitCode;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use clap::Parser as _;

use lbc_common::{DiagnosticEngine, Severity, StringInterner};
use options::CompileOptions;

fn main() -> ExitCode {
    let opts = CompileOptions::parse();

    if opts.is_dump_mode() && opts.inputs.len() != 1 {
        eprintln!("lbc: error: -ast-dump/-code-dump require exactly one input file");
        return ExitCode::FAILURE;
    }
    if opts.requests_backend_emission() {
        eprintln!(
            "lbc: error: object/assembly/LLVM emission is not supported in this build \
             (front-end core only; no backend is wired up)"
        );
        return ExitCode::FAILURE;
    }

    let mut had_errors = false;
    for input in &opts.inputs {
        if opts.verbose {
            eprintln!("lbc: compiling {}", input.display());
        }
        match compile_one(input, &opts) {
            Ok(()) => {}
            Err(()) => had_errors = true,
        }
    }

    if had_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Run one source file through the full pipeline. Returns `Err(())` once
/// any stage has recorded an error; the caller has already seen the
/// rendered diagnostics by the time this returns.
fn compile_one(path: &Path, opts: &CompileOptions) -> Result<(), ()> {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("lbc: error: could not read '{}': {}", path.display(), e);
            return Err(());
        }
    };

    let mut interner = StringInterner::new();
    let mut diagnostics = DiagnosticEngine::new();

    let (mut ast, module_result) = lbc_parser::parse(&source, &mut interner, &mut diagnostics);

    let module = match module_result {
        Ok(m) => m,
        Err(_) => {
            report(&diagnostics, path, &source);
            return Err(());
        }
    };

    if opts.code_dump {
        let formatted = lbc_fmt::format_module(&ast, &module, &interner, &lbc_fmt::FormatConfig::default());
        print!("{formatted}");
        if diagnostics.has_errors() {
            report(&diagnostics, path, &source);
            return Err(());
        }
        return Ok(());
    }

    if opts.ast_dump {
        let json = lbc_fmt::dump_module(&ast, &module, &interner, &source);
        println!("{}", serde_json::to_string_pretty(&json).expect("AST JSON is always serializable"));
        if diagnostics.has_errors() {
            report(&diagnostics, path, &source);
            return Err(());
        }
        return Ok(());
    }

    let analyzer = lbc_sema::analyze(&mut ast, &module, &mut interner, &mut diagnostics);
    drop(analyzer);

    if diagnostics.has_errors() {
        report(&diagnostics, path, &source);
        return Err(());
    }

    if opts.verbose {
        eprintln!("lbc: {} OK", path.display());
    }
    Ok(())
}

/// Render every accumulated diagnostic with `ariadne` to stderr.
fn report(diagnostics: &DiagnosticEngine, path: &Path, source: &str) {
    let file = path.display().to_string();
    for d in diagnostics.diagnostics() {
        let kind = match d.severity {
            Severity::Warning => ReportKind::Warning,
            Severity::Error | Severity::Fatal => ReportKind::Error,
        };
        let start = (d.span.start as usize).min(source.len());
        let end = (d.span.end as usize).max(start).min(source.len());
        let _ = Report::build(kind, (file.as_str(), start..end))
            .with_config(Config::default())
            .with_message(&d.message)
            .with_label(Label::new((file.as_str(), start..end)).with_message(&d.message).with_color(Color::Red))
            .finish()
            .eprint((file.as_str(), Source::from(source)));
    }
}
