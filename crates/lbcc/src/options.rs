//! The driver's CLI surface. A thin config struct only — it carries every
//! flag the front-end's command line names (including the ones whose
//! backing functionality, LLVM emission, is out of scope for this core) so
//! that the CLI surface itself is complete and round-trips through `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WordWidth {
    #[value(name = "32")]
    W32,
    #[value(name = "64")]
    W64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OptLevel {
    O0,
    O1,
    O2,
    O3,
    /// `-OS`: optimize for size.
    Os,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmitKind {
    /// Emit LLVM IR as textual `.ll`.
    LlvmIr,
    /// Emit LLVM bitcode as `.bc`.
    LlvmBc,
}

/// `lbc` — the LightBASIC compiler front-end driver.
///
/// Lexes, parses, and semantically analyses one or more `.bas` inputs. By
/// default runs the full front-end pipeline and reports diagnostics;
/// `-ast-dump`/`-code-dump` additionally exercise the pretty-printer.
/// Object/executable emission is delegated to an external backend not
/// part of this core, and is accepted here only so the CLI surface is
/// complete.
#[derive(Debug, Parser)]
#[command(name = "lbc", version, about, long_about = None)]
pub struct CompileOptions {
    /// One or more source files to compile.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file path.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Verbose logging of pipeline stages.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Target word width.
    #[arg(long = "word-width", value_enum)]
    pub word_width: Option<WordWidth>,

    /// Optimization level.
    #[arg(short = 'O', long = "opt", value_enum, default_value_t = OptLevel::O0)]
    pub opt_level: OptLevel,

    /// Emit assembly (`.s`).
    #[arg(short = 'S')]
    pub emit_asm: bool,

    /// Emit an object file (`.o`).
    #[arg(short = 'c')]
    pub emit_obj: bool,

    /// Emit LLVM IR instead of native code; combine with `-S` for text or
    /// `-c` for bitcode.
    #[arg(long = "emit-llvm")]
    pub emit_llvm: bool,

    /// Dump the parsed AST as JSON instead of compiling. Requires exactly
    /// one input.
    #[arg(long = "ast-dump", conflicts_with = "code_dump")]
    pub ast_dump: bool,

    /// Re-print the parsed source (round-trip formatting) instead of
    /// compiling. Requires exactly one input.
    #[arg(long = "code-dump")]
    pub code_dump: bool,

    /// Override the directory containing `bin/opt`, `bin/llc`, `bin/ld`.
    #[arg(long = "toolchain")]
    pub toolchain: Option<PathBuf>,
}

impl CompileOptions {
    /// Whether this invocation exercises the pretty-printer rather than
    /// running straight through to emission.
    pub fn is_dump_mode(&self) -> bool {
        self.ast_dump || self.code_dump
    }

    /// Whether any backend-emission flag was passed. The core front-end
    /// has no backend; these flags are accepted for CLI-surface
    /// completeness but rejected at runtime.
    pub fn requests_backend_emission(&self) -> bool {
        self.emit_asm || self.emit_obj || self.emit_llvm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_well_formed() {
        CompileOptions::command().debug_assert();
    }

    #[test]
    fn ast_dump_and_code_dump_are_mutually_exclusive() {
        let err = CompileOptions::try_parse_from(["lbc", "a.bas", "--ast-dump", "--code-dump"])
            .expect_err("should conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_multiple_inputs_and_flags() {
        let opts = CompileOptions::try_parse_from(["lbc", "-v", "-o", "out", "a.bas", "b.bas"]).unwrap();
        assert_eq!(opts.inputs.len(), 2);
        assert!(opts.verbose);
        assert_eq!(opts.output, Some(PathBuf::from("out")));
    }
}
