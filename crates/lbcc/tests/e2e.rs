//! End-to-end tests for the `lbc` driver binary, spawned as a subprocess.
//! Each test writes a `.bas` source file to a temp dir and invokes the
//! built binary against it, asserting on exit status and stdout/stderr.

use std::path::PathBuf;
use std::process::{Command, Output};

fn find_lbc() -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("cannot find current exe")
        .parent()
        .expect("cannot find parent dir")
        .to_path_buf();

    if path.file_name().map_or(false, |n| n == "deps") {
        path = path.parent().unwrap().to_path_buf();
    }

    let lbc = path.join("lbcc");
    assert!(lbc.exists(), "lbcc binary not found at {}. Run `cargo build -p lbcc` first.", lbc.display());
    lbc
}

fn write_source(dir: &tempfile::TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, source).expect("failed to write source file");
    path
}

fn run_lbc(args: &[&str]) -> Output {
    Command::new(find_lbc()).args(args).output().expect("failed to invoke lbc")
}

#[test]
fn compiles_a_clean_program_with_a_zero_exit_code() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let file = write_source(&dir, "main.bas", "DIM x AS Integer = 1 + 2\n");
    let output = run_lbc(&[file.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "expected success, stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn a_semantic_error_exits_nonzero_and_reports_to_stderr() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let file = write_source(&dir, "main.bas", "x = 5\n");
    let output = run_lbc(&[file.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty(), "expected a diagnostic on stderr");
}

#[test]
fn a_parse_error_exits_nonzero() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let file = write_source(&dir, "main.bas", "DIM x AS\n");
    let output = run_lbc(&[file.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn a_missing_input_file_exits_nonzero() {
    let output = run_lbc(&["/no/such/file.bas"]);
    assert!(!output.status.success());
}

#[test]
fn code_dump_reprints_the_source() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let file = write_source(&dir, "main.bas", "DIM X AS INTEGER = 1+2\n");
    let output = run_lbc(&["--code-dump", file.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "DIM X AS INTEGER = 1 + 2\n");
}

#[test]
fn ast_dump_emits_parseable_json() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let file = write_source(&dir, "main.bas", "DIM x AS Integer = 1\n");
    let output = run_lbc(&["--ast-dump", file.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("ast-dump output should be valid JSON");
    assert!(parsed.is_object());
}

#[test]
fn ast_dump_with_multiple_inputs_is_rejected() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let a = write_source(&dir, "a.bas", "DIM x AS Integer = 1\n");
    let b = write_source(&dir, "b.bas", "DIM y AS Integer = 2\n");
    let output = run_lbc(&["--ast-dump", a.to_str().unwrap(), b.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn backend_emission_flags_are_rejected_with_a_clear_message() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let file = write_source(&dir, "main.bas", "DIM x AS Integer = 1\n");
    let output = run_lbc(&["--emit-llvm", "-S", file.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not supported"), "expected a 'not supported' diagnostic, got: {stderr}");
}

#[test]
fn verbose_flag_logs_each_compiled_file_to_stderr() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let file = write_source(&dir, "main.bas", "DIM x AS Integer = 1\n");
    let output = run_lbc(&["-v", file.to_str().unwrap()]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OK"), "expected a verbose completion line, got: {stderr}");
}
