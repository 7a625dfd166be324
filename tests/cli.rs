//! Drives the `vellum` binary's file-mode path as a subprocess, the way
//! `cartman-fr-vitte`'s `tests/bc_test.rs` and `vitte-lang/compiler/tests/smoke.rs`
//! use `tempfile::tempdir` to stage on-disk fixtures for an integration test.

use std::io::Write;
use std::process::Command;

fn run_script(source: &str) -> std::process::Output {
    let dir = tempfile::tempdir().unwrap();
    let script_path = dir.path().join("script.lox");
    let mut file = std::fs::File::create(&script_path).unwrap();
    file.write_all(source.as_bytes()).unwrap();

    Command::new(env!("CARGO_BIN_EXE_vellum"))
        .arg(&script_path)
        .output()
        .expect("failed to run vellum binary")
}

#[test]
fn file_mode_exits_zero_and_prints_on_success() {
    let output = run_script("print 1 + 2;");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "3\n");
}

#[test]
fn file_mode_exits_sixty_five_on_compile_error() {
    let output = run_script("var = 1;");
    assert_eq!(output.status.code(), Some(65));
}

#[test]
fn file_mode_exits_seventy_on_runtime_error() {
    let output = run_script("print undefined_name;");
    assert_eq!(output.status.code(), Some(70));
}

#[test]
fn file_mode_exits_seventy_four_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does_not_exist.lox");

    let output = Command::new(env!("CARGO_BIN_EXE_vellum"))
        .arg(&missing)
        .output()
        .expect("failed to run vellum binary");

    assert_eq!(output.status.code(), Some(74));
}
