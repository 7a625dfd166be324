//! Binary front end: argument parsing, the REPL loop, and file-mode
//! execution. Shape grounded on `hinton-lang-Hinton/src/main.rs`'s
//! `run_file` + exit-code match, with the single-positional-argument
//! `clap::Parser` struct grounded on `cartman-fr-vitte/crates/vitte-cli`'s
//! derive style.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use vellum::{InterpretResult, Vm};

#[derive(Parser, Debug)]
#[command(name = "vellum", version, about = "A bytecode compiler and VM")]
struct Cli {
    /// Script to run. Omit to start the REPL.
    path: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            println!("{err}");
            return ExitCode::from(2);
        }
    };

    match cli.path {
        Some(path) => run_file(&path),
        None => run_repl(),
    }
}

fn run_file(path: &PathBuf) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read file '{}': {}", path.display(), err);
            return ExitCode::from(74);
        }
    };

    let mut stdout = io::stdout();
    let mut vm = Vm::new(&mut stdout);
    match vm.interpret(&source) {
        InterpretResult::Ok => ExitCode::from(0),
        InterpretResult::CompileError => ExitCode::from(65),
        InterpretResult::RuntimeError => ExitCode::from(70),
    }
}

fn run_repl() -> ExitCode {
    let mut stdout = io::stdout();
    let mut vm = Vm::new(&mut stdout);
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Could not start line editor: {err}");
            return ExitCode::from(74);
        }
    };

    loop {
        match editor.readline("clox> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                vm.interpret(&line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Readline error: {err}");
                break;
            }
        }
    }

    ExitCode::from(0)
}
