//! End-to-end scenarios driving `Vm::interpret` through a captured stdout
//! sink, the way `hinton-lang-Hinton`'s `tests/` integration suite drives
//! its own `VirtualMachine`.

use vellum::{InterpretResult, Vm};

fn run(source: &str) -> (InterpretResult, String) {
    let mut out = Vec::new();
    let result = {
        let mut vm = Vm::new(&mut out);
        vm.interpret(source)
    };
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn arithmetic_precedence() {
    let (result, stdout) = run("print 1 + 2 * 3;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(stdout, "7\n");
}

#[test]
fn string_concatenation() {
    let (result, stdout) = run("var a = \"hi\"; var b = \" there\"; print a + b;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(stdout, "hi there\n");
}

#[test]
fn for_loop_accumulation() {
    let (result, stdout) =
        run("var n = 0; for (var i = 1; i <= 5; i = i + 1) { n = n + i; } print n;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(stdout, "15\n");
}

#[test]
fn recursive_fibonacci() {
    let (result, stdout) = run(
        "fun fib(n) { if (n < 2) return n; return fib(n-1) + fib(n-2); } print fib(10);",
    );
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(stdout, "55\n");
}

#[test]
fn zero_is_truthy() {
    let (result, stdout) = run("if (nil or 0) print \"t\"; else print \"f\";");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(stdout, "t\n");
}

#[test]
fn undefined_global_is_a_runtime_error() {
    let (result, stdout) = run("print undefined_name;");
    assert_eq!(result, InterpretResult::RuntimeError);
    assert_eq!(stdout, "");
}

#[test]
fn two_hundred_fifty_seven_constants_is_a_compile_error() {
    let mut source = String::new();
    for i in 0..257 {
        source.push_str(&format!("var v{i} = {i};\n"));
    }
    let (result, _) = run(&source);
    assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn two_hundred_fifty_seven_locals_is_a_compile_error() {
    let mut source = String::from("{\n");
    for i in 0..257 {
        source.push_str(&format!("var v{i} = {i};\n"));
    }
    source.push('}');
    let (result, _) = run(&source);
    assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn sixty_five_nested_calls_overflow_the_frame_stack() {
    let (result, _) = run("fun rec(n) { return rec(n + 1); } print rec(0);");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn panic_mode_suppresses_cascading_compile_errors() {
    let (result, _) = run(")) + ((;");
    assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn a_plain_literal_echoes_its_canonical_form() {
    let (result, stdout) = run("print nil; print true; print false; print 3.5;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(stdout, "nil\ntrue\nfalse\n3.5\n");
}
