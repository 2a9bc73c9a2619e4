//! Integration tests for the LanceScript interpreter
//!
//! Tests the full pipeline:
//! - Lexing and parsing source text
//! - Running programs with captured console I/O
//! - Runtime error kinds surfaced to the caller
//! - Running pre-built JSON trees

use lancescript::interp::{
    Console, ErrorKind, Interpreter, InterpreterConfig, SharedOutput, MAX_ARRAY_SIZE,
    MOCK_INPUT_MAX,
};
use lancescript::parse_source;
use lancescript::Tree;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Helper to run a program with `input` on stdin, returning the outcome and all output
fn run_with(source: &str, input: &str, config: InterpreterConfig) -> (Result<(), ErrorKind>, String) {
    let program = parse_source("test.lance", source).expect("Parse should succeed");
    run_tree(&program, input, config)
}

fn run_tree(program: &Tree, input: &str, config: InterpreterConfig) -> (Result<(), ErrorKind>, String) {
    let out = SharedOutput::new();
    let console = Console::new(
        Box::new(Cursor::new(input.as_bytes().to_vec())),
        Box::new(out.clone()),
    );
    let mut interp = Interpreter::with_console(config, console);
    let result = interp.run(program).map_err(|e| e.kind);
    (result, out.contents())
}

/// Helper to run a program that reads nothing and must succeed
fn run_program(source: &str) -> String {
    let (result, output) = run_with(source, "", InterpreterConfig::default());
    if let Err(kind) = result {
        panic!("program failed with {kind:?}; output so far: {output:?}");
    }
    output
}

/// Helper to run a program that must fail, returning the error kind and the output before it
fn run_failing(source: &str) -> (ErrorKind, String) {
    let (result, output) = run_with(source, "", InterpreterConfig::default());
    match result {
        Err(kind) => (kind, output),
        Ok(()) => panic!("program unexpectedly succeeded; output: {output:?}"),
    }
}

fn runtime_error(source: &str) -> ErrorKind {
    run_failing(source).0
}

// ============================================
// Basic programs
// ============================================

#[test]
fn test_declare_assign_and_write() {
    assert_eq!(run_program("int a; a = 3; int b; b = 4; write a + b;"), "7\n");
}

#[test]
fn test_declaration_with_initializer() {
    assert_eq!(run_program("int a = 5, b = a * 2; write b;"), "10\n");
}

#[test]
fn test_constants() {
    assert_eq!(run_program("const int N = 3; const M = N + 1; write N * M;"), "12\n");
}

#[test]
fn test_operator_precedence() {
    let output = run_program(
        "write 1 + 2 * 3; write (1 + 2) * 3; write 1 < 2 == 1; write 2 + 3 && 0 || 4;",
    );
    assert_eq!(output, "7\n9\n1\n1\n");
}

#[test]
fn test_floor_division_and_modulo() {
    assert_eq!(run_program("write -7 / 2; write -7 % 2; write 7 / -2; write 7 % -2;"), "-4\n1\n-4\n-1\n");
}

#[test]
fn test_bitwise_and_unary() {
    assert_eq!(run_program("write 6 & 3; write 6 | 3; write 6 ^ 3;"), "2\n7\n5\n");
    assert_eq!(run_program("write !0; write !5; write -(2 - 5);"), "1\n0\n3\n");
}

#[test]
fn test_arrays() {
    let output = run_program(
        "int arr[3]; int i = 0;
         while (i < 3) { arr[i] = i * i; i = i + 1; }
         write arr[0] + arr[1] + arr[2];",
    );
    assert_eq!(output, "5\n");
}

#[test]
fn test_comments_are_ignored() {
    assert_eq!(run_program("// nothing here\nwrite 1; // trailing\n"), "1\n");
}

// ============================================
// Control flow
// ============================================

#[test]
fn test_if_else() {
    let output = run_program(
        "int x = 4;
         if (x > 3) write 1; else write 2;
         if (x > 9) { write 3; } else { write 4; }
         if (x) write 5;",
    );
    assert_eq!(output, "1\n4\n5\n");
}

#[test]
fn test_while_with_false_condition_never_runs() {
    assert_eq!(run_program("int i = 0; while (i > 0) { write i; } write 9;"), "9\n");
}

#[test]
fn test_do_while_runs_body_first() {
    assert_eq!(run_program("int i = 0; do { write i; } while (i > 0);"), "0\n");
    assert_eq!(
        run_program("int i = 3; do { write i; i = i - 1; } while (i);"),
        "3\n2\n1\n"
    );
}

#[test]
fn test_for_loop() {
    let output = run_program(
        "int s = 0; int i;
         for (i = 0; i < 5; i = i + 1) { s = s + i; }
         write s; write i;",
    );
    assert_eq!(output, "10\n5\n");
}

#[test]
fn test_block_locals_die_with_block() {
    assert_eq!(run_program("{ int t = 1; } int t = 2; write t;"), "2\n");
}

#[test]
fn test_loop_body_may_redeclare() {
    let output = run_program(
        "int i = 0;
         while (i < 3) { int t = i * 10; write t; i = i + 1; }",
    );
    assert_eq!(output, "0\n10\n20\n");
}

#[test]
fn test_block_sees_outer_names() {
    assert_eq!(run_program("int a = 1; { a = a + 1; } write a;"), "2\n");
}

// ============================================
// Functions
// ============================================

#[test]
fn test_function_call_with_arguments() {
    let output = run_program(
        "int show(int a, int b) { write a - b; }
         show(10, 4);
         show(1, 2);",
    );
    assert_eq!(output, "6\n-1\n");
}

#[test]
fn test_function_without_parameters() {
    assert_eq!(run_program("int hello() { write 42; } hello(); hello();"), "42\n42\n");
}

#[test]
fn test_scalar_parameters_are_copies_and_arrays_alias() {
    let output = run_program(
        "int bump(int x, int v[]) { x = x + 1; v[0] = v[0] + 1; }
         int a = 1; int arr[1]; arr[0] = 1;
         bump(a, arr);
         write a; write arr[0];",
    );
    assert_eq!(output, "1\n2\n");
}

#[test]
fn test_recursion_through_array_out_parameter() {
    let output = run_program(
        "int fact(int n, int out[]) {
             if (n <= 1) { out[0] = 1; }
             else { fact(n - 1, out); out[0] = out[0] * n; }
         }
         int r[1];
         fact(10, r);
         write r[0];",
    );
    assert_eq!(output, "3628800\n");
}

#[test]
fn test_deep_recursion_within_limit() {
    let output = run_program(
        "int count[1];
         int down(int k, int c[]) { if (k > 0) { c[0] = c[0] + 1; down(k - 1, c); } }
         count[0] = 0;
         down(3000, count);
         write count[0];",
    );
    assert_eq!(output, "3000\n");
}

#[test]
fn test_unbounded_recursion_overflows() {
    let config = InterpreterConfig {
        max_recursion_depth: 100,
        ..InterpreterConfig::default()
    };
    let (result, _) = run_with("int f() { f(); } f();", "", config);
    assert_eq!(result, Err(ErrorKind::StackOverflow));
}

#[test]
fn test_callee_sees_caller_locals() {
    let output = run_program(
        "int show() { write secret; }
         int outer() { int secret = 7; show(); }
         outer();",
    );
    assert_eq!(output, "7\n");
}

#[test]
fn test_return_ends_function_body() {
    assert_eq!(run_program("int f() { write 1; return; write 2; } f(); write 3;"), "1\n3\n");
}

#[test]
fn test_return_value_expression_is_not_evaluated() {
    assert_eq!(run_program("int f() { return 1 / 0; } f(); write 1;"), "1\n");
}

#[test]
fn test_return_in_nested_block_only_leaves_that_block() {
    let output = run_program("int g() { if (1) { write 1; return; } write 2; } g();");
    assert_eq!(output, "1\n2\n");
}

#[test]
fn test_wrong_arity_runs_nothing() {
    let (kind, output) = run_failing("int f(int a) { write a; } f(1, 2);");
    assert_eq!(kind, ErrorKind::CallWithWrongArity);
    assert_eq!(output, "");
}

#[test]
fn test_call_result_is_not_an_integer() {
    assert_eq!(runtime_error("int f() { } write f();"), ErrorKind::TypeMismatch);
    assert_eq!(runtime_error("int f() { } int x = f() + 1;"), ErrorKind::TypeMismatch);
}

#[test]
fn test_undeclared_function() {
    assert_eq!(runtime_error("g();"), ErrorKind::UndeclaredFunction);
}

#[test]
fn test_array_parameter_needs_an_array_name() {
    let decl = "int f(int v[]) { } int a = 1; ";
    assert_eq!(runtime_error(&format!("{decl} f(a);")), ErrorKind::WrongAccess);
    assert_eq!(runtime_error(&format!("{decl} f(a + 1);")), ErrorKind::WrongAccess);
}

#[test]
fn test_data_names_may_shadow_functions() {
    assert_eq!(run_program("int f() { write 1; } int f = 2; f(); write f;"), "1\n2\n");
}

// ============================================
// Short-circuit evaluation
// ============================================

#[test]
fn test_and_does_not_evaluate_right_operand() {
    let (result, output) = run_with(
        "int y;
         int ask() { read y; }
         int x = 0;
         if (x && ask()) { write 1; }
         write 5;",
        "",
        InterpreterConfig::default(),
    );
    assert_eq!(result, Ok(()));
    assert_eq!(output, "5\n");
}

#[test]
fn test_or_does_not_evaluate_right_operand() {
    let (result, output) = run_with(
        "int y;
         int ask() { read y; }
         if (1 || ask()) { write 1; }",
        "",
        InterpreterConfig::default(),
    );
    assert_eq!(result, Ok(()));
    assert!(!output.contains("Input value"));
    assert_eq!(output, "1\n");
}

// ============================================
// Console input
// ============================================

#[test]
fn test_read_from_input() {
    let (result, output) = run_with(
        "int n; read n; write n * 2;",
        "21\n",
        InterpreterConfig::default(),
    );
    assert_eq!(result, Ok(()));
    assert_eq!(output, "Input value for n > 42\n");
}

#[test]
fn test_read_rejects_non_integer() {
    let (result, _) = run_with("int n; read n;", "twelve\n", InterpreterConfig::default());
    assert_eq!(result, Err(ErrorKind::IoError));
}

#[test]
fn test_mock_input_is_seeded() {
    let config = InterpreterConfig {
        mock_input: true,
        seed: 42,
        ..InterpreterConfig::default()
    };
    let source = "int n; read n; write n;";
    let (result, first) = run_with(source, "", config.clone());
    let (_, second) = run_with(source, "", config);
    assert_eq!(result, Ok(()));
    assert_eq!(first, second);

    let lines: Vec<&str> = first.lines().collect();
    assert_eq!(lines.len(), 2);
    let value: i64 = lines[1].parse().unwrap();
    assert!((0..=MOCK_INPUT_MAX).contains(&value));
    assert_eq!(lines[0], format!("Input value for n > {value}"));
}

#[test]
fn test_read_errors() {
    assert_eq!(runtime_error("const C = 1; read C;"), ErrorKind::CannotAssignConstant);
    assert_eq!(runtime_error("read ghost;"), ErrorKind::VariableUndeclared);
    assert_eq!(runtime_error("int arr[2]; read arr;"), ErrorKind::CannotReadArray);
}

// ============================================
// Runtime errors
// ============================================

#[test]
fn test_out_of_bounds_fails_before_output() {
    let (kind, output) = run_failing("int arr[3]; arr[5] = 1; write 1;");
    assert_eq!(kind, ErrorKind::OutOfBoundsAccess);
    assert_eq!(output, "");
    assert_eq!(runtime_error("int arr[3]; write arr[-1];"), ErrorKind::OutOfBoundsAccess);
}

#[test]
fn test_output_before_error_is_kept() {
    let (kind, output) = run_failing("write 1; write 2 / 0; write 3;");
    assert_eq!(kind, ErrorKind::DivisionByZero);
    assert_eq!(output, "1\n");
}

#[test]
fn test_uninitialized_access() {
    assert_eq!(runtime_error("int a; write a;"), ErrorKind::UninitializedValueAccess);
    assert_eq!(
        runtime_error("int arr[2]; arr[0] = 1; write arr[1];"),
        ErrorKind::UninitializedValueAccess
    );
}

#[test]
fn test_declaration_conflicts() {
    assert_eq!(runtime_error("int x; int x;"), ErrorKind::VariableAlreadyDeclared);
    assert_eq!(runtime_error("const N = 1; int N;"), ErrorKind::ConstantAlreadyDeclared);
    assert_eq!(runtime_error("int x; const x = 1;"), ErrorKind::VariableAlreadyDeclared);
    assert_eq!(runtime_error("int x; { int x; }"), ErrorKind::VariableAlreadyDeclared);
    assert_eq!(runtime_error("int f() { } int f() { }"), ErrorKind::SymbolAlreadyInUse);
    assert_eq!(runtime_error("const f = 1; int f() { }"), ErrorKind::SymbolAlreadyInUse);
}

#[test]
fn test_assignment_errors() {
    assert_eq!(runtime_error("ghost = 1;"), ErrorKind::AssignmentToUndefinedVariable);
    assert_eq!(runtime_error("const N = 1; N = 2;"), ErrorKind::CannotAssignConstant);
    assert_eq!(runtime_error("int arr[2]; arr = 1;"), ErrorKind::WrongAssignment);
    assert_eq!(runtime_error("int a; a[0] = 1;"), ErrorKind::WrongAssignment);
}

#[test]
fn test_wrong_access() {
    assert_eq!(runtime_error("int arr[2]; write arr;"), ErrorKind::WrongAccess);
    assert_eq!(runtime_error("int a = 1; write a[0];"), ErrorKind::WrongAccess);
}

#[test]
fn test_undeclared_symbol() {
    assert_eq!(runtime_error("write ghost;"), ErrorKind::UndeclaredSymbol);
}

#[test]
fn test_array_sizes() {
    assert_eq!(runtime_error("int arr[0 - 1];"), ErrorKind::InvalidArraySize);
    assert_eq!(runtime_error("int arr[0]; arr[0] = 1;"), ErrorKind::OutOfBoundsAccess);
    assert_eq!(run_program("const N = 2; int arr[N * 2]; arr[3] = 8; write arr[3];"), "8\n");
}

#[test]
fn test_huge_array_size_is_an_error() {
    let (kind, output) = run_failing("int a[4611686018427387903]; write 1;");
    assert_eq!(kind, ErrorKind::InvalidArraySize);
    assert_eq!(output, "");

    let limit = MAX_ARRAY_SIZE as i64;
    assert_eq!(
        runtime_error(&format!("int a[{limit} + 1];")),
        ErrorKind::InvalidArraySize
    );
    assert_eq!(
        runtime_error("int a[9223372036854775807 + 1];"),
        ErrorKind::InvalidArraySize
    );
}

#[test]
fn test_unknown_type() {
    assert_eq!(runtime_error("float x;"), ErrorKind::InvalidType);
    assert_eq!(runtime_error("void f() { }"), ErrorKind::InvalidType);
}

#[test]
fn test_error_message_names_the_symbol() {
    let program = parse_source("test.lance", "int a; write a;").unwrap();
    let out = SharedOutput::new();
    let console = Console::new(Box::new(Cursor::new(Vec::new())), Box::new(out));
    let err = Interpreter::with_console(InterpreterConfig::default(), console)
        .run(&program)
        .unwrap_err();
    assert!(err.to_string().starts_with("Runtime error:"));
    assert!(err.message.contains('a'));
}

// ============================================
// Front-end errors
// ============================================

#[test]
fn test_parse_errors_carry_spans() {
    for source in ["int ;", "write 1", "if 1 write 1;", "int f( { }", "x = = 1;"] {
        let err = parse_source("bad.lance", source).unwrap_err();
        assert!(err.span().is_some(), "no span for {source:?}");
    }
}

#[test]
fn test_deeply_nested_program_runs() {
    let source = format!("write {}5;", "- ".repeat(800));
    assert_eq!(run_program(&source), "5\n");
}

#[test]
fn test_runaway_nesting_is_a_parse_error() {
    let source = format!("write {}1;", "!".repeat(100_000));
    let err = parse_source("deep.lance", &source).unwrap_err();
    assert!(err.to_string().starts_with("Parser error"));
}

#[test]
fn test_lexer_error() {
    let err = parse_source("bad.lance", "int a = 1 @ 2;").unwrap_err();
    assert!(err.span().is_some());
}

// ============================================
// JSON trees
// ============================================

#[test]
fn test_run_tree_from_json() {
    let json = r#"{
        "kind": "program",
        "children": [
            {"kind": "write_stmt", "children": [
                {"kind": "binexpr", "children": [
                    {"kind": "intexpr", "children": [{"value": "-7"}]},
                    {"value": "/"},
                    {"kind": "intexpr", "children": [{"value": "2"}]}
                ]}
            ]}
        ]
    }"#;
    let program: Tree = serde_json::from_str(json).unwrap();
    let (result, output) = run_tree(&program, "", InterpreterConfig::default());
    assert_eq!(result, Ok(()));
    assert_eq!(output, "-4\n");
}

#[test]
fn test_unknown_node_kind_is_skipped() {
    let json = r#"{
        "kind": "program",
        "children": [
            {"kind": "pragma", "children": [{"value": "fast"}]},
            {"kind": "write_stmt", "children": [
                {"kind": "intexpr", "children": [{"value": "1"}]}
            ]}
        ]
    }"#;
    let program: Tree = serde_json::from_str(json).unwrap();
    let (result, output) = run_tree(&program, "", InterpreterConfig::default());
    assert_eq!(result, Ok(()));
    assert_eq!(output, "1\n");
}

#[test]
fn test_parsed_tree_survives_json() {
    let source = "int a[2]; a[1] = 3; int f(int v[]) { write v[1]; } f(a);";
    let program = parse_source("test.lance", source).unwrap();
    let json = serde_json::to_string(&program).unwrap();
    let back: Tree = serde_json::from_str(&json).unwrap();
    assert_eq!(back, program);

    let (result, output) = run_tree(&back, "", InterpreterConfig::default());
    assert_eq!(result, Ok(()));
    assert_eq!(output, "3\n");
}

#[test]
fn test_malformed_tree() {
    let json = r#"{"kind": "program", "children": [{"kind": "write_stmt"}]}"#;
    let program: Tree = serde_json::from_str(json).unwrap();
    let (result, _) = run_tree(&program, "", InterpreterConfig::default());
    assert_eq!(result, Err(ErrorKind::MalformedTree));
}

// ============================================
// Bundled scripts
// ============================================

fn scripts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("scripts")
}

fn collect_scripts(dir: &Path, out: &mut Vec<PathBuf>) {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_scripts(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "lance") {
            out.push(path);
        }
    }
}

#[test]
fn test_bundled_scripts() {
    let mut scripts = Vec::new();
    collect_scripts(&scripts_dir(), &mut scripts);
    assert!(!scripts.is_empty());

    let config = InterpreterConfig {
        mock_input: true,
        seed: 7,
        ..InterpreterConfig::default()
    };
    for path in scripts {
        let source = std::fs::read_to_string(&path).unwrap();
        let program = parse_source(&path.display().to_string(), &source)
            .unwrap_or_else(|e| panic!("{} failed to parse: {e}", path.display()));
        let (result, _) = run_tree(&program, "", config.clone());

        // Scripts under errors/ demonstrate runtime failures
        let expect_failure = path.components().any(|c| c.as_os_str() == "errors");
        assert_eq!(result.is_err(), expect_failure, "{}: {result:?}", path.display());
    }
}
