use super::*;
use crate::runtime::{error::RuntimeErrorKind, value::ValueKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn declared_variable_prints_assigned_value() {
    assert_eq!(output_of("var x; x = 5; println(x);"), "5\n");
}

#[test]
fn empty_program_evaluates_to_zero() {
    assert_eq!(value_of("").as_int(), Some(0));
    assert_eq!(value_of("1; 2 + 3;").as_int(), Some(5));
    assert_eq!(value_of("function f() { 1; }").as_int(), Some(0));
}

#[test]
fn arithmetic_follows_precedence_and_associativity() {
    let source = "\
println(1 + 2 * 3 - 4 / 2);
println(10 - 4 - 3);
println(100 / 10 / 5);
println((1 + 2) * 3);
println(7 / 2);
println(0 - 7 / 2);
";
    assert_eq!(output_of(source), "5\n3\n2\n9\n3\n-3\n");
}

#[test]
fn relational_and_logical_results_are_zero_or_one() {
    let source = "\
println(1 < 2);
println(2 <= 1);
println(3 == 3);
println(3 != 3);
println(5 > 4);
println(4 >= 5);
println(2 && 3);
println(0 || 0);
println(0 || 7);
";
    assert_eq!(output_of(source), "1\n0\n1\n0\n1\n0\n1\n0\n1\n");
}

#[test]
fn logical_operators_short_circuit() {
    let source = "\
function boom() { println(\"boom\"); 1; }
println(0 && boom());
println(1 || boom());
println(1 && boom());
";
    assert_eq!(output_of(source), "0\n1\nboom\n1\n");
}

#[test]
fn arithmetic_wraps_on_overflow() {
    assert_eq!(
        output_of("println(9223372036854775807 + 1);"),
        "-9223372036854775808\n"
    );
}

#[test]
fn out_of_range_literal_is_an_evaluation_error() {
    let outcome = run("println(9223372036854775808);");
    assert_eq!(
        runtime_error(&outcome).kind,
        RuntimeErrorKind::IntegerLiteral {
            text: "9223372036854775808".into()
        }
    );
}

#[test]
fn leading_zeros_are_dropped() {
    assert_eq!(output_of("println(042);"), "42\n");
}

proptest! {
    #[test]
    fn integer_literals_print_their_value(n in 0i64..=i64::MAX, zeros in 0usize..4) {
        let source = format!("println({}{});", "0".repeat(zeros), n);
        prop_assert_eq!(output_of(&source), format!("{n}\n"));
    }
}

#[test]
fn division_by_zero_stops_the_run() {
    let outcome = run("println(1);\n5 / 0;\nprintln(2);");
    assert_eq!(outcome.output, "1\n");
    let err = runtime_error(&outcome);
    assert_eq!(err.kind, RuntimeErrorKind::DivisionByZero);
    assert_eq!((err.location.line, err.location.column), (2, 3));
    assert_eq!(err.to_string(), "Attempt to divide by zero");
}

#[test]
fn shadowing_in_nested_blocks() {
    let source = "\
var x;
x = 1;
if (1) {
    var x;
    x = 2;
    println(x);
}
println(x);
";
    assert_eq!(output_of(source), "2\n1\n");
}

#[test]
fn redeclaring_in_one_scope_fails() {
    let outcome = run("var x;\nvar x;");
    let err = runtime_error(&outcome);
    assert_eq!(err.kind, RuntimeErrorKind::Redefinition { name: "x".into() });
    assert_eq!(err.location.line, 2);

    let outcome = run("if (1) { var y; var y; }");
    assert_eq!(
        runtime_error(&outcome).to_string(),
        "Variable 'y' already defined"
    );
}

#[test]
fn each_loop_iteration_gets_a_fresh_scope() {
    let source = "\
var i;
var sum;
i = 0;
sum = 0;
while (i < 5) {
    var step;
    step = i;
    sum = sum + step;
    i = i + 1;
}
println(sum);
";
    assert_eq!(output_of(source), "10\n");
}

#[test]
fn if_else_picks_one_branch() {
    assert_eq!(
        output_of("if (0) { println(1); } else { println(2); }\nif (3) { println(3); }"),
        "2\n3\n"
    );
}

#[test]
fn recursion_through_a_result_variable() {
    let source = "\
function fact(n) {
    var r;
    if (n < 2) { r = 1; } else { r = n * fact(n - 1); }
    r;
}
println(fact(10));
";
    assert_eq!(output_of(source), "3628800\n");
}

#[test]
fn functions_see_globals_through_their_closure() {
    let source = "\
var counter;
function bump() { counter = counter + 1; }
bump();
bump();
println(counter);
";
    assert_eq!(output_of(source), "2\n");
}

#[test]
fn arity_mismatch_names_function_and_count() {
    let outcome = run("function f(a, b) { }\nf(1);");
    let err = runtime_error(&outcome);
    assert_eq!(
        err.kind,
        RuntimeErrorKind::ArityMismatch {
            name: "f".into(),
            expected: 2,
            received: 1,
        }
    );
    assert!(err.to_string().contains("'f' requires 2 arguments"));
    assert_eq!((err.location.line, err.location.column), (2, 1));
}

#[test]
fn later_definition_rebinds_the_name() {
    let source = "\
function f() { 1; }
function f() { 2; }
println(f());
";
    assert_eq!(output_of(source), "2\n");
}

#[test]
fn callables_render_by_kind() {
    assert_eq!(
        output_of("function f() { 0; }\nprintln(f);\nprintln(print);"),
        "<function f>\n<intrinsic function>\n"
    );
}

#[test]
fn calling_an_integer_fails() {
    let outcome = run("var x;\nx(1);");
    assert_eq!(
        runtime_error(&outcome).kind,
        RuntimeErrorKind::NotCallable {
            name: "x".into(),
            kind: ValueKind::Int,
        }
    );
}

#[test]
fn analysis_runs_before_any_output() {
    let outcome = run("println(1);\nprintln(y);");
    assert_eq!(outcome.output, "");
    let err = runtime_error(&outcome);
    assert_eq!(err.to_string(), "Reference to undefined name 'y'");
    assert_eq!((err.location.line, err.location.column), (2, 9));
}

#[test]
fn evaluator_catches_what_analysis_skips() {
    let outcome = run_unchecked("println(1);\nprintln(y);");
    assert_eq!(outcome.output, "1\n");
    assert_eq!(
        runtime_error(&outcome).kind,
        RuntimeErrorKind::UndefinedName { name: "y".into() }
    );

    // Parameters land in the flat name set but are not visible outside
    // their function.
    let outcome = run("function f(a) { var local; }\nf(1);\nprintln(a);");
    assert_eq!(
        runtime_error(&outcome).kind,
        RuntimeErrorKind::UndefinedName { name: "a".into() }
    );
}

#[test]
fn assigning_an_undeclared_name_fails() {
    let outcome = run_unchecked("z = 3;");
    assert_eq!(
        runtime_error(&outcome).kind,
        RuntimeErrorKind::UndefinedName { name: "z".into() }
    );
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(output_of("var a; var b; a = b = 4; println(a + b);"), "8\n");
}

#[test]
fn operands_must_be_integers() {
    let outcome = run("println(\"a\" + 1);");
    assert_eq!(
        runtime_error(&outcome).kind,
        RuntimeErrorKind::NonNumericOperand {
            op: "+",
            found: ValueKind::String,
        }
    );

    let outcome = run("if (mkarr()) { }");
    assert_eq!(
        runtime_error(&outcome).kind,
        RuntimeErrorKind::NonNumericCondition {
            found: ValueKind::Array
        }
    );
}

#[test]
fn call_depth_is_bounded() {
    let source = "function down(n) { if (n > 0) { down(n - 1); } }\ndown(100);";
    let config = RunConfig {
        max_call_depth: 50,
        ..RunConfig::default()
    };
    let outcome = run_full(source, "", config.clone());
    assert_eq!(
        runtime_error(&outcome).kind,
        RuntimeErrorKind::CallDepthExceeded { limit: 50 }
    );

    let outcome = run_full(
        "function down(n) { if (n > 0) { down(n - 1); } }\ndown(10);",
        "",
        config,
    );
    assert!(outcome.result.is_ok());
}

#[test]
fn default_call_depth_fits_on_the_test_thread() {
    let down = "function down(n) { if (n > 0) { down(n - 1); } else { n; } }\n";
    let result = crate::run_source(&format!("{down}down(999);"), "t.tly", RunConfig::default());
    assert!(result.is_ok(), "{:?}", result.err());

    match crate::run_source(&format!("{down}down(5000);"), "t.tly", RunConfig::default()) {
        Err(Error::Evaluation(err)) => assert_eq!(
            err.kind,
            RuntimeErrorKind::CallDepthExceeded { limit: 1000 }
        ),
        other => panic!("expected the depth limit, got {other:?}"),
    }
}

#[test]
fn print_and_escapes() {
    assert_eq!(
        output_of("print(\"a\");\nprint(1);\nprintln(\"\\tb\\n\\\"c\\\"\");"),
        "a1\tb\n\"c\"\n"
    );
}

#[test]
fn readint_reads_whitespace_separated_integers() {
    let source = "var a; var b; a = readint(); b = readint(); println(a * b);";
    let outcome = run_full(source, "6\n  -7 \n", RunConfig::default());
    assert!(outcome.result.is_ok());
    assert_eq!(outcome.output, "-42\n");
}

#[test]
fn readint_rejects_bad_or_missing_input() {
    let outcome = run_full("readint();", "abc", RunConfig::default());
    assert_eq!(
        runtime_error(&outcome).to_string(),
        "Failed to read input: 'abc' is not an integer"
    );

    let outcome = run_full("readint();", "   ", RunConfig::default());
    assert_eq!(
        runtime_error(&outcome).kind,
        RuntimeErrorKind::Input {
            message: "unexpected end of input".into()
        }
    );
}

#[test]
fn syntax_errors_surface_before_running() {
    let outcome = run("println(1);\nvar ;");
    assert_eq!(outcome.output, "");
    match outcome.result {
        Err(Error::Syntax(err)) => assert_eq!(err.message, "Unexpected token ';'"),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn run_source_tags_each_phase() {
    let run = |source: &str| crate::run_source(source, "t.tly", RunConfig::default());
    assert_eq!(run("1 + 2;").ok().and_then(|value| value.as_int()), Some(3));
    assert!(matches!(run("@"), Err(Error::Lexical(_))));
    assert!(matches!(run("var"), Err(Error::Syntax(_))));
    assert!(matches!(run("1 / 0;"), Err(Error::Evaluation(_))));
}
