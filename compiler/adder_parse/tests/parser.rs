//! End-to-end engine tests: driver passes, backtracking discipline,
//! memoization, and diagnostic precision.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use adder_diagnostic::{DiagnosticCollector, ErrorType};
use adder_ir::{ExprKind, ModTy, StmtKind, TokenKind};
use adder_parse::{parse, InputType, Parser, ParserFlags, RuleId, DEFAULT_FEATURE_VERSION};

fn parse_module(source: &str) -> (Option<ModTy>, DiagnosticCollector) {
    let sink = DiagnosticCollector::new();
    let result = parse(
        source,
        InputType::Module,
        &sink,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    (result, sink)
}

#[test]
fn valid_module_never_invokes_the_channel() {
    let source = "\
def greet(name, punct='!'):
    message = 'hello, ' + name + punct
    return message

x = greet('world')
if x:
    y = [1, 2, 3][0]
while False:
    break
";
    let (result, sink) = parse_module(source);
    assert!(result.is_some());
    assert!(sink.take().is_empty(), "optimistic pass must stay silent");
}

#[test]
fn malformed_parameter_list_is_located_precisely() {
    let (result, sink) = parse_module("def f(:\n");
    assert!(result.is_none());
    let errors = sink.errors();
    assert_eq!(errors.len(), 1, "exactly one diagnostic: {errors:?}");
    let diag = &errors[0];
    assert_eq!(diag.error_type, Some(ErrorType::Syntax));
    // The range points at the malformed parameter list on line 1, not at
    // the end of the file.
    assert_eq!(diag.range.start_line, 1);
    assert_eq!(diag.range.start_column, 6);
}

#[test]
fn two_pass_recovery_is_deterministic() {
    let first = parse_module("def f(:\n");
    let second = parse_module("def f(:\n");
    let a = first.1.errors();
    let b = second.1.errors();
    assert_eq!(a, b, "the diagnostic re-parse must be reproducible");
}

#[test]
fn cannot_assign_to_literal() {
    let (result, sink) = parse_module("1 = x\n");
    assert!(result.is_none());
    let errors = sink.errors();
    assert!(errors
        .iter()
        .any(|d| d.message == "cannot assign to literal"), "{errors:?}");
}

#[test]
fn cannot_assign_to_function_call() {
    let (result, sink) = parse_module("f() = 1\n");
    assert!(result.is_none());
    assert!(sink
        .errors()
        .iter()
        .any(|d| d.message == "cannot assign to function call"));
}

#[test]
fn cannot_delete_comparison() {
    let (result, sink) = parse_module("del a == b\n");
    assert!(result.is_none());
    assert!(sink
        .errors()
        .iter()
        .any(|d| d.message.starts_with("cannot delete")));
}

#[test]
fn unclosed_bracket_is_anchored_at_the_opener() {
    let (result, sink) = parse_module("x = (1, 2\n");
    assert!(result.is_none());
    let errors = sink.errors();
    let diag = errors
        .iter()
        .find(|d| d.message.contains("was never closed"))
        .expect("unclosed-bracket diagnostic");
    assert!(diag.message.contains("'('"));
    assert_eq!(diag.range.start_line, 1);
    assert_eq!(diag.range.start_column, 4);
}

#[test]
fn missing_indent_is_an_indentation_error() {
    let (result, sink) = parse_module("if x:\npass\n");
    assert!(result.is_none());
    assert!(sink
        .errors()
        .iter()
        .any(|d| d.error_type == Some(ErrorType::Indentation)
            && d.message.contains("expected an indented block")));
}

#[test]
fn tab_inconsistency_reports_tab_category() {
    let (result, sink) = parse_module("if x:\n\ty = 1\n        z = 2\n");
    assert!(result.is_none());
    assert!(sink
        .errors()
        .iter()
        .any(|d| d.error_type == Some(ErrorType::Tab)));
}

#[test]
fn unterminated_string_keeps_the_tokenizer_message() {
    let (result, sink) = parse_module("x = 'abc\n");
    assert!(result.is_none());
    assert!(sink
        .errors()
        .iter()
        .any(|d| d.message.contains("unterminated string literal")));
}

#[test]
fn single_mode_parses_one_statement() {
    let sink = DiagnosticCollector::new();
    let result = parse(
        "x = 1",
        InputType::Single,
        &sink,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    assert!(!sink.has_errors(), "{:?}", sink.errors());
    let Some(ModTy::Interactive { body, .. }) = result else {
        panic!("expected interactive result");
    };
    assert!(matches!(body[0].kind, StmtKind::Assign { .. }));
}

#[test]
fn single_mode_rejects_multiple_statements() {
    let sink = DiagnosticCollector::new();
    let result = parse(
        "x = 1\ny = 2\n",
        InputType::Single,
        &sink,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    assert!(result.is_none());
    assert!(sink.errors().iter().any(|d| d
        .message
        .contains("multiple statements found while compiling a single statement")));
}

#[test]
fn single_mode_compound_statement_with_indent() {
    let sink = DiagnosticCollector::new();
    let result = parse(
        "if x:\n    y = 1\n",
        InputType::Single,
        &sink,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    assert!(!sink.has_errors(), "{:?}", sink.errors());
    assert!(matches!(result, Some(ModTy::Interactive { .. })));
}

#[test]
fn eval_mode_returns_expression() {
    let sink = DiagnosticCollector::new();
    let result = parse(
        "1 + 2 * 3",
        InputType::Eval,
        &sink,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    let Some(ModTy::Expression { body, .. }) = result else {
        panic!("expected expression");
    };
    // Precedence: 1 + (2 * 3).
    let ExprKind::BinOp { right, .. } = &body.kind else {
        panic!("expected binary op");
    };
    assert!(matches!(right.kind, ExprKind::BinOp { .. }));
}

#[test]
fn barry_flag_swaps_not_equal_spelling() {
    let sink = DiagnosticCollector::new();
    let result = parse(
        "a <> b",
        InputType::Eval,
        &sink,
        ParserFlags::BARRY_AS_BDFL,
        DEFAULT_FEATURE_VERSION,
    );
    assert!(result.is_some(), "{:?}", sink.errors());

    let sink = DiagnosticCollector::new();
    let result = parse(
        "a != b",
        InputType::Eval,
        &sink,
        ParserFlags::BARRY_AS_BDFL,
        DEFAULT_FEATURE_VERSION,
    );
    assert!(result.is_none());
    assert!(sink
        .errors()
        .iter()
        .any(|d| d.message.contains("with Barry as BDFL")));
}

#[test]
fn conventional_not_equal_without_flag() {
    let sink = DiagnosticCollector::new();
    let result = parse(
        "a != b",
        InputType::Eval,
        &sink,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    assert!(result.is_some());
    let sink = DiagnosticCollector::new();
    let result = parse(
        "a <> b",
        InputType::Eval,
        &sink,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    assert!(result.is_none());
}

#[test]
fn type_ignores_surface_on_the_module() {
    let sink = DiagnosticCollector::new();
    let result = parse(
        "x = 1 # type: ignore\n",
        InputType::Module,
        &sink,
        ParserFlags::TYPE_COMMENTS,
        DEFAULT_FEATURE_VERSION,
    );
    let Some(ModTy::Module { type_ignores, .. }) = result else {
        panic!("expected module");
    };
    assert_eq!(type_ignores.len(), 1);
    assert_eq!(type_ignores[0].lineno, 1);
}

#[test]
fn halting_channel_stops_after_first_error() {
    let sink = DiagnosticCollector::stopping();
    let result = parse(
        "x = b'a' 'b'\n",
        InputType::Module,
        &sink,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    assert!(result.is_none());
    assert_eq!(sink.errors().len(), 1, "halt must suppress the re-raise");
}

#[test]
fn blank_single_input_fails_cleanly() {
    let sink = DiagnosticCollector::new();
    let result = parse(
        "",
        InputType::Single,
        &sink,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    assert!(result.is_none());
    assert!(sink.has_errors());
}

#[test]
fn empty_input_in_module_mode() {
    let (result, sink) = parse_module("");
    assert!(result.is_some(), "{:?}", sink.errors());
    let Some(ModTy::Module { body, .. }) = result else {
        panic!("expected module");
    };
    assert!(body.is_empty());
}

// ── Rule-protocol properties ─────────────────────────────────────────────

#[test]
fn expect_mismatch_leaves_cursor_untouched() {
    let sink = DiagnosticCollector::new();
    let mut parser = Parser::new(
        "x + y",
        &sink,
        InputType::Eval,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    let before = parser.mark();
    assert!(parser.expect(TokenKind::Plus).is_none());
    assert_eq!(parser.mark(), before);
    assert!(parser.expect(TokenKind::Name).is_some());
    assert_eq!(parser.mark(), before + 1);
}

#[test]
fn lookahead_never_consumes() {
    let sink = DiagnosticCollector::new();
    let mut parser = Parser::new(
        "x + y",
        &sink,
        InputType::Eval,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    let before = parser.mark();
    assert!(parser.lookahead(true, TokenKind::Name));
    assert!(parser.lookahead(false, TokenKind::Plus));
    assert_eq!(parser.mark(), before);
}

#[test]
fn memoization_replays_results_and_cursor_advancement() {
    let sink = DiagnosticCollector::new();
    let mut parser = Parser::new(
        "a b",
        &sink,
        InputType::Eval,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    const RULE: RuleId = RuleId(900);
    let start = parser.mark();

    // First invocation computes and consumes one name.
    let first = parser.memoize(RULE, |p| p.name_token());
    let advanced_to = parser.mark();
    assert!(first.is_some());
    assert_eq!(advanced_to, start + 1);

    // Replay from the same position: identical result, identical cursor.
    parser.reset(start);
    let second = parser.memoize(RULE, |_| panic!("cache hit must not re-run the rule body"));
    assert_eq!(second, first);
    assert_eq!(parser.mark(), advanced_to);
}

#[test]
fn memoized_failures_restore_the_cursor() {
    let sink = DiagnosticCollector::new();
    let mut parser = Parser::new(
        "+ x",
        &sink,
        InputType::Eval,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    const RULE: RuleId = RuleId(901);
    let start = parser.mark();
    let result = parser.memoize(RULE, |p| {
        // Consume something, then fail: the engine must rewind.
        let _ = p.expect(TokenKind::Plus);
        None
    });
    assert!(result.is_none());
    assert_eq!(parser.mark(), start);

    // Cached failure replays without running the body.
    let replay = parser.memoize(RULE, |_| panic!("cached failure must replay"));
    assert!(replay.is_none());
    assert_eq!(parser.mark(), start);
}

#[test]
fn expect_text_and_soft_keywords() {
    let sink = DiagnosticCollector::new();
    let mut parser = Parser::new(
        "match x",
        &sink,
        InputType::Eval,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    // `match` is not reserved; it lexes as a name and matches by text.
    assert!(parser.lookahead_text(true, "match"));
    assert!(parser.expect_soft_keyword("match").is_some());
    assert!(parser.expect_text("x").is_some());
}

#[test]
fn deep_nesting_parses_without_blowup() {
    // Memoization keeps repeated alternatives at the same position cheap.
    let mut source = String::from("x = ");
    for _ in 0..60 {
        source.push('(');
    }
    source.push('1');
    for _ in 0..60 {
        source.push(')');
    }
    source.push('\n');
    let (result, sink) = parse_module(&source);
    assert!(result.is_some(), "{:?}", sink.errors());
}

#[test]
fn decoded_fstring_end_to_end() {
    let sink = DiagnosticCollector::new();
    let result = parse(
        "s = f'{x!s:>{width}}' 'tail'\n",
        InputType::Module,
        &sink,
        ParserFlags::empty(),
        DEFAULT_FEATURE_VERSION,
    );
    assert!(!sink.has_errors(), "{:?}", sink.errors());
    let Some(ModTy::Module { body, .. }) = result else {
        panic!("expected module");
    };
    let StmtKind::Assign { value, .. } = &body[0].kind else {
        panic!("expected assignment");
    };
    let ExprKind::JoinedStr { values } = &value.kind else {
        panic!("expected joined string, got {:?}", value.kind);
    };
    assert_eq!(values.len(), 2);
    assert!(matches!(values[0].kind, ExprKind::FormattedValue { .. }));
}
