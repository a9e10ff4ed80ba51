//! End-to-end snippet tests against the public crate API (S1-S8 plus the
//! boundary behaviors): a source string paired with an expected outcome,
//! self-contained in this file rather than loaded from a `tests/snippets/`
//! directory on disk, since these snippets are fixed and small enough not
//! to need their own files.

use kaleidoscope::{BinOpKind, Expr, Item};

fn parse_ok(src: &str) -> Vec<Item> {
    let (result, report) = kaleidoscope::parse_source(kaleidoscope::Source::source(src));
    assert!(!report.has_errors(), "unexpected diagnostics: {:?}", report.diagnostics());
    result.expect("expected no fatal error")
}

fn function_body(items: &[Item], index: usize) -> &Expr {
    match &items[index] {
        Item::Function(f) => &f.body,
        other => panic!("expected Function at index {}, got {:?}", index, other),
    }
}

#[test]
fn s1_simple_function_definition() {
    let items = parse_ok("def foo(x y) x+y");
    assert_eq!(items.len(), 1);
    match &items[0] {
        Item::Function(f) => {
            assert_eq!(f.proto.name, "foo");
            assert_eq!(f.proto.params, vec!["x", "y"]);
            assert!(!f.proto.is_operator);
        }
        other => panic!("expected Function, got {:?}", other),
    }
    match function_body(&items, 0) {
        Expr::BinaryOp { op, .. } => assert_eq!(*op, BinOpKind::Add),
        other => panic!("expected BinaryOp, got {:?}", other),
    }
}

#[test]
fn s2_extern_prototype() {
    let items = parse_ok("extern minus(xp1 yp2)");
    match &items[0] {
        Item::Extern(proto) => {
            assert_eq!(proto.name, "minus");
            assert_eq!(proto.params, vec!["xp1", "yp2"]);
            assert!(!proto.is_operator);
        }
        other => panic!("expected Extern, got {:?}", other),
    }
}

#[test]
fn s3_precedence_and_left_associativity() {
    let items = parse_ok("def foo(x y z v w) x + y*z - v + w");
    // ((x + (y*z)) - v) + w
    let top = function_body(&items, 0);
    let (top_lhs, top_op) = match top {
        Expr::BinaryOp { op, lhs, .. } => (lhs.as_ref(), *op),
        _ => panic!("expected top-level BinaryOp"),
    };
    assert_eq!(top_op, BinOpKind::Add);
    let mid_lhs = match top_lhs {
        Expr::BinaryOp { op, lhs, .. } => {
            assert_eq!(*op, BinOpKind::Sub);
            lhs.as_ref()
        }
        _ => panic!("expected (x + y*z) - v"),
    };
    match mid_lhs {
        Expr::BinaryOp { op, rhs, .. } => {
            assert_eq!(*op, BinOpKind::Add);
            match rhs.as_ref() {
                Expr::BinaryOp { op, .. } => assert_eq!(*op, BinOpKind::Mul),
                other => panic!("expected y*z, got {:?}", other),
            }
        }
        other => panic!("expected x + y*z, got {:?}", other),
    }
}

#[test]
fn s4_nested_if_else() {
    let items = parse_ok(
        "def mt1(i) 1\ndef mt(x) if mt1(1) < 5 then if mt1(2) < 3 then 1 else 2 else 3",
    );
    match function_body(&items, 1) {
        Expr::If { cond, then_branch, else_branch, .. } => {
            assert!(matches!(cond.as_ref(), Expr::BinaryOp { op: BinOpKind::LessThan, .. }));
            assert!(matches!(then_branch.as_ref(), Expr::If { .. }));
            assert!(matches!(else_branch.as_ref(), Expr::Number { value, .. } if *value == 3.0));
        }
        other => panic!("expected If, got {:?}", other),
    }
}

#[test]
fn s5_for_expression_full_form() {
    let items = parse_ok("def mt1(i) i + 1\ndef mt(x) for i = 1 : i < 5 : 1 in mt1(i + x)");
    match function_body(&items, 1) {
        Expr::For { induction_name, start, end, step, body } => {
            assert_eq!(induction_name, "i");
            assert!(matches!(start.as_ref(), Expr::Number { value, .. } if *value == 1.0));
            assert!(matches!(end.as_ref(), Expr::BinaryOp { op: BinOpKind::LessThan, .. }));
            assert!(matches!(step.as_deref(), Some(Expr::Number { value, .. }) if *value == 1.0));
            assert!(matches!(body.as_ref(), Expr::Call { .. }));
        }
        other => panic!("expected For, got {:?}", other),
    }
}

#[test]
fn s6_user_binary_operator_declaration_and_use() {
    let items = parse_ok("def binary / 30 (a b) a + b + 1\ndef mt(x) x / x");
    match &items[0] {
        Item::Function(f) => assert_eq!(f.proto.name, "_binary_/_with_prio_30"),
        other => panic!("expected Function, got {:?}", other),
    }
    match function_body(&items, 1) {
        Expr::BinaryOp { op, symbol, priority, .. } => {
            assert_eq!(*op, BinOpKind::UserDefined);
            assert_eq!(symbol, "/");
            assert_eq!(*priority, 30);
        }
        other => panic!("expected user-defined BinaryOp, got {:?}", other),
    }
}

#[test]
fn s7_unary_operator_declaration_and_use() {
    let items = parse_ok("def unary ! (a) if a then 0 else 1\ndef mt(x) x + !x");
    match function_body(&items, 1) {
        Expr::BinaryOp { rhs, .. } => match rhs.as_ref() {
            Expr::UnaryOp { opcode, mangled, .. } => {
                assert_eq!(opcode, "!");
                assert_eq!(mangled, "_unary_!_with_prio_0");
            }
            other => panic!("expected UnaryOp, got {:?}", other),
        },
        other => panic!("expected BinaryOp, got {:?}", other),
    }
}

#[test]
fn s8_redefining_a_reserved_char_as_an_operator_is_fatal() {
    let (result, _) = kaleidoscope::parse_source(kaleidoscope::Source::source("def unary - (a) 0 - a"));
    assert!(result.is_err(), "'-' is reserved and must not be redefinable as an operator symbol");
}

#[test]
fn empty_input_is_not_an_error() {
    let items = parse_ok("");
    assert!(items.is_empty());
}

#[test]
fn only_comments_and_whitespace_is_not_an_error() {
    let items = parse_ok("# nothing here\n\n   \n# still nothing\n");
    assert!(items.is_empty());
}

#[test]
fn identifier_number_adjacency_boundary() {
    let items = parse_ok("def f() abc123");
    match function_body(&items, 0) {
        Expr::Variable { name, .. } => assert_eq!(name, "abc123"),
        other => panic!("expected Variable('abc123'), got {:?}", other),
    }

    let (result, report) = kaleidoscope::parse_source(kaleidoscope::Source::source("def g() 123abc"));
    // `123` parses as a Number, ending `g`'s body; the trailing `abc` is not
    // part of that expression at all, just the next top-level form (a bare
    // `Variable`), so this is not an error.
    let items = result.expect("no fatal error expected");
    assert!(!report.has_errors());
    assert_eq!(items.len(), 2);
    match function_body(&items, 0) {
        Expr::Number { value, .. } => assert_eq!(*value, 123.0),
        other => panic!("expected Number(123), got {:?}", other),
    }
    match &items[1] {
        Item::TopLevelExpr(Expr::Variable { name, .. }) => assert_eq!(name, "abc"),
        other => panic!("expected trailing TopLevelExpr('abc'), got {:?}", other),
    }
}

#[test]
fn malformed_number_literal_reports_non_fatal() {
    let (result, report) = kaleidoscope::parse_source(kaleidoscope::Source::source("def f() 1.2.3"));
    assert!(result.is_ok());
    assert!(report.has_errors());
}

#[test]
fn longest_match_prefers_longer_registered_operator() {
    let items = parse_ok("def binary |> 20 (a b) a\ndef f(x y) x |> y");
    match function_body(&items, 1) {
        Expr::BinaryOp { symbol, .. } => assert_eq!(symbol, "|>"),
        other => panic!("expected '|>' BinaryOp, got {:?}", other),
    }
}

#[test]
fn var_expression_with_two_bindings() {
    let items = parse_ok("def f(x) var y = 1 z = y + 1 in y + z");
    match function_body(&items, 0) {
        Expr::Var { bindings, body } => {
            assert_eq!(bindings.len(), 2);
            assert_eq!(bindings[0].0, "y");
            assert_eq!(bindings[1].0, "z");
            assert!(matches!(body.as_ref(), Expr::BinaryOp { op: BinOpKind::Add, .. }));
        }
        other => panic!("expected Var, got {:?}", other),
    }
}
