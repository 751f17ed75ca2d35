//! Integration tests for the Tarn parser.
//!
//! Each test parses a snippet and asserts on the resulting CST structure
//! via node kinds and the typed AST accessors.

use tarn_parser::ast::expr::{BinaryExpr, CallExpr, Expr, FieldAccess, IndexExpr};
use tarn_parser::ast::item::{AssignStmt, ClassDef, FnDef, LetStmt};
use tarn_parser::ast::AstNode;
use tarn_parser::{parse, SyntaxKind, SyntaxNode};

/// Parse and return the root node, asserting the parse succeeded.
fn root(source: &str) -> SyntaxNode {
    let parse = parse(source);
    assert!(
        parse.ok(),
        "parse errors for {source:?}: {:?}",
        parse.errors()
    );
    parse.syntax()
}

/// First descendant of the given kind, or panic.
fn descendant(root: &SyntaxNode, kind: SyntaxKind) -> SyntaxNode {
    root.descendants()
        .find(|n| n.kind() == kind)
        .unwrap_or_else(|| panic!("no {kind:?} in tree"))
}

// ── Statements ─────────────────────────────────────────────────────────

#[test]
fn let_binding_structure() {
    let root = root("let x = 42");
    let stmt = LetStmt::cast(descendant(&root, SyntaxKind::LET_STMT)).unwrap();
    assert_eq!(stmt.name().unwrap().text().as_deref(), Some("x"));
    assert!(matches!(stmt.value(), Some(Expr::Literal(_))));
}

#[test]
fn assignment_wraps_target_and_value() {
    let root = root("x = 1");
    let assign = AssignStmt::cast(descendant(&root, SyntaxKind::ASSIGN_STMT)).unwrap();
    assert!(matches!(assign.target(), Some(Expr::NameRef(_))));
    assert!(matches!(assign.value(), Some(Expr::Literal(_))));
}

#[test]
fn field_assignment_target_is_field_access() {
    let root = root("p.x = 1");
    let assign = AssignStmt::cast(descendant(&root, SyntaxKind::ASSIGN_STMT)).unwrap();
    let target = assign.target().unwrap();
    let Expr::FieldAccess(fa) = target else {
        panic!("expected field access target, got {target:?}");
    };
    assert_eq!(fa.field_name().as_deref(), Some("x"));
    assert!(matches!(fa.base(), Some(Expr::NameRef(_))));
}

#[test]
fn self_assignment_inside_method() {
    let source = "class Point do\n  fn move(dx) do\n    self.x = dx\n  end\nend";
    let root = root(source);
    let assign = AssignStmt::cast(descendant(&root, SyntaxKind::ASSIGN_STMT)).unwrap();
    let Some(Expr::FieldAccess(fa)) = assign.target() else {
        panic!("expected field access target");
    };
    assert!(matches!(fa.base(), Some(Expr::SelfExpr(_))));
}

#[test]
fn return_with_and_without_value() {
    let root = root("fn f() do\n  return 1\nend\nfn g() do\n  return\nend");
    let returns: Vec<_> = root
        .descendants()
        .filter(|n| n.kind() == SyntaxKind::RETURN_STMT)
        .collect();
    assert_eq!(returns.len(), 2);
    assert!(returns[0].children().any(|c| c.kind() == SyntaxKind::LITERAL));
    assert!(!returns[1].children().any(|c| c.kind() == SyntaxKind::LITERAL));
}

#[test]
fn if_else_structure() {
    let root = root("if x do\n  y = 1\nelse\n  y = 2\nend");
    let if_stmt = descendant(&root, SyntaxKind::IF_STMT);
    assert!(if_stmt.children().any(|c| c.kind() == SyntaxKind::BLOCK));
    assert!(if_stmt
        .children()
        .any(|c| c.kind() == SyntaxKind::ELSE_BRANCH));
}

#[test]
fn while_loop_structure() {
    let root = root("while x < 10 do\n  x = x + 1\nend");
    let while_stmt = descendant(&root, SyntaxKind::WHILE_STMT);
    assert!(while_stmt
        .children()
        .any(|c| c.kind() == SyntaxKind::BINARY_EXPR));
    assert!(while_stmt.children().any(|c| c.kind() == SyntaxKind::BLOCK));
}

// ── Functions and classes ──────────────────────────────────────────────

#[test]
fn fn_def_with_params() {
    let root = root("fn add(a, b) do\n  return a + b\nend");
    let fn_def = FnDef::cast(descendant(&root, SyntaxKind::FN_DEF)).unwrap();
    assert_eq!(fn_def.name().unwrap().text().as_deref(), Some("add"));
    let params: Vec<_> = fn_def.param_list().unwrap().params().collect();
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].name().unwrap().text().as_deref(), Some("a"));
    assert_eq!(params[1].name().unwrap().text().as_deref(), Some("b"));
    assert!(fn_def.body().is_some());
    assert!(!fn_def.is_method());
}

#[test]
fn class_with_fields_and_methods() {
    let source = "class Point : Object do\n  x = 0\n  y = 0\n  fn move(dx) do\n    self.x = self.x + dx\n  end\nend";
    let root = root(source);
    let class = ClassDef::cast(descendant(&root, SyntaxKind::CLASS_DEF)).unwrap();
    assert_eq!(class.name().unwrap().text().as_deref(), Some("Point"));
    assert_eq!(class.superclass().unwrap().text().as_deref(), Some("Object"));

    let fields: Vec<_> = class.fields().collect();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name().unwrap().text().as_deref(), Some("x"));
    assert!(matches!(fields[0].value(), Some(Expr::Literal(_))));

    let methods: Vec<_> = class.methods().collect();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].name().unwrap().text().as_deref(), Some("move"));
    assert!(methods[0].is_method());
}

#[test]
fn class_without_superclass() {
    let root = root("class Lone do\nend");
    let class = ClassDef::cast(descendant(&root, SyntaxKind::CLASS_DEF)).unwrap();
    assert!(class.superclass().is_none());
}

// ── Expressions ────────────────────────────────────────────────────────

#[test]
fn precedence_mul_binds_tighter_than_add() {
    // a + b * c => a + (b * c)
    let root = root("let r = a + b * c");
    let outer = BinaryExpr::cast(descendant(&root, SyntaxKind::BINARY_EXPR)).unwrap();
    assert_eq!(outer.op().unwrap().kind(), SyntaxKind::PLUS);
    let Some(Expr::BinaryExpr(rhs)) = outer.rhs() else {
        panic!("expected nested binary rhs");
    };
    assert_eq!(rhs.op().unwrap().kind(), SyntaxKind::STAR);
}

#[test]
fn comparison_binds_looser_than_arithmetic() {
    // x + 1 < y => (x + 1) < y
    let root = root("let r = x + 1 < y");
    let outer = BinaryExpr::cast(descendant(&root, SyntaxKind::BINARY_EXPR)).unwrap();
    assert_eq!(outer.op().unwrap().kind(), SyntaxKind::LT);
}

#[test]
fn postfix_chain_call_then_field() {
    // f(1).x parses as FIELD_ACCESS(CALL_EXPR(NAME_REF, ARG_LIST))
    let root = root("let r = f(1).x");
    let fa = FieldAccess::cast(descendant(&root, SyntaxKind::FIELD_ACCESS)).unwrap();
    assert!(matches!(fa.base(), Some(Expr::CallExpr(_))));
}

#[test]
fn method_call_callee_is_field_access() {
    let root = root("p.move(1)");
    let call = CallExpr::cast(descendant(&root, SyntaxKind::CALL_EXPR)).unwrap();
    assert!(matches!(call.callee(), Some(Expr::FieldAccess(_))));
    assert_eq!(call.arg_list().unwrap().args().count(), 1);
}

#[test]
fn index_expression_with_string_key() {
    let root = root("let v = t[\"key\"]");
    let idx = IndexExpr::cast(descendant(&root, SyntaxKind::INDEX_EXPR)).unwrap();
    assert!(matches!(idx.base(), Some(Expr::NameRef(_))));
    let Some(Expr::Literal(lit)) = idx.index() else {
        panic!("expected literal index");
    };
    assert_eq!(lit.string_value().as_deref(), Some("key"));
}

#[test]
fn table_constructor_entries() {
    let root = root("let t = { a = 1, b = \"two\" }");
    let table = descendant(&root, SyntaxKind::TABLE_EXPR);
    let fields: Vec<_> = table
        .children()
        .filter(|c| c.kind() == SyntaxKind::TABLE_FIELD)
        .collect();
    assert_eq!(fields.len(), 2);
}

#[test]
fn closure_do_body_and_arrow_body() {
    let root = root("let f = fn (x) do\n  return x\nend\nlet g = fn (y) -> y end");
    let closures: Vec<_> = root
        .descendants()
        .filter(|n| n.kind() == SyntaxKind::CLOSURE_EXPR)
        .collect();
    assert_eq!(closures.len(), 2);
    // First closure has a block body, second has an arrow expression.
    assert!(closures[0].children().any(|c| c.kind() == SyntaxKind::BLOCK));
    assert!(closures[1]
        .children()
        .any(|c| c.kind() == SyntaxKind::NAME_REF));
}

#[test]
fn unary_and_logical_operators() {
    let root = root("let r = not a and -b or c");
    // Tree shape: ((not a) and (-b)) or c
    let outer = BinaryExpr::cast(descendant(&root, SyntaxKind::BINARY_EXPR)).unwrap();
    assert_eq!(outer.op().unwrap().kind(), SyntaxKind::OR_KW);
}

#[test]
fn multiline_call_inside_parens() {
    // Newlines are insignificant inside delimiters.
    let root = root("f(\n  1,\n  2\n)");
    let call = CallExpr::cast(descendant(&root, SyntaxKind::CALL_EXPR)).unwrap();
    assert_eq!(call.arg_list().unwrap().args().count(), 2);
}

// ── Errors and recovery ────────────────────────────────────────────────

#[test]
fn missing_end_reports_related_span() {
    let parse = parse("fn f() do\n  return 1\n");
    assert!(!parse.ok());
    let err = &parse.errors()[0];
    assert!(err.message.contains("end"), "message: {}", err.message);
    assert!(err.related.is_some());
}

#[test]
fn error_tree_still_builds() {
    let parse = parse("let = 5");
    assert!(!parse.ok());
    // The tree must still be constructible and rooted at SOURCE_FILE.
    assert_eq!(parse.syntax().kind(), SyntaxKind::SOURCE_FILE);
}

#[test]
fn lossless_text_roundtrip() {
    // The CST stores every token; concatenated text must equal the source
    // minus skipped whitespace.
    let source = "let x = 1\nx = x + 2";
    let parse = parse(source);
    assert!(parse.ok());
    let tree_text = parse.syntax().text().to_string();
    let expected: String = source.chars().filter(|c| *c != ' ').collect();
    assert_eq!(tree_text, expected);
}
