//! Statement and declaration parsers for Tarn.
//!
//! Parses `let` bindings, named function definitions, class definitions
//! (with superclass clause, body fields, and methods), and the `return`,
//! `if`, and `while` statements.

use crate::syntax_kind::SyntaxKind;

use super::expressions::{expr, parse_block_body, parse_param_list};
use super::Parser;

// ── Let Binding ──────────────────────────────────────────────────────────

/// Parse a local binding: `let name = expr`.
pub(crate) fn parse_let_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // let

    if p.at(SyntaxKind::IDENT) {
        let name = p.open();
        p.advance();
        p.close(name, SyntaxKind::NAME);
    } else {
        p.error("expected binding name after `let`");
        p.close(m, SyntaxKind::LET_STMT);
        return;
    }

    p.expect(SyntaxKind::EQ);
    if !p.has_error() {
        expr(p);
    }

    p.close(m, SyntaxKind::LET_STMT);
}

// ── Function Definition ──────────────────────────────────────────────────

/// Parse a named function definition: `fn name(params) do body end`.
///
/// Also used for methods inside class bodies.
pub(crate) fn parse_fn_def(p: &mut Parser) {
    let m = p.open();
    p.advance(); // fn

    if p.at(SyntaxKind::IDENT) {
        let name = p.open();
        p.advance();
        p.close(name, SyntaxKind::NAME);
    } else {
        p.error("expected function name");
        p.close(m, SyntaxKind::FN_DEF);
        return;
    }

    if p.at(SyntaxKind::L_PAREN) {
        parse_param_list(p);
    } else {
        p.error("expected parameter list");
    }

    let do_span = p.current_span();
    p.expect(SyntaxKind::DO_KW);

    if !p.has_error() {
        parse_block_body(p);
    }

    if !p.at(SyntaxKind::END_KW) {
        p.error_with_related(
            "expected `end` to close function body",
            do_span,
            "`do` block started here",
        );
    } else {
        p.advance(); // end
    }

    p.close(m, SyntaxKind::FN_DEF);
}

// ── Class Definition ─────────────────────────────────────────────────────

/// Parse a class definition: `class Name [: Super] do body end`.
///
/// The body may only contain field statements (`name = expr`) and method
/// definitions (`fn name(params) do ... end`).
pub(crate) fn parse_class_def(p: &mut Parser) {
    let m = p.open();
    p.advance(); // class

    if p.at(SyntaxKind::IDENT) {
        let name = p.open();
        p.advance();
        p.close(name, SyntaxKind::NAME);
    } else {
        p.error("expected class name");
        p.close(m, SyntaxKind::CLASS_DEF);
        return;
    }

    // Optional superclass clause: `: Super`
    if p.at(SyntaxKind::COLON) {
        let sup = p.open();
        p.advance(); // :
        if p.at(SyntaxKind::IDENT) {
            let name_ref = p.open();
            p.advance();
            p.close(name_ref, SyntaxKind::NAME_REF);
        } else {
            p.error("expected superclass name after `:`");
        }
        p.close(sup, SyntaxKind::SUPERCLASS);
    }

    let do_span = p.current_span();
    p.expect(SyntaxKind::DO_KW);

    if !p.has_error() {
        parse_class_body(p);
    }

    if !p.at(SyntaxKind::END_KW) {
        p.error_with_related(
            "expected `end` to close class body",
            do_span,
            "`do` block started here",
        );
    } else {
        p.advance(); // end
    }

    p.close(m, SyntaxKind::CLASS_DEF);
}

/// Parse the members of a class body, up to END_KW or EOF.
///
/// Members are direct children of the CLASS_DEF node (no BLOCK wrapper),
/// so the semantic layer can enumerate fields and methods directly.
fn parse_class_body(p: &mut Parser) {
    loop {
        p.eat_newlines();
        while p.eat(SyntaxKind::SEMICOLON) {
            p.eat_newlines();
        }

        match p.current() {
            SyntaxKind::END_KW | SyntaxKind::EOF => break,
            SyntaxKind::FN_KW => parse_fn_def(p),
            SyntaxKind::IDENT if p.nth(1) == SyntaxKind::EQ => parse_class_field(p),
            _ => {
                p.advance_with_error("expected field or method in class body");
                break;
            }
        }

        if p.has_error() {
            break;
        }
    }
}

/// Parse a class-body field statement: `name = expr`.
fn parse_class_field(p: &mut Parser) {
    let m = p.open();

    let name = p.open();
    p.advance(); // ident
    p.close(name, SyntaxKind::NAME);

    p.advance(); // =
    expr(p);

    p.close(m, SyntaxKind::CLASS_FIELD);
}

// ── Return Statement ─────────────────────────────────────────────────────

/// Parse a return statement: `return [expr]`.
///
/// The value is optional; a bare `return` before a newline, `end`, or
/// `else` returns nothing.
pub(crate) fn parse_return_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // return

    if !p.at_any(&[
        SyntaxKind::NEWLINE,
        SyntaxKind::SEMICOLON,
        SyntaxKind::END_KW,
        SyntaxKind::ELSE_KW,
        SyntaxKind::EOF,
    ]) {
        expr(p);
    }

    p.close(m, SyntaxKind::RETURN_STMT);
}

// ── If Statement ─────────────────────────────────────────────────────────

/// Parse an if statement: `if cond do body [else body | else if ...] end`.
pub(crate) fn parse_if_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // if

    expr(p);

    let do_span = p.current_span();
    p.expect(SyntaxKind::DO_KW);

    if !p.has_error() {
        parse_block_body(p);
    }

    if p.at(SyntaxKind::ELSE_KW) {
        let branch = p.open();
        p.advance(); // else
        if p.at(SyntaxKind::IF_KW) {
            // `else if`: a nested if statement with its own `end`.
            parse_if_stmt(p);
        } else {
            parse_block_body(p);
        }
        p.close(branch, SyntaxKind::ELSE_BRANCH);
    }

    if !p.at(SyntaxKind::END_KW) {
        if !p.has_error() {
            p.error_with_related(
                "expected `end` to close if statement",
                do_span,
                "`do` block started here",
            );
        }
    } else {
        p.advance(); // end
    }

    p.close(m, SyntaxKind::IF_STMT);
}

// ── While Statement ──────────────────────────────────────────────────────

/// Parse a while loop: `while cond do body end`.
pub(crate) fn parse_while_stmt(p: &mut Parser) {
    let m = p.open();
    p.advance(); // while

    expr(p);

    let do_span = p.current_span();
    p.expect(SyntaxKind::DO_KW);

    if !p.has_error() {
        parse_block_body(p);
    }

    if !p.at(SyntaxKind::END_KW) {
        p.error_with_related(
            "expected `end` to close while body",
            do_span,
            "`do` block started here",
        );
    } else {
        p.advance(); // end
    }

    p.close(m, SyntaxKind::WHILE_STMT);
}
