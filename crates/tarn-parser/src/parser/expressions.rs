//! Pratt expression parser for Tarn.
//!
//! Implements operator precedence parsing using binding power tables.
//! Handles all Tarn expression forms: literals, identifiers, `self`,
//! binary/unary operators, function calls, field access, indexing,
//! table constructors, closures, and grouping.

use crate::syntax_kind::SyntaxKind;

use super::{MarkClosed, Parser};

// ── Binding Power Tables ───────────────────────────────────────────────

/// Returns (left_bp, right_bp) for infix operators.
///
/// Left < right means left-associative (the usual case).
/// Returns `None` if the token is not an infix operator.
fn infix_binding_power(op: SyntaxKind) -> Option<(u8, u8)> {
    match op {
        // Logical OR: lowest precedence, left-associative
        SyntaxKind::OR_KW => Some((1, 2)),

        // Logical AND
        SyntaxKind::AND_KW => Some((3, 4)),

        // Equality and comparison
        SyntaxKind::EQ_EQ
        | SyntaxKind::NOT_EQ
        | SyntaxKind::LT
        | SyntaxKind::GT
        | SyntaxKind::LT_EQ
        | SyntaxKind::GT_EQ => Some((5, 6)),

        // Concatenation
        SyntaxKind::DOT_DOT => Some((7, 8)),

        // Additive
        SyntaxKind::PLUS | SyntaxKind::MINUS => Some((9, 10)),

        // Multiplicative
        SyntaxKind::STAR | SyntaxKind::SLASH | SyntaxKind::PERCENT => Some((11, 12)),

        _ => None,
    }
}

/// Returns ((), right_bp) for prefix operators.
fn prefix_binding_power(op: SyntaxKind) -> Option<((), u8)> {
    match op {
        SyntaxKind::MINUS => Some(((), 13)),
        SyntaxKind::NOT_KW => Some(((), 13)),
        _ => None,
    }
}

/// Postfix operations (call, field access, indexing) have implicit binding
/// power of 15, tighter than all prefix and infix operators.
const POSTFIX_BP: u8 = 15;

// ── Expression Entry Point ─────────────────────────────────────────────

/// Parse an expression at the default (lowest) binding power.
pub(crate) fn expr(p: &mut Parser) -> Option<MarkClosed> {
    expr_bp(p, 0)
}

/// Parse an expression with the given minimum binding power.
///
/// This is the core Pratt parsing loop. It first parses an atom or prefix
/// expression (the LHS), then loops over postfix and infix operators,
/// consuming them as long as their binding power exceeds `min_bp`.
fn expr_bp(p: &mut Parser, min_bp: u8) -> Option<MarkClosed> {
    let mut lhs = lhs(p)?;

    loop {
        if p.has_error() {
            break;
        }

        let current = p.current();

        // ── Postfix: function call ──
        if current == SyntaxKind::L_PAREN && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            parse_arg_list(p);
            lhs = p.close(m, SyntaxKind::CALL_EXPR);
            continue;
        }

        // ── Postfix: field access ──
        if current == SyntaxKind::DOT && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // .
            p.expect(SyntaxKind::IDENT);
            lhs = p.close(m, SyntaxKind::FIELD_ACCESS);
            continue;
        }

        // ── Postfix: index access ──
        if current == SyntaxKind::L_BRACKET && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // [
            expr_bp(p, 0);
            p.expect(SyntaxKind::R_BRACKET);
            lhs = p.close(m, SyntaxKind::INDEX_EXPR);
            continue;
        }

        // ── Infix operators ──
        if let Some((l_bp, r_bp)) = infix_binding_power(current) {
            if l_bp < min_bp {
                break;
            }

            let m = p.open_before(lhs);
            p.advance(); // operator
            expr_bp(p, r_bp);
            lhs = p.close(m, SyntaxKind::BINARY_EXPR);
            continue;
        }

        break;
    }

    Some(lhs)
}

// ── Atom / Prefix Parsing (LHS) ───────────────────────────────────────

/// Parse the left-hand side of an expression: an atom or a prefix operator.
fn lhs(p: &mut Parser) -> Option<MarkClosed> {
    let current = p.current();

    // ── Prefix operators ──
    if let Some(((), r_bp)) = prefix_binding_power(current) {
        let m = p.open();
        p.advance(); // operator
        expr_bp(p, r_bp);
        return Some(p.close(m, SyntaxKind::UNARY_EXPR));
    }

    // ── Atoms ──
    match current {
        // Literals
        SyntaxKind::INT_LITERAL
        | SyntaxKind::FLOAT_LITERAL
        | SyntaxKind::STRING_LITERAL
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::NIL_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::LITERAL))
        }

        // Identifier
        SyntaxKind::IDENT => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::NAME_REF))
        }

        // self
        SyntaxKind::SELF_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::SELF_EXPR))
        }

        // Grouped expression
        SyntaxKind::L_PAREN => {
            let m = p.open();
            p.advance(); // (
            expr_bp(p, 0);
            p.expect(SyntaxKind::R_PAREN);
            Some(p.close(m, SyntaxKind::PAREN_EXPR))
        }

        // Table constructor
        SyntaxKind::L_BRACE => Some(parse_table_expr(p)),

        // Closure
        SyntaxKind::FN_KW => Some(parse_closure(p)),

        _ => {
            p.error("expected expression");
            None
        }
    }
}

// ── Argument List ──────────────────────────────────────────────────────

/// Parse an argument list: `(expr, expr, ...)`.
fn parse_arg_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // (

    if !p.at(SyntaxKind::R_PAREN) {
        expr_bp(p, 0);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_PAREN) {
                break; // trailing comma
            }
            expr_bp(p, 0);
        }
    }

    p.expect(SyntaxKind::R_PAREN);
    p.close(m, SyntaxKind::ARG_LIST);
}

// ── Table Constructor ──────────────────────────────────────────────────

/// Parse a table constructor: `{ a = 1, 2, b = 3 }`.
///
/// Entries are either named (`ident = expr`, wrapped in TABLE_FIELD) or
/// positional bare expressions. Newlines inside the braces are
/// insignificant (delimiter depth tracking).
fn parse_table_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // {

    if !p.at(SyntaxKind::R_BRACE) {
        parse_table_entry(p);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_BRACE) {
                break; // trailing comma
            }
            parse_table_entry(p);
        }
    }

    p.expect(SyntaxKind::R_BRACE);
    p.close(m, SyntaxKind::TABLE_EXPR)
}

/// Parse one table entry: `ident = expr` or a bare expression.
fn parse_table_entry(p: &mut Parser) {
    if p.at(SyntaxKind::IDENT) && p.nth(1) == SyntaxKind::EQ {
        let m = p.open();
        let name = p.open();
        p.advance(); // ident
        p.close(name, SyntaxKind::NAME);
        p.advance(); // =
        expr_bp(p, 0);
        p.close(m, SyntaxKind::TABLE_FIELD);
    } else {
        expr_bp(p, 0);
    }
}

// ── Closures ───────────────────────────────────────────────────────────

/// Parse a closure expression:
/// `fn (params) do body end` or `fn (params) -> expr end`.
pub(crate) fn parse_closure(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // fn

    if p.at(SyntaxKind::L_PAREN) {
        parse_param_list(p);
    } else {
        p.error("expected closure parameter list");
    }

    if p.eat(SyntaxKind::ARROW) {
        // Arrow body: a single expression.
        expr_bp(p, 0);
        p.expect(SyntaxKind::END_KW);
    } else {
        let do_span = p.current_span();
        p.expect(SyntaxKind::DO_KW);
        if !p.has_error() {
            parse_block_body(p);
        }
        if !p.at(SyntaxKind::END_KW) {
            p.error_with_related(
                "expected `end` to close closure body",
                do_span,
                "`do` block started here",
            );
        } else {
            p.advance(); // end
        }
    }

    p.close(m, SyntaxKind::CLOSURE_EXPR)
}

// ── Parameter List ─────────────────────────────────────────────────────

/// Parse a parameter list: `(a, b, c)`.
pub(crate) fn parse_param_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // (

    if !p.at(SyntaxKind::R_PAREN) {
        parse_param(p);
        while p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_PAREN) {
                break; // trailing comma
            }
            parse_param(p);
        }
    }

    p.expect(SyntaxKind::R_PAREN);
    p.close(m, SyntaxKind::PARAM_LIST);
}

/// Parse a single parameter: an identifier wrapped in PARAM/NAME.
fn parse_param(p: &mut Parser) {
    let m = p.open();
    if p.at(SyntaxKind::IDENT) {
        let name = p.open();
        p.advance();
        p.close(name, SyntaxKind::NAME);
    } else {
        p.error("expected parameter name");
    }
    p.close(m, SyntaxKind::PARAM);
}

// ── Block Parsing ─────────────────────────────────────────────────────

/// Parse a block body: a sequence of statements separated by newlines or
/// semicolons, until END_KW, ELSE_KW, or EOF.
pub(crate) fn parse_block_body(p: &mut Parser) {
    let m = p.open();

    loop {
        p.eat_newlines();
        while p.eat(SyntaxKind::SEMICOLON) {
            p.eat_newlines();
        }

        match p.current() {
            SyntaxKind::END_KW | SyntaxKind::ELSE_KW | SyntaxKind::EOF => break,
            _ => {}
        }

        super::parse_stmt(p);

        if p.has_error() {
            break;
        }

        match p.current() {
            SyntaxKind::NEWLINE => {
                p.eat_newlines();
            }
            SyntaxKind::SEMICOLON => {
                // Eaten at top of loop.
            }
            SyntaxKind::END_KW | SyntaxKind::ELSE_KW | SyntaxKind::EOF => {
                // Block terminator -- stop.
            }
            _ => {}
        }
    }

    p.close(m, SyntaxKind::BLOCK);
}
