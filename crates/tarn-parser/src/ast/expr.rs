//! Typed AST nodes for expressions.
//!
//! Covers all Tarn expression forms: literals, name references, `self`,
//! binary/unary operators, calls, field access, index access, table
//! constructors, closures, and grouping.

use crate::ast::item::{Block, ParamList};
use crate::ast::{ast_node, child_node, child_token, AstNode};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

// ── Expr enum ────────────────────────────────────────────────────────────

/// Any expression node.
///
/// This is the closed set of expression kinds; the inference engine matches
/// it exhaustively so a new expression form is a compile-time concern there.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    NameRef(NameRef),
    SelfExpr(SelfExpr),
    ParenExpr(ParenExpr),
    BinaryExpr(BinaryExpr),
    UnaryExpr(UnaryExpr),
    CallExpr(CallExpr),
    FieldAccess(FieldAccess),
    IndexExpr(IndexExpr),
    TableExpr(TableExpr),
    ClosureExpr(ClosureExpr),
}

impl Expr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::LITERAL => Some(Expr::Literal(Literal { syntax: node })),
            SyntaxKind::NAME_REF => Some(Expr::NameRef(NameRef { syntax: node })),
            SyntaxKind::SELF_EXPR => Some(Expr::SelfExpr(SelfExpr { syntax: node })),
            SyntaxKind::PAREN_EXPR => Some(Expr::ParenExpr(ParenExpr { syntax: node })),
            SyntaxKind::BINARY_EXPR => Some(Expr::BinaryExpr(BinaryExpr { syntax: node })),
            SyntaxKind::UNARY_EXPR => Some(Expr::UnaryExpr(UnaryExpr { syntax: node })),
            SyntaxKind::CALL_EXPR => Some(Expr::CallExpr(CallExpr { syntax: node })),
            SyntaxKind::FIELD_ACCESS => Some(Expr::FieldAccess(FieldAccess { syntax: node })),
            SyntaxKind::INDEX_EXPR => Some(Expr::IndexExpr(IndexExpr { syntax: node })),
            SyntaxKind::TABLE_EXPR => Some(Expr::TableExpr(TableExpr { syntax: node })),
            SyntaxKind::CLOSURE_EXPR => Some(Expr::ClosureExpr(ClosureExpr { syntax: node })),
            _ => None,
        }
    }

    /// Access the underlying syntax node regardless of variant.
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(n) => &n.syntax,
            Expr::NameRef(n) => &n.syntax,
            Expr::SelfExpr(n) => &n.syntax,
            Expr::ParenExpr(n) => &n.syntax,
            Expr::BinaryExpr(n) => &n.syntax,
            Expr::UnaryExpr(n) => &n.syntax,
            Expr::CallExpr(n) => &n.syntax,
            Expr::FieldAccess(n) => &n.syntax,
            Expr::IndexExpr(n) => &n.syntax,
            Expr::TableExpr(n) => &n.syntax,
            Expr::ClosureExpr(n) => &n.syntax,
        }
    }
}

// ── Literal ──────────────────────────────────────────────────────────────

ast_node!(Literal, LITERAL);

impl Literal {
    /// The literal token (INT_LITERAL, FLOAT_LITERAL, STRING_LITERAL,
    /// TRUE_KW, FALSE_KW, NIL_KW).
    pub fn token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .next()
    }

    /// For string literals, the content with the surrounding quotes removed.
    ///
    /// Escape sequences are left as written; the inference layer only needs
    /// the text for field-name keys like `t["size"]`.
    pub fn string_value(&self) -> Option<String> {
        let token = self.token()?;
        if token.kind() != SyntaxKind::STRING_LITERAL {
            return None;
        }
        let text = token.text();
        let inner = text.strip_prefix('"')?.strip_suffix('"')?;
        Some(inner.to_string())
    }
}

// ── Name Reference ───────────────────────────────────────────────────────

ast_node!(NameRef, NAME_REF);

impl NameRef {
    /// The identifier text.
    pub fn text(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }
}

// ── Self Expression ──────────────────────────────────────────────────────

ast_node!(SelfExpr, SELF_EXPR);

// ── Parenthesised Expression ─────────────────────────────────────────────

ast_node!(ParenExpr, PAREN_EXPR);

impl ParenExpr {
    /// The inner expression.
    pub fn inner(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

// ── Binary Expression ────────────────────────────────────────────────────

ast_node!(BinaryExpr, BINARY_EXPR);

impl BinaryExpr {
    /// The left-hand side expression.
    pub fn lhs(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    /// The right-hand side expression.
    pub fn rhs(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }

    /// The operator token.
    pub fn op(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| {
                matches!(
                    t.kind(),
                    SyntaxKind::PLUS
                        | SyntaxKind::MINUS
                        | SyntaxKind::STAR
                        | SyntaxKind::SLASH
                        | SyntaxKind::PERCENT
                        | SyntaxKind::EQ_EQ
                        | SyntaxKind::NOT_EQ
                        | SyntaxKind::LT
                        | SyntaxKind::GT
                        | SyntaxKind::LT_EQ
                        | SyntaxKind::GT_EQ
                        | SyntaxKind::AND_KW
                        | SyntaxKind::OR_KW
                        | SyntaxKind::DOT_DOT
                )
            })
    }
}

// ── Unary Expression ─────────────────────────────────────────────────────

ast_node!(UnaryExpr, UNARY_EXPR);

impl UnaryExpr {
    /// The operator token.
    pub fn op(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| matches!(t.kind(), SyntaxKind::MINUS | SyntaxKind::NOT_KW))
    }

    /// The operand expression.
    pub fn operand(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

// ── Call Expression ──────────────────────────────────────────────────────

ast_node!(CallExpr, CALL_EXPR);

impl CallExpr {
    /// The callee expression (function being called).
    pub fn callee(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    /// The argument list.
    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }
}

ast_node!(ArgList, ARG_LIST);

impl ArgList {
    /// All argument expressions.
    pub fn args(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

// ── Field Access ─────────────────────────────────────────────────────────

ast_node!(FieldAccess, FIELD_ACCESS);

impl FieldAccess {
    /// The expression being accessed (left of the dot).
    pub fn base(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    /// The field name token (the IDENT after the dot).
    pub fn field(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .last()
    }

    /// The field name as a string.
    pub fn field_name(&self) -> Option<String> {
        self.field().map(|t| t.text().to_string())
    }
}

// ── Index Expression ─────────────────────────────────────────────────────

ast_node!(IndexExpr, INDEX_EXPR);

impl IndexExpr {
    /// The expression being indexed.
    pub fn base(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    /// The index expression (inside brackets).
    pub fn index(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }
}

// ── Table Constructor ────────────────────────────────────────────────────

ast_node!(TableExpr, TABLE_EXPR);

impl TableExpr {
    /// The named entries (`a = 1`) of the constructor.
    pub fn fields(&self) -> impl Iterator<Item = TableField> + '_ {
        self.syntax.children().filter_map(TableField::cast)
    }
}

ast_node!(TableField, TABLE_FIELD);

impl TableField {
    /// The entry name.
    pub fn name(&self) -> Option<super::item::Name> {
        child_node(&self.syntax)
    }

    /// The entry value expression.
    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

// ── Closure Expression ───────────────────────────────────────────────────

ast_node!(ClosureExpr, CLOSURE_EXPR);

impl ClosureExpr {
    /// The parameter list.
    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    /// The closure body block (for `fn (x) do ... end` closures).
    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    /// The arrow-body expression (for `fn (x) -> expr end` closures).
    ///
    /// Blocks are not expressions, so the first castable child is the arrow
    /// body when present.
    pub fn arrow_body(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}
