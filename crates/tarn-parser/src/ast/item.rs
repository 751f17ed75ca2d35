//! Typed AST nodes for statements and declarations.
//!
//! Covers `let` bindings, assignments, function and class definitions,
//! parameters, blocks, and the `return`/`if`/`while` statements.

use crate::ast::expr::{Expr, NameRef};
use crate::ast::{ast_node, child_node, child_nodes, child_token, AstNode};
use crate::cst::SyntaxNode;
use crate::syntax_kind::SyntaxKind;

// ── Name (definition position) ───────────────────────────────────────────

ast_node!(Name, NAME);

impl Name {
    /// The identifier text.
    pub fn text(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }
}

// ── Let Binding ──────────────────────────────────────────────────────────

ast_node!(LetStmt, LET_STMT);

impl LetStmt {
    /// The bound name.
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// The initialiser expression.
    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

// ── Assignment ───────────────────────────────────────────────────────────

ast_node!(AssignStmt, ASSIGN_STMT);

impl AssignStmt {
    /// The assignment target (a name reference, field access, or index
    /// expression).
    pub fn target(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    /// The assigned value expression.
    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().filter_map(Expr::cast).nth(1)
    }
}

// ── Function Definition ──────────────────────────────────────────────────

ast_node!(FnDef, FN_DEF);

impl FnDef {
    /// The function name.
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// The parameter list.
    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    /// The body block.
    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    /// Whether this definition is a method (a direct child of a class body).
    pub fn is_method(&self) -> bool {
        self.syntax
            .parent()
            .is_some_and(|p| p.kind() == SyntaxKind::CLASS_DEF)
    }
}

ast_node!(ParamList, PARAM_LIST);

impl ParamList {
    /// All parameters.
    pub fn params(&self) -> impl Iterator<Item = Param> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(Param, PARAM);

impl Param {
    /// The parameter name.
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }
}

// ── Class Definition ─────────────────────────────────────────────────────

ast_node!(ClassDef, CLASS_DEF);

impl ClassDef {
    /// The class name.
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// The superclass clause, if present.
    pub fn superclass(&self) -> Option<Superclass> {
        child_node(&self.syntax)
    }

    /// The field statements in the class body.
    pub fn fields(&self) -> impl Iterator<Item = ClassField> + '_ {
        child_nodes(&self.syntax)
    }

    /// The method definitions in the class body.
    pub fn methods(&self) -> impl Iterator<Item = FnDef> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(Superclass, SUPERCLASS);

impl Superclass {
    /// The referenced superclass name.
    pub fn name_ref(&self) -> Option<NameRef> {
        child_node(&self.syntax)
    }

    /// The superclass name as a string.
    pub fn text(&self) -> Option<String> {
        self.name_ref().and_then(|n| n.text())
    }
}

ast_node!(ClassField, CLASS_FIELD);

impl ClassField {
    /// The field name.
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    /// The field initialiser expression.
    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

// ── Block ────────────────────────────────────────────────────────────────

ast_node!(Block, BLOCK);

// ── Return Statement ─────────────────────────────────────────────────────

ast_node!(ReturnStmt, RETURN_STMT);

impl ReturnStmt {
    /// The returned expression, if present.
    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

// ── If Statement ─────────────────────────────────────────────────────────

ast_node!(IfStmt, IF_STMT);

impl IfStmt {
    /// The condition expression.
    pub fn condition(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    /// The then-branch block.
    pub fn then_branch(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    /// The else branch, if present.
    pub fn else_branch(&self) -> Option<ElseBranch> {
        child_node(&self.syntax)
    }
}

ast_node!(ElseBranch, ELSE_BRANCH);

impl ElseBranch {
    /// The else block (for plain `else ... end`).
    pub fn block(&self) -> Option<Block> {
        child_node(&self.syntax)
    }

    /// The chained `if` statement (for `else if ...`).
    pub fn if_stmt(&self) -> Option<IfStmt> {
        child_node(&self.syntax)
    }
}

// ── While Statement ──────────────────────────────────────────────────────

ast_node!(WhileStmt, WHILE_STMT);

impl WhileStmt {
    /// The loop condition expression.
    pub fn condition(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }

    /// The loop body block.
    pub fn body(&self) -> Option<Block> {
        child_node(&self.syntax)
    }
}
