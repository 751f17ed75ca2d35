//! The type inference engine.
//!
//! `guess_type` computes the set of possible runtime types of an expression
//! by dispatching over the closed set of expression kinds. Every case is a
//! leaf except member access, which consults the field index and walks
//! class-hierarchy chains, and calls, which infer through constructors and
//! function return statements.
//!
//! The engine is total: it never fails, it only degrades. A recursion-guard
//! rejection, an unresolved name, or a missing index entry each shrink the
//! answer (possibly to the unknown set) instead of raising an error --
//! better an incomplete answer than non-termination.

use tarn_parser::ast::expr::{BinaryExpr, CallExpr, Expr, Literal, NameRef, UnaryExpr};
use tarn_parser::ast::item::AssignStmt;
use tarn_parser::ast::AstNode;
use tarn_parser::{SyntaxKind, SyntaxNode};

use rustc_hash::FxHashSet;

use crate::context::{InferCtx, InferOp, NodePtr};
use crate::index::{FieldDecl, FieldDeclKind};
use crate::resolve::{self, Declaration};
use crate::ty::{Ty, TypeSet};
use crate::Analysis;

/// Infer the type-set of an arbitrary expression node.
///
/// Non-expression nodes produce the empty set.
pub(crate) fn guess_type(db: &Analysis, node: &SyntaxNode, ctx: &mut InferCtx) -> TypeSet {
    let Some(expr) = Expr::cast(node.clone()) else {
        return TypeSet::empty();
    };
    match expr {
        Expr::Literal(lit) => literal_type(&lit)
            .map(TypeSet::singleton)
            .unwrap_or_else(TypeSet::empty),
        Expr::NameRef(name_ref) => infer_name_ref(db, &name_ref, ctx),
        Expr::SelfExpr(_) => infer_self(node),
        Expr::ParenExpr(paren) => paren
            .inner()
            .map(|inner| guess_type(db, inner.syntax(), ctx))
            .unwrap_or_else(TypeSet::empty),
        Expr::BinaryExpr(binary) => infer_binary(db, &binary, ctx),
        Expr::UnaryExpr(unary) => infer_unary(&unary),
        Expr::CallExpr(call) => infer_call(db, &call, ctx),
        Expr::FieldAccess(_) | Expr::IndexExpr(_) => infer_member(db, node, ctx),
        Expr::TableExpr(_) => TypeSet::singleton(Ty::Table),
        Expr::ClosureExpr(_) => TypeSet::singleton(Ty::Function),
    }
}

/// The type of a literal token.
pub(crate) fn literal_type(lit: &Literal) -> Option<Ty> {
    let token = lit.token()?;
    match token.kind() {
        SyntaxKind::INT_LITERAL | SyntaxKind::FLOAT_LITERAL => Some(Ty::Number),
        SyntaxKind::STRING_LITERAL => Some(Ty::Str),
        SyntaxKind::TRUE_KW | SyntaxKind::FALSE_KW => Some(Ty::Bool),
        SyntaxKind::NIL_KW => Some(Ty::Nil),
        _ => None,
    }
}

/// Member-access key: the base expression and the field name.
///
/// Field accesses use the identifier after the dot; index expressions
/// qualify only when the key is a string literal (`t["size"]` behaves as
/// `t.size`). Dynamic keys have no statically known field.
pub(crate) fn member_key(expr: &Expr) -> Option<(Expr, String)> {
    match expr {
        Expr::FieldAccess(fa) => Some((fa.base()?, fa.field_name()?)),
        Expr::IndexExpr(ix) => {
            let base = ix.base()?;
            let key = match ix.index()? {
                Expr::Literal(lit) => lit.string_value()?,
                _ => return None,
            };
            Some((base, key))
        }
        _ => None,
    }
}

// ── Name references ────────────────────────────────────────────────────

/// Infer a name reference through its declaration.
fn infer_name_ref(db: &Analysis, name_ref: &NameRef, ctx: &mut InferCtx) -> TypeSet {
    match db.resolve_name_ref(name_ref) {
        Some(Declaration::Local(let_stmt)) => let_stmt
            .value()
            .map(|value| guess_type(db, value.syntax(), ctx))
            .unwrap_or_else(TypeSet::unknown),
        // A parameter's type depends on call sites; not inferred here.
        Some(Declaration::Param(_)) => TypeSet::unknown(),
        Some(Declaration::Func(_)) => TypeSet::singleton(Ty::Function),
        Some(Declaration::Class(class)) => class
            .name()
            .and_then(|n| n.text())
            .map(|name| TypeSet::singleton(Ty::Class(name)))
            .unwrap_or_else(TypeSet::unknown),
        // Unresolved: treat as a global of unknown type.
        None => TypeSet::unknown(),
    }
}

/// `self` carries the enclosing class type.
fn infer_self(node: &SyntaxNode) -> TypeSet {
    resolve::enclosing_class(node)
        .and_then(|class| class.name())
        .and_then(|name| name.text())
        .map(|name| TypeSet::singleton(Ty::Class(name)))
        .unwrap_or_else(TypeSet::unknown)
}

// ── Operators ──────────────────────────────────────────────────────────

/// Infer a binary expression from its operator.
///
/// `and`/`or` return one of their operands at runtime, so their type-set is
/// the union of both operand sets. Arithmetic, concatenation, and
/// comparison have fixed result types.
fn infer_binary(db: &Analysis, binary: &BinaryExpr, ctx: &mut InferCtx) -> TypeSet {
    let Some(op) = binary.op() else {
        return TypeSet::empty();
    };
    match op.kind() {
        SyntaxKind::AND_KW | SyntaxKind::OR_KW => {
            let lhs = binary
                .lhs()
                .map(|e| guess_type(db, e.syntax(), ctx))
                .unwrap_or_else(TypeSet::empty);
            let rhs = binary
                .rhs()
                .map(|e| guess_type(db, e.syntax(), ctx))
                .unwrap_or_else(TypeSet::empty);
            lhs.union(&rhs)
        }
        SyntaxKind::EQ_EQ
        | SyntaxKind::NOT_EQ
        | SyntaxKind::LT
        | SyntaxKind::GT
        | SyntaxKind::LT_EQ
        | SyntaxKind::GT_EQ => TypeSet::singleton(Ty::Bool),
        SyntaxKind::DOT_DOT => TypeSet::singleton(Ty::Str),
        SyntaxKind::PLUS
        | SyntaxKind::MINUS
        | SyntaxKind::STAR
        | SyntaxKind::SLASH
        | SyntaxKind::PERCENT => TypeSet::singleton(Ty::Number),
        _ => TypeSet::empty(),
    }
}

/// Infer a unary expression from its operator.
fn infer_unary(unary: &UnaryExpr) -> TypeSet {
    match unary.op().map(|op| op.kind()) {
        Some(SyntaxKind::MINUS) => TypeSet::singleton(Ty::Number),
        Some(SyntaxKind::NOT_KW) => TypeSet::singleton(Ty::Bool),
        _ => TypeSet::empty(),
    }
}

// ── Calls ──────────────────────────────────────────────────────────────

/// Infer a call expression.
///
/// Every class among the callee's types contributes an instance of that
/// class (constructor call). A callee that resolves to a named function or
/// a closure-valued local contributes the function's inferred return set;
/// a field-access callee contributes the return sets of matching class
/// methods, superclass walk included.
fn infer_call(db: &Analysis, call: &CallExpr, ctx: &mut InferCtx) -> TypeSet {
    let Some(callee) = call.callee() else {
        return TypeSet::empty();
    };

    let callee_types = guess_type(db, callee.syntax(), ctx);
    let mut result = if callee_types.is_unknown() {
        TypeSet::unknown()
    } else {
        TypeSet::empty()
    };
    for ty in callee_types.members() {
        if let Ty::Class(name) = ty {
            result = result.union(&TypeSet::singleton(Ty::Class(name.clone())));
        }
    }

    match &callee {
        Expr::NameRef(name_ref) => match db.resolve_name_ref(name_ref) {
            Some(Declaration::Func(fn_def)) => {
                result = result.union(&return_types(db, fn_def.syntax(), ctx));
            }
            Some(Declaration::Local(let_stmt)) => {
                if let Some(Expr::ClosureExpr(closure)) = let_stmt.value() {
                    result = result.union(&return_types(db, closure.syntax(), ctx));
                }
            }
            _ => {}
        },
        Expr::FieldAccess(fa) => {
            if let (Some(base), Some(field)) = (fa.base(), fa.field_name()) {
                let prefix = guess_type(db, base.syntax(), ctx);
                for ty in prefix.members() {
                    if let Ty::Class(owner) = ty {
                        for decl in lookup_field_decls(db, owner, &field) {
                            if decl.kind == FieldDeclKind::Method {
                                result = result.union(&return_types(db, decl.syntax(), ctx));
                            }
                        }
                    }
                }
            }
        }
        _ => {}
    }

    result
}

/// Infer the return type-set of a function or closure definition.
///
/// Guarded by `(fn, GuessReturnType)`: recursive and mutually recursive
/// functions terminate with the unknown set at the point the cycle closes.
fn return_types(db: &Analysis, fn_node: &SyntaxNode, ctx: &mut InferCtx) -> TypeSet {
    let Some(ptr) = db.ptr(fn_node) else {
        return TypeSet::empty();
    };
    if !ctx.push(ptr, InferOp::GuessReturnType) {
        return TypeSet::unknown();
    }
    let result = return_types_inner(db, fn_node, ctx);
    ctx.pop(ptr);
    result
}

fn return_types_inner(db: &Analysis, fn_node: &SyntaxNode, ctx: &mut InferCtx) -> TypeSet {
    match fn_node.kind() {
        SyntaxKind::FN_DEF => {
            let Some(fn_def) = tarn_parser::ast::item::FnDef::cast(fn_node.clone()) else {
                return TypeSet::empty();
            };
            fn_def
                .body()
                .map(|body| collect_returns(db, body.syntax(), ctx))
                .unwrap_or_else(TypeSet::empty)
        }
        SyntaxKind::CLOSURE_EXPR => {
            let Some(closure) = tarn_parser::ast::expr::ClosureExpr::cast(fn_node.clone()) else {
                return TypeSet::empty();
            };
            if let Some(arrow) = closure.arrow_body() {
                // The arrow expression is the return value.
                return guess_type(db, arrow.syntax(), ctx);
            }
            closure
                .body()
                .map(|body| collect_returns(db, body.syntax(), ctx))
                .unwrap_or_else(TypeSet::empty)
        }
        _ => TypeSet::empty(),
    }
}

/// Union the types of every `return` statement in a function body, without
/// descending into nested function bodies.
fn collect_returns(db: &Analysis, node: &SyntaxNode, ctx: &mut InferCtx) -> TypeSet {
    let mut result = TypeSet::empty();
    for child in node.children() {
        match child.kind() {
            // Nested functions own their returns.
            SyntaxKind::FN_DEF | SyntaxKind::CLOSURE_EXPR => {}
            SyntaxKind::RETURN_STMT => {
                let value = tarn_parser::ast::item::ReturnStmt::cast(child)
                    .and_then(|ret| ret.value());
                result = match value {
                    Some(expr) => result.union(&guess_type(db, expr.syntax(), ctx)),
                    // A bare return produces nil.
                    None => result.union(&TypeSet::singleton(Ty::Nil)),
                };
            }
            _ => result = result.union(&collect_returns(db, &child, ctx)),
        }
    }
    result
}

// ── Member access ──────────────────────────────────────────────────────

/// Infer a member access (`a.b` or `a["b"]`).
///
/// The guarded core of the engine: push the `(node, GuessType)` frame,
/// reject with the unknown set on cycle or overflow, otherwise union the
/// declaration's own assigned value type with the field contributions of
/// every candidate owner type, then pop.
fn infer_member(db: &Analysis, node: &SyntaxNode, ctx: &mut InferCtx) -> TypeSet {
    let Some(ptr) = db.ptr(node) else {
        return TypeSet::empty();
    };
    if !ctx.push(ptr, InferOp::GuessType) {
        // Deliberate incompleteness, not an error.
        return TypeSet::unknown();
    }
    let result = infer_member_inner(db, node, ptr, ctx);
    ctx.pop(ptr);
    result
}

fn infer_member_inner(
    db: &Analysis,
    node: &SyntaxNode,
    ptr: NodePtr,
    ctx: &mut InferCtx,
) -> TypeSet {
    let Some(expr) = Expr::cast(node.clone()) else {
        return TypeSet::empty();
    };

    // The member's own declared value type (when this access is an
    // assignment target): stub fast path, else infer the assigned
    // expression.
    let mut result = assigned_value_types(db, node, ptr, ctx);

    let Some((base, field)) = member_key(&expr) else {
        return result;
    };

    // The owner/prefix type-set.
    let prefix = guess_type(db, base.syntax(), ctx);
    if prefix.is_unknown() {
        result = result.union(&TypeSet::unknown());
    }
    for ty in prefix.members() {
        if let Ty::Class(owner) = ty {
            result = result.union(&guess_field_type(db, owner, &field, ptr, ctx));
        }
    }

    result
}

/// The assigned value type of a member access used as an assignment target.
///
/// Reads (`print(p.x)`) contribute nothing here; their type comes entirely
/// from the field walk.
fn assigned_value_types(
    db: &Analysis,
    node: &SyntaxNode,
    ptr: NodePtr,
    ctx: &mut InferCtx,
) -> TypeSet {
    let Some(assign) = node.parent().and_then(AssignStmt::cast) else {
        return TypeSet::empty();
    };
    let is_target = assign
        .target()
        .is_some_and(|target| target.syntax() == node);
    if !is_target {
        return TypeSet::empty();
    }

    // Stub fast path: the index precomputed this site's shallow value type.
    if let Some(stub) = db.fields().stub_for(ptr) {
        return stub.clone();
    }

    assign
        .value()
        .map(|value| guess_type(db, value.syntax(), ctx))
        .unwrap_or_else(TypeSet::empty)
}

/// All field contributions of `(owner, field)`, following the
/// single-inheritance chain when the type itself declares nothing.
///
/// If one of the declarations is the node currently being inferred, the
/// accumulated set is returned immediately -- that closes self-referential
/// field cycles without recursing further.
fn guess_field_type(
    db: &Analysis,
    owner: &str,
    field: &str,
    current: NodePtr,
    ctx: &mut InferCtx,
) -> TypeSet {
    let mut set = TypeSet::empty();
    for decl in lookup_field_decls(db, owner, field) {
        if decl.ptr == current {
            return set;
        }
        set = set.union(&field_decl_types(db, decl, ctx));
    }
    set
}

/// The declaration sites of `(owner, field)`, walking up the superclass
/// chain until some type declares the field or the chain ends.
///
/// Cyclic `extends` chains are cut by a visited set; the walk itself is
/// deterministic and cheap, so it does not consume guard depth.
fn lookup_field_decls<'db>(db: &'db Analysis, owner: &str, field: &str) -> &'db [FieldDecl] {
    let mut visited: FxHashSet<String> = FxHashSet::default();
    let mut current = owner.to_string();
    loop {
        if !visited.insert(current.clone()) {
            return &[];
        }
        let decls = db.fields().find_all(&current, field);
        if !decls.is_empty() {
            return decls;
        }
        match db.classes().superclass_of(&current) {
            Some(superclass) => current = superclass.to_string(),
            None => return &[],
        }
    }
}

/// The value types contributed by one field declaration site.
fn field_decl_types(db: &Analysis, decl: &FieldDecl, ctx: &mut InferCtx) -> TypeSet {
    if let Some(stub) = &decl.stub {
        return stub.clone();
    }
    match decl.kind {
        FieldDeclKind::ClassField => decl
            .value_expr()
            .map(|value| guess_type(db, value.syntax(), ctx))
            .unwrap_or_else(TypeSet::empty),
        // Full member inference on the declaration site itself; the guard
        // bounds the recursion.
        FieldDeclKind::Assign => guess_type(db, decl.syntax(), ctx),
        // Methods always carry a stub; this arm is unreachable in practice.
        FieldDeclKind::Method => TypeSet::singleton(Ty::Function),
    }
}
