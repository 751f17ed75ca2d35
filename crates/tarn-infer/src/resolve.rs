//! Declaration resolution and up-value classification.
//!
//! Resolves a name reference to the declaration it denotes by walking the
//! lexical scope chain outward over the CST: at each block scope, binders
//! introduced textually before the reference are considered (so forward
//! references to not-yet-declared locals fail, matching sequential
//! execution), the nearest scope wins, and within a scope the lexically
//! last binder before the reference wins (rebinding shadows).
//!
//! A name no scope can resolve denotes a (possibly undeclared) global;
//! that is a `None` result, never an error.

use tarn_parser::ast::expr::{Expr, NameRef};
use tarn_parser::ast::item::{ClassDef, FnDef, LetStmt, Name, Param, ParamList};
use tarn_parser::ast::{child_node, AstNode};
use tarn_parser::{SyntaxKind, SyntaxNode};

/// A resolved declaration: what a name reference denotes.
#[derive(Debug, Clone)]
pub enum Declaration {
    /// A `let` binding.
    Local(LetStmt),
    /// A function or closure parameter.
    Param(Param),
    /// A named function definition.
    Func(FnDef),
    /// A class definition.
    Class(ClassDef),
}

impl Declaration {
    /// The name node of the declaration.
    pub fn name_node(&self) -> Option<Name> {
        match self {
            Declaration::Local(l) => l.name(),
            Declaration::Param(p) => p.name(),
            Declaration::Func(f) => f.name(),
            Declaration::Class(c) => c.name(),
        }
    }

    /// The declared name.
    pub fn name(&self) -> Option<String> {
        self.name_node().and_then(|n| n.text())
    }

    /// The underlying declaration node.
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Declaration::Local(l) => l.syntax(),
            Declaration::Param(p) => p.syntax(),
            Declaration::Func(f) => f.syntax(),
            Declaration::Class(c) => c.syntax(),
        }
    }
}

/// Resolve a name reference to its declaration via the lexical scope chain.
///
/// Returns `None` when no scope binds the name; the caller treats that as
/// a global. Class names declared in other files are not visible to this
/// walk -- the snapshot layer falls back to its class registry for those.
pub fn resolve_name(name_ref: &NameRef) -> Option<Declaration> {
    let name = name_ref.text()?;
    let ref_node = name_ref.syntax();
    let ref_start = ref_node.text_range().start();

    let mut current = ref_node.parent();
    while let Some(scope) = current {
        match scope.kind() {
            SyntaxKind::BLOCK | SyntaxKind::SOURCE_FILE => {
                if let Some(decl) = search_block(&scope, ref_start, &name) {
                    return Some(decl);
                }
            }
            SyntaxKind::FN_DEF => {
                if let Some(param) = search_param_list(&scope, &name) {
                    return Some(Declaration::Param(param));
                }
                // A named function is visible inside its own body (direct
                // recursion).
                if let Some(fn_def) = FnDef::cast(scope.clone()) {
                    if fn_def.name().and_then(|n| n.text()).as_deref() == Some(name.as_str()) {
                        return Some(Declaration::Func(fn_def));
                    }
                }
            }
            SyntaxKind::CLOSURE_EXPR => {
                if let Some(param) = search_param_list(&scope, &name) {
                    return Some(Declaration::Param(param));
                }
            }
            _ => {}
        }
        current = scope.parent();
    }

    None
}

/// Search one block scope for the lexically last binder of `name` before
/// `ref_start`.
fn search_block(
    scope: &SyntaxNode,
    ref_start: rowan::TextSize,
    name: &str,
) -> Option<Declaration> {
    let mut found = None;

    for child in scope.children() {
        if child.text_range().start() >= ref_start {
            break;
        }
        match child.kind() {
            SyntaxKind::LET_STMT => {
                // A let binder is not in scope inside its own statement, so
                // `let x = x` refers to an outer x.
                if child.text_range().contains(ref_start) {
                    continue;
                }
                if let Some(let_stmt) = LetStmt::cast(child) {
                    if let_stmt.name().and_then(|n| n.text()).as_deref() == Some(name) {
                        found = Some(Declaration::Local(let_stmt));
                    }
                }
            }
            SyntaxKind::FN_DEF => {
                if let Some(fn_def) = FnDef::cast(child) {
                    if fn_def.name().and_then(|n| n.text()).as_deref() == Some(name) {
                        found = Some(Declaration::Func(fn_def));
                    }
                }
            }
            SyntaxKind::CLASS_DEF => {
                if let Some(class) = ClassDef::cast(child) {
                    if class.name().and_then(|n| n.text()).as_deref() == Some(name) {
                        found = Some(Declaration::Class(class));
                    }
                }
            }
            _ => {}
        }
    }

    found
}

/// Search the parameter list of a function or closure node for `name`.
fn search_param_list(fn_node: &SyntaxNode, name: &str) -> Option<Param> {
    let params: ParamList = child_node(fn_node)?;
    let found = params
        .params()
        .find(|p| p.name().and_then(|n| n.text()).as_deref() == Some(name));
    found
}

/// Resolve the base (left-hand side) of a member-access expression to its
/// declaration, independent of type.
///
/// Only name-reference bases resolve; `self`, calls, and nested accesses
/// have no single declaration site.
pub fn resolve_prefix(member_expr: &SyntaxNode) -> Option<Declaration> {
    let base = match Expr::cast(member_expr.clone())? {
        Expr::FieldAccess(fa) => fa.base()?,
        Expr::IndexExpr(ix) => ix.base()?,
        _ => return None,
    };
    match base {
        Expr::NameRef(nr) => resolve_name(&nr),
        _ => None,
    }
}

// ── Up-value classification ────────────────────────────────────────────

/// Whether a reference is an up-value: a local, parameter, or named
/// function captured from an enclosing function scope.
///
/// The reference crosses a function boundary iff the innermost enclosing
/// function body of the declaration differs from that of the use site.
/// For `self`, the binding scope is the enclosing class method. Pure scope
/// structure; scope nesting is finite and acyclic, so no recursion guard
/// is involved.
pub fn is_up_value(node: &SyntaxNode) -> bool {
    match node.kind() {
        SyntaxKind::NAME_REF => {
            let Some(name_ref) = NameRef::cast(node.clone()) else {
                return false;
            };
            let Some(decl) = resolve_name(&name_ref) else {
                // Globals are not captured.
                return false;
            };
            let decl_scope = match &decl {
                Declaration::Local(l) => enclosing_function(l.syntax()),
                Declaration::Param(p) => enclosing_function(p.syntax()),
                Declaration::Func(f) => enclosing_function(f.syntax()),
                Declaration::Class(_) => return false,
            };
            let use_scope = enclosing_function(node);
            decl_scope != use_scope
        }
        SyntaxKind::SELF_EXPR => {
            let Some(method) = enclosing_method(node) else {
                return false;
            };
            enclosing_function(node).as_ref() != Some(&method)
        }
        _ => false,
    }
}

/// The innermost function or closure node strictly enclosing `node`, or
/// `None` at file top level.
pub fn enclosing_function(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.ancestors()
        .skip(1)
        .find(|n| matches!(n.kind(), SyntaxKind::FN_DEF | SyntaxKind::CLOSURE_EXPR))
}

/// The innermost class method (a FN_DEF directly inside a CLASS_DEF)
/// strictly enclosing `node`.
fn enclosing_method(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.ancestors().skip(1).find(|n| {
        n.kind() == SyntaxKind::FN_DEF
            && n.parent().is_some_and(|p| p.kind() == SyntaxKind::CLASS_DEF)
    })
}

/// The innermost class definition enclosing `node`.
pub fn enclosing_class(node: &SyntaxNode) -> Option<ClassDef> {
    node.ancestors().find_map(ClassDef::cast)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_kind(root: &SyntaxNode, kind: SyntaxKind) -> SyntaxNode {
        root.descendants()
            .find(|n| n.kind() == kind)
            .unwrap_or_else(|| panic!("no {kind:?} in tree"))
    }

    /// Resolve the name reference whose text starts at `offset`.
    fn resolve_at(root: &SyntaxNode, offset: u32) -> Option<Declaration> {
        let node = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::NAME_REF)
            .find(|n| n.text_range().start() == offset.into())?;
        resolve_name(&NameRef::cast(node).unwrap())
    }

    /// Offsets in this module's test sources are tree offsets (the lexer
    /// strips spaces), so tests locate references by node text instead.
    fn resolve_ref(root: &SyntaxNode, text: &str, occurrence: usize) -> Option<Declaration> {
        let node = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::NAME_REF && n.text() == text)
            .nth(occurrence)?;
        resolve_name(&NameRef::cast(node).unwrap())
    }

    #[test]
    fn let_binder_resolves_for_later_reference() {
        let parse = tarn_parser::parse("let x = 1\nlet y = x");
        let root = parse.syntax();
        let decl = resolve_ref(&root, "x", 0).expect("x should resolve");
        assert!(matches!(decl, Declaration::Local(_)));
        assert_eq!(decl.name().as_deref(), Some("x"));
    }

    #[test]
    fn forward_reference_does_not_resolve() {
        let parse = tarn_parser::parse("let y = x\nlet x = 1");
        let root = parse.syntax();
        assert!(resolve_ref(&root, "x", 0).is_none());
    }

    #[test]
    fn let_is_not_visible_in_its_own_initialiser() {
        let parse = tarn_parser::parse("let x = 1\nlet x = x");
        let root = parse.syntax();
        // The `x` in the second initialiser resolves to the FIRST let.
        let decl = resolve_ref(&root, "x", 0).expect("x should resolve");
        let first_let = first_kind(&root, SyntaxKind::LET_STMT);
        assert_eq!(decl.syntax(), &first_let);
    }

    #[test]
    fn last_binder_before_reference_wins() {
        let parse = tarn_parser::parse("let v = 1\nlet v = 2\nv");
        let root = parse.syntax();
        let decl = resolve_ref(&root, "v", 0).expect("v should resolve");
        let lets: Vec<_> = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::LET_STMT)
            .collect();
        assert_eq!(decl.syntax(), &lets[1], "second binder shadows the first");
    }

    #[test]
    fn parameter_resolves_inside_body() {
        let parse = tarn_parser::parse("fn double(n) do\n  return n + n\nend");
        let root = parse.syntax();
        let decl = resolve_ref(&root, "n", 0).expect("n should resolve");
        assert!(matches!(decl, Declaration::Param(_)));
    }

    #[test]
    fn named_function_resolves_inside_itself() {
        let parse = tarn_parser::parse("fn f() do\n  return f()\nend");
        let root = parse.syntax();
        let decl = resolve_ref(&root, "f", 0).expect("f should resolve");
        assert!(matches!(decl, Declaration::Func(_)));
    }

    #[test]
    fn unresolved_is_global() {
        let parse = tarn_parser::parse("let a = mystery");
        let root = parse.syntax();
        assert!(resolve_ref(&root, "mystery", 0).is_none());
    }

    #[test]
    fn up_value_detection_across_function_boundary() {
        let source = "fn outer() do\n  let captured = 1\n  let f = fn () -> captured end\n  let local_use = captured\nend";
        let parse = tarn_parser::parse(source);
        let root = parse.syntax();
        let refs: Vec<_> = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::NAME_REF && n.text() == "captured")
            .collect();
        assert_eq!(refs.len(), 2);
        // Inside the closure: crosses a function boundary.
        assert!(is_up_value(&refs[0]));
        // Inside the declaring function body: not captured.
        assert!(!is_up_value(&refs[1]));
    }

    #[test]
    fn self_in_nested_closure_is_up_value() {
        let source = "class A do\n  fn m() do\n    let direct = self\n    let f = fn () -> self end\n  end\nend";
        let parse = tarn_parser::parse(source);
        let root = parse.syntax();
        let selves: Vec<_> = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::SELF_EXPR)
            .collect();
        assert_eq!(selves.len(), 2);
        assert!(!is_up_value(&selves[0]));
        assert!(is_up_value(&selves[1]));
    }

    #[test]
    fn resolve_prefix_of_field_access() {
        let parse = tarn_parser::parse("let p = 1\np.x = 2");
        let root = parse.syntax();
        let member = first_kind(&root, SyntaxKind::FIELD_ACCESS);
        let decl = resolve_prefix(&member).expect("prefix should resolve");
        assert!(matches!(decl, Declaration::Local(_)));
        assert_eq!(decl.name().as_deref(), Some("p"));
    }

    #[test]
    fn resolve_at_tree_offset_smoke() {
        // "letx=1\nlety=x" -- tree offsets: the x reference starts at 12.
        let parse = tarn_parser::parse("let x = 1\nlet y = x");
        let root = parse.syntax();
        assert!(resolve_at(&root, 12).is_some());
    }
}
