//! Project-wide class registry and field index.
//!
//! Both indices are built once per snapshot by a single traversal of every
//! file's syntax tree, and are read-only afterwards. There is no partial
//! rebuild: on content change the snapshot (and with it both indices) is
//! rebuilt wholesale.
//!
//! The field index maps `(owner class, field name)` to every declaration
//! site of that field: class-body field statements, class-body methods,
//! and `self.f = v` / `name.f = v` assignments. Each entry carries an
//! optional precomputed "stub" -- the shallow type of the assigned value --
//! so the common case (literal initialisers, constructor calls) never has
//! to re-enter recursive inference.

use rustc_hash::FxHashMap;
use tarn_parser::ast::expr::Expr;
use tarn_parser::ast::item::{AssignStmt, ClassDef};
use tarn_parser::ast::AstNode;
use tarn_parser::{SyntaxKind, SyntaxNode};
use tracing::debug;

use crate::context::NodePtr;
use crate::infer::{literal_type, member_key};
use crate::resolve::{self, Declaration};
use crate::ty::{Ty, TypeSet};
use crate::{FileId, SourceFile};

// ── Class registry ─────────────────────────────────────────────────────

/// A registered class declaration.
#[derive(Debug, Clone)]
pub struct ClassRecord {
    /// The class name.
    pub name: String,
    /// The declared superclass name, if any.
    pub superclass: Option<String>,
    /// The file the class is declared in.
    pub file: FileId,
    /// Identity of the CLASS_DEF node.
    pub ptr: NodePtr,
    /// The CLASS_DEF node itself.
    syntax: SyntaxNode,
}

impl ClassRecord {
    pub fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

/// All class declarations in the snapshot, keyed by name.
///
/// The first declaration of a name wins; later duplicates are ignored.
#[derive(Debug, Default)]
pub struct ClassIndex {
    classes: FxHashMap<String, ClassRecord>,
}

impl ClassIndex {
    /// Collect every class declaration across the snapshot.
    pub fn build(files: &[SourceFile]) -> ClassIndex {
        let mut classes: FxHashMap<String, ClassRecord> = FxHashMap::default();
        for file in files {
            for node in file
                .root()
                .descendants()
                .filter(|n| n.kind() == SyntaxKind::CLASS_DEF)
            {
                let Some(class) = ClassDef::cast(node.clone()) else {
                    continue;
                };
                let Some(name) = class.name().and_then(|n| n.text()) else {
                    continue;
                };
                let record = ClassRecord {
                    name: name.clone(),
                    superclass: class.superclass().and_then(|s| s.text()),
                    file: file.id,
                    ptr: NodePtr::new(file.id, &node),
                    syntax: node,
                };
                classes.entry(name).or_insert(record);
            }
        }
        debug!(classes = classes.len(), "class index built");
        ClassIndex { classes }
    }

    /// Look up a class by name.
    pub fn get(&self, name: &str) -> Option<&ClassRecord> {
        self.classes.get(name)
    }

    /// The declared superclass of `name`, if any.
    pub fn superclass_of(&self, name: &str) -> Option<&str> {
        self.classes.get(name)?.superclass.as_deref()
    }

    /// All registered class names (order not significant).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(|s| s.as_str())
    }
}

// ── Field index ────────────────────────────────────────────────────────

/// What kind of declaration site a field entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDeclKind {
    /// A class-body field statement: `x = 0`.
    ClassField,
    /// A class-body method definition (a field of function type).
    Method,
    /// An assignment site: `self.x = v` or `name.x = v`.
    Assign,
}

/// One declaration site of a field.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// The owning class name.
    pub owner: String,
    /// The field name.
    pub name: String,
    /// What kind of declaration site this is.
    pub kind: FieldDeclKind,
    /// Precomputed shallow value type, when the initialiser is simple
    /// enough to classify without recursive inference.
    pub stub: Option<TypeSet>,
    /// The file the declaration is in.
    pub file: FileId,
    /// Identity of the declaration node (the CLASS_FIELD statement, the
    /// method FN_DEF, or the assignment target expression).
    pub ptr: NodePtr,
    /// The declaration node itself.
    syntax: SyntaxNode,
}

impl FieldDecl {
    pub fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }

    /// The expression assigned to the field at this site, when there is one
    /// (the class-field initialiser or the assignment's right-hand side).
    pub fn value_expr(&self) -> Option<Expr> {
        match self.kind {
            FieldDeclKind::ClassField => {
                tarn_parser::ast::item::ClassField::cast(self.syntax.clone())?.value()
            }
            FieldDeclKind::Assign => {
                let assign = AssignStmt::cast(self.syntax.parent()?)?;
                assign.value()
            }
            FieldDeclKind::Method => None,
        }
    }
}

/// The `(owner, field) -> declaration sites` index.
#[derive(Debug, Default)]
pub struct FieldIndex {
    /// owner name -> field name -> declaration sites in indexing order.
    entries: FxHashMap<String, FxHashMap<String, Vec<FieldDecl>>>,
    /// Stubs of assignment sites keyed by target-node identity, for the
    /// fast path when inferring the declaration site itself.
    stubs_by_ptr: FxHashMap<NodePtr, TypeSet>,
}

impl FieldIndex {
    /// Build the index with one full traversal of every file.
    ///
    /// Ordering is file order, then text order within a file, so repeated
    /// queries on the same snapshot see a stable sequence.
    pub fn build(files: &[SourceFile], classes: &ClassIndex) -> FieldIndex {
        let mut index = FieldIndex::default();
        for file in files {
            for node in file.root().descendants() {
                match node.kind() {
                    SyntaxKind::CLASS_DEF => index.index_class_body(file.id, &node, classes),
                    SyntaxKind::ASSIGN_STMT => index.index_assignment(file.id, &node, classes),
                    _ => {}
                }
            }
        }
        debug!(
            owners = index.entries.len(),
            stubs = index.stubs_by_ptr.len(),
            "field index built"
        );
        index
    }

    /// All declaration sites for `(owner, field)`, in indexing order.
    ///
    /// The order is not significant for correctness but is stable across
    /// calls on the same snapshot.
    pub fn find_all(&self, owner: &str, field: &str) -> &[FieldDecl] {
        self.entries
            .get(owner)
            .and_then(|fields| fields.get(field))
            .map(|decls| decls.as_slice())
            .unwrap_or(&[])
    }

    /// The precomputed stub for an assignment target node, if any.
    pub fn stub_for(&self, ptr: NodePtr) -> Option<&TypeSet> {
        self.stubs_by_ptr.get(&ptr)
    }

    fn insert(&mut self, decl: FieldDecl) {
        if decl.kind == FieldDeclKind::Assign {
            if let Some(stub) = &decl.stub {
                self.stubs_by_ptr.insert(decl.ptr, stub.clone());
            }
        }
        self.entries
            .entry(decl.owner.clone())
            .or_default()
            .entry(decl.name.clone())
            .or_default()
            .push(decl);
    }

    /// Index the fields and methods of a class body.
    fn index_class_body(&mut self, file: FileId, node: &SyntaxNode, classes: &ClassIndex) {
        let Some(class) = ClassDef::cast(node.clone()) else {
            return;
        };
        let Some(owner) = class.name().and_then(|n| n.text()) else {
            return;
        };

        for field in class.fields() {
            let Some(name) = field.name().and_then(|n| n.text()) else {
                continue;
            };
            self.insert(FieldDecl {
                owner: owner.clone(),
                name,
                kind: FieldDeclKind::ClassField,
                stub: shallow_value_type(field.value(), classes),
                file,
                ptr: NodePtr::new(file, field.syntax()),
                syntax: field.syntax().clone(),
            });
        }

        for method in class.methods() {
            let Some(name) = method.name().and_then(|n| n.text()) else {
                continue;
            };
            self.insert(FieldDecl {
                owner: owner.clone(),
                name,
                kind: FieldDeclKind::Method,
                stub: Some(TypeSet::singleton(Ty::Function)),
                file,
                ptr: NodePtr::new(file, method.syntax()),
                syntax: method.syntax().clone(),
            });
        }
    }

    /// Index an assignment statement whose target is a member access.
    fn index_assignment(&mut self, file: FileId, node: &SyntaxNode, classes: &ClassIndex) {
        let Some(assign) = AssignStmt::cast(node.clone()) else {
            return;
        };
        let Some(target) = assign.target() else {
            return;
        };
        let Some((base, field_name)) = member_key(&target) else {
            return;
        };

        let owners = assignment_owners(&base, node, classes);
        if owners.is_empty() {
            // Unattributable site: contributes nothing, by policy.
            return;
        }

        let stub = shallow_value_type(assign.value(), classes);
        for owner in owners {
            self.insert(FieldDecl {
                owner,
                name: field_name.clone(),
                kind: FieldDeclKind::Assign,
                stub: stub.clone(),
                file,
                ptr: NodePtr::new(file, target.syntax()),
                syntax: target.syntax().clone(),
            });
        }
    }
}

/// Owner classes for an assignment target's base expression, resolved
/// structurally (never recursively) at index-build time.
///
/// - `self.f = v` belongs to the enclosing class.
/// - `name.f = v` where `name` is a local whose initialiser names or
///   constructs a class belongs to that class.
/// - `Name.f = v` where `Name` is a registered class is a static field of
///   that class.
fn assignment_owners(base: &Expr, assign_node: &SyntaxNode, classes: &ClassIndex) -> Vec<String> {
    match base {
        Expr::SelfExpr(_) => resolve::enclosing_class(assign_node)
            .and_then(|c| c.name())
            .and_then(|n| n.text())
            .into_iter()
            .collect(),
        Expr::NameRef(name_ref) => match resolve::resolve_name(name_ref) {
            Some(Declaration::Local(let_stmt)) => {
                shallow_value_type(let_stmt.value(), classes)
                    .map(|stub| {
                        stub.members()
                            .iter()
                            .filter_map(|ty| match ty {
                                Ty::Class(name) => Some(name.clone()),
                                _ => None,
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }
            // A parameter or function shadows any class of the same name.
            Some(Declaration::Param(_)) | Some(Declaration::Func(_)) => Vec::new(),
            // A bare class name declares a static field.
            Some(Declaration::Class(_)) | None => match name_ref.text() {
                Some(name) if classes.get(&name).is_some() => vec![name],
                _ => Vec::new(),
            },
        },
        _ => Vec::new(),
    }
}

/// Shallow (non-recursive) classification of a value expression.
///
/// Covers the initialiser shapes that can be typed by looking at a single
/// node: literals, table constructors, closures, class-name references,
/// and constructor calls of a class name. Everything else is `None`,
/// meaning the slow path infers from the syntax node on demand.
pub(crate) fn shallow_value_type(value: Option<Expr>, classes: &ClassIndex) -> Option<TypeSet> {
    match value? {
        Expr::Literal(lit) => literal_type(&lit).map(TypeSet::singleton),
        Expr::TableExpr(_) => Some(TypeSet::singleton(Ty::Table)),
        Expr::ClosureExpr(_) => Some(TypeSet::singleton(Ty::Function)),
        Expr::NameRef(name_ref) => {
            let name = name_ref.text()?;
            classes.get(&name)?;
            Some(TypeSet::singleton(Ty::Class(name)))
        }
        Expr::CallExpr(call) => {
            let Expr::NameRef(callee) = call.callee()? else {
                return None;
            };
            let name = callee.text()?;
            classes.get(&name)?;
            Some(TypeSet::singleton(Ty::Class(name)))
        }
        _ => None,
    }
}
