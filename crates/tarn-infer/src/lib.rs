//! Best-effort type inference and symbol resolution for Tarn.
//!
//! Tarn has no static declarations, so every type is *guessed* by walking
//! declaration sites, class hierarchies, and field indices over the syntax
//! tree. The result of every query is a set of candidate types -- never a
//! verdict -- and every operation is total: cycles and overflows truncate
//! the search instead of failing it.
//!
//! # Architecture
//!
//! - [`ty`]: the type-set algebra (`Ty`, `TypeSet`)
//! - [`context`]: the per-query recursion/overflow guard (`InferCtx`)
//! - [`index`]: the snapshot-wide class registry and field index
//! - [`resolve`]: lexical declaration resolution and up-value classification
//! - [`infer`]: the inference engine itself
//!
//! # Snapshots and concurrency
//!
//! An [`Analysis`] value is an immutable snapshot: sources are parsed and
//! the indices built once, in [`Analysis::from_sources`], and every query
//! afterwards is a shared-reference read. Each top-level query owns a
//! private [`context::InferCtx`], so concurrent queries on one snapshot
//! never interfere with each other's guard state. On content change,
//! callers build a fresh snapshot; nothing is patched in place.
//!
//! ```
//! use tarn_infer::{Analysis, Ty};
//!
//! let db = Analysis::from_source(
//!     "class Point do\n  x = 0\nend\nlet p = Point()\nlet v = p.x",
//! );
//! let access = db
//!     .file_syntax(tarn_infer::FileId(0))
//!     .descendants()
//!     .find(|n| n.kind() == tarn_parser::SyntaxKind::FIELD_ACCESS)
//!     .unwrap();
//! assert!(db.guess_type(&access).contains(&Ty::Number));
//! ```

pub mod context;
pub mod index;
mod infer;
pub mod resolve;
pub mod ty;

use tarn_common::span::LineIndex;
use tarn_parser::ast::expr::NameRef;
use tarn_parser::ast::item::ClassDef;
use tarn_parser::ast::AstNode;
use tarn_parser::{Parse, ParseError, SyntaxNode};

use crate::context::{InferCtx, NodePtr};
use crate::index::{ClassIndex, FieldDecl, FieldIndex};
use crate::resolve::Declaration;
use crate::ty::TypeSet;

pub use crate::ty::Ty;

/// Identifier of a source file within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

/// One parsed source file of a snapshot.
pub struct SourceFile {
    pub id: FileId,
    pub name: String,
    pub text: String,
    parse: Parse,
    root: SyntaxNode,
    line_index: LineIndex,
}

impl SourceFile {
    /// The root syntax node. All nodes handed to queries must descend from
    /// the snapshot's own roots.
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Parse errors of this file, if any.
    pub fn errors(&self) -> &[ParseError] {
        self.parse.errors()
    }

    /// Convert a byte offset in this file's text to a 1-based
    /// (line, column) pair.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        self.line_index.line_col(offset)
    }
}

/// An immutable analysis snapshot over a set of Tarn source files.
///
/// Holds the parsed trees, the class registry, and the field index. All
/// query methods take `&self`; the snapshot is never mutated after
/// construction.
pub struct Analysis {
    files: Vec<SourceFile>,
    classes: ClassIndex,
    fields: FieldIndex,
}

impl Analysis {
    /// Parse the given `(name, text)` sources and build the indices.
    pub fn from_sources(sources: &[(&str, &str)]) -> Analysis {
        let files: Vec<SourceFile> = sources
            .iter()
            .enumerate()
            .map(|(i, (name, text))| {
                let parse = tarn_parser::parse(text);
                let root = parse.syntax();
                SourceFile {
                    id: FileId(i as u32),
                    name: (*name).to_string(),
                    text: (*text).to_string(),
                    parse,
                    root,
                    line_index: LineIndex::new(text),
                }
            })
            .collect();
        let classes = ClassIndex::build(&files);
        let fields = FieldIndex::build(&files, &classes);
        Analysis {
            files,
            classes,
            fields,
        }
    }

    /// Convenience: a single-file snapshot.
    pub fn from_source(text: &str) -> Analysis {
        Analysis::from_sources(&[("main.tarn", text)])
    }

    // ── Files ──────────────────────────────────────────────────────────

    /// All files of the snapshot.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// The file with the given id.
    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    /// The root syntax node of a file.
    pub fn file_syntax(&self, id: FileId) -> &SyntaxNode {
        self.file(id).root()
    }

    /// The file containing `node`, found by comparing tree roots.
    pub fn file_containing(&self, node: &SyntaxNode) -> Option<FileId> {
        let root = node.ancestors().last()?;
        self.files.iter().find(|f| f.root == root).map(|f| f.id)
    }

    /// Stable identity of `node` within the snapshot.
    pub(crate) fn ptr(&self, node: &SyntaxNode) -> Option<NodePtr> {
        let file = self.file_containing(node)?;
        Some(NodePtr::new(file, node))
    }

    pub(crate) fn classes(&self) -> &ClassIndex {
        &self.classes
    }

    pub(crate) fn fields(&self) -> &FieldIndex {
        &self.fields
    }

    // ── Produced operations ────────────────────────────────────────────

    /// The possible types of an expression node.
    ///
    /// Opens a fresh resolution context for this query; the context is
    /// discarded when the call returns.
    pub fn guess_type(&self, node: &SyntaxNode) -> TypeSet {
        let mut ctx = InferCtx::new();
        infer::guess_type(self, node, &mut ctx)
    }

    /// Resolve a name reference to its declaration.
    ///
    /// Walks the lexical scope chain first; names no scope binds fall back
    /// to the snapshot-wide class registry. `None` means the name denotes a
    /// (possibly undeclared) global.
    pub fn resolve(&self, node: &SyntaxNode) -> Option<Declaration> {
        let name_ref = NameRef::cast(node.clone())?;
        self.resolve_name_ref(&name_ref)
    }

    pub(crate) fn resolve_name_ref(&self, name_ref: &NameRef) -> Option<Declaration> {
        if let Some(decl) = resolve::resolve_name(name_ref) {
            return Some(decl);
        }
        let name = name_ref.text()?;
        let record = self.classes.get(&name)?;
        ClassDef::cast(record.syntax().clone()).map(Declaration::Class)
    }

    /// Resolve the base of a member-access expression to its declaration.
    pub fn resolve_prefix(&self, node: &SyntaxNode) -> Option<Declaration> {
        resolve::resolve_prefix(node)
    }

    /// Whether a name reference (or `self`) is captured from an enclosing
    /// function scope.
    pub fn is_up_value(&self, node: &SyntaxNode) -> bool {
        resolve::is_up_value(node)
    }

    /// All declaration sites of `(owner, field)`, in stable indexing order.
    pub fn find_all(&self, owner: &str, field: &str) -> &[FieldDecl] {
        self.fields.find_all(owner, field)
    }

    /// The declared superclass of a class, if any.
    pub fn superclass_of(&self, name: &str) -> Option<&str> {
        self.classes.superclass_of(name)
    }
}
