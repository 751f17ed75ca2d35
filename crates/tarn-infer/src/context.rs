//! Per-query resolution context: the recursion and overflow guard.
//!
//! The reference graph of a Tarn program is not guaranteed acyclic -- a
//! field's type can depend on an assignment whose type depends on the same
//! field, and classes can reference each other. Every recursive inference
//! step that can re-enter itself goes through [`InferCtx::push`]; a rejected
//! push means "stop here and return what you have" rather than an error.
//!
//! The guard key is `(node identity, operation)`, not node identity alone:
//! the same node is legitimately re-entered for a different kind of query
//! (its own type vs. the return type of the function it defines) within one
//! resolution.
//!
//! A context belongs to exactly one top-level query and is discarded when
//! that query returns. Concurrent queries each own their own context, so
//! they never see each other's guard state.

use rowan::TextRange;
use tarn_parser::{SyntaxKind, SyntaxNode};
use tracing::trace;

use crate::FileId;

/// Maximum depth of in-flight guarded inferences.
///
/// Stops pathological inheritance/self-reference chains without materially
/// limiting legitimate nesting. Tunable; not a semantic guarantee.
pub const MAX_DEPTH: usize = 16;

/// The kind of query being performed on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InferOp {
    /// Inferring the type of an expression.
    GuessType,
    /// Inferring the return type-set of a function definition.
    GuessReturnType,
}

/// Stable, comparable identity for a syntax node within a snapshot.
///
/// A node is identified by its file, kind, and text range; this survives
/// re-creation of syntax-node handles over the same tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePtr {
    pub file: FileId,
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl NodePtr {
    /// Identity of `node` within the file it belongs to.
    pub fn new(file: FileId, node: &SyntaxNode) -> NodePtr {
        NodePtr {
            file,
            kind: node.kind(),
            range: node.text_range(),
        }
    }
}

/// The in-flight resolution stack for one top-level inference query.
#[derive(Debug, Default)]
pub struct InferCtx {
    stack: Vec<(NodePtr, InferOp)>,
}

impl InferCtx {
    pub fn new() -> InferCtx {
        InferCtx { stack: Vec::new() }
    }

    /// Try to enter a guarded inference for `(ptr, op)`.
    ///
    /// Returns `false` -- do not proceed -- if the same pair is already on
    /// the stack (a cycle) or the stack is at [`MAX_DEPTH`] (overflow).
    /// On success the frame is pushed and `true` is returned; the caller
    /// must then call [`InferCtx::pop`] on every exit path.
    pub fn push(&mut self, ptr: NodePtr, op: InferOp) -> bool {
        if self.stack.len() >= MAX_DEPTH {
            trace!(?ptr, ?op, depth = self.stack.len(), "inference depth limit reached");
            return false;
        }
        if self.stack.contains(&(ptr, op)) {
            trace!(?ptr, ?op, "inference cycle detected");
            return false;
        }
        self.stack.push((ptr, op));
        true
    }

    /// Remove the most recent frame for `ptr`.
    pub fn pop(&mut self, ptr: NodePtr) {
        if let Some(idx) = self.stack.iter().rposition(|(p, _)| *p == ptr) {
            self.stack.remove(idx);
        }
    }

    /// Current stack depth (for tests and diagnostics).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ptr(offset: u32) -> NodePtr {
        NodePtr {
            file: FileId(0),
            kind: SyntaxKind::FIELD_ACCESS,
            range: TextRange::new(offset.into(), (offset + 1).into()),
        }
    }

    #[test]
    fn push_then_pop_roundtrip() {
        let mut ctx = InferCtx::new();
        assert!(ctx.push(ptr(0), InferOp::GuessType));
        assert_eq!(ctx.depth(), 1);
        ctx.pop(ptr(0));
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn repeated_pair_is_rejected() {
        let mut ctx = InferCtx::new();
        assert!(ctx.push(ptr(0), InferOp::GuessType));
        assert!(!ctx.push(ptr(0), InferOp::GuessType));
    }

    #[test]
    fn same_node_different_op_is_allowed() {
        let mut ctx = InferCtx::new();
        assert!(ctx.push(ptr(0), InferOp::GuessType));
        assert!(ctx.push(ptr(0), InferOp::GuessReturnType));
        assert_eq!(ctx.depth(), 2);
    }

    #[test]
    fn sibling_after_pop_is_allowed() {
        // The guard must not leak: after a frame is popped, the same pair
        // may be pushed again by a sibling query step.
        let mut ctx = InferCtx::new();
        assert!(ctx.push(ptr(0), InferOp::GuessType));
        ctx.pop(ptr(0));
        assert!(ctx.push(ptr(0), InferOp::GuessType));
    }

    #[test]
    fn depth_limit_rejects() {
        let mut ctx = InferCtx::new();
        for i in 0..MAX_DEPTH {
            assert!(ctx.push(ptr(i as u32), InferOp::GuessType), "push {i}");
        }
        assert!(!ctx.push(ptr(999), InferOp::GuessType));
        // Popping one frame frees capacity again.
        ctx.pop(ptr(0));
        assert!(ctx.push(ptr(999), InferOp::GuessType));
    }

    #[test]
    fn pop_removes_most_recent_matching_frame() {
        let mut ctx = InferCtx::new();
        assert!(ctx.push(ptr(0), InferOp::GuessType));
        assert!(ctx.push(ptr(0), InferOp::GuessReturnType));
        ctx.pop(ptr(0));
        assert_eq!(ctx.depth(), 1);
        // The GuessType frame is the one still present.
        assert!(!ctx.push(ptr(0), InferOp::GuessType));
        assert!(ctx.push(ptr(0), InferOp::GuessReturnType));
    }
}
