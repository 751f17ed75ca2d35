//! Tarn parser: recursive descent parser producing a rowan-based CST.
//!
//! This crate transforms the token stream from `tarn-lexer` into a lossless
//! concrete syntax tree (CST) using the `rowan` library. The CST preserves
//! all tokens including comments, so tooling built on top (the inference
//! engine, future editors) works from the same tree.

pub mod ast;
pub mod cst;
pub mod error;
mod parser;
pub mod syntax_kind;

pub use cst::{SyntaxElement, SyntaxNode, SyntaxToken};
pub use error::ParseError;
pub use syntax_kind::SyntaxKind;

/// Result of parsing a Tarn source file.
///
/// Contains the green tree (the immutable, cheap-to-clone CST) and any
/// parse errors encountered. With the current first-error-only strategy,
/// `errors` contains at most one error.
pub struct Parse {
    green: rowan::GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Build the syntax tree root from the green node.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Parse errors encountered during parsing.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Whether parsing completed without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a Tarn source file into a CST.
///
/// This is the main entry point for the parser. It lexes the source, parses
/// the token stream, and returns a [`Parse`] result containing the syntax
/// tree and any errors.
pub fn parse(source: &str) -> Parse {
    let tokens = tarn_lexer::Lexer::tokenize(source);
    let mut parser = parser::Parser::new(tokens, source);
    parser::parse_source_file(&mut parser);
    let (green, errors) = parser.build_tree();
    Parse { green, errors }
}

/// Render a syntax tree as an indented debug string.
///
/// Nodes print as `KIND@start..end`, tokens additionally print their text.
/// Intended for tests and debugging.
pub fn debug_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    debug_tree_rec(node, 0, &mut out);
    out
}

fn debug_tree_rec(node: &SyntaxNode, depth: usize, out: &mut String) {
    use std::fmt::Write;

    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{}{:?}@{:?}", indent, node.kind(), node.text_range());
    for child in node.children_with_tokens() {
        match child {
            rowan::NodeOrToken::Node(n) => debug_tree_rec(&n, depth + 1, out),
            rowan::NodeOrToken::Token(t) => {
                let indent = "  ".repeat(depth + 1);
                let _ = writeln!(
                    out,
                    "{}{:?}@{:?} {:?}",
                    indent,
                    t.kind(),
                    t.text_range(),
                    t.text()
                );
            }
        }
    }
}
