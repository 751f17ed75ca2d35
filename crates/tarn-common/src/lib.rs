//! Shared vocabulary for the Tarn tooling workspace.
//!
//! Home of the types every other crate speaks: byte-offset [`span::Span`]s,
//! the [`token::Token`] stream vocabulary, and the on-demand
//! [`span::LineIndex`] for human-readable positions.

pub mod span;
pub mod token;
