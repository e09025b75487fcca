//! Shared types for the Larch compiler.
//!
//! Every pipeline stage (lexer, parser, type checker, code generator)
//! depends on this crate for source positions and the token vocabulary.

pub mod span;
pub mod token;
