//! Larch type checker: Hindley-Milner type inference.
//!
//! This crate assigns a type to every Larch expression and a resolved
//! type (or scheme) to every top-level definition. Inference is a pure
//! function of the AST: constraints are generated by a syntax-directed
//! walk, solved by unification with an occurs check, and let-bound
//! expressions are generalized into polymorphic schemes that are freshly
//! instantiated at every use site.
//!
//! # Architecture
//!
//! - [`ty`]: the type algebra (Ty, TyVar, schemes, structural equality)
//! - [`env`]: the scope stack (lexically nested name-to-type frames)
//! - [`builtins`]: the fixed builtin operator table
//! - [`infer`]: constraint generation and the top-level driver
//! - [`unify`]: the constraint solver (ordered substitutions, occurs check)
//! - [`generalize`]: let-generalization and scheme instantiation
//! - [`error`]: type errors with spans and expression context
//! - [`diagnostics`]: ariadne rendering for the CLI

pub mod builtins;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod generalize;
pub mod infer;
pub mod ty;
pub mod unify;

pub use error::{TypeError, TypeErrorKind};
pub use infer::{check, infer, SymbolTable, TypeckResult};
