//! Type error representation.
//!
//! Every error carries the span of the offending source text and, once it
//! has bubbled through the driver, the pretty-printed expression whose
//! inference was in progress. Inference stops at the first error; there
//! is no recovery or multi-error reporting.

use std::fmt;

use larch_common::span::Span;
use larch_parser::ast::Expr;

use crate::ty::{Ty, TyVar};

/// What went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeErrorKind {
    /// Two types that should be equal are not.
    Mismatch { expected: Ty, found: Ty },
    /// Function types with different argument counts.
    ArityMismatch { expected: usize, found: usize },
    /// A type variable appears in its own definition.
    ///
    /// Binding `?a` to `(?a) -> Int` would build an infinite type;
    /// recursive types are deliberately rejected.
    InfiniteType { var: TyVar, ty: Ty },
    /// A symbol resolves neither in scope nor in the builtin table.
    UnboundVariable { name: String },
    /// An insertion attempt on a name already bound in any enclosing
    /// scope, or colliding with a builtin. Shadowing is forbidden.
    AlreadyDefined { name: String },
    /// A node shape the inferencer does not accept. Engineering bug.
    MalformedAst { reason: String },
}

/// A type error: kind, source span, and (once attached by the driver)
/// the expression being inferred.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub span: Span,
    /// Pretty-printed expression context, attached by the driver.
    pub expr: Option<String>,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            expr: None,
        }
    }

    /// Attach the expression being inferred, if none is recorded yet.
    ///
    /// The innermost context wins: the driver calls this on the way out,
    /// and a context attached deeper in the walk is kept.
    pub fn with_expr(mut self, expr: &Expr) -> Self {
        if self.expr.is_none() {
            self.expr = Some(expr.pretty());
        }
        self
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeErrorKind::Mismatch { expected, found } => {
                write!(f, "type mismatch: expected `{}`, found `{}`", expected, found)?;
            }
            TypeErrorKind::ArityMismatch { expected, found } => {
                write!(
                    f,
                    "arity mismatch: expected {} argument(s), found {}",
                    expected, found
                )?;
            }
            TypeErrorKind::InfiniteType { var, ty } => {
                write!(
                    f,
                    "recursive types not supported: `{}` occurs in `{}`",
                    var, ty
                )?;
            }
            TypeErrorKind::UnboundVariable { name } => {
                write!(f, "undefined variable `{}`", name)?;
            }
            TypeErrorKind::AlreadyDefined { name } => {
                write!(f, "variable `{}` is already defined", name)?;
            }
            TypeErrorKind::MalformedAst { reason } => {
                write!(f, "malformed syntax tree: {}", reason)?;
            }
        }
        if let Some(expr) = &self.expr {
            write!(f, " (while inferring `{}`)", expr)?;
        }
        Ok(())
    }
}

impl std::error::Error for TypeError {}
