//! Generalization and instantiation: the two halves of let-polymorphism.
//!
//! `generalize` closes the inferred type of a let-bound expression over
//! the type variables the expression introduced, producing a scheme.
//! `instantiate` does the reverse at every use site: fresh variables are
//! minted for the scheme's quantified names and substituted through a
//! clone of its body.

use larch_common::span::Span;
use larch_parser::ast::Expr;

use crate::env::ScopeStack;
use crate::error::{TypeError, TypeErrorKind};
use crate::infer::gen_constraints;
use crate::ty::{Ty, TyVar};
use crate::unify::{unify, Constraint};

/// Infer a let-bound expression and close its type into a scheme.
///
/// The expression is inferred as if it were its own program: constraints
/// are generated into a local set and solved immediately. Clones of the
/// local constraints are propagated into the enclosing set so the outer
/// solve still sees them. The resulting type is quantified over the
/// variables the expression introduced that survive in it; variables
/// resolved away by the local solve are not quantified, and variables
/// belonging to enclosing bindings never appear in the introduced list
/// in the first place.
///
/// Returns a bare type when nothing is left to quantify.
pub fn generalize(
    scope: &mut ScopeStack,
    outer: &mut Vec<Constraint>,
    expr: &Expr,
) -> Result<Ty, TypeError> {
    let mut local = Vec::new();
    let (mut ty, introduced) = gen_constraints(scope, &mut local, expr)?;

    outer.extend(local.iter().cloned());

    let subst = unify(local).map_err(|e| e.with_expr(expr))?;
    subst.apply(&mut ty);

    Ok(quantify(ty, &introduced))
}

/// Quantify `ty` over those of `introduced` that still occur in it.
pub fn quantify(ty: Ty, introduced: &[TyVar]) -> Ty {
    let mut quantified: Vec<TyVar> = Vec::new();
    for var in introduced {
        if ty.occurs(var) && !quantified.contains(var) {
            quantified.push(var.clone());
        }
    }
    if quantified.is_empty() {
        ty
    } else {
        Ty::Scheme(quantified, Box::new(ty))
    }
}

/// Resolve a name to a type, instantiating schemes.
///
/// A scheme bound to the name gets a fresh variable per quantified name,
/// substituted through a clone of the body. Non-scheme bindings are
/// returned as-is (the scope already hands out clones). Unbound names
/// are an error.
pub fn instantiate(scope: &ScopeStack, name: &str, span: Span) -> Result<Ty, TypeError> {
    let Some(ty) = scope.find(name) else {
        return Err(TypeError::new(
            TypeErrorKind::UnboundVariable {
                name: name.to_string(),
            },
            span,
        ));
    };

    match ty {
        Ty::Scheme(vars, body) => {
            let mut instance = *body;
            for var in &vars {
                let fresh = TyVar::fresh(format!("instance of {}", var));
                instance.substitute(var, &Ty::Generic(fresh));
            }
            Ok(instance)
        }
        other => Ok(other),
    }
}
